// Player observer process
// Spawns the external observer and feeds its line-delimited JSON stream
// into the event queue

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::Sender;
use std::thread;

use anyhow::{Context, Result};

use crate::config::ObserverConfig;
use crate::events;
use crate::monitor::Event;
use crate::text_cleanup::TextCleaner;

/// Handle to the spawned observer process; the child is killed on drop.
pub struct Observer {
    child: Child,
}

impl Observer {
    pub fn spawn(
        config: &ObserverConfig,
        cleaner: TextCleaner,
        tx: Sender<Event>,
    ) -> Result<Self> {
        log::info!("Starting player observer: {}", config.command);

        let mut child = Command::new(&config.command)
            .args(&config.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start observer command {:?}", config.command))?;

        let stdout = child.stdout.take().context("Observer has no stdout")?;
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        log::warn!("Observer stream read error: {}", e);
                        break;
                    }
                };
                let Some(raw) = events::parse_line(&line) else {
                    continue;
                };
                for signal in events::normalize(raw) {
                    let signal = cleaner.clean_signal(signal);
                    if tx.send(Event::Player(signal)).is_err() {
                        return;
                    }
                }
            }
            log::warn!("Observer exited; no further player events will arrive");
        });

        let stderr = child.stderr.take().context("Observer has no stderr")?;
        thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                log::debug!("observer: {}", line);
            }
        });

        Ok(Self { child })
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
