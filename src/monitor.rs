// Event loop
// Single consumer of observer signals, periodic ticks and remote-call
// completions; the only place session state is mutated

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;

use crate::events::Signal;
use crate::scrobbler::ScrobbleService;
use crate::session::{ScrobbleRequest, Session, TrackChange};
use crate::track::{Track, TrackId};

/// Everything the monitor loop can be woken up by. Remote calls run on
/// worker threads and report back through the same queue, so session state
/// only ever changes here, in arrival order.
#[derive(Debug)]
pub enum Event {
    Player(Signal),
    Tick,
    NowPlayingDone { ok: bool },
    ScrobbleDone { track_id: TrackId, ok: bool },
}

pub struct Monitor {
    session: Session,
    service: Arc<dyn ScrobbleService>,
    events: Sender<Event>,
    scrobble_in_flight: bool,
}

impl Monitor {
    pub fn new(service: Arc<dyn ScrobbleService>, events: Sender<Event>) -> Self {
        Self {
            session: Session::new(),
            service,
            events,
            scrobble_in_flight: false,
        }
    }

    /// Run until every producer has hung up.
    pub fn run(mut self, queue: Receiver<Event>) {
        for event in queue {
            self.handle(event);
        }
        log::info!("Event queue closed, shutting down");
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Player(signal) => self.handle_signal(signal),
            Event::Tick => self.handle_tick(),
            Event::NowPlayingDone { ok } => {
                // failures are already logged by the worker and never retried
                if ok {
                    log::debug!("Now playing update delivered");
                }
            }
            Event::ScrobbleDone { track_id, ok } => self.handle_scrobble_done(track_id, ok),
        }
    }

    fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::TrackData(patch) => match self.session.apply_track(patch, Utc::now()) {
                TrackChange::Started(track) => {
                    log::info!(
                        "Now playing: {} - {} ({}s)",
                        track.artist,
                        track.name,
                        track.duration_secs
                    );
                    self.send_now_playing(track);
                }
                TrackChange::Updated => log::debug!("Track metadata refreshed"),
            },
            Signal::StateChanged(state) => {
                if let Some(track) = self.session.current() {
                    log::info!("Playback {}: {} - {}", state, track.artist, track.name);
                }
                self.session.apply_state(state);
            }
            Signal::Stopped => {
                if self.session.is_tracking() {
                    log::info!("Playback stopped, clearing session");
                }
                self.session.stop();
            }
        }
    }

    fn handle_tick(&mut self) {
        if self.scrobble_in_flight {
            return;
        }
        if let Some(request) = self.session.due_scrobble(Utc::now()) {
            log::info!("Scrobbling: {} - {}", request.artist, request.name);
            self.scrobble_in_flight = true;
            self.send_scrobble(request);
        }
    }

    fn handle_scrobble_done(&mut self, track_id: TrackId, ok: bool) {
        self.scrobble_in_flight = false;
        if !ok {
            // leave the flag unset so the next tick retries
            log::warn!("Scrobble failed; will retry on the next check");
            return;
        }
        if self.session.confirm_scrobbled(&track_id) {
            log::info!("Scrobble recorded for {}", track_id);
        } else {
            log::debug!("Dropping stale scrobble result for {}", track_id);
        }
    }

    /// Best-effort now-playing update, off the event loop.
    fn send_now_playing(&self, track: Track) {
        let service = self.service.clone();
        let events = self.events.clone();
        thread::spawn(move || {
            let album = (!track.album.is_empty()).then_some(track.album.as_str());
            let ok = match service.now_playing(&track.artist, &track.name, album) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Now playing update failed: {:#}", e);
                    false
                }
            };
            let _ = events.send(Event::NowPlayingDone { ok });
        });
    }

    fn send_scrobble(&self, request: ScrobbleRequest) {
        let service = self.service.clone();
        let events = self.events.clone();
        thread::spawn(move || {
            let album = (!request.album.is_empty()).then_some(request.album.as_str());
            let ok = match service.scrobble(
                &request.artist,
                &request.name,
                album,
                request.timestamp_secs,
            ) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Scrobble failed: {:#}", e);
                    false
                }
            };
            let _ = events.send(Event::ScrobbleDone {
                track_id: request.track_id,
                ok,
            });
        });
    }
}

/// Wake the monitor every `interval` for a scrobble-eligibility check.
pub fn spawn_tick_timer(interval: Duration, events: Sender<Event>) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        thread::sleep(interval);
        if events.send(Event::Tick).is_err() {
            break;
        }
    })
}
