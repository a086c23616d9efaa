// Text cleanup
// Strips configured patterns from track metadata before it reaches the
// session, so tagged and untagged variants of a song share one identity

use regex::Regex;

use crate::config::CleanupConfig;
use crate::events::Signal;
use crate::track::TrackPatch;

pub struct TextCleaner {
    patterns: Vec<Regex>,
}

impl TextCleaner {
    /// Compile the configured patterns; invalid ones are skipped with a
    /// warning. A disabled config compiles to a pass-through cleaner.
    pub fn new(config: &CleanupConfig) -> Self {
        let patterns = if config.enabled {
            config
                .patterns
                .iter()
                .filter_map(|pattern| match Regex::new(pattern) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        log::warn!("Invalid cleanup pattern {:?}: {}", pattern, e);
                        None
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        Self { patterns }
    }

    /// Clean the metadata carried by a signal; state signals pass through.
    pub fn clean_signal(&self, signal: Signal) -> Signal {
        match signal {
            Signal::TrackData(patch) => Signal::TrackData(self.clean_patch(patch)),
            other => other,
        }
    }

    fn clean_patch(&self, mut patch: TrackPatch) -> TrackPatch {
        patch.name = self.clean(&patch.name);
        patch.artist = self.clean(&patch.artist);
        patch.album = patch.album.map(|album| self.clean(&album));
        patch
    }

    fn clean(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        for pattern in &self.patterns {
            cleaned = pattern.replace_all(&cleaned, "").into_owned();
        }
        cleaned.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::PlayerState;

    fn patch(name: &str, album: Option<&str>) -> TrackPatch {
        TrackPatch {
            name: name.into(),
            artist: "Artist".into(),
            album: album.map(Into::into),
            duration_secs: None,
            position_secs: None,
            state: None,
        }
    }

    #[test]
    fn default_patterns_strip_edition_tags() {
        let cleaner = TextCleaner::new(&CleanupConfig::default());
        let cleaned = cleaner.clean_patch(patch("Song [Explicit]", Some("Album (Clean)")));
        assert_eq!(cleaned.name, "Song");
        assert_eq!(cleaned.album.as_deref(), Some("Album"));
    }

    #[test]
    fn disabled_cleanup_passes_everything_through() {
        let config = CleanupConfig {
            enabled: false,
            ..CleanupConfig::default()
        };
        let cleaner = TextCleaner::new(&config);
        let cleaned = cleaner.clean_patch(patch("Song [Explicit]", None));
        assert_eq!(cleaned.name, "Song [Explicit]");
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let config = CleanupConfig {
            enabled: true,
            patterns: vec!["[unclosed".into(), r"\s*\[Live\]".into()],
        };
        let cleaner = TextCleaner::new(&config);
        assert_eq!(cleaner.clean("Song [Live]"), "Song");
    }

    #[test]
    fn state_signals_pass_through_untouched() {
        let cleaner = TextCleaner::new(&CleanupConfig::default());
        let signal = cleaner.clean_signal(Signal::StateChanged(PlayerState::Paused));
        assert_eq!(signal, Signal::StateChanged(PlayerState::Paused));
    }
}
