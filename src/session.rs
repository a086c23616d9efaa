// Playback session state
// Owns the single current track and its scrobble bookkeeping, and decides
// when a track has been played long enough to record a scrobble

use chrono::{DateTime, Utc};

use crate::track::{PlayerState, Track, TrackId, TrackPatch};

/// Longest wait before a track becomes eligible, whatever its duration
const SCROBBLE_CAP_SECS: u64 = 240; // 4 minutes

/// Scrobble bookkeeping for one track occurrence. Created fresh on every
/// track change, destroyed on stop, and otherwise only ever mutated to
/// record a confirmed scrobble.
#[derive(Debug, Clone)]
struct ScrobbleState {
    track_id: TrackId,
    started_at: DateTime<Utc>,
    scrobbled: bool,
}

/// Outcome of feeding a track update into the session
#[derive(Debug)]
pub enum TrackChange {
    /// A different identity took over; carries the new current track
    Started(Track),
    /// Same identity; present fields were merged in place
    Updated,
}

/// Everything the remote call needs to record one play
#[derive(Debug, Clone, PartialEq)]
pub struct ScrobbleRequest {
    pub track_id: TrackId,
    pub artist: String,
    pub name: String,
    pub album: String,
    /// Epoch seconds at which the occurrence started
    pub timestamp_secs: i64,
}

/// The session is `Idle` while `current` is absent and `Tracking` otherwise;
/// track and scrobble state always appear and disappear together.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<Track>,
    scrobble: Option<ScrobbleState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn is_tracking(&self) -> bool {
        self.current.is_some()
    }

    /// Feed a normalized track update into the session. A new identity
    /// replaces the current track and restarts scrobble bookkeeping,
    /// unconditionally discarding any prior progress; the same identity
    /// merges the update without touching the bookkeeping.
    pub fn apply_track(&mut self, patch: TrackPatch, now: DateTime<Utc>) -> TrackChange {
        if let Some(current) = self.current.as_mut().filter(|t| t.id() == patch.id()) {
            current.apply(patch);
            return TrackChange::Updated;
        }

        let track = patch.into_track();
        self.scrobble = Some(ScrobbleState {
            track_id: track.id(),
            started_at: now,
            scrobbled: false,
        });
        self.current = Some(track.clone());
        TrackChange::Started(track)
    }

    /// The player state changed without a track change; no-op while idle.
    pub fn apply_state(&mut self, state: PlayerState) {
        if let Some(track) = self.current.as_mut() {
            track.state = state;
        }
    }

    /// Playback stopped: forget the track and any scrobble progress.
    pub fn stop(&mut self) {
        self.current = None;
        self.scrobble = None;
    }

    /// Elapsed listening time required before a track may be scrobbled:
    /// half the duration, capped at four minutes. An unknown duration (0)
    /// makes the track eligible on the first check; that mirrors the
    /// player's reporting for tracks without duration metadata.
    fn threshold_secs(duration_secs: u64) -> u64 {
        (duration_secs / 2).min(SCROBBLE_CAP_SECS)
    }

    /// Periodic eligibility check. Returns the scrobble to submit once the
    /// current track has played long enough, at most once per occurrence
    /// and only while the player is actually playing.
    pub fn due_scrobble(&self, now: DateTime<Utc>) -> Option<ScrobbleRequest> {
        let track = self.current.as_ref()?;
        let state = self.scrobble.as_ref()?;

        if track.state != PlayerState::Playing || state.scrobbled {
            return None;
        }

        let elapsed = now.signed_duration_since(state.started_at).num_seconds().max(0) as u64;
        if elapsed < Self::threshold_secs(track.duration_secs) {
            return None;
        }

        Some(ScrobbleRequest {
            track_id: state.track_id.clone(),
            artist: track.artist.clone(),
            name: track.name.clone(),
            album: track.album.clone(),
            timestamp_secs: state.started_at.timestamp(),
        })
    }

    /// Record a confirmed scrobble. Ignored unless `id` still matches the
    /// live occurrence, so a late remote completion for an older track can
    /// never mark its successor as scrobbled.
    pub fn confirm_scrobbled(&mut self, id: &TrackId) -> bool {
        match self.scrobble.as_mut() {
            Some(state) if &state.track_id == id => {
                state.scrobbled = true;
                true
            }
            _ => false,
        }
    }
}
