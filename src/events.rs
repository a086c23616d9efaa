// Event normalization
// Converts raw observer payloads (current and legacy formats) into discrete
// track and player-state signals

use serde::Deserialize;

use crate::track::{PlayerState, TrackPatch};

/// One line of the observer's stdout stream
#[derive(Debug, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub timestamp: f64,
    pub data: Option<RawTrackData>,
}

/// Payload attached to an observer event; any subset of fields may be set.
/// Time fields are in milliseconds.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrackData {
    pub name: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub player_state: Option<String>,
    pub total_time: Option<f64>,
    pub elapsed_time: Option<f64>,
}

/// Signals extracted from one raw event
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Track metadata arrived; whether it starts a new track or refreshes
    /// the current one is the session's call.
    TrackData(TrackPatch),
    /// The player reported a non-stopped state change
    StateChanged(PlayerState),
    /// The player stopped; the current track is gone
    Stopped,
}

/// Parse one stream line. Malformed lines are dropped, never fatal.
pub fn parse_line(line: &str) -> Option<RawEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            log::warn!("Skipping malformed observer line {:?}: {}", line, e);
            None
        }
    }
}

/// Normalize a raw event into zero or more signals.
///
/// The primary `music_event` kind and the two legacy kinds (`track_info`
/// carrying only metadata, `player_state` carrying only state) funnel
/// through the same branches, so the stopped-wins rule and the track
/// identity invariant are enforced in exactly one place.
pub fn normalize(event: RawEvent) -> Vec<Signal> {
    log::debug!("Observer event {:?} (t={})", event.kind, event.timestamp);

    let data = match event.kind.as_str() {
        "music_event" | "track_info" | "player_state" => match event.data {
            Some(data) => data,
            None => return Vec::new(),
        },
        "unknown" => {
            log::debug!("Observer could not classify a player notification");
            return Vec::new();
        }
        other => {
            log::debug!("Ignoring observer event of kind {:?}", other);
            return Vec::new();
        }
    };

    let mut signals = Vec::new();

    let state = data.player_state.as_deref().and_then(|raw| {
        let parsed = PlayerState::parse(raw);
        if parsed.is_none() {
            log::debug!("Ignoring unrecognized player state {:?}", raw);
        }
        parsed
    });

    // A stop wins outright: no track processing happens for that event.
    if let Some(state) = state {
        if state == PlayerState::Stopped {
            signals.push(Signal::Stopped);
            return signals;
        }
        signals.push(Signal::StateChanged(state));
    }

    if let Some(patch) = track_patch(&data, state) {
        signals.push(Signal::TrackData(patch));
    }

    signals
}

/// Build a track update when the payload carries usable metadata, i.e. a
/// non-empty name and artist.
fn track_patch(data: &RawTrackData, state: Option<PlayerState>) -> Option<TrackPatch> {
    let name = data.name.as_deref().filter(|s| !s.is_empty())?;
    let artist = data.artist.as_deref().filter(|s| !s.is_empty())?;

    Some(TrackPatch {
        name: name.to_string(),
        artist: artist.to_string(),
        album: data.album.clone(),
        duration_secs: data.total_time.map(millis_to_secs),
        position_secs: data.elapsed_time.map(millis_to_secs),
        state,
    })
}

fn millis_to_secs(millis: f64) -> u64 {
    (millis / 1000.0).max(0.0).floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(json: &str) -> Vec<Signal> {
        normalize(parse_line(json).expect("valid event"))
    }

    #[test]
    fn malformed_lines_are_dropped() {
        assert!(parse_line("not json at all").is_none());
        assert!(parse_line("{\"type\": 42}").is_none());
        assert!(parse_line("").is_none());
    }

    #[test]
    fn full_music_event_yields_state_and_track() {
        let got = signals(
            r#"{"type":"music_event","timestamp":1700000000.5,"data":
                {"name":"X","artist":"Y","album":"Z","playerState":"Playing","totalTime":200000}}"#,
        );

        assert_eq!(got.len(), 2);
        assert_eq!(got[0], Signal::StateChanged(PlayerState::Playing));
        let Signal::TrackData(patch) = &got[1] else {
            panic!("expected a track update, got {:?}", got[1]);
        };
        assert_eq!(patch.name, "X");
        assert_eq!(patch.artist, "Y");
        assert_eq!(patch.album.as_deref(), Some("Z"));
        assert_eq!(patch.duration_secs, Some(200));
        assert_eq!(patch.state, Some(PlayerState::Playing));
    }

    #[test]
    fn stopped_suppresses_track_processing() {
        let got = signals(
            r#"{"type":"music_event","timestamp":0,"data":
                {"name":"X","artist":"Y","playerState":"Stopped"}}"#,
        );
        assert_eq!(got, vec![Signal::Stopped]);
    }

    #[test]
    fn legacy_track_info_matches_primary_shape() {
        let got = signals(
            r#"{"type":"track_info","timestamp":0,"data":
                {"name":"X","artist":"Y","totalTime":90500}}"#,
        );

        assert_eq!(got.len(), 1);
        let Signal::TrackData(patch) = &got[0] else {
            panic!("expected a track update");
        };
        assert_eq!(patch.duration_secs, Some(90));
        assert_eq!(patch.album, None);
        assert_eq!(patch.state, None);
        // absent state defaults to playing once materialized
        assert_eq!(
            patch.clone().into_track().state,
            PlayerState::Playing
        );
    }

    #[test]
    fn legacy_player_state_matches_primary_shape() {
        let got = signals(
            r#"{"type":"player_state","timestamp":0,"data":{"playerState":"Paused"}}"#,
        );
        assert_eq!(got, vec![Signal::StateChanged(PlayerState::Paused)]);

        let got = signals(
            r#"{"type":"player_state","timestamp":0,"data":{"playerState":"stopped"}}"#,
        );
        assert_eq!(got, vec![Signal::Stopped]);
    }

    #[test]
    fn time_fields_floor_to_whole_seconds() {
        let got = signals(
            r#"{"type":"music_event","timestamp":0,"data":
                {"name":"X","artist":"Y","totalTime":200999,"elapsedTime":1999}}"#,
        );
        let Signal::TrackData(patch) = &got[0] else {
            panic!("expected a track update");
        };
        assert_eq!(patch.duration_secs, Some(200));
        assert_eq!(patch.position_secs, Some(1));
    }

    #[test]
    fn empty_name_or_artist_is_not_a_track() {
        let got = signals(
            r#"{"type":"music_event","timestamp":0,"data":
                {"name":"","artist":"Y","playerState":"playing"}}"#,
        );
        assert_eq!(got, vec![Signal::StateChanged(PlayerState::Playing)]);
    }

    #[test]
    fn unrecognized_state_is_ignored_but_track_survives() {
        let got = signals(
            r#"{"type":"music_event","timestamp":0,"data":
                {"name":"X","artist":"Y","playerState":"fast forwarding"}}"#,
        );
        assert_eq!(got.len(), 1);
        assert!(matches!(&got[0], Signal::TrackData(patch) if patch.state.is_none()));
    }

    #[test]
    fn unknown_kinds_and_missing_data_yield_nothing() {
        assert!(signals(r#"{"type":"unknown","timestamp":0}"#).is_empty());
        assert!(signals(r#"{"type":"music_event","timestamp":0}"#).is_empty());
        assert!(signals(r#"{"type":"heartbeat","timestamp":0,"data":{}}"#).is_empty());
    }
}
