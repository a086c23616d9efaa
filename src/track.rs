// Track data model
// Canonical track representation shared by the event normalizer and the session

use std::fmt;

/// Playback state as reported by the player observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Playing,
    Paused,
    Stopped,
}

impl PlayerState {
    /// Parse a wire value case-insensitively. Unrecognized states (players
    /// also report things like "fast forwarding") yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "playing" => Some(Self::Playing),
            "paused" => Some(Self::Paused),
            "stopped" => Some(Self::Stopped),
            _ => None,
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Identity key for a track: `artist|name|album`, compared by exact string
/// match. Two payloads with the same key are the same ongoing track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackId(String);

impl TrackId {
    fn new(artist: &str, name: &str, album: &str) -> Self {
        Self(format!("{}|{}|{}", artist, name, album))
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The track currently observed in the player
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    pub artist: String,
    /// Empty when the player reported no album metadata
    pub album: String,
    /// 0 when the duration is unknown
    pub duration_secs: u64,
    /// Last observed playback offset
    pub position_secs: u64,
    pub state: PlayerState,
}

impl Track {
    pub fn id(&self) -> TrackId {
        TrackId::new(&self.artist, &self.name, &self.album)
    }

    /// Merge a partial update in place, overwriting only the fields the
    /// raw payload actually carried.
    pub fn apply(&mut self, patch: TrackPatch) {
        self.name = patch.name;
        self.artist = patch.artist;
        if let Some(album) = patch.album {
            self.album = album;
        }
        if let Some(duration) = patch.duration_secs {
            self.duration_secs = duration;
        }
        if let Some(position) = patch.position_secs {
            self.position_secs = position;
        }
        if let Some(state) = patch.state {
            self.state = state;
        }
    }
}

/// Partial track update produced by the normalizer. `name` and `artist` are
/// always present and non-empty; the rest only when the payload carried them.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPatch {
    pub name: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_secs: Option<u64>,
    pub position_secs: Option<u64>,
    pub state: Option<PlayerState>,
}

impl TrackPatch {
    /// Identity of the track this update describes. A missing album counts
    /// as the empty string, matching the normalized `Track` field.
    pub fn id(&self) -> TrackId {
        TrackId::new(&self.artist, &self.name, self.album.as_deref().unwrap_or(""))
    }

    /// Materialize a full track, defaulting the absent fields: no album,
    /// unknown duration, position 0, playing.
    pub fn into_track(self) -> Track {
        Track {
            name: self.name,
            artist: self.artist,
            album: self.album.unwrap_or_default(),
            duration_secs: self.duration_secs.unwrap_or(0),
            position_secs: self.position_secs.unwrap_or(0),
            state: self.state.unwrap_or(PlayerState::Playing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_state_parses_case_insensitively() {
        assert_eq!(PlayerState::parse("Playing"), Some(PlayerState::Playing));
        assert_eq!(PlayerState::parse("PAUSED"), Some(PlayerState::Paused));
        assert_eq!(PlayerState::parse("stopped"), Some(PlayerState::Stopped));
        assert_eq!(PlayerState::parse("fast forwarding"), None);
    }

    #[test]
    fn identity_is_artist_name_album() {
        let patch = TrackPatch {
            name: "X".into(),
            artist: "Y".into(),
            album: Some("Z".into()),
            duration_secs: None,
            position_secs: None,
            state: None,
        };
        assert_eq!(patch.id().to_string(), "Y|X|Z");

        let track = patch.into_track();
        assert_eq!(track.id().to_string(), "Y|X|Z");
    }

    #[test]
    fn missing_album_normalizes_to_empty_identity_segment() {
        let patch = TrackPatch {
            name: "X".into(),
            artist: "Y".into(),
            album: None,
            duration_secs: None,
            position_secs: None,
            state: None,
        };
        assert_eq!(patch.id().to_string(), "Y|X|");
        assert_eq!(patch.into_track().album, "");
    }

    #[test]
    fn into_track_fills_defaults() {
        let track = TrackPatch {
            name: "X".into(),
            artist: "Y".into(),
            album: None,
            duration_secs: None,
            position_secs: None,
            state: None,
        }
        .into_track();

        assert_eq!(track.duration_secs, 0);
        assert_eq!(track.position_secs, 0);
        assert_eq!(track.state, PlayerState::Playing);
    }

    #[test]
    fn apply_overwrites_only_present_fields() {
        let mut track = Track {
            name: "X".into(),
            artist: "Y".into(),
            album: "Z".into(),
            duration_secs: 200,
            position_secs: 10,
            state: PlayerState::Paused,
        };

        track.apply(TrackPatch {
            name: "X".into(),
            artist: "Y".into(),
            album: None,
            duration_secs: None,
            position_secs: Some(42),
            state: None,
        });

        assert_eq!(track.position_secs, 42);
        assert_eq!(track.album, "Z");
        assert_eq!(track.duration_secs, 200);
        assert_eq!(track.state, PlayerState::Paused);
    }
}
