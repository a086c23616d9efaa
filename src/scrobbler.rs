// Last.fm web service client
// Signs and submits now-playing and scrobble requests

use anyhow::{bail, Context, Result};
use serde_json::Value;

const API_URL: &str = "https://ws.audioscrobbler.com/2.0/";

/// Remote scrobbling operations the monitor depends on. Both calls are
/// fire-and-forget from the session's perspective: a failure is reported,
/// never escalated.
pub trait ScrobbleService: Send + Sync {
    /// Announce that a track has started playing
    fn now_playing(&self, artist: &str, track: &str, album: Option<&str>) -> Result<()>;

    /// Record a completed listen with the occurrence's start time
    fn scrobble(
        &self,
        artist: &str,
        track: &str,
        album: Option<&str>,
        timestamp_secs: i64,
    ) -> Result<()>;
}

pub struct LastFm {
    api_key: String,
    api_secret: String,
    session_key: String,
}

impl LastFm {
    pub fn new(api_key: String, api_secret: String, session_key: String) -> Self {
        Self {
            api_key,
            api_secret,
            session_key,
        }
    }

    /// Sign and send one authenticated API call, decoding the JSON reply.
    fn call(&self, mut params: Vec<(String, String)>) -> Result<Value> {
        params.push(("api_key".to_string(), self.api_key.clone()));
        params.push(("sk".to_string(), self.session_key.clone()));

        let signature = sign_params(&params, &self.api_secret);
        params.push(("api_sig".to_string(), signature));
        params.push(("format".to_string(), "json".to_string()));

        let response = attohttpc::post(API_URL)
            .params(&params)
            .send()
            .context("Failed to reach the Last.fm API")?;
        let status = response.status();
        let body: Value = response
            .json()
            .context("Failed to decode Last.fm response")?;

        if let Some(message) = api_error(&body) {
            bail!("Last.fm API error: {}", message);
        }
        if !status.is_success() {
            bail!("Last.fm API returned HTTP {}", status);
        }

        Ok(body)
    }
}

impl ScrobbleService for LastFm {
    fn now_playing(&self, artist: &str, track: &str, album: Option<&str>) -> Result<()> {
        let mut params = vec![
            ("method".to_string(), "track.updateNowPlaying".to_string()),
            ("artist".to_string(), artist.to_string()),
            ("track".to_string(), track.to_string()),
        ];
        if let Some(album) = album {
            params.push(("album".to_string(), album.to_string()));
        }

        self.call(params)?;
        log::info!("Last.fm: now playing updated");
        Ok(())
    }

    fn scrobble(
        &self,
        artist: &str,
        track: &str,
        album: Option<&str>,
        timestamp_secs: i64,
    ) -> Result<()> {
        let mut params = vec![
            ("method".to_string(), "track.scrobble".to_string()),
            ("artist".to_string(), artist.to_string()),
            ("track".to_string(), track.to_string()),
            ("timestamp".to_string(), timestamp_secs.to_string()),
        ];
        if let Some(album) = album {
            params.push(("album".to_string(), album.to_string()));
        }

        self.call(params)?;
        log::info!("Last.fm: scrobbled successfully");
        Ok(())
    }
}

/// Extract the message from an API-level error reply, if it is one.
fn api_error(body: &Value) -> Option<String> {
    body.get("error")?;
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    Some(message.to_string())
}

/// Last.fm request signature: parameters sorted by name, concatenated as
/// `keyvalue`, shared secret appended, md5-hexed. `format` and `api_sig`
/// never participate, so they are pushed only after signing.
pub fn sign_params(params: &[(String, String)], secret: &str) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut payload = String::new();
    for (key, value) in sorted {
        payload.push_str(key);
        payload.push_str(value);
    }
    payload.push_str(secret);

    format!("{:x}", md5::compute(payload.as_bytes()))
}
