// Interactive Last.fm authentication
// Fetches a request token, has the user authorize it in the browser, then
// exchanges it for a permanent session key

use std::io::{self, Write};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::scrobbler::sign_params;

const API_URL: &str = "https://ws.audioscrobbler.com/2.0/";

/// Run the full authorization flow and return the session key.
pub fn authenticate(api_key: &str, api_secret: &str) -> Result<String> {
    println!("Starting Last.fm authentication...\n");

    let token = request_token(api_key)?;
    let auth_url = format!(
        "https://www.last.fm/api/auth/?api_key={}&token={}",
        api_key, token
    );

    println!("Authorize the application by visiting:\n\n  {}\n", auth_url);
    print!("Press ENTER once you have authorized... ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    println!("\nRequesting session key...");
    let session_key = request_session(api_key, api_secret, &token)?;
    println!("Session key obtained successfully!\n");

    Ok(session_key)
}

fn request_token(api_key: &str) -> Result<String> {
    let response: Value = attohttpc::get(API_URL)
        .params(&[
            ("method", "auth.getToken"),
            ("api_key", api_key),
            ("format", "json"),
        ])
        .send()
        .context("Failed to reach the Last.fm API")?
        .json()
        .context("Failed to decode token response")?;

    response
        .get("token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .context("Last.fm did not return an auth token")
}

fn request_session(api_key: &str, api_secret: &str, token: &str) -> Result<String> {
    let params = vec![
        ("method".to_string(), "auth.getSession".to_string()),
        ("api_key".to_string(), api_key.to_string()),
        ("token".to_string(), token.to_string()),
    ];
    let signature = sign_params(&params, api_secret);

    let mut query = params;
    query.push(("api_sig".to_string(), signature));
    query.push(("format".to_string(), "json".to_string()));

    let response: Value = attohttpc::get(API_URL)
        .params(&query)
        .send()
        .context("Failed to reach the Last.fm API")?
        .json()
        .context("Failed to decode session response")?;

    response
        .pointer("/session/key")
        .and_then(Value::as_str)
        .map(str::to_string)
        .context("Last.fm did not return a session key")
}
