//! Shazam recognition API client.
//!
//! Sends a captured clip as multipart form data to the RapidAPI Shazam
//! endpoint and interprets the JSON response. One request per invocation,
//! no retries.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::blocking::multipart;
use reqwest::StatusCode;
use serde::Deserialize;

use super::track::Track;
use crate::workflow::TrackIdentifier;

/// Multipart field name the recognition endpoint expects the clip under.
const UPLOAD_FIELD: &str = "upload_file";

/// Outcome of a recognition request that completed normally.
///
/// A 200 response without a `track` payload is a legitimate "no match",
/// distinct from transport or HTTP errors (which surface as `Err`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    /// The service identified the clip
    Match(Track),
    /// The service answered but found no matching song
    NoMatch,
}

/// Response body of the recognition endpoint.
#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    track: Option<Track>,
}

/// Client for the Shazam recognition endpoint.
pub struct ShazamClient {
    endpoint: String,
    api_host: String,
    api_key: String,
    http: reqwest::blocking::Client,
}

impl ShazamClient {
    /// Creates a client for the given endpoint with static RapidAPI credentials.
    ///
    /// # Errors
    /// - If the underlying HTTP client cannot be constructed
    pub fn new(endpoint: String, api_host: String, api_key: String) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            // Recognition of a 15s clip can take a while on the free tier.
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            endpoint,
            api_host,
            api_key,
            http,
        })
    }

    /// Uploads a captured clip and returns the recognition outcome.
    ///
    /// The clip file is read fully into memory up front, so no file handle is
    /// held across the network call.
    ///
    /// # Errors
    /// - If the clip file cannot be read
    /// - If the request fails at the transport level (connect, timeout)
    /// - If the service answers with a non-200 status (the numeric code is
    ///   part of the error message)
    /// - If the response body is not valid JSON
    pub fn identify(&self, clip_path: &Path) -> Result<Recognition> {
        let clip_data = std::fs::read(clip_path)
            .map_err(|e| anyhow!("Failed to read clip {}: {e}", clip_path.display()))?;

        let file_name = clip_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        tracing::info!(
            "Identifying clip {} ({} bytes)",
            clip_path.display(),
            clip_data.len()
        );

        let part = multipart::Part::bytes(clip_data)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| anyhow!("Failed to build upload part: {e}"))?;
        let form = multipart::Form::new().part(UPLOAD_FIELD, part);

        let response = match self
            .http
            .post(&self.endpoint)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.api_host)
            .multipart(form)
            .send()
        {
            Ok(resp) => resp,
            Err(e) => {
                let msg = if e.is_connect() {
                    "Failed to connect to the recognition service. Check your internet connection."
                        .to_string()
                } else if e.is_timeout() {
                    "Recognition request timed out. The service is not responding.".to_string()
                } else {
                    format!("Recognition request failed: {e}")
                };
                return Err(anyhow!(msg));
            }
        };

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| anyhow!("Failed to read recognition response: {e}"))?;

        interpret_response(status, &body)
    }
}

impl TrackIdentifier for ShazamClient {
    fn identify(&self, clip_path: &Path) -> Result<Recognition> {
        ShazamClient::identify(self, clip_path)
    }
}

/// Interprets a recognition response from its status code and raw body.
///
/// Kept free of any transport concerns so every branch of the response
/// handling can be exercised without a live endpoint.
///
/// # Errors
/// - If the status is not 200 (message carries the numeric code)
/// - If the body cannot be parsed as JSON
pub fn interpret_response(status: StatusCode, body: &str) -> Result<Recognition> {
    if !status.is_success() {
        return Err(anyhow!(
            "Recognition service error: status {}",
            status.as_u16()
        ));
    }

    let parsed: RecognizeResponse = serde_json::from_str(body)
        .map_err(|e| anyhow!("Failed to parse recognition response: {e}"))?;

    match parsed.track {
        Some(track) => {
            tracing::info!("Recognized: {}", track.summary());
            Ok(Recognition::Match(track))
        }
        None => {
            tracing::info!("Recognition returned no match");
            Ok(Recognition::NoMatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_response_yields_track_fields() {
        let body = r#"{
            "track": {
                "title": "Bohemian Rhapsody",
                "subtitle": "Queen",
                "album": "A Night at the Opera",
                "genres": { "primary": "Rock" }
            }
        }"#;

        let outcome = interpret_response(StatusCode::OK, body).unwrap();
        match outcome {
            Recognition::Match(track) => {
                assert_eq!(track.title, "Bohemian Rhapsody");
                assert_eq!(track.subtitle, "Queen");
                assert_eq!(track.album_display(), "A Night at the Opera");
                assert_eq!(track.genre_display(), "Rock");
            }
            Recognition::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn optional_fields_default_to_na() {
        let body = r#"{ "track": { "title": "X", "subtitle": "Y" } }"#;

        let outcome = interpret_response(StatusCode::OK, body).unwrap();
        match outcome {
            Recognition::Match(track) => {
                assert_eq!(track.album_display(), "N/A");
                assert_eq!(track.genre_display(), "N/A");
            }
            Recognition::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn missing_track_field_is_no_match_not_error() {
        let outcome = interpret_response(StatusCode::OK, r#"{"matches":[]}"#).unwrap();
        assert_eq!(outcome, Recognition::NoMatch);
    }

    #[test]
    fn non_200_is_error_carrying_status_code() {
        let err = interpret_response(StatusCode::TOO_MANY_REQUESTS, "").unwrap_err();
        assert!(err.to_string().contains("429"), "got: {err}");

        let err = interpret_response(StatusCode::INTERNAL_SERVER_ERROR, "{}").unwrap_err();
        assert!(err.to_string().contains("500"), "got: {err}");
    }

    #[test]
    fn malformed_body_is_error() {
        assert!(interpret_response(StatusCode::OK, "not json").is_err());
    }
}
