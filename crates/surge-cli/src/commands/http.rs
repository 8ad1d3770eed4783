//! HTTP client for daemon communication

use reqwest::{Client, Response};
use serde::Deserialize;

/// Default daemon address, matching `daemon.bind_address`
pub const DEFAULT_DAEMON_URL: &str = "http://127.0.0.1:9300";

/// Get the daemon URL from environment or use default
pub fn daemon_url() -> String {
    std::env::var("SURGE_DAEMON_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| DEFAULT_DAEMON_URL.to_string())
}

/// Build a full API URL from a path such as `/api/v1/quote`
pub fn api_url(path: &str) -> String {
    format!("{}{}", daemon_url(), path)
}

/// Execute GET request
pub async fn get(url: &str) -> Result<Response, reqwest::Error> {
    Client::new().get(url).send().await
}

/// Execute POST request with JSON body
pub async fn post_json<T: serde::Serialize>(url: &str, body: &T) -> Result<Response, reqwest::Error> {
    Client::new().post(url).json(body).send().await
}

/// Error body returned by the daemon on failed requests
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl ApiErrorBody {
    /// Parse an error body, falling back to the raw text when it is not JSON
    pub fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_else(|_| Self {
            error: text.trim().to_string(),
            error_type: None,
            hint: None,
        })
    }

    pub fn render(&self) -> String {
        let mut out = match &self.error_type {
            Some(kind) => format!("Error ({kind}): {}", self.error),
            None => format!("Error: {}", self.error),
        };
        if let Some(hint) = &self.hint {
            out.push_str(&format!("\nHint: {hint}"));
        }
        out
    }
}
