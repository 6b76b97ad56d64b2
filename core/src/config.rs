//! Client configuration.
//!
//! The base URL is always explicit. `for_host` and `from_env` are helpers for
//! callers that want the backend's conventional `http://<host>:8000/api/v1`
//! layout; the client itself never inspects its environment.

use std::env;

/// Port the NotionShare backend listens on.
pub const DEFAULT_PORT: u16 = 8000;

/// Path prefix of every API route.
pub const API_PREFIX: &str = "/api/v1";

/// Full base URL override, e.g. `https://share.example.com/api/v1`.
pub const API_URL_ENV: &str = "NOTIONSHARE_API_URL";

/// Backend host name used with `DEFAULT_PORT` and `API_PREFIX`.
pub const API_HOST_ENV: &str = "NOTIONSHARE_HOST";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn for_host(host: &str) -> Self {
        Self::new(&format!("http://{host}:{DEFAULT_PORT}{API_PREFIX}"))
    }

    /// `NOTIONSHARE_API_URL` if set, otherwise `for_host` with
    /// `NOTIONSHARE_HOST` (default `localhost`).
    pub fn from_env() -> Self {
        if let Ok(url) = env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                return Self::new(url.trim());
            }
        }
        let host = env::var(API_HOST_ENV).unwrap_or_else(|_| "localhost".to_string());
        Self::for_host(&host)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_host("localhost")
    }
}
