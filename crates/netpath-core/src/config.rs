//! Client configuration: backend location, timeouts, output surface.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::weights::WeightVector;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_OUTPUT: &str = "netpath.png";

/// Pixel dimensions of the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 900,
        }
    }
}

/// Top-level Netpath client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Absolute base URL of the backend, e.g. `http://localhost:5000`.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Where the file surface writes the current frame.
    pub output_path: PathBuf,
    /// Initial display surface size.
    pub viewport: Viewport,
    /// Weights the controller starts with.
    pub default_weights: WeightVector,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            viewport: Viewport::default(),
            default_weights: WeightVector::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("NETPATH_BACKEND_URL") {
            config.base_url = url;
        }
        config.timeout_secs = std::env::var("NETPATH_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if let Ok(path) = std::env::var("NETPATH_OUTPUT") {
            config.output_path = PathBuf::from(path);
        }

        config
    }

    /// Point the client at another backend.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Join the base URL with an API path such as `/api/network/init`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Reject settings the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(Error::Config("backend URL is empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "backend URL must be absolute http(s), got '{}'",
                url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout must be at least one second".into()));
        }
        Ok(())
    }
}
