//! Subscription sources
//!
//! Reading local files and fetching subscription URLs. These are the only
//! places that block on I/O; the parsed text is handed to the node manager
//! afterwards.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};
use crate::get_version;

/// Settings for fetching remote subscriptions
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Upper bound for a whole fetch, including the body
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("nodeparse/{}", get_version()),
        }
    }
}

// ============================================================================
// Path Utilities
// ============================================================================

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &str) -> String {
    if (path.starts_with("~/") || path == "~")
        && let Some(home) = dirs_home()
    {
        return path.replacen("~", &home, 1);
    }
    path.to_string()
}

/// Get home directory path
pub fn dirs_home() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok()
    }
}

/// Whether a source string names an HTTP(S) URL
pub fn is_url(path_or_url: &str) -> bool {
    path_or_url.starts_with("http://") || path_or_url.starts_with("https://")
}

// ============================================================================
// Loading
// ============================================================================

/// Read a local subscription file
pub async fn read_file(path: &Path) -> Result<String> {
    debug!("Reading file: {}", path.display());
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Fetch text content from a URL
///
/// Any non-2xx status is an error.
pub async fn fetch_text(url: &str, options: &SourceOptions) -> Result<String> {
    debug!("Fetching URL: {}", url);

    let fetch_error = |source: reqwest::Error| Error::Fetch {
        url: url.to_string(),
        source,
    };

    let client = reqwest::Client::builder()
        .user_agent(options.user_agent.as_str())
        .timeout(options.timeout)
        .build()
        .map_err(fetch_error)?;

    let response = client.get(url).send().await.map_err(fetch_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status {
            url: url.to_string(),
            status,
        });
    }

    response.text().await.map_err(fetch_error)
}

/// Load text from a URL or a file path (with `~` expansion)
pub async fn load_text(path_or_url: &str, options: &SourceOptions) -> Result<String> {
    if is_url(path_or_url) {
        fetch_text(path_or_url, options).await
    } else {
        let expanded = expand_tilde(path_or_url);
        read_file(Path::new(&expanded)).await
    }
}
