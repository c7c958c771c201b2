//! Run configuration
//!
//! A TOML file (local or remote) listing subscription sources and output
//! settings. Command-line flags are layered on top of it.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::export::OutputFormat;
use crate::source::{self, SourceOptions};

// ============================================================================
// Config Types
// ============================================================================

/// Run configuration parsed from TOML
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    /// Subscription sources, each a file path or an http(s) URL
    #[serde(default)]
    pub sources: Vec<String>,

    /// Output file path, stdout when absent
    #[serde(default)]
    pub output: Option<String>,

    /// Output format, default "yaml"
    #[serde(default)]
    pub format: OutputFormat,

    /// Timeout for a single subscription fetch in seconds, default 30
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// User agent sent when fetching subscriptions
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            output: None,
            format: OutputFormat::default(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            user_agent: None,
        }
    }
}

// ============================================================================
// Config Implementation
// ============================================================================

impl Config {
    /// Parse config from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config TOML")?;

        if config.fetch_timeout_secs == 0 {
            anyhow::bail!("fetch_timeout_secs must be greater than 0");
        }

        Ok(config)
    }

    /// Load config from file path
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = source::read_file(path)
            .await
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        Self::from_toml(&content)
    }

    /// Load config from URL
    pub async fn from_url(url: &str) -> Result<Self> {
        let content = source::fetch_text(url, &SourceOptions::default())
            .await
            .with_context(|| format!("Failed to fetch config from {}", url))?;
        Self::from_toml(&content)
    }

    /// Load config from file path or URL
    pub async fn load(path_or_url: &str) -> Result<Self> {
        if source::is_url(path_or_url) {
            Self::from_url(path_or_url).await
        } else {
            let expanded = source::expand_tilde(path_or_url);
            Self::from_file(Path::new(&expanded)).await
        }
    }

    /// Applies command-line flags: sources are appended (every `--url`, then
    /// every `--file`), output and format replace the configured values
    pub fn with_args(mut self, args: &Args) -> Self {
        self.sources.extend(args.url.iter().cloned());
        self.sources.extend(args.file.iter().cloned());
        if let Some(output) = &args.output {
            self.output = Some(output.clone());
        }
        if let Some(format) = args.format {
            self.format = format;
        }
        self
    }

    /// Options for the subscription loaders
    pub fn source_options(&self) -> SourceOptions {
        let defaults = SourceOptions::default();
        SourceOptions {
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}

fn default_fetch_timeout_secs() -> u64 {
    30
}
