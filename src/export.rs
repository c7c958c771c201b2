//! Export rendering
//!
//! Turns the list of Clash proxy mappings into a YAML document
//! (`proxies: [...]`, as Clash reads it) or a JSON array.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use crate::error::{Error, Result};

/// Output document format
#[derive(Serialize, Deserialize, ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Serialize)]
struct ClashDocument<'a> {
    proxies: &'a [Mapping],
}

/// Render exported proxies in the given format
pub fn render(proxies: &[Mapping], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(&ClashDocument { proxies })
            .map_err(|e| Error::Render(e.to_string())),
        OutputFormat::Json => {
            serde_json::to_string_pretty(proxies).map_err(|e| Error::Render(e.to_string()))
        }
    }
}
