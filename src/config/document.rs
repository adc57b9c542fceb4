//! Untyped (serde) shape of the lanes document.
//!
//! Every field is optional here; [`super::types`] turns these records into the
//! validated model and reports what is missing.

use serde::Deserialize;
use std::path::Path;

use super::error::ConfigError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DriverDocument {
    pub lanes: Option<Vec<LaneRecord>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct LaneRecord {
    pub name: Option<String>,
    pub working_directory: Option<String>,
    pub stages: Option<Vec<StageRecord>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct StageRecord {
    pub name: Option<String>,
    pub until_epoch: Option<i64>,
    pub node_status_url: Option<String>,
    pub configuration_archive: Option<String>,
    pub bin: Option<String>,
    pub node_arguments: Option<Vec<String>>,
    pub with_db_lookup_extensions: Option<bool>,
    pub with_indexing: Option<bool>,
}

/// Serialization format of a lanes document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Picks the format from the file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => Self::Yaml,
            Some("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

pub(crate) fn parse_document(
    content: &str,
    format: DocumentFormat,
    origin: &str,
) -> Result<DriverDocument, ConfigError> {
    let parsed = match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        DocumentFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    };

    parsed.map_err(|message| ConfigError::Parse {
        origin: origin.to_string(),
        message,
    })
}
