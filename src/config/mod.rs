//! Lanes configuration: parsing, validation and lookups.
//!
//! A configuration document lists lanes, each with a working directory and an
//! ordered list of stages. The document is parsed into untyped records first
//! and then validated into an immutable [`LaneSet`]; validation fails fast on
//! the first problem and names the lane/stage it belongs to.

mod document;
mod error;
mod types;


use std::path::Path;

pub use document::DocumentFormat;
pub use error::ConfigError;
pub use types::{Lane, LaneSet, Stage};

use document::parse_document;

impl LaneSet {
    /// Read and validate a lanes document; the format follows the file extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let format = DocumentFormat::from_path(path);
        let document = parse_document(&content, format, &path.display().to_string())?;
        let lanes = Self::from_document(document)?;

        tracing::debug!(
            path = %path.display(),
            lanes = lanes.lanes().len(),
            "loaded lanes configuration"
        );
        Ok(lanes)
    }

    /// Parse and validate an in-memory document.
    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self, ConfigError> {
        let document = parse_document(content, format, "<inline>")?;
        Self::from_document(document)
    }

    /// Shorthand for [`LaneSet::parse`] with JSON.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, DocumentFormat::Json)
    }

    /// Validate an already-decoded JSON document.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let document = serde_json::from_value(value).map_err(|e| ConfigError::Parse {
            origin: "<value>".to_string(),
            message: e.to_string(),
        })?;
        Self::from_document(document)
    }
}
