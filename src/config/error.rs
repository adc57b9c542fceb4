//! Configuration errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A malformed, incomplete or inconsistent lanes document.
///
/// Every variant names the offending lane and/or stage so the operator can
/// fix the document without guessing. These errors are always fatal and are
/// raised before any node process is spawned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse configuration document {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("'lanes' are required")]
    NoLanes,

    #[error("for all lanes, 'name' is required")]
    MissingLaneName,

    #[error("for lane '{lane}', '{field}' is required")]
    MissingLaneField { lane: String, field: &'static str },

    #[error("for lane '{lane}', all stages require a 'name'")]
    MissingStageName { lane: String },

    #[error("for stage '{stage}' of lane '{lane}', '{field}' is required")]
    MissingStageField {
        lane: String,
        stage: String,
        field: &'static str,
    },

    #[error(
        "for stage '{stage}' of lane '{lane}', 'untilEpoch' must be a positive integer (got {value})"
    )]
    NonPositiveEpoch {
        lane: String,
        stage: String,
        value: i64,
    },

    #[error("lane names must be unique, '{lane}' appears more than once")]
    DuplicateLane { lane: String },

    #[error("stage names must be unique within lane '{lane}', '{stage}' appears more than once")]
    DuplicateStage { lane: String, stage: String },

    #[error("unknown lane: '{lane}' (known lanes: {known})")]
    UnknownLane { lane: String, known: String },

    #[error("unknown stage '{stage}' in lane '{lane}' (known stages: {known})")]
    UnknownStage {
        lane: String,
        stage: String,
        known: String,
    },
}
