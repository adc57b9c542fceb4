//! Validated, immutable lanes model.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::document::{DriverDocument, LaneRecord, StageRecord};
use super::error::ConfigError;
use crate::utils::resolve_user_path;

/// All lanes of a driver configuration, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneSet {
    lanes: Vec<Lane>,
}

/// A named sequence of stages sharing one working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lane {
    name: String,
    working_directory: PathBuf,
    stages: Vec<Stage>,
}

/// One configuration/epoch-boundary unit of a lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    name: String,
    until_epoch: u64,
    node_status_url: String,
    configuration_archive: String,
    bin: PathBuf,
    node_arguments: Vec<String>,
    with_db_lookup_extensions: bool,
    with_indexing: bool,
}

impl LaneSet {
    pub(crate) fn from_document(document: DriverDocument) -> Result<Self, ConfigError> {
        let records = document.lanes.unwrap_or_default();
        if records.is_empty() {
            return Err(ConfigError::NoLanes);
        }

        let lanes = records
            .into_iter()
            .map(Lane::from_record)
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(lane) = first_duplicate(lanes.iter().map(|lane| lane.name.as_str())) {
            return Err(ConfigError::DuplicateLane {
                lane: lane.to_string(),
            });
        }

        Ok(Self { lanes })
    }

    /// Lane names in document order.
    pub fn lane_names(&self) -> Vec<&str> {
        self.lanes.iter().map(|lane| lane.name.as_str()).collect()
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// Look up a lane by its (case-sensitive) name.
    pub fn lane(&self, name: &str) -> Result<&Lane, ConfigError> {
        self.lanes
            .iter()
            .find(|lane| lane.name == name)
            .ok_or_else(|| ConfigError::UnknownLane {
                lane: name.to_string(),
                known: self.lane_names().join(", "),
            })
    }
}

impl Lane {
    fn from_record(record: LaneRecord) -> Result<Self, ConfigError> {
        let name = record.name.unwrap_or_default();
        if name.is_empty() {
            return Err(ConfigError::MissingLaneName);
        }

        let working_directory = record.working_directory.unwrap_or_default();
        if working_directory.is_empty() {
            return Err(ConfigError::MissingLaneField {
                lane: name,
                field: "workingDirectory",
            });
        }

        let stage_records = record.stages.unwrap_or_default();
        if stage_records.is_empty() {
            return Err(ConfigError::MissingLaneField {
                lane: name,
                field: "stages",
            });
        }

        let stages = stage_records
            .into_iter()
            .map(|stage| Stage::from_record(&name, stage))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(stage) = first_duplicate(stages.iter().map(|stage| stage.name.as_str())) {
            return Err(ConfigError::DuplicateStage {
                lane: name.clone(),
                stage: stage.to_string(),
            });
        }

        Ok(Self {
            working_directory: resolve_user_path(&working_directory),
            name,
            stages,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute working directory shared by every stage of the lane.
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name.as_str()).collect()
    }

    /// Stages from `name` (inclusive) to the end of the lane.
    pub fn stages_from(&self, name: &str) -> Result<&[Stage], ConfigError> {
        let index = self
            .stages
            .iter()
            .position(|stage| stage.name == name)
            .ok_or_else(|| ConfigError::UnknownStage {
                lane: self.name.clone(),
                stage: name.to_string(),
                known: self.stage_names().join(", "),
            })?;

        Ok(&self.stages[index..])
    }
}

impl Stage {
    fn from_record(lane: &str, record: StageRecord) -> Result<Self, ConfigError> {
        let name = record.name.unwrap_or_default();
        if name.is_empty() {
            return Err(ConfigError::MissingStageName {
                lane: lane.to_string(),
            });
        }

        let missing = |field: &'static str| ConfigError::MissingStageField {
            lane: lane.to_string(),
            stage: name.clone(),
            field,
        };

        let until_epoch = match record.until_epoch {
            None => return Err(missing("untilEpoch")),
            Some(value) => u64::try_from(value)
                .ok()
                .filter(|epoch| *epoch > 0)
                .ok_or_else(|| ConfigError::NonPositiveEpoch {
                    lane: lane.to_string(),
                    stage: name.clone(),
                    value,
                })?,
        };

        let node_status_url = required(record.node_status_url, || missing("nodeStatusUrl"))?;
        let configuration_archive = required(record.configuration_archive, || {
            missing("configurationArchive")
        })?;
        let bin = required(record.bin, || missing("bin"))?;

        Ok(Self {
            until_epoch,
            node_status_url,
            configuration_archive,
            bin: resolve_user_path(&bin),
            node_arguments: record.node_arguments.unwrap_or_default(),
            with_db_lookup_extensions: record.with_db_lookup_extensions.unwrap_or(false),
            with_indexing: record.with_indexing.unwrap_or(false),
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exclusive progress boundary: the stage is done once progress exceeds it.
    pub fn until_epoch(&self) -> u64 {
        self.until_epoch
    }

    pub fn node_status_url(&self) -> &str {
        &self.node_status_url
    }

    pub fn configuration_archive(&self) -> &str {
        &self.configuration_archive
    }

    /// Directory that contains the node executable.
    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Raw node arguments, before `~` substitution.
    pub fn node_arguments(&self) -> &[String] {
        &self.node_arguments
    }

    pub fn with_db_lookup_extensions(&self) -> bool {
        self.with_db_lookup_extensions
    }

    pub fn with_indexing(&self) -> bool {
        self.with_indexing
    }
}

fn required(
    value: Option<String>,
    missing: impl FnOnce() -> ConfigError,
) -> Result<String, ConfigError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(missing()),
    }
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.into_iter().find(|name| !seen.insert(*name))
}
