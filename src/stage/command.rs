//! Building and spawning the node command of a stage

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::config::Stage;
use crate::constants::{DB_LOOKUP_EXTENSIONS_ARG, INDEXING_ARG, NODE_EXECUTABLE_NAME};
use crate::process::apply_open_files_limit;
use crate::utils::substitute_home;

#[cfg(target_os = "macos")]
const LIBRARY_PATH_VAR: &str = "DYLD_LIBRARY_PATH";
#[cfg(not(target_os = "macos"))]
const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";

/// Fully resolved node invocation for one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCommand {
    program: PathBuf,
    arguments: Vec<String>,
    working_directory: PathBuf,
    open_files_limit: u64,
}

impl NodeCommand {
    pub fn for_stage(stage: &Stage, working_directory: &Path, open_files_limit: u64) -> Self {
        Self {
            program: stage.bin().join(NODE_EXECUTABLE_NAME),
            arguments: node_arguments(stage),
            working_directory: working_directory.to_path_buf(),
            open_files_limit,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Shell-escaped command line, for logs.
    pub fn display(&self) -> String {
        let program = self.program.to_string_lossy();
        std::iter::once(program)
            .chain(self.arguments.iter().map(|a| Cow::Borrowed(a.as_str())))
            .map(shell_escape::escape)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Start the node with stdout discarded and stderr inherited.
    pub fn spawn(&self) -> Result<Child> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.arguments)
            .current_dir(&self.working_directory)
            .env(LIBRARY_PATH_VAR, &self.working_directory)
            .stdout(Stdio::null());
        apply_open_files_limit(&mut command, self.open_files_limit);

        command
            .spawn()
            .with_context(|| format!("Failed to start node {}", self.program.display()))
    }
}

/// Stage arguments with `~` substituted, followed by the feature flags.
pub fn node_arguments(stage: &Stage) -> Vec<String> {
    let mut arguments: Vec<String> = stage
        .node_arguments()
        .iter()
        .map(|argument| substitute_home(argument))
        .collect();

    if stage.with_db_lookup_extensions() {
        arguments.push(DB_LOOKUP_EXTENSIONS_ARG.to_string());
    }
    if stage.with_indexing() {
        arguments.push(INDEXING_ARG.to_string());
    }

    arguments
}
