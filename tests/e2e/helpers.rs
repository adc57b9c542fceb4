//! Test helper functions for E2E tests

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::Write;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[path = "../../src/testing/mock_http.rs"]
mod mock_http;

pub use mock_http::{status_response, MockHttp};

/// Fake node body that never exits on its own
pub const RUN_FOREVER: &str = "exec sleep 60";

/// Status endpoint reporting `epoch_for(index)` for the zero-based request
/// index.
pub fn status_server<F>(epoch_for: F) -> MockHttp
where
    F: Fn(usize) -> u64 + Send + Sync + 'static,
{
    MockHttp::start(move |index| status_response(epoch_for(index), index as u64 * 100))
}

/// URL of a port nothing listens on
pub fn unreachable_status_url() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let url = format!("http://{}/node/status", listener.local_addr()?);
    drop(listener);
    Ok(url)
}

/// One stage of a test lane
pub struct StageFixture {
    pub name: &'static str,
    pub until_epoch: u64,
    /// Body of the fake node's `/bin/sh` script
    pub node_script: &'static str,
}

impl StageFixture {
    pub fn new(name: &'static str, until_epoch: u64, node_script: &'static str) -> Self {
        Self {
            name,
            until_epoch,
            node_script,
        }
    }
}

/// Scratch layout for a lane: fake nodes, config archives and a working directory
pub struct LaneFixture {
    pub temp: TempDir,
    pub document: Value,
}

impl LaneFixture {
    /// Build a lane named `main`; each stage's archive contains a single
    /// `cfg/stage.txt` holding the stage name.
    pub fn new(status_url: &str, stages: &[StageFixture]) -> Result<Self> {
        let temp = TempDir::new().context("Failed to create temp directory")?;
        let mut stage_values = Vec::new();

        for stage in stages {
            let bin = temp.path().join("releases").join(stage.name);
            write_fake_node(&bin, stage.node_script)?;

            let archive = temp.path().join("configs").join(format!("{}.zip", stage.name));
            write_config_archive(&archive, stage.name)?;

            stage_values.push(json!({
                "name": stage.name,
                "untilEpoch": stage.until_epoch,
                "nodeStatusUrl": status_url,
                "configurationArchive": archive,
                "bin": bin,
                "nodeArguments": ["--log-save", "--profile-mode"],
            }));
        }

        let document = json!({
            "lanes": [{
                "name": "main",
                "workingDirectory": temp.path().join("work"),
                "stages": stage_values,
            }]
        });

        Ok(Self { temp, document })
    }

    pub fn working_directory(&self) -> PathBuf {
        self.temp.path().join("work")
    }

    /// Write the lanes document next to the fixture and return its path.
    pub fn write_json(&self) -> Result<PathBuf> {
        let path = self.temp.path().join("lanes.json");
        fs::write(&path, serde_json::to_string_pretty(&self.document)?)
            .context("Failed to write lanes document")?;
        Ok(path)
    }

    pub fn write_yaml(&self) -> Result<PathBuf> {
        let path = self.temp.path().join("lanes.yaml");
        fs::write(&path, serde_yaml::to_string(&self.document)?)
            .context("Failed to write lanes document")?;
        Ok(path)
    }

    /// Whether the fake node of `stage` has been started.
    pub fn started(&self, stage: &str) -> bool {
        self.working_directory()
            .join(format!("{stage}.started"))
            .exists()
    }
}

/// Write `<bin>/node`: it records its start and the config it sees, then
/// runs `body`.
pub fn write_fake_node(bin: &Path, body: &str) -> Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(bin).context("Failed to create bin directory")?;
    let stage = bin
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let path = bin.join("node");
    let script = format!(
        "#!/bin/sh\n\
         cp config/stage.txt {stage}.seen-config\n\
         echo \"$@\" > {stage}.args\n\
         touch {stage}.started\n\
         {body}\n"
    );

    fs::write(&path, script).context("Failed to write fake node")?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .context("Failed to make fake node executable")?;
    Ok(path)
}

/// Write a zip holding `cfg/stage.txt` with `marker` as its content.
pub fn write_config_archive(path: &Path, marker: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path).context("Failed to create archive")?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    zip.add_directory("cfg/", options)?;
    zip.start_file("cfg/stage.txt", options)?;
    zip.write_all(marker.as_bytes())?;
    zip.finish()?;
    Ok(())
}
