//! Archive materialization.
//!
//! Fetches a zip archive (HTTP(S) URL, `file://` URL or local path), unpacks
//! it into a staging directory next to the destination, requires exactly one
//! top-level entry and moves that entry to the destination, replacing
//! whatever was there before. Other archive formats are rejected.

pub(crate) mod extract;


use anyhow::{anyhow, bail, Context, Result};
use reqwest::Url;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::TEMPORARY_DIRECTORIES_PREFIX;
use crate::http::{create_http_client, download_with_limit, validate_response_status};
use crate::utils::resolve_user_path;
use extract::extract_zip;

/// Maximum size of a downloaded archive (1 GiB).
pub(crate) const MAX_ARCHIVE_SIZE: u64 = 1024 * 1024 * 1024;

/// Total timeout for an archive download.
pub(crate) const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const DEFAULT_ARCHIVE_FILE_NAME: &str = "archive.zip";

const ZIP_SIGNATURES: [[u8; 4]; 2] = [*b"PK\x03\x04", *b"PK\x05\x06"];

/// Where an archive reference points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    Remote(Url),
    Local(PathBuf),
}

impl ArchiveSource {
    /// Classify a reference: `http(s)://` is remote, `file://` and anything
    /// else is a local path (with `~` expanded).
    pub fn parse(reference: &str) -> Result<Self> {
        if let Ok(url) = Url::parse(reference) {
            match url.scheme() {
                "http" | "https" => return Ok(Self::Remote(url)),
                "file" => {
                    let path = url
                        .to_file_path()
                        .map_err(|_| anyhow!("Invalid file URL for archive: {reference}"))?;
                    return Ok(Self::Local(path));
                }
                _ => {}
            }
        }

        Ok(Self::Local(resolve_user_path(reference)))
    }
}

/// Replace `destination` with the single top-level entry of the archive at
/// `reference`.
pub fn materialize(reference: &str, destination: &Path) -> Result<()> {
    let parent = destination.parent().ok_or_else(|| {
        anyhow!(
            "Destination {} has no parent directory",
            destination.display()
        )
    })?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory {}", parent.display()))?;

    let staging = tempfile::Builder::new()
        .prefix(TEMPORARY_DIRECTORIES_PREFIX)
        .tempdir_in(parent)
        .with_context(|| format!("Failed to create staging directory in {}", parent.display()))?;

    let archive_path = match ArchiveSource::parse(reference)? {
        ArchiveSource::Remote(url) => download_archive(&url, staging.path())?,
        ArchiveSource::Local(path) => {
            if !path.is_file() {
                bail!("Archive {} does not exist or is not a file", path.display());
            }
            path
        }
    };

    let checksum = compute_sha256_checksum(&archive_path)?;
    tracing::info!(archive = reference, sha256 = %checksum, "fetched archive");

    ensure_zip(&archive_path, reference)?;
    let extraction_path = staging.path().join("extracted");
    extract_zip(&archive_path, &extraction_path)
        .with_context(|| format!("Failed to unpack archive {reference}"))?;

    let top_level_entry = single_top_level_entry(&extraction_path, reference)?;

    tracing::debug!(
        entry = %top_level_entry.display(),
        destination = %destination.display(),
        "moving archive entry into place"
    );
    remove_existing(destination)?;
    fs::rename(&top_level_entry, destination).with_context(|| {
        format!(
            "Failed to move {} to {}",
            top_level_entry.display(),
            destination.display()
        )
    })?;

    Ok(())
}

/// Reject anything that does not start with a zip local-file or
/// end-of-central-directory signature.
fn ensure_zip(archive_path: &Path, reference: &str) -> Result<()> {
    let mut file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive {}", archive_path.display()))?;
    let mut signature = [0u8; 4];
    let is_zip = match file.read_exact(&mut signature) {
        Ok(()) => ZIP_SIGNATURES.contains(&signature),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => false,
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read archive {}", archive_path.display()))
        }
    };

    if !is_zip {
        bail!("Archive {reference} is not a zip file; only zip archives are supported");
    }
    Ok(())
}

fn download_archive(url: &Url, staging_dir: &Path) -> Result<PathBuf> {
    let file_name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_ARCHIVE_FILE_NAME);
    let download_path = staging_dir.join(file_name);

    tracing::info!(url = %url, path = %download_path.display(), "downloading archive");

    let client = create_http_client(DOWNLOAD_TIMEOUT)?;
    let response = client
        .get(url.clone())
        .send()
        .with_context(|| format!("Failed to download archive {url}"))?;
    validate_response_status(&response, &format!("Archive download failed ({url})"))?;

    let file = File::create(&download_path)
        .with_context(|| format!("Failed to create {}", download_path.display()))?;
    let mut writer = BufWriter::new(file);
    let bytes = download_with_limit(response, MAX_ARCHIVE_SIZE, "Archive download", &mut writer)?;

    tracing::debug!(url = %url, bytes, "archive downloaded");
    Ok(download_path)
}

/// Hex-encoded SHA-256 of a file.
pub(crate) fn compute_sha256_checksum(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Failed to hash {}", path.display()))?;
    Ok(hex::encode(hasher.finalize()))
}

fn single_top_level_entry(extraction_path: &Path, reference: &str) -> Result<PathBuf> {
    let entries = fs::read_dir(extraction_path)
        .with_context(|| format!("Failed to list {}", extraction_path.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list {}", extraction_path.display()))?;

    match <[PathBuf; 1]>::try_from(entries) {
        Ok([entry]) => Ok(entry),
        Err(entries) => bail!(
            "archive {reference} should contain exactly one top-level entry (found {})",
            entries.len()
        ),
    }
}

fn remove_existing(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to inspect {}", path.display()));
        }
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
    .with_context(|| format!("Failed to remove {}", path.display()))
}
