//! Zip extraction with protections against zip slip and zip bomb archives.

use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

/// Maximum uncompressed size for any single entry (1 GiB).
pub(crate) const MAX_UNCOMPRESSED_SIZE: u64 = 1024 * 1024 * 1024;
/// Maximum compression ratio tolerated for large entries.
pub(crate) const MAX_COMPRESSION_RATIO: f64 = 100.0;
/// Entries below this size are exempt from the ratio check (highly repetitive
/// config files compress very well).
pub(crate) const RATIO_CHECK_MIN_SIZE: u64 = 1024 * 1024;
/// Maximum total extracted size for all entries combined (4 GiB).
pub(crate) const MAX_TOTAL_EXTRACTED_SIZE: u64 = 4 * 1024 * 1024 * 1024;

/// A reader wrapper that limits the number of bytes that can be read.
/// Used against archives that lie about their uncompressed size in headers.
pub(crate) struct LimitedReader<R> {
    inner: R,
    remaining: u64,
}

impl<R> LimitedReader<R> {
    pub(crate) fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            remaining: limit,
        }
    }
}

impl<R: Read> Read for LimitedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            // A zero-length read at the limit is still a clean EOF.
            let probe = self.inner.read(&mut [0u8; 1])?;
            if probe == 0 {
                return Ok(0);
            }
            return Err(io::Error::other(
                "archive entry exceeds maximum allowed size during extraction",
            ));
        }

        let max_read = std::cmp::min(buf.len() as u64, self.remaining) as usize;
        let bytes_read = self.inner.read(&mut buf[..max_read])?;
        self.remaining = self.remaining.saturating_sub(bytes_read as u64);

        Ok(bytes_read)
    }
}

/// Check an entry's declared sizes against the extraction limits.
pub(crate) fn validate_entry_size(name: &str, compressed: u64, uncompressed: u64) -> Result<()> {
    if uncompressed > MAX_UNCOMPRESSED_SIZE {
        bail!(
            "Archive entry '{}' too large: {} bytes (max: {} bytes)",
            name,
            uncompressed,
            MAX_UNCOMPRESSED_SIZE
        );
    }

    if compressed > 0 && uncompressed >= RATIO_CHECK_MIN_SIZE {
        let ratio = uncompressed as f64 / compressed as f64;
        if ratio > MAX_COMPRESSION_RATIO {
            bail!(
                "Suspicious compression ratio in '{}': {:.1}x (max: {:.1}x) - possible zip bomb",
                name,
                ratio,
                MAX_COMPRESSION_RATIO
            );
        }
    }

    Ok(())
}

/// Resolve an entry name under `dest_dir`, rejecting any path that could
/// escape it (`..` components, absolute paths, leading separators).
pub(crate) fn safe_extract_path(dest_dir: &Path, entry_name: &str) -> Result<PathBuf> {
    if entry_name.split(['/', '\\']).any(|part| part == "..") {
        bail!("Zip slip detected: path contains '..' component - '{entry_name}'");
    }

    let entry_path = Path::new(entry_name);
    if entry_path.is_absolute() || entry_name.starts_with('/') || entry_name.starts_with('\\') {
        bail!("Zip slip detected: absolute path in archive - '{entry_name}'");
    }

    fs::create_dir_all(dest_dir).context("Failed to create extraction directory")?;
    let canonical_dest = dest_dir
        .canonicalize()
        .context("Failed to canonicalize extraction directory")?;

    let mut normalized = canonical_dest.clone();
    for component in entry_path.components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                bail!("Zip slip detected: unsafe path component in '{entry_name}'");
            }
        }
    }

    if !normalized.starts_with(&canonical_dest) {
        bail!(
            "Zip slip detected: resolved path '{}' escapes extraction directory '{}'",
            normalized.display(),
            canonical_dest.display()
        );
    }

    Ok(normalized)
}

/// Unpack the zip archive at `archive_path` into `dest_dir`.
pub(crate) fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("Failed to read zip archive {}", archive_path.display()))?;

    fs::create_dir_all(dest_dir).context("Failed to create extraction directory")?;

    let mut total_extracted: u64 = 0;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("Failed to read entry #{index} of archive"))?;
        let name = entry.name().to_string();

        validate_entry_size(&name, entry.compressed_size(), entry.size())?;
        let out_path = safe_extract_path(dest_dir, &name)?;

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("Failed to create directory {}", out_path.display()))?;
            continue;
        }

        total_extracted = total_extracted.saturating_add(entry.size());
        if total_extracted > MAX_TOTAL_EXTRACTED_SIZE {
            bail!(
                "Archive {} exceeds maximum total extracted size of {} bytes",
                archive_path.display(),
                MAX_TOTAL_EXTRACTED_SIZE
            );
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let mut out_file = File::create(&out_path)
            .with_context(|| format!("Failed to create {}", out_path.display()))?;
        {
            let mut limited = LimitedReader::new(&mut entry, MAX_UNCOMPRESSED_SIZE);
            io::copy(&mut limited, &mut out_file)
                .with_context(|| format!("Failed to extract '{name}'"))?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode().filter(|mode| mode & 0o777 != 0) {
                fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o777))
                    .with_context(|| {
                        format!("Failed to set permissions on {}", out_path.display())
                    })?;
            }
        }
    }

    Ok(())
}
