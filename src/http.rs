//! Blocking HTTP client helpers shared by status polling and archive downloads.

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Response};
use std::io::{Read, Write};
use std::time::Duration;

pub(crate) const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
pub(crate) const USER_AGENT: &str = concat!("multistage/", env!("CARGO_PKG_VERSION"));

/// Create an HTTP client with a connect timeout and a total request timeout.
pub(crate) fn create_http_client(request_timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS).min(request_timeout))
        .timeout(request_timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")
}

/// Return a descriptive error if the response is not a success.
pub(crate) fn validate_response_status(response: &Response, context: &str) -> Result<()> {
    if !response.status().is_success() {
        let status = response.status();
        bail!(
            "{}: HTTP {} - {}",
            context,
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown error")
        );
    }
    Ok(())
}

/// Stream a response body into `sink`, enforcing `max_size`.
///
/// The Content-Length header is checked first, then the limit is enforced
/// while streaming. Returns the number of bytes written.
pub(crate) fn download_with_limit<W: Write>(
    response: Response,
    max_size: u64,
    context: &str,
    sink: &mut W,
) -> Result<u64> {
    if let Some(content_length) = response.content_length() {
        if content_length > max_size {
            bail!(
                "{context}: Content-Length {content_length} bytes exceeds maximum allowed size of {max_size} bytes"
            );
        }
    }

    let mut reader = response;
    let mut total_read: u64 = 0;
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader
            .read(&mut buffer)
            .with_context(|| format!("{context}: failed to read response body"))?;
        if n == 0 {
            break;
        }
        total_read += n as u64;
        if total_read > max_size {
            bail!("{context}: download size exceeds maximum allowed size of {max_size} bytes");
        }
        sink.write_all(&buffer[..n])
            .with_context(|| format!("{context}: failed to write downloaded bytes"))?;
    }

    sink.flush()
        .with_context(|| format!("{context}: failed to flush downloaded bytes"))?;
    Ok(total_read)
}
