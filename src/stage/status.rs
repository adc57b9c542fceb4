//! Node status endpoint client
//!
//! The node answers `GET <status url>` with a JSON document whose
//! `data.metrics` object carries the current epoch and nonce, either as JSON
//! numbers or as numeric strings.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use crate::constants::metrics;
use crate::http::create_http_client;

/// Progress reported by a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeProgress {
    pub epoch: u64,
    pub nonce: u64,
}

/// Polls one node status endpoint
pub struct StatusProbe {
    client: Client,
    url: String,
}

impl StatusProbe {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_http_client(timeout)?,
            url: url.to_string(),
        })
    }

    /// Query the endpoint once.
    pub fn fetch(&self) -> Result<NodeProgress> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .with_context(|| format!("Failed to query node status at {}", self.url))?;

        if response.status() != StatusCode::OK {
            bail!(
                "Node status endpoint {} returned HTTP {}",
                self.url,
                response.status().as_u16()
            );
        }

        let body: Value = response
            .json()
            .with_context(|| format!("Node status at {} is not valid JSON", self.url))?;

        parse_status(&body).ok_or_else(|| {
            anyhow!(
                "Node status at {} has no numeric data.metrics.{} (or a malformed {})",
                self.url,
                metrics::EPOCH_NUMBER,
                metrics::NONCE
            )
        })
    }

    /// Query the endpoint once, treating any failure as no progress.
    pub fn current_progress(&self) -> NodeProgress {
        match self.fetch() {
            Ok(progress) => {
                tracing::info!(
                    epoch = progress.epoch,
                    nonce = progress.nonce,
                    "node progress"
                );
                progress
            }
            Err(e) => {
                tracing::warn!(url = %self.url, error = %format!("{e:#}"), "status query failed");
                NodeProgress::default()
            }
        }
    }
}

/// Extract progress from a status document.
///
/// The epoch is mandatory. An absent nonce reads as zero, but a nonce that
/// is present and not numeric makes the whole document unreadable.
pub fn parse_status(body: &Value) -> Option<NodeProgress> {
    let metrics = body.get("data")?.get("metrics")?;
    let epoch = metric_value(metrics.get(metrics::EPOCH_NUMBER)?)?;
    let nonce = match metrics.get(metrics::NONCE) {
        Some(value) => metric_value(value)?,
        None => 0,
    };

    Some(NodeProgress { epoch, nonce })
}

fn metric_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
