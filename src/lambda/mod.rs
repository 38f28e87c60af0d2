// src/lambda/mod.rs

//! AWS Lambda handler for the watcher.
//!
//! Each cron invocation performs exactly one run:
//! 1. Loads configuration (bundled TOML + environment secrets)
//! 2. Loads the seen-entry document
//! 3. Extracts every source and diffs against it
//! 4. Sends a digest and saves the merged document

use std::path::PathBuf;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config;
use crate::error::Result;
use crate::pipeline::{RunReport, run_once};

/// Environment variable pointing at the bundled config file.
pub const ENV_CONFIG_PATH: &str = "PAGEWATCH_CONFIG";

/// Lambda invocation payload. Scheduled events carry nothing we need.
#[derive(Debug, Default, Deserialize)]
pub struct WatchRequest {
    /// Extract and diff without notifying or saving
    #[serde(default)]
    pub dry_run: bool,
}

/// Returned to the invoker (and visible in the Lambda console).
#[derive(Debug, Default, Serialize)]
pub struct WatchResponse {
    /// Whether the run could start
    pub success: bool,

    /// Number of new entries reported
    pub new_entries: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RunReport>,

    /// Startup failure, if the run never began
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub execution_time_ms: u64,
}

#[instrument(skip(event))]
pub async fn handler(
    event: LambdaEvent<serde_json::Value>,
) -> std::result::Result<WatchResponse, LambdaError> {
    let start = std::time::Instant::now();
    let (payload, _context) = event.into_parts();

    // EventBridge schedule payloads don't match; treat them as a plain run.
    let request: WatchRequest = serde_json::from_value(payload).unwrap_or_default();
    info!("Starting run: dry_run={}", request.dry_run);

    match run_watch(&request).await {
        Ok(report) => {
            let response = WatchResponse {
                success: true,
                new_entries: report.new_count(),
                report: Some(report),
                error: None,
                execution_time_ms: start.elapsed().as_millis() as u64,
            };
            info!(
                "Run completed: {} new in {}ms",
                response.new_entries, response.execution_time_ms
            );
            Ok(response)
        }
        Err(e) => {
            error!("Run could not start: {}", e);
            Ok(WatchResponse {
                success: false,
                error: Some(e.to_string()),
                execution_time_ms: start.elapsed().as_millis() as u64,
                ..Default::default()
            })
        }
    }
}

/// Load and validate the bundled config, then run. Only an invalid config fails.
async fn run_watch(request: &WatchRequest) -> Result<RunReport> {
    let config_path =
        std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| "data/config.toml".to_string());
    let (config, secrets) = config::load_all(&PathBuf::from(config_path));
    config.validate()?;

    Ok(run_once(&config, &secrets, request.dry_run).await)
}
