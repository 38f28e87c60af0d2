//! Lambda entry point for pagewatch.
//!
//! Designed to run on AWS Lambda behind an EventBridge cron schedule.
//!
//! ## Environment Variables
//!
//! - `TELEGRAM_BOT_TOKEN`: Bot credential for the digest
//! - `TELEGRAM_CHAT_ID`: Destination chat
//! - `GIST_TOKEN`: GitHub token for the state gist
//! - `GIST_ID`: Overrides `store.gist_id`
//! - `PAGEWATCH_CONFIG`: Path to the bundled config (default: `data/config.toml`)
//! - `RUST_LOG`: Log level (e.g., `info`, `debug`)

use lambda_runtime::service_fn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    // Initialize tracing for Lambda
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("pagewatch Lambda starting...");

    // Run Lambda handler
    lambda_runtime::run(service_fn(pagewatch::lambda::handler)).await
}
