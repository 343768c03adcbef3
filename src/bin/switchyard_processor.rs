//! Runs the message processing loop against the configured store.
//!
//! Usage:
//!
//! ```text
//! switchyard-processor
//! ```
//!
//! Connection and loop settings come from `SWITCHYARD_*` environment
//! variables (see [`switchyard::config`]). Log verbosity follows `RUST_LOG`
//! and defaults to `switchyard=info`. The process exits non-zero when the
//! store cannot be reached at startup, and stops the loop cleanly on Ctrl-C.

use std::process::ExitCode;

use switchyard::config::{MessagingConfig, ProcessorConfig};
use switchyard::messaging::error::MessagingError;
use switchyard::messaging::hub::MessagingHub;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "switchyard=info";

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(
                error = %err,
                unavailable = err.is_unavailable(),
                "processor exited with error"
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

async fn run() -> Result<(), MessagingError> {
    let messaging = MessagingConfig::from_env();
    let processing = ProcessorConfig::from_env();
    tracing::info!(config = ?messaging, "starting message processor");

    let hub = MessagingHub::connect(&messaging).await?;
    let processor = hub.processor(processing);
    processor.start().await?;

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "could not listen for Ctrl-C; stopping");
    }

    let metrics = processor.stop().await?;
    let status = hub.status().await;
    tracing::info!(
        dispatched = metrics.dispatched,
        expired = metrics.expired,
        handler_failures = metrics.handler_failures,
        cycle_errors = metrics.cycle_errors,
        connected = status.connected,
        critical_backlog = status.critical_backlog,
        "message processor shut down"
    );
    Ok(())
}
