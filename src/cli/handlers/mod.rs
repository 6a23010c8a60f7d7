//! Command handlers for CLI operations

pub mod jobs;
pub mod run;
pub mod worker;

pub use jobs::JobsCommandHandler;
pub use run::{RunCommandHandler, RunRequest};
pub use worker::WorkerCommandHandler;

use tokio::signal;

use crate::config::JobsConfig;
use crate::jobs::JobRegistry;
use crate::jobs::tasks::register_builtin_jobs;

/// Registry holding every built-in job, configured from `config`
pub(crate) fn builtin_registry(config: &JobsConfig) -> JobRegistry {
    let mut registry = JobRegistry::new();
    register_builtin_jobs(&mut registry, config);
    registry
}

/// Waits for Ctrl+C or SIGTERM.
///
/// A handler that cannot be installed is logged and never fires.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
