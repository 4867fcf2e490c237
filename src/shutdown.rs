//! Signal handling: translates SIGTERM/SIGINT into the shutdown watch
//! channel observed by the scheduler.
use tokio::sync::watch;
use tracing::{error, info};

/// Create the shutdown channel. The scheduler holds the receiver; the
/// signal task holds the sender.
pub fn channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Wait for a termination signal, then flip the shutdown flag.
pub async fn handle_signals(shutdown_tx: watch::Sender<bool>) {
    wait_for_signal().await;
    let _ = shutdown_tx.send(true);
}

/// Platform-specific signal handling implementation
#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM signal, initiating graceful shutdown");
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT signal, initiating graceful shutdown");
                }
            }
        }
        _ => {
            error!("Failed to install signal handlers, falling back to ctrl-c");
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Ctrl-C handler failed; shutting down");
            }
        }
    }
}

/// Platform-specific signal handling implementation
#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Ctrl-C handler failed; shutting down");
    } else {
        info!("Received Ctrl+C signal, initiating graceful shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_starts_unsignalled() {
        let (tx, rx) = channel();
        assert!(!*rx.borrow());
        tx.send(true).unwrap();
        assert!(*rx.borrow());
    }
}
