//! Ctrl+C handling.
//!
//! The workflow never aborts an in-flight HTTP call. It checks the
//! [`CancelToken`] before starting a batch or a deletion, and races it
//! against the confirmation prompt.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Process exit code after cancellation (128 + SIGINT).
pub const EXIT_CANCELLED: u8 = 130;

/// Owns the cancellation channel and the signal listener.
pub struct CancelHandler {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for CancelHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandler {
    /// Creates a handler that has not been triggered.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Spawns the task that flips the token on SIGINT or SIGTERM.
    ///
    /// A second signal exits the process with [`EXIT_CANCELLED`] at once.
    #[cfg(unix)]
    pub fn spawn_listener(&self) {
        let tx = self.tx.clone();

        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};

            let (mut sigint, mut sigterm) =
                match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
                    (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
                    (Err(e), _) | (_, Err(e)) => {
                        warn!(error = %e, "failed to install signal handlers");
                        return;
                    }
                };

            loop {
                let name = tokio::select! {
                    Some(()) = sigint.recv() => "SIGINT",
                    Some(()) = sigterm.recv() => "SIGTERM",
                    else => break,
                };
                escalate(&tx, name);
            }
            debug!("signal listener stopped");
        });
    }

    /// Spawns the task that flips the token on Ctrl+C.
    ///
    /// A second Ctrl+C exits the process with [`EXIT_CANCELLED`] at once.
    #[cfg(not(unix))]
    pub fn spawn_listener(&self) {
        let tx = self.tx.clone();

        tokio::spawn(async move {
            while let Ok(()) = tokio::signal::ctrl_c().await {
                escalate(&tx, "Ctrl+C");
            }
        });
    }

    /// Returns a token observing this handler.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.rx.clone(),
        }
    }

    /// Programmatically cancels the run.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Cancels on the first signal and exits the process on the next one.
fn escalate(tx: &watch::Sender<bool>, signal: &str) {
    if is_repeat(tx) {
        warn!(signal, "interrupted again, exiting");
        eprintln!("\ninterrupted again, exiting");
        std::process::exit(i32::from(EXIT_CANCELLED));
    }
    info!(signal, "cancelling after the current request");
    eprintln!("\ncancelling after the current request (interrupt again to exit now)");
}

/// Requests cancellation; returns true if it had already been requested.
fn is_repeat(tx: &watch::Sender<bool>) -> bool {
    tx.send_replace(true)
}

/// Read side of the cancellation channel.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Returns a token that is never cancelled.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes when cancellation is requested.
    ///
    /// Pends forever if the handler is gone without having been triggered.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
