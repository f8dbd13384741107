//! Process-wide shutdown state.
//!
//! Ctrl+C flips `SHUTDOWN` and wakes every [`ShutdownSignal`] handed out by
//! [`setup_shutdown_handler`]. Long-running loops select on the signal so
//! they stop at their next await point.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Sender side of the process shutdown signal
static SHUTDOWN_TX: OnceLock<ShutdownTrigger> = OnceLock::new();

// =============================================================================
// Signal
// =============================================================================

/// Fires the paired [`ShutdownSignal`]s.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}

/// Awaitable shutdown notification. Clones observe the same trigger.
#[derive(Debug, Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once shutdown is requested.
    ///
    /// A dropped trigger counts as "never": the future stays pending.
    pub async fn triggered(&mut self) {
        if self.0.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Create a linked trigger/signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), ShutdownSignal(rx))
}

// =============================================================================
// Ctrl+C
// =============================================================================

/// Install the global Ctrl+C handler. Call once at program start.
///
/// A second Ctrl+C exits immediately.
pub fn setup_shutdown_handler() -> anyhow::Result<ShutdownSignal> {
    let (trigger, signal) = shutdown_channel();
    let _ = SHUTDOWN_TX.set(trigger);

    ctrlc::set_handler(|| {
        if SHUTDOWN.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        crate::log!("push"; "shutting down...");
        if let Some(tx) = SHUTDOWN_TX.get() {
            tx.trigger();
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))?;

    Ok(signal)
}

// =============================================================================
// Tests
// =============================================================================
