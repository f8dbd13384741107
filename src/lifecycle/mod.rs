//! Connection Lifecycle
//!
//! Keeps the push socket alive for the lifetime of the page:
//!
//! ```text
//! connection() ─▶ announce (queued) ─▶ open() ─▶ pump frames ─▶ closed/error
//!      ▲                                  │ fail                     │
//!      └────────── backoff delay ◀────────┴──────────────────────────┘
//! ```
//!
//! Every new connection announces the page location exactly once. The delay
//! resets after a successful open. The loop ends on shutdown or when the
//! attempt limit is reached.
//!
//! # Modules
//!
//! - `backoff` - Exponential reconnect delays with an optional attempt limit

mod backoff;

use tokio::time::sleep;

pub use backoff::{Backoff, BackoffPolicy};

use crate::core::ShutdownSignal;
use crate::protocol::{InboundMessage, PushFrame};
use crate::transport::PushChannel;

/// Why [`ConnectionManager::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleExit {
    Shutdown,
    AttemptsExhausted,
}

/// Drives the push socket and feeds every inbound update to a dispatcher.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    channel: PushChannel,
    page_id: String,
    policy: BackoffPolicy,
}

impl ConnectionManager {
    pub fn new(channel: PushChannel, page_id: impl Into<String>, policy: BackoffPolicy) -> Self {
        Self {
            channel,
            page_id: page_id.into(),
            policy,
        }
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    /// Run until shutdown or until reconnecting gives up.
    pub async fn run<F>(&self, mut shutdown: ShutdownSignal, mut dispatch: F) -> LifecycleExit
    where
        F: FnMut(InboundMessage),
    {
        let mut backoff = Backoff::new(self.policy.clone());

        loop {
            if shutdown.is_triggered() {
                return LifecycleExit::Shutdown;
            }

            let mut conn = self.channel.connection();
            // Queued until open; cannot fail while connecting
            conn.send(PushFrame::location(&self.page_id)).await.ok();

            let opened = tokio::select! {
                result = conn.open() => result,
                _ = shutdown.triggered() => return LifecycleExit::Shutdown,
            };

            match opened {
                Ok(()) => {
                    backoff.reset();
                    crate::log!("push"; "connected to {} as {}", self.channel.url(), self.page_id);

                    loop {
                        let next = tokio::select! {
                            next = conn.next_message() => next,
                            _ = shutdown.triggered() => {
                                conn.close().await;
                                return LifecycleExit::Shutdown;
                            }
                        };
                        match next {
                            Some(Ok(msg)) => dispatch(msg),
                            Some(Err(e)) => {
                                crate::log!("push"; "connection lost: {}", e);
                                break;
                            }
                            None => {
                                crate::log!("push"; "connection closed by server");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    crate::debug!("push"; "connect failed: {}", e);
                }
            }

            let Some(delay) = backoff.next_delay() else {
                crate::log!("push"; "giving up after {} attempts", backoff.attempts());
                return LifecycleExit::AttemptsExhausted;
            };
            crate::debug!("push"; "reconnecting in {}ms", delay.as_millis());

            tokio::select! {
                _ = sleep(delay) => {}
                _ = shutdown.triggered() => return LifecycleExit::Shutdown,
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shutdown_channel;
    use crate::testing::{PushScript, spawn_push_server};
    use serde_json::json;
    use std::time::Duration;

    fn fast_policy(max_attempts: u32) -> BackoffPolicy {
        BackoffPolicy {
            initial: Duration::from_millis(10),
            max: Duration::from_millis(40),
            multiplier: 2.0,
            max_attempts,
        }
    }

    fn update(n: u32) -> String {
        json!({"state": {"n": n}, "changes": {}}).to_string()
    }

    #[tokio::test]
    async fn test_reconnects_and_announces_once_per_connection() {
        let server = spawn_push_server(vec![
            PushScript::after_announce(vec![update(1)]),
            PushScript::after_announce(vec![update(2)]),
        ]);
        let manager = ConnectionManager::new(
            PushChannel::new(server.url(), Duration::from_secs(2)),
            "/about",
            fast_policy(2),
        );
        let (_trigger, signal) = shutdown_channel();

        let mut seen = Vec::new();
        let exit = tokio::time::timeout(
            Duration::from_secs(10),
            manager.run(signal, |msg| seen.push(msg.state.as_value()["n"].clone())),
        )
        .await
        .unwrap();

        assert_eq!(exit, LifecycleExit::AttemptsExhausted);
        assert_eq!(seen, vec![json!(1), json!(2)]);

        let announce = PushFrame::location("/about").to_json().unwrap();
        assert_eq!(
            server.received(),
            vec![vec![announce.clone()], vec![announce]]
        );
    }

    #[tokio::test]
    async fn test_retries_after_failed_handshake() {
        let server = spawn_push_server(vec![
            PushScript::refuse(),
            PushScript::after_announce(vec![update(7)]),
        ]);
        let manager = ConnectionManager::new(
            PushChannel::new(server.url(), Duration::from_secs(2)),
            "/",
            fast_policy(1),
        );
        let (_trigger, signal) = shutdown_channel();

        let mut seen = Vec::new();
        let exit = tokio::time::timeout(
            Duration::from_secs(10),
            manager.run(signal, |msg| seen.push(msg)),
        )
        .await
        .unwrap();

        assert_eq!(exit, LifecycleExit::AttemptsExhausted);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].state.as_value()["n"], 7);
    }

    #[tokio::test]
    async fn test_shutdown_closes_open_connection() {
        let server = spawn_push_server(vec![PushScript::after_announce(vec![update(1)]).hold_open()]);
        let manager = ConnectionManager::new(
            PushChannel::new(server.url(), Duration::from_secs(2)),
            "/",
            fast_policy(0),
        );
        let (trigger, signal) = shutdown_channel();

        let exit = tokio::time::timeout(
            Duration::from_secs(10),
            manager.run(signal, |_| trigger.trigger()),
        )
        .await
        .unwrap();

        assert_eq!(exit, LifecycleExit::Shutdown);
        assert_eq!(server.received().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_before_start() {
        let manager = ConnectionManager::new(
            PushChannel::new(
                crate::core::SocketUrl::parse("ws://127.0.0.1:9/").unwrap(),
                Duration::from_secs(1),
            ),
            "/",
            BackoffPolicy::default(),
        );
        let (trigger, signal) = shutdown_channel();
        trigger.trigger();

        assert_eq!(manager.run(signal, |_| {}).await, LifecycleExit::Shutdown);
    }
}
