//! Transport Module
//!
//! Two channels deliver the same [`InboundMessage`](crate::protocol::InboundMessage):
//!
//! ```text
//! click/submit ──POST <page>/onEvent──▶ server ──{state, changes}──▶ HttpChannel
//!                                       server ──{state, changes}──▶ PushConnection
//! ```
//!
//! # Modules
//!
//! - `http` - Request/response channel for user events
//! - `push` - Persistent socket carrying server-initiated updates

mod http;
mod push;

use thiserror::Error;

pub use http::{EVENT_ENDPOINT, HttpChannel, HttpOptions};
pub use push::{ChannelState, PushChannel, PushConnection};

/// Errors raised by either channel.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} timed out after {millis}ms")]
    Timeout { url: String, millis: u128 },

    #[error("malformed server message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("push socket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("connecting to {url} timed out after {millis}ms")]
    ConnectTimeout { url: String, millis: u128 },

    #[error("push socket is closed")]
    Closed,
}
