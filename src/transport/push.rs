//! Push channel.
//!
//! One [`PushConnection`] per socket. Its state only moves forward:
//!
//! ```text
//! Connecting ──open()──▶ Open ──close frame / EOF──▶ Closed
//!      │                   │
//!      └──────error────────┴──────────error─────────▶ Error
//! ```
//!
//! Frames sent while `Connecting` are queued and written as soon as the
//! socket opens. A finished connection is not restartable; the lifecycle
//! manager creates a new one.

use std::collections::VecDeque;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::TransportError;
use crate::core::SocketUrl;
use crate::protocol::{InboundMessage, PushFrame};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
    Error,
}

impl ChannelState {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Closed | Self::Error)
    }
}

/// Push socket address plus handshake bound. Hands out fresh connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushChannel {
    url: SocketUrl,
    connect_timeout: Duration,
}

impl PushChannel {
    pub fn new(url: SocketUrl, connect_timeout: Duration) -> Self {
        Self {
            url,
            connect_timeout,
        }
    }

    pub fn url(&self) -> &SocketUrl {
        &self.url
    }

    /// A new connection in the `Connecting` state. Nothing touches the
    /// network until [`PushConnection::open`].
    pub fn connection(&self) -> PushConnection {
        PushConnection {
            url: self.url.clone(),
            connect_timeout: self.connect_timeout,
            state: ChannelState::Connecting,
            queued: VecDeque::new(),
            socket: None,
        }
    }
}

/// One push socket.
pub struct PushConnection {
    url: SocketUrl,
    connect_timeout: Duration,
    state: ChannelState,
    queued: VecDeque<PushFrame>,
    socket: Option<Socket>,
}

impl PushConnection {
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Frames waiting for the socket to open.
    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    /// Send a control frame, queueing it while the socket is still connecting.
    pub async fn send(&mut self, frame: PushFrame) -> Result<(), TransportError> {
        match self.state {
            ChannelState::Connecting => {
                self.queued.push_back(frame);
                Ok(())
            }
            ChannelState::Open => self.write(&frame).await,
            ChannelState::Closed | ChannelState::Error => Err(TransportError::Closed),
        }
    }

    /// Perform the handshake (bounded by the connect timeout), then flush
    /// queued frames. Resolves once the socket is usable.
    pub async fn open(&mut self) -> Result<(), TransportError> {
        if self.state != ChannelState::Connecting {
            return Err(TransportError::Closed);
        }

        let handshake = timeout(self.connect_timeout, connect_async(self.url.as_str())).await;
        let socket = match handshake {
            Ok(Ok((socket, _response))) => socket,
            Ok(Err(e)) => {
                self.state = ChannelState::Error;
                return Err(e.into());
            }
            Err(_) => {
                self.state = ChannelState::Error;
                return Err(TransportError::ConnectTimeout {
                    url: self.url.to_string(),
                    millis: self.connect_timeout.as_millis(),
                });
            }
        };

        self.socket = Some(socket);
        self.state = ChannelState::Open;
        crate::debug!("push"; "connected to {}", self.url);

        while let Some(frame) = self.queued.pop_front() {
            self.write(&frame).await?;
        }
        Ok(())
    }

    async fn write(&mut self, frame: &PushFrame) -> Result<(), TransportError> {
        let Some(socket) = self.socket.as_mut() else {
            return Err(TransportError::Closed);
        };
        let text = frame.to_json()?;
        if let Err(e) = socket.send(Message::Text(text.into())).await {
            self.state = ChannelState::Error;
            return Err(e.into());
        }
        Ok(())
    }

    /// Next server update.
    ///
    /// Returns `None` once the socket is closed. A socket error is returned
    /// once, after which the sequence ends. Malformed and binary frames are
    /// skipped.
    pub async fn next_message(&mut self) -> Option<Result<InboundMessage, TransportError>> {
        if self.state != ChannelState::Open {
            return None;
        }
        let socket = self.socket.as_mut()?;

        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => match InboundMessage::from_json(text.as_str()) {
                    Ok(msg) => return Some(Ok(msg)),
                    Err(e) => {
                        crate::log!("push"; "skipped malformed frame: {}", e);
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    self.state = ChannelState::Closed;
                    self.socket = None;
                    return None;
                }
                // Pings are answered by the socket layer
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    self.state = ChannelState::Error;
                    self.socket = None;
                    return Some(Err(e.into()));
                }
            }
        }
    }

    /// Close the socket (best effort).
    pub async fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            socket.close(None).await.ok();
        }
        if !self.state.is_finished() {
            self.state = ChannelState::Closed;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
