//! Local servers for network tests.
//!
//! - `spawn_push_server`: blocking `tungstenite` server playing scripted sessions
//! - `spawn_http_server`: `tiny_http` server answering with canned responses
//! - `spawn_gated_http_server`: same, holding each response until released

use std::net::TcpListener;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tiny_http::{Header, Response, Server};
use tungstenite::Message;

use crate::core::{PageUrl, SocketUrl};

// =============================================================================
// Push Server
// =============================================================================

/// What the server does with one accepted connection.
#[derive(Debug, Clone)]
pub struct PushScript {
    refuse: bool,
    wait_for_announce: bool,
    frames: Vec<String>,
    close: bool,
    gate: Option<Arc<Mutex<mpsc::Receiver<()>>>>,
}

impl PushScript {
    /// Wait for the client's first frame, send `frames`, then close.
    pub fn after_announce(frames: Vec<String>) -> Self {
        Self {
            refuse: false,
            wait_for_announce: true,
            frames,
            close: true,
            gate: None,
        }
    }

    /// Send `frames` right after the handshake, then close.
    pub fn immediate(frames: Vec<String>) -> Self {
        Self {
            wait_for_announce: false,
            ..Self::after_announce(frames)
        }
    }

    /// Drop the TCP connection without a handshake.
    pub fn refuse() -> Self {
        Self {
            refuse: true,
            ..Self::immediate(Vec::new())
        }
    }

    /// Keep the socket open after sending, until the client closes it.
    pub fn hold_open(mut self) -> Self {
        self.close = false;
        self
    }

    /// Hold `frames` back until `gate` fires (or its sender is dropped).
    pub fn released_by(mut self, gate: mpsc::Receiver<()>) -> Self {
        self.gate = Some(Arc::new(Mutex::new(gate)));
        self
    }
}

pub struct PushServer {
    url: SocketUrl,
    received: Arc<Mutex<Vec<Vec<String>>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PushServer {
    pub fn url(&self) -> SocketUrl {
        self.url.clone()
    }

    /// Text frames received, one list per handshaken connection.
    ///
    /// Waits for every scripted session to finish.
    pub fn received(&self) -> Vec<Vec<String>> {
        if let Some(handle) = self.handle.lock().take() {
            handle.join().ok();
        }
        self.received.lock().clone()
    }
}

/// Play `scripts` against successive connections, then stop listening.
pub fn spawn_push_server(scripts: Vec<PushScript>) -> PushServer {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&received);

    let handle = thread::spawn(move || {
        for script in scripts {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            if script.refuse {
                drop(stream);
                continue;
            }
            let Ok(mut ws) = tungstenite::accept(stream) else {
                continue;
            };

            let mut texts = Vec::new();
            if script.wait_for_announce
                && let Ok(Message::Text(text)) = ws.read()
            {
                texts.push(text.as_str().to_string());
            }
            if let Some(gate) = &script.gate {
                gate.lock().recv().ok();
            }
            for frame in script.frames {
                if ws.send(Message::Text(frame.into())).is_err() {
                    break;
                }
            }
            if script.close {
                ws.close(None).ok();
            }
            // Drain until the client goes away
            loop {
                match ws.read() {
                    Ok(Message::Text(text)) => texts.push(text.as_str().to_string()),
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
            log.lock().push(texts);
        }
    });

    PushServer {
        url: SocketUrl::parse(&format!("ws://127.0.0.1:{port}/")).unwrap(),
        received,
        handle: Mutex::new(Some(handle)),
    }
}

// =============================================================================
// HTTP Server
// =============================================================================

/// A request seen by the HTTP test server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Answer one request per `(status, body)` entry, in order.
///
/// Returns the page URL to point the client at and a receiver of the
/// recorded requests.
pub fn spawn_http_server(
    path: &str,
    responses: Vec<(u16, String)>,
) -> (PageUrl, mpsc::Receiver<Recorded>) {
    serve_http(path, responses, None)
}

/// Like [`spawn_http_server`], but each response waits for one `gate` signal.
///
/// The request is recorded before the wait, so the receiver tells when it
/// is in flight.
pub fn spawn_gated_http_server(
    path: &str,
    responses: Vec<(u16, String)>,
    gate: mpsc::Receiver<()>,
) -> (PageUrl, mpsc::Receiver<Recorded>) {
    serve_http(path, responses, Some(gate))
}

fn serve_http(
    path: &str,
    responses: Vec<(u16, String)>,
    gate: Option<mpsc::Receiver<()>>,
) -> (PageUrl, mpsc::Receiver<Recorded>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in responses {
            let Ok(mut request) = server.recv() else {
                return;
            };
            let headers = request
                .headers()
                .iter()
                .map(|h| (h.field.to_string(), h.value.to_string()))
                .collect();
            let mut received = String::new();
            request.as_reader().read_to_string(&mut received).ok();
            tx.send(Recorded {
                url: request.url().to_string(),
                headers,
                body: received,
            })
            .ok();

            if let Some(gate) = &gate {
                gate.recv().ok();
            }
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(Header::from_bytes("Content-Type", "application/json").unwrap());
            request.respond(response).ok();
        }
    });

    let page = PageUrl::parse(&format!("http://127.0.0.1:{port}{path}")).unwrap();
    (page, rx)
}
