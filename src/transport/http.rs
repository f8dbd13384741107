//! Request/response channel.
//!
//! Every user event is one `POST <page>/onEvent` with a JSON body; the
//! response body is the matching `{state, changes}` update. Requests are
//! bounded by a timeout and never retried.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CACHE_CONTROL;
use tokio::time::timeout;
use url::Url;

use super::TransportError;
use crate::core::PageUrl;
use crate::protocol::{EventPayload, InboundMessage};

/// Default event endpoint below the page URL.
pub const EVENT_ENDPOINT: &str = "onEvent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub endpoint_suffix: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            endpoint_suffix: EVENT_ENDPOINT.to_string(),
        }
    }
}

/// Sends events for one page.
#[derive(Debug, Clone)]
pub struct HttpChannel {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpChannel {
    pub fn new(page: &PageUrl, options: &HttpOptions) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(options.timeout)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            client,
            endpoint: page.event_endpoint(&options.endpoint_suffix),
            timeout: options.timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Post `payload` and parse the server's update.
    pub async fn send_event(&self, payload: &EventPayload) -> Result<InboundMessage, TransportError> {
        crate::debug!("http"; "POST {} ({:?} `{}`)", self.endpoint, payload.event_type, payload.target);

        match timeout(self.timeout, self.exchange(payload)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                url: self.endpoint.to_string(),
                millis: self.timeout.as_millis(),
            }),
        }
    }

    async fn exchange(&self, payload: &EventPayload) -> Result<InboundMessage, TransportError> {
        let url = self.endpoint.as_str();
        let network = |source| TransportError::Network {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CACHE_CONTROL, "no-cache")
            .json(payload)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(network)?;
        Ok(InboundMessage::from_json(&body)?)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_http_server;
    use serde_json::{Value, json};
    use std::thread;
    use tiny_http::Server;

    fn click() -> EventPayload {
        EventPayload::click(None, "0")
    }

    #[tokio::test]
    async fn test_send_event_roundtrip() {
        let (page, rx) = spawn_http_server(
            "/about/",
            vec![(
                200,
                r#"{"state":{"n":2},"changes":{"count":"<p class=\"count\">2</p>"}}"#.to_string(),
            )],
        );
        let channel = HttpChannel::new(&page, &HttpOptions::default()).unwrap();

        let msg = channel
            .send_event(&EventPayload::click(Some(json!({"n": 1}).into()), "0-3"))
            .await
            .unwrap();

        assert_eq!(msg.state.as_value(), &json!({"n": 2}));
        assert_eq!(msg.changes["count"], r#"<p class="count">2</p>"#);

        let recorded = rx.recv().unwrap();
        assert_eq!(recorded.url, "/about/onEvent");
        assert_eq!(recorded.header("Content-Type"), Some("application/json"));
        assert_eq!(recorded.header("Cache-Control"), Some("no-cache"));
        let sent: Value = serde_json::from_str(&recorded.body).unwrap();
        assert_eq!(sent, json!({"state": {"n": 1}, "eventType": "click", "target": "0-3"}));
    }

    #[tokio::test]
    async fn test_custom_endpoint_suffix() {
        let (page, rx) = spawn_http_server("/", vec![(200, r#"{"state":{},"changes":{}}"#.into())]);
        let options = HttpOptions {
            endpoint_suffix: "events".to_string(),
            ..HttpOptions::default()
        };
        let channel = HttpChannel::new(&page, &options).unwrap();
        assert!(channel.endpoint().as_str().ends_with("/events"));

        channel.send_event(&click()).await.unwrap();
        assert_eq!(rx.recv().unwrap().url, "/events");
    }

    #[tokio::test]
    async fn test_error_status() {
        let (page, _rx) = spawn_http_server("/", vec![(500, "boom".into())]);
        let channel = HttpChannel::new(&page, &HttpOptions::default()).unwrap();

        let err = channel.send_event(&click()).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (page, _rx) = spawn_http_server("/", vec![(200, "<html>not json</html>".into())]);
        let channel = HttpChannel::new(&page, &HttpOptions::default()).unwrap();

        let err = channel.send_event(&click()).await.unwrap_err();
        assert!(matches!(err, TransportError::Json(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        // Accepts the request but never answers
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        thread::spawn(move || {
            let _held = server.recv();
            thread::sleep(Duration::from_secs(5));
        });

        let page = PageUrl::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        let options = HttpOptions {
            timeout: Duration::from_millis(200),
            ..HttpOptions::default()
        };
        let channel = HttpChannel::new(&page, &options).unwrap();

        let err = channel.send_event(&click()).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout { millis: 200, .. }));
    }

    #[tokio::test]
    async fn test_network_failure() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let page = PageUrl::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        let channel = HttpChannel::new(&page, &HttpOptions::default()).unwrap();

        let err = channel.send_event(&click()).await.unwrap_err();
        assert!(matches!(err, TransportError::Network { .. }));
    }
}
