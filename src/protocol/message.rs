//! Wire Messages
//!
//! JSON shapes exchanged with the server. The same [`InboundMessage`] arrives
//! as an HTTP response body and as a push frame.
//!
//! # Message Types
//!
//! - `EventPayload`: click/submit event, client → server over HTTP
//! - `InboundMessage`: `{state, changes}`, server → client on both channels
//! - `PushFrame`: control frames the client writes on the push socket

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire name of the whole-body target.
pub const ROOT_BODY: &str = "pyfron_body";

/// Envelope keys a form field must not shadow.
pub const RESERVED_KEYS: [&str; 3] = ["state", "eventType", "target"];

// =============================================================================
// State Snapshot
// =============================================================================

/// Opaque server state, echoed back verbatim on the next event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot(pub Value);

impl StateSnapshot {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for StateSnapshot {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Target identifier (CSS class) -> replacement HTML fragment.
pub type ChangeSet = BTreeMap<String, String>;

// =============================================================================
// Outbound Event
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Click,
    Submit,
}

/// Event sent to `<page>/onEvent`.
///
/// Submitted form fields are flattened next to the envelope keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Absent until the first snapshot is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateSnapshot>,
    #[serde(rename = "eventType")]
    pub event_type: EventType,
    pub target: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl EventPayload {
    /// Create a click payload.
    pub fn click(state: Option<StateSnapshot>, target: impl Into<String>) -> Self {
        Self {
            state,
            event_type: EventType::Click,
            target: target.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Create a submit payload with no fields yet.
    pub fn submit(state: Option<StateSnapshot>, target: impl Into<String>) -> Self {
        Self {
            state,
            event_type: EventType::Submit,
            target: target.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Inbound Message
// =============================================================================

/// Server update: new snapshot plus the DOM changes that go with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub state: StateSnapshot,
    pub changes: ChangeSet,
}

impl InboundMessage {
    pub fn new(state: impl Into<StateSnapshot>, changes: ChangeSet) -> Self {
        Self {
            state: state.into(),
            changes,
        }
    }

    /// Parse from JSON text.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// Push Frames
// =============================================================================

/// Frames written by the client on the push socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PushFrame {
    /// Tells the server which page this socket belongs to.
    #[serde(rename = "locationUpdate")]
    LocationUpdate {
        #[serde(rename = "pageId")]
        page_id: String,
    },
}

impl PushFrame {
    pub fn location(page_id: impl Into<String>) -> Self {
        Self::LocationUpdate {
            page_id: page_id.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

// =============================================================================
// Tests
// =============================================================================
