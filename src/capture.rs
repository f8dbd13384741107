//! Event Capture
//!
//! Turns user interactions into [`EventPayload`]s.
//!
//! - Click: the bound element id is the target.
//! - Submit: the submitter's identifier attribute is the target, and every
//!   descendant carrying a field-key attribute contributes `key = value`.
//!
//! Markup that breaks this contract (no identifier on the submitter, a field
//! key that would shadow an envelope key) aborts the capture; nothing is sent.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::dom::{Document, Dom, NodeId};
use crate::protocol::{EventPayload, RESERVED_KEYS};
use crate::store::StateStore;

/// Default identifier attribute rendered by the server.
pub const IDENTIFIER_ATTR: &str = "elemid";

/// Default field-key attribute rendered by the server.
pub const FIELD_KEY_ATTR: &str = "key";

/// Markup contract violations found while capturing an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("submitter has no `{attr}` attribute")]
    MissingIdentifier { attr: String },

    #[error("field key `{0}` collides with an event envelope key")]
    ReservedFieldKey(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    pub identifier_attr: String,
    pub field_key_attr: String,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            identifier_attr: IDENTIFIER_ATTR.to_string(),
            field_key_attr: FIELD_KEY_ATTR.to_string(),
        }
    }
}

// =============================================================================
// Submit Event
// =============================================================================

/// A submit event delivered to the delegated listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitEvent<N> {
    /// Element the event was dispatched on (the submitter).
    pub source: N,
    default_prevented: bool,
}

impl<N> SubmitEvent<N> {
    pub fn new(source: N) -> Self {
        Self {
            source,
            default_prevented: false,
        }
    }

    /// Suppress native form submission.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

// =============================================================================
// Capture
// =============================================================================

/// Build the payload for a click on `elem_id`.
pub fn click_payload(store: &StateStore, elem_id: &str) -> EventPayload {
    EventPayload::click(store.get(), elem_id)
}

/// Build the payload for a submit on `submitter`.
///
/// Descendants are walked depth-first; when two fields share a key the one
/// visited last wins.
pub fn submit_payload<D: Dom>(
    dom: &D,
    store: &StateStore,
    submitter: D::Node,
    options: &CaptureOptions,
) -> Result<EventPayload, CaptureError> {
    let target = dom
        .identifier(submitter, &options.identifier_attr)
        .ok_or_else(|| CaptureError::MissingIdentifier {
            attr: options.identifier_attr.clone(),
        })?;

    let mut payload = EventPayload::submit(store.get(), target);
    let mut stack = vec![submitter];
    while let Some(current) = stack.pop() {
        for child in dom.element_children(current) {
            if let Some(key) = dom.field_key(child, &options.field_key_attr) {
                if RESERVED_KEYS.contains(&key.as_str()) {
                    return Err(CaptureError::ReservedFieldKey(key));
                }
                payload.fields.insert(key, dom.current_value(child));
            }
            stack.push(child);
        }
    }

    crate::debug!("capture"; "submit `{}` with {} field(s)", payload.target, payload.fields.len());
    Ok(payload)
}

// =============================================================================
// Click Bindings
// =============================================================================

static ON_CLICK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[ \t]*onClickListener\([ \t]*['"]([^'"]*)['"][ \t]*\)[ \t]*;?[ \t]*$"#).unwrap()
});

/// Element id bound by an `onclick="onClickListener('<id>')"` handler.
pub fn click_binding(onclick: &str) -> Option<&str> {
    ON_CLICK
        .captures(onclick)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Every clickable element of `doc` with its bound id, in document order.
pub fn click_bindings(doc: &Document) -> Vec<(NodeId, String)> {
    doc.descendants(doc.root())
        .into_iter()
        .filter_map(|node| {
            let handler = doc.get_attribute(node, "onclick")?;
            click_binding(handler).map(|id| (node, id.to_string()))
        })
        .collect()
}

/// Element whose click handler is bound to `elem_id`.
pub fn find_clickable(doc: &Document, elem_id: &str) -> Option<NodeId> {
    click_bindings(doc)
        .into_iter()
        .find_map(|(node, id)| (id == elem_id).then_some(node))
}

/// Element carrying `identifier_attr == elem_id`.
pub fn find_by_identifier(doc: &Document, identifier_attr: &str, elem_id: &str) -> Option<NodeId> {
    doc.find_by_attribute(identifier_attr, elem_id)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FORM: &str = r#"<body>
        <form class="signup" elemid="0-1">
            <div>
                <section>
                    <label><input class="email" key="email" value="a@b.com" /></label>
                </section>
            </div>
            <textarea key="bio">hello</textarea>
            <button class="go" elemid="0-1-2" onclick="onClickListener('0-1-2')">Go</button>
        </form>
    </body>"#;

    #[test]
    fn test_click_payload_uses_store() {
        let store = StateStore::new();
        assert_eq!(click_payload(&store, "0-2").state, None);

        store.set(json!({"n": 3}).into());
        let payload = click_payload(&store, "0-2");
        assert_eq!(payload.target, "0-2");
        assert_eq!(payload.state, Some(json!({"n": 3}).into()));
        assert!(payload.fields.is_empty());
    }

    #[test]
    fn test_submit_collects_deep_fields() {
        let doc = Document::parse(FORM);
        let store = StateStore::with_snapshot(json!({}).into());
        let form = doc.find_by_target_id("signup").unwrap();

        let payload = submit_payload(&doc, &store, form, &CaptureOptions::default()).unwrap();

        assert_eq!(payload.target, "0-1");
        assert_eq!(payload.fields["email"], "a@b.com");
        assert_eq!(payload.fields["bio"], "hello");
        assert_eq!(payload.fields.len(), 2);
    }

    #[test]
    fn test_submit_sees_typed_value() {
        let mut doc = Document::parse(FORM);
        let email = doc.find_by_target_id("email").unwrap();
        doc.set_value(email, "new@b.com").unwrap();
        let form = doc.find_by_target_id("signup").unwrap();

        let payload =
            submit_payload(&doc, &StateStore::new(), form, &CaptureOptions::default()).unwrap();
        assert_eq!(payload.fields["email"], "new@b.com");
    }

    #[test]
    fn test_submit_without_identifier_fails() {
        let doc = Document::parse(r#"<form class="f"><input key="a" value="1" /></form>"#);
        let form = doc.find_by_target_id("f").unwrap();

        let err = submit_payload(&doc, &StateStore::new(), form, &CaptureOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            CaptureError::MissingIdentifier {
                attr: "elemid".to_string()
            }
        );
    }

    #[test]
    fn test_submit_rejects_reserved_key() {
        let doc = Document::parse(
            r#"<form class="f" elemid="0"><input key="target" value="x" /></form>"#,
        );
        let form = doc.find_by_target_id("f").unwrap();

        let err = submit_payload(&doc, &StateStore::new(), form, &CaptureOptions::default())
            .unwrap_err();
        assert_eq!(err, CaptureError::ReservedFieldKey("target".to_string()));
    }

    #[test]
    fn test_custom_attribute_names() {
        let doc = Document::parse(
            r#"<form class="f" data-id="7"><input name="q" value="rust" /></form>"#,
        );
        let form = doc.find_by_target_id("f").unwrap();
        let options = CaptureOptions {
            identifier_attr: "data-id".to_string(),
            field_key_attr: "name".to_string(),
        };

        let payload = submit_payload(&doc, &StateStore::new(), form, &options).unwrap();
        assert_eq!(payload.target, "7");
        assert_eq!(payload.fields["q"], "rust");
    }

    #[test]
    fn test_prevent_default() {
        let mut event = SubmitEvent::new(NodeId(3));
        assert!(!event.default_prevented());
        event.prevent_default();
        assert!(event.default_prevented());
    }

    #[test]
    fn test_click_binding_parse() {
        assert_eq!(click_binding("onClickListener('0-1-2')"), Some("0-1-2"));
        assert_eq!(click_binding(r#" onClickListener("7"); "#), Some("7"));
        assert_eq!(click_binding("alert('x')"), None);
        assert_eq!(click_binding(""), None);
    }

    #[test]
    fn test_click_bindings_in_document() {
        let doc = Document::parse(FORM);
        let bindings = click_bindings(&doc);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].1, "0-1-2");
        assert_eq!(find_clickable(&doc, "0-1-2"), Some(bindings[0].0));
        assert_eq!(find_clickable(&doc, "9"), None);
        assert_eq!(find_by_identifier(&doc, IDENTIFIER_ATTR, "0-1-2"), Some(bindings[0].0));
    }
}
