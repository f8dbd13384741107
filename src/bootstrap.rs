//! Page bootstrap.
//!
//! Server-rendered pages carry their initial snapshot in an inline script:
//!
//! ```html
//! <script>let page_props = {...}; </script>
//! ```
//!
//! The literal is JSON, or a Python-style literal (`'single quotes'`,
//! `None`/`True`/`False`) which is normalized to JSON before parsing.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::dom::Document;
use crate::protocol::StateSnapshot;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("`page_props` is not a valid literal: {0}")]
    Json(#[from] serde_json::Error),
}

static PAGE_PROPS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^[ \t\r\n]*let[ \t\r\n]+page_props[ \t\r\n]*=[ \t\r\n]*(.*?)[ \t\r\n]*;?[ \t\r\n]*$").unwrap()
});

/// Snapshot embedded in `doc`, or `None` when the page has no bootstrap script.
pub fn initial_state(doc: &Document) -> Result<Option<StateSnapshot>, BootstrapError> {
    let scripts = doc
        .descendants(doc.root())
        .into_iter()
        .filter(|&id| doc.tag_name(id) == Some("script"));

    for script in scripts {
        if let Some(snapshot) = parse_script(&doc.text_content(script))? {
            return Ok(Some(snapshot));
        }
    }
    Ok(None)
}

/// Parse one script body. `None` if it does not declare `page_props`.
pub fn parse_script(source: &str) -> Result<Option<StateSnapshot>, BootstrapError> {
    let Some(literal) = PAGE_PROPS.captures(source).and_then(|caps| caps.get(1)) else {
        return Ok(None);
    };
    let literal = literal.as_str();

    let value = match serde_json::from_str(literal) {
        Ok(value) => value,
        Err(json_err) => match normalize_literal(literal) {
            Some(normalized) => serde_json::from_str(&normalized)?,
            None => return Err(json_err.into()),
        },
    };
    Ok(Some(StateSnapshot::new(value)))
}

/// Rewrite a Python-style literal as JSON. `None` if a string is unterminated.
fn normalize_literal(literal: &str) -> Option<String> {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push('"');
                let mut closed = false;
                while let Some(s) = chars.next() {
                    match s {
                        '\\' => match chars.next()? {
                            '\'' => out.push('\''),
                            escaped => {
                                out.push('\\');
                                out.push(escaped);
                            }
                        },
                        '"' if c == '\'' => out.push_str("\\\""),
                        s if s == c => {
                            closed = true;
                            break;
                        }
                        s => out.push(s),
                    }
                }
                if !closed {
                    return None;
                }
                out.push('"');
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' {
                        word.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(match word.as_str() {
                    "None" => "null",
                    "True" => "true",
                    "False" => "false",
                    other => other,
                });
            }
            c => out.push(c),
        }
    }
    Some(out)
}
