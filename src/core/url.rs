//! URL types for the two server endpoints.
//!
//! - `PageUrl`: the page the client is showing (`http`/`https`). Events are
//!   posted below it and its path is the page id announced on the push socket.
//! - `SocketUrl`: the push socket address (`ws`/`wss`).

use std::fmt;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("invalid url `{input}`: {source}")]
    Parse {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("url `{input}` must use {expected}")]
    Scheme { input: String, expected: &'static str },
}

fn parse_with_scheme(input: &str, schemes: &[&str], expected: &'static str) -> Result<Url, UrlError> {
    let url = Url::parse(input.trim()).map_err(|source| UrlError::Parse {
        input: input.to_string(),
        source,
    })?;
    if !schemes.contains(&url.scheme()) {
        return Err(UrlError::Scheme {
            input: input.to_string(),
            expected,
        });
    }
    Ok(url)
}

// =============================================================================
// PageUrl
// =============================================================================

/// Absolute URL of the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageUrl(Url);

impl PageUrl {
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        parse_with_scheme(input, &["http", "https"], "http or https").map(Self)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Page id sent in `locationUpdate`: the URL path, still percent-encoded.
    #[inline]
    pub fn page_id(&self) -> &str {
        self.0.path()
    }

    /// Decoded path for display.
    pub fn display_path(&self) -> String {
        let path = self.0.path();
        percent_decode_str(path)
            .decode_utf8()
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| path.to_string())
    }

    /// Event endpoint: `<page path>/<suffix>`, without query or fragment.
    ///
    /// `http://h/` -> `http://h/onEvent`, `http://h/about/` -> `http://h/about/onEvent`
    pub fn event_endpoint(&self, suffix: &str) -> Url {
        let mut url = self.0.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(suffix);
        }
        url
    }
}

impl fmt::Display for PageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PageUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PageUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// SocketUrl
// =============================================================================

/// Push socket address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SocketUrl(Url);

impl SocketUrl {
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        parse_with_scheme(input, &["ws", "wss"], "ws or wss").map(Self)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SocketUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SocketUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SocketUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================
