//! `[page]` section configuration.
//!
//! ```toml
//! [page]
//! url = "http://localhost:8000/about/"
//! ```

use serde::{Deserialize, Serialize};

use crate::core::PageUrl;

pub const DEFAULT_PAGE_URL: &str = "http://localhost:8000/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// URL of the current page. Events post below it; its path is the page id.
    pub url: PageUrl,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            url: PageUrl::parse(DEFAULT_PAGE_URL).expect("default page url is valid"),
        }
    }
}
