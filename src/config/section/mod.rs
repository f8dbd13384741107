//! Configuration section definitions.
//!
//! Each module corresponds to a section in `pyfron.toml`:
//!
//! | Module  | TOML Section | Purpose                                |
//! |---------|--------------|----------------------------------------|
//! | `page`  | `[page]`     | URL of the page the client is attached |
//! | `http`  | `[http]`     | Event endpoint and request timeout     |
//! | `push`  | `[push]`     | Push socket and reconnect policy       |
//! | `dom`   | `[dom]`      | Markup attribute names                 |
//! | `apply` | `[apply]`    | Change-set application policy          |

mod apply;
mod dom;
mod http;
mod page;
mod push;

pub use apply::ApplyConfig;
pub use dom::DomConfig;
pub use http::HttpConfig;
pub use page::PageConfig;
pub use push::{PushConfig, ReconnectConfig};
