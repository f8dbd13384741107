//! pyfron-client - client runtime for pyfron server-driven pages.
//!
//! The server owns the application state and renders HTML. This crate keeps
//! a page in sync with it:
//!
//! - user events are posted to `<page>/onEvent` with the current snapshot
//! - every response, and every frame on the push socket, is a `{state, changes}`
//!   update: `changes` patches the page by target id, `state` replaces the snapshot
//!
//! # Modules
//!
//! | Module      | Purpose                                           |
//! |-------------|---------------------------------------------------|
//! | `store`     | Current state snapshot                            |
//! | `apply`     | Change-set application                            |
//! | `capture`   | Click and submit payloads                         |
//! | `transport` | HTTP event channel and push socket                |
//! | `lifecycle` | Push reconnect loop                               |
//! | `runtime`   | Wires the above around one page                   |
//! | `dom`       | DOM capability trait and in-memory document       |
//! | `bootstrap` | Initial snapshot from the server-rendered page    |
//! | `config`    | `pyfron.toml`                                     |
//! | `cli`       | Headless runner commands                          |

pub mod apply;
pub mod bootstrap;
pub mod capture;
pub mod cli;
pub mod config;
pub mod core;
pub mod dom;
pub mod error;
pub mod lifecycle;
pub mod logger;
pub mod protocol;
pub mod runtime;
pub mod store;
pub mod transport;
mod utils;

#[cfg(test)]
mod testing;

pub use error::ClientError;
pub use runtime::{Runtime, RuntimeOptions};
pub use store::StateStore;
