//! Core types shared by the runtime and the runner.

mod state;
mod url;

pub use state::{ShutdownSignal, ShutdownTrigger, setup_shutdown_handler, shutdown_channel};
pub use url::{PageUrl, SocketUrl, UrlError};
