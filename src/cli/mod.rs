//! Command-line interface module.
//!
//! | Command  | Channel | Effect                                          |
//! |----------|---------|-------------------------------------------------|
//! | `watch`  | push    | apply updates as they arrive, until Ctrl+C      |
//! | `click`  | http    | send one click, print the updated body          |
//! | `submit` | http    | capture and send one form, print the updated body |

mod args;
pub mod common;
pub mod interact;
pub mod watch;

pub use args::{Cli, Commands, SessionArgs};

use anyhow::Result;

use crate::config::ClientConfig;
use crate::core::setup_shutdown_handler;

/// Load configuration, apply CLI overrides and run the selected command.
pub async fn run(cli: &Cli) -> Result<()> {
    let mut config = ClientConfig::load(&cli.config)?;
    common::apply_session_args(&mut config, cli.session());
    if let Commands::Watch {
        push_url: Some(url),
        ..
    } = &cli.command
    {
        config.push.url = url.clone();
    }
    config.validate()?;

    match &cli.command {
        Commands::Watch { session, .. } => {
            let shutdown = setup_shutdown_handler()?;
            let runtime = common::open_session(&config, session, true)?;
            crate::log!(
                "push";
                "watching {} via {}",
                config.page.url.display_path(),
                config.push.url
            );
            watch::watch(&runtime, shutdown).await
        }
        Commands::Click { session, elem_id } => {
            let runtime = common::open_session(&config, session, false)?;
            interact::click(&runtime, elem_id).await
        }
        Commands::Submit {
            session,
            elem_id,
            fields,
        } => {
            let runtime = common::open_session(&config, session, false)?;
            interact::submit(&runtime, elem_id, fields).await
        }
    }
}
