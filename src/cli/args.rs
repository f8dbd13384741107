//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::{PageUrl, SocketUrl};

/// Headless pyfron client
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: pyfron.toml)
    #[arg(short = 'C', long, global = true, default_value = "pyfron.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Follow push updates for a page until Ctrl+C
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        session: SessionArgs,

        /// Push socket URL (e.g., ws://localhost:8001/)
        #[arg(short = 'P', long = "push-url", value_parser = SocketUrl::parse)]
        push_url: Option<SocketUrl>,
    },

    /// Click an element and print the updated page
    #[command(visible_alias = "c")]
    Click {
        #[command(flatten)]
        session: SessionArgs,

        /// Id bound by the element's click handler
        elem_id: String,
    },

    /// Submit a form and print the updated page
    #[command(visible_alias = "s")]
    Submit {
        #[command(flatten)]
        session: SessionArgs,

        /// Identifier of the submitting element
        elem_id: String,

        /// Set a field before submitting (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
}

/// Page source shared by every command.
#[derive(clap::Args, Debug, Clone)]
pub struct SessionArgs {
    /// Server-rendered page HTML
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub page: PathBuf,

    /// URL the page was served from (overrides `[page] url`)
    #[arg(short = 'U', long, value_parser = PageUrl::parse, value_hint = clap::ValueHint::Url)]
    pub url: Option<PageUrl>,

    /// Reject change-sets naming a missing target instead of skipping it
    #[arg(long)]
    pub strict: bool,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}

impl Cli {
    pub fn session(&self) -> &SessionArgs {
        match &self.command {
            Commands::Watch { session, .. }
            | Commands::Click { session, .. }
            | Commands::Submit { session, .. } => session,
        }
    }
}
