//! Command line arguments

use crate::logging::LogFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use composer_core::DisplayMode;
use std::path::PathBuf;

/// Compose, review and save contracts
#[derive(Debug, Parser)]
#[command(name = "composer", version, about = "Compose, review and save contracts")]
pub struct Cli {
    /// Configuration file (TOML); `composer.toml` when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// What to do
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List available contract types
    Types,

    /// Show the fields a contract type needs
    Describe {
        /// Contract type id
        type_id: String,
    },

    /// Store a session token for later calls
    Login {
        /// Bearer token issued by the contract API
        #[arg(long)]
        token: String,
    },

    /// Forget the stored session token
    Logout,

    /// Generate a contract, then optionally save or download it
    Compose(ComposeArgs),

    /// List saved contracts
    Contracts {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Render a Markdown file
    Render {
        /// Markdown file
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = ViewMode::Html)]
        format: ViewMode,
    },
}

/// Options of `compose`
#[derive(Debug, Args)]
pub struct ComposeArgs {
    /// Contract type id
    #[arg(long = "type")]
    pub contract_type: String,

    /// Client name
    #[arg(long)]
    pub client: String,

    /// Other party name
    #[arg(long)]
    pub other: String,

    /// Parameter value, `key=value`; repeatable
    #[arg(long = "param", value_parser = parse_pair)]
    pub params: Vec<(String, String)>,

    /// Clause option value, `key=value`; repeatable
    #[arg(long = "option", value_parser = parse_pair)]
    pub options: Vec<(String, String)>,

    /// Replace the generated text with this file before saving
    #[arg(long)]
    pub content: Option<PathBuf>,

    /// Title used for saving and the download filename
    #[arg(long)]
    pub title: Option<String>,

    /// Save to the contract store
    #[arg(long)]
    pub save: bool,

    /// Write a Markdown file
    #[arg(long)]
    pub download: bool,

    /// Download directory; overrides `export_dir`
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// How the document is printed
    #[arg(long, value_enum, default_value_t = ViewMode::Text)]
    pub view: ViewMode,
}

/// Printable document view
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewMode {
    /// Markdown source
    Raw,
    /// Rendered HTML
    Html,
    /// Rendered plain text
    Text,
}

impl From<ViewMode> for DisplayMode {
    fn from(mode: ViewMode) -> Self {
        match mode {
            ViewMode::Raw => Self::Raw,
            ViewMode::Html => Self::Html,
            ViewMode::Text => Self::Text,
        }
    }
}

/// Parse `key=value`
///
/// # Errors
/// Missing `=` or empty key
pub fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
