//! spsync CLI - Command-line interface for SharePoint document libraries
//!
//! Provides commands for:
//! - Creating folders and uploading files
//! - Loading items through registered loaders
//! - Annotating items with metadata
//! - Managing library columns

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    annotate::AnnotateCommand, columns::ColumnsCommand, load::LoadCommand, mkdir::MkdirCommand,
    upload::UploadCommand, GlobalArgs,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "spsync",
    version,
    about = "Sync files and metadata into SharePoint document libraries"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log failures and carry on instead of aborting
    #[arg(long, global = true)]
    best_effort: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a folder in the library
    Mkdir(MkdirCommand),
    /// Upload a local file
    Upload(UploadCommand),
    /// Load an item through a registered loader and annotate it
    Load(LoadCommand),
    /// Write metadata to an existing item
    Annotate(AnnotateCommand),
    /// List, create and delete library columns
    #[command(subcommand)]
    Columns(ColumnsCommand),
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // stdout carries command output; logs go to stderr
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json);

    let global = GlobalArgs {
        config: cli.config,
        best_effort: cli.best_effort,
        format: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        },
    };

    match cli.command {
        Commands::Mkdir(cmd) => cmd.execute(&global).await,
        Commands::Upload(cmd) => cmd.execute(&global).await,
        Commands::Load(cmd) => cmd.execute(&global).await,
        Commands::Annotate(cmd) => cmd.execute(&global).await,
        Commands::Columns(cmd) => cmd.execute(&global).await,
    }
}
