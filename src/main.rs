//! `galx` CLI - extract gallery pages into directory/queue event streams

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use galx::output::OutputFormat;

#[derive(Parser)]
#[command(name = "galx")]
#[command(about = "Extract image galleries into directory + queue events")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ~/.config/galx/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a gallery and print its events
    Extract {
        /// Gallery URL
        url: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Print the output path of each image instead of the events
        #[arg(long)]
        paths: bool,

        /// Print the archive key of each image instead of the events
        #[arg(long)]
        archive_keys: bool,
    },

    /// List supported sites
    Sites,

    /// Show which extractor handles a URL and what it captures (no network)
    Classify {
        /// Gallery URL
        url: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Extract {
            url,
            format,
            paths,
            archive_keys,
        } => {
            cmd::extract::cmd_extract(&url, format, paths, archive_keys, cli.config.as_deref())
                .await?;
        }
        Commands::Sites => {
            cmd::sites::cmd_sites();
        }
        Commands::Classify { url } => {
            cmd::classify::cmd_classify(&url)?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays a clean event stream.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "galx=debug,info",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
