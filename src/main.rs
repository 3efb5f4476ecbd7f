mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use calfeed_core::Config;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "calfeed")]
#[command(about = "Download, inspect and merge ICS calendar feeds")]
struct Cli {
    /// Config file to use instead of ~/.config/calfeed/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a feed and print where it was saved
    Download {
        /// Feed URL (http, https or webcal)
        url: String,

        /// Directory to save into (defaults to download_dir from config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Show the service and name of an ICS file
    Info {
        file: PathBuf,
    },
    /// List the events in an ICS file
    Events {
        file: PathBuf,
    },
    /// Merge feeds and files into one calendar
    Merge {
        /// Feed URLs or local ICS files, merged in order
        #[arg(required = true)]
        sources: Vec<String>,

        /// Write the merged calendar here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Name of the merged calendar (defaults to the first source's name)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Print the events of a provider's calendar
    Fetch {
        /// "feed:URL", "local:PATH" or the name of an installed provider
        #[arg(short, long)]
        provider: String,

        /// Session data passed to the provider, as a JSON object
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Push the events of a feed or file to a provider
    Push {
        /// Feed URL or local ICS file
        source: String,

        /// "feed:URL", "local:PATH" or the name of an installed provider
        #[arg(short, long)]
        provider: String,

        /// Session data passed to the provider, as a JSON object
        #[arg(short, long)]
        session: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calfeed_cli=info,calfeed_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Download { url, dir } => commands::download::run(&config, &url, dir).await,
        Commands::Info { file } => commands::info::run(&file),
        Commands::Events { file } => commands::events::run(&file),
        Commands::Merge {
            sources,
            output,
            name,
        } => commands::merge::run(&config, &sources, output, name).await,
        Commands::Fetch { provider, session } => {
            commands::fetch::run(&config, &provider, session.as_deref()).await
        }
        Commands::Push {
            source,
            provider,
            session,
        } => commands::push::run(&config, &source, &provider, session.as_deref()).await,
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Config::load().context("Failed to load config"),
    }
}
