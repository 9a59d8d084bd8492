//! LYNX Parser CLI
//!
//! Normalizes LYNX documents and prints the expanded spec/value tree.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lynx_parser::{parse, CatalogResolver, LynxConfig, OutputFormat};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lynx-parse")]
#[command(about = "Normalize LYNX documents into spec/value trees")]
struct Cli {
    /// Config file (defaults to lynx.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a document and print the normalized tree
    Parse {
        /// Input file, or "-" for stdin
        #[arg(default_value = "-")]
        input: String,

        /// Transport media type (may carry realm/base parameters)
        #[arg(short = 't', long = "type")]
        media_type: Option<String>,

        /// Document location, used as the last-resort base
        #[arg(short, long)]
        location: Option<String>,

        /// Directory of spec files to resolve references from
        #[arg(long)]
        spec_dir: Option<PathBuf>,

        /// URL the spec directory is published at
        #[arg(long)]
        spec_base: Option<String>,

        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write the configuration to this path instead of printing it
        #[arg(long)]
        save: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match cli.config.as_deref() {
        Some(path) => LynxConfig::load_from(Some(path))?,
        None => LynxConfig::load()?,
    };

    match cli.command {
        Commands::Parse {
            input,
            media_type,
            location,
            spec_dir,
            spec_base,
            compact,
        } => {
            let content = read_input(&input).await?;

            let mut options = config.parse_options();
            if media_type.is_some() {
                options.media_type = media_type;
            }
            if location.is_some() {
                options.location = location;
            }

            let spec_dir = spec_dir.or_else(|| config.spec_dir());
            if let Some(dir) = spec_dir {
                let base = spec_base.unwrap_or_else(|| config.resolver.spec_base_url.clone());
                let catalog = CatalogResolver::from_directory(&dir, &base)
                    .with_context(|| format!("loading specs from {}", dir.display()))?;
                tracing::info!(specs = catalog.len(), dir = %dir.display(), "Loaded spec catalog");
                options.resolver = Some(Arc::new(catalog));
            }

            let document = parse(&content, &options).await?;

            let format = if compact { OutputFormat::Compact } else { config.output.format };
            let output = match format {
                OutputFormat::Pretty => serde_json::to_string_pretty(&document)?,
                OutputFormat::Compact => serde_json::to_string(&document)?,
            };
            println!("{}", output);
            Ok(())
        }

        Commands::Config { save } => {
            if let Some(path) = save {
                config.save(&path)?;
                println!("✅ Configuration written to {}", path);
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
            Ok(())
        }
    }
}

async fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut content = String::new();
        tokio::io::stdin().read_to_string(&mut content).await?;
        Ok(content)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("reading {}", input))
    }
}
