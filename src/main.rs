#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::style)]

use std::path::Path;

use anyhow::{Context, bail};
use clap::Parser;
use nodeparse::NodeManager;
use nodeparse::cli::Args;
use nodeparse::config::Config;
use tracing::Level;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    let is_verbose = args.verbose;
    tracing_subscriber::fmt()
        .with_max_level(if is_verbose {
            Level::TRACE
        } else {
            Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        tracing::error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path_or_url) => {
            tracing::info!("Loading config from: {}", path_or_url);
            Config::load(path_or_url).await?
        }
        None => Config::default(),
    }
    .with_args(&args);

    if config.sources.is_empty() {
        bail!("No subscription sources given, pass --file, --url or --config");
    }

    let mut manager = NodeManager::new().with_source_options(config.source_options());
    for source in &config.sources {
        tracing::info!("Loading nodes from: {}", source);
        manager
            .load(source)
            .await
            .with_context(|| format!("Failed to load nodes from {}", source))?;
    }

    let rendered = manager.render(config.format)?;
    match &config.output {
        Some(output) => write_output(Path::new(output), &rendered).await?,
        None => print!("{}", rendered),
    }

    tracing::info!("Exported {} nodes", manager.len());
    Ok(())
}

async fn write_output(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write output to {:?}", path))?;
    tracing::info!("Wrote output to {}", path.display());
    Ok(())
}
