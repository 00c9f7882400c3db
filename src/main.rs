use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use persona_ranker::{
    Analyzer, CollectionPaths, Config, HashingEmbedder, PdfLayoutSource, WindowedEmbedder,
};

#[derive(Parser, Debug)]
#[command(version, about = "Rank PDF pages by relevance to a persona and job to be done")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing one sub-directory per collection
    #[arg(long)]
    collections_dir: Option<PathBuf>,

    /// Only process the collection with this directory name
    #[arg(long, conflicts_with = "input")]
    collection: Option<String>,

    /// Single input JSON; PDFs are looked up next to it
    #[arg(long, requires = "output")]
    input: Option<PathBuf>,

    /// Output JSON for --input
    #[arg(long, requires = "input")]
    output: Option<PathBuf>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(dir) = cli.collections_dir {
        config.collections_dir = dir;
    }

    let collections = match (cli.input, cli.output) {
        (Some(input_path), Some(output_path)) => vec![CollectionPaths {
            name: input_path.display().to_string(),
            input_path,
            output_path,
        }],
        _ => {
            let mut found = config.get_collection_paths()?;
            if let Some(only) = &cli.collection {
                found.retain(|c| &c.name == only);
            }
            found
        }
    };
    if collections.is_empty() {
        bail!("no collections found under {}", config.collections_dir.display());
    }

    let embedder = WindowedEmbedder::new(
        HashingEmbedder::from_config(&config.embedding),
        config.embedding.window_tokens,
    );
    let analyzer = Analyzer::new(embedder, PdfLayoutSource, config);

    let reports = analyzer.process_all(&collections);
    let failed = reports.iter().filter(|r| r.outcome.is_err()).count();
    tracing::info!("{} collections processed, {} failed", reports.len(), failed);

    if failed == reports.len() {
        bail!("all {} collections failed", failed);
    }
    Ok(())
}
