use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use reco_core::persist::{load_snapshot, save_snapshot, SnapshotPaths};
use reco_core::{Engine, ScoredItem, DEFAULT_TOP_K};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build course recommendation snapshots and run one-off queries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the engine over a CSV corpus and write a snapshot directory
    Build {
        /// Input CSV corpus
        #[arg(long)]
        input: String,
        /// Output snapshot directory
        #[arg(long)]
        output: String,
    },
    /// Recommend courses for a free-text query
    Recommend {
        #[command(flatten)]
        source: Source,
        /// Query text; empty falls back to trending
        #[arg(long, default_value = "")]
        q: String,
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        k: usize,
        /// Print JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List the most popular courses
    Trending {
        #[command(flatten)]
        source: Source,
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        k: usize,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Source {
    /// CSV corpus to build from
    #[arg(long)]
    corpus: Option<String>,
    /// Snapshot directory written by `build`
    #[arg(long)]
    index: Option<String>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build_snapshot(&input, &output),
        Commands::Recommend { source, q, k, json } => {
            let engine = open(&source)?;
            print_results(&engine.rank(&q, k), json)
        }
        Commands::Trending { source, k, json } => {
            let engine = open(&source)?;
            print_results(&engine.rank_trending(k), json)
        }
    }
}

fn build_snapshot(input: &str, output: &str) -> Result<()> {
    let engine = Engine::from_path(input)?;
    let meta = save_snapshot(&SnapshotPaths::new(output), &engine)?;
    tracing::info!(output, num_items = meta.num_items, num_terms = meta.num_terms, "snapshot build complete");
    Ok(())
}

fn open(source: &Source) -> Result<Engine> {
    match (&source.corpus, &source.index) {
        (Some(corpus), _) => Ok(Engine::from_path(corpus)?),
        (None, Some(index)) => Ok(load_snapshot(&SnapshotPaths::new(index))?.0),
        (None, None) => anyhow::bail!("one of --corpus or --index is required"),
    }
}

fn print_results(results: &[ScoredItem], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }
    if results.is_empty() {
        println!("No results found, try another topic.");
        return Ok(());
    }
    for (rank, s) in results.iter().enumerate() {
        let org = if s.item.organization.is_empty() { "N/A" } else { &s.item.organization };
        println!("{:>2}. {} | {} | {:.1} | score {:.4}", rank + 1, s.item.title, org, s.item.rating, s.score);
    }
    Ok(())
}
