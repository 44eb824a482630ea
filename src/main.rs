use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use watchlens::orchestrator::{self, PipelineParams};
use watchlens::topics::TopicParams;

/// watchlens - quarterly topic and location insights from a watch-history export
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Watch-history CSV (Video Title, URL, Channel Name, Channel URL, Date, Time)
    history: PathBuf,

    /// City→State mapping CSV (columns City, State)
    #[arg(long)]
    city_state: PathBuf,

    /// City→Country mapping CSV (columns City, Country)
    #[arg(long)]
    city_country: PathBuf,

    /// Output directory for generated artifacts (default: "out")
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,

    /// Latent topic count per quarter bucket
    #[arg(long, default_value_t = 5)]
    topics: usize,

    /// Top words kept per topic
    #[arg(long, default_value_t = 10)]
    top_words: usize,

    /// Minimum document frequency as a fraction of the bucket's documents
    #[arg(long, default_value_t = 0.027)]
    min_df: f64,

    /// Minimum distinct source URLs per year for a topic word to survive
    #[arg(long, default_value_t = 2)]
    min_distinct_urls: usize,

    /// Rows in the most-watched channels table
    #[arg(long, default_value_t = 30)]
    top_channels: usize,

    /// Seed for the topic model initialization
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    let args = Args::parse();

    for (name, path) in [
        ("watch history", &args.history),
        ("city→state mapping", &args.city_state),
        ("city→country mapping", &args.city_country),
    ] {
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "{} not found at {}\n\
                 The watch history needs columns: Video Title, URL, Channel Name, Channel URL, Date (DD-Mon-YYYY), Time (HH:MM:SS).\n\
                 Mapping tables are two-column CSVs (City,State / City,Country).",
                name,
                path.display()
            ));
        }
    }

    info!("Starting watchlens");

    let params = PipelineParams {
        topic: TopicParams {
            n_topics: args.topics,
            top_words: args.top_words,
            min_df: args.min_df,
            seed: args.seed,
            ..TopicParams::default()
        },
        min_distinct_urls: args.min_distinct_urls,
        top_channels: args.top_channels,
        ..PipelineParams::default()
    };

    orchestrator::run(
        &args.history,
        &args.city_state,
        &args.city_country,
        &args.output_dir,
        params,
    )
}
