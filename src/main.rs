use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error, trace};
use wordtally::config::{CountingStrategy, FailurePolicy};
use wordtally::tally::{OutputFormat, ReportFormatter};
use wordtally::{TallyConfig, WordTally};

/// Count word frequencies across a directory of documents
#[derive(Parser)]
#[command(name = "wordtally", version)]
#[command(about = "Count word frequencies across a directory of documents", long_about = None)]
struct Cli {
    /// Directory of documents to count (default: ./works)
    dir: Option<PathBuf>,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Maximum number of documents processed at once (default: 3)
    #[arg(short = 'j', long)]
    max_parallel: Option<usize>,

    /// How counting workers share a document's table (locked or partitioned)
    #[arg(long)]
    strategy: Option<CountingStrategy>,

    /// Tokens handed to a counting worker at a time
    #[arg(long)]
    batch_size: Option<usize>,

    /// Descend into subdirectories
    #[arg(short = 'r', long)]
    recursive: bool,

    /// Keep or discard successful documents when one fails (keep-partial or discard)
    #[arg(long)]
    failure_policy: Option<FailurePolicy>,

    /// Number of most frequent words to list
    #[arg(long)]
    top: Option<usize>,

    /// Output format (text, json or json-pretty)
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

impl Cli {
    fn apply_to(&self, config: &mut TallyConfig) {
        if let Some(dir) = &self.dir {
            config.works_dir = dir.clone();
        }
        if let Some(max_parallel) = self.max_parallel {
            config.max_parallel = max_parallel;
        }
        if let Some(strategy) = self.strategy {
            config.counter.strategy = strategy;
        }
        if let Some(batch_size) = self.batch_size {
            config.counter.batch_size = batch_size;
        }
        if self.recursive {
            config.recursive = true;
        }
        if let Some(policy) = self.failure_policy {
            config.failure_policy = policy;
        }
        if let Some(top) = self.top {
            config.top = top;
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 1)
        .with_thread_ids(cli.verbose >= 2)
        .init();

    debug!("wordtally started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = TallyConfig::load(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    cli.apply_to(&mut config);

    let tally = WordTally::new(config)?;
    let outcome = tally.run().await?;

    let output = ReportFormatter::new(cli.format)
        .format(&outcome.report)
        .context("Failed to render report")?;
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }

    Ok(())
}
