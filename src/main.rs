use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use search_insights::{record::parse_timestamp, AnalysisConfig, JsonFileSource, RecordSource, SearchInsights, Window};

/// Search log insights: query clusters, demand patterns and redirect
/// suggestions for zero-result searches.
#[derive(Parser, Debug)]
#[command(name = "search-insights")]
#[command(version)]
struct Args {
    /// Exported search rows (JSON array or one object per line)
    #[arg(short, long, env = "SEARCH_INSIGHTS_INPUT")]
    input: PathBuf,

    /// JSON file with analysis settings; flags override it
    #[arg(short, long, env = "SEARCH_INSIGHTS_CONFIG")]
    config: Option<PathBuf>,

    /// Write the report to this file
    #[arg(short, long, conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Write the report into this directory under a timestamped name
    #[arg(long, env = "SEARCH_INSIGHTS_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// End of the analysis window, "YYYY-MM-DD HH:MM:SS" (default: now)
    #[arg(long, value_parser = parse_now)]
    now: Option<NaiveDateTime>,

    #[arg(long)]
    window_days: Option<u32>,

    /// Number of query clusters
    #[arg(short = 'k', long)]
    clusters: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    min_similarity: Option<f64>,

    /// Suggestions per zero-result query
    #[arg(long)]
    top_n: Option<usize>,

    #[arg(long)]
    low_results_threshold: Option<f64>,

    #[arg(long)]
    zero_results_sample: Option<usize>,

    #[arg(long)]
    max_features: Option<usize>,
}

fn parse_now(raw: &str) -> std::result::Result<NaiveDateTime, String> {
    parse_timestamp(raw).ok_or_else(|| format!("unrecognized timestamp {raw:?}"))
}

impl Args {
    /// defaults -> config file -> flags
    fn config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => AnalysisConfig::default(),
        };
        if let Some(v) = self.window_days {
            config.window_days = v;
        }
        if let Some(v) = self.clusters {
            config.cluster_count = v;
        }
        if let Some(v) = self.seed {
            config.random_seed = v;
        }
        if let Some(v) = self.min_similarity {
            config.min_similarity_score = v;
        }
        if let Some(v) = self.top_n {
            config.similarity_top_n = v;
        }
        if let Some(v) = self.low_results_threshold {
            config.low_results_threshold = v;
        }
        if let Some(v) = self.zero_results_sample {
            config.zero_results_sample_size = v;
        }
        if let Some(v) = self.max_features {
            config.max_vocabulary_features = v;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let args = Args::parse();
    let config = args.config()?;
    let now = args.now.unwrap_or_else(|| Local::now().naive_local());
    let window = Window::new(now, config.window_days);

    let records = JsonFileSource::new(&args.input)
        .fetch(&window)
        .with_context(|| format!("reading search rows from {}", args.input.display()))?;

    let report = SearchInsights::new(config)?
        .analyze(&records, now)
        .context("analysis failed, no report written")?;

    if let Some(path) = &args.output {
        report.write_to(path)?;
    } else if let Some(dir) = &args.output_dir {
        let path = report.export_to_dir(dir)?;
        info!(path = %path.display(), "report exported");
    } else {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", report.to_json_pretty()?)?;
    }
    Ok(())
}
