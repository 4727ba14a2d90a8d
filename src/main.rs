use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cricket_etl::config::PipelineConfig;
use cricket_etl::normalize::NormalizeSummary;
use cricket_etl::pipeline::{self, AggregateSummary, GraphSummary};

#[derive(Debug, Parser)]
#[command(name = "cricket_etl", about = "Ball-by-ball cricket ETL and matchup analytics")]
struct Cli {
    /// JSON file with pipeline settings; env overrides apply on top.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding every stage's input and output files.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Per-match JSON directory read by `combine`.
    #[arg(long, global = true)]
    input_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Concatenate per-match JSON files into one array.
    Combine,
    /// Flatten the combined matches into the ball-by-ball Parquet table.
    Normalize,
    /// Team innings, batter and bowler summaries.
    Aggregate,
    /// Batter vs bowler matchup graph exports.
    Graph,
    /// Every stage in order.
    All,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;

    match cli.command {
        Command::Combine => {
            let summary = pipeline::run_combine(&cfg)?;
            println!("Combine complete");
            println!("Files: {}", summary.files);
            println!("Output: {}", summary.output.display());
        }
        Command::Normalize => print_normalize(&pipeline::run_normalize(&cfg)?),
        Command::Aggregate => print_aggregate(&pipeline::run_aggregate(&cfg)?),
        Command::Graph => print_graph(&pipeline::run_graph(&cfg)?),
        Command::All => {
            let summary = pipeline::run_all(&cfg)?;
            if let Some(combine) = &summary.combine {
                println!("Combined {} files", combine.files);
            }
            print_normalize(&summary.normalize);
            print_aggregate(&summary.aggregate);
            print_graph(&summary.graph);
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut cfg = match cli.config.as_deref() {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    cfg.apply_env();
    if let Some(dir) = &cli.data_dir {
        cfg.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.input_dir {
        cfg.input_dir = Some(dir.clone());
    }
    Ok(cfg)
}

fn print_normalize(summary: &NormalizeSummary) {
    println!("Normalize complete");
    println!(
        "Matches: {}/{}",
        summary.matches_succeeded, summary.matches_total
    );
    println!("Deliveries: {}", summary.deliveries);
    if let Some(output) = &summary.output {
        println!("Output: {}", output.display());
    }
    if !summary.duplicate_match_ids.is_empty() {
        println!("Duplicate match ids: {}", summary.duplicate_match_ids.len());
    }
    if !summary.errors.is_empty() {
        println!("Errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(8) {
            println!(" - {err}");
        }
    }
}

fn print_aggregate(summary: &AggregateSummary) {
    println!("Aggregate complete");
    println!("Deliveries read: {}", summary.deliveries);
    println!("Team innings: {}", summary.report.team_innings);
    println!("Batters: {}", summary.report.batters);
    println!("Bowlers: {}", summary.report.bowlers);
    if let Some(workbook) = &summary.paths.workbook {
        println!("Workbook: {}", workbook.display());
    }
}

fn print_graph(summary: &GraphSummary) {
    println!("Graph complete");
    println!("Legal deliveries analyzed: {}", summary.deliveries_analyzed);
    println!(
        "Players: {} (exported {})",
        summary.players, summary.export.players
    );
    println!(
        "Interactions: {} (exported {})",
        summary.interactions, summary.export.edges
    );
    println!("Quality matchups: {}", summary.export.quality_matchups);
    println!("Output dir: {}", summary.export.dir.display());
}
