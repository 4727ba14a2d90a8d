use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use log::info;

use crate::aggregate;
use crate::combine::{self, CombineSummary};
use crate::config::PipelineConfig;
use crate::delivery_store;
use crate::graph_export::{self, GraphExportReport};
use crate::matchup_graph;
use crate::normalize::{self, NormalizeSummary};
use crate::stats_export::{self, StatsExportReport, StatsPaths};

#[derive(Debug, Clone)]
pub struct AggregateSummary {
    pub deliveries: usize,
    pub report: StatsExportReport,
    pub paths: StatsPaths,
}

#[derive(Debug, Clone)]
pub struct GraphSummary {
    pub deliveries_analyzed: usize,
    pub players: usize,
    pub interactions: usize,
    pub export: GraphExportReport,
}

#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub combine: Option<CombineSummary>,
    pub normalize: NormalizeSummary,
    pub aggregate: AggregateSummary,
    pub graph: GraphSummary,
}

pub fn stats_paths(cfg: &PipelineConfig) -> StatsPaths {
    StatsPaths {
        team_innings: cfg.team_innings_path(),
        batters: cfg.batter_stats_path(),
        bowlers: cfg.bowler_stats_path(),
        workbook: cfg.aggregate.write_workbook.then(|| cfg.workbook_path()),
    }
}

pub fn run_combine(cfg: &PipelineConfig) -> Result<CombineSummary> {
    let input_dir = cfg.input_dir();
    let output = cfg.raw_data_path();
    let summary = combine::combine_match_files(&input_dir, &output)
        .with_context(|| format!("combine stage ({})", input_dir.display()))?;
    info!(
        "combined {} files into {}",
        summary.files,
        summary.output.display()
    );
    Ok(summary)
}

pub fn run_normalize(cfg: &PipelineConfig) -> Result<NormalizeSummary> {
    normalize::normalize_file(&cfg.raw_data_path(), &cfg.deliveries_path(), &cfg.normalize)
        .context("normalize stage")
}

pub fn run_aggregate(cfg: &PipelineConfig) -> Result<AggregateSummary> {
    let deliveries =
        delivery_store::read_deliveries(&cfg.deliveries_path()).context("aggregate stage")?;
    let tables = aggregate::aggregate(&deliveries);
    let paths = stats_paths(cfg);
    let report = stats_export::write_stats(&tables, &paths).context("aggregate stage")?;
    info!(
        "computed {} team innings, {} batters, {} bowlers",
        report.team_innings, report.batters, report.bowlers
    );
    Ok(AggregateSummary {
        deliveries: deliveries.len(),
        report,
        paths,
    })
}

pub fn run_graph(cfg: &PipelineConfig) -> Result<GraphSummary> {
    let deliveries =
        delivery_store::read_deliveries(&cfg.deliveries_path()).context("graph stage")?;
    let graph = matchup_graph::build_matchup_graph(&deliveries, &cfg.graph);
    let export = graph_export::export_graph(&graph, &cfg.data_dir).context("graph stage")?;
    info!(
        "graph: {} players, {} interactions from {} legal deliveries",
        graph.nodes.len(),
        graph.edges.len(),
        graph.deliveries_analyzed
    );
    Ok(GraphSummary {
        deliveries_analyzed: graph.deliveries_analyzed,
        players: graph.nodes.len(),
        interactions: graph.edges.len(),
        export,
    })
}

/// Runs every stage in order. The combiner is skipped when the per-match
/// directory is absent but a combined file already exists.
pub fn run_all(cfg: &PipelineConfig) -> Result<PipelineSummary> {
    let input_dir = cfg.input_dir();
    let combine = if input_dir.is_dir() {
        Some(run_combine(cfg)?)
    } else if cfg.raw_data_path().is_file() {
        info!(
            "no match directory at {}, using existing {}",
            input_dir.display(),
            cfg.raw_data_path().display()
        );
        None
    } else {
        return Err(anyhow!(
            "nothing to process: neither {} nor {} exists",
            input_dir.display(),
            cfg.raw_data_path().display()
        ));
    };

    let normalize = run_normalize(cfg)?;
    let aggregate = run_aggregate(cfg)?;
    let graph = run_graph(cfg)?;

    Ok(PipelineSummary {
        combine,
        normalize,
        aggregate,
        graph,
    })
}

pub fn output_files(cfg: &PipelineConfig) -> Vec<PathBuf> {
    let mut files = vec![
        cfg.raw_data_path(),
        cfg.deliveries_path(),
        cfg.team_innings_path(),
        cfg.batter_stats_path(),
        cfg.bowler_stats_path(),
    ];
    if cfg.aggregate.write_workbook {
        files.push(cfg.workbook_path());
    }
    for name in [
        crate::config::PLAYERS_FILE,
        crate::config::EDGES_FILE,
        crate::config::METRICS_FILE,
        crate::config::QUALITY_MATCHUPS_FILE,
    ] {
        files.push(cfg.data_dir.join(name));
    }
    files
}
