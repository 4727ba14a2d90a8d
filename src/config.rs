use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

pub const RAW_DATA_FILE: &str = "raw_data.json";
pub const DELIVERIES_FILE: &str = "cricket_ball_by_ball.parquet";
pub const TEAM_INNINGS_FILE: &str = "match_stats.csv";
pub const BATTER_STATS_FILE: &str = "batter_stats.csv";
pub const BOWLER_STATS_FILE: &str = "bowler_stats.csv";
pub const STATS_WORKBOOK_FILE: &str = "cricket_stats.xlsx";
pub const PLAYERS_FILE: &str = "players.json";
pub const EDGES_FILE: &str = "edges.json";
pub const METRICS_FILE: &str = "metrics.json";
pub const QUALITY_MATCHUPS_FILE: &str = "asymmetric_matchups.json";

/// Which dismissals count as a wicket for the bowler of the delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WicketCredit {
    #[default]
    AllDismissals,
    BowledAndLbw,
}

impl WicketCredit {
    pub fn credits(self, kind: &str) -> bool {
        match self {
            WicketCredit::AllDismissals => true,
            WicketCredit::BowledAndLbw => {
                let kind = kind.trim();
                kind.eq_ignore_ascii_case("bowled") || kind.eq_ignore_ascii_case("lbw")
            }
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" | "all_dismissals" => Some(WicketCredit::AllDismissals),
            "bowled_lbw" | "bowled_and_lbw" => Some(WicketCredit::BowledAndLbw),
            _ => None,
        }
    }
}

/// How `match_id` is derived from a match document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchKey {
    /// `<date>-<sha256 prefix>` over date, teams, venue, city and match number.
    #[default]
    Hashed,
    /// `<date>-<first team>`. Collides for repeated fixtures on one date.
    Legacy,
}

impl MatchKey {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hashed" | "hash" => Some(MatchKey::Hashed),
            "legacy" => Some(MatchKey::Legacy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NormalizeConfig {
    pub wicket_credit: WicketCredit,
    pub match_key: MatchKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    pub write_workbook: bool,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            write_workbook: true,
        }
    }
}

/// Weights and output caps for the batter/bowler matchup graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    // 2 overs.
    pub min_edge_balls: u32,
    pub dismissal_penalty: f64,
    // The "pagerank" column is (out_degree + in_degree) / pagerank_divisor.
    pub pagerank_divisor: f64,
    pub quality_min_wickets: u32,
    pub quality_min_dominance: f64,
    pub max_players: usize,
    pub max_edges: usize,
    pub top_pagerank: usize,
    pub top_dominance: usize,
    pub metric_list_len: usize,
    pub max_quality_matchups: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            min_edge_balls: 12,
            dismissal_penalty: 8.0,
            pagerank_divisor: 1000.0,
            quality_min_wickets: 50,
            quality_min_dominance: 0.5,
            max_players: 500,
            max_edges: 5000,
            top_pagerank: 100,
            top_dominance: 200,
            metric_list_len: 30,
            max_quality_matchups: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    /// Directory of one-match-per-file JSON documents read by the combiner.
    pub input_dir: Option<PathBuf>,
    pub normalize: NormalizeConfig,
    pub aggregate: AggregateConfig,
    pub graph: GraphConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            input_dir: None,
            normalize: NormalizeConfig::default(),
            aggregate: AggregateConfig::default(),
            graph: GraphConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read pipeline config {}", path.display()))?;
        let mut cfg = serde_json::from_str::<Self>(&raw)
            .with_context(|| format!("parse pipeline config {}", path.display()))?;
        if !valid_divisor(cfg.graph.pagerank_divisor) {
            warn!(
                "ignoring non-positive pagerank_divisor={} in {}",
                cfg.graph.pagerank_divisor,
                path.display()
            );
            cfg.graph.pagerank_divisor = GraphConfig::default().pagerank_divisor;
        }
        Ok(cfg)
    }

    /// Applies `CRICKET_*` environment overrides on top of the current values.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("CRICKET_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(dir) = lookup("CRICKET_INPUT_DIR").filter(|v| !v.trim().is_empty()) {
            self.input_dir = Some(PathBuf::from(dir.trim()));
        }

        let graph = &mut self.graph;
        override_parsed(&lookup, "CRICKET_MIN_EDGE_BALLS", &mut graph.min_edge_balls);
        override_parsed(&lookup, "CRICKET_DISMISSAL_PENALTY", &mut graph.dismissal_penalty);
        override_parsed(&lookup, "CRICKET_QUALITY_MIN_WICKETS", &mut graph.quality_min_wickets);
        override_parsed(
            &lookup,
            "CRICKET_QUALITY_MIN_DOMINANCE",
            &mut graph.quality_min_dominance,
        );
        let mut divisor = graph.pagerank_divisor;
        override_parsed(&lookup, "CRICKET_PAGERANK_DIVISOR", &mut divisor);
        if valid_divisor(divisor) {
            graph.pagerank_divisor = divisor;
        } else {
            warn!("ignoring non-positive CRICKET_PAGERANK_DIVISOR={divisor}");
        }

        if let Some(raw) = lookup("CRICKET_WICKET_CREDIT") {
            match WicketCredit::parse(&raw) {
                Some(policy) => self.normalize.wicket_credit = policy,
                None => warn!("ignoring unknown CRICKET_WICKET_CREDIT={raw:?}"),
            }
        }
        if let Some(raw) = lookup("CRICKET_MATCH_KEY") {
            match MatchKey::parse(&raw) {
                Some(key) => self.normalize.match_key = key,
                None => warn!("ignoring unknown CRICKET_MATCH_KEY={raw:?}"),
            }
        }
    }

    pub fn input_dir(&self) -> PathBuf {
        self.input_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("temp_jsons"))
    }

    pub fn raw_data_path(&self) -> PathBuf {
        self.data_dir.join(RAW_DATA_FILE)
    }

    pub fn deliveries_path(&self) -> PathBuf {
        self.data_dir.join(DELIVERIES_FILE)
    }

    pub fn team_innings_path(&self) -> PathBuf {
        self.data_dir.join(TEAM_INNINGS_FILE)
    }

    pub fn batter_stats_path(&self) -> PathBuf {
        self.data_dir.join(BATTER_STATS_FILE)
    }

    pub fn bowler_stats_path(&self) -> PathBuf {
        self.data_dir.join(BOWLER_STATS_FILE)
    }

    pub fn workbook_path(&self) -> PathBuf {
        self.data_dir.join(STATS_WORKBOOK_FILE)
    }
}

fn valid_divisor(value: f64) -> bool {
    value > 0.0 && value.is_finite()
}

fn override_parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T)
where
    T: std::str::FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    if raw.trim().is_empty() {
        return;
    }
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(_) => warn!("ignoring invalid {key}={raw:?}"),
    }
}
