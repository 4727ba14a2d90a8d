use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{EDGES_FILE, METRICS_FILE, PLAYERS_FILE, QUALITY_MATCHUPS_FILE};
use crate::matchup_graph::{MatchupEdge, MatchupGraph, PlayerNode, QualityMatchup};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerJson {
    pub id: String,
    pub pagerank: f64,
    #[serde(rename = "type")]
    pub role: String,
    pub career_runs: u32,
    pub career_balls: u32,
    pub career_dismissals: u32,
    pub wickets: u32,
    pub runs_conceded: u32,
    pub balls_bowled: u32,
    pub out_degree: u32,
    pub in_degree: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeJson {
    pub source: String,
    pub target: String,
    pub runs: u32,
    pub balls: u32,
    pub dismissals: u32,
    pub avg_runs_per_ball: f64,
    pub dominance: f64,
    pub strike_rate: f64,
    pub dot_balls: u32,
    pub fours: u32,
    pub sixes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub player: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveBatter {
    pub player: String,
    pub bowlers_faced: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveBowler {
    pub player: String,
    pub batters_bowled_to: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub total_players: usize,
    pub total_interactions: usize,
    pub total_deliveries_analyzed: usize,
    pub generated_at: String,
    pub top_players_by_pagerank: Vec<PlayerScore>,
    pub most_active_batters: Vec<ActiveBatter>,
    pub most_active_bowlers: Vec<ActiveBowler>,
    pub top_dominance_matchups: Vec<EdgeJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMatchupJson {
    pub batter: String,
    pub bowler: String,
    pub runs: u32,
    pub balls: u32,
    pub dismissals: u32,
    pub dominance: f64,
    pub strike_rate: f64,
    pub bowler_career_wickets: u32,
}

#[derive(Debug, Clone)]
pub struct GraphExportReport {
    pub dir: PathBuf,
    pub players: usize,
    pub edges: usize,
    pub quality_matchups: usize,
}

impl From<&PlayerNode> for PlayerJson {
    fn from(node: &PlayerNode) -> Self {
        Self {
            id: node.id.clone(),
            pagerank: node.pagerank,
            role: node.role.as_str().to_string(),
            career_runs: node.career_runs,
            career_balls: node.career_balls,
            career_dismissals: node.career_dismissals,
            wickets: node.wickets_taken,
            runs_conceded: node.runs_conceded,
            balls_bowled: node.balls_bowled,
            out_degree: node.out_degree,
            in_degree: node.in_degree,
        }
    }
}

impl From<&MatchupEdge> for EdgeJson {
    fn from(edge: &MatchupEdge) -> Self {
        Self {
            source: edge.batter.clone(),
            target: edge.bowler.clone(),
            runs: edge.runs_scored,
            balls: edge.balls_faced,
            dismissals: edge.dismissals,
            avg_runs_per_ball: edge.avg_runs_per_ball,
            dominance: edge.dominance_score,
            strike_rate: edge.strike_rate,
            dot_balls: edge.dot_balls,
            fours: edge.fours,
            sixes: edge.sixes,
        }
    }
}

impl From<&QualityMatchup<'_>> for QualityMatchupJson {
    fn from(m: &QualityMatchup<'_>) -> Self {
        Self {
            batter: m.edge.batter.clone(),
            bowler: m.edge.bowler.clone(),
            runs: m.edge.runs_scored,
            balls: m.edge.balls_faced,
            dismissals: m.edge.dismissals,
            dominance: m.edge.dominance_score,
            strike_rate: m.edge.strike_rate,
            bowler_career_wickets: m.bowler_career_wickets,
        }
    }
}

pub fn players_json(graph: &MatchupGraph) -> Vec<PlayerJson> {
    graph
        .top_by_pagerank(graph.config.max_players)
        .into_iter()
        .map(PlayerJson::from)
        .collect()
}

pub fn edges_json(graph: &MatchupGraph) -> Vec<EdgeJson> {
    graph
        .edges_by_activity(graph.config.max_edges)
        .into_iter()
        .map(EdgeJson::from)
        .collect()
}

pub fn quality_matchups_json(graph: &MatchupGraph) -> Vec<QualityMatchupJson> {
    graph
        .quality_matchups(graph.config.max_quality_matchups)
        .iter()
        .map(QualityMatchupJson::from)
        .collect()
}

pub fn graph_metrics(graph: &MatchupGraph, generated_at: String) -> GraphMetrics {
    let cfg = &graph.config;
    let list_len = cfg.metric_list_len;

    GraphMetrics {
        total_players: graph.nodes.len(),
        total_interactions: graph.edges.len(),
        total_deliveries_analyzed: graph.deliveries_analyzed,
        generated_at,
        top_players_by_pagerank: graph
            .top_by_pagerank(cfg.top_pagerank.min(list_len))
            .into_iter()
            .map(|n| PlayerScore {
                player: n.id.clone(),
                score: n.pagerank,
            })
            .collect(),
        most_active_batters: graph
            .most_active_batters(list_len)
            .into_iter()
            .map(|n| ActiveBatter {
                player: n.id.clone(),
                bowlers_faced: n.out_degree,
            })
            .collect(),
        most_active_bowlers: graph
            .most_active_bowlers(list_len)
            .into_iter()
            .map(|n| ActiveBowler {
                player: n.id.clone(),
                batters_bowled_to: n.in_degree,
            })
            .collect(),
        top_dominance_matchups: graph
            .top_by_dominance(cfg.top_dominance)
            .into_iter()
            .map(EdgeJson::from)
            .collect(),
    }
}

/// Writes the four front-end documents into `dir`.
pub fn export_graph(graph: &MatchupGraph, dir: &Path) -> Result<GraphExportReport> {
    fs::create_dir_all(dir).with_context(|| format!("create output dir {}", dir.display()))?;

    let players = players_json(graph);
    write_json(&dir.join(PLAYERS_FILE), &players)?;

    let edges = edges_json(graph);
    write_json(&dir.join(EDGES_FILE), &edges)?;

    let metrics = graph_metrics(graph, Utc::now().to_rfc3339());
    write_json(&dir.join(METRICS_FILE), &metrics)?;

    let quality = quality_matchups_json(graph);
    write_json(&dir.join(QUALITY_MATCHUPS_FILE), &quality)?;

    Ok(GraphExportReport {
        dir: dir.to_path_buf(),
        players: players.len(),
        edges: edges.len(),
        quality_matchups: quality.len(),
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path.display()))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}
