use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::GraphConfig;
use crate::delivery::Delivery;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupEdge {
    pub batter: String,
    pub bowler: String,
    pub runs_scored: u32,
    pub balls_faced: u32,
    pub dismissals: u32,
    pub avg_runs_per_ball: f64,
    pub dot_balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub dominance_score: f64,
    pub strike_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerRole {
    Batter,
    Bowler,
    Both,
}

impl PlayerRole {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerRole::Batter => "batter",
            PlayerRole::Bowler => "bowler",
            PlayerRole::Both => "both",
        }
    }

    fn merge(self, other: PlayerRole) -> PlayerRole {
        if self == other { self } else { PlayerRole::Both }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerNode {
    pub id: String,
    pub role: PlayerRole,
    pub career_runs: u32,
    pub career_balls: u32,
    pub career_dismissals: u32,
    /// Runs off the bat conceded on legal deliveries.
    pub runs_conceded: u32,
    pub balls_bowled: u32,
    pub wickets_taken: u32,
    /// Distinct bowlers faced over a kept edge.
    pub out_degree: u32,
    /// Distinct batters bowled to over a kept edge.
    pub in_degree: u32,
    /// Normalized degree, `(out_degree + in_degree) / pagerank_divisor`.
    /// Not an iterative PageRank; the name is kept for the front-end.
    pub pagerank: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityMatchup<'a> {
    pub edge: &'a MatchupEdge,
    pub bowler_career_wickets: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchupGraph {
    pub nodes: Vec<PlayerNode>,
    pub edges: Vec<MatchupEdge>,
    pub deliveries_analyzed: usize,
    pub config: GraphConfig,
}

#[derive(Default)]
struct EdgeAcc {
    runs: u32,
    balls: u32,
    dismissals: u32,
    dot_balls: u32,
    fours: u32,
    sixes: u32,
}

/// Builds the directed batter -> bowler graph from legal deliveries. Pairs
/// with fewer than `min_edge_balls` balls are dropped before degrees are
/// counted.
pub fn build_matchup_graph(deliveries: &[Delivery], cfg: &GraphConfig) -> MatchupGraph {
    let legal: Vec<&Delivery> = deliveries.iter().filter(|d| d.is_legal_delivery).collect();

    let mut pairs: BTreeMap<(&str, &str), EdgeAcc> = BTreeMap::new();
    let mut nodes: BTreeMap<&str, PlayerNode> = BTreeMap::new();

    for &d in &legal {
        let dismissed = d.dismissed(&d.batter);

        let acc = pairs
            .entry((d.batter.as_str(), d.bowler.as_str()))
            .or_default();
        acc.runs += d.runs_batter;
        acc.balls += 1;
        acc.dismissals += u32::from(dismissed);
        // Off the bat only, so a leg bye still counts as a dot for the batter.
        acc.dot_balls += u32::from(d.runs_batter == 0);
        acc.fours += u32::from(d.is_four());
        acc.sixes += u32::from(d.is_six());

        let batter = node_entry(&mut nodes, &d.batter, PlayerRole::Batter);
        batter.career_runs += d.runs_batter;
        batter.career_balls += 1;
        batter.career_dismissals += u32::from(dismissed);

        let bowler = node_entry(&mut nodes, &d.bowler, PlayerRole::Bowler);
        bowler.runs_conceded += d.runs_batter;
        bowler.balls_bowled += 1;
        bowler.wickets_taken += u32::from(d.is_bowler_wicket);
    }

    let mut edges = Vec::new();
    let mut out_degree: HashMap<&str, u32> = HashMap::new();
    let mut in_degree: HashMap<&str, u32> = HashMap::new();
    for ((batter, bowler), acc) in pairs {
        if acc.balls < cfg.min_edge_balls {
            continue;
        }
        *out_degree.entry(batter).or_insert(0) += 1;
        *in_degree.entry(bowler).or_insert(0) += 1;
        edges.push(edge_from(batter, bowler, &acc, cfg));
    }

    let nodes = nodes
        .into_values()
        .map(|mut node| {
            node.out_degree = out_degree.get(node.id.as_str()).copied().unwrap_or(0);
            node.in_degree = in_degree.get(node.id.as_str()).copied().unwrap_or(0);
            node.pagerank = (node.out_degree + node.in_degree) as f64 / cfg.pagerank_divisor;
            node
        })
        .collect();

    MatchupGraph {
        nodes,
        edges,
        deliveries_analyzed: legal.len(),
        config: *cfg,
    }
}

fn node_entry<'m, 'a>(
    nodes: &'m mut BTreeMap<&'a str, PlayerNode>,
    id: &'a str,
    role: PlayerRole,
) -> &'m mut PlayerNode {
    let node = nodes.entry(id).or_insert_with(|| PlayerNode {
        id: id.to_string(),
        role,
        career_runs: 0,
        career_balls: 0,
        career_dismissals: 0,
        runs_conceded: 0,
        balls_bowled: 0,
        wickets_taken: 0,
        out_degree: 0,
        in_degree: 0,
        pagerank: 0.0,
    });
    node.role = node.role.merge(role);
    node
}

fn edge_from(batter: &str, bowler: &str, acc: &EdgeAcc, cfg: &GraphConfig) -> MatchupEdge {
    let balls = acc.balls.max(1) as f64;
    let per_ball = acc.runs as f64 / balls;
    MatchupEdge {
        batter: batter.to_string(),
        bowler: bowler.to_string(),
        runs_scored: acc.runs,
        balls_faced: acc.balls,
        dismissals: acc.dismissals,
        avg_runs_per_ball: per_ball,
        dot_balls: acc.dot_balls,
        fours: acc.fours,
        sixes: acc.sixes,
        dominance_score: per_ball - acc.dismissals as f64 * cfg.dismissal_penalty,
        strike_rate: per_ball * 100.0,
    }
}

fn desc_f64(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

impl MatchupGraph {
    pub fn node(&self, id: &str) -> Option<&PlayerNode> {
        self.nodes
            .binary_search_by(|n| n.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.nodes[idx])
    }

    pub fn edge(&self, batter: &str, bowler: &str) -> Option<&MatchupEdge> {
        self.edges
            .iter()
            .find(|e| e.batter == batter && e.bowler == bowler)
    }

    pub fn top_by_pagerank(&self, limit: usize) -> Vec<&PlayerNode> {
        let mut nodes: Vec<&PlayerNode> = self.nodes.iter().collect();
        nodes.sort_by(|a, b| desc_f64(a.pagerank, b.pagerank).then_with(|| a.id.cmp(&b.id)));
        nodes.truncate(limit);
        nodes
    }

    pub fn top_by_dominance(&self, limit: usize) -> Vec<&MatchupEdge> {
        let mut edges: Vec<&MatchupEdge> = self.edges.iter().collect();
        edges.sort_by(|a, b| {
            desc_f64(a.dominance_score, b.dominance_score)
                .then_with(|| a.batter.cmp(&b.batter))
                .then_with(|| a.bowler.cmp(&b.bowler))
        });
        edges.truncate(limit);
        edges
    }

    pub fn edges_by_activity(&self, limit: usize) -> Vec<&MatchupEdge> {
        let mut edges: Vec<&MatchupEdge> = self.edges.iter().collect();
        edges.sort_by(|a, b| {
            b.balls_faced
                .cmp(&a.balls_faced)
                .then_with(|| a.batter.cmp(&b.batter))
                .then_with(|| a.bowler.cmp(&b.bowler))
        });
        edges.truncate(limit);
        edges
    }

    /// Edges where a batter did well against a bowler with a long wicket
    /// record, best dominance first.
    pub fn quality_matchups(&self, limit: usize) -> Vec<QualityMatchup<'_>> {
        let mut out: Vec<QualityMatchup<'_>> = self
            .edges
            .iter()
            .filter(|e| e.dominance_score > self.config.quality_min_dominance)
            .filter_map(|edge| {
                let wickets = self.node(&edge.bowler)?.wickets_taken;
                (wickets >= self.config.quality_min_wickets).then_some(QualityMatchup {
                    edge,
                    bowler_career_wickets: wickets,
                })
            })
            .collect();
        out.sort_by(|a, b| {
            desc_f64(a.edge.dominance_score, b.edge.dominance_score)
                .then_with(|| a.edge.batter.cmp(&b.edge.batter))
                .then_with(|| a.edge.bowler.cmp(&b.edge.bowler))
        });
        out.truncate(limit);
        out
    }

    pub fn most_active_batters(&self, limit: usize) -> Vec<&PlayerNode> {
        self.top_by_degree(limit, |n| n.out_degree)
    }

    pub fn most_active_bowlers(&self, limit: usize) -> Vec<&PlayerNode> {
        self.top_by_degree(limit, |n| n.in_degree)
    }

    fn top_by_degree(&self, limit: usize, degree: impl Fn(&PlayerNode) -> u32) -> Vec<&PlayerNode> {
        let mut nodes: Vec<&PlayerNode> = self.nodes.iter().filter(|n| degree(*n) > 0).collect();
        nodes.sort_by(|a, b| degree(*b).cmp(&degree(*a)).then_with(|| a.id.cmp(&b.id)));
        nodes.truncate(limit);
        nodes
    }
}
