use std::fs;

use cricket_etl::config::GraphConfig;
use cricket_etl::delivery::{Delivery, ExtrasKind};
use cricket_etl::graph_export::{
    EdgeJson, GraphMetrics, PlayerJson, QualityMatchupJson, export_graph, graph_metrics,
};
use cricket_etl::matchup_graph::{PlayerRole, build_matchup_graph};

fn ball(batter: &str, bowler: &str, runs: u32) -> Delivery {
    Delivery {
        match_id: "2024-03-01-abc".to_string(),
        match_date: "2024-03-01".to_string(),
        season: Some("2024".to_string()),
        venue: "Ground".to_string(),
        city: None,
        toss_winner: None,
        match_winner: None,
        batting_team: "Bats".to_string(),
        innings: 1,
        over: 1,
        ball: 1,
        batter: batter.to_string(),
        bowler: bowler.to_string(),
        runs_batter: runs,
        runs_extras: 0,
        runs_total: runs,
        extras_type: None,
        is_wide: false,
        is_noball: false,
        is_legal_delivery: true,
        is_wicket: false,
        player_out: None,
        wicket_type: None,
        is_bowler_wicket: false,
        is_boundary: runs == 4 || runs == 6,
        is_dot_ball: runs == 0,
    }
}

fn out(batter: &str, bowler: &str) -> Delivery {
    let mut d = ball(batter, bowler, 0);
    d.is_wicket = true;
    d.player_out = Some(batter.to_string());
    d.wicket_type = Some("bowled".to_string());
    d.is_bowler_wicket = true;
    d
}

fn spell(batter: &str, bowler: &str, runs: &[u32]) -> Vec<Delivery> {
    runs.iter().map(|r| ball(batter, bowler, *r)).collect()
}

#[test]
fn pairs_below_the_ball_threshold_are_dropped() {
    let mut deliveries = spell("hitter", "slow", &[6; 11]);
    deliveries.extend(spell("steady", "slow", &[1; 12]));

    let graph = build_matchup_graph(&deliveries, &GraphConfig::default());
    assert_eq!(graph.edges.len(), 1);
    assert!(graph.edge("hitter", "slow").is_none());
    let edge = graph.edge("steady", "slow").expect("kept edge");
    assert_eq!(edge.balls_faced, 12);
    assert_eq!(edge.runs_scored, 12);

    // The dropped pair still counts toward career totals.
    let hitter = graph.node("hitter").expect("hitter node");
    assert_eq!(hitter.career_runs, 66);
    assert_eq!(hitter.out_degree, 0);
    assert_eq!(hitter.pagerank, 0.0);
    assert_eq!(graph.node("slow").map(|n| n.in_degree), Some(1));
}

#[test]
fn illegal_deliveries_never_reach_the_graph() {
    let mut deliveries = spell("a", "b", &[1; 12]);
    let mut wide = ball("a", "b", 0);
    wide.runs_extras = 1;
    wide.runs_total = 1;
    wide.extras_type = Some(ExtrasKind::Wides);
    wide.is_wide = true;
    wide.is_legal_delivery = false;
    wide.is_dot_ball = false;
    let mut noball = ball("a", "b", 4);
    noball.runs_extras = 1;
    noball.runs_total = 5;
    noball.extras_type = Some(ExtrasKind::Noballs);
    noball.is_noball = true;
    noball.is_legal_delivery = false;
    deliveries.push(wide);
    deliveries.push(noball);

    let graph = build_matchup_graph(&deliveries, &GraphConfig::default());
    assert_eq!(graph.deliveries_analyzed, 12);
    let edge = graph.edge("a", "b").expect("edge");
    assert_eq!(edge.balls_faced, 12);
    assert_eq!(edge.runs_scored, 12);
    assert_eq!(edge.fours, 0);
}

#[test]
fn dominance_and_strike_rate_per_edge() {
    let mut deliveries = spell("a", "b", &[4, 4, 6, 0, 1, 1, 2, 0, 0, 4, 0]);
    deliveries.push(out("a", "b"));

    let graph = build_matchup_graph(&deliveries, &GraphConfig::default());
    let edge = graph.edge("a", "b").expect("edge");
    assert_eq!(edge.runs_scored, 22);
    assert_eq!(edge.balls_faced, 12);
    assert_eq!(edge.dismissals, 1);
    assert_eq!(edge.fours, 3);
    assert_eq!(edge.sixes, 1);
    assert_eq!(edge.dot_balls, 5);
    let per_ball = 22.0 / 12.0;
    assert!((edge.avg_runs_per_ball - per_ball).abs() < 1e-12);
    assert!((edge.strike_rate - per_ball * 100.0).abs() < 1e-9);
    assert!((edge.dominance_score - (per_ball - 8.0)).abs() < 1e-12);
}

#[test]
fn edge_dots_count_balls_with_no_runs_off_the_bat() {
    let mut deliveries = spell("a", "b", &[1; 10]);
    deliveries.push(ball("a", "b", 0));
    let mut legbye = ball("a", "b", 0);
    legbye.runs_extras = 1;
    legbye.runs_total = 1;
    legbye.extras_type = Some(ExtrasKind::Legbyes);
    legbye.is_dot_ball = false;
    deliveries.push(legbye);

    let graph = build_matchup_graph(&deliveries, &GraphConfig::default());
    let edge = graph.edge("a", "b").expect("edge");
    assert_eq!(edge.balls_faced, 12);
    assert_eq!(edge.runs_scored, 10);
    assert_eq!(edge.dot_balls, 2);
}

#[test]
fn degrees_pagerank_and_roles() {
    let mut deliveries = Vec::new();
    deliveries.extend(spell("x", "p", &[1; 12]));
    deliveries.extend(spell("x", "q", &[1; 12]));
    deliveries.extend(spell("y", "p", &[0; 12]));
    // p also bats against x.
    deliveries.extend(spell("p", "x", &[2; 12]));

    let graph = build_matchup_graph(&deliveries, &GraphConfig::default());
    let x = graph.node("x").expect("x");
    assert_eq!(x.out_degree, 2);
    assert_eq!(x.in_degree, 1);
    assert_eq!(x.role, PlayerRole::Both);
    assert!((x.pagerank - 3.0 / 1000.0).abs() < 1e-12);

    let p = graph.node("p").expect("p");
    assert_eq!(p.in_degree, 2);
    assert_eq!(p.out_degree, 1);
    assert_eq!(p.role, PlayerRole::Both);

    assert_eq!(graph.node("y").map(|n| n.role), Some(PlayerRole::Batter));
    assert_eq!(graph.node("q").map(|n| n.role), Some(PlayerRole::Bowler));

    let batters: Vec<_> = graph
        .most_active_batters(10)
        .iter()
        .map(|n| (n.id.as_str(), n.out_degree))
        .collect();
    assert_eq!(batters, vec![("x", 2), ("p", 1), ("y", 1)]);

    let bowlers: Vec<_> = graph
        .most_active_bowlers(10)
        .iter()
        .map(|n| (n.id.as_str(), n.in_degree))
        .collect();
    assert_eq!(bowlers, vec![("p", 2), ("q", 1), ("x", 1)]);

    let top: Vec<_> = graph.top_by_pagerank(2).iter().map(|n| n.id.clone()).collect();
    assert_eq!(top, vec!["p".to_string(), "x".to_string()]);
}

#[test]
fn quality_matchups_need_a_proven_bowler() {
    let cfg = GraphConfig {
        quality_min_wickets: 3,
        ..GraphConfig::default()
    };
    let mut deliveries = Vec::new();
    // "ace" takes 3 wickets against tail-enders, conceding nothing.
    for tail in ["t1", "t2", "t3"] {
        deliveries.push(out(tail, "ace"));
    }
    deliveries.extend(spell("star", "ace", &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 4, 4]));
    deliveries.extend(spell("star", "rookie", &[6; 12]));

    let graph = build_matchup_graph(&deliveries, &cfg);
    let quality = graph.quality_matchups(10);
    assert_eq!(quality.len(), 1);
    assert_eq!(quality[0].edge.batter, "star");
    assert_eq!(quality[0].edge.bowler, "ace");
    assert_eq!(quality[0].bowler_career_wickets, 3);

    let strict = GraphConfig {
        quality_min_wickets: 4,
        ..GraphConfig::default()
    };
    let graph = build_matchup_graph(&deliveries, &strict);
    assert!(graph.quality_matchups(10).is_empty());
}

#[test]
fn metrics_rank_dominance_and_activity() {
    let mut deliveries = Vec::new();
    deliveries.extend(spell("a", "b", &[2; 12]));
    deliveries.extend(spell("c", "b", &[1; 18]));
    deliveries.extend(spell("c", "d", &[0; 12]));

    let graph = build_matchup_graph(&deliveries, &GraphConfig::default());
    let metrics = graph_metrics(&graph, "2024-03-02T00:00:00+00:00".to_string());
    assert_eq!(metrics.total_players, 4);
    assert_eq!(metrics.total_interactions, 3);
    assert_eq!(metrics.total_deliveries_analyzed, 42);

    let dominance: Vec<_> = metrics
        .top_dominance_matchups
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    assert_eq!(dominance, vec![("a", "b"), ("c", "b"), ("c", "d")]);

    assert_eq!(metrics.most_active_batters[0].player, "c");
    assert_eq!(metrics.most_active_batters[0].bowlers_faced, 2);
    assert_eq!(metrics.most_active_bowlers[0].player, "b");
    assert_eq!(metrics.most_active_bowlers[0].batters_bowled_to, 2);

    let busiest: Vec<_> = graph
        .edges_by_activity(1)
        .iter()
        .map(|e| e.balls_faced)
        .collect();
    assert_eq!(busiest, vec![18]);
}

#[test]
fn export_writes_all_documents_within_caps() {
    let cfg = GraphConfig {
        max_players: 2,
        max_edges: 1,
        ..GraphConfig::default()
    };
    let mut deliveries = Vec::new();
    deliveries.extend(spell("a", "b", &[2; 12]));
    deliveries.extend(spell("c", "b", &[1; 14]));
    let graph = build_matchup_graph(&deliveries, &cfg);

    let dir = tempfile::tempdir().expect("tempdir");
    let report = export_graph(&graph, dir.path()).expect("export");
    assert_eq!(report.players, 2);
    assert_eq!(report.edges, 1);

    let players: Vec<PlayerJson> = serde_json::from_str(
        &fs::read_to_string(dir.path().join("players.json")).expect("players.json"),
    )
    .expect("players parse");
    assert_eq!(players.len(), 2);
    assert_eq!(players[0].id, "b");
    assert_eq!(players[0].role, "bowler");

    let edges: Vec<EdgeJson> = serde_json::from_str(
        &fs::read_to_string(dir.path().join("edges.json")).expect("edges.json"),
    )
    .expect("edges parse");
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source, "c");
    assert_eq!(edges[0].balls, 14);

    let metrics: GraphMetrics = serde_json::from_str(
        &fs::read_to_string(dir.path().join("metrics.json")).expect("metrics.json"),
    )
    .expect("metrics parse");
    assert_eq!(metrics.total_players, 3);
    assert!(!metrics.generated_at.is_empty());

    let quality: Vec<QualityMatchupJson> = serde_json::from_str(
        &fs::read_to_string(dir.path().join("asymmetric_matchups.json"))
            .expect("asymmetric_matchups.json"),
    )
    .expect("quality parse");
    assert!(quality.is_empty());
}
