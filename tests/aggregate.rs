use std::fs;
use std::path::PathBuf;

use cricket_etl::aggregate::{aggregate, batter_summary, bowler_summary, team_innings_summary};
use cricket_etl::config::NormalizeConfig;
use cricket_etl::delivery::{Delivery, ExtrasKind};
use cricket_etl::normalize::normalize_matches;
use cricket_etl::stats_export::{StatsPaths, read_stats, write_stats};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn fixture_deliveries() -> Vec<Delivery> {
    let docs = vec![
        serde_json::from_str(&read_fixture("matches/2023-04-01_lions_tigers.json"))
            .expect("fixture json"),
        serde_json::from_str(&read_fixture("matches/2023-04-08_tigers_lions.json"))
            .expect("fixture json"),
    ];
    normalize_matches(&docs, &NormalizeConfig::default()).deliveries
}

fn ball(match_id: &str, batter: &str, bowler: &str, runs: u32) -> Delivery {
    Delivery {
        match_id: match_id.to_string(),
        match_date: "2024-02-01".to_string(),
        season: None,
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

fn wicket(match_id: &str, batter: &str, bowler: &str) -> Delivery {
    let mut d = ball(match_id, batter, bowler, 0);
    d.is_wicket = true;
    d.player_out = Some(batter.to_string());
    d.wicket_type = Some("bowled".to_string());
    d.is_bowler_wicket = true;
    d
}

#[test]
fn team_innings_totals_include_extras() {
    let rows = team_innings_summary(&fixture_deliveries());
    assert_eq!(rows.len(), 3);

    let lions = rows
        .iter()
        .find(|r| r.batting_team == "Lions")
        .expect("lions innings");
    assert_eq!(lions.runs, 18);
    assert_eq!(lions.extras, 12);
    assert_eq!(lions.total_score, 30);
    assert_eq!(lions.wickets, 3);
    assert_eq!(lions.boundaries, 3);
    assert_eq!(lions.fours, 2);
    assert_eq!(lions.sixes, 1);
    assert_eq!(lions.balls_faced, 11);
    assert_eq!(lions.overs, 1.8);
    assert_eq!(lions.city.as_deref(), Some("Testville"));

    for row in &rows {
        assert_eq!(row.total_score, row.runs + row.extras);
    }
}

#[test]
fn batters_are_credited_for_runs_and_the_dismissed_player_for_outs() {
    let rows = batter_summary(&fixture_deliveries());
    let l2 = rows.iter().find(|r| r.batter == "L2").expect("L2");
    assert_eq!(l2.total_runs, 10);
    assert_eq!(l2.balls_faced, 2);
    assert_eq!(l2.times_out, 1);
    assert_eq!(l2.fours, 1);
    assert_eq!(l2.sixes, 1);
    assert_eq!(l2.strike_rate, Some(500.0));
    assert_eq!(l2.batting_average, Some(10.0));

    let l3 = rows.iter().find(|r| r.batter == "L3").expect("L3");
    assert_eq!(l3.total_runs, 5);
    assert_eq!(l3.balls_faced, 6);
    assert_eq!(l3.times_out, 1);
    assert_eq!(l3.dot_balls, 2);
    assert_eq!(l3.dot_ball_percentage, Some(33.33));
    assert_eq!(l3.strike_rate, Some(83.33));

    let t3 = rows.iter().find(|r| r.batter == "T3").expect("T3");
    assert_eq!(t3.matches_played, 2);
    assert_eq!(t3.total_runs, 12);
    assert_eq!(t3.highest_score, 8);
}

#[test]
fn batter_never_dismissed_has_no_average() {
    let rows = batter_summary(&fixture_deliveries());
    let l4 = rows.iter().find(|r| r.batter == "L4").expect("L4");
    assert_eq!(l4.times_out, 0);
    assert_eq!(l4.batting_average, None);
    assert_eq!(l4.strike_rate, Some(200.0));
}

#[test]
fn batters_sorted_by_runs_then_name() {
    let rows = batter_summary(&fixture_deliveries());
    let order: Vec<_> = rows.iter().map(|r| r.batter.as_str()).collect();
    assert_eq!(order[0], "T3");
    assert_eq!(order[1], "L2");
    for pair in rows.windows(2) {
        assert!(
            pair[0].total_runs > pair[1].total_runs
                || (pair[0].total_runs == pair[1].total_runs && pair[0].batter < pair[1].batter)
        );
    }
}

#[test]
fn bowlers_charge_every_run_and_count_legal_balls() {
    let rows = bowler_summary(&fixture_deliveries());

    let t1 = rows.iter().find(|r| r.bowler == "T1").expect("T1");
    assert_eq!(t1.balls_bowled, 5);
    assert_eq!(t1.runs_conceded, 14);
    assert_eq!(t1.extras_conceded, 3);
    assert_eq!(t1.wickets_taken, 1);
    assert_eq!(t1.dot_balls, 2);
    assert_eq!(t1.economy_rate, Some(16.8));
    assert_eq!(t1.bowling_average, Some(14.0));
    assert_eq!(t1.strike_rate, Some(5.0));

    let t2 = rows.iter().find(|r| r.bowler == "T2").expect("T2");
    assert_eq!(t2.balls_bowled, 6);
    assert_eq!(t2.overs_bowled, 1.0);
    assert_eq!(t2.runs_conceded, 16);
    assert_eq!(t2.extras_conceded, 9);
    assert_eq!(t2.wickets_taken, 2);
    assert_eq!(t2.economy_rate, Some(16.0));

    let l5 = rows.iter().find(|r| r.bowler == "L5").expect("L5");
    assert_eq!(l5.matches_played, 2);
    assert_eq!(l5.balls_bowled, 6);
    assert_eq!(l5.runs_conceded, 13);
}

#[test]
fn wicketless_bowler_has_no_average_or_strike_rate() {
    let rows = bowler_summary(&[ball("m1", "a", "b", 1), ball("m1", "a", "b", 0)]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].wickets_taken, 0);
    assert_eq!(rows[0].bowling_average, None);
    assert_eq!(rows[0].strike_rate, None);
    assert_eq!(rows[0].economy_rate, Some(3.0));
}

#[test]
fn only_illegal_balls_leave_rates_undefined() {
    let mut wide = ball("m1", "a", "b", 0);
    wide.runs_extras = 1;
    wide.runs_total = 1;
    wide.extras_type = Some(ExtrasKind::Wides);
    wide.is_wide = true;
    wide.is_legal_delivery = false;
    wide.is_dot_ball = false;

    let batters = batter_summary(std::slice::from_ref(&wide));
    assert_eq!(batters[0].balls_faced, 0);
    assert_eq!(batters[0].strike_rate, None);
    assert_eq!(batters[0].dot_ball_percentage, None);

    let bowlers = bowler_summary(&[wide]);
    assert_eq!(bowlers[0].balls_bowled, 0);
    assert_eq!(bowlers[0].economy_rate, None);
    assert_eq!(bowlers[0].runs_conceded, 1);
}

#[test]
fn milestones_use_inclusive_lower_bounds() {
    let mut deliveries = Vec::new();
    // 100 exactly in m1, 50 exactly in m2, 49 in m3.
    for _ in 0..25 {
        deliveries.push(ball("m1", "a", "x", 4));
    }
    for _ in 0..25 {
        deliveries.push(ball("m2", "a", "x", 2));
    }
    for _ in 0..49 {
        deliveries.push(ball("m3", "a", "x", 1));
    }
    let rows = batter_summary(&deliveries);
    assert_eq!(rows[0].centuries, 1);
    assert_eq!(rows[0].half_centuries, 1);
    assert_eq!(rows[0].highest_score, 100);
    assert_eq!(rows[0].matches_played, 3);

    let mut hauls = Vec::new();
    for i in 0..4 {
        hauls.push(wicket("m1", &format!("p{i}"), "y"));
    }
    for i in 0..5 {
        hauls.push(wicket("m2", &format!("q{i}"), "y"));
    }
    for i in 0..3 {
        hauls.push(wicket("m3", &format!("r{i}"), "y"));
    }
    let rows = bowler_summary(&hauls);
    assert_eq!(rows[0].wickets_taken, 12);
    assert_eq!(rows[0].four_wickets, 1);
    assert_eq!(rows[0].five_wickets, 1);
}

#[test]
fn bowler_who_never_batted_is_absent_from_batter_table() {
    let tables = aggregate(&[ball("m1", "a", "b", 1)]);
    assert_eq!(tables.batters.len(), 1);
    assert_eq!(tables.bowlers.len(), 1);
    assert!(tables.batters.iter().all(|r| r.batter != "b"));
}

#[test]
fn exports_are_byte_identical_across_runs() {
    let deliveries = fixture_deliveries();
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = StatsPaths {
        team_innings: dir.path().join("match_stats.csv"),
        batters: dir.path().join("batter_stats.csv"),
        bowlers: dir.path().join("bowler_stats.csv"),
        workbook: None,
    };

    write_stats(&aggregate(&deliveries), &paths).expect("first write");
    let first: Vec<Vec<u8>> = [&paths.team_innings, &paths.batters, &paths.bowlers]
        .iter()
        .map(|p| fs::read(p).expect("read csv"))
        .collect();

    write_stats(&aggregate(&deliveries), &paths).expect("second write");
    let second: Vec<Vec<u8>> = [&paths.team_innings, &paths.batters, &paths.bowlers]
        .iter()
        .map(|p| fs::read(p).expect("read csv"))
        .collect();

    assert_eq!(first, second);
}

#[test]
fn csv_tables_read_back_unchanged() {
    let tables = aggregate(&fixture_deliveries());
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = StatsPaths {
        team_innings: dir.path().join("match_stats.csv"),
        batters: dir.path().join("batter_stats.csv"),
        bowlers: dir.path().join("bowler_stats.csv"),
        workbook: Some(dir.path().join("stats.xlsx")),
    };

    let report = write_stats(&tables, &paths).expect("write stats");
    assert!(report.workbook_written);
    assert!(dir.path().join("stats.xlsx").is_file());

    let header = fs::read_to_string(&paths.batters).expect("read batters");
    assert!(header.starts_with("batter,matches_played,"));

    let back = read_stats(&paths).expect("read stats");
    assert_eq!(back, tables);
}

#[test]
fn empty_input_writes_header_only_tables() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = StatsPaths {
        team_innings: dir.path().join("match_stats.csv"),
        batters: dir.path().join("batter_stats.csv"),
        bowlers: dir.path().join("bowler_stats.csv"),
        workbook: None,
    };
    write_stats(&aggregate(&[]), &paths).expect("write stats");

    let raw = fs::read_to_string(&paths.bowlers).expect("read bowlers");
    assert_eq!(raw.lines().count(), 1);
    assert!(raw.starts_with("bowler,"));
}
