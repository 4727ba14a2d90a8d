use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::delivery::Delivery;

const BALLS_PER_OVER: f64 = 6.0;
const HALF_CENTURY: u32 = 50;
const CENTURY: u32 = 100;
const FOUR_WICKETS: u32 = 4;
const FIVE_WICKETS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInningsRow {
    pub match_id: String,
    pub match_date: String,
    pub city: Option<String>,
    pub venue: String,
    pub batting_team: String,
    pub runs: u32,
    pub extras: u32,
    pub total_score: u32,
    pub wickets: u32,
    pub boundaries: u32,
    pub fours: u32,
    pub sixes: u32,
    pub balls_faced: u32,
    pub overs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatterRow {
    pub batter: String,
    pub matches_played: u32,
    pub innings: u32,
    pub total_runs: u32,
    pub balls_faced: u32,
    pub times_out: u32,
    pub fours: u32,
    pub sixes: u32,
    pub boundaries: u32,
    pub dot_balls: u32,
    pub batting_average: Option<f64>,
    pub strike_rate: Option<f64>,
    pub dot_ball_percentage: Option<f64>,
    pub highest_score: u32,
    pub half_centuries: u32,
    pub centuries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowlerRow {
    pub bowler: String,
    pub matches_played: u32,
    pub innings_bowled: u32,
    pub balls_bowled: u32,
    pub overs_bowled: f64,
    pub runs_conceded: u32,
    pub extras_conceded: u32,
    pub wickets_taken: u32,
    pub dot_balls: u32,
    pub bowling_average: Option<f64>,
    pub economy_rate: Option<f64>,
    pub strike_rate: Option<f64>,
    pub four_wickets: u32,
    pub five_wickets: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsTables {
    pub team_innings: Vec<TeamInningsRow>,
    pub batters: Vec<BatterRow>,
    pub bowlers: Vec<BowlerRow>,
}

pub fn aggregate(deliveries: &[Delivery]) -> StatsTables {
    StatsTables {
        team_innings: team_innings_summary(deliveries),
        batters: batter_summary(deliveries),
        bowlers: bowler_summary(deliveries),
    }
}

/// `num / den`, or `None` when the denominator is zero or the result is not
/// finite.
pub fn ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 {
        return None;
    }
    let value = num / den;
    value.is_finite().then_some(value)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

pub fn overs_from_balls(balls: u32) -> f64 {
    round_to(balls as f64 / BALLS_PER_OVER, 1)
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct InningsKey<'a> {
    match_date: &'a str,
    match_id: &'a str,
    batting_team: &'a str,
    venue: &'a str,
    city: Option<&'a str>,
}

pub fn team_innings_summary(deliveries: &[Delivery]) -> Vec<TeamInningsRow> {
    let mut groups: BTreeMap<InningsKey<'_>, TeamInningsRow> = BTreeMap::new();

    for d in deliveries {
        let key = InningsKey {
            match_date: &d.match_date,
            match_id: &d.match_id,
            batting_team: &d.batting_team,
            venue: &d.venue,
            city: d.city.as_deref(),
        };
        let row = groups.entry(key).or_insert_with(|| TeamInningsRow {
            match_id: d.match_id.clone(),
            match_date: d.match_date.clone(),
            city: d.city.clone(),
            venue: d.venue.clone(),
            batting_team: d.batting_team.clone(),
            runs: 0,
            extras: 0,
            total_score: 0,
            wickets: 0,
            boundaries: 0,
            fours: 0,
            sixes: 0,
            balls_faced: 0,
            overs: 0.0,
        });

        row.runs += d.runs_batter;
        row.extras += d.runs_extras;
        row.wickets += u32::from(d.player_out.is_some());
        row.boundaries += u32::from(d.is_boundary);
        row.fours += u32::from(d.is_four());
        row.sixes += u32::from(d.is_six());
        row.balls_faced += u32::from(d.is_legal_delivery);
    }

    groups
        .into_values()
        .map(|mut row| {
            row.total_score = row.runs + row.extras;
            row.overs = overs_from_balls(row.balls_faced);
            row
        })
        .collect()
}

#[derive(Default)]
struct BatterAcc<'a> {
    matches: BTreeSet<&'a str>,
    runs_by_match: HashMap<&'a str, u32>,
    total_runs: u32,
    balls_faced: u32,
    fours: u32,
    sixes: u32,
    boundaries: u32,
    dot_balls: u32,
}

pub fn batter_summary(deliveries: &[Delivery]) -> Vec<BatterRow> {
    let mut accs: HashMap<&str, BatterAcc<'_>> = HashMap::new();
    // A dismissal belongs to the player given out, which is not always the striker.
    let mut dismissals: HashMap<&str, u32> = HashMap::new();

    for d in deliveries {
        let acc = accs.entry(d.batter.as_str()).or_default();
        acc.matches.insert(&d.match_id);
        *acc.runs_by_match.entry(&d.match_id).or_insert(0) += d.runs_batter;
        acc.total_runs += d.runs_batter;
        acc.balls_faced += u32::from(d.is_legal_delivery);
        acc.fours += u32::from(d.is_four());
        acc.sixes += u32::from(d.is_six());
        acc.boundaries += u32::from(d.is_boundary);
        acc.dot_balls += u32::from(d.is_dot_ball);

        if let Some(out) = d.player_out.as_deref() {
            *dismissals.entry(out).or_insert(0) += 1;
        }
    }

    let mut rows: Vec<BatterRow> = accs
        .into_iter()
        .map(|(batter, acc)| {
            let times_out = dismissals.get(batter).copied().unwrap_or(0);
            let highest_score = acc.runs_by_match.values().copied().max().unwrap_or(0);
            let half_centuries = acc
                .runs_by_match
                .values()
                .filter(|s| (HALF_CENTURY..CENTURY).contains(*s))
                .count() as u32;
            let centuries = acc
                .runs_by_match
                .values()
                .filter(|s| **s >= CENTURY)
                .count() as u32;
            let runs = acc.total_runs as f64;
            let balls = acc.balls_faced as f64;

            BatterRow {
                batter: batter.to_string(),
                matches_played: acc.matches.len() as u32,
                innings: acc.matches.len() as u32,
                total_runs: acc.total_runs,
                balls_faced: acc.balls_faced,
                times_out,
                fours: acc.fours,
                sixes: acc.sixes,
                boundaries: acc.boundaries,
                dot_balls: acc.dot_balls,
                batting_average: ratio(runs, times_out as f64).map(|v| round_to(v, 2)),
                strike_rate: ratio(runs * 100.0, balls).map(|v| round_to(v, 2)),
                dot_ball_percentage: ratio(acc.dot_balls as f64 * 100.0, balls)
                    .map(|v| round_to(v, 2)),
                highest_score,
                half_centuries,
                centuries,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_runs
            .cmp(&a.total_runs)
            .then_with(|| a.batter.cmp(&b.batter))
    });
    rows
}

#[derive(Default)]
struct BowlerAcc<'a> {
    matches: BTreeSet<&'a str>,
    wickets_by_match: HashMap<&'a str, u32>,
    balls_bowled: u32,
    runs_conceded: u32,
    extras_conceded: u32,
    wickets_taken: u32,
    dot_balls: u32,
}

pub fn bowler_summary(deliveries: &[Delivery]) -> Vec<BowlerRow> {
    let mut accs: HashMap<&str, BowlerAcc<'_>> = HashMap::new();

    for d in deliveries {
        let acc = accs.entry(d.bowler.as_str()).or_default();
        acc.matches.insert(&d.match_id);
        acc.balls_bowled += u32::from(d.is_legal_delivery);
        acc.runs_conceded += d.runs_total;
        acc.extras_conceded += d.runs_extras;
        acc.dot_balls += u32::from(d.is_dot_ball);
        if d.is_bowler_wicket {
            acc.wickets_taken += 1;
            *acc.wickets_by_match.entry(&d.match_id).or_insert(0) += 1;
        }
    }

    let mut rows: Vec<BowlerRow> = accs
        .into_iter()
        .map(|(bowler, acc)| {
            let runs = acc.runs_conceded as f64;
            let balls = acc.balls_bowled as f64;
            let wickets = acc.wickets_taken as f64;
            let four_wickets = acc
                .wickets_by_match
                .values()
                .filter(|w| (FOUR_WICKETS..FIVE_WICKETS).contains(*w))
                .count() as u32;
            let five_wickets = acc
                .wickets_by_match
                .values()
                .filter(|w| **w >= FIVE_WICKETS)
                .count() as u32;

            BowlerRow {
                bowler: bowler.to_string(),
                matches_played: acc.matches.len() as u32,
                innings_bowled: acc.matches.len() as u32,
                balls_bowled: acc.balls_bowled,
                overs_bowled: overs_from_balls(acc.balls_bowled),
                runs_conceded: acc.runs_conceded,
                extras_conceded: acc.extras_conceded,
                wickets_taken: acc.wickets_taken,
                dot_balls: acc.dot_balls,
                bowling_average: ratio(runs, wickets).map(|v| round_to(v, 2)),
                economy_rate: ratio(runs, balls / BALLS_PER_OVER).map(|v| round_to(v, 2)),
                strike_rate: ratio(balls, wickets).map(|v| round_to(v, 2)),
                four_wickets,
                five_wickets,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.wickets_taken
            .cmp(&a.wickets_taken)
            .then_with(|| a.bowler.cmp(&b.bowler))
    });
    rows
}
