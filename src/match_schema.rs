//! Serde model of one ball-by-ball match document as published in the
//! cricsheet JSON format. Only the fields the pipeline reads are modelled;
//! everything else in the document is ignored.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct MatchDocument {
    pub info: MatchInfo,
    #[serde(default)]
    pub innings: Vec<Innings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchInfo {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    pub dates: Vec<String>,
    pub teams: Vec<String>,
    // Seasons appear both as `2019` and as `"2019/20"`.
    #[serde(default)]
    pub season: Option<Value>,
    #[serde(default)]
    pub match_type_number: Option<u64>,
    #[serde(default)]
    pub event: Option<MatchEvent>,
    #[serde(default)]
    pub toss: Option<Toss>,
    #[serde(default)]
    pub outcome: Option<Outcome>,
}

impl MatchInfo {
    pub fn season_label(&self) -> Option<String> {
        match self.season.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchEvent {
    #[serde(default)]
    pub match_number: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Toss {
    #[serde(default)]
    pub winner: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Outcome {
    #[serde(default)]
    pub winner: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Innings {
    pub team: String,
    #[serde(default)]
    pub overs: Vec<Over>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Over {
    pub over: u32,
    #[serde(default)]
    pub deliveries: Vec<RawDelivery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDelivery {
    pub batter: String,
    pub bowler: String,
    pub runs: Runs,
    #[serde(default)]
    pub extras: Option<Extras>,
    #[serde(default)]
    pub wickets: Vec<Wicket>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Runs {
    pub batter: u32,
    pub extras: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Extras {
    #[serde(default)]
    pub wides: Option<u32>,
    #[serde(default)]
    pub noballs: Option<u32>,
    #[serde(default)]
    pub byes: Option<u32>,
    #[serde(default)]
    pub legbyes: Option<u32>,
    #[serde(default)]
    pub penalty: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Wicket {
    pub player_out: String,
    pub kind: String,
}
