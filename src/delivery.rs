use serde::{Deserialize, Serialize};

use crate::match_schema::Extras;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtrasKind {
    Wides,
    Noballs,
    Byes,
    Legbyes,
    Penalty,
}

impl ExtrasKind {
    /// First matching sub-field wins: wides, noballs, byes, legbyes, else penalty.
    pub fn classify(extras: &Extras) -> Self {
        if extras.wides.is_some() {
            ExtrasKind::Wides
        } else if extras.noballs.is_some() {
            ExtrasKind::Noballs
        } else if extras.byes.is_some() {
            ExtrasKind::Byes
        } else if extras.legbyes.is_some() {
            ExtrasKind::Legbyes
        } else {
            ExtrasKind::Penalty
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExtrasKind::Wides => "wides",
            ExtrasKind::Noballs => "noballs",
            ExtrasKind::Byes => "byes",
            ExtrasKind::Legbyes => "legbyes",
            ExtrasKind::Penalty => "penalty",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "wides" => Some(ExtrasKind::Wides),
            "noballs" => Some(ExtrasKind::Noballs),
            "byes" => Some(ExtrasKind::Byes),
            "legbyes" => Some(ExtrasKind::Legbyes),
            "penalty" => Some(ExtrasKind::Penalty),
            _ => None,
        }
    }

    pub fn is_illegal(self) -> bool {
        matches!(self, ExtrasKind::Wides | ExtrasKind::Noballs)
    }
}

/// One ball bowled. Every summary and the matchup graph are derived from a
/// slice of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub match_id: String,
    pub match_date: String,
    pub season: Option<String>,
    pub venue: String,
    pub city: Option<String>,
    pub toss_winner: Option<String>,
    pub match_winner: Option<String>,
    pub batting_team: String,
    pub innings: u32,
    /// 1-based; the source format counts overs from zero.
    pub over: u32,
    pub ball: u32,
    pub batter: String,
    pub bowler: String,
    pub runs_batter: u32,
    pub runs_extras: u32,
    pub runs_total: u32,
    pub extras_type: Option<ExtrasKind>,
    pub is_wide: bool,
    pub is_noball: bool,
    pub is_legal_delivery: bool,
    pub is_wicket: bool,
    pub player_out: Option<String>,
    pub wicket_type: Option<String>,
    pub is_bowler_wicket: bool,
    pub is_boundary: bool,
    pub is_dot_ball: bool,
}

impl Delivery {
    pub fn is_four(&self) -> bool {
        self.runs_batter == 4
    }

    pub fn is_six(&self) -> bool {
        self.runs_batter == 6
    }

    pub fn dismissed(&self, player: &str) -> bool {
        self.is_wicket && self.player_out.as_deref() == Some(player)
    }
}

pub fn is_boundary_runs(runs_batter: u32) -> bool {
    runs_batter == 4 || runs_batter == 6
}
