use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use log::{info, warn};
use rayon::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::{MatchKey, NormalizeConfig};
use crate::delivery::{Delivery, ExtrasKind, is_boundary_runs};
use crate::delivery_store;
use crate::match_schema::{MatchDocument, MatchInfo};

const UNKNOWN_VENUE: &str = "unknown";
const MATCH_KEY_HEX_LEN: usize = 12;

#[derive(Debug, Clone)]
pub struct FlattenedMatch {
    pub match_id: String,
    pub deliveries: Vec<Delivery>,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeSummary {
    pub output: Option<PathBuf>,
    pub matches_total: usize,
    pub matches_succeeded: usize,
    pub deliveries: usize,
    pub duplicate_match_ids: Vec<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    pub deliveries: Vec<Delivery>,
    pub summary: NormalizeSummary,
}

pub fn match_id(info: &MatchInfo, key: MatchKey) -> Result<String> {
    let date = first_date(info)?;
    let first_team = info
        .teams
        .first()
        .ok_or_else(|| anyhow!("match on {date} lists no teams"))?;

    match key {
        MatchKey::Legacy => Ok(format!("{date}-{first_team}")),
        MatchKey::Hashed => {
            let mut hasher = Sha256::new();
            hasher.update(date.as_bytes());
            for team in &info.teams {
                hasher.update([0x1f]);
                hasher.update(team.as_bytes());
            }
            hasher.update([0x1e]);
            hasher.update(info.venue.as_deref().unwrap_or_default().as_bytes());
            hasher.update([0x1e]);
            hasher.update(info.city.as_deref().unwrap_or_default().as_bytes());
            hasher.update([0x1e]);
            if let Some(number) = info.match_type_number {
                hasher.update(number.to_string().as_bytes());
            }
            if let Some(event_number) = info.event.as_ref().and_then(|e| e.match_number.as_ref())
            {
                hasher.update([0x1f]);
                hasher.update(event_number.to_string().as_bytes());
            }
            let digest = hasher.finalize();
            let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
            Ok(format!("{date}-{}", &hex[..MATCH_KEY_HEX_LEN]))
        }
    }
}

fn first_date(info: &MatchInfo) -> Result<&str> {
    let date = info
        .dates
        .first()
        .map(|d| d.trim())
        .ok_or_else(|| anyhow!("match lists no dates"))?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("invalid match date {date:?}"))?;
    Ok(date)
}

/// Explodes one match into a row per delivery, carrying match, innings and
/// over fields down to every row.
pub fn flatten_match(doc: &MatchDocument, cfg: &NormalizeConfig) -> Result<FlattenedMatch> {
    let info = &doc.info;
    let match_id = match_id(info, cfg.match_key)?;
    let match_date = first_date(info)?.to_string();
    let season = info.season_label();
    let venue = info
        .venue
        .clone()
        .unwrap_or_else(|| UNKNOWN_VENUE.to_string());
    let city = info.city.clone();
    let toss_winner = info.toss.as_ref().and_then(|t| t.winner.clone());
    let match_winner = info.outcome.as_ref().and_then(|o| o.winner.clone());

    let mut deliveries = Vec::new();
    for (innings_idx, innings) in doc.innings.iter().enumerate() {
        let innings_no = innings_idx as u32 + 1;
        for over in &innings.overs {
            for (ball_idx, raw) in over.deliveries.iter().enumerate() {
                let runs = raw.runs;
                if runs.batter.checked_add(runs.extras) != Some(runs.total) {
                    return Err(anyhow!(
                        "innings {innings_no} over {} ball {}: runs total {} != batter {} + extras {}",
                        over.over,
                        ball_idx + 1,
                        runs.total,
                        runs.batter,
                        runs.extras
                    ));
                }

                let extras_type = raw.extras.as_ref().map(ExtrasKind::classify);
                let is_wide = extras_type == Some(ExtrasKind::Wides);
                let is_noball = extras_type == Some(ExtrasKind::Noballs);
                let wicket = raw.wickets.first();
                let is_bowler_wicket =
                    wicket.is_some_and(|w| cfg.wicket_credit.credits(&w.kind));

                deliveries.push(Delivery {
                    match_id: match_id.clone(),
                    match_date: match_date.clone(),
                    season: season.clone(),
                    venue: venue.clone(),
                    city: city.clone(),
                    toss_winner: toss_winner.clone(),
                    match_winner: match_winner.clone(),
                    batting_team: innings.team.clone(),
                    innings: innings_no,
                    over: over.over + 1,
                    ball: ball_idx as u32 + 1,
                    batter: raw.batter.clone(),
                    bowler: raw.bowler.clone(),
                    runs_batter: runs.batter,
                    runs_extras: runs.extras,
                    runs_total: runs.total,
                    extras_type,
                    is_wide,
                    is_noball,
                    is_legal_delivery: !extras_type.is_some_and(ExtrasKind::is_illegal),
                    is_wicket: wicket.is_some(),
                    player_out: wicket.map(|w| w.player_out.clone()),
                    wicket_type: wicket.map(|w| w.kind.clone()),
                    is_bowler_wicket,
                    is_boundary: is_boundary_runs(runs.batter),
                    is_dot_ball: runs.total == 0,
                });
            }
        }
    }

    Ok(FlattenedMatch {
        match_id,
        deliveries,
    })
}

pub fn flatten_value(value: &Value, cfg: &NormalizeConfig) -> Result<FlattenedMatch> {
    let doc = MatchDocument::deserialize(value).context("match document does not fit schema")?;
    flatten_match(&doc, cfg)
}

/// Flattens every match. A match that fails is logged with its label and
/// skipped; the rest of the batch continues.
pub fn normalize_matches(docs: &[Value], cfg: &NormalizeConfig) -> NormalizedTable {
    let results: Vec<Result<FlattenedMatch>> = docs
        .par_iter()
        .map(|doc| flatten_value(doc, cfg))
        .collect();

    let mut summary = NormalizeSummary {
        matches_total: docs.len(),
        ..NormalizeSummary::default()
    };
    let mut seen_ids: HashMap<String, usize> = HashMap::new();
    let mut deliveries = Vec::new();

    for (idx, result) in results.into_iter().enumerate() {
        match result {
            Ok(flat) => {
                if let Some(first_idx) = seen_ids.get(&flat.match_id) {
                    warn!(
                        "match id {} collides: documents {} and {} map to the same key",
                        flat.match_id, first_idx, idx
                    );
                    summary.duplicate_match_ids.push(flat.match_id.clone());
                } else {
                    seen_ids.insert(flat.match_id.clone(), idx);
                }
                summary.matches_succeeded += 1;
                deliveries.extend(flat.deliveries);
            }
            Err(err) => {
                let label = match_label(&docs[idx]);
                warn!("error processing match {label}: {err:#}");
                summary.errors.push(format!("match {label}: {err:#}"));
            }
        }
    }

    deliveries.sort_by(|a, b| {
        a.match_date
            .cmp(&b.match_date)
            .then_with(|| a.match_id.cmp(&b.match_id))
            .then(a.innings.cmp(&b.innings))
            .then(a.over.cmp(&b.over))
            .then(a.ball.cmp(&b.ball))
    });
    summary.deliveries = deliveries.len();

    NormalizedTable {
        deliveries,
        summary,
    }
}

fn match_label(doc: &Value) -> String {
    let date = doc
        .pointer("/info/dates/0")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let teams = doc
        .pointer("/info/teams")
        .and_then(Value::as_array)
        .map(|teams| {
            teams
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" v ")
        })
        .unwrap_or_default();
    if teams.is_empty() {
        date.to_string()
    } else {
        format!("{date} ({teams})")
    }
}

pub fn read_combined_matches(path: &Path) -> Result<Vec<Value>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read combined {}", path.display()))?;
    let value = serde_json::from_str::<Value>(&raw)
        .with_context(|| format!("invalid combined json {}", path.display()))?;
    match value {
        Value::Array(docs) => Ok(docs),
        _ => Err(anyhow!(
            "combined match file {} is not a JSON array",
            path.display()
        )),
    }
}

pub fn normalize_file(input: &Path, output: &Path, cfg: &NormalizeConfig) -> Result<NormalizeSummary> {
    let docs = read_combined_matches(input)?;
    let table = normalize_matches(&docs, cfg);
    delivery_store::write_deliveries(output, &table.deliveries)?;

    let mut summary = table.summary;
    summary.output = Some(output.to_path_buf());
    info!(
        "normalized {}/{} matches into {} deliveries",
        summary.matches_succeeded, summary.matches_total, summary.deliveries
    );
    Ok(summary)
}
