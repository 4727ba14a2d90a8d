use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::aggregate::{BatterRow, BowlerRow, StatsTables, TeamInningsRow};

#[derive(Debug, Clone)]
pub struct StatsPaths {
    pub team_innings: PathBuf,
    pub batters: PathBuf,
    pub bowlers: PathBuf,
    pub workbook: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsExportReport {
    pub team_innings: usize,
    pub batters: usize,
    pub bowlers: usize,
    pub workbook_written: bool,
}

pub fn write_stats(tables: &StatsTables, paths: &StatsPaths) -> Result<StatsExportReport> {
    write_csv(&paths.team_innings, &tables.team_innings)?;
    write_csv(&paths.batters, &tables.batters)?;
    write_csv(&paths.bowlers, &tables.bowlers)?;

    if let Some(workbook) = paths.workbook.as_deref() {
        write_workbook(workbook, tables)?;
    }

    Ok(StatsExportReport {
        team_innings: tables.team_innings.len(),
        batters: tables.batters.len(),
        bowlers: tables.bowlers.len(),
        workbook_written: paths.workbook.is_some(),
    })
}

/// Column names of a summary table, in serialization order.
pub trait CsvHeader {
    const HEADER: &'static [&'static str];
}

impl CsvHeader for TeamInningsRow {
    const HEADER: &'static [&'static str] = TEAM_INNINGS_HEADER;
}

impl CsvHeader for BatterRow {
    const HEADER: &'static [&'static str] = BATTER_HEADER;
}

impl CsvHeader for BowlerRow {
    const HEADER: &'static [&'static str] = BOWLER_HEADER;
}

/// Writes `rows` with a header row. Missing values become empty cells.
pub fn write_csv<T: Serialize + CsvHeader>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)
            .with_context(|| format!("create csv {}", tmp.display()))?;
        for row in rows {
            writer.serialize(row).context("serialize csv row")?;
        }
        // csv only emits the header with the first record.
        if rows.is_empty() {
            writer
                .write_record(T::HEADER)
                .context("write csv header")?;
        }
        writer.flush().with_context(|| format!("flush {}", tmp.display()))?;
    }
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("open csv {}", path.display()))?;
    let mut out = Vec::new();
    for (idx, record) in reader.deserialize::<T>().enumerate() {
        out.push(record.with_context(|| format!("{} row {}", path.display(), idx + 1))?);
    }
    Ok(out)
}

pub fn read_stats(paths: &StatsPaths) -> Result<StatsTables> {
    Ok(StatsTables {
        team_innings: read_csv(&paths.team_innings)?,
        batters: read_csv(&paths.batters)?,
        bowlers: read_csv(&paths.bowlers)?,
    })
}

const TEAM_INNINGS_HEADER: &[&str] = &[
    "match_id",
    "match_date",
    "city",
    "venue",
    "batting_team",
    "runs",
    "extras",
    "total_score",
    "wickets",
    "boundaries",
    "fours",
    "sixes",
    "balls_faced",
    "overs",
];

const BATTER_HEADER: &[&str] = &[
    "batter",
    "matches_played",
    "innings",
    "total_runs",
    "balls_faced",
    "times_out",
    "fours",
    "sixes",
    "boundaries",
    "dot_balls",
    "batting_average",
    "strike_rate",
    "dot_ball_percentage",
    "highest_score",
    "half_centuries",
    "centuries",
];

const BOWLER_HEADER: &[&str] = &[
    "bowler",
    "matches_played",
    "innings_bowled",
    "balls_bowled",
    "overs_bowled",
    "runs_conceded",
    "extras_conceded",
    "wickets_taken",
    "dot_balls",
    "bowling_average",
    "economy_rate",
    "strike_rate",
    "four_wickets",
    "five_wickets",
];

enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

fn int_cell(v: u32) -> Cell {
    Cell::Number(v as f64)
}

fn opt_number(v: Option<f64>) -> Cell {
    v.map(Cell::Number).unwrap_or(Cell::Empty)
}

fn team_innings_cells(row: &TeamInningsRow) -> Vec<Cell> {
    vec![
        Cell::Text(row.match_id.clone()),
        Cell::Text(row.match_date.clone()),
        row.city.clone().map(Cell::Text).unwrap_or(Cell::Empty),
        Cell::Text(row.venue.clone()),
        Cell::Text(row.batting_team.clone()),
        int_cell(row.runs),
        int_cell(row.extras),
        int_cell(row.total_score),
        int_cell(row.wickets),
        int_cell(row.boundaries),
        int_cell(row.fours),
        int_cell(row.sixes),
        int_cell(row.balls_faced),
        Cell::Number(row.overs),
    ]
}

fn batter_cells(row: &BatterRow) -> Vec<Cell> {
    vec![
        Cell::Text(row.batter.clone()),
        int_cell(row.matches_played),
        int_cell(row.innings),
        int_cell(row.total_runs),
        int_cell(row.balls_faced),
        int_cell(row.times_out),
        int_cell(row.fours),
        int_cell(row.sixes),
        int_cell(row.boundaries),
        int_cell(row.dot_balls),
        opt_number(row.batting_average),
        opt_number(row.strike_rate),
        opt_number(row.dot_ball_percentage),
        int_cell(row.highest_score),
        int_cell(row.half_centuries),
        int_cell(row.centuries),
    ]
}

fn bowler_cells(row: &BowlerRow) -> Vec<Cell> {
    vec![
        Cell::Text(row.bowler.clone()),
        int_cell(row.matches_played),
        int_cell(row.innings_bowled),
        int_cell(row.balls_bowled),
        Cell::Number(row.overs_bowled),
        int_cell(row.runs_conceded),
        int_cell(row.extras_conceded),
        int_cell(row.wickets_taken),
        int_cell(row.dot_balls),
        opt_number(row.bowling_average),
        opt_number(row.economy_rate),
        opt_number(row.strike_rate),
        int_cell(row.four_wickets),
        int_cell(row.five_wickets),
    ]
}

pub fn write_workbook(path: &Path, tables: &StatsTables) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }

    let header_format = Format::new().set_bold();
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("TeamInnings")?;
        let rows: Vec<Vec<Cell>> = tables.team_innings.iter().map(team_innings_cells).collect();
        write_sheet(sheet, TEAM_INNINGS_HEADER, &rows, &header_format)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Batters")?;
        let rows: Vec<Vec<Cell>> = tables.batters.iter().map(batter_cells).collect();
        write_sheet(sheet, BATTER_HEADER, &rows, &header_format)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Bowlers")?;
        let rows: Vec<Vec<Cell>> = tables.bowlers.iter().map(bowler_cells).collect();
        write_sheet(sheet, BOWLER_HEADER, &rows, &header_format)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;
    Ok(())
}

fn write_sheet(
    worksheet: &mut Worksheet,
    header: &[&str],
    rows: &[Vec<Cell>],
    header_format: &Format,
) -> Result<()> {
    for (col_idx, title) in header.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col_idx as u16, *title, header_format)
            .with_context(|| format!("write header cell {col_idx}"))?;
    }
    for (row_idx, row) in rows.iter().enumerate() {
        let sheet_row = row_idx as u32 + 1;
        for (col_idx, cell) in row.iter().enumerate() {
            let col = col_idx as u16;
            let written = match cell {
                Cell::Text(value) => worksheet.write_string(sheet_row, col, value),
                Cell::Number(value) => worksheet.write_number(sheet_row, col, *value),
                Cell::Empty => continue,
            };
            written.with_context(|| format!("write cell ({sheet_row},{col_idx})"))?;
        }
    }
    Ok(())
}
