use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use parquet::basic::Compression;
use parquet::data_type::{BoolType, ByteArray, ByteArrayType, Int32Type};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::{SerializedColumnWriter, SerializedFileWriter};
use parquet::record::{Field, Row, RowAccessor};
use parquet::schema::parser::parse_message_type;

use crate::delivery::{Delivery, ExtrasKind};

const ROW_GROUP_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Text,
    OptText,
    Int,
    Bool,
}

const COLUMNS: &[(&str, ColumnKind)] = &[
    ("match_id", ColumnKind::Text),
    ("match_date", ColumnKind::Text),
    ("season", ColumnKind::OptText),
    ("venue", ColumnKind::Text),
    ("city", ColumnKind::OptText),
    ("toss_winner", ColumnKind::OptText),
    ("match_winner", ColumnKind::OptText),
    ("batting_team", ColumnKind::Text),
    ("innings", ColumnKind::Int),
    ("over", ColumnKind::Int),
    ("ball", ColumnKind::Int),
    ("batter", ColumnKind::Text),
    ("bowler", ColumnKind::Text),
    ("runs_batter", ColumnKind::Int),
    ("runs_extras", ColumnKind::Int),
    ("runs_total", ColumnKind::Int),
    ("extras_type", ColumnKind::OptText),
    ("is_wide", ColumnKind::Bool),
    ("is_noball", ColumnKind::Bool),
    ("is_legal_delivery", ColumnKind::Bool),
    ("is_wicket", ColumnKind::Bool),
    ("player_out", ColumnKind::OptText),
    ("wicket_type", ColumnKind::OptText),
    ("is_bowler_wicket", ColumnKind::Bool),
    ("is_boundary", ColumnKind::Bool),
    ("is_dot_ball", ColumnKind::Bool),
];

fn schema_message() -> String {
    let mut out = String::from("message delivery {\n");
    for (name, kind) in COLUMNS {
        let line = match kind {
            ColumnKind::Text => format!("  REQUIRED BYTE_ARRAY {name} (UTF8);\n"),
            ColumnKind::OptText => format!("  OPTIONAL BYTE_ARRAY {name} (UTF8);\n"),
            ColumnKind::Int => format!("  REQUIRED INT32 {name};\n"),
            ColumnKind::Bool => format!("  REQUIRED BOOLEAN {name};\n"),
        };
        out.push_str(&line);
    }
    out.push('}');
    out
}

/// Writes the flat delivery table as a single Parquet file, replacing any
/// previous file at `path` only once the new one is complete.
pub fn write_deliveries(path: &Path, rows: &[Delivery]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }

    let schema = Arc::new(parse_message_type(&schema_message()).context("parse delivery schema")?);
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build(),
    );

    let tmp = path.with_extension("parquet.tmp");
    let file = fs::File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
    let mut writer =
        SerializedFileWriter::new(file, schema, props).context("open parquet writer")?;

    for chunk in rows.chunks(ROW_GROUP_SIZE) {
        let mut row_group = writer.next_row_group().context("start row group")?;
        let mut idx = 0usize;
        while let Some(mut column) = row_group.next_column().context("next column")? {
            let (name, _) = COLUMNS
                .get(idx)
                .ok_or_else(|| anyhow!("schema has more columns than expected"))?;
            write_column(&mut column, name, chunk)
                .with_context(|| format!("write column {name}"))?;
            column.close().with_context(|| format!("close column {name}"))?;
            idx += 1;
        }
        row_group.close().context("close row group")?;
    }
    writer.close().context("finish parquet file")?;

    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

fn write_column(column: &mut SerializedColumnWriter<'_>, name: &str, rows: &[Delivery]) -> Result<()> {
    match name {
        "match_id" => write_text(column, rows.iter().map(|d| d.match_id.as_str())),
        "match_date" => write_text(column, rows.iter().map(|d| d.match_date.as_str())),
        "season" => write_opt_text(column, rows.iter().map(|d| d.season.as_deref())),
        "venue" => write_text(column, rows.iter().map(|d| d.venue.as_str())),
        "city" => write_opt_text(column, rows.iter().map(|d| d.city.as_deref())),
        "toss_winner" => write_opt_text(column, rows.iter().map(|d| d.toss_winner.as_deref())),
        "match_winner" => write_opt_text(column, rows.iter().map(|d| d.match_winner.as_deref())),
        "batting_team" => write_text(column, rows.iter().map(|d| d.batting_team.as_str())),
        "innings" => write_int(column, rows.iter().map(|d| d.innings)),
        "over" => write_int(column, rows.iter().map(|d| d.over)),
        "ball" => write_int(column, rows.iter().map(|d| d.ball)),
        "batter" => write_text(column, rows.iter().map(|d| d.batter.as_str())),
        "bowler" => write_text(column, rows.iter().map(|d| d.bowler.as_str())),
        "runs_batter" => write_int(column, rows.iter().map(|d| d.runs_batter)),
        "runs_extras" => write_int(column, rows.iter().map(|d| d.runs_extras)),
        "runs_total" => write_int(column, rows.iter().map(|d| d.runs_total)),
        "extras_type" => write_opt_text(
            column,
            rows.iter().map(|d| d.extras_type.map(ExtrasKind::as_str)),
        ),
        "is_wide" => write_bool(column, rows.iter().map(|d| d.is_wide)),
        "is_noball" => write_bool(column, rows.iter().map(|d| d.is_noball)),
        "is_legal_delivery" => write_bool(column, rows.iter().map(|d| d.is_legal_delivery)),
        "is_wicket" => write_bool(column, rows.iter().map(|d| d.is_wicket)),
        "player_out" => write_opt_text(column, rows.iter().map(|d| d.player_out.as_deref())),
        "wicket_type" => write_opt_text(column, rows.iter().map(|d| d.wicket_type.as_deref())),
        "is_bowler_wicket" => write_bool(column, rows.iter().map(|d| d.is_bowler_wicket)),
        "is_boundary" => write_bool(column, rows.iter().map(|d| d.is_boundary)),
        "is_dot_ball" => write_bool(column, rows.iter().map(|d| d.is_dot_ball)),
        other => Err(anyhow!("no writer for column {other}")),
    }
}

fn write_text<'a>(
    column: &mut SerializedColumnWriter<'_>,
    values: impl Iterator<Item = &'a str>,
) -> Result<()> {
    let values: Vec<ByteArray> = values.map(ByteArray::from).collect();
    column
        .typed::<ByteArrayType>()
        .write_batch(&values, None, None)?;
    Ok(())
}

fn write_opt_text<'a>(
    column: &mut SerializedColumnWriter<'_>,
    values: impl Iterator<Item = Option<&'a str>>,
) -> Result<()> {
    let mut present = Vec::new();
    let mut def_levels = Vec::new();
    for value in values {
        match value {
            Some(s) => {
                present.push(ByteArray::from(s));
                def_levels.push(1i16);
            }
            None => def_levels.push(0i16),
        }
    }
    column
        .typed::<ByteArrayType>()
        .write_batch(&present, Some(&def_levels), None)?;
    Ok(())
}

fn write_int(column: &mut SerializedColumnWriter<'_>, values: impl Iterator<Item = u32>) -> Result<()> {
    let values = values
        .map(|v| i32::try_from(v).map_err(|_| anyhow!("value {v} overflows INT32")))
        .collect::<Result<Vec<i32>>>()?;
    column.typed::<Int32Type>().write_batch(&values, None, None)?;
    Ok(())
}

fn write_bool(column: &mut SerializedColumnWriter<'_>, values: impl Iterator<Item = bool>) -> Result<()> {
    let values: Vec<bool> = values.collect();
    column.typed::<BoolType>().write_batch(&values, None, None)?;
    Ok(())
}

/// Column positions resolved by name from the file's own schema.
struct ColumnIndex(HashMap<String, usize>);

impl ColumnIndex {
    fn get(&self, name: &str) -> Result<usize> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("delivery table is missing column {name}"))
    }
}

pub fn read_deliveries(path: &Path) -> Result<Vec<Delivery>> {
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(file).context("open parquet reader deliveries")?;

    let descr = reader.metadata().file_metadata().schema_descr();
    let by_name: HashMap<String, usize> = descr
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| (col.name().to_string(), idx))
        .collect();
    for (name, _) in COLUMNS {
        if !by_name.contains_key(*name) {
            return Err(anyhow!(
                "delivery table {} is missing column {name}",
                path.display()
            ));
        }
    }
    let cols = ColumnIndex(by_name);

    let iter = reader.get_row_iter(None).context("iterate delivery rows")?;
    let mut out = Vec::new();
    for (row_no, row) in iter.enumerate() {
        let row = row.with_context(|| format!("decode delivery row {row_no}"))?;
        out.push(decode_row(&row, &cols).with_context(|| format!("delivery row {row_no}"))?);
    }
    Ok(out)
}

fn decode_row(row: &Row, cols: &ColumnIndex) -> Result<Delivery> {
    let extras_type = match opt_text(row, cols.get("extras_type")?)? {
        Some(raw) => Some(
            ExtrasKind::parse(&raw).ok_or_else(|| anyhow!("unknown extras type {raw:?}"))?,
        ),
        None => None,
    };

    Ok(Delivery {
        match_id: text(row, cols.get("match_id")?)?,
        match_date: text(row, cols.get("match_date")?)?,
        season: opt_text(row, cols.get("season")?)?,
        venue: text(row, cols.get("venue")?)?,
        city: opt_text(row, cols.get("city")?)?,
        toss_winner: opt_text(row, cols.get("toss_winner")?)?,
        match_winner: opt_text(row, cols.get("match_winner")?)?,
        batting_team: text(row, cols.get("batting_team")?)?,
        innings: int(row, cols.get("innings")?)?,
        over: int(row, cols.get("over")?)?,
        ball: int(row, cols.get("ball")?)?,
        batter: text(row, cols.get("batter")?)?,
        bowler: text(row, cols.get("bowler")?)?,
        runs_batter: int(row, cols.get("runs_batter")?)?,
        runs_extras: int(row, cols.get("runs_extras")?)?,
        runs_total: int(row, cols.get("runs_total")?)?,
        extras_type,
        is_wide: row.get_bool(cols.get("is_wide")?)?,
        is_noball: row.get_bool(cols.get("is_noball")?)?,
        is_legal_delivery: row.get_bool(cols.get("is_legal_delivery")?)?,
        is_wicket: row.get_bool(cols.get("is_wicket")?)?,
        player_out: opt_text(row, cols.get("player_out")?)?,
        wicket_type: opt_text(row, cols.get("wicket_type")?)?,
        is_bowler_wicket: row.get_bool(cols.get("is_bowler_wicket")?)?,
        is_boundary: row.get_bool(cols.get("is_boundary")?)?,
        is_dot_ball: row.get_bool(cols.get("is_dot_ball")?)?,
    })
}

fn text(row: &Row, idx: usize) -> Result<String> {
    Ok(row.get_string(idx)?.clone())
}

fn opt_text(row: &Row, idx: usize) -> Result<Option<String>> {
    match row.get_column_iter().nth(idx).map(|(_, field)| field) {
        Some(Field::Null) | None => Ok(None),
        Some(Field::Str(s)) => Ok(Some(s.clone())),
        Some(other) => Err(anyhow!("expected text at column {idx}, found {other}")),
    }
}

fn int(row: &Row, idx: usize) -> Result<u32> {
    let raw = row.get_int(idx)?;
    u32::try_from(raw).map_err(|_| anyhow!("negative count {raw} at column {idx}"))
}
