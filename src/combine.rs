use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CombineSummary {
    pub input_dir: PathBuf,
    pub output: PathBuf,
    pub files: usize,
}

/// Collects every `*.json` file in `dir`, ordered by file name.
pub fn list_match_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read match directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("list {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn read_match_documents(dir: &Path) -> Result<Vec<Value>> {
    let files = list_match_files(dir)?;
    let mut docs = Vec::with_capacity(files.len());
    for path in &files {
        let raw =
            fs::read_to_string(path).with_context(|| format!("read match {}", path.display()))?;
        let doc = serde_json::from_str::<Value>(&raw)
            .with_context(|| format!("invalid match json {}", path.display()))?;
        debug!("combined {}", path.display());
        docs.push(doc);
    }
    Ok(docs)
}

/// Concatenates the per-match documents in `input_dir` into one JSON array at
/// `output`. Any unreadable or malformed file aborts the whole run.
pub fn combine_match_files(input_dir: &Path, output: &Path) -> Result<CombineSummary> {
    let docs = read_match_documents(input_dir)?;
    let files = docs.len();

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&Value::Array(docs)).context("serialize matches")?;
    let tmp = output.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, output).with_context(|| format!("swap {}", output.display()))?;

    Ok(CombineSummary {
        input_dir: input_dir.to_path_buf(),
        output: output.to_path_buf(),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combines_json_files_in_name_order_and_skips_others() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("matches");
        fs::create_dir_all(&input).expect("mkdir");
        fs::write(input.join("b.json"), r#"{"id":2}"#).expect("write b");
        fs::write(input.join("a.json"), r#"{"id":1}"#).expect("write a");
        fs::write(input.join("notes.txt"), "ignore me").expect("write txt");

        let output = dir.path().join("raw_data.json");
        let summary = combine_match_files(&input, &output).expect("combine");
        assert_eq!(summary.files, 2);

        let combined: Value =
            serde_json::from_str(&fs::read_to_string(&output).expect("read")).expect("json");
        let ids: Vec<i64> = combined
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|v| v.get("id").and_then(Value::as_i64))
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn malformed_file_aborts() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("bad.json"), "{not json").expect("write");
        let output = dir.path().join("out").join("raw_data.json");
        let err = combine_match_files(dir.path(), &output).expect_err("should fail");
        assert!(format!("{err:#}").contains("bad.json"));
        assert!(!output.exists());
    }

    #[test]
    fn empty_directory_yields_empty_array() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("raw_data.json");
        let summary = combine_match_files(dir.path(), &output).expect("combine");
        assert_eq!(summary.files, 0);
        assert_eq!(fs::read_to_string(&output).expect("read").trim(), "[]");
    }
}
