//! Loading record sets from the files a documentation generator emits.
//!
//! Accepted encodings: a JSON array of records, an object with a `docs`
//! array, the same object behind a JavaScript assignment
//! (`var documenterSearchIndex = {"docs": [...]}`), and JSON Lines.

use crate::record::Record;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Deserialize)]
struct DocsEnvelope {
    docs: Vec<Record>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    List(Vec<Record>),
    Envelope(DocsEnvelope),
}

impl From<Payload> for Vec<Record> {
    fn from(p: Payload) -> Self {
        match p {
            Payload::List(docs) | Payload::Envelope(DocsEnvelope { docs }) => docs,
        }
    }
}

/// Parse a record set from any of the supported encodings.
pub fn parse_records(input: &str) -> Result<Vec<Record>> {
    let start = match input.find(|c: char| c == '[' || c == '{') {
        Some(i) => i,
        None if input.trim().is_empty() => return Ok(Vec::new()),
        None => bail!("no JSON value found in input"),
    };
    let body = input[start..].trim_end().trim_end_matches(';');

    match serde_json::from_str::<Payload>(body) {
        Ok(payload) => Ok(payload.into()),
        Err(whole_err) => parse_json_lines(body).with_context(|| format!("not a record array or object: {whole_err}")),
    }
}

fn parse_json_lines(body: &str) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for (n, line) in body.lines().enumerate() {
        if line.trim().is_empty() { continue; }
        let record: Record = serde_json::from_str(line).with_context(|| format!("line {}", n + 1))?;
        records.push(record);
    }
    Ok(records)
}

pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_records(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Load a single file, or every `.json`/`.jsonl`/`.js` file under a directory
/// in path order.
pub fn load_records_from(path: &Path) -> Result<Vec<Record>> {
    if path.is_file() {
        return load_records(path);
    }
    if !path.is_dir() {
        bail!("input path {} does not exist", path.display());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file())
        .filter(|p| matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl" | "js")))
        .collect();
    files.sort();

    let mut records = Vec::new();
    for file in files {
        let mut batch = load_records(&file)?;
        tracing::debug!(file = %file.display(), records = batch.len(), "loaded records");
        records.append(&mut batch);
    }
    Ok(records)
}

/// Keep the first record for every location. Returns the kept records and the
/// locations of the dropped ones.
pub fn dedup_locations(records: Vec<Record>) -> (Vec<Record>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut dropped = Vec::new();
    let kept = records
        .into_iter()
        .filter(|r| {
            if seen.insert(r.location.clone()) {
                true
            } else {
                dropped.push(r.location.clone());
                false
            }
        })
        .collect();
    (kept, dropped)
}
