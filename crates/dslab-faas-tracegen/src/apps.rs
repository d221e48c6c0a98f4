//! Application table (function counts and popularity) and the per-shard audit index built on top of it.
use std::path::Path;

use csv::{ReaderBuilder, Writer};
use indexmap::IndexMap;
use log::info;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceGenError};

/// One row of the application table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppRecord {
    #[serde(rename = "HashApp")]
    pub app: String,
    /// Number of functions of the application, used to apportion application memory.
    #[serde(rename = "Count")]
    pub count: u64,
    /// Sum of daily invocation counts of all application functions.
    #[serde(default)]
    pub popularity: f64,
}

/// Lookup of application records by application hash.
#[derive(Clone, Debug, Default)]
pub struct AppTable {
    records: Vec<AppRecord>,
    by_app: FxHashMap<String, usize>,
}

impl AppTable {
    pub fn new(records: Vec<AppRecord>) -> Self {
        let by_app = records.iter().enumerate().map(|(i, r)| (r.app.clone(), i)).collect();
        Self { records, by_app }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let mut file = ReaderBuilder::new().from_path(path)?;
        let mut records = Vec::new();
        for rec in file.deserialize() {
            let record: AppRecord = rec?;
            records.push(record);
        }
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[AppRecord] {
        &self.records
    }

    pub fn get(&self, app: &str) -> Option<&AppRecord> {
        self.by_app.get(app).map(|i| &self.records[*i])
    }

    /// Number of functions of `app`. A missing or zero count means the input files are inconsistent.
    pub fn function_count(&self, app: &str) -> Result<u64> {
        match self.get(app) {
            Some(record) if record.count > 0 => Ok(record.count),
            _ => Err(TraceGenError::MissingLookup { app: app.to_string() }),
        }
    }

    /// Applications with popularity in `[low, high]`, in table order.
    pub fn popularity_band(&self, low: f64, high: f64) -> Vec<&AppRecord> {
        self.records
            .iter()
            .filter(|r| r.popularity >= low && r.popularity <= high)
            .collect()
    }

    /// Checks that every application in `apps` has a usable function count.
    pub fn check_apps<'a>(&self, apps: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for app in apps {
            self.function_count(app)?;
        }
        Ok(())
    }
}

/// Serialized form of an audit index row. `indices` holds space-separated trace identifiers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexRow {
    #[serde(rename = "HashApp")]
    pub app: String,
    #[serde(rename = "Count")]
    pub count: u64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub indices: String,
}

impl IndexRow {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.indices.split_whitespace()
    }

    fn key(&self) -> (String, u64, u64) {
        (self.app.clone(), self.count, self.popularity.to_bits())
    }
}

/// Records which trace files each application contributed within one shard.
#[derive(Clone, Debug, Default)]
pub struct AuditIndex {
    entries: IndexMap<String, (AppRecord, Vec<String>)>,
}

impl AuditIndex {
    /// Creates an index with one (initially empty) row per application of the table.
    pub fn new(table: &AppTable) -> Self {
        let entries = table
            .records()
            .iter()
            .map(|r| (r.app.clone(), (r.clone(), Vec::new())))
            .collect();
        Self { entries }
    }

    /// Appends trace `id` to the row of `app`. Unknown applications are ignored.
    pub fn add(&mut self, app: &str, id: &str) {
        if let Some((_, ids)) = self.entries.get_mut(app) {
            ids.push(id.to_string());
        }
    }

    pub fn ids(&self, app: &str) -> &[String] {
        self.entries.get(app).map(|(_, ids)| ids.as_slice()).unwrap_or_default()
    }

    pub fn rows(&self) -> Vec<IndexRow> {
        self.entries
            .values()
            .map(|(record, ids)| IndexRow {
                app: record.app.clone(),
                count: record.count,
                popularity: record.popularity,
                indices: ids.join(" "),
            })
            .collect()
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_index(path, &self.rows())
    }
}

pub fn read_index(path: &Path) -> Result<Vec<IndexRow>> {
    let mut file = ReaderBuilder::new().from_path(path)?;
    let mut rows = Vec::new();
    for rec in file.deserialize() {
        let row: IndexRow = rec?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn write_index(path: &Path, rows: &[IndexRow]) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    if rows.is_empty() {
        writer.write_record(["HashApp", "Count", "popularity", "indices"])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Inner join of shard indices on (HashApp, Count, popularity).
///
/// Rows keep the order of the first shard; identifiers are concatenated in shard order.
pub fn merge_indices(shards: &[Vec<IndexRow>]) -> Vec<IndexRow> {
    let Some((first, rest)) = shards.split_first() else {
        return Vec::new();
    };
    let mut merged: IndexMap<(String, u64, u64), IndexRow> = IndexMap::new();
    for row in first {
        merged.entry(row.key()).or_insert_with(|| row.clone());
    }
    for shard in rest {
        let lookup: FxHashMap<_, &IndexRow> = shard.iter().map(|r| (r.key(), r)).collect();
        merged.retain(|key, row| match lookup.get(key) {
            Some(other) => {
                let joined = row.ids().chain(other.ids()).collect::<Vec<_>>().join(" ");
                row.indices = joined;
                true
            }
            None => false,
        });
    }
    merged.into_values().collect()
}

/// Merges shard index files into one global index written to `output`. Returns the number of merged rows.
pub fn merge_index_files<P: AsRef<Path>>(inputs: &[P], output: &Path) -> Result<usize> {
    let mut shards = Vec::with_capacity(inputs.len());
    for path in inputs {
        shards.push(read_index(path.as_ref())?);
    }
    let merged = merge_indices(&shards);
    write_index(output, &merged)?;
    info!(
        "merged {} index files into {} ({} applications)",
        inputs.len(),
        output.display(),
        merged.len()
    );
    Ok(merged.len())
}
