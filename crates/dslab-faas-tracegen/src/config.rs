use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceGenError};
use crate::trace::{Provisioning, DAY_MS};

/// How input rows are turned into traces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceMode {
    /// Every input row (one function, one day) becomes a separate one-day trace.
    Daily,
    /// Rows of the same function are stitched into one trace covering all configured days.
    #[default]
    Continuous,
}

impl TraceMode {
    /// Whether a day whose lognormal fit failed is kept with constant values. Daily traces are dropped instead.
    pub fn keeps_fallback_days(self) -> bool {
        self == TraceMode::Continuous
    }
}

fn default_days() -> usize {
    7
}

fn default_one() -> u64 {
    1
}

/// YAML-serializable config
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub mode: TraceMode,
    #[serde(default = "default_days")]
    pub days: usize,
    #[serde(default)]
    pub provisioning: Provisioning,
    #[serde(default = "default_one")]
    pub random_seed: u64,
    /// Zero means one worker per available core.
    #[serde(default)]
    pub workers: usize,
    /// Shard task files, one worker job per file.
    pub tasks: Vec<PathBuf>,
    /// Application table with `HashApp, Count, popularity` columns.
    pub apps: PathBuf,
    pub output_dir: PathBuf,
    /// Directory for per-shard audit index files, defaults to the parent of `output_dir`.
    #[serde(default)]
    pub index_dir: Option<PathBuf>,
}

/// This is generation config. It implements Default trait so that you can create default config and change only
/// the fields you need.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub mode: TraceMode,
    /// Number of days covered by continuous traces.
    pub days: usize,
    pub provisioning: Provisioning,
    /// Shard `i` is generated with seed `random_seed + i`.
    pub random_seed: u64,
    pub workers: usize,
    pub tasks: Vec<PathBuf>,
    pub apps: PathBuf,
    pub output_dir: PathBuf,
    pub index_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: TraceMode::Continuous,
            days: default_days(),
            provisioning: Default::default(),
            random_seed: 1,
            workers: available_workers(),
            tasks: Vec::new(),
            apps: PathBuf::from("apps.csv"),
            output_dir: PathBuf::from("converted"),
            index_dir: PathBuf::from("."),
        }
    }
}

fn available_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

impl Config {
    pub fn from_raw(raw: RawConfig) -> Result<Self> {
        if raw.days == 0 {
            return Err(TraceGenError::InvalidConfig("days must be positive".to_string()));
        }
        Ok(Self {
            mode: raw.mode,
            days: raw.days,
            provisioning: raw.provisioning,
            random_seed: raw.random_seed,
            workers: if raw.workers == 0 {
                available_workers()
            } else {
                raw.workers
            },
            index_dir: raw.index_dir.unwrap_or_else(|| match raw.output_dir.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            }),
            tasks: raw.tasks,
            apps: raw.apps,
            output_dir: raw.output_dir,
        })
    }

    /// Loads config from a YAML file. Relative paths are resolved against the file's directory.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let f = File::open(path)?;
        let mut raw: RawConfig = serde_yaml::from_reader(f)?;
        if let Some(base) = path.parent() {
            let resolve = |p: &mut PathBuf| {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            };
            raw.tasks.iter_mut().for_each(resolve);
            resolve(&mut raw.apps);
            resolve(&mut raw.output_dir);
            if let Some(dir) = raw.index_dir.as_mut() {
                resolve(dir);
            }
        }
        Self::from_raw(raw)
    }

    /// Number of days covered by each produced trace.
    pub fn trace_days(&self) -> usize {
        match self.mode {
            TraceMode::Daily => 1,
            TraceMode::Continuous => self.days,
        }
    }

    pub fn index_path(&self, shard: usize) -> PathBuf {
        self.index_dir.join(format!("indices{}.csv", shard))
    }

    pub fn duration_ms(&self) -> u64 {
        self.trace_days() as u64 * DAY_MS
    }
}
