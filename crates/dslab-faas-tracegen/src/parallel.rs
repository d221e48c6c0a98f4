//! Utilities for generating multiple shards in parallel.
use std::sync::{mpsc::channel, Arc};

use log::{error, info};
use threadpool::ThreadPool;

use crate::apps::AppTable;
use crate::config::Config;
use crate::error::{Result, TraceGenError};
use crate::generator::generate_shard;
use crate::stats::ShardStats;

/// Runs `job` for every unit in a thread pool with `n_workers` worker threads.
///
/// Results are returned in unit order. The first failed unit aborts the collection and its error is returned;
/// units that are still running are not cancelled and their results are discarded. A unit whose job panics is
/// reported as [`TraceGenError::WorkerFailure`].
pub fn run_on_pool<T, R, F>(units: Vec<T>, n_workers: usize, job: F) -> Result<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(usize, T) -> Result<R> + Send + Sync + 'static,
{
    let len = units.len();
    let job = Arc::new(job);
    let pool = ThreadPool::new(n_workers.max(1));
    let (tx, rx) = channel();
    for (id, unit) in units.into_iter().enumerate() {
        let tx = tx.clone();
        let job = job.clone();
        pool.execute(move || {
            let result = job(id, unit);
            // the receiver is gone if another unit has already failed
            let _ = tx.send((id, result));
        });
    }
    drop(tx);
    let mut results: Vec<Option<R>> = (0..len).map(|_| None).collect();
    // ends once every job has either reported or dropped its sender while panicking
    for (id, result) in rx.iter() {
        match result {
            Ok(value) => results[id] = Some(value),
            Err(e) => {
                error!("unit {} failed: {}", id, e);
                return Err(e);
            }
        }
    }
    results
        .into_iter()
        .enumerate()
        .map(|(id, r)| r.ok_or(TraceGenError::WorkerFailure { shard: id }))
        .collect()
}

/// Generates every shard task of `config` on a worker pool, one job per task file.
pub fn generate_shards(config: &Config) -> Result<Vec<ShardStats>> {
    let apps = Arc::new(AppTable::read(&config.apps)?);
    info!(
        "generating {} shards on {} workers, {} applications",
        config.tasks.len(),
        config.workers,
        apps.records().len()
    );
    let shared = Arc::new(config.clone());
    let stats = run_on_pool(config.tasks.clone(), config.workers, move |shard, task| {
        generate_shard(shard, &task, &apps, &shared)
    })?;
    let total: ShardStats = stats.iter().sum();
    info!(
        "all shards done: {} traces written, {} skipped, {} fit fallbacks",
        total.written,
        total.skipped(),
        total.fit_failures
    );
    Ok(stats)
}
