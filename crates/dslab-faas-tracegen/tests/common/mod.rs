#![allow(dead_code)]
use std::path::Path;

use csv::Writer;

use dslab_faas_tracegen::apps::{AppRecord, AppTable};
use dslab_faas_tracegen::azure::{DurationStats, FunctionRecord, MemoryStats, Trigger};
use dslab_faas_tracegen::trace::MINUTES_PER_DAY;

pub fn assert_float_eq(x: f64, y: f64, eps: f64) {
    assert!(x > y - eps && x < y + eps);
}

/// Http function of `app` observed on `day` with one invocation every tenth minute,
/// exec (min 5, max 50, mean 20, n 1000) and memory (pct1 64, pct100 256, mean 128, n 1000).
pub fn function_record(app: &str, function: &str, day: usize) -> FunctionRecord {
    FunctionRecord {
        owner: "owner".to_string(),
        app: app.to_string(),
        function: function.to_string(),
        trigger: Trigger::Http,
        invocations: (0..MINUTES_PER_DAY).map(|i| u64::from(i % 10 == 0)).collect(),
        duration: DurationStats {
            average: 20.,
            count: 1000.,
            minimum: 5.,
            maximum: 50.,
            percentiles: [5., 6., 12., 18., 25., 45., 50.],
        },
        memory: MemoryStats {
            sample_count: 1000.,
            average: 128.,
            percentiles: [64., 70., 100., 125., 150., 200., 240., 256.],
        },
        day,
        id: function.to_string(),
    }
}

pub fn app_table(apps: &[(&str, u64)]) -> AppTable {
    AppTable::new(
        apps.iter()
            .map(|(app, count)| AppRecord {
                app: app.to_string(),
                count: *count,
                popularity: 10.,
            })
            .collect(),
    )
}

pub fn write_apps(path: &Path, apps: &[(&str, u64)]) {
    let mut writer = Writer::from_path(path).unwrap();
    writer.write_record(["HashApp", "Count", "popularity"]).unwrap();
    for (app, count) in apps {
        writer.write_record([app.to_string(), count.to_string(), "10".to_string()]).unwrap();
    }
    writer.flush().unwrap();
}

fn task_header() -> Vec<String> {
    let mut header: Vec<String> = ["HashOwner", "HashApp", "HashFunction", "Trigger"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend((1..=MINUTES_PER_DAY).map(|m| m.to_string()));
    header.extend(["Average", "Count", "Minimum", "Maximum"].iter().map(|s| s.to_string()));
    for p in [0, 1, 25, 50, 75, 99, 100] {
        header.push(format!("percentile_Average_{}", p));
    }
    header.push("SampleCount".to_string());
    header.push("AverageAllocatedMb".to_string());
    for p in [1, 5, 25, 50, 75, 95, 99, 100] {
        header.push(format!("AverageAllocatedMb_pct{}", p));
    }
    header.push("Day".to_string());
    header.push("id".to_string());
    header
}

fn task_row(r: &FunctionRecord) -> Vec<String> {
    let trigger = match &r.trigger {
        Trigger::Timer => "timer".to_string(),
        Trigger::Http => "http".to_string(),
        Trigger::Others(s) => s.clone(),
        other => format!("{:?}", other).to_lowercase(),
    };
    let mut row = vec![r.owner.clone(), r.app.clone(), r.function.clone(), trigger];
    row.extend(r.invocations.iter().map(|x| x.to_string()));
    for x in [r.duration.average, r.duration.count, r.duration.minimum, r.duration.maximum] {
        row.push(x.to_string());
    }
    row.extend(r.duration.percentiles.iter().map(|x| x.to_string()));
    row.push(r.memory.sample_count.to_string());
    row.push(r.memory.average.to_string());
    row.extend(r.memory.percentiles.iter().map(|x| x.to_string()));
    row.push(r.day.to_string());
    row.push(r.id.clone());
    row
}

/// Writes rows in the merged task layout with trailing `Day` and `id` columns.
pub fn write_task(path: &Path, records: &[FunctionRecord]) {
    let mut writer = Writer::from_path(path).unwrap();
    writer.write_record(task_header()).unwrap();
    for r in records {
        writer.write_record(task_row(r)).unwrap();
    }
    writer.flush().unwrap();
}
