use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use env_logger::Builder;

use dslab_faas_tracegen::apps::merge_index_files;
use dslab_faas_tracegen::config::Config;
use dslab_faas_tracegen::error::Result;
use dslab_faas_tracegen::parallel::generate_shards;
use dslab_faas_tracegen::stats::ShardStats;
use dslab_faas_tracegen::trace::{read_function_trace, simulation_end};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// Synthesizes per-function FaaS traces from Azure Functions 2019 statistics
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generates traces for every shard task listed in the config
    Generate {
        /// Path to YAML file with generation config
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Joins per-shard audit indices into one global index
    MergeIndices {
        /// Shard index files in shard order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Path to produced index file
        #[arg(short, long, default_value = "indices.csv")]
        output: PathBuf,
    },
    /// Prints a summary of a generated trace file
    Inspect {
        trace: PathBuf,
    },
}

fn generate(config: PathBuf) -> Result<()> {
    let config = Config::from_yaml(&config)?;
    let stats = generate_shards(&config)?;
    for (shard, s) in stats.iter().enumerate() {
        println!(
            "shard {}: {} units, {} written, {} fit fallbacks, {} missing days",
            shard, s.functions, s.written, s.fit_failures, s.missing_days
        );
    }
    let total: ShardStats = stats.iter().sum();
    println!(
        "total: {} traces written to {}, {} skipped",
        total.written,
        config.output_dir.display(),
        total.skipped()
    );
    Ok(())
}

fn inspect(path: PathBuf) -> Result<()> {
    let trace = read_function_trace(&path)?;
    let invocations: u64 = trace.iter().map(|s| s.invocations).sum();
    let active = trace.iter().filter(|s| s.invocations > 0).count();
    let max_mem = trace.iter().map(|s| s.mem_used).fold(0., f64::max);
    println!("rows: {}", trace.len());
    println!("invocations: {} in {} active minutes", invocations, active);
    if let Some(last) = trace.last() {
        println!("covers: {} ms", last.time);
    }
    if active > 0 {
        let exec: u64 = trace.iter().filter(|s| s.invocations > 0).map(|s| s.exec).sum();
        println!("mean exec time of active minutes: {:.2} ms", exec as f64 / active as f64);
    }
    println!("max memory: {} MB", max_mem);
    match simulation_end(&trace) {
        Some(end) => println!("last invocation ends at {:.3} s", end),
        None => println!("no invocations"),
    }
    Ok(())
}

fn main() {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
    let args = Args::parse();
    let result = match args.command {
        Command::Generate { config } => generate(config),
        Command::MergeIndices { inputs, output } => merge_index_files(&inputs, &output).map(|rows| {
            println!("merged {} applications into {}", rows, output.display());
        }),
        Command::Inspect { trace } => inspect(trace),
    };
    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
