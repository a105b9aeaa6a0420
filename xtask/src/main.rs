use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "blockq workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the queue benchmarks and write a comparison report
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,

        /// Where to write the markdown report
        #[arg(long, default_value = "benchmark_results/report.md")]
        output: PathBuf,
    },
    /// Run the loom model-checking tests
    Loom,
}

const BENCH: &str = "queue_benchmark";
const BASELINE: &str = "std_mutex_vec_deque";

/// The parts of criterion's `benchmark.json` the report needs.
#[derive(Debug, Deserialize)]
struct BenchmarkId {
    group_id: String,
    function_id: Option<String>,
    /// Only the `Elements` variant is used.
    throughput: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Estimates {
    mean: Estimate,
}

#[derive(Debug, Deserialize)]
struct Estimate {
    point_estimate: f64,
}

/// group -> contender -> operations per second
type Results = BTreeMap<String, BTreeMap<String, f64>>;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench {
            quick,
            report_only,
            output,
        } => {
            if !report_only {
                run_benchmarks(quick)?;
            }
            generate_report(&output)?;
        }
        Commands::Loom => run_loom()?,
    }

    Ok(())
}

fn run_benchmarks(quick: bool) -> Result<()> {
    println!("Running queue benchmarks...");
    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.env("CARGO_INCREMENTAL", "0")
        .args(["bench", "--bench", BENCH]);

    // Args for the test runner (Criterion) go after --
    cmd.arg("--");
    if quick {
        cmd.args(["--measurement-time", "0.5", "--sample-size", "10", "--noplot"]);
    }

    let status = cmd.status().context("failed to spawn cargo bench")?;
    if !status.success() {
        anyhow::bail!("cargo bench exited with {status}");
    }

    println!("Benchmarks finished in {:.2?}", start.elapsed());
    Ok(())
}

fn run_loom() -> Result<()> {
    let status = Command::new("cargo")
        .env("RUSTFLAGS", "--cfg loom")
        .args(["test", "--release", "--test", "loom_queues"])
        .status()
        .context("failed to spawn cargo test")?;
    if !status.success() {
        anyhow::bail!("loom tests failed: {status}");
    }
    Ok(())
}

fn generate_report(report_path: &Path) -> Result<()> {
    println!("\n>>> Generating Report...");

    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }

    let mut results = Results::new();
    collect_results(criterion_dir, &mut results)?;

    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(report_path)
        .with_context(|| format!("failed to create {}", report_path.display()))?;

    writeln!(file, "# Queue Benchmark Report")?;
    writeln!(file)?;
    writeln!(file, "Throughput in items per second; ratios are against `{BASELINE}`.")?;

    for (group, contenders) in &results {
        writeln!(file)?;
        writeln!(file, "## {group}")?;
        writeln!(file)?;
        writeln!(file, "| Queue | Ops/s | vs {BASELINE} |")?;
        writeln!(file, "|---|---|---|")?;

        let baseline = contenders.get(BASELINE).copied().unwrap_or(0.0);
        for (name, ops) in contenders {
            let rel = if baseline > 0.0 { ops / baseline } else { 0.0 };
            writeln!(file, "| {name} | {} | **{rel:.2}x** |", format_ops(*ops))?;
        }
    }

    println!("Report written to {}", report_path.display());
    Ok(())
}

fn format_ops(ops: f64) -> String {
    if ops > 1_000_000.0 {
        format!("{:.2}M", ops / 1_000_000.0)
    } else if ops > 1_000.0 {
        format!("{:.2}K", ops / 1_000.0)
    } else {
        format!("{ops:.0}")
    }
}

/// Walks criterion's output tree and picks up every `new/` measurement.
fn collect_results(dir: &Path, results: &mut Results) -> Result<()> {
    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        // Skip the HTML report tree.
        if path.file_name().is_some_and(|name| name == "report") {
            continue;
        }
        if path.file_name().is_some_and(|name| name == "new") {
            if let Some((group, contender, ops)) = read_measurement(&path)? {
                results.entry(group).or_default().insert(contender, ops);
            }
            continue;
        }
        collect_results(&path, results)?;
    }
    Ok(())
}

fn read_measurement(dir: &Path) -> Result<Option<(String, String, f64)>> {
    let id_path = dir.join("benchmark.json");
    let estimates_path = dir.join("estimates.json");
    if !id_path.exists() || !estimates_path.exists() {
        return Ok(None);
    }

    let id: BenchmarkId = serde_json::from_str(&fs::read_to_string(&id_path)?)
        .with_context(|| format!("malformed {}", id_path.display()))?;
    let estimates: Estimates = serde_json::from_str(&fs::read_to_string(&estimates_path)?)
        .with_context(|| format!("malformed {}", estimates_path.display()))?;

    let time_ns = estimates.mean.point_estimate;
    if time_ns <= 0.0 {
        return Ok(None);
    }

    let elements = id
        .throughput
        .as_ref()
        .and_then(|t| t.get("Elements"))
        .and_then(serde_json::Value::as_f64)
        .unwrap_or(1.0);
    let contender = id.function_id.unwrap_or_else(|| id.group_id.clone());
    Ok(Some((id.group_id, contender, elements * 1e9 / time_ns)))
}
