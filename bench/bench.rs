//! Benchmark flowproc processors on synthetic flows.
//!
//! Usage:
//!   cargo run --release --bin bench_flowproc                 # processors + audit
//!   cargo run --release --bin bench_flowproc -- processors   # per-processor timings only
//!   cargo run --release --bin bench_flowproc -- audit        # full audit over a generated corpus

use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Value as Json};

use flowproc::audit::AuditPlan;
use flowproc::cli::Args as CliArgs;
use flowproc::config::{parse_config, ResolvedConfig};
use flowproc::flow::document::{self, Format};
use flowproc::flow::Flow;
use flowproc::fs::discover_files;
use flowproc::processor::registry::ProcessorRegistry;

// --- CLI ---

#[derive(Parser)]
#[command(about = "Benchmark flowproc on generated flows. Writes results to bench/results.md.")]
struct Args {
    /// Subcommand: processors, audit, or omit for all
    #[arg(default_value = "all")]
    mode: String,

    /// Timed runs per measurement
    #[arg(long, default_value_t = 10)]
    runs: u32,

    /// Untimed warmup runs
    #[arg(long, default_value_t = 2)]
    warmup: u32,

    /// Actors per generated flow (approximate)
    #[arg(long, default_value_t = 2000)]
    actors: usize,

    /// Files in the generated audit corpus
    #[arg(long, default_value_t = 200)]
    files: usize,

    /// Output markdown file path
    #[arg(long)]
    output: Option<PathBuf>,
}

// --- Helpers ---

fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn corpus_dir() -> PathBuf {
    project_root().join("bench/corpus")
}

fn format_time(d: Duration) -> String {
    let seconds = d.as_secs_f64();
    if seconds >= 1.0 {
        format!("{seconds:.2}s")
    } else if seconds >= 0.001 {
        format!("{:.1}ms", seconds * 1000.0)
    } else {
        format!("{:.0}us", seconds * 1_000_000.0)
    }
}

/// Median of `runs` timed calls after `warmup` untimed ones.
fn measure(args: &Args, mut f: impl FnMut()) -> Duration {
    for _ in 0..args.warmup {
        f();
    }
    let mut samples: Vec<Duration> = (0..args.runs.max(1))
        .map(|_| {
            let start = Instant::now();
            f();
            start.elapsed()
        })
        .collect();
    samples.sort();
    samples[samples.len() / 2]
}

// --- Generation ---

/// A flow with callables, variables, storage, paths and nested sequences,
/// so every processor has something to do.
fn generate_flow(actors: usize, seed: usize) -> Json {
    let callables: Vec<Json> = (0..8)
        .map(|i| json!({"type": "StringConstants", "name": format!("c{i}")}))
        .collect();
    let mut body = vec![json!({"type": "CallableActors", "properties": {"actors": callables}})];

    let mut count = 0;
    let mut block = 0;
    while count < actors {
        let i = seed + block;
        let inner = vec![
            json!({"type": "SetVariable", "properties": {"variable_name": format!("v{}", i % 50), "variable_value": "x"}}),
            json!({"type": "SetStorageValue", "properties": {"storage_name": format!("s{}", i % 20)}}),
            json!({"type": "Display", "annotations": "@todo check", "properties": {"title": format!("@{{v{}}} and %{{s{}}}", i % 50, i % 20)}}),
            json!({"type": "FileSupplier", "properties": {"files": [format!("/data/in/{i}.csv")]}}),
            json!({"type": "CallableSink", "properties": {"callable": format!("c{}", i % 6)}}),
            json!({"type": "Breakpoint", "skip": i % 7 == 0}),
        ];
        count += inner.len() + 1;
        let wrapped = json!({"type": "Sequence", "name": format!("block{block}"), "properties": {"actors": inner}});
        body.push(if block % 5 == 0 {
            json!({"type": "Sequence", "name": format!("wrapper{block}"), "properties": {"actors": [wrapped]}})
        } else {
            wrapped
        });
        block += 1;
    }
    json!({"type": "Flow", "properties": {"actors": body}})
}

fn build_flow(actors: usize, seed: usize) -> Result<Flow> {
    let text = serde_json::to_string(&generate_flow(actors, seed))?;
    Ok(document::parse(&text, Format::Json)?)
}

const BENCH_CONFIG: &str = "\
ListCallableReferences:
  Name: c0
FindText:
  Find: block1
ChangeVariableName:
  Old: v0
  New: v0_renamed
ChangeStorageName:
  Old: s0
  New: s0_renamed
ChangeCallableName:
  Old: c0
  New: c0_renamed
ChangePath:
  Old: /data
  New: /srv/data
SwapObjects:
  Find: Display
  Replace: \"Null\"
";

// --- Processors ---

fn run_processors(args: &Args, config: &ResolvedConfig, out: &mut String) -> Result<()> {
    let flow = build_flow(args.actors, 0)?;
    let registry = ProcessorRegistry::default_registry();
    eprintln!("Timing {} processors on a flow of {} nodes", registry.len(), flow.len());

    writeln!(out, "## Processors\n")?;
    writeln!(out, "Flow with {} nodes, median of {} runs.\n", flow.len(), args.runs)?;
    writeln!(out, "| Processor | Capability | Time | Errors |")?;
    writeln!(out, "|-----------|------------|-----:|-------:|")?;
    for entry in registry.entries() {
        let mut processor = registry
            .build(entry.name, config)
            .with_context(|| format!("building {}", entry.name))?;
        let time = measure(args, || {
            let _ = processor.process(&flow);
        });
        eprintln!("  {:<24} {}", entry.name, format_time(time));
        writeln!(
            out,
            "| {} | {} | {} | {} |",
            entry.name,
            entry.capability.label(),
            format_time(time),
            processor.errors().len()
        )?;
    }
    writeln!(out)?;
    Ok(())
}

// --- Audit ---

fn write_corpus(dir: &Path, args: &Args) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("clearing {}", dir.display()))?;
    }
    fs::create_dir_all(dir)?;
    for i in 0..args.files {
        let flow = build_flow(args.actors / 10, i)?;
        let (name, format) = if i % 2 == 0 {
            (format!("flow{i:04}.flow.json"), Format::Json)
        } else {
            (format!("flow{i:04}.flow.yml"), Format::Yaml)
        };
        fs::write(dir.join(name), document::render(&flow, format)?)?;
    }
    Ok(())
}

fn run_audit(args: &Args, config: &ResolvedConfig, out: &mut String) -> Result<()> {
    let dir = corpus_dir();
    write_corpus(&dir, args)?;
    let files = discover_files(std::slice::from_ref(&dir), config)?;
    eprintln!("Auditing {} generated files in {}", files.len(), dir.display());

    writeln!(out, "## Audit\n")?;
    writeln!(out, "{} files of about {} actors, median of {} runs.\n", files.len(), args.actors / 10, args.runs)?;
    writeln!(out, "| Selection | Time | Files/s |")?;
    writeln!(out, "|-----------|-----:|--------:|")?;

    let registry = ProcessorRegistry::default_registry();
    for (label, flags) in [
        ("check", vec!["--check"]),
        ("clean-up + check", vec!["--clean-up", "--check"]),
        ("list paths", vec!["-p", "ListPaths"]),
    ] {
        let cli = CliArgs::try_parse_from(std::iter::once("flowproc").chain(flags))?;
        let plan = AuditPlan::new(&cli, &registry, config)?;
        let time = measure(args, || {
            let _ = plan.run(&files);
        });
        let rate = files.len() as f64 / time.as_secs_f64().max(f64::EPSILON);
        eprintln!("  {label:<18} {}", format_time(time));
        writeln!(out, "| {label} | {} | {rate:.0} |", format_time(time))?;
    }
    writeln!(out)?;

    fs::remove_dir_all(&dir).with_context(|| format!("removing {}", dir.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| project_root().join("bench/results.md"));
    let config = parse_config(BENCH_CONFIG)?;

    let mut md = String::from("# flowproc benchmark\n\n");
    let start = Instant::now();
    match args.mode.as_str() {
        "processors" => run_processors(&args, &config, &mut md)?,
        "audit" => run_audit(&args, &config, &mut md)?,
        "all" => {
            run_processors(&args, &config, &mut md)?;
            run_audit(&args, &config, &mut md)?;
        }
        other => anyhow::bail!("unknown mode: {other}. Use: processors, audit, or all."),
    }
    writeln!(md, "Total wall time: {}", format_time(start.elapsed()))?;

    fs::write(&output_path, &md).with_context(|| format!("writing {}", output_path.display()))?;
    eprintln!("\nWrote {}", output_path.display());
    Ok(())
}
