pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod flow;
pub mod formatter;
pub mod fs;
pub mod processor;
pub mod report;
pub mod walker;

use anyhow::Result;
use tracing::debug;

use audit::AuditPlan;
use cli::Args;
use config::load_config;
use formatter::create_formatter;
use fs::discover_files;
use processor::registry::ProcessorRegistry;
use report::FileReport;

/// Run the processors over the given flows. Returns the exit code:
/// 0 = clean, 1 = warnings or errors reported, 2 = fatal error.
pub fn run(args: Args) -> Result<i32> {
    let mut config = load_config(args.config.as_deref())?;
    for assignment in &args.set {
        config.apply_override(assignment)?;
    }

    match config.config_path() {
        Some(path) => debug!(config = %path.display(), "config loaded"),
        None => debug!("no config file found"),
    }
    debug!(global_excludes = ?config.global_excludes(), "global excludes");

    let registry = ProcessorRegistry::default_registry();

    // --list-processors: print every registered processor and exit
    if args.list_processors {
        for entry in registry.entries() {
            let enabled = if config.is_processor_enabled(entry.name) {
                ""
            } else {
                " (disabled)"
            };
            println!(
                "{}\t{}\t{}{enabled}",
                entry.name,
                entry.capability.label(),
                entry.description
            );
        }
        return Ok(0);
    }

    let plan = AuditPlan::new(&args, &registry, &config)?;
    let files = discover_files(&args.paths, &config)?;
    debug!(files = files.len(), processors = plan.processors.len(), "starting audit");

    let reports = plan.run(&files);
    create_formatter(&args.format).print(&reports);

    if reports.iter().any(FileReport::is_failure) {
        Ok(1)
    } else {
        Ok(0)
    }
}
