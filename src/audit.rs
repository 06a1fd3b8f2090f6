use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::cli::Args;
use crate::config::ResolvedConfig;
use crate::error::ConfigError;
use crate::flow::document;
use crate::processor::registry::{Group, ProcessorRegistry};
use crate::processor::{Modifying, Processor};
use crate::report::FileReport;

/// What to run and whether to persist rewritten flows.
pub struct AuditPlan<'a> {
    pub registry: &'a ProcessorRegistry,
    pub config: &'a ResolvedConfig,
    pub processors: Vec<&'static str>,
    pub write: bool,
    pub fail_fast: bool,
}

impl<'a> AuditPlan<'a> {
    /// Resolves the processor selection from the command line: the clean-up
    /// group first, then explicitly named processors, then the check group.
    /// Every processor is built once so invalid options fail up front.
    pub fn new(args: &Args, registry: &'a ProcessorRegistry, config: &'a ResolvedConfig) -> Result<Self, ConfigError> {
        let mut processors = Vec::new();
        if args.clean_up {
            processors.extend(registry.group_members(Group::CleanUp, config));
        }
        for name in &args.processors {
            let entry = registry
                .get(name)
                .ok_or_else(|| ConfigError::UnknownProcessor(name.clone()))?;
            processors.push(entry.name);
        }
        if args.runs_checks() {
            processors.extend(registry.group_members(Group::Check, config));
        }
        let mut seen = Vec::new();
        processors.retain(|name| {
            if seen.contains(name) {
                false
            } else {
                seen.push(*name);
                true
            }
        });

        registry.build_multi(&processors, config)?;
        debug!(?processors, "selected processors");
        Ok(Self {
            registry,
            config,
            processors,
            write: args.write,
            fail_fast: args.fail_fast,
        })
    }

    /// Processors whose Include/Exclude patterns admit `path`.
    fn applicable(&self, path: &Path) -> anyhow::Result<Vec<&'static str>> {
        let mut names = Vec::new();
        for &name in &self.processors {
            if self.config.processor_config(name).applies_to(path)? {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Loads, processes and optionally rewrites a single flow file.
    pub fn audit_file(&self, path: &Path) -> FileReport {
        let display = path.display().to_string();
        let flow = match document::load(path) {
            Ok(flow) => flow,
            Err(e) => return FileReport::failed(display, format!("failed to load: {e}")),
        };
        let names = match self.applicable(path) {
            Ok(names) => names,
            Err(e) => return FileReport::failed(display, format!("{e:#}")),
        };
        let mut multi = match self.registry.build_multi(&names, self.config) {
            Ok(multi) => multi,
            Err(e) => return FileReport::failed(display, e.to_string()),
        };
        if let Err(e) = multi.process(&flow) {
            return FileReport::failed(display, e.to_string());
        }

        let mut report = FileReport::from_processor(display, &multi);
        if self.write && report.modified {
            if let Some(modified) = multi.take_modified_flow() {
                match document::save(&modified, path) {
                    Ok(()) => {
                        debug!(path = %path.display(), "wrote modified flow");
                        report.written = true;
                    }
                    Err(e) => {
                        warn!(path = %path.display(), "failed to write: {e}");
                        report.errors.push(format!("failed to write: {e}"));
                    }
                }
            }
        }
        report
    }

    /// Audits all files in parallel. Reports come back sorted by path.
    pub fn run(&self, files: &[PathBuf]) -> Vec<FileReport> {
        let failed = AtomicBool::new(false);
        let mut reports: Vec<FileReport> = files
            .par_iter()
            .filter_map(|path| {
                // --fail-fast: skip remaining files once one has failed
                if self.fail_fast && failed.load(Ordering::Relaxed) {
                    return None;
                }
                let report = self.audit_file(path);
                if self.fail_fast && report.is_failure() {
                    failed.store(true, Ordering::Relaxed);
                }
                Some(report)
            })
            .collect();
        reports.sort_by(|a, b| a.path.cmp(&b.path));
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::flow::document::load;
    use clap::Parser;
    use std::fs;

    const FLOW: &str = r#"{"type": "Flow", "properties": {"actors": [
        {"type": "CallableActors", "properties": {"actors": [{"type": "Null", "name": "unused"}]}},
        {"type": "SetVariable", "properties": {"variable_name": "x"}},
        {"type": "Display", "properties": {"title": "@{x}"}}
    ]}}"#;

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("flowproc").chain(extra.iter().copied())).unwrap()
    }

    #[test]
    fn selection_order_and_dedup() {
        let registry = ProcessorRegistry::default_registry();
        let config = ResolvedConfig::default();
        let plan = AuditPlan::new(
            &args(&["--clean-up", "--check", "-p", "FlattenStructure,ListPaths"]),
            &registry,
            &config,
        )
        .unwrap();
        assert_eq!(
            plan.processors,
            vec![
                "RemoveDisabledNodes",
                "RemoveUnusedCallables",
                "FlattenStructure",
                "ListPaths",
                "CheckVariableUsage",
                "CheckStorageUsage",
                "CheckCallableUsage",
            ]
        );
    }

    #[test]
    fn unknown_processor_and_missing_options_are_fatal() {
        let registry = ProcessorRegistry::default_registry();
        let config = ResolvedConfig::default();
        assert!(matches!(
            AuditPlan::new(&args(&["-p", "Nope"]), &registry, &config),
            Err(ConfigError::UnknownProcessor(_))
        ));
        assert!(matches!(
            AuditPlan::new(&args(&["-p", "ChangePath"]), &registry, &config),
            Err(ConfigError::MissingOption { .. })
        ));
    }

    #[test]
    fn check_reports_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.flow.json");
        fs::write(&path, FLOW).unwrap();

        let registry = ProcessorRegistry::default_registry();
        let config = ResolvedConfig::default();
        let plan = AuditPlan::new(&args(&[]), &registry, &config).unwrap();
        let reports = plan.run(&[path]);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_failure());
        assert_eq!(reports[0].warnings[0].processor, "CheckCallableUsage");
        assert_eq!(reports[0].warnings[0].lines, vec!["Unused callable actors: unused"]);
    }

    #[test]
    fn clean_up_with_write_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.flow.json");
        fs::write(&path, FLOW).unwrap();

        let registry = ProcessorRegistry::default_registry();
        let config = ResolvedConfig::default();
        let plan = AuditPlan::new(&args(&["--clean-up", "--check", "--write"]), &registry, &config).unwrap();
        let report = plan.audit_file(&path);
        assert!(report.modified);
        assert!(report.written);
        assert!(!report.is_failure(), "{report}");

        let saved = load(&path).unwrap();
        assert!(saved.locate("Flow.CallableActors").is_none());
        assert!(saved.locate("Flow.Display").is_some());
    }

    #[test]
    fn without_write_the_file_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.flow.json");
        fs::write(&path, FLOW).unwrap();

        let registry = ProcessorRegistry::default_registry();
        let config = ResolvedConfig::default();
        let plan = AuditPlan::new(&args(&["--clean-up"]), &registry, &config).unwrap();
        let report = plan.audit_file(&path);
        assert!(report.modified);
        assert!(!report.written);
        assert_eq!(fs::read_to_string(&path).unwrap(), FLOW);
    }

    #[test]
    fn unreadable_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.flow.json");
        fs::write(&path, "{ not json").unwrap();

        let registry = ProcessorRegistry::default_registry();
        let config = ResolvedConfig::default();
        let plan = AuditPlan::new(&args(&[]), &registry, &config).unwrap();
        let report = plan.audit_file(&path);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("failed to load"));
    }

    #[test]
    fn per_processor_excludes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.flow.json");
        fs::write(&path, FLOW).unwrap();

        let registry = ProcessorRegistry::default_registry();
        let config = parse_config("CheckCallableUsage:\n  Exclude:\n    - \"**/legacy.flow.json\"\n").unwrap();
        let plan = AuditPlan::new(&args(&[]), &registry, &config).unwrap();
        let report = plan.audit_file(&path);
        assert!(!report.is_failure(), "{report}");
    }
}
