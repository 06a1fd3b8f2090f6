use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "flowproc",
    version,
    about = "Inspect, check and rewrite workflow definitions without running them"
)]
pub struct Args {
    /// Flow files or directories to process
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text", value_parser = ["text", "json", "quiet"])]
    pub format: String,

    /// Run the named processors, in order (repeatable or comma-separated)
    #[arg(short, long = "processor", value_name = "NAME", value_delimiter = ',')]
    pub processors: Vec<String>,

    /// Override a processor option, e.g. `ChangeVariableName.Old=input`
    #[arg(short, long = "set", value_name = "PROCESSOR.OPTION=VALUE")]
    pub set: Vec<String>,

    /// Run the check group (the default when nothing else is selected)
    #[arg(long)]
    pub check: bool,

    /// Run the clean-up group before any other processor
    #[arg(long)]
    pub clean_up: bool,

    /// Save modified flows back to their files
    #[arg(short, long)]
    pub write: bool,

    /// List all registered processors with their capability, then exit
    #[arg(long)]
    pub list_processors: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Stop after the first file with warnings or errors
    #[arg(short = 'F', long)]
    pub fail_fast: bool,
}

impl Args {
    /// Whether the check group runs: on request, or when nothing else was
    /// selected.
    pub fn runs_checks(&self) -> bool {
        self.check || (self.processors.is_empty() && !self.clean_up)
    }
}
