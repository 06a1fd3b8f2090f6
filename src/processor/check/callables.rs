use crate::config::ProcessorConfig;
use crate::error::ConfigError;
use crate::flow::value::Namespace;
use crate::processor::checking::CheckRule;

/// Callable actors nobody calls, and calls to callable actors that don't exist.
#[derive(Default)]
pub struct CheckCallableUsage {
    output_counts: bool,
}

impl CheckCallableUsage {
    pub const NAME: &'static str = "CheckCallableUsage";
    pub const DESCRIPTION: &'static str = "Reports callable actors that are never referenced, and references to missing callable actors.";

    pub fn new(output_counts: bool) -> Self {
        Self { output_counts }
    }

    pub fn from_config(config: &ProcessorConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.get_bool(Self::NAME, "OutputCounts", false)?))
    }
}

impl CheckRule for CheckCallableUsage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn namespace(&self) -> Namespace {
        Namespace::Callables
    }

    fn output_counts(&self) -> bool {
        self.output_counts
    }
}
