pub mod check;
pub mod checking;
pub mod counter;
pub mod edit;
pub mod list;
pub mod listing;
pub mod modify;
pub mod modifying;
pub mod multi;
pub mod registry;

use tracing::{debug, error};

use crate::error::ConfigError;
use crate::flow::{Flow, NodeId};

/// An analysis or rewrite tool that runs over a flow without executing it.
///
/// A processor is reusable: every `process` call starts from a clean slate.
/// It is not reentrant; run distinct instances to process flows concurrently.
pub trait Processor: Send {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Runs the tool over `flow`. Only configuration problems are returned
    /// as `Err`; everything that goes wrong while processing ends up in
    /// [`Processor::errors`].
    fn process(&mut self, flow: &Flow) -> Result<(), ConfigError>;

    fn errors(&self) -> &[String];

    fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    fn as_listing(&self) -> Option<&dyn Listing> {
        None
    }

    fn as_checking(&self) -> Option<&dyn Checking> {
        None
    }

    fn as_modifying(&self) -> Option<&dyn Modifying> {
        None
    }

    fn as_modifying_mut(&mut self) -> Option<&mut dyn Modifying> {
        None
    }
}

/// Processors that produce a list of strings.
pub trait Listing {
    fn list(&self) -> &[String];

    fn report(&self) -> String {
        self.list().join("\n")
    }
}

/// Processors that compare definitions against usages.
pub trait Checking {
    /// `None` when nothing was found, which means the check passed.
    fn warnings(&self) -> Option<String>;

    fn warnings_header(&self) -> Option<String> {
        None
    }
}

/// Processors that rewrite the flow.
pub trait Modifying {
    fn is_modified(&self) -> bool;

    /// The rewritten copy. Only present after a run that changed something.
    fn modified_flow(&self) -> Option<&Flow>;

    fn take_modified_flow(&mut self) -> Option<Flow>;

    /// Runs the rewrite directly on `flow`, skipping the protective copy.
    /// The modified flag is still maintained, but no copy is kept.
    fn process_in_place(&mut self, flow: &mut Flow) -> Result<(), ConfigError>;
}

/// Start of a run: clears previous errors and rejects a flow without a root.
pub(crate) fn begin(flow: &Flow, errors: &mut Vec<String>) -> Result<NodeId, ConfigError> {
    errors.clear();
    flow.root().ok_or(ConfigError::MissingRoot)
}

/// End of a run: records a failed tool step as an error instead of raising it.
pub(crate) fn finish(processor: &str, errors: &mut Vec<String>, outcome: anyhow::Result<()>) {
    match outcome {
        Ok(()) => debug!(processor, errors = errors.len(), "processed"),
        Err(e) => {
            error!(processor, "failed to process flow: {e:#}");
            errors.push(format!("{e:#}"));
        }
    }
}
