use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::flow::Flow;

use super::{begin, Checking, Modifying, Processor};

/// Runs sub-processors in order over one shared copy of the flow. Each
/// modifying sub-processor works on that copy directly, so its changes are
/// what the next sub-processor sees.
///
/// A sub-processor that fails halfway leaves the copy as it stands: every
/// single property write is atomic, so what it did manage to change is
/// consistent and the remaining sub-processors continue from there.
pub struct MultiProcessor {
    processors: Vec<Box<dyn Processor>>,
    errors: Vec<String>,
    warnings: Vec<String>,
    modified: bool,
    result: Option<Flow>,
}

impl MultiProcessor {
    pub fn new(processors: Vec<Box<dyn Processor>>) -> Self {
        Self {
            processors,
            errors: Vec::new(),
            warnings: Vec::new(),
            modified: false,
            result: None,
        }
    }

    pub fn processors(&self) -> &[Box<dyn Processor>] {
        &self.processors
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    fn reset(&mut self) {
        self.warnings.clear();
        self.modified = false;
        self.result = None;
    }

    fn run(&mut self, flow: &mut Flow) {
        for sub in &mut self.processors {
            let name = sub.name();
            let outcome = match sub.as_modifying_mut() {
                Some(modifying) => modifying.process_in_place(flow),
                None => sub.process(flow),
            };
            if let Err(e) = outcome {
                warn!(processor = name, "sub-processor failed: {e}");
                self.errors.push(format!("{name}: {e}"));
                continue;
            }
            self.errors
                .extend(sub.errors().iter().map(|e| format!("{name}: {e}")));
            if let Some(checking) = sub.as_checking() {
                if let Some(warnings) = checking.warnings() {
                    self.warnings.push(warnings);
                }
            }
            if sub.as_modifying().is_some_and(|m| m.is_modified()) {
                debug!(processor = name, "modified flow");
                self.modified = true;
            }
        }
    }
}

impl Processor for MultiProcessor {
    fn name(&self) -> &'static str {
        "MultiProcessor"
    }

    fn description(&self) -> &'static str {
        "Applies the configured processors one after the other."
    }

    fn process(&mut self, flow: &Flow) -> Result<(), ConfigError> {
        self.reset();
        begin(flow, &mut self.errors)?;
        let mut copy = flow.clone();
        self.run(&mut copy);
        if self.modified {
            self.result = Some(copy);
        }
        Ok(())
    }

    fn errors(&self) -> &[String] {
        &self.errors
    }

    fn as_checking(&self) -> Option<&dyn Checking> {
        Some(self)
    }

    fn as_modifying(&self) -> Option<&dyn Modifying> {
        Some(self)
    }

    fn as_modifying_mut(&mut self) -> Option<&mut dyn Modifying> {
        Some(self)
    }
}

impl Checking for MultiProcessor {
    fn warnings(&self) -> Option<String> {
        if self.warnings.is_empty() {
            None
        } else {
            Some(self.warnings.join("\n"))
        }
    }
}

impl Modifying for MultiProcessor {
    fn is_modified(&self) -> bool {
        self.modified
    }

    fn modified_flow(&self) -> Option<&Flow> {
        self.result.as_ref()
    }

    fn take_modified_flow(&mut self) -> Option<Flow> {
        self.result.take()
    }

    fn process_in_place(&mut self, flow: &mut Flow) -> Result<(), ConfigError> {
        self.reset();
        begin(flow, &mut self.errors)?;
        self.run(flow);
        Ok(())
    }
}
