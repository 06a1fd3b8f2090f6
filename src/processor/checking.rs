use std::collections::VecDeque;

use crate::error::ConfigError;
use crate::flow::markers;
use crate::flow::value::{Interface, Namespace, Value};
use crate::flow::{Flow, NodeId};
use crate::walker::{traverse, Site, Step, Visitor};

use super::counter::NamedCounter;
use super::{begin, finish, Checking, Processor};

/// The tool-specific part of a definition/usage check.
pub trait CheckRule: Send {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn namespace(&self) -> Namespace;

    /// Append a name/count table to the warnings, even when nothing is wrong.
    fn output_counts(&self) -> bool {
        false
    }

    /// Names supplied at run time, never reported as undefined.
    fn predefined(&self) -> &[String] {
        &[]
    }
}

/// Outcome of checking one scope. The flow itself is the unnamed outer
/// scope; every isolating node below it gets a report of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeReport {
    pub scope: Option<String>,
    pub definitions: NamedCounter,
    pub usages: NamedCounter,
    pub unused: Vec<String>,
    pub undefined: Vec<String>,
}

impl ScopeReport {
    pub fn is_clean(&self) -> bool {
        self.unused.is_empty() && self.undefined.is_empty()
    }
}

/// Counts definitions and usages of one namespace during a single pass.
struct Tally {
    namespace: Namespace,
    definitions: NamedCounter,
    usages: NamedCounter,
    scopes: Vec<NodeId>,
}

impl Tally {
    fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            definitions: NamedCounter::new(),
            usages: NamedCounter::new(),
            scopes: Vec::new(),
        }
    }
}

impl Visitor for Tally {
    fn visit_binding(&mut self, _site: &Site<'_>, variable: &str) {
        if self.namespace == Namespace::Variables {
            self.usages.increment(variable);
        }
    }

    fn visit_argument(&mut self, site: &Site<'_>, _index: Option<usize>, value: &Value) {
        let Some(text) = value.as_str() else {
            return;
        };
        let base_type = site.property.base_type();
        if base_type.namespace() == Some(self.namespace) {
            if text.is_empty() {
                return;
            }
            if site.property.def.defines {
                if !in_disabled(site) {
                    self.definitions.increment(text);
                }
            } else {
                self.usages.increment(text);
            }
        } else if base_type.is_free_text() {
            for name in markers::extract(self.namespace, text) {
                self.usages.increment(name);
            }
        }
    }

    fn visit_component(&mut self, site: &Site<'_>, _index: Option<usize>, child: NodeId) {
        if self.namespace != Namespace::Callables {
            return;
        }
        let Some(owner) = site.owner() else { return };
        if !owner.node_type().callable_group {
            return;
        }
        if let Some(node) = site.flow.node(child) {
            if node.node_type().is_actor() && !node.is_disabled() && !in_disabled(site) {
                self.definitions.increment(node.name());
            }
        }
    }

    fn descend(&mut self, flow: &Flow, _declared: Interface, child: NodeId) -> bool {
        let Some(node) = flow.node(child) else {
            return false;
        };
        let isolated = node.node_type().isolates(self.namespace);
        if isolated && !node.is_disabled() {
            self.scopes.push(child);
        }
        !isolated
    }

    /// A call from a disabled actor still keeps its callable alive, the same
    /// rule `RemoveUnusedCallables` applies. Definitions inside disabled
    /// subtrees are still ignored.
    fn include_disabled(&self) -> bool {
        self.namespace == Namespace::Callables
    }
}

/// Whether a disabled node lies between the traversal root and `site`.
fn in_disabled(site: &Site<'_>) -> bool {
    site.path.steps().iter().skip(1).any(|step| match step {
        Step::Node(id) => site.flow.node(*id).is_some_and(|n| n.is_disabled()),
        Step::Property { .. } => false,
    })
}

/// Runs a [`CheckRule`] and derives unused definitions and undefined usages.
pub struct CheckProcessor<R> {
    rule: R,
    reports: Vec<ScopeReport>,
    errors: Vec<String>,
}

impl<R: CheckRule> CheckProcessor<R> {
    pub fn new(rule: R) -> Self {
        Self {
            rule,
            reports: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn reports(&self) -> &[ScopeReport] {
        &self.reports
    }

    /// Unused definitions of the outer scope.
    pub fn unused(&self) -> &[String] {
        self.reports.first().map(|r| r.unused.as_slice()).unwrap_or(&[])
    }

    /// Undefined usages of the outer scope.
    pub fn undefined(&self) -> &[String] {
        self.reports.first().map(|r| r.undefined.as_slice()).unwrap_or(&[])
    }

    fn check_scope(&self, flow: &Flow, root: NodeId, scope: Option<String>) -> (ScopeReport, Vec<NodeId>) {
        let mut tally = Tally::new(self.rule.namespace());
        traverse(flow, root, &mut tally);
        let predefined = self.rule.predefined();
        let undefined = tally
            .usages
            .missing_from(&tally.definitions)
            .into_iter()
            .filter(|n| !predefined.contains(n))
            .collect();
        let unused = tally.definitions.missing_from(&tally.usages);
        let report = ScopeReport {
            scope,
            definitions: tally.definitions,
            usages: tally.usages,
            unused,
            undefined,
        };
        (report, tally.scopes)
    }
}

impl<R: CheckRule> Processor for CheckProcessor<R> {
    fn name(&self) -> &'static str {
        self.rule.name()
    }

    fn description(&self) -> &'static str {
        self.rule.description()
    }

    fn process(&mut self, flow: &Flow) -> Result<(), ConfigError> {
        self.reports.clear();
        let root = begin(flow, &mut self.errors)?;

        let mut pending = VecDeque::from([(root, None)]);
        let mut reports = Vec::new();
        while let Some((scope_root, scope)) = pending.pop_front() {
            let (report, nested) = self.check_scope(flow, scope_root, scope);
            reports.push(report);
            pending.extend(nested.into_iter().map(|id| (id, Some(flow.full_name(id)))));
        }
        self.reports = reports;
        finish(self.rule.name(), &mut self.errors, Ok(()));
        Ok(())
    }

    fn errors(&self) -> &[String] {
        &self.errors
    }

    fn as_checking(&self) -> Option<&dyn Checking> {
        Some(self)
    }
}

impl<R: CheckRule> Checking for CheckProcessor<R> {
    fn warnings(&self) -> Option<String> {
        let label = self.rule.namespace().label();
        let mut lines = Vec::new();
        for report in &self.reports {
            let suffix = match &report.scope {
                Some(scope) => format!(" in {scope}"),
                None => String::new(),
            };
            if !report.unused.is_empty() {
                lines.push(format!("Unused {label}s{suffix}: {}", report.unused.join(", ")));
            }
            if !report.undefined.is_empty() {
                lines.push(format!("Undefined {label}s{suffix}: {}", report.undefined.join(", ")));
            }
        }

        if self.rule.output_counts() {
            lines.push("Name\tDefinitions\tUsages".to_string());
            for report in &self.reports {
                let mut names: Vec<&str> = report.definitions.names().chain(report.usages.names()).collect();
                names.sort_unstable();
                names.dedup();
                for name in names {
                    let shown = match &report.scope {
                        Some(scope) => format!("{scope}:{name}"),
                        None => name.to_string(),
                    };
                    lines.push(format!(
                        "{shown}\t{}\t{}",
                        report.definitions.count(name),
                        report.usages.count(name)
                    ));
                }
            }
        }

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }

    fn warnings_header(&self) -> Option<String> {
        let unused: usize = self.reports.iter().map(|r| r.unused.len()).sum();
        let undefined: usize = self.reports.iter().map(|r| r.undefined.len()).sum();
        if unused + undefined == 0 {
            return None;
        }
        Some(format!("{}: {unused} unused, {undefined} undefined", self.rule.name()))
    }
}
