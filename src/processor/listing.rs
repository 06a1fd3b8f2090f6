use crate::error::ConfigError;
use crate::flow::value::{Interface, Value};
use crate::flow::{Flow, NodeId};
use crate::walker::{traverse, Site, Visitor};

use super::{begin, finish, Listing, Processor};

/// What a listing rule is looking at.
#[derive(Debug, Clone, Copy)]
pub enum Occurrence<'v> {
    /// One element of an argument (the value itself for scalars).
    Element {
        index: Option<usize>,
        value: &'v Value,
    },
    /// The variable a property is bound to.
    Binding(&'v str),
}

/// The tool-specific part of a listing processor.
pub trait ListRule: Send {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn sorted(&self) -> bool {
        false
    }

    fn unique(&self) -> bool {
        false
    }

    fn is_valid(&self, site: &Site<'_>, occurrence: &Occurrence<'_>) -> bool;

    /// Entries to emit for a valid match. An empty result suppresses the
    /// match although it was valid.
    fn display(&self, site: &Site<'_>, occurrence: &Occurrence<'_>) -> Vec<String> {
        let _ = occurrence;
        vec![site.location()]
    }

    #[allow(unused_variables)]
    fn descend(&self, flow: &Flow, declared: Interface, child: NodeId) -> bool {
        true
    }

    /// Post-processing after sorting and de-duplication.
    #[allow(unused_variables)]
    fn finalize(&self, list: &mut Vec<String>) {}
}

/// Runs a [`ListRule`] over a flow and collects its matches.
pub struct ListProcessor<R> {
    rule: R,
    list: Vec<String>,
    errors: Vec<String>,
}

impl<R: ListRule> ListProcessor<R> {
    pub fn new(rule: R) -> Self {
        Self {
            rule,
            list: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }
}

struct Collector<'r, R> {
    rule: &'r R,
    unique: bool,
    list: Vec<String>,
}

impl<R: ListRule> Collector<'_, R> {
    fn record(&mut self, site: &Site<'_>, occurrence: Occurrence<'_>) {
        if !self.rule.is_valid(site, &occurrence) {
            return;
        }
        for entry in self.rule.display(site, &occurrence) {
            if self.unique && self.list.contains(&entry) {
                continue;
            }
            self.list.push(entry);
        }
    }
}

impl<R: ListRule> Visitor for Collector<'_, R> {
    fn visit_binding(&mut self, site: &Site<'_>, variable: &str) {
        self.record(site, Occurrence::Binding(variable));
    }

    fn visit_argument(&mut self, site: &Site<'_>, index: Option<usize>, value: &Value) {
        self.record(site, Occurrence::Element { index, value });
    }

    fn descend(&mut self, flow: &Flow, declared: Interface, child: NodeId) -> bool {
        self.rule.descend(flow, declared, child)
    }
}

impl<R: ListRule> Processor for ListProcessor<R> {
    fn name(&self) -> &'static str {
        self.rule.name()
    }

    fn description(&self) -> &'static str {
        self.rule.description()
    }

    fn process(&mut self, flow: &Flow) -> Result<(), ConfigError> {
        self.list.clear();
        let root = begin(flow, &mut self.errors)?;
        let mut collector = Collector {
            rule: &self.rule,
            unique: self.rule.unique(),
            list: Vec::new(),
        };
        traverse(flow, root, &mut collector);
        let mut list = collector.list;
        if self.rule.sorted() {
            list.sort();
        }
        self.rule.finalize(&mut list);
        self.list = list;
        finish(self.rule.name(), &mut self.errors, Ok(()));
        Ok(())
    }

    fn errors(&self) -> &[String] {
        &self.errors
    }

    fn as_listing(&self) -> Option<&dyn Listing> {
        Some(self)
    }
}

impl<R: ListRule> Listing for ListProcessor<R> {
    fn list(&self) -> &[String] {
        &self.list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::document::from_json_str;

    struct Strings {
        sorted: bool,
        unique: bool,
    }

    impl ListRule for Strings {
        fn name(&self) -> &'static str {
            "Strings"
        }

        fn description(&self) -> &'static str {
            "lists constant strings"
        }

        fn sorted(&self) -> bool {
            self.sorted
        }

        fn unique(&self) -> bool {
            self.unique
        }

        fn is_valid(&self, site: &Site<'_>, _occurrence: &Occurrence<'_>) -> bool {
            site.property.name() == "strings"
        }

        fn display(&self, _site: &Site<'_>, occurrence: &Occurrence<'_>) -> Vec<String> {
            match occurrence {
                Occurrence::Element { value, .. } if value.as_str() != Some("skip") => {
                    vec![value.to_string()]
                }
                _ => Vec::new(),
            }
        }

        fn finalize(&self, list: &mut Vec<String>) {
            list.insert(0, "Strings".into());
        }
    }

    fn flow() -> Flow {
        from_json_str(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "StringConstants", "properties": {"strings": ["c", "a", "skip", "c"]}}
            ]}}"#,
        )
        .unwrap()
    }

    fn run(sorted: bool, unique: bool) -> Vec<String> {
        let mut p = ListProcessor::new(Strings { sorted, unique });
        p.process(&flow()).unwrap();
        p.list().to_vec()
    }

    #[test]
    fn traversal_order_by_default() {
        assert_eq!(run(false, false), vec!["Strings", "c", "a", "c"]);
    }

    #[test]
    fn sorted_and_unique() {
        assert_eq!(run(true, true), vec!["Strings", "a", "c"]);
        assert_eq!(run(true, false), vec!["Strings", "a", "c", "c"]);
        assert_eq!(run(false, true), vec!["Strings", "c", "a"]);
    }

    #[test]
    fn listing_is_idempotent() {
        let flow = flow();
        let mut p = ListProcessor::new(Strings {
            sorted: false,
            unique: false,
        });
        p.process(&flow).unwrap();
        let first = p.list().to_vec();
        p.process(&flow).unwrap();
        assert_eq!(p.list(), first.as_slice());
        assert_eq!(p.report(), first.join("\n"));
    }
}
