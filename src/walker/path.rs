use crate::flow::{Flow, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Node(NodeId),
    Property {
        name: &'static str,
        index: Option<usize>,
    },
}

/// The chain of nodes and properties leading from the traversal root to the
/// current position. Owned by the walker; visitors only ever see it borrowed.
#[derive(Debug, Clone, Default)]
pub struct TraversalPath {
    steps: Vec<Step>,
}

impl TraversalPath {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub(crate) fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub(crate) fn pop(&mut self) {
        self.steps.pop();
    }

    /// Innermost node on the path.
    pub fn node(&self) -> Option<NodeId> {
        self.steps.iter().rev().find_map(|s| match s {
            Step::Node(id) => Some(*id),
            Step::Property { .. } => None,
        })
    }

    /// Human-readable address of the current position: the full name of the
    /// innermost actor, followed by the property chain below it, e.g.
    /// `Flow.Convert:conversion/conversions[1]/find`.
    pub fn location(&self, flow: &Flow) -> String {
        let actor_pos = self.steps.iter().rposition(|s| match s {
            Step::Node(id) => flow.node(*id).is_some_and(|n| n.node_type().is_actor()),
            Step::Property { .. } => false,
        });
        let Some(pos) = actor_pos else {
            return String::new();
        };
        let Step::Node(actor) = self.steps[pos] else {
            return String::new();
        };

        let mut out = flow.full_name(actor);
        let mut first = true;
        for step in &self.steps[pos + 1..] {
            let Step::Property { name, index } = step else {
                continue;
            };
            out.push(if first { ':' } else { '/' });
            first = false;
            out.push_str(name);
            if let Some(i) = index {
                out.push_str(&format!("[{i}]"));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::catalog::ACTORS;
    use crate::flow::document::from_json_str;

    #[test]
    fn location_of_nested_setting() {
        let flow = from_json_str(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "Convert", "properties": {"conversion":
                    {"type": "ChainedConversion", "properties": {"conversions": [
                        {"type": "AnyToString"},
                        {"type": "StringReplace", "properties": {"find": "x"}}
                    ]}}
                }}
            ]}}"#,
        )
        .unwrap();
        let root = flow.root().unwrap();
        let convert = flow.node(root).unwrap().children()[0];
        let chained = flow.node(convert).unwrap().children()[0];
        let replace = flow.node(chained).unwrap().children()[1];

        let mut path = TraversalPath::default();
        path.push(Step::Node(root));
        path.push(Step::Property { name: ACTORS, index: Some(0) });
        path.push(Step::Node(convert));
        path.push(Step::Property { name: "conversion", index: None });
        path.push(Step::Node(chained));
        path.push(Step::Property { name: "conversions", index: Some(1) });
        path.push(Step::Node(replace));
        path.push(Step::Property { name: "find", index: None });

        assert_eq!(path.location(&flow), "Flow.Convert:conversion/conversions[1]/find");
        assert_eq!(path.node(), Some(replace));
    }

    #[test]
    fn location_of_actor_itself() {
        let flow = from_json_str(r#"{"type": "Flow"}"#).unwrap();
        let mut path = TraversalPath::default();
        path.push(Step::Node(flow.root().unwrap()));
        assert_eq!(path.location(&flow), "Flow");
        path.push(Step::Property { name: "name", index: None });
        assert_eq!(path.location(&flow), "Flow:name");
    }
}
