use crate::flow::value::ValueType;
use crate::processor::listing::{ListRule, Occurrence};
use crate::walker::Site;

pub struct ListPaths;

impl ListPaths {
    pub const NAME: &'static str = "ListPaths";
    pub const DESCRIPTION: &'static str = "Lists all file and directory paths in the flow.";
}

impl ListRule for ListPaths {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn sorted(&self) -> bool {
        true
    }

    fn unique(&self) -> bool {
        true
    }

    fn is_valid(&self, site: &Site<'_>, occurrence: &Occurrence<'_>) -> bool {
        match occurrence {
            Occurrence::Element { value, .. } => {
                site.property.base_type() == ValueType::Path && value.as_str().is_some_and(|p| !p.is_empty())
            }
            Occurrence::Binding(_) => false,
        }
    }

    fn display(&self, _site: &Site<'_>, occurrence: &Occurrence<'_>) -> Vec<String> {
        match occurrence {
            Occurrence::Element { value, .. } => vec![value.to_string()],
            Occurrence::Binding(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::document::from_json_str;
    use crate::processor::listing::ListProcessor;
    use crate::processor::{Listing, Processor};

    #[test]
    fn sorted_unique_paths() {
        let flow = from_json_str(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "FileSupplier", "properties": {"files": ["/z/in.csv", "/a/in.csv", ""]}},
                {"type": "DumpFile", "properties": {"output_file": "/z/in.csv"}},
                {"type": "Display", "properties": {"title": "/not/a/path"}}
            ]}}"#,
        )
        .unwrap();
        let mut p = ListProcessor::new(ListPaths);
        p.process(&flow).unwrap();
        assert_eq!(p.list(), &["/a/in.csv", "/z/in.csv"]);
    }
}
