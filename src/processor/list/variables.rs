use crate::flow::value::Namespace;
use crate::processor::listing::{ListRule, Occurrence};
use crate::walker::Site;

use super::names_in;

/// Every variable name the flow mentions: bindings, variable-name values and
/// `@{...}` markers in text.
pub struct ListAllVariables;

impl ListAllVariables {
    pub const NAME: &'static str = "ListAllVariables";
    pub const DESCRIPTION: &'static str = "Lists all variables used or set in the flow.";
}

impl ListRule for ListAllVariables {
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
        !names_in(Namespace::Variables, site, occurrence).is_empty()
    }

    fn display(&self, site: &Site<'_>, occurrence: &Occurrence<'_>) -> Vec<String> {
        names_in(Namespace::Variables, site, occurrence)
    }
}
