use crate::flow::value::Namespace;
use crate::processor::listing::{ListRule, Occurrence};
use crate::walker::Site;

use super::names_in;

pub struct ListAllStorageNames;

impl ListAllStorageNames {
    pub const NAME: &'static str = "ListAllStorageNames";
    pub const DESCRIPTION: &'static str = "Lists all storage names used or set in the flow.";
}

impl ListRule for ListAllStorageNames {
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
        !names_in(Namespace::Storage, site, occurrence).is_empty()
    }

    fn display(&self, site: &Site<'_>, occurrence: &Occurrence<'_>) -> Vec<String> {
        names_in(Namespace::Storage, site, occurrence)
    }
}
