use tracing::debug;

use crate::processor::modifying::{Modifier, ModifyContext};

use super::remove_matching;

pub struct RemoveBreakpoints;

impl RemoveBreakpoints {
    pub const NAME: &'static str = "RemoveBreakpoints";
    pub const DESCRIPTION: &'static str = "Removes all breakpoint actors, enabled or not.";
}

impl Modifier for RemoveBreakpoints {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn modify(&mut self, ctx: &mut ModifyContext<'_>) -> anyhow::Result<()> {
        let removed = remove_matching(ctx, true, |n| n.node_type().breakpoint);
        debug!(removed, "removed breakpoints");
        Ok(())
    }
}
