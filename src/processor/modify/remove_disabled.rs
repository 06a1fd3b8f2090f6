use tracing::debug;

use crate::processor::modifying::{Modifier, ModifyContext};

use super::{prune_empty_groups, remove_matching};

/// Drops disabled actors and their subtrees.
pub struct RemoveDisabledNodes;

impl RemoveDisabledNodes {
    pub const NAME: &'static str = "RemoveDisabledNodes";
    pub const DESCRIPTION: &'static str = "Removes all disabled actors from the flow.";
}

impl Modifier for RemoveDisabledNodes {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn modify(&mut self, ctx: &mut ModifyContext<'_>) -> anyhow::Result<()> {
        let removed = remove_matching(ctx, false, |n| n.node_type().is_actor() && n.is_disabled());
        let pruned = prune_empty_groups(ctx);
        debug!(removed, pruned, "removed disabled nodes");
        Ok(())
    }
}
