use std::sync::Arc;

use tracing::debug;

use crate::application::ports::outbound::{NameOwnershipError, NameOwnershipPort};

/// Grants a wallet rights over a world when it owns the world's name
pub struct NamePermissionChecker {
    ownership: Arc<dyn NameOwnershipPort>,
}

impl NamePermissionChecker {
    pub fn new(ownership: Arc<dyn NameOwnershipPort>) -> Self {
        Self { ownership }
    }

    pub async fn check_permission(
        &self,
        address: &str,
        world_name: &str,
    ) -> Result<bool, NameOwnershipError> {
        if world_name.is_empty() {
            return Ok(false);
        }

        let owner = self.ownership.find_owner(world_name).await?;
        let has_permission = owner.is_some_and(|owner| owner.matches(address));

        debug!(world = %world_name, address = %address, has_permission, "Checked name ownership");
        Ok(has_permission)
    }
}
