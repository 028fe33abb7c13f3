// Dangerous role-grant detection.
//
// Compares a member's role set before and after an update and reports newly
// added roles whose capability flags grant administrative control. Whether
// the grant is reverted (Premium) or only logged (Free) is the pipeline's
// call, not this detector's.

use super::protection_models::{BypassRoleSet, DangerousMarker, RoleSnapshot};
use std::collections::BTreeSet;

/// Role ids newly added by this update whose permissions hit any of the
/// dangerous markers.
///
/// Members holding a bypass role are exempt entirely. Bypass is checked
/// against the AFTER set: trusted staff granted bypass and a dangerous role
/// in the same update stay exempt.
///
/// Exemption is decided on the target member only. The platform's
/// member-update payload does not carry who performed the grant, so an
/// actor-level exemption cannot be evaluated here; a host with audit-log
/// access has to filter such events before dispatching them.
pub fn added_dangerous_roles(
    before_roles: &[RoleSnapshot],
    after_roles: &[RoleSnapshot],
    markers: &[DangerousMarker],
    bypass_roles: &BypassRoleSet,
) -> BTreeSet<u64> {
    if after_roles.iter().any(|r| bypass_roles.contains(&r.id)) {
        return BTreeSet::new();
    }

    let before_ids: BTreeSet<u64> = before_roles.iter().map(|r| r.id).collect();
    after_roles
        .iter()
        .filter(|r| !before_ids.contains(&r.id))
        .filter(|r| r.permissions.hits_any(markers))
        .map(|r| r.id)
        .collect()
}
