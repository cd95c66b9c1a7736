//! Per-user permission summaries for a single resource.
//!
//! Grants come from COMS as one row per `(resource, user, code)`. The UI wants
//! one row per user with a flag per code plus identity provider details, so
//! this module cross-references three collections:
//!
//! - the grant rows,
//! - the directory users resolved for the grant holders,
//! - the identity provider directory from the runtime config.
//!
//! Lookup misses are handled by omission: a grant holder missing from the
//! directory, or a user without an identity, produces no summary, and an
//! unknown provider key leaves the provider fields unset.

use std::collections::{HashMap, HashSet};

use crate::types::{IdentityProvider, Permission, PermissionGrant, User, UserPermissionSummary};

/// Distinct user ids holding at least one grant, in first-seen order.
pub fn distinct_user_ids<G: PermissionGrant>(grants: &[G]) -> Vec<String> {
    let mut seen = HashSet::new();
    grants
        .iter()
        .map(PermissionGrant::user_id)
        .filter(|user_id| seen.insert(*user_id))
        .map(str::to_string)
        .collect()
}

/// Build one summary per resolved user, in directory order.
pub fn project<G: PermissionGrant>(
    grants: &[G],
    users: &[User],
    idps: &[IdentityProvider],
) -> Vec<UserPermissionSummary> {
    let mut held: HashMap<&str, HashSet<Permission>> = HashMap::new();
    for grant in grants {
        held.entry(grant.user_id())
            .or_default()
            .insert(grant.perm_code());
    }
    let providers: HashMap<&str, &IdentityProvider> =
        idps.iter().map(|idp| (idp.idp.as_str(), idp)).collect();

    let mut emitted = HashSet::new();
    let mut summaries = Vec::with_capacity(users.len());
    for user in users {
        let Some(codes) = held.get(user.user_id.as_str()) else {
            continue;
        };
        let Some(idp_key) = user.idp_key() else {
            continue;
        };
        if !emitted.insert(user.user_id.as_str()) {
            continue;
        }
        let provider = providers.get(idp_key);
        let mut summary = UserPermissionSummary {
            user_id: user.user_id.clone(),
            full_name: user.full_name.clone(),
            idp_name: provider.map(|idp| idp.name.clone()),
            elevated_rights: provider.map(|idp| idp.elevated_rights),
            ..UserPermissionSummary::default()
        };
        for code in codes {
            summary.grant(*code);
        }
        summaries.push(summary);
    }
    summaries
}

/// True if any grant gives `user_id` the `code` on `resource_id`.
pub fn has_permission<G: PermissionGrant>(
    grants: &[G],
    resource_id: &str,
    user_id: &str,
    code: Permission,
) -> bool {
    grants.iter().any(|grant| {
        grant.resource_id() == resource_id && grant.user_id() == user_id && grant.perm_code() == code
    })
}
