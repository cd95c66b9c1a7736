//! Permission codes, grant rows, and the per-user summary derived from them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::common::AuditFields;

/// Permission codes understood by COMS.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permission {
    Create,
    Read,
    Update,
    Delete,
    Manage,
}

impl Permission {
    pub const ALL: [Permission; 5] = [
        Permission::Create,
        Permission::Read,
        Permission::Update,
        Permission::Delete,
        Permission::Manage,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Read => "READ",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Manage => "MANAGE",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(resource, user, code)` grant. Duplicate rows are presence-only.
pub trait PermissionGrant {
    fn resource_id(&self) -> &str;

    fn user_id(&self) -> &str;

    fn perm_code(&self) -> Permission;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BucketPermission {
    /// Row id of the grant itself.
    #[serde(default)]
    pub id: String,
    pub bucket_id: String,
    pub user_id: String,
    pub perm_code: Permission,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl PermissionGrant for BucketPermission {
    fn resource_id(&self) -> &str {
        &self.bucket_id
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn perm_code(&self) -> Permission {
        self.perm_code
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPermission {
    #[serde(default)]
    pub id: String,
    pub object_id: String,
    pub user_id: String,
    pub perm_code: Permission,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl PermissionGrant for ObjectPermission {
    fn resource_id(&self) -> &str {
        &self.object_id
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn perm_code(&self) -> Permission {
        self.perm_code
    }
}

/// One entry of the body sent to `PUT /permission/{bucket|object}/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PermissionAssignment {
    pub user_id: String,
    pub perm_code: Permission,
}

impl PermissionAssignment {
    pub fn new(user_id: impl Into<String>, perm_code: Permission) -> Self {
        Self {
            user_id: user_id.into(),
            perm_code,
        }
    }
}

/// Per-user view of the grants held on one resource.
///
/// `idp_name` and `elevated_rights` stay `None` when the user's identity
/// provider is not in the configured directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserPermissionSummary {
    pub user_id: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idp_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevated_rights: Option<bool>,
    pub create: bool,
    pub read: bool,
    pub update: bool,
    pub delete: bool,
    pub manage: bool,
}

impl UserPermissionSummary {
    #[must_use]
    pub fn has(&self, code: Permission) -> bool {
        match code {
            Permission::Create => self.create,
            Permission::Read => self.read,
            Permission::Update => self.update,
            Permission::Delete => self.delete,
            Permission::Manage => self.manage,
        }
    }

    pub(crate) fn grant(&mut self, code: Permission) {
        match code {
            Permission::Create => self.create = true,
            Permission::Read => self.read = true,
            Permission::Update => self.update = true,
            Permission::Delete => self.delete = true,
            Permission::Manage => self.manage = true,
        }
    }
}
