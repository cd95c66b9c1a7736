//! Directory users and the identity providers they authenticate through.

use serde::{Deserialize, Serialize};

use super::common::{AuditFields, default_true};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<String>,
    /// Key into the identity provider directory. Absent for system users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl User {
    /// Identity provider key, with blank values treated as absent.
    #[must_use]
    pub fn idp_key(&self) -> Option<&str> {
        self.idp
            .as_deref()
            .map(str::trim)
            .filter(|idp| !idp.is_empty())
    }

    #[must_use]
    pub fn has_identity(&self) -> bool {
        self.idp_key().is_some()
    }
}

/// Entry of the identity provider directory carried in the runtime config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProvider {
    pub idp: String,
    /// Display name, e.g. `IDIR`.
    pub name: String,
    #[serde(default)]
    pub elevated_rights: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_hint: Option<String>,
}
