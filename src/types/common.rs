use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ownership and audit columns COMS attaches to every managed record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuditFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A bucket or object managed through COMS.
pub trait Resource {
    /// Opaque identifier, unique within its collection.
    fn resource_id(&self) -> &str;

    fn is_active(&self) -> bool;

    fn audit(&self) -> &AuditFields;
}

/// `serde` default for `active` flags, which COMS omits on freshly created rows.
pub(crate) fn default_true() -> bool {
    true
}
