use serde::{Deserialize, Serialize};

use super::common::{AuditFields, Resource, default_true};

/// An object stored in a COMS-managed bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CosObject {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl CosObject {
    #[must_use]
    pub fn in_bucket(&self, bucket_id: &str) -> bool {
        self.bucket_id.as_deref() == Some(bucket_id)
    }
}

impl Resource for CosObject {
    fn resource_id(&self) -> &str {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }
}
