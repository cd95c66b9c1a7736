//! Bucket records and the payloads used to create or edit them.

use serde::{Deserialize, Serialize};

use super::common::{AuditFields, Resource, default_true};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub bucket_id: String,
    /// Display name chosen by the user.
    pub bucket_name: String,
    /// Physical bucket name on the storage endpoint.
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub endpoint: String,
    /// Key prefix inside the physical bucket.
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl Resource for Bucket {
    fn resource_id(&self) -> &str {
        &self.bucket_id
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }
}

/// Body of `PUT /bucket`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BucketCreate {
    pub bucket_name: String,
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl BucketCreate {
    #[must_use]
    pub fn builder() -> BucketCreateBuilder {
        BucketCreateBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BucketCreateBuilder {
    inner: BucketCreate,
}

impl BucketCreateBuilder {
    pub fn bucket_name<S: Into<String>>(mut self, name: S) -> Self {
        self.inner.bucket_name = name.into();
        self
    }

    pub fn bucket<S: Into<String>>(mut self, bucket: S) -> Self {
        self.inner.bucket = bucket.into();
        self
    }

    pub fn endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.inner.endpoint = endpoint.into();
        self
    }

    pub fn credentials<A, S>(mut self, access_key_id: A, secret: S) -> Self
    where
        A: Into<String>,
        S: Into<String>,
    {
        self.inner.access_key_id = access_key_id.into();
        self.inner.secret_access_key = secret.into();
        self
    }

    pub fn key<S: Into<String>>(mut self, key: S) -> Self {
        self.inner.key = Some(key.into());
        self
    }

    pub fn region<S: Into<String>>(mut self, region: S) -> Self {
        self.inner.region = Some(region.into());
        self
    }

    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.inner.active = Some(active);
        self
    }

    #[must_use]
    pub fn build(self) -> BucketCreate {
        self.inner
    }
}

/// Body of `PATCH /bucket/{bucketId}`. Absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BucketUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}
