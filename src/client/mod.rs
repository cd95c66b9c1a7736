//! Boundary to the COMS API.
//!
//! Stores only talk to [`ComsClient`]; [`HttpComsClient`] is the production
//! implementation and tests substitute in-memory fakes.

mod http;

use async_trait::async_trait;

pub use http::HttpComsClient;

use crate::error::Result;
use crate::types::{
    Bucket, BucketCreate, BucketPermission, BucketPermissionSearch, BucketSearch, BucketUpdate,
    CosObject, Metadata, MetadataSearch, ObjectPermission, ObjectPermissionSearch, ObjectSearch,
    Permission, PermissionAssignment, Tagging, TaggingSearch, User, UserSearch, Version,
};

#[async_trait]
pub trait ComsClient: Send + Sync {
    async fn search_buckets(&self, search: &BucketSearch) -> Result<Vec<Bucket>>;

    async fn create_bucket(&self, body: &BucketCreate) -> Result<Bucket>;

    async fn update_bucket(&self, bucket_id: &str, body: &BucketUpdate) -> Result<Bucket>;

    async fn delete_bucket(&self, bucket_id: &str) -> Result<()>;

    async fn search_objects(&self, search: &ObjectSearch) -> Result<Vec<CosObject>>;

    /// Delete an object, or only one of its versions when `version_id` is set.
    async fn delete_object(&self, object_id: &str, version_id: Option<&str>) -> Result<()>;

    async fn set_object_public(&self, object_id: &str, public: bool) -> Result<()>;

    async fn search_bucket_permissions(
        &self,
        search: &BucketPermissionSearch,
    ) -> Result<Vec<BucketPermission>>;

    async fn add_bucket_permissions(
        &self,
        bucket_id: &str,
        assignments: &[PermissionAssignment],
    ) -> Result<Vec<BucketPermission>>;

    async fn delete_bucket_permission(
        &self,
        bucket_id: &str,
        user_id: &str,
        code: Permission,
    ) -> Result<()>;

    async fn search_object_permissions(
        &self,
        search: &ObjectPermissionSearch,
    ) -> Result<Vec<ObjectPermission>>;

    async fn add_object_permissions(
        &self,
        object_id: &str,
        assignments: &[PermissionAssignment],
    ) -> Result<Vec<ObjectPermission>>;

    async fn delete_object_permission(
        &self,
        object_id: &str,
        user_id: &str,
        code: Permission,
    ) -> Result<()>;

    async fn search_users(&self, search: &UserSearch) -> Result<Vec<User>>;

    async fn list_versions(&self, object_id: &str) -> Result<Vec<Version>>;

    async fn search_tagging(&self, search: &TaggingSearch) -> Result<Vec<Tagging>>;

    async fn search_metadata(&self, search: &MetadataSearch) -> Result<Vec<Metadata>>;
}
