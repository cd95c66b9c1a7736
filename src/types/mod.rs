//! Typed records exchanged with COMS and the runtime configuration.

pub mod bucket;
pub mod common;
pub mod object;
pub mod permission;
pub mod search;
pub mod user;
pub mod version;

pub use bucket::{Bucket, BucketCreate, BucketCreateBuilder, BucketUpdate};
pub use common::{AuditFields, Resource};
pub use object::CosObject;
pub use permission::{
    BucketPermission, ObjectPermission, Permission, PermissionAssignment, PermissionGrant,
    UserPermissionSummary,
};
pub use search::{
    BucketPermissionSearch, BucketSearch, MetadataSearch, ObjectPermissionSearch, ObjectSearch,
    QueryPairs, SearchFilter, SearchScope, TaggingSearch, UserSearch, encoded_len,
};
pub use user::{IdentityProvider, User};
pub use version::{KeyValue, Metadata, Tagging, Version};
