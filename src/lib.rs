#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(
    test,
    allow(clippy::useless_vec, clippy::uninlined_format_args, clippy::too_many_lines)
)]
#![allow(clippy::module_name_repetitions)]
//
// Strategic lint exceptions - these are allowed project-wide for pragmatic reasons:
//
// Documentation lints: store actions share one error type and mostly fail the
// same way, so per-function error sections would repeat the module docs.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Style: store actions pass ids and filters around by value on purpose.
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)] // Builder patterns don't need must_use on every method
#![allow(clippy::struct_excessive_bools)] // Permission summaries are a bool per code
#![allow(clippy::manual_let_else)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::similar_names)]
// e.g., bucket_id, object_id, user_id are intentionally similar
#![allow(clippy::implicit_hasher)]
#![allow(clippy::len_without_is_empty)]

//! Reconciliation core for the BCBox object storage front end.
//!
//! The crate keeps local caches of COMS buckets, objects, permissions and
//! versions consistent with what the server returns:
//!
//! - [`cache`] merges a scoped fetch into a cached collection,
//! - [`projection`] turns grant rows into one summary per user,
//! - [`loading`] brackets actions with a busy counter and error reporting,
//! - [`batch`] splits long id lists to keep request URLs bounded,
//! - [`store`] wires them together over a [`client::ComsClient`].

/// The bcbox-core crate version (matches `Cargo.toml`).
pub const BCBOX_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod batch;
pub mod cache;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod loading;
pub mod notify;
pub mod projection;
pub mod store;
pub mod types;

pub use batch::{UrlBudget, batched_search};
pub use cache::{CachedCollection, MergeStats, merge, partition};
pub use client::{ComsClient, HttpComsClient};
pub use config::{AppConfig, ClientConfig, ClientConfigBuilder, ComsConfig, OidcConfig};
pub use constants::*;
pub use error::{BcboxError, Result};
pub use loading::{
    ErrorPolicy, LoadingCounter, LoadingSignal, LoadingToken, reported, with_loading,
};
pub use notify::{Notification, NotificationLog, Notifier, Severity, TracingNotifier};
pub use projection::{distinct_user_ids, has_permission, project};
pub use store::{
    BucketStore, ConfigStore, ObjectStore, PermissionStore, StoreContext, TagStore, UserStore,
    VersionStore,
};
pub use types::{
    AuditFields, Bucket, BucketCreate, BucketCreateBuilder, BucketPermission,
    BucketPermissionSearch, BucketSearch, BucketUpdate, CosObject, IdentityProvider, KeyValue,
    Metadata, MetadataSearch, ObjectPermission, ObjectPermissionSearch, ObjectSearch, Permission,
    PermissionAssignment, PermissionGrant, QueryPairs, Resource, SearchFilter, SearchScope,
    Tagging, TaggingSearch, User, UserPermissionSummary, UserSearch, Version,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_manifest() {
        assert_eq!(BCBOX_CORE_VERSION, env!("CARGO_PKG_VERSION"));
        assert!(!BCBOX_CORE_VERSION.is_empty());
    }
}
