//! Search filters sent to COMS.
//!
//! Every filter knows how to render itself as query pairs and, for filters
//! whose results are merged into a cache, which cached records fall inside the
//! scope it covers. An empty id list means "no constraint on that field".

use serde::{Deserialize, Serialize};

use super::bucket::Bucket;
use super::object::CosObject;
use super::permission::{BucketPermission, ObjectPermission, Permission};
use super::version::{Metadata, Tagging};

/// Query parameters in request order. Keys repeat for list values.
pub type QueryPairs = Vec<(&'static str, String)>;

/// Bytes the pairs occupy once rendered as `key=value&...` (before escaping).
#[must_use]
pub fn encoded_len(pairs: &[(&'static str, String)]) -> usize {
    pairs.iter().map(|(key, value)| key.len() + value.len() + 2).sum()
}

/// Records covered by a scoped fetch.
pub trait SearchScope<T> {
    fn matches(&self, record: &T) -> bool;
}

/// A search filter with one id list that may need URL-budget batching.
pub trait SearchFilter: Clone {
    fn query_pairs(&self) -> QueryPairs;

    /// The id list that is split across requests.
    fn ids(&self) -> &[String];

    /// Copy of this filter constrained to `ids` instead.
    fn with_ids(&self, ids: Vec<String>) -> Self;

    /// URL bytes taken by every parameter except the batched ids.
    fn fixed_query_len(&self) -> usize {
        encoded_len(&self.with_ids(Vec::new()).query_pairs())
    }
}

fn in_list(list: &[String], value: &str) -> bool {
    list.is_empty() || list.iter().any(|entry| entry == value)
}

/// COMS filters names with a case-insensitive partial match.
fn name_matches(filter: Option<&String>, value: &str) -> bool {
    filter.is_none_or(|filter| value.to_lowercase().contains(&filter.to_lowercase()))
}

fn push_all(pairs: &mut QueryPairs, key: &'static str, values: &[String]) {
    pairs.extend(values.iter().map(|value| (key, value.clone())));
}

fn push_opt<T: ToString>(pairs: &mut QueryPairs, key: &'static str, value: Option<&T>) {
    if let Some(value) = value {
        pairs.push((key, value.to_string()));
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BucketSearch {
    #[serde(default)]
    pub bucket_ids: Vec<String>,
    #[serde(default)]
    pub bucket_name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl BucketSearch {
    pub fn by_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bucket_ids: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl SearchScope<Bucket> for BucketSearch {
    fn matches(&self, bucket: &Bucket) -> bool {
        in_list(&self.bucket_ids, &bucket.bucket_id)
            && name_matches(self.bucket_name.as_ref(), &bucket.bucket_name)
            && self.active.is_none_or(|active| active == bucket.active)
    }
}

impl SearchFilter for BucketSearch {
    fn query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push_all(&mut pairs, "bucketId", &self.bucket_ids);
        push_opt(&mut pairs, "bucketName", self.bucket_name.as_ref());
        push_opt(&mut pairs, "active", self.active.as_ref());
        pairs
    }

    fn ids(&self) -> &[String] {
        &self.bucket_ids
    }

    fn with_ids(&self, ids: Vec<String>) -> Self {
        Self {
            bucket_ids: ids,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSearch {
    #[serde(default)]
    pub object_ids: Vec<String>,
    #[serde(default)]
    pub bucket_ids: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl ObjectSearch {
    pub fn in_buckets<I, S>(bucket_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bucket_ids: bucket_ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn by_ids<I, S>(object_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            object_ids: object_ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl SearchScope<CosObject> for ObjectSearch {
    fn matches(&self, object: &CosObject) -> bool {
        let bucket_ok = self.bucket_ids.is_empty()
            || object
                .bucket_id
                .as_deref()
                .is_some_and(|bucket_id| in_list(&self.bucket_ids, bucket_id));
        in_list(&self.object_ids, &object.id)
            && bucket_ok
            && name_matches(self.name.as_ref(), &object.name)
            && self.public.is_none_or(|public| public == object.public)
            && self.active.is_none_or(|active| active == object.active)
    }
}

impl SearchFilter for ObjectSearch {
    fn query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push_all(&mut pairs, "objectId", &self.object_ids);
        push_all(&mut pairs, "bucketId", &self.bucket_ids);
        push_opt(&mut pairs, "name", self.name.as_ref());
        push_opt(&mut pairs, "public", self.public.as_ref());
        push_opt(&mut pairs, "active", self.active.as_ref());
        pairs
    }

    fn ids(&self) -> &[String] {
        &self.object_ids
    }

    fn with_ids(&self, ids: Vec<String>) -> Self {
        Self {
            object_ids: ids,
            ..self.clone()
        }
    }
}

/// Filter for `GET /permission/bucket`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BucketPermissionSearch {
    #[serde(default)]
    pub bucket_ids: Vec<String>,
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub perm_codes: Vec<Permission>,
    /// Also return buckets where the user only holds object-level grants.
    #[serde(default)]
    pub object_perms: bool,
}

impl BucketPermissionSearch {
    #[must_use]
    pub fn for_bucket(bucket_id: impl Into<String>) -> Self {
        Self {
            bucket_ids: vec![bucket_id.into()],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_ids: vec![user_id.into()],
            ..Self::default()
        }
    }
}

impl SearchScope<BucketPermission> for BucketPermissionSearch {
    fn matches(&self, row: &BucketPermission) -> bool {
        in_list(&self.bucket_ids, &row.bucket_id)
            && in_list(&self.user_ids, &row.user_id)
            && (self.perm_codes.is_empty() || self.perm_codes.contains(&row.perm_code))
    }
}

impl SearchFilter for BucketPermissionSearch {
    fn query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push_all(&mut pairs, "bucketId", &self.bucket_ids);
        push_all(&mut pairs, "userId", &self.user_ids);
        pairs.extend(
            self.perm_codes
                .iter()
                .map(|code| ("permCode", code.as_str().to_string())),
        );
        if self.object_perms {
            pairs.push(("objectPerms", "true".to_string()));
        }
        pairs
    }

    fn ids(&self) -> &[String] {
        &self.bucket_ids
    }

    fn with_ids(&self, ids: Vec<String>) -> Self {
        Self {
            bucket_ids: ids,
            ..self.clone()
        }
    }
}

/// Filter for `GET /permission/object`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPermissionSearch {
    #[serde(default)]
    pub object_ids: Vec<String>,
    #[serde(default)]
    pub bucket_ids: Vec<String>,
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub perm_codes: Vec<Permission>,
    /// Also return objects the user reaches through bucket-level grants.
    #[serde(default)]
    pub bucket_perms: bool,
}

impl ObjectPermissionSearch {
    #[must_use]
    pub fn for_object(object_id: impl Into<String>) -> Self {
        Self {
            object_ids: vec![object_id.into()],
            ..Self::default()
        }
    }
}

impl SearchScope<ObjectPermission> for ObjectPermissionSearch {
    // Object grant rows do not carry their bucket, so `bucket_ids` cannot narrow
    // the cached scope; a bucket-filtered fetch therefore replaces every cached
    // row that matches the remaining criteria.
    fn matches(&self, row: &ObjectPermission) -> bool {
        in_list(&self.object_ids, &row.object_id)
            && in_list(&self.user_ids, &row.user_id)
            && (self.perm_codes.is_empty() || self.perm_codes.contains(&row.perm_code))
    }
}

impl SearchFilter for ObjectPermissionSearch {
    fn query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push_all(&mut pairs, "objectId", &self.object_ids);
        push_all(&mut pairs, "bucketId", &self.bucket_ids);
        push_all(&mut pairs, "userId", &self.user_ids);
        pairs.extend(
            self.perm_codes
                .iter()
                .map(|code| ("permCode", code.as_str().to_string())),
        );
        if self.bucket_perms {
            pairs.push(("bucketPerms", "true".to_string()));
        }
        pairs
    }

    fn ids(&self) -> &[String] {
        &self.object_ids
    }

    fn with_ids(&self, ids: Vec<String>) -> Self {
        Self {
            object_ids: ids,
            ..self.clone()
        }
    }
}

/// Filter for `GET /user`. Results replace the previous search wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserSearch {
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub identity_ids: Vec<String>,
    #[serde(default)]
    pub idp: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-text match against name, username, and email.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl UserSearch {
    pub fn by_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_ids: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl SearchFilter for UserSearch {
    fn query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push_all(&mut pairs, "userId", &self.user_ids);
        push_all(&mut pairs, "identityId", &self.identity_ids);
        push_opt(&mut pairs, "idp", self.idp.as_ref());
        push_opt(&mut pairs, "email", self.email.as_ref());
        push_opt(&mut pairs, "search", self.search.as_ref());
        push_opt(&mut pairs, "active", self.active.as_ref());
        pairs
    }

    fn ids(&self) -> &[String] {
        &self.user_ids
    }

    fn with_ids(&self, ids: Vec<String>) -> Self {
        Self {
            user_ids: ids,
            ..self.clone()
        }
    }
}

/// Filter for `GET /object/tagging`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaggingSearch {
    #[serde(default)]
    pub object_ids: Vec<String>,
}

impl TaggingSearch {
    pub fn by_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            object_ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl SearchScope<Tagging> for TaggingSearch {
    fn matches(&self, tagging: &Tagging) -> bool {
        in_list(&self.object_ids, &tagging.object_id)
    }
}

impl SearchFilter for TaggingSearch {
    fn query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push_all(&mut pairs, "objectId", &self.object_ids);
        pairs
    }

    fn ids(&self) -> &[String] {
        &self.object_ids
    }

    fn with_ids(&self, ids: Vec<String>) -> Self {
        Self { object_ids: ids }
    }
}

/// Filter for `GET /object/metadata`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSearch {
    #[serde(default)]
    pub object_ids: Vec<String>,
}

impl MetadataSearch {
    pub fn by_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            object_ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl SearchScope<Metadata> for MetadataSearch {
    fn matches(&self, metadata: &Metadata) -> bool {
        in_list(&self.object_ids, &metadata.object_id)
    }
}

impl SearchFilter for MetadataSearch {
    fn query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push_all(&mut pairs, "objectId", &self.object_ids);
        pairs
    }

    fn ids(&self) -> &[String] {
        &self.object_ids
    }

    fn with_ids(&self, ids: Vec<String>) -> Self {
        Self { object_ids: ids }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuditFields;

    fn object(id: &str, bucket: Option<&str>) -> CosObject {
        CosObject {
            id: id.to_string(),
            bucket_id: bucket.map(str::to_string),
            name: format!("{id}.txt"),
            path: format!("/{id}.txt"),
            public: false,
            active: true,
            audit: AuditFields::default(),
        }
    }

    #[test]
    fn name_scope_is_a_partial_case_insensitive_match() {
        let search = ObjectSearch {
            name: Some("O-1".into()),
            ..ObjectSearch::default()
        };
        assert!(search.matches(&object("o-1", Some("b"))));
        assert!(search.matches(&object("o-12", Some("b"))));
        assert!(!search.matches(&object("o-2", Some("b"))));
    }

    #[test]
    fn list_filters_render_as_repeated_keys() {
        let search = ObjectSearch {
            object_ids: vec!["a".into(), "b".into()],
            active: Some(true),
            ..ObjectSearch::default()
        };
        assert_eq!(
            search.query_pairs(),
            vec![
                ("objectId", "a".to_string()),
                ("objectId", "b".to_string()),
                ("active", "true".to_string()),
            ]
        );
        assert_eq!(encoded_len(&search.query_pairs()), 11 + 11 + 12);
    }

    #[test]
    fn permission_search_renders_codes_and_flags() {
        let search = BucketPermissionSearch {
            user_ids: vec!["u-1".into()],
            perm_codes: vec![Permission::Read, Permission::Manage],
            object_perms: true,
            ..BucketPermissionSearch::default()
        };
        let pairs = search.query_pairs();
        assert!(pairs.contains(&("permCode", "MANAGE".to_string())));
        assert!(pairs.contains(&("objectPerms", "true".to_string())));
    }

    #[test]
    fn object_scope_by_bucket() {
        let search = ObjectSearch::in_buckets(["000"]);
        assert!(search.matches(&object("o-1", Some("000"))));
        assert!(!search.matches(&object("o-2", Some("999"))));
        assert!(!search.matches(&object("o-3", None)));
        assert!(ObjectSearch::default().matches(&object("o-3", None)));
    }

    #[test]
    fn with_ids_keeps_other_criteria() {
        let search = ObjectSearch {
            object_ids: vec!["a".into(), "b".into(), "c".into()],
            bucket_ids: vec!["000".into()],
            ..ObjectSearch::default()
        };
        let chunk = search.with_ids(vec!["c".into()]);
        assert_eq!(chunk.ids(), ["c".to_string()]);
        assert_eq!(chunk.bucket_ids, vec!["000".to_string()]);
        assert_eq!(search.fixed_query_len(), "bucketId=000&".len());
    }
}
