//! Integration tests for the state stores.
//! Tests: scoped merges, loading balance, error policy, sharing actions, races

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bcbox_core::{
    AuditFields, BcboxError, Bucket, BucketCreate, BucketPermission, BucketPermissionSearch,
    BucketSearch, BucketStore, BucketUpdate, ComsClient, CosObject, IdentityProvider, Metadata,
    MetadataSearch, NotificationLog, ObjectPermission, ObjectPermissionSearch, ObjectSearch,
    ObjectStore, Permission, PermissionAssignment, PermissionStore, Result, SearchScope,
    StoreContext, TagStore, Tagging, TaggingSearch, UrlBudget, User, UserSearch, UserStore,
    Version, VersionStore,
};
use bcbox_core::types::KeyValue;

/// In-memory COMS that filters with the same scopes the stores merge by.
#[derive(Default)]
struct FakeComs {
    buckets: Mutex<Vec<Bucket>>,
    objects: Mutex<Vec<CosObject>>,
    bucket_perms: Mutex<Vec<BucketPermission>>,
    object_perms: Mutex<Vec<ObjectPermission>>,
    users: Mutex<Vec<User>>,
    versions: Mutex<Vec<Version>>,
    tagging: Mutex<Vec<Tagging>>,
    metadata: Mutex<Vec<Metadata>>,
    /// Scripted `(delay, response)` pairs consumed by object searches.
    object_script: Mutex<VecDeque<(Duration, Vec<CosObject>)>>,
    fail: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakeComs {
    fn record(&self, call: &str) -> Result<()> {
        self.calls.lock().unwrap().push(call.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(BcboxError::Transport {
                message: format!("{call} returned 503 Service Unavailable"),
                status: Some(503),
            });
        }
        Ok(())
    }

    fn calls(&self, call: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| *entry == call)
            .count()
    }

    fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

fn filtered<T: Clone, S: SearchScope<T>>(rows: &Mutex<Vec<T>>, search: &S) -> Vec<T> {
    rows.lock()
        .unwrap()
        .iter()
        .filter(|row| search.matches(row))
        .cloned()
        .collect()
}

#[async_trait]
impl ComsClient for FakeComs {
    async fn search_buckets(&self, search: &BucketSearch) -> Result<Vec<Bucket>> {
        self.record("search_buckets")?;
        Ok(filtered(&self.buckets, search))
    }

    async fn create_bucket(&self, body: &BucketCreate) -> Result<Bucket> {
        self.record("create_bucket")?;
        let created = bucket(&format!("b-{}", body.bucket_name), &body.bucket_name);
        self.buckets.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_bucket(&self, bucket_id: &str, body: &BucketUpdate) -> Result<Bucket> {
        self.record("update_bucket")?;
        let mut buckets = self.buckets.lock().unwrap();
        let found = buckets
            .iter_mut()
            .find(|bucket| bucket.bucket_id == bucket_id)
            .ok_or_else(|| BcboxError::Transport {
                message: "404 Not Found".to_string(),
                status: Some(404),
            })?;
        if let Some(name) = &body.bucket_name {
            found.bucket_name = name.clone();
        }
        Ok(found.clone())
    }

    async fn delete_bucket(&self, bucket_id: &str) -> Result<()> {
        self.record("delete_bucket")?;
        self.buckets
            .lock()
            .unwrap()
            .retain(|bucket| bucket.bucket_id != bucket_id);
        Ok(())
    }

    async fn search_objects(&self, search: &ObjectSearch) -> Result<Vec<CosObject>> {
        self.record("search_objects")?;
        let scripted = self.object_script.lock().unwrap().pop_front();
        if let Some((delay, response)) = scripted {
            tokio::time::sleep(delay).await;
            return Ok(response);
        }
        Ok(filtered(&self.objects, search))
    }

    async fn delete_object(&self, object_id: &str, version_id: Option<&str>) -> Result<()> {
        self.record("delete_object")?;
        if version_id.is_none() {
            self.objects
                .lock()
                .unwrap()
                .retain(|object| object.id != object_id);
        }
        Ok(())
    }

    async fn set_object_public(&self, object_id: &str, public: bool) -> Result<()> {
        self.record("set_object_public")?;
        for object in self.objects.lock().unwrap().iter_mut() {
            if object.id == object_id {
                object.public = public;
            }
        }
        Ok(())
    }

    async fn search_bucket_permissions(
        &self,
        search: &BucketPermissionSearch,
    ) -> Result<Vec<BucketPermission>> {
        self.record("search_bucket_permissions")?;
        Ok(filtered(&self.bucket_perms, search))
    }

    async fn add_bucket_permissions(
        &self,
        bucket_id: &str,
        assignments: &[PermissionAssignment],
    ) -> Result<Vec<BucketPermission>> {
        self.record("add_bucket_permissions")?;
        let rows: Vec<BucketPermission> = assignments
            .iter()
            .map(|assignment| bucket_grant(bucket_id, &assignment.user_id, assignment.perm_code))
            .collect();
        self.bucket_perms.lock().unwrap().extend(rows.clone());
        Ok(rows)
    }

    async fn delete_bucket_permission(
        &self,
        bucket_id: &str,
        user_id: &str,
        code: Permission,
    ) -> Result<()> {
        self.record("delete_bucket_permission")?;
        self.bucket_perms.lock().unwrap().retain(|row| {
            !(row.bucket_id == bucket_id && row.user_id == user_id && row.perm_code == code)
        });
        Ok(())
    }

    async fn search_object_permissions(
        &self,
        search: &ObjectPermissionSearch,
    ) -> Result<Vec<ObjectPermission>> {
        self.record("search_object_permissions")?;
        Ok(filtered(&self.object_perms, search))
    }

    async fn add_object_permissions(
        &self,
        object_id: &str,
        assignments: &[PermissionAssignment],
    ) -> Result<Vec<ObjectPermission>> {
        self.record("add_object_permissions")?;
        let rows: Vec<ObjectPermission> = assignments
            .iter()
            .map(|assignment| object_grant(object_id, &assignment.user_id, assignment.perm_code))
            .collect();
        self.object_perms.lock().unwrap().extend(rows.clone());
        Ok(rows)
    }

    async fn delete_object_permission(
        &self,
        object_id: &str,
        user_id: &str,
        code: Permission,
    ) -> Result<()> {
        self.record("delete_object_permission")?;
        self.object_perms.lock().unwrap().retain(|row| {
            !(row.object_id == object_id && row.user_id == user_id && row.perm_code == code)
        });
        Ok(())
    }

    async fn search_users(&self, search: &UserSearch) -> Result<Vec<User>> {
        self.record("search_users")?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|user| search.user_ids.is_empty() || search.user_ids.contains(&user.user_id))
            .cloned()
            .collect())
    }

    async fn list_versions(&self, object_id: &str) -> Result<Vec<Version>> {
        self.record("list_versions")?;
        Ok(self
            .versions
            .lock()
            .unwrap()
            .iter()
            .filter(|version| version.object_id == object_id)
            .cloned()
            .collect())
    }

    async fn search_tagging(&self, search: &TaggingSearch) -> Result<Vec<Tagging>> {
        self.record("search_tagging")?;
        Ok(filtered(&self.tagging, search))
    }

    async fn search_metadata(&self, search: &MetadataSearch) -> Result<Vec<Metadata>> {
        self.record("search_metadata")?;
        Ok(filtered(&self.metadata, search))
    }
}

fn bucket(id: &str, name: &str) -> Bucket {
    Bucket {
        bucket_id: id.to_string(),
        bucket_name: name.to_string(),
        bucket: "bcbox-test".to_string(),
        endpoint: "https://s3.example".to_string(),
        key: format!("{name}/"),
        region: None,
        active: true,
        audit: AuditFields::default(),
    }
}

fn object(id: &str, bucket_id: &str) -> CosObject {
    CosObject {
        id: id.to_string(),
        bucket_id: Some(bucket_id.to_string()),
        name: format!("{id}.pdf"),
        path: format!("{bucket_id}/{id}.pdf"),
        public: false,
        active: true,
        audit: AuditFields::default(),
    }
}

fn bucket_grant(bucket_id: &str, user_id: &str, code: Permission) -> BucketPermission {
    BucketPermission {
        id: format!("{bucket_id}-{user_id}-{code}"),
        bucket_id: bucket_id.to_string(),
        user_id: user_id.to_string(),
        perm_code: code,
        audit: AuditFields::default(),
    }
}

fn object_grant(object_id: &str, user_id: &str, code: Permission) -> ObjectPermission {
    ObjectPermission {
        id: format!("{object_id}-{user_id}-{code}"),
        object_id: object_id.to_string(),
        user_id: user_id.to_string(),
        perm_code: code,
        audit: AuditFields::default(),
    }
}

fn user(id: &str, idp: Option<&str>, name: &str) -> User {
    User {
        user_id: id.to_string(),
        identity_id: Some(format!("{id}-identity")),
        idp: idp.map(str::to_string),
        username: None,
        email: None,
        first_name: None,
        last_name: None,
        full_name: name.to_string(),
        active: true,
        audit: AuditFields::default(),
    }
}

fn version(object_id: &str, version_id: &str, is_latest: bool) -> Version {
    Version {
        id: format!("{object_id}-{version_id}"),
        version_id: Some(version_id.to_string()),
        object_id: object_id.to_string(),
        mime_type: Some("application/pdf".to_string()),
        delete_marker: false,
        is_latest,
        audit: AuditFields::default(),
    }
}

fn idir() -> IdentityProvider {
    IdentityProvider {
        idp: "idir".to_string(),
        name: "IDIR".to_string(),
        elevated_rights: true,
        searchable: true,
        identity_key: None,
        login_hint: None,
    }
}

struct Harness {
    coms: Arc<FakeComs>,
    log: Arc<NotificationLog>,
    ctx: StoreContext,
}

fn harness() -> Harness {
    let coms = Arc::new(FakeComs::default());
    let log = Arc::new(NotificationLog::new());
    let ctx = StoreContext::new(coms.clone(), log.clone());
    Harness { coms, log, ctx }
}

fn ids(objects: &[CosObject]) -> Vec<&str> {
    objects.iter().map(|object| object.id.as_str()).collect()
}

/// Fetching bucket 000 keeps an object cached from bucket 999.
#[tokio::test]
async fn scoped_object_fetch_keeps_other_buckets() {
    let h = harness();
    h.coms
        .objects
        .lock()
        .unwrap()
        .push(object("o-999", "999"));
    let store = ObjectStore::new(h.ctx.clone());
    store
        .fetch_objects(ObjectSearch::in_buckets(["999"]))
        .await
        .unwrap();
    h.coms
        .objects
        .lock()
        .unwrap()
        .extend([object("o-000a", "000"), object("o-000b", "000")]);

    let fetched = store
        .fetch_objects(ObjectSearch::in_buckets(["000"]))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(fetched.len(), 2);
    assert_eq!(ids(&store.objects()), vec!["o-999", "o-000a", "o-000b"]);
    assert_eq!(ids(&store.objects_in_bucket("000")), vec!["o-000a", "o-000b"]);
    assert!(!store.loading().is_loading());
}

#[tokio::test]
async fn refetching_a_scope_replaces_it_without_duplicates() {
    let h = harness();
    h.coms
        .objects
        .lock()
        .unwrap()
        .extend([object("o-1", "000"), object("o-2", "000")]);
    let store = ObjectStore::new(h.ctx.clone());
    store
        .fetch_objects(ObjectSearch::in_buckets(["000"]))
        .await
        .unwrap();
    h.coms
        .objects
        .lock()
        .unwrap()
        .retain(|object| object.id != "o-1");

    store
        .fetch_objects(ObjectSearch::in_buckets(["000"]))
        .await
        .unwrap();

    assert_eq!(ids(&store.objects()), vec!["o-2"]);
}

#[tokio::test]
async fn partial_name_search_replaces_matching_cached_objects() {
    let h = harness();
    h.coms
        .objects
        .lock()
        .unwrap()
        .extend([object("report-1", "000"), object("notes", "000")]);
    let store = ObjectStore::new(h.ctx.clone());
    store
        .fetch_objects(ObjectSearch::in_buckets(["000"]))
        .await
        .unwrap();

    let search = ObjectSearch {
        name: Some("REPORT".to_string()),
        ..ObjectSearch::in_buckets(["000"])
    };
    store.fetch_objects(search).await.unwrap();

    assert_eq!(ids(&store.objects()), vec!["notes", "report-1"]);
}

#[tokio::test]
async fn failed_read_is_reported_and_leaves_cache_alone() {
    let h = harness();
    h.coms.objects.lock().unwrap().push(object("o-1", "000"));
    let store = ObjectStore::new(h.ctx.clone());
    store.fetch_objects(ObjectSearch::default()).await.unwrap();
    h.coms.set_failing(true);

    let out = store.fetch_objects(ObjectSearch::default()).await.unwrap();

    assert!(out.is_none());
    assert_eq!(ids(&store.objects()), vec!["o-1"]);
    assert_eq!(store.loading().count(), 0);
    let notes = h.log.drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].summary, "Error fetching objects");
    assert!(notes[0].detail.contains("503"));
}

#[tokio::test]
async fn failed_mutation_is_reported_and_returned() {
    let h = harness();
    h.coms.buckets.lock().unwrap().push(bucket("b-1", "docs"));
    let store = BucketStore::new(h.ctx.clone());
    store.fetch_buckets(BucketSearch::default()).await.unwrap();
    h.coms.set_failing(true);

    let err = store.delete_bucket("b-1").await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert!(store.find_bucket_by_id("b-1").is_some());
    assert_eq!(store.loading().count(), 0);
    assert_eq!(h.log.len(), 1);
}

#[tokio::test]
async fn bucket_lifecycle_updates_cache() {
    let h = harness();
    let store = BucketStore::new(h.ctx.clone());

    let created = store
        .create_bucket(
            &BucketCreate::builder()
                .bucket_name("reports")
                .bucket("bcbox-test")
                .endpoint("https://s3.example")
                .credentials("key-id", "secret")
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(created.bucket_id, "b-reports");
    assert_eq!(store.buckets().len(), 1);

    store
        .update_bucket(
            "b-reports",
            &BucketUpdate {
                bucket_name: Some("annual reports".to_string()),
                ..BucketUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        store.find_bucket_by_id("b-reports").unwrap().bucket_name,
        "annual reports"
    );
    assert_eq!(store.buckets().len(), 1);

    store.delete_bucket("b-reports").await.unwrap();
    assert!(store.buckets().is_empty());
    assert!(h.log.is_empty());
}

#[tokio::test]
async fn buckets_for_user_follow_their_grants() {
    let h = harness();
    h.coms.buckets.lock().unwrap().extend([
        bucket("b-1", "one"),
        bucket("b-2", "two"),
        bucket("b-3", "three"),
    ]);
    h.coms.bucket_perms.lock().unwrap().extend([
        bucket_grant("b-1", "u1", Permission::Read),
        bucket_grant("b-1", "u1", Permission::Update),
        bucket_grant("b-3", "u1", Permission::Read),
        bucket_grant("b-2", "u2", Permission::Manage),
    ]);
    let buckets = BucketStore::new(h.ctx.clone());
    let permissions = PermissionStore::new(h.ctx.clone());

    let found = buckets
        .fetch_buckets_for_user("u1", &permissions)
        .await
        .unwrap()
        .unwrap();

    let mut found_ids: Vec<&str> = found.iter().map(|b| b.bucket_id.as_str()).collect();
    found_ids.sort_unstable();
    assert_eq!(found_ids, vec!["b-1", "b-3"]);
    assert!(permissions.is_bucket_action_allowed("b-1", "u1", Permission::Update));

    let none = buckets
        .fetch_buckets_for_user("nobody", &permissions)
        .await
        .unwrap()
        .unwrap();
    assert!(none.is_empty());
    assert_eq!(h.coms.calls("search_buckets"), 1);
}

#[tokio::test]
async fn sharing_dialog_projects_grants_per_user() {
    let h = harness();
    h.coms.bucket_perms.lock().unwrap().extend([
        bucket_grant("b-1", "u1", Permission::Read),
        bucket_grant("b-1", "u1", Permission::Update),
        bucket_grant("b-1", "svc", Permission::Manage),
        bucket_grant("b-1", "gone", Permission::Read),
        bucket_grant("b-2", "u1", Permission::Manage),
    ]);
    h.coms.users.lock().unwrap().extend([
        user("u1", Some("idir"), "A B"),
        user("svc", None, "Service Account"),
    ]);
    let store = PermissionStore::new(h.ctx.clone());

    let summaries = store
        .map_bucket_to_user_permissions("b-1", &[idir()])
        .await
        .unwrap()
        .unwrap();

    assert_eq!(summaries.len(), 1);
    let row = &summaries[0];
    assert_eq!(row.user_id, "u1");
    assert_eq!(row.idp_name.as_deref(), Some("IDIR"));
    assert!(row.read && row.update);
    assert!(!row.manage);
    assert_eq!(store.bucket_user_permissions(), summaries);
    assert_eq!(store.bucket_permissions().len(), 4);
}

#[tokio::test]
async fn grant_holder_lookup_is_batched() {
    let h = harness();
    let holders: Vec<String> = (0..5).map(|n| format!("u{n}")).collect();
    for holder in &holders {
        h.coms
            .object_perms
            .lock()
            .unwrap()
            .push(object_grant("o-1", holder, Permission::Read));
        h.coms
            .users
            .lock()
            .unwrap()
            .push(user(holder, Some("idir"), holder));
    }
    // Two ids per request.
    let ctx = h.ctx.clone().with_budget(UrlBudget::new(30, 10, 10));
    let store = PermissionStore::new(ctx);

    let summaries = store
        .map_object_to_user_permissions("o-1", &[idir()])
        .await
        .unwrap()
        .unwrap();

    assert_eq!(h.coms.calls("search_users"), 3);
    let found: Vec<String> = summaries.into_iter().map(|row| row.user_id).collect();
    assert_eq!(found, holders);
}

#[tokio::test]
async fn exhausted_budget_fails_loudly_before_any_request() {
    let h = harness();
    let ctx = h.ctx.clone().with_budget(UrlBudget::new(10, 20, 5));
    let store = ObjectStore::new(ctx);

    let err = store
        .fetch_objects(ObjectSearch::by_ids(["o-1", "o-2"]))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "configuration");
    assert_eq!(h.coms.calls("search_objects"), 0);
    assert!(h.log.is_empty());
    assert_eq!(store.loading().count(), 0);
}

#[tokio::test]
async fn add_and_remove_bucket_user() {
    let h = harness();
    h.coms
        .bucket_perms
        .lock()
        .unwrap()
        .push(bucket_grant("b-1", "owner", Permission::Manage));
    h.coms.users.lock().unwrap().extend([
        user("owner", Some("idir"), "Owner"),
        user("u1", Some("idir"), "A B"),
    ]);
    let store = PermissionStore::new(h.ctx.clone());
    store
        .map_bucket_to_user_permissions("b-1", &[idir()])
        .await
        .unwrap();

    store
        .add_bucket_user("b-1", "u1", &[Permission::Read, Permission::Update])
        .await
        .unwrap();
    assert!(store.is_bucket_action_allowed("b-1", "u1", Permission::Update));
    assert!(!store.is_bucket_action_allowed("b-1", "u1", Permission::Delete));

    store.remove_bucket_user("b-1", "u1").await.unwrap();

    assert_eq!(h.coms.calls("delete_bucket_permission"), Permission::ALL.len());
    assert!(!store.is_bucket_action_allowed("b-1", "u1", Permission::Read));
    assert!(store.is_bucket_action_allowed("b-1", "owner", Permission::Manage));
    assert!(
        h.coms
            .bucket_perms
            .lock()
            .unwrap()
            .iter()
            .all(|row| row.user_id != "u1")
    );
}

#[tokio::test]
async fn removing_a_listed_user_drops_their_summary() {
    let h = harness();
    h.coms.object_perms.lock().unwrap().extend([
        object_grant("o-1", "u1", Permission::Read),
        object_grant("o-1", "u2", Permission::Manage),
    ]);
    h.coms.users.lock().unwrap().extend([
        user("u1", Some("idir"), "A B"),
        user("u2", Some("idir"), "C D"),
    ]);
    let store = PermissionStore::new(h.ctx.clone());
    store
        .map_object_to_user_permissions("o-1", &[idir()])
        .await
        .unwrap();

    store.remove_object_user("o-1", "u1").await.unwrap();

    let remaining: Vec<String> = store
        .object_user_permissions()
        .into_iter()
        .map(|row| row.user_id)
        .collect();
    assert_eq!(remaining, vec!["u2"]);
    assert_eq!(h.coms.calls("delete_object_permission"), Permission::ALL.len());
}

#[tokio::test]
async fn remove_revokes_grants_missing_from_the_cache() {
    let h = harness();
    h.coms.bucket_perms.lock().unwrap().extend([
        bucket_grant("b-1", "owner", Permission::Manage),
        bucket_grant("b-1", "u1", Permission::Read),
    ]);
    h.coms.users.lock().unwrap().extend([
        user("owner", Some("idir"), "Owner"),
        user("u1", Some("idir"), "A B"),
    ]);
    let store = PermissionStore::new(h.ctx.clone());
    store
        .map_bucket_to_user_permissions("b-1", &[idir()])
        .await
        .unwrap();
    // Granted elsewhere after the dialog was mapped.
    h.coms
        .bucket_perms
        .lock()
        .unwrap()
        .push(bucket_grant("b-1", "u1", Permission::Manage));

    store.remove_bucket_user("b-1", "u1").await.unwrap();

    let left: Vec<Permission> = h
        .coms
        .bucket_perms
        .lock()
        .unwrap()
        .iter()
        .filter(|row| row.user_id == "u1")
        .map(|row| row.perm_code)
        .collect();
    assert!(left.is_empty(), "still granted: {left:?}");
    let listed: Vec<String> = store
        .bucket_user_permissions()
        .into_iter()
        .map(|row| row.user_id)
        .collect();
    assert_eq!(listed, vec!["owner"]);
}

#[tokio::test]
async fn newly_shared_user_joins_the_mapped_dialog() {
    let h = harness();
    h.coms
        .bucket_perms
        .lock()
        .unwrap()
        .push(bucket_grant("b-1", "owner", Permission::Manage));
    h.coms.users.lock().unwrap().extend([
        user("owner", Some("idir"), "Owner"),
        user("u1", Some("idir"), "A B"),
    ]);
    let store = PermissionStore::new(h.ctx.clone());
    store
        .map_bucket_to_user_permissions("b-1", &[idir()])
        .await
        .unwrap();

    store
        .add_bucket_user("b-1", "u1", &[Permission::Read])
        .await
        .unwrap();

    let summaries = store.bucket_user_permissions();
    let listed: Vec<&str> = summaries.iter().map(|row| row.user_id.as_str()).collect();
    assert_eq!(listed, vec!["owner", "u1"]);
    let added = &summaries[1];
    assert!(added.read && !added.manage);
    assert_eq!(added.idp_name.as_deref(), Some("IDIR"));
    assert_eq!(store.loading().count(), 0);
    assert!(h.log.is_empty());
}

#[tokio::test]
async fn sharing_another_object_leaves_the_dialog_alone() {
    let h = harness();
    h.coms
        .object_perms
        .lock()
        .unwrap()
        .push(object_grant("o-1", "owner", Permission::Manage));
    h.coms.users.lock().unwrap().extend([
        user("owner", Some("idir"), "Owner"),
        user("u1", Some("idir"), "A B"),
    ]);
    let store = PermissionStore::new(h.ctx.clone());
    store
        .map_object_to_user_permissions("o-1", &[idir()])
        .await
        .unwrap();

    store
        .add_object_user("o-2", "u1", &[Permission::Read])
        .await
        .unwrap();

    assert_eq!(store.object_user_permissions().len(), 1);
    assert_eq!(h.coms.calls("search_users"), 1);
    assert!(store.is_object_action_allowed("o-2", "u1", Permission::Read, None));
}

#[tokio::test]
async fn empty_assignment_is_rejected_without_a_request() {
    let h = harness();
    let store = PermissionStore::new(h.ctx.clone());

    let err = store.add_object_user("o-1", "u1", &[]).await.unwrap_err();

    assert_eq!(err.code(), "invalid_input");
    assert_eq!(h.coms.calls("add_object_permissions"), 0);
}

#[tokio::test]
async fn object_action_falls_back_to_bucket_grant() {
    let h = harness();
    h.coms
        .bucket_perms
        .lock()
        .unwrap()
        .push(bucket_grant("b-1", "u1", Permission::Read));
    h.coms
        .object_perms
        .lock()
        .unwrap()
        .push(object_grant("o-2", "u1", Permission::Update));
    let store = PermissionStore::new(h.ctx.clone());
    store
        .fetch_bucket_permissions(BucketPermissionSearch::for_user("u1"))
        .await
        .unwrap();
    store
        .fetch_object_permissions(ObjectPermissionSearch {
            user_ids: vec!["u1".to_string()],
            ..ObjectPermissionSearch::default()
        })
        .await
        .unwrap();

    assert!(store.is_object_action_allowed("o-1", "u1", Permission::Read, Some("b-1")));
    assert!(!store.is_object_action_allowed("o-1", "u1", Permission::Read, None));
    assert!(store.is_object_action_allowed("o-2", "u1", Permission::Update, None));
    assert!(!store.is_object_action_allowed("o-2", "u1", Permission::Delete, Some("b-1")));
}

#[tokio::test]
async fn public_toggle_and_delete_refresh_objects() {
    let h = harness();
    h.coms
        .objects
        .lock()
        .unwrap()
        .extend([object("o-1", "000"), object("o-2", "000")]);
    let store = ObjectStore::new(h.ctx.clone());
    store.fetch_objects(ObjectSearch::default()).await.unwrap();

    store.set_object_public("o-1", true).await.unwrap();
    assert!(store.find_object_by_id("o-1").unwrap().public);

    store.delete_object("o-2", Some("v-1")).await.unwrap();
    assert!(store.find_object_by_id("o-2").is_some());
    store.delete_object("o-2", None).await.unwrap();
    assert!(store.find_object_by_id("o-2").is_none());
    assert_eq!(store.objects().len(), 1);
}

#[tokio::test]
async fn versions_tags_and_metadata_are_cached_per_object() {
    let h = harness();
    h.coms.versions.lock().unwrap().extend([
        version("o-1", "v-1", false),
        version("o-1", "v-2", true),
        version("o-2", "v-9", true),
    ]);
    h.coms.tagging.lock().unwrap().push(Tagging {
        object_id: "o-1".to_string(),
        tag_set: vec![KeyValue::new("project", "bcbox")],
    });
    h.coms.metadata.lock().unwrap().push(Metadata {
        object_id: "o-1".to_string(),
        metadata: vec![KeyValue::new("coms-name", "report.pdf")],
    });
    let versions = VersionStore::new(h.ctx.clone());
    let tags = TagStore::new(h.ctx.clone());

    versions.fetch_versions("o-1").await.unwrap();
    versions.fetch_versions("o-2").await.unwrap();
    versions
        .fetch_metadata(MetadataSearch::by_ids(["o-1", "o-2"]))
        .await
        .unwrap();
    tags.fetch_tagging(TaggingSearch::by_ids(["o-1"])).await.unwrap();

    assert_eq!(
        versions.find_latest_version_id_by_object_id("o-1").as_deref(),
        Some("v-2")
    );
    assert_eq!(versions.find_versions_by_object_id("o-1").len(), 2);
    assert_eq!(versions.versions().len(), 3);
    assert_eq!(
        versions
            .find_metadata_by_object_id("o-1")
            .unwrap()
            .get("coms-name"),
        Some("report.pdf")
    );
    assert!(versions.find_metadata_by_object_id("o-2").is_none());
    assert_eq!(
        tags.find_tagging_by_object_id("o-1").unwrap().tag_set[0].value,
        "bcbox"
    );
}

#[tokio::test]
async fn user_search_replaces_previous_result() {
    let h = harness();
    h.coms.users.lock().unwrap().extend([
        user("u1", Some("idir"), "A B"),
        user("u2", Some("idir"), "C D"),
    ]);
    let store = UserStore::new(h.ctx.clone());

    store.search_users(&UserSearch::by_ids(["u1", "u2"])).await.unwrap();
    assert_eq!(store.user_search().len(), 2);
    store.search_users(&UserSearch::by_ids(["u2"])).await.unwrap();
    let found: Vec<String> = store.user_search().into_iter().map(|u| u.user_id).collect();
    assert_eq!(found, vec!["u2"]);

    store.clear_search();
    assert!(store.user_search().is_empty());
}

/// Overlapping fetches are not serialized; the later response wins.
#[tokio::test(start_paused = true)]
async fn overlapping_fetches_leave_last_resolved_state() {
    let h = harness();
    let stale = CosObject {
        name: "stale.pdf".to_string(),
        ..object("o-1", "000")
    };
    let fresh = CosObject {
        name: "fresh.pdf".to_string(),
        ..object("o-1", "000")
    };
    h.coms.object_script.lock().unwrap().extend([
        (Duration::from_millis(50), vec![stale]),
        (Duration::from_millis(10), vec![fresh]),
    ]);
    let store = ObjectStore::new(h.ctx.clone());

    let (slow, quick) = tokio::join!(
        store.fetch_objects(ObjectSearch::in_buckets(["000"])),
        store.fetch_objects(ObjectSearch::in_buckets(["000"])),
    );

    assert!(slow.unwrap().is_some());
    assert!(quick.unwrap().is_some());
    let cached = store.objects();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].name, "stale.pdf");
    assert_eq!(store.loading().count(), 0);
}
