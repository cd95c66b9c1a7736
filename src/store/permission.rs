use futures::future::try_join_all;
use parking_lot::RwLock;

use super::StoreContext;
use crate::batch::UrlBudget;
use crate::cache::CachedCollection;
use crate::error::{BcboxError, Result};
use crate::loading::LoadingCounter;
use crate::projection::{distinct_user_ids, has_permission, project};
use crate::types::{
    BucketPermission, BucketPermissionSearch, IdentityProvider, ObjectPermission,
    ObjectPermissionSearch, Permission, PermissionAssignment, PermissionGrant, SearchScope, User,
    UserPermissionSummary, UserSearch,
};

/// Summaries for the resource currently shown in a sharing dialog.
#[derive(Debug, Default)]
struct Mapped {
    resource_id: Option<String>,
    users: Vec<UserPermissionSummary>,
    idps: Vec<IdentityProvider>,
}

impl Mapped {
    fn is_for(&self, resource_id: &str) -> bool {
        self.resource_id.as_deref() == Some(resource_id)
    }

    fn replace(
        &mut self,
        resource_id: &str,
        users: Vec<UserPermissionSummary>,
        idps: &[IdentityProvider],
    ) {
        self.resource_id = Some(resource_id.to_string());
        self.users = users;
        self.idps = idps.to_vec();
    }

    /// Recompute the flags of `user_id` from `codes`. Returns false when the
    /// user has no row for `resource_id`.
    fn reflag(&mut self, resource_id: &str, user_id: &str, codes: &[Permission]) -> bool {
        if !self.is_for(resource_id) {
            return false;
        }
        let Some(row) = self.users.iter_mut().find(|row| row.user_id == user_id) else {
            return false;
        };
        *row = UserPermissionSummary {
            user_id: row.user_id.clone(),
            full_name: row.full_name.clone(),
            idp_name: row.idp_name.clone(),
            elevated_rights: row.elevated_rights,
            ..UserPermissionSummary::default()
        };
        for code in codes {
            row.grant(*code);
        }
        true
    }

    /// Append rows for users not yet listed.
    fn insert(&mut self, resource_id: &str, rows: Vec<UserPermissionSummary>) {
        if !self.is_for(resource_id) {
            return;
        }
        for row in rows {
            if self.users.iter().all(|listed| listed.user_id != row.user_id) {
                self.users.push(row);
            }
        }
    }

    fn drop_user(&mut self, resource_id: &str, user_id: &str) {
        if self.is_for(resource_id) {
            self.users.retain(|row| row.user_id != user_id);
        }
    }
}

fn grants_of<G: PermissionGrant + Clone>(grants: &[G], resource_id: &str, user_id: &str) -> Vec<G> {
    grants
        .iter()
        .filter(|grant| grant.resource_id() == resource_id && grant.user_id() == user_id)
        .cloned()
        .collect()
}

fn held_codes<G: PermissionGrant>(grants: &[G], resource_id: &str, user_id: &str) -> Vec<Permission> {
    Permission::ALL
        .into_iter()
        .filter(|code| has_permission(grants, resource_id, user_id, *code))
        .collect()
}

fn assignments(user_id: &str, codes: &[Permission]) -> Result<Vec<PermissionAssignment>> {
    if codes.is_empty() {
        return Err(BcboxError::invalid_input("at least one permission code is required"));
    }
    Ok(codes
        .iter()
        .map(|code| PermissionAssignment::new(user_id, *code))
        .collect())
}

/// Bucket and object grants, their per-user projections, and sharing actions.
pub struct PermissionStore {
    ctx: StoreContext,
    loading: LoadingCounter,
    bucket_permissions: RwLock<CachedCollection<BucketPermission, BucketPermissionSearch>>,
    object_permissions: RwLock<CachedCollection<ObjectPermission, ObjectPermissionSearch>>,
    bucket_users: RwLock<Mapped>,
    object_users: RwLock<Mapped>,
}

impl PermissionStore {
    #[must_use]
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            loading: LoadingCounter::new(),
            bucket_permissions: RwLock::new(CachedCollection::new()),
            object_permissions: RwLock::new(CachedCollection::new()),
            bucket_users: RwLock::new(Mapped::default()),
            object_users: RwLock::new(Mapped::default()),
        }
    }

    #[must_use]
    pub fn loading(&self) -> &LoadingCounter {
        &self.loading
    }

    #[must_use]
    pub fn bucket_permissions(&self) -> Vec<BucketPermission> {
        self.bucket_permissions.read().items().to_vec()
    }

    #[must_use]
    pub fn object_permissions(&self) -> Vec<ObjectPermission> {
        self.object_permissions.read().items().to_vec()
    }

    /// Summaries from the last [`Self::map_bucket_to_user_permissions`].
    #[must_use]
    pub fn bucket_user_permissions(&self) -> Vec<UserPermissionSummary> {
        self.bucket_users.read().users.clone()
    }

    /// Summaries from the last [`Self::map_object_to_user_permissions`].
    #[must_use]
    pub fn object_user_permissions(&self) -> Vec<UserPermissionSummary> {
        self.object_users.read().users.clone()
    }

    pub async fn fetch_bucket_permissions(
        &self,
        search: BucketPermissionSearch,
    ) -> Result<Option<Vec<BucketPermission>>> {
        let client = &self.ctx.client;
        self.ctx
            .scoped_fetch(
                &self.loading,
                "Error fetching bucket permissions",
                &self.bucket_permissions,
                search,
                |chunk: BucketPermissionSearch| async move {
                    client.search_bucket_permissions(&chunk).await
                },
            )
            .await
    }

    pub async fn fetch_object_permissions(
        &self,
        search: ObjectPermissionSearch,
    ) -> Result<Option<Vec<ObjectPermission>>> {
        let client = &self.ctx.client;
        self.ctx
            .scoped_fetch(
                &self.loading,
                "Error fetching object permissions",
                &self.object_permissions,
                search,
                |chunk: ObjectPermissionSearch| async move {
                    client.search_object_permissions(&chunk).await
                },
            )
            .await
    }

    /// Directory records for every user holding one of `grants`.
    async fn resolve_holders<G: PermissionGrant>(
        &self,
        grants: &[G],
        budget: &UrlBudget,
    ) -> Result<Vec<User>> {
        let user_ids = distinct_user_ids(grants);
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let client = &self.ctx.client;
        self.ctx
            .search_all(&UserSearch::by_ids(user_ids), budget, |chunk: UserSearch| async move {
                client.search_users(&chunk).await
            })
            .await
    }

    /// Fetch a bucket's grants and project them to one row per user.
    pub async fn map_bucket_to_user_permissions(
        &self,
        bucket_id: &str,
        idps: &[IdentityProvider],
    ) -> Result<Option<Vec<UserPermissionSummary>>> {
        let search = BucketPermissionSearch::for_bucket(bucket_id);
        let user_budget = self.ctx.budget_for(&UserSearch::default())?;
        let client = &self.ctx.client;
        let fetched = self
            .ctx
            .read(&self.loading, "Error mapping bucket permissions", || async {
                let grants = client.search_bucket_permissions(&search).await?;
                let users = self.resolve_holders(&grants, &user_budget).await?;
                Ok::<_, BcboxError>((grants, users))
            })
            .await?;
        let Some((grants, users)) = fetched else {
            return Ok(None);
        };
        let summaries = project(&grants, &users, idps);
        tracing::debug!(
            target = "bcbox::store",
            bucket_id,
            grants = grants.len(),
            users = summaries.len(),
            "mapped bucket permissions"
        );
        self.bucket_permissions
            .write()
            .apply(search.clone(), grants, |row| search.matches(row));
        self.bucket_users.write().replace(bucket_id, summaries.clone(), idps);
        Ok(Some(summaries))
    }

    /// Fetch an object's grants and project them to one row per user.
    pub async fn map_object_to_user_permissions(
        &self,
        object_id: &str,
        idps: &[IdentityProvider],
    ) -> Result<Option<Vec<UserPermissionSummary>>> {
        let search = ObjectPermissionSearch::for_object(object_id);
        let user_budget = self.ctx.budget_for(&UserSearch::default())?;
        let client = &self.ctx.client;
        let fetched = self
            .ctx
            .read(&self.loading, "Error mapping object permissions", || async {
                let grants = client.search_object_permissions(&search).await?;
                let users = self.resolve_holders(&grants, &user_budget).await?;
                Ok::<_, BcboxError>((grants, users))
            })
            .await?;
        let Some((grants, users)) = fetched else {
            return Ok(None);
        };
        let summaries = project(&grants, &users, idps);
        tracing::debug!(
            target = "bcbox::store",
            object_id,
            grants = grants.len(),
            users = summaries.len(),
            "mapped object permissions"
        );
        self.object_permissions
            .write()
            .apply(search.clone(), grants, |row| search.matches(row));
        self.object_users.write().replace(object_id, summaries.clone(), idps);
        Ok(Some(summaries))
    }

    /// Bring the mapped dialog in line with `user_id`'s refetched grants.
    ///
    /// A listed user is re-flagged. A user new to the dialog is looked up in
    /// the directory and projected with the providers the dialog was mapped
    /// with.
    async fn show_holder<G: PermissionGrant>(
        &self,
        mapped: &RwLock<Mapped>,
        resource_id: &str,
        user_id: &str,
        grants: Vec<G>,
    ) -> Result<()> {
        let held = held_codes(&grants, resource_id, user_id);
        let idps = {
            let mut mapped = mapped.write();
            if !mapped.is_for(resource_id) || mapped.reflag(resource_id, user_id, &held) {
                return Ok(());
            }
            mapped.idps.clone()
        };
        let search = UserSearch::by_ids([user_id]);
        let client = &self.ctx.client;
        let users = self
            .ctx
            .read(&self.loading, "Error fetching user", || client.search_users(&search))
            .await?;
        let Some(users) = users else {
            return Ok(());
        };
        mapped
            .write()
            .insert(resource_id, project(&grants, &users, &idps));
        Ok(())
    }

    /// Grant `codes` on a bucket, then refetch that user's bucket grants.
    pub async fn add_bucket_user(
        &self,
        bucket_id: &str,
        user_id: &str,
        codes: &[Permission],
    ) -> Result<()> {
        let body = assignments(user_id, codes)?;
        let client = &self.ctx.client;
        self.ctx
            .mutate(&self.loading, "Error adding bucket permission", || {
                client.add_bucket_permissions(bucket_id, &body)
            })
            .await?;
        let search = BucketPermissionSearch {
            user_ids: vec![user_id.to_string()],
            ..BucketPermissionSearch::for_bucket(bucket_id)
        };
        self.fetch_bucket_permissions(search).await?;
        let grants = grants_of(self.bucket_permissions.read().items(), bucket_id, user_id);
        self.show_holder(&self.bucket_users, bucket_id, user_id, grants)
            .await
    }

    /// Revoke every code on a bucket from `user_id`.
    ///
    /// All codes are revoked regardless of the cache, which may be stale.
    pub async fn remove_bucket_user(&self, bucket_id: &str, user_id: &str) -> Result<()> {
        let client = &self.ctx.client;
        self.ctx
            .mutate(&self.loading, "Error removing bucket permission", || async {
                try_join_all(
                    Permission::ALL
                        .into_iter()
                        .map(|code| client.delete_bucket_permission(bucket_id, user_id, code)),
                )
                .await?;
                Ok::<_, BcboxError>(())
            })
            .await?;
        let removed = self
            .bucket_permissions
            .write()
            .retain_without(|row| row.bucket_id == bucket_id && row.user_id == user_id);
        self.bucket_users.write().drop_user(bucket_id, user_id);
        tracing::debug!(target = "bcbox::store", bucket_id, user_id, removed, "removed bucket user");
        Ok(())
    }

    /// Grant `codes` on an object, then refetch that user's object grants.
    pub async fn add_object_user(
        &self,
        object_id: &str,
        user_id: &str,
        codes: &[Permission],
    ) -> Result<()> {
        let body = assignments(user_id, codes)?;
        let client = &self.ctx.client;
        self.ctx
            .mutate(&self.loading, "Error adding object permission", || {
                client.add_object_permissions(object_id, &body)
            })
            .await?;
        let search = ObjectPermissionSearch {
            user_ids: vec![user_id.to_string()],
            ..ObjectPermissionSearch::for_object(object_id)
        };
        self.fetch_object_permissions(search).await?;
        let grants = grants_of(self.object_permissions.read().items(), object_id, user_id);
        self.show_holder(&self.object_users, object_id, user_id, grants)
            .await
    }

    /// Revoke every code on an object from `user_id`.
    pub async fn remove_object_user(&self, object_id: &str, user_id: &str) -> Result<()> {
        let client = &self.ctx.client;
        self.ctx
            .mutate(&self.loading, "Error removing object permission", || async {
                try_join_all(
                    Permission::ALL
                        .into_iter()
                        .map(|code| client.delete_object_permission(object_id, user_id, code)),
                )
                .await?;
                Ok::<_, BcboxError>(())
            })
            .await?;
        let removed = self
            .object_permissions
            .write()
            .retain_without(|row| row.object_id == object_id && row.user_id == user_id);
        self.object_users.write().drop_user(object_id, user_id);
        tracing::debug!(target = "bcbox::store", object_id, user_id, removed, "removed object user");
        Ok(())
    }

    /// Answered from cached grants only.
    #[must_use]
    pub fn is_bucket_action_allowed(&self, bucket_id: &str, user_id: &str, code: Permission) -> bool {
        has_permission(self.bucket_permissions.read().items(), bucket_id, user_id, code)
    }

    /// True for an object grant, or a bucket grant of the same code when the
    /// object's `bucket_id` is given.
    #[must_use]
    pub fn is_object_action_allowed(
        &self,
        object_id: &str,
        user_id: &str,
        code: Permission,
        bucket_id: Option<&str>,
    ) -> bool {
        has_permission(self.object_permissions.read().items(), object_id, user_id, code)
            || bucket_id.is_some_and(|bucket_id| self.is_bucket_action_allowed(bucket_id, user_id, code))
    }
}
