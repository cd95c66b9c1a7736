use std::collections::HashSet;

use parking_lot::RwLock;

use super::{PermissionStore, StoreContext};
use crate::cache::CachedCollection;
use crate::error::Result;
use crate::loading::LoadingCounter;
use crate::types::{Bucket, BucketCreate, BucketPermissionSearch, BucketSearch, BucketUpdate};

pub struct BucketStore {
    ctx: StoreContext,
    loading: LoadingCounter,
    buckets: RwLock<CachedCollection<Bucket, BucketSearch>>,
}

impl BucketStore {
    #[must_use]
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            loading: LoadingCounter::new(),
            buckets: RwLock::new(CachedCollection::new()),
        }
    }

    #[must_use]
    pub fn loading(&self) -> &LoadingCounter {
        &self.loading
    }

    #[must_use]
    pub fn buckets(&self) -> Vec<Bucket> {
        self.buckets.read().items().to_vec()
    }

    #[must_use]
    pub fn find_bucket_by_id(&self, bucket_id: &str) -> Option<Bucket> {
        self.buckets
            .read()
            .find(|bucket| bucket.bucket_id == bucket_id)
            .cloned()
    }

    /// Fetch the buckets `search` covers and replace that scope in the cache.
    pub async fn fetch_buckets(&self, search: BucketSearch) -> Result<Option<Vec<Bucket>>> {
        let client = &self.ctx.client;
        self.ctx
            .scoped_fetch(
                &self.loading,
                "Error fetching buckets",
                &self.buckets,
                search,
                |chunk: BucketSearch| async move { client.search_buckets(&chunk).await },
            )
            .await
    }

    /// Fetch every bucket `user_id` can reach, including through object grants.
    ///
    /// A user without any grant resolves to an empty list without querying
    /// buckets, since an empty id filter would list every bucket.
    pub async fn fetch_buckets_for_user(
        &self,
        user_id: &str,
        permissions: &PermissionStore,
    ) -> Result<Option<Vec<Bucket>>> {
        let search = BucketPermissionSearch {
            object_perms: true,
            ..BucketPermissionSearch::for_user(user_id)
        };
        let Some(grants) = permissions.fetch_bucket_permissions(search).await? else {
            return Ok(None);
        };
        let mut seen = HashSet::new();
        let bucket_ids: Vec<String> = grants
            .into_iter()
            .map(|grant| grant.bucket_id)
            .filter(|bucket_id| seen.insert(bucket_id.clone()))
            .collect();
        if bucket_ids.is_empty() {
            return Ok(Some(Vec::new()));
        }
        self.fetch_buckets(BucketSearch::by_ids(bucket_ids)).await
    }

    pub async fn create_bucket(&self, body: &BucketCreate) -> Result<Bucket> {
        let client = &self.ctx.client;
        let bucket = self
            .ctx
            .mutate(&self.loading, "Error creating bucket", || {
                client.create_bucket(body)
            })
            .await?;
        self.buckets.write().push(bucket.clone());
        Ok(bucket)
    }

    /// Update a bucket, then refetch it so the cache reflects the server copy.
    pub async fn update_bucket(&self, bucket_id: &str, body: &BucketUpdate) -> Result<()> {
        let client = &self.ctx.client;
        self.ctx
            .mutate(&self.loading, "Error updating bucket", || {
                client.update_bucket(bucket_id, body)
            })
            .await?;
        self.fetch_buckets(BucketSearch::by_ids([bucket_id])).await?;
        Ok(())
    }

    pub async fn delete_bucket(&self, bucket_id: &str) -> Result<()> {
        let client = &self.ctx.client;
        self.ctx
            .mutate(&self.loading, "Error deleting bucket", || {
                client.delete_bucket(bucket_id)
            })
            .await?;
        let removed = self
            .buckets
            .write()
            .retain_without(|bucket| bucket.bucket_id == bucket_id);
        tracing::debug!(target = "bcbox::store", bucket_id, removed, "deleted bucket");
        Ok(())
    }
}
