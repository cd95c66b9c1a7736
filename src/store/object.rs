use parking_lot::RwLock;

use super::StoreContext;
use crate::cache::CachedCollection;
use crate::error::Result;
use crate::loading::LoadingCounter;
use crate::types::{CosObject, ObjectSearch};

pub struct ObjectStore {
    ctx: StoreContext,
    loading: LoadingCounter,
    objects: RwLock<CachedCollection<CosObject, ObjectSearch>>,
}

impl ObjectStore {
    #[must_use]
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            loading: LoadingCounter::new(),
            objects: RwLock::new(CachedCollection::new()),
        }
    }

    #[must_use]
    pub fn loading(&self) -> &LoadingCounter {
        &self.loading
    }

    #[must_use]
    pub fn objects(&self) -> Vec<CosObject> {
        self.objects.read().items().to_vec()
    }

    #[must_use]
    pub fn find_object_by_id(&self, object_id: &str) -> Option<CosObject> {
        self.objects
            .read()
            .find(|object| object.id == object_id)
            .cloned()
    }

    #[must_use]
    pub fn objects_in_bucket(&self, bucket_id: &str) -> Vec<CosObject> {
        self.objects
            .read()
            .items()
            .iter()
            .filter(|object| object.in_bucket(bucket_id))
            .cloned()
            .collect()
    }

    /// Fetch the objects `search` covers and replace that scope in the cache.
    ///
    /// Objects outside the scope, such as those of other buckets, are kept.
    pub async fn fetch_objects(&self, search: ObjectSearch) -> Result<Option<Vec<CosObject>>> {
        let client = &self.ctx.client;
        self.ctx
            .scoped_fetch(
                &self.loading,
                "Error fetching objects",
                &self.objects,
                search,
                |chunk: ObjectSearch| async move { client.search_objects(&chunk).await },
            )
            .await
    }

    /// Delete an object, or one version of it.
    ///
    /// Only a whole-object delete removes the cached record.
    pub async fn delete_object(&self, object_id: &str, version_id: Option<&str>) -> Result<()> {
        let client = &self.ctx.client;
        self.ctx
            .mutate(&self.loading, "Error deleting object", || {
                client.delete_object(object_id, version_id)
            })
            .await?;
        if version_id.is_none() {
            self.objects
                .write()
                .retain_without(|object| object.id == object_id);
        }
        Ok(())
    }

    /// Toggle public access, then refetch the object.
    pub async fn set_object_public(&self, object_id: &str, public: bool) -> Result<()> {
        let client = &self.ctx.client;
        self.ctx
            .mutate(&self.loading, "Error changing public setting", || {
                client.set_object_public(object_id, public)
            })
            .await?;
        tracing::debug!(target = "bcbox::store", object_id, public, "object visibility changed");
        self.fetch_objects(ObjectSearch::by_ids([object_id])).await?;
        Ok(())
    }
}
