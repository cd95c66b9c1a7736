use parking_lot::RwLock;

use super::StoreContext;
use crate::cache::CachedCollection;
use crate::error::{BcboxError, Result};
use crate::loading::LoadingCounter;
use crate::types::{Metadata, MetadataSearch, Version};

/// Object versions and their metadata.
pub struct VersionStore {
    ctx: StoreContext,
    loading: LoadingCounter,
    versions: RwLock<CachedCollection<Version, String>>,
    metadata: RwLock<CachedCollection<Metadata, MetadataSearch>>,
}

impl VersionStore {
    #[must_use]
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            loading: LoadingCounter::new(),
            versions: RwLock::new(CachedCollection::new()),
            metadata: RwLock::new(CachedCollection::new()),
        }
    }

    #[must_use]
    pub fn loading(&self) -> &LoadingCounter {
        &self.loading
    }

    #[must_use]
    pub fn versions(&self) -> Vec<Version> {
        self.versions.read().items().to_vec()
    }

    #[must_use]
    pub fn find_versions_by_object_id(&self, object_id: &str) -> Vec<Version> {
        self.versions
            .read()
            .items()
            .iter()
            .filter(|version| version.object_id == object_id)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn find_latest_version_id_by_object_id(&self, object_id: &str) -> Option<String> {
        self.versions
            .read()
            .find(|version| version.object_id == object_id && version.is_latest)
            .and_then(|version| version.version_id.clone())
    }

    #[must_use]
    pub fn find_metadata_by_object_id(&self, object_id: &str) -> Option<Metadata> {
        self.metadata
            .read()
            .find(|metadata| metadata.object_id == object_id)
            .cloned()
    }

    /// List every version of one object, replacing its cached versions.
    pub async fn fetch_versions(&self, object_id: &str) -> Result<Option<Vec<Version>>> {
        if object_id.trim().is_empty() {
            return Err(BcboxError::invalid_input("object_id must not be empty"));
        }
        let client = &self.ctx.client;
        let fetched = self
            .ctx
            .read(&self.loading, "Error fetching versions", || {
                client.list_versions(object_id)
            })
            .await?;
        let Some(fresh) = fetched else {
            return Ok(None);
        };
        let stats = self.versions.write().apply(
            object_id.to_string(),
            fresh.clone(),
            |version| version.object_id == object_id,
        );
        tracing::debug!(
            target = "bcbox::store",
            object_id,
            retained = stats.retained,
            replaced = stats.replaced,
            fetched = stats.fetched,
            "merged versions"
        );
        Ok(Some(fresh))
    }

    pub async fn fetch_metadata(&self, search: MetadataSearch) -> Result<Option<Vec<Metadata>>> {
        let client = &self.ctx.client;
        self.ctx
            .scoped_fetch(
                &self.loading,
                "Error fetching metadata",
                &self.metadata,
                search,
                |chunk: MetadataSearch| async move { client.search_metadata(&chunk).await },
            )
            .await
    }
}
