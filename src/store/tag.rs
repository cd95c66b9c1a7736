use parking_lot::RwLock;

use super::StoreContext;
use crate::cache::CachedCollection;
use crate::error::Result;
use crate::loading::LoadingCounter;
use crate::types::{Tagging, TaggingSearch};

pub struct TagStore {
    ctx: StoreContext,
    loading: LoadingCounter,
    tagging: RwLock<CachedCollection<Tagging, TaggingSearch>>,
}

impl TagStore {
    #[must_use]
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            loading: LoadingCounter::new(),
            tagging: RwLock::new(CachedCollection::new()),
        }
    }

    #[must_use]
    pub fn loading(&self) -> &LoadingCounter {
        &self.loading
    }

    #[must_use]
    pub fn tagging(&self) -> Vec<Tagging> {
        self.tagging.read().items().to_vec()
    }

    #[must_use]
    pub fn find_tagging_by_object_id(&self, object_id: &str) -> Option<Tagging> {
        self.tagging
            .read()
            .find(|tagging| tagging.object_id == object_id)
            .cloned()
    }

    pub async fn fetch_tagging(&self, search: TaggingSearch) -> Result<Option<Vec<Tagging>>> {
        let client = &self.ctx.client;
        self.ctx
            .scoped_fetch(
                &self.loading,
                "Error fetching tags",
                &self.tagging,
                search,
                |chunk: TaggingSearch| async move { client.search_tagging(&chunk).await },
            )
            .await
    }
}
