use parking_lot::RwLock;

use super::StoreContext;
use crate::error::Result;
use crate::loading::LoadingCounter;
use crate::types::{SearchFilter, User, UserSearch};

/// Directory lookups for the sharing dialogs.
///
/// Unlike the resource stores, each search replaces the previous result
/// wholesale; directory pages are never merged.
pub struct UserStore {
    ctx: StoreContext,
    loading: LoadingCounter,
    user_search: RwLock<Vec<User>>,
}

impl UserStore {
    #[must_use]
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            loading: LoadingCounter::new(),
            user_search: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn loading(&self) -> &LoadingCounter {
        &self.loading
    }

    #[must_use]
    pub fn user_search(&self) -> Vec<User> {
        self.user_search.read().clone()
    }

    pub fn clear_search(&self) {
        self.user_search.write().clear();
    }

    pub async fn search_users(&self, search: &UserSearch) -> Result<Option<Vec<User>>> {
        let budget = self.ctx.budget_for(search)?;
        let client = &self.ctx.client;
        let found = self
            .ctx
            .read(&self.loading, "Error searching users", || {
                self.ctx.search_all(search, &budget, |chunk: UserSearch| async move {
                    client.search_users(&chunk).await
                })
            })
            .await?;
        if let Some(users) = &found {
            tracing::debug!(
                target = "bcbox::store",
                users = users.len(),
                ids = search.ids().len(),
                "replaced user search"
            );
            *self.user_search.write() = users.clone();
        }
        Ok(found)
    }
}
