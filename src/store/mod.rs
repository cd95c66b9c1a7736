//! State stores backing the BCBox views.
//!
//! Each store owns its cached collections and its own [`LoadingCounter`].
//! Actions take `&self`; locks are never held across a request, so two fetches
//! over overlapping scopes can be in flight at once. Their merges are not
//! serialized: whichever response arrives last determines the cached state.
//!
//! Read and list actions report failures and resolve to `Ok(None)`. Mutations
//! report and then return the error. A URL budget that cannot fit one id is a
//! configuration error and is returned before any request or report.

mod bucket;
mod config;
mod object;
mod permission;
mod tag;
mod user;
mod version;

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;

pub use bucket::BucketStore;
pub use config::ConfigStore;
pub use object::ObjectStore;
pub use permission::PermissionStore;
pub use tag::TagStore;
pub use user::UserStore;
pub use version::VersionStore;

use crate::batch::{UrlBudget, batched_search};
use crate::cache::CachedCollection;
use crate::client::ComsClient;
use crate::error::Result;
use crate::loading::{ErrorPolicy, LoadingCounter, reported, with_loading};
use crate::notify::Notifier;
use crate::types::{SearchFilter, SearchScope};

/// Collaborators shared by every store.
#[derive(Clone)]
pub struct StoreContext {
    pub client: Arc<dyn ComsClient>,
    pub notifier: Arc<dyn Notifier>,
    pub budget: UrlBudget,
}

impl StoreContext {
    pub fn new(client: Arc<dyn ComsClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            notifier,
            budget: UrlBudget::default(),
        }
    }

    #[must_use]
    pub fn with_budget(mut self, budget: UrlBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Budget left for ids once the filter's other parameters are accounted for.
    pub(crate) fn budget_for<S: SearchFilter>(&self, search: &S) -> Result<UrlBudget> {
        let budget = self.budget.with_extra_overhead(search.fixed_query_len());
        budget.group_size()?;
        Ok(budget)
    }

    /// Bracket a read: failures are reported and resolve to `Ok(None)`.
    pub(crate) async fn read<R, F, Fut>(
        &self,
        loading: &LoadingCounter,
        summary: &str,
        operation: F,
    ) -> Result<Option<R>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        with_loading(loading, &*self.notifier, summary, ErrorPolicy::Swallow, operation).await
    }

    /// Bracket a mutation: failures are reported and returned.
    pub(crate) async fn mutate<R, F, Fut>(
        &self,
        loading: &LoadingCounter,
        summary: &str,
        operation: F,
    ) -> Result<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        reported(loading, &*self.notifier, summary, operation).await
    }

    /// Fetch every record `search` covers, splitting its id list if needed.
    pub(crate) async fn search_all<S, T, F, Fut>(
        &self,
        search: &S,
        budget: &UrlBudget,
        fetch: F,
    ) -> Result<Vec<T>>
    where
        S: SearchFilter,
        F: Fn(S) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        if search.ids().is_empty() {
            return fetch(search.clone()).await;
        }
        batched_search(search.ids(), budget, |ids| fetch(search.with_ids(ids))).await
    }

    /// Run a scoped read and merge its result into `cache` on success.
    pub(crate) async fn scoped_fetch<S, T, F, Fut>(
        &self,
        loading: &LoadingCounter,
        summary: &str,
        cache: &RwLock<CachedCollection<T, S>>,
        search: S,
        fetch: F,
    ) -> Result<Option<Vec<T>>>
    where
        S: SearchFilter + SearchScope<T>,
        T: Clone,
        F: Fn(S) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let budget = self.budget_for(&search)?;
        let fetched = self
            .read(loading, summary, || self.search_all(&search, &budget, fetch))
            .await?;
        let Some(fresh) = fetched else {
            return Ok(None);
        };
        let stats = cache
            .write()
            .apply(search.clone(), fresh.clone(), |record| search.matches(record));
        tracing::debug!(
            target = "bcbox::store",
            retained = stats.retained,
            replaced = stats.replaced,
            fetched = stats.fetched,
            "merged scoped fetch"
        );
        Ok(Some(fresh))
    }
}
