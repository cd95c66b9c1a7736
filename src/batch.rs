//! Splitting id-list searches so every request URL stays under a byte budget.
//!
//! COMS search endpoints take ids as repeated query parameters and have no
//! pagination cursor, so a large id list has to be chunked by the caller.

use std::future::Future;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_URL_BUDGET_BYTES, DEFAULT_URL_FIXED_OVERHEAD_BYTES, DEFAULT_URL_PER_ID_BYTES,
};
use crate::error::{BcboxError, Result};

/// Byte budget for one request URL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UrlBudget {
    pub budget_bytes: usize,
    pub fixed_overhead_bytes: usize,
    pub per_id_bytes: usize,
}

impl Default for UrlBudget {
    fn default() -> Self {
        Self {
            budget_bytes: DEFAULT_URL_BUDGET_BYTES,
            fixed_overhead_bytes: DEFAULT_URL_FIXED_OVERHEAD_BYTES,
            per_id_bytes: DEFAULT_URL_PER_ID_BYTES,
        }
    }
}

impl UrlBudget {
    #[must_use]
    pub fn new(budget_bytes: usize, fixed_overhead_bytes: usize, per_id_bytes: usize) -> Self {
        Self {
            budget_bytes,
            fixed_overhead_bytes,
            per_id_bytes,
        }
    }

    /// Same budget with `extra` bytes of non-id query parameters reserved.
    #[must_use]
    pub fn with_extra_overhead(self, extra: usize) -> Self {
        Self {
            fixed_overhead_bytes: self.fixed_overhead_bytes.saturating_add(extra),
            ..self
        }
    }

    /// Maximum number of ids per request.
    pub fn group_size(&self) -> Result<usize> {
        let available = self
            .budget_bytes
            .checked_sub(self.fixed_overhead_bytes)
            .filter(|available| *available > 0)
            .ok_or_else(|| {
                BcboxError::configuration(format!(
                    "url budget of {} bytes leaves no room after {} bytes of fixed overhead",
                    self.budget_bytes, self.fixed_overhead_bytes
                ))
            })?;
        if self.per_id_bytes == 0 {
            return Err(BcboxError::configuration("per-id url cost must be non-zero"));
        }
        match available / self.per_id_bytes {
            0 => Err(BcboxError::configuration(format!(
                "{available} bytes of url budget cannot fit one id of {} bytes",
                self.per_id_bytes
            ))),
            size => Ok(size),
        }
    }
}

/// Fetch `ids` in budget-sized chunks and concatenate the results.
///
/// All chunks are requested concurrently. Results come back in chunk order,
/// not completion order, and the first failing chunk fails the whole call.
/// The budget is validated before any request is issued.
pub async fn batched_search<T, F, Fut>(
    ids: &[String],
    budget: &UrlBudget,
    fetch_page: F,
) -> Result<Vec<T>>
where
    F: Fn(Vec<String>) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let group_size = budget.group_size()?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let chunks: Vec<Vec<String>> = ids.chunks(group_size).map(<[String]>::to_vec).collect();
    tracing::debug!(
        target = "bcbox::batch",
        ids = ids.len(),
        group_size,
        chunks = chunks.len(),
        "batched search"
    );
    let pages = try_join_all(chunks.into_iter().map(&fetch_page)).await?;
    Ok(pages.into_iter().flatten().collect())
}
