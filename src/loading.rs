//! Busy indicators and the wrapper that brackets store actions with them.
//!
//! Every action increments a loading counter before it starts and decrements
//! it when it finishes, whatever the outcome. The decrement is tied to a drop
//! guard so early returns, errors, panics, and dropped futures all release it.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;
use crate::notify::{Notification, Notifier};

/// Anything that can be told an operation started or finished.
pub trait LoadingSignal: Send + Sync {
    fn begin(&self);

    fn end(&self);
}

/// Reentrant busy/idle indicator. Clones share the same count.
#[derive(Debug, Clone, Default)]
pub struct LoadingCounter {
    count: Arc<AtomicUsize>,
}

impl LoadingCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.count() > 0
    }
}

impl LoadingSignal for LoadingCounter {
    fn begin(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    fn end(&self) {
        let updated = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(1)
            });
        if updated.is_err() {
            tracing::warn!(target = "bcbox::loading", "unmatched loading end ignored");
        }
    }
}

/// Holds one unit of a [`LoadingSignal`]; releases it exactly once on drop.
#[must_use = "the loading signal ends as soon as the token is dropped"]
pub struct LoadingToken<'a, S: LoadingSignal + ?Sized> {
    signal: &'a S,
}

impl<'a, S: LoadingSignal + ?Sized> LoadingToken<'a, S> {
    pub fn acquire(signal: &'a S) -> Self {
        signal.begin();
        Self { signal }
    }
}

impl<S: LoadingSignal + ?Sized> Drop for LoadingToken<'_, S> {
    fn drop(&mut self) {
        self.signal.end();
    }
}

/// What a wrapped action does with an error after reporting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Return the error to the caller. Used by mutations.
    Propagate,
    /// Resolve to `Ok(None)`. Used by reads and listings.
    Swallow,
}

/// Run `operation` inside a loading bracket and report its failure.
///
/// `notifier` receives `summary` with the error detail before the signal ends.
/// The error is always returned; see [`with_loading`] to swallow it.
pub async fn reported<S, N, F, Fut, R>(
    signal: &S,
    notifier: &N,
    summary: &str,
    operation: F,
) -> Result<R>
where
    S: LoadingSignal + ?Sized,
    N: Notifier + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let token = LoadingToken::acquire(signal);
    let outcome = operation().await;
    if let Err(err) = &outcome {
        notifier.notify(Notification::error(summary, err));
    }
    drop(token);
    outcome
}

/// Run `operation` inside a loading bracket, applying `policy` to failures.
///
/// `Ok(None)` is only returned for a swallowed failure.
pub async fn with_loading<S, N, F, Fut, R>(
    signal: &S,
    notifier: &N,
    summary: &str,
    policy: ErrorPolicy,
    operation: F,
) -> Result<Option<R>>
where
    S: LoadingSignal + ?Sized,
    N: Notifier + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<R>>,
{
    match reported(signal, notifier, summary, operation).await {
        Ok(value) => Ok(Some(value)),
        Err(err) => match policy {
            ErrorPolicy::Propagate => Err(err),
            ErrorPolicy::Swallow => Ok(None),
        },
    }
}
