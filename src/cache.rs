//! Scoped cache merges.
//!
//! A fetch issued with a filter is the only source of truth for the records
//! that filter covers. Merging replaces exactly that subset and leaves every
//! other cached record alone.

/// Split `items` by `predicate`, keeping relative order on both sides.
pub fn partition<T, P>(items: impl IntoIterator<Item = T>, mut predicate: P) -> (Vec<T>, Vec<T>)
where
    P: FnMut(&T) -> bool,
{
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();
    for item in items {
        if predicate(&item) {
            matched.push(item);
        } else {
            unmatched.push(item);
        }
    }
    (matched, unmatched)
}

/// Replace the entries of `existing` selected by `matches` with `fresh`.
///
/// Retained entries keep their order and come first; fetched entries follow.
///
/// An empty `fresh` removes every matching entry. A scoped fetch that returns
/// nothing is read as "this scope is now empty", which also hides a server
/// that silently ignored the filter. Callers must pass the predicate that
/// corresponds to the query actually sent.
pub fn merge<T, P>(existing: impl IntoIterator<Item = T>, fresh: Vec<T>, matches: P) -> Vec<T>
where
    P: FnMut(&T) -> bool,
{
    let (_, mut retained) = partition(existing, matches);
    retained.extend(fresh);
    retained
}

/// Records held by a store plus the query that last populated them.
#[derive(Debug, Clone)]
pub struct CachedCollection<T, Q> {
    items: Vec<T>,
    last_query: Option<Q>,
}

impl<T, Q> Default for CachedCollection<T, Q> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            last_query: None,
        }
    }
}

/// Sizes observed by one [`CachedCollection::apply`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeStats {
    pub retained: usize,
    pub replaced: usize,
    pub fetched: usize,
}

impl<T, Q> CachedCollection<T, Q> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the result of a successful scoped fetch.
    pub fn apply<P>(&mut self, query: Q, fresh: Vec<T>, mut matches: P) -> MergeStats
    where
        P: FnMut(&T) -> bool,
    {
        let before = self.items.len();
        let fetched = fresh.len();
        let existing = std::mem::take(&mut self.items);
        let mut retained = 0usize;
        self.items = merge(existing, fresh, |item| {
            let hit = matches(item);
            if !hit {
                retained += 1;
            }
            hit
        });
        self.last_query = Some(query);
        MergeStats {
            retained,
            replaced: before - retained,
            fetched,
        }
    }

    /// Drop entries selected by `predicate`, e.g. after a confirmed delete.
    pub fn retain_without<P>(&mut self, mut predicate: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        before - self.items.len()
    }

    /// Append records created by a mutation outside any fetched scope.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.last_query = None;
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn last_query(&self) -> Option<&Q> {
        self.last_query.as_ref()
    }

    pub fn find<P>(&self, mut predicate: P) -> Option<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.iter().find(|item| predicate(item))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
