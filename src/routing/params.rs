//! Positional parameter storage.
//!
//! Route parameter counts are small and fixed per route, so extracted values
//! live in a flat, pre-sized vector instead of a map. Entries keep the order
//! in which their markers appear in the registered pattern.
//!
//! Keys borrow from the tree and values are byte ranges into the looked-up
//! path, so a buffer can be cleared and reused for the next request without
//! reallocating. [`ParamRanges`] drops the keys as well, so it can be pooled
//! past the lifetime of any one table.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Param<'k> {
    key: &'k str,
    range: Range<usize>,
}

/// Reusable buffer of `(name, value range)` pairs filled by a lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params<'k> {
    entries: Vec<Param<'k>>,
}

impl<'k> Params<'k> {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Create a buffer sized for `capacity` parameters, typically
    /// [`Router::max_params`](crate::routing::Router::max_params).
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Drop all entries, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn reserve_total(&mut self, total: usize) {
        if self.entries.capacity() < total {
            self.entries.reserve(total - self.entries.len());
        }
    }

    pub(crate) fn push(&mut self, key: &'k str, range: Range<usize>) {
        self.entries.push(Param { key, range });
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Value of the first parameter called `name`, sliced out of `path`.
    ///
    /// `path` must be the path this buffer was filled from.
    pub fn get<'p>(&self, path: &'p str, name: &str) -> Option<&'p str> {
        self.entries
            .iter()
            .find(|p| p.key == name)
            .and_then(|p| path.get(p.range.clone()))
    }

    /// Parameter names in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &'k str> + '_ {
        self.entries.iter().map(|p| p.key)
    }

    /// `(name, value)` pairs in declaration order.
    pub fn iter<'a, 'p>(&'a self, path: &'p str) -> impl Iterator<Item = (&'k str, &'p str)> + 'a
    where
        'p: 'a,
    {
        self.entries
            .iter()
            .filter_map(move |p| path.get(p.range.clone()).map(|v| (p.key, v)))
    }
}

/// Buffer of parameter value ranges without their names.
///
/// Names are positional: entry `i` belongs to the `i`-th wildcard of the
/// matched pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamRanges {
    ranges: Vec<Range<usize>>,
}

impl ParamRanges {
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { ranges: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.ranges.capacity()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Value of the `index`-th parameter, sliced out of `path`.
    pub fn get<'p>(&self, path: &'p str, index: usize) -> Option<&'p str> {
        self.ranges.get(index).and_then(|r| path.get(r.clone()))
    }

    /// Values in declaration order.
    pub fn values<'a, 'p>(&'a self, path: &'p str) -> impl Iterator<Item = &'p str> + 'a
    where
        'p: 'a,
    {
        self.ranges.iter().filter_map(move |r| path.get(r.clone()))
    }
}

/// Storage a tree lookup writes captures into.
pub(crate) trait Captures<'k> {
    /// Clear and make room for `total` entries.
    fn prepare(&mut self, total: usize);
    fn mark(&self) -> usize;
    fn capture(&mut self, key: &'k str, range: Range<usize>);
    fn rewind(&mut self, mark: usize);
}

impl<'k> Captures<'k> for Params<'k> {
    fn prepare(&mut self, total: usize) {
        self.clear();
        self.reserve_total(total);
    }

    fn mark(&self) -> usize {
        self.len()
    }

    fn capture(&mut self, key: &'k str, range: Range<usize>) {
        self.push(key, range);
    }

    fn rewind(&mut self, mark: usize) {
        self.truncate(mark);
    }
}

impl<'k> Captures<'k> for ParamRanges {
    fn prepare(&mut self, total: usize) {
        self.ranges.clear();
        if self.ranges.capacity() < total {
            self.ranges.reserve(total);
        }
    }

    fn mark(&self) -> usize {
        self.ranges.len()
    }

    fn capture(&mut self, _key: &'k str, range: Range<usize>) {
        self.ranges.push(range);
    }

    fn rewind(&mut self, mark: usize) {
        self.ranges.truncate(mark);
    }
}
