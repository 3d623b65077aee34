//! Index-based sequence accessor.

use sales_core::Record;
use std::sync::Arc;

/// An ordered sequence addressed by position.
pub trait IndexedSequence {
    /// Element type.
    type Item;

    /// Number of elements.
    fn len(&self) -> usize;

    /// Element at `index`, if in range.
    fn get(&self, index: usize) -> Option<&Self::Item>;

    /// Returns true if the sequence has no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> IndexedSequence for Vec<T> {
    type Item = T;

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }
}

impl<T> IndexedSequence for Arc<[T]> {
    type Item = T;

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn get(&self, index: usize) -> Option<&T> {
        <[T]>::get(self, index)
    }
}

/// An owned view of records in a particular order.
///
/// Shares the underlying record slice with the [`DatasetView`](crate::DatasetView) that
/// produced it, so taking one is cheap and it stays valid after the view changes.
#[derive(Debug, Clone)]
pub struct FilteredRecords {
    records: Arc<[Record]>,
    order: Arc<[usize]>,
}

impl FilteredRecords {
    pub(crate) const fn new(records: Arc<[Record]>, order: Arc<[usize]>) -> Self {
        Self { records, order }
    }

    /// Iterates over the records in order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.order.iter().map(|&i| &self.records[i])
    }
}

impl IndexedSequence for FilteredRecords {
    type Item = Record;

    fn len(&self) -> usize {
        self.order.len()
    }

    fn get(&self, index: usize) -> Option<&Record> {
        self.order.get(index).and_then(|&i| self.records.get(i))
    }
}
