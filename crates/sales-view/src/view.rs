//! Filter/sort/paginate engine over the materialized record set.
//!
//! [`DatasetView`] holds every record of the active selection plus a derived, ordered list
//! of the records that pass the current filter. The derived list is always rebuilt from the
//! full set, never edited in place. Pages are slices of it.
//!
//! Mutations take `&mut self`, so two of them can never run against the same view at once.
//! Subscribers are called synchronously, in subscription order, once the mutation has
//! completed.

use sales_core::Record;
use sales_core::types::value_text;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::sequence::FilteredRecords;

/// Records inspected when estimating memory usage.
const MEMORY_SAMPLE_SIZE: usize = 100;

/// View configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Records per page. Zero is treated as one.
    pub page_size: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self { page_size: 1000 }
    }
}

impl ViewConfig {
    /// Set the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl FromStr for SortOrder {
    type Err = sales_core::DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(sales_core::DataError::InvalidParameter(format!(
                "unknown sort order: {other}"
            ))),
        }
    }
}

/// Pagination metadata with 1-based display indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    /// Current page, starting at 1.
    pub current_page: usize,
    /// Number of pages in the filtered set.
    pub total_pages: usize,
    /// Records per page.
    pub page_size: usize,
    /// Records in the filtered set.
    pub total_items: usize,
    /// 1-based index of the first record on the page, or 0 when empty.
    pub start_index: usize,
    /// 1-based index of the last record on the page, or 0 when empty.
    pub end_index: usize,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_prev: bool,
}

/// Estimated memory footprint of the record set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEstimate {
    /// Whole record set.
    pub total_bytes: f64,
    /// One full page.
    pub per_page_bytes: f64,
    /// Average record.
    pub avg_item_bytes: f64,
}

/// Record counts and memory estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStats {
    /// Records in the full set.
    pub total: usize,
    /// Records passing the filter.
    pub filtered: usize,
    /// Records on the current page.
    pub current_page: usize,
    /// Number of pages.
    pub pages: usize,
    /// Sampled memory estimate.
    pub memory: MemoryEstimate,
}

/// Handle returned by [`DatasetView::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&[&Record], &PaginationInfo) + Send>;

/// Filtered, sorted, paginated view over one record set.
pub struct DatasetView {
    all: Arc<[Record]>,
    /// Positions in `all` of the records passing the filter, in display order.
    filtered: Arc<[usize]>,
    page: usize,
    page_size: usize,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl fmt::Debug for DatasetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetView")
            .field("total", &self.all.len())
            .field("filtered", &self.filtered.len())
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for DatasetView {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

impl DatasetView {
    /// Create an empty view.
    #[must_use]
    pub fn new(config: ViewConfig) -> Self {
        Self {
            all: Arc::from(Vec::new()),
            filtered: Arc::from(Vec::new()),
            page: 0,
            page_size: config.page_size.max(1),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Replaces the record set, clearing any filter and returning to the first page.
    pub fn set_data(&mut self, records: impl Into<Arc<[Record]>>) {
        self.all = records.into();
        self.filtered = (0..self.all.len()).collect();
        self.page = 0;
        debug!(records = self.all.len(), "View data replaced");
        self.notify();
    }

    /// Keeps only the records for which `predicate` returns true, and returns to the first
    /// page. The filter always starts from the full record set.
    pub fn apply_filter<P>(&mut self, predicate: P)
    where
        P: Fn(&Record) -> bool,
    {
        self.filtered = self
            .all
            .iter()
            .enumerate()
            .filter(|(_, record)| predicate(record))
            .map(|(i, _)| i)
            .collect();
        self.page = 0;
        debug!(
            total = self.all.len(),
            filtered = self.filtered.len(),
            "Filter applied"
        );
        self.notify();
    }

    /// Stable-sorts the filtered records by `field`.
    ///
    /// Records with equal keys keep their relative order. The current page is kept.
    pub fn apply_sort(&mut self, field: &str, order: SortOrder) {
        let all = &self.all;
        let mut sorted = self.filtered.to_vec();
        sorted.sort_by(|&a, &b| {
            let ordering = compare_values(all[a].get(field), all[b].get(field));
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        self.filtered = Arc::from(sorted);
        debug!(field, ?order, "Sort applied");
        self.notify();
    }

    /// Case-insensitive substring search.
    ///
    /// With no `fields`, every field's string form is searched. A blank query clears the
    /// filter. Returns to the first page.
    pub fn search(&mut self, query: &str, fields: &[&str]) {
        if query.trim().is_empty() {
            self.reset();
            return;
        }
        let needle = query.to_lowercase();

        self.apply_filter(|record| {
            if fields.is_empty() {
                record
                    .values()
                    .any(|value| value_text(value).to_lowercase().contains(&needle))
            } else {
                fields.iter().any(|field| {
                    record
                        .text(field)
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
                })
            }
        });
    }

    /// Clears the filter and returns to the first page.
    pub fn reset(&mut self) {
        self.filtered = (0..self.all.len()).collect();
        self.page = 0;
        self.notify();
    }

    /// Moves to the 0-based page `n`. Out-of-range requests are ignored.
    ///
    /// Returns true if the request was in range.
    pub fn page(&mut self, n: usize) -> bool {
        if n >= self.total_pages() {
            return false;
        }
        self.page = n;
        self.notify();
        true
    }

    /// Moves to the next page, if there is one.
    pub fn next_page(&mut self) -> bool {
        self.page(self.page + 1)
    }

    /// Moves to the previous page, if there is one.
    pub fn prev_page(&mut self) -> bool {
        match self.page.checked_sub(1) {
            Some(n) => self.page(n),
            None => false,
        }
    }

    /// Moves to the first page.
    pub fn first_page(&mut self) -> bool {
        self.page(0)
    }

    /// Moves to the last page.
    pub fn last_page(&mut self) -> bool {
        match self.total_pages().checked_sub(1) {
            Some(n) => self.page(n),
            None => false,
        }
    }

    /// Records on the current page.
    #[must_use]
    pub fn current_page(&self) -> Vec<&Record> {
        self.filtered[self.page_range()]
            .iter()
            .map(|&i| &self.all[i])
            .collect()
    }

    /// The current page as an owned, index-addressable sequence.
    #[must_use]
    pub fn current_page_sequence(&self) -> FilteredRecords {
        FilteredRecords::new(
            Arc::clone(&self.all),
            Arc::from(&self.filtered[self.page_range()]),
        )
    }

    /// Every filtered record, in display order.
    #[must_use]
    pub fn all_filtered(&self) -> Vec<&Record> {
        self.filtered.iter().map(|&i| &self.all[i]).collect()
    }

    /// Owned copy of the filtered order, sharing the record slice.
    ///
    /// The snapshot stays valid after the view changes, so it can back a
    /// [`WindowRenderer`](crate::WindowRenderer) across later filters.
    #[must_use]
    pub fn snapshot(&self) -> FilteredRecords {
        FilteredRecords::new(Arc::clone(&self.all), Arc::clone(&self.filtered))
    }

    /// Pagination metadata for the current state.
    #[must_use]
    pub fn pagination_info(&self) -> PaginationInfo {
        let total_pages = self.total_pages();
        let range = self.page_range();
        let empty = range.is_empty();
        PaginationInfo {
            current_page: self.page + 1,
            total_pages,
            page_size: self.page_size,
            total_items: self.filtered.len(),
            start_index: if empty { 0 } else { range.start + 1 },
            end_index: if empty { 0 } else { range.end },
            has_next: self.page + 1 < total_pages,
            has_prev: self.page > 0,
        }
    }

    /// Records per page.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages in the filtered set.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(self.page_size)
    }

    /// Sum of a numeric field over the filtered records; unparsable values count as zero.
    #[must_use]
    pub fn sum(&self, field: &str) -> f64 {
        self.filtered.iter().map(|&i| self.all[i].number(field)).sum()
    }

    /// Mean of a numeric field over the filtered records, or zero when there are none.
    #[must_use]
    pub fn mean(&self, field: &str) -> f64 {
        if self.filtered.is_empty() {
            0.0
        } else {
            self.sum(field) / self.filtered.len() as f64
        }
    }

    /// Counts and a sampled memory estimate.
    #[must_use]
    pub fn stats(&self) -> ViewStats {
        ViewStats {
            total: self.all.len(),
            filtered: self.filtered.len(),
            current_page: self.page_range().len(),
            pages: self.total_pages(),
            memory: self.estimate_memory(),
        }
    }

    /// Registers a callback invoked with the current page and pagination info after every
    /// mutation.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&[&Record], &PaginationInfo) + Send + 'static,
    {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Removes a subscriber. Returns true if it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn page_range(&self) -> Range<usize> {
        let start = (self.page * self.page_size).min(self.filtered.len());
        let end = (start + self.page_size).min(self.filtered.len());
        start..end
    }

    fn estimate_memory(&self) -> MemoryEstimate {
        let sample_size = self.all.len().min(MEMORY_SAMPLE_SIZE);
        if sample_size == 0 {
            return MemoryEstimate::default();
        }
        let sample = &self.all[..sample_size];
        let sample_bytes = serde_json::to_vec(sample).map(|b| b.len()).unwrap_or(0);
        let avg = sample_bytes as f64 / sample_size as f64;
        MemoryEstimate {
            total_bytes: avg * self.all.len() as f64,
            per_page_bytes: avg * self.page_size as f64,
            avg_item_bytes: avg,
        }
    }

    fn notify(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let info = self.pagination_info();
        let range = self.page_range();
        let all = &self.all;
        let page: Vec<&Record> = self.filtered[range].iter().map(|&i| &all[i]).collect();
        for (_, callback) in &mut self.subscribers {
            callback(&page, &info);
        }
    }
}

/// Total order over optional JSON values used for sorting.
///
/// Missing and null sort first, then booleans, numbers, strings, arrays, and objects.
/// Values of the same kind compare naturally; arrays and objects by their JSON text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) if rank(a) >= 4 && rank(a) == rank(b) => {
            x.to_string().cmp(&y.to_string())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::IndexedSequence;
    use serde_json::json;
    use std::sync::Mutex;

    fn rows(values: &[i64]) -> Vec<Record> {
        values.iter().map(|&a| Record::new().with("a", a)).collect()
    }

    fn field(records: &[&Record], name: &str) -> Vec<f64> {
        records.iter().map(|r| r.number(name)).collect()
    }

    #[test]
    fn test_pagination_basics() {
        let mut view = DatasetView::new(ViewConfig::default().with_page_size(2));
        view.set_data(rows(&[1, 2, 3]));

        let info = view.pagination_info();
        assert_eq!(info.total_pages, 2);
        assert_eq!(info.current_page, 1);
        assert_eq!((info.start_index, info.end_index), (1, 2));
        assert!(info.has_next);
        assert!(!info.has_prev);

        assert!(view.next_page());
        assert_eq!(field(&view.current_page(), "a"), vec![3.0]);

        let info = view.pagination_info();
        assert_eq!((info.start_index, info.end_index), (3, 3));
        assert!(!info.has_next);
        assert!(info.has_prev);
    }

    #[test]
    fn test_out_of_range_pages_are_noops() {
        let mut view = DatasetView::new(ViewConfig::default().with_page_size(2));
        view.set_data(rows(&[1, 2, 3]));

        assert!(!view.page(2));
        assert!(!view.prev_page());
        assert_eq!(view.pagination_info().current_page, 1);

        assert!(view.last_page());
        assert!(!view.next_page());
        assert_eq!(view.pagination_info().current_page, 2);
    }

    #[test]
    fn test_empty_view() {
        let mut view = DatasetView::default();
        view.set_data(Vec::<Record>::new());

        let info = view.pagination_info();
        assert_eq!(info.total_pages, 0);
        assert_eq!((info.start_index, info.end_index), (0, 0));
        assert!(view.current_page().is_empty());
        assert!(!view.first_page());
        assert!(!view.last_page());
        assert_eq!(view.stats().memory, MemoryEstimate::default());
    }

    #[test]
    fn test_page_is_idempotent() {
        let mut view = DatasetView::new(ViewConfig::default().with_page_size(3));
        view.set_data(rows(&[5, 4, 3, 2, 1, 0, 9]));

        view.page(1);
        let first: Vec<Record> = view.current_page().into_iter().cloned().collect();
        view.page(1);
        let second: Vec<Record> = view.current_page().into_iter().cloned().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_resets_page_and_starts_from_all() {
        let mut view = DatasetView::new(ViewConfig::default().with_page_size(2));
        view.set_data(rows(&[1, 2, 3, 4, 5, 6]));
        view.last_page();

        view.apply_filter(|r| r.number("a") > 3.0);
        assert_eq!(view.pagination_info().current_page, 1);
        assert_eq!(field(&view.all_filtered(), "a"), vec![4.0, 5.0, 6.0]);

        view.apply_filter(|r| r.number("a") < 3.0);
        assert_eq!(field(&view.all_filtered(), "a"), vec![1.0, 2.0]);
    }

    #[test]
    fn test_snapshot_survives_later_mutations() {
        let mut view = DatasetView::default();
        view.set_data(rows(&[3, 1, 2]));
        view.apply_sort("a", SortOrder::Asc);

        let snapshot = view.snapshot();
        view.apply_filter(|r| r.number("a") > 2.0);

        assert_eq!(IndexedSequence::len(&snapshot), 3);
        assert_eq!(snapshot.get(0).map(|r| r.number("a")), Some(1.0));
        assert_eq!(snapshot.get(2).map(|r| r.number("a")), Some(3.0));
        assert_eq!(view.stats().filtered, 1);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut view = DatasetView::default();
        view.set_data(vec![
            Record::new().with("k", 2).with("id", 1),
            Record::new().with("k", 1).with("id", 2),
            Record::new().with("k", 2).with("id", 3),
            Record::new().with("k", 1).with("id", 4),
        ]);

        view.apply_sort("k", SortOrder::Asc);
        assert_eq!(field(&view.current_page(), "id"), vec![2.0, 4.0, 1.0, 3.0]);

        view.apply_sort("k", SortOrder::Desc);
        assert_eq!(field(&view.current_page(), "id"), vec![1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_sort_mixed_kinds() {
        let mut view = DatasetView::default();
        view.set_data(vec![
            Record::new().with("v", "b"),
            Record::new().with("v", 10),
            Record::new(),
            Record::new().with("v", "a"),
            Record::new().with("v", 2),
        ]);

        view.apply_sort("v", SortOrder::Asc);
        let texts: Vec<Option<String>> = view.current_page().iter().map(|r| r.text("v")).collect();
        assert_eq!(
            texts,
            vec![
                None,
                Some("2".to_string()),
                Some("10".to_string()),
                Some("a".to_string()),
                Some("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_search() {
        let mut view = DatasetView::default();
        view.set_data(vec![
            Record::new().with("store", "Kadikoy").with("product", "Tea"),
            Record::new().with("store", "Besiktas").with("product", "Coffee"),
            Record::new().with("store", "Uskudar").with("code", 4021),
        ]);

        view.search("KADI", &[]);
        assert_eq!(view.stats().filtered, 1);

        view.search("402", &[]);
        assert_eq!(view.stats().filtered, 1);

        view.search("coffee", &["store"]);
        assert_eq!(view.stats().filtered, 0);

        view.search("coffee", &["store", "product"]);
        assert_eq!(view.stats().filtered, 1);

        view.search("   ", &[]);
        assert_eq!(view.stats().filtered, 3);
    }

    #[test]
    fn test_search_keeps_surrounding_whitespace() {
        let mut view = DatasetView::default();
        view.set_data(vec![
            Record::new().with("product", "Steam Iron"),
            Record::new().with("product", "Green Tea"),
        ]);

        view.search(" tea", &["product"]);
        let products: Vec<String> = view
            .current_page()
            .iter()
            .filter_map(|record| record.text("product"))
            .collect();
        assert_eq!(products, ["Green Tea"]);

        view.search("tea", &["product"]);
        assert_eq!(view.stats().filtered, 2);
    }

    #[test]
    fn test_subscribers_notified_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut view = DatasetView::new(ViewConfig::default().with_page_size(2));

        let first = {
            let calls = Arc::clone(&calls);
            view.subscribe(move |page, info| {
                calls
                    .lock()
                    .unwrap()
                    .push(("first", page.len(), info.current_page));
            })
        };
        {
            let calls = Arc::clone(&calls);
            view.subscribe(move |page, info| {
                calls
                    .lock()
                    .unwrap()
                    .push(("second", page.len(), info.current_page));
            });
        }

        view.set_data(rows(&[1, 2, 3]));
        view.next_page();
        view.next_page();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                ("first", 2, 1),
                ("second", 2, 1),
                ("first", 1, 2),
                ("second", 1, 2),
            ]
        );

        assert!(view.unsubscribe(first));
        assert!(!view.unsubscribe(first));
        view.first_page();
        assert_eq!(calls.lock().unwrap().last(), Some(&("second", 2, 1)));
        assert_eq!(calls.lock().unwrap().len(), 5);
    }

    #[test]
    fn test_aggregates_treat_garbage_as_zero() {
        let mut view = DatasetView::default();
        view.set_data(vec![
            Record::new().with("amount", 10),
            Record::new().with("amount", "5.5"),
            Record::new().with("amount", "n/a"),
            Record::new().with("amount", json!(null)),
        ]);

        assert_eq!(view.sum("amount"), 15.5);
        assert_eq!(view.mean("amount"), 15.5 / 4.0);
    }

    #[test]
    fn test_stats_memory_estimate() {
        let mut view = DatasetView::new(ViewConfig::default().with_page_size(10));
        // `{"a":1}` serializes to 7 bytes; the sample array adds brackets and commas.
        view.set_data(rows(&[1; 4]));

        let stats = view.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.pages, 1);
        assert_eq!(stats.current_page, 4);
        let avg = stats.memory.avg_item_bytes;
        assert_eq!(avg, 33.0 / 4.0);
        assert_eq!(stats.memory.total_bytes, 33.0);
        assert_eq!(stats.memory.per_page_bytes, avg * 10.0);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn filter_and_sort_commute(values in prop::collection::vec(0i64..20, 0..60), threshold in 0i64..20) {
                let records: Vec<Record> = values
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| Record::new().with("k", v).with("id", i as i64))
                    .collect();
                let keep = move |r: &Record| r.number("k") >= threshold as f64;

                let mut filtered_then_sorted = DatasetView::default();
                filtered_then_sorted.set_data(records.clone());
                filtered_then_sorted.apply_filter(keep);
                filtered_then_sorted.apply_sort("k", SortOrder::Asc);

                let mut sorted = DatasetView::default();
                sorted.set_data(records);
                sorted.apply_sort("k", SortOrder::Asc);
                let expected: Vec<Record> = sorted
                    .snapshot()
                    .iter()
                    .filter(|r| keep(r))
                    .cloned()
                    .collect();

                let actual: Vec<Record> = filtered_then_sorted
                    .all_filtered()
                    .into_iter()
                    .cloned()
                    .collect();
                prop_assert_eq!(actual, expected);
            }

            #[test]
            fn pages_partition_filtered_set(len in 0usize..80, page_size in 1usize..12) {
                let mut view = DatasetView::new(ViewConfig::default().with_page_size(page_size));
                view.set_data(rows(&(0..len as i64).collect::<Vec<_>>()));

                let mut seen = Vec::new();
                if view.first_page() {
                    loop {
                        let info = view.pagination_info();
                        prop_assert!(info.current_page >= 1 && info.current_page <= info.total_pages);
                        seen.extend(field(&view.current_page(), "a"));
                        if !view.next_page() {
                            break;
                        }
                    }
                }
                let expected: Vec<f64> = (0..len).map(|v| v as f64).collect();
                prop_assert_eq!(seen, expected);
            }
        }
    }
}
