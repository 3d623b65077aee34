//! Windowed (virtual) rendering of long sequences.
//!
//! Only the items inside the viewport plus a fixed buffer on either side are instantiated.
//! Every item has the same extent, so the total scrollable extent is `len * item_extent`
//! and an item's offset is `index * item_extent`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;
use tracing::{debug, trace};

use crate::sequence::IndexedSequence;

/// Renderer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Extent of one item along the scroll axis. Must be positive.
    pub item_extent: f64,
    /// Items instantiated beyond each edge of the viewport.
    pub buffer: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            item_extent: 50.0,
            buffer: 5,
        }
    }
}

impl WindowConfig {
    /// Set the item extent.
    #[must_use]
    pub const fn with_item_extent(mut self, item_extent: f64) -> Self {
        self.item_extent = item_extent;
        self
    }

    /// Set the buffer size.
    #[must_use]
    pub const fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer;
        self
    }
}

/// Creates the element for one index.
pub trait ItemFactory {
    /// Produced element type.
    type Element;

    /// Creates the element for `index`, or `None` if the index has no item.
    fn create(&mut self, index: usize) -> Option<Self::Element>;
}

/// [`ItemFactory`] that renders the items of an [`IndexedSequence`] with a closure.
pub struct SequenceFactory<S, F, E> {
    sequence: S,
    render: F,
    _element: PhantomData<fn() -> E>,
}

impl<S, F, E> SequenceFactory<S, F, E>
where
    S: IndexedSequence,
    F: FnMut(&S::Item, usize) -> E,
{
    /// Wrap `sequence`, rendering each item with `render(item, index)`.
    pub const fn new(sequence: S, render: F) -> Self {
        Self {
            sequence,
            render,
            _element: PhantomData,
        }
    }

    /// The wrapped sequence.
    pub const fn sequence(&self) -> &S {
        &self.sequence
    }
}

impl<S, F, E> fmt::Debug for SequenceFactory<S, F, E>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceFactory")
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

impl<S, F, E> ItemFactory for SequenceFactory<S, F, E>
where
    S: IndexedSequence,
    F: FnMut(&S::Item, usize) -> E,
{
    type Element = E;

    fn create(&mut self, index: usize) -> Option<E> {
        let item = self.sequence.get(index)?;
        Some((self.render)(item, index))
    }
}

/// Visible index range and the buffer around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderWindow {
    /// First visible index.
    pub start: usize,
    /// One past the last visible index.
    pub end: usize,
    /// Extra items kept on each side.
    pub buffer: usize,
    len: usize,
}

impl RenderWindow {
    /// Indices that should be instantiated: the visible range widened by the buffer.
    #[must_use]
    pub fn materialized(&self) -> Range<usize> {
        let start = self.start.saturating_sub(self.buffer);
        let end = self.end.saturating_add(self.buffer).min(self.len);
        start..end
    }

    /// Visible indices.
    #[must_use]
    pub const fn visible(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Keeps only the elements near the viewport instantiated.
pub struct WindowRenderer<F: ItemFactory> {
    factory: F,
    len: usize,
    config: WindowConfig,
    scroll_offset: f64,
    viewport_extent: f64,
    elements: BTreeMap<usize, F::Element>,
    destroyed: bool,
}

impl<F: ItemFactory> fmt::Debug for WindowRenderer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowRenderer")
            .field("len", &self.len)
            .field("config", &self.config)
            .field("scroll_offset", &self.scroll_offset)
            .field("viewport_extent", &self.viewport_extent)
            .field("instantiated", &self.elements.len())
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl<F: ItemFactory> WindowRenderer<F> {
    /// Create a renderer for `len` items and instantiate the initial window.
    ///
    /// A non-positive or non-finite item extent falls back to the default.
    pub fn new(factory: F, len: usize, viewport_extent: f64, mut config: WindowConfig) -> Self {
        if !(config.item_extent.is_finite() && config.item_extent > 0.0) {
            config.item_extent = WindowConfig::default().item_extent;
        }
        let mut renderer = Self {
            factory,
            len,
            config,
            scroll_offset: 0.0,
            viewport_extent: sanitize(viewport_extent),
            elements: BTreeMap::new(),
            destroyed: false,
        };
        renderer.reconcile();
        renderer
    }

    /// Handle a scroll to `offset` with a viewport of `viewport_extent`.
    ///
    /// Negative or NaN values are treated as zero.
    pub fn on_scroll(&mut self, offset: f64, viewport_extent: f64) {
        if self.destroyed {
            return;
        }
        self.scroll_offset = sanitize(offset);
        self.viewport_extent = sanitize(viewport_extent);
        self.reconcile();
    }

    /// Handle a viewport resize.
    pub fn on_resize(&mut self, viewport_extent: f64) {
        if self.destroyed {
            return;
        }
        self.viewport_extent = sanitize(viewport_extent);
        self.reconcile();
    }

    /// Scroll so that item `index` starts at the top of the viewport.
    ///
    /// Indices past the end are clamped to the last item.
    pub fn scroll_to_index(&mut self, index: usize) {
        let index = index.min(self.len.saturating_sub(1));
        self.on_scroll(self.offset_of(index), self.viewport_extent);
    }

    /// Change the number of items. Elements past the new end are dropped.
    pub fn set_sequence_length(&mut self, len: usize) {
        if self.destroyed {
            return;
        }
        self.len = len;
        self.reconcile();
    }

    /// Change the item extent. Non-positive or non-finite extents are ignored.
    pub fn set_item_extent(&mut self, item_extent: f64) {
        if self.destroyed || !(item_extent.is_finite() && item_extent > 0.0) {
            return;
        }
        self.config.item_extent = item_extent;
        self.reconcile();
    }

    /// Replace the item source and length, dropping every instantiated element.
    pub fn set_items(&mut self, factory: F, len: usize) {
        if self.destroyed {
            return;
        }
        self.factory = factory;
        self.len = len;
        self.elements.clear();
        self.reconcile();
    }

    /// Re-create every element in the current window.
    pub fn refresh(&mut self) {
        if self.destroyed {
            return;
        }
        self.elements.clear();
        self.reconcile();
    }

    /// Drop every element and stop reacting to events.
    pub fn destroy(&mut self) {
        self.elements.clear();
        self.destroyed = true;
        debug!("Window renderer destroyed");
    }

    /// Current window.
    #[must_use]
    pub fn window(&self) -> RenderWindow {
        if self.len == 0 {
            return RenderWindow {
                start: 0,
                end: 0,
                buffer: self.config.buffer,
                len: 0,
            };
        }
        let extent = self.config.item_extent;
        let start = ((self.scroll_offset / extent).floor() as usize).min(self.len);
        let end = (((self.scroll_offset + self.viewport_extent) / extent).ceil() as usize)
            .min(self.len)
            .max(start);
        RenderWindow {
            start,
            end,
            buffer: self.config.buffer,
            len: self.len,
        }
    }

    /// Indices that currently have an element, in ascending order.
    #[must_use]
    pub fn instantiated_indices(&self) -> Vec<usize> {
        self.elements.keys().copied().collect()
    }

    /// Element at `index`, if instantiated.
    #[must_use]
    pub fn element(&self, index: usize) -> Option<&F::Element> {
        self.elements.get(&index)
    }

    /// Instantiated elements with their indices and offsets, in ascending index order.
    pub fn elements(&self) -> impl Iterator<Item = (usize, f64, &F::Element)> {
        self.elements
            .iter()
            .map(|(&index, element)| (index, self.offset_of(index), element))
    }

    /// Total scrollable extent.
    #[must_use]
    pub fn total_extent(&self) -> f64 {
        self.len as f64 * self.config.item_extent
    }

    /// Offset of item `index` along the scroll axis.
    #[must_use]
    pub fn offset_of(&self, index: usize) -> f64 {
        index as f64 * self.config.item_extent
    }

    /// Current scroll offset.
    #[must_use]
    pub const fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    /// Number of items in the sequence.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the sequence is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true once [`destroy`](Self::destroy) has been called.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Drop elements outside the window and create the missing ones.
    fn reconcile(&mut self) {
        let range = self.window().materialized();
        self.elements.retain(|index, _| range.contains(index));

        let mut created = 0usize;
        for index in range.clone() {
            if self.elements.contains_key(&index) {
                continue;
            }
            if let Some(element) = self.factory.create(index) {
                self.elements.insert(index, element);
                created += 1;
            }
        }
        trace!(
            start = range.start,
            end = range.end,
            created,
            instantiated = self.elements.len(),
            "Window reconciled"
        );
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct CountingFactory {
        created: Vec<usize>,
    }

    impl ItemFactory for CountingFactory {
        type Element = String;

        fn create(&mut self, index: usize) -> Option<String> {
            self.created.push(index);
            Some(format!("row-{index}"))
        }
    }

    fn renderer(len: usize) -> WindowRenderer<CountingFactory> {
        WindowRenderer::new(
            CountingFactory::default(),
            len,
            500.0,
            WindowConfig::default(),
        )
    }

    #[test]
    fn test_initial_window() {
        let r = renderer(10_000);
        assert_eq!(r.window().visible(), 0..10);
        assert_eq!(r.instantiated_indices(), (0..15).collect::<Vec<_>>());
        assert_eq!(r.total_extent(), 500_000.0);
    }

    #[test]
    fn test_scroll_window() {
        let mut r = renderer(10_000);
        r.on_scroll(5_000.0, 500.0);

        let window = r.window();
        assert_eq!(window.visible(), 100..110);
        assert_eq!(window.materialized(), 95..115);
        assert_eq!(r.instantiated_indices(), (95..115).collect::<Vec<_>>());
        assert_eq!(r.element(100).map(String::as_str), Some("row-100"));
        assert!(r.element(0).is_none());
    }

    #[test]
    fn test_window_end_of_sequence() {
        let mut r = renderer(3);
        assert_eq!(r.instantiated_indices(), vec![0, 1, 2]);

        r.on_scroll(1_000_000.0, 500.0);
        let window = r.window();
        assert_eq!(window.visible(), 3..3);
        assert_eq!(window.materialized(), 0..3);
    }

    #[test]
    fn test_existing_elements_are_reused() {
        let mut r = renderer(1_000);
        r.on_scroll(100.0, 500.0);

        // Only the two items newly inside the buffer are created.
        assert_eq!(r.factory.created.len(), 17);
        assert_eq!(&r.factory.created[15..], &[15, 16]);
    }

    #[test]
    fn test_bad_offsets_clamp_to_zero() {
        let mut r = renderer(100);
        r.on_scroll(2_000.0, 500.0);
        r.on_scroll(f64::NAN, 500.0);
        assert_eq!(r.scroll_offset(), 0.0);
        assert_eq!(r.window().start, 0);

        r.on_scroll(-50.0, 500.0);
        assert_eq!(r.scroll_offset(), 0.0);
    }

    #[test]
    fn test_scroll_to_index() {
        let mut r = renderer(100);
        r.scroll_to_index(40);
        assert_eq!(r.scroll_offset(), 2_000.0);
        assert_eq!(r.window().start, 40);

        r.scroll_to_index(1_000);
        assert_eq!(r.scroll_offset(), r.offset_of(99));
    }

    #[test]
    fn test_empty_sequence() {
        let mut r = renderer(0);
        r.scroll_to_index(5);
        assert!(r.is_empty());
        assert!(r.instantiated_indices().is_empty());
        assert_eq!(r.total_extent(), 0.0);
    }

    #[test]
    fn test_resize_and_set_items() {
        let mut r = renderer(100);
        r.on_resize(1_000.0);
        assert_eq!(r.window().visible(), 0..20);
        assert_eq!(r.instantiated_indices().len(), 25);

        r.set_items(CountingFactory::default(), 4);
        assert_eq!(r.instantiated_indices(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_length_and_extent_changes() {
        let mut r = renderer(100);
        r.on_scroll(4_000.0, 500.0);
        assert_eq!(r.window().visible(), 80..90);

        r.set_sequence_length(85);
        assert_eq!(r.instantiated_indices(), (75..85).collect::<Vec<_>>());

        r.set_item_extent(100.0);
        assert_eq!(r.window().visible(), 40..45);
        assert_eq!(r.total_extent(), 8_500.0);

        r.set_item_extent(0.0);
        assert_eq!(r.total_extent(), 8_500.0);
    }

    #[test]
    fn test_destroy_ignores_later_events() {
        let mut r = renderer(100);
        r.destroy();
        assert!(r.is_destroyed());
        assert!(r.instantiated_indices().is_empty());

        r.on_scroll(1_000.0, 500.0);
        r.refresh();
        assert!(r.instantiated_indices().is_empty());
        assert_eq!(r.scroll_offset(), 0.0);
    }

    #[test]
    fn test_sequence_factory() {
        let items: Arc<[&str]> = Arc::from(vec!["a", "b", "c"]);
        let factory = SequenceFactory::new(items, |item: &&str, index| format!("{index}:{item}"));
        let r = WindowRenderer::new(factory, 3, 100.0, WindowConfig::default());

        let rendered: Vec<(usize, f64, String)> = r
            .elements()
            .map(|(i, offset, e)| (i, offset, e.clone()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                (0, 0.0, "0:a".to_string()),
                (1, 50.0, "1:b".to_string()),
                (2, 100.0, "2:c".to_string()),
            ]
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn instantiated_covers_visible_within_buffer(
                len in 0usize..5_000,
                offsets in prop::collection::vec(0.0f64..300_000.0, 1..20),
                viewport in 0.0f64..2_000.0,
                buffer in 0usize..10,
            ) {
                let config = WindowConfig::default().with_buffer(buffer);
                let mut r = WindowRenderer::new(CountingFactory::default(), len, viewport, config);
                for offset in offsets {
                    r.on_scroll(offset, viewport);
                    let window = r.window();
                    let instantiated = r.instantiated_indices();

                    for index in window.visible() {
                        prop_assert!(instantiated.contains(&index));
                    }
                    let low = window.start.saturating_sub(buffer);
                    let high = (window.end + buffer).min(len);
                    prop_assert_eq!(instantiated, (low..high).collect::<Vec<_>>());
                }
            }
        }
    }
}
