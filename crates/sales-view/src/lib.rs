#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Paginated dataset views and windowed rendering.
//!
//! A [`DatasetView`] owns the filtered, sorted record order for one selection. Its pages
//! (or the whole filtered sequence) are exposed through the [`IndexedSequence`] accessor,
//! which is all a [`WindowRenderer`] needs to turn rows into on-screen elements.

/// Index-based sequence accessor.
pub mod sequence;
/// Filter/sort/paginate engine.
pub mod view;
/// Windowed (virtual) renderer.
pub mod window;

pub use sequence::{FilteredRecords, IndexedSequence};
pub use view::{
    DatasetView, MemoryEstimate, PaginationInfo, SortOrder, SubscriptionId, ViewConfig, ViewStats,
};
pub use window::{ItemFactory, RenderWindow, SequenceFactory, WindowConfig, WindowRenderer};
