//! # Connected-component labelling
//!
//! Turns daily boolean masks into lists of connected objects, respecting
//! the grid topology: components are first labelled within each face in
//! isolation, then merged across declared edge adjacencies with a
//! disjoint-set forest. For a cylindrical grid the cross-face pass is
//! exactly the wrap-column merge.
//!
//! Modules
//! -----------------
//! * [`disjoint_set`] – Flat union–find scratch structure.
//! * [`day_labeller`] – Per-day labelling ([`label_day`]) and the
//!   parallel batch helper ([`label_days`]).
//! * [`stacked`] – The alternative 3-D mode: time as a third connectivity
//!   dimension, producing a [`TrackSet`](crate::tracking::track::TrackSet)
//!   directly (without split/merge annotations).
//!
//! [`label_day`]: day_labeller::label_day
//! [`label_days`]: day_labeller::label_days
pub mod day_labeller;
pub mod disjoint_set;
pub mod stacked;

pub use day_labeller::{label_day, label_days};
pub use disjoint_set::DisjointSet;
pub use stacked::label_stacked;
