//! # Day-to-day tracking
//!
//! Links the per-day object lists into tracks that may split and merge.
//! The tracker consumes opaque cell-identifier sets and the overlap
//! kernel only; it is agnostic to the grid topology that produced them.
//!
//! Modules
//! -----------------
//! * [`object`] – [`Object`](object::Object) (a connected set of cells)
//!   and the overlap kernel `|A ∩ B| / min(|A|, |B|)`.
//! * [`track`] – [`Track`](track::Track) and the final
//!   [`TrackSet`](track::TrackSet) archive, with duration statistics and
//!   the post-hoc cut-off filter.
//! * [`tracker`] – The sequential day-sequence linker
//!   ([`Tracker`](tracker::Tracker)), with split/merge resolution and
//!   cooperative cancellation at day boundaries.
pub mod object;
pub mod track;
pub mod tracker;

pub use object::Object;
pub use track::{DurationStats, Track, TrackSet};
pub use tracker::Tracker;
