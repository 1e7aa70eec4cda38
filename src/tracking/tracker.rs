//! # The day-sequence linker
//!
//! Consumes the per-day object lists in day order and produces the final
//! [`TrackSet`], resolving continuations, splits, merges, births, and
//! deaths.
//!
//! ## Per-day procedure
//! -----------------
//! For day `t`, given the previous search set:
//!
//! 1. **Adjacency gate** – only tracks whose last day is `t − 1` are
//!    scored; staler tracks are already dead and archive at the end of
//!    the step.
//! 2. **Overlap scoring** – every eligible track's last object is scored
//!    against every new object with `|A ∩ B| / min(|A|, |B|)`.
//! 3. **Matching** – children scoring at least `alpha` continue the
//!    track; several matches make a split, recorded on the track, with
//!    the union of all children attached as the day-`t` object. Exact
//!    score ties need no tie-break: both children are absorbed by the
//!    same split.
//! 4. **Merge resolution** – a child reached by several tracks keeps the
//!    first of them in search order; the others are archived with their
//!    day-`t` object in place. The archived last day carries the merge
//!    implicitly; no parent/child references are stored.
//! 5. **Birth** – every unmatched child seeds a new track.
//! 6. **Death** – tracks that did not reach day `t` move to the archive.
//!
//! The linker is strictly sequential in day order. Cancellation is
//! cooperative at day boundaries: a cancelled run archives the live
//! search set and returns a semantically valid truncated archive.
//!
//! ## Example
//! -----------------
//! ```rust,no_run
//! use tethys::grid::{DayMask, Grid};
//! use tethys::labelling::label_days;
//! use tethys::params::TrackParams;
//! use tethys::tracking::Tracker;
//!
//! # fn demo(masks: Vec<DayMask>) -> Result<(), tethys::tethys_errors::TethysError> {
//! let grid = Grid::cylindrical(360, 180);
//! let params = TrackParams::builder().minpix(20).alpha(0.5).build()?;
//!
//! let day_objects = label_days(&grid, &masks, &params)?;
//! let track_set = Tracker::run(day_objects.into_iter().enumerate(), &params);
//! println!("{} tracks", track_set.len());
//! # Ok(()) }
//! ```
use smallvec::SmallVec;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::constants::{DayIndex, DayObjects};
use crate::params::TrackParams;
use crate::tracking::object::Object;
use crate::tracking::track::{Track, TrackSet};

/// The incremental day-to-day linker.
///
/// Feed days in strictly increasing order with [`advance`](Self::advance),
/// then call [`finish`](Self::finish). The batch wrappers
/// [`run`](Self::run) and [`run_with_cancel`](Self::run_with_cancel)
/// cover the common whole-range case.
#[derive(Debug, Clone)]
pub struct Tracker {
    params: TrackParams,
    search: Vec<Track>,
    archive: Vec<Track>,
    last_seen_day: Option<DayIndex>,
}

impl Tracker {
    pub fn new(params: &TrackParams) -> Self {
        Self {
            params: params.clone(),
            search: Vec::new(),
            archive: Vec::new(),
            last_seen_day: None,
        }
    }

    /// Tracks still alive on the most recently consumed day.
    #[inline]
    pub fn n_active(&self) -> usize {
        self.search.len()
    }

    /// Tracks already archived.
    #[inline]
    pub fn n_archived(&self) -> usize {
        self.archive.len()
    }

    /// Consume one day's objects.
    ///
    /// Days must arrive in strictly increasing order; feeding a stale day
    /// is an invariant violation on the caller's side, not a recoverable
    /// data condition. An empty day is processed normally: nothing
    /// matches and every active track dies.
    ///
    /// Arguments
    /// ---------
    /// * `day`: the day index of `objects`.
    /// * `objects`: the labelled objects of that day; their positions are
    ///   the day's local identifiers.
    pub fn advance(&mut self, day: DayIndex, objects: DayObjects) {
        debug_assert!(
            self.last_seen_day.is_none_or(|last| day > last),
            "days must be fed in strictly increasing order"
        );
        self.last_seen_day = Some(day);

        // Steps 1-3: score each eligible track against every child and
        // collect the matched child sets.
        let mut used_count = vec![0usize; objects.len()];
        let mut matched: Vec<SmallVec<[usize; 4]>> = Vec::with_capacity(self.search.len());
        for track in &self.search {
            let mut hits: SmallVec<[usize; 4]> = SmallVec::new();
            if day > 0 && track.last_day() == day - 1 {
                let last = track.last_object();
                for (k, child) in objects.iter().enumerate() {
                    if last.overlap(child) >= self.params.alpha {
                        hits.push(k);
                    }
                }
            }
            for &k in &hits {
                used_count[k] += 1;
            }
            matched.push(hits);
        }

        for (track, hits) in self.search.iter_mut().zip(&matched) {
            match hits.len() {
                0 => {}
                1 => track.push(day, objects[hits[0]].clone()),
                n => {
                    track.push(day, Object::union_of(hits.iter().map(|&k| &objects[k])));
                    track.record_split(day, n);
                }
            }
        }

        // Step 4: a child reached by several tracks keeps the first of
        // them in search order; every other track that reached it is
        // archived as completed today.
        let mut merged_away = vec![false; self.search.len()];
        for (k, &count) in used_count.iter().enumerate() {
            if count <= 1 {
                continue;
            }
            let mut survivor_seen = false;
            for (idx, hits) in matched.iter().enumerate() {
                if !hits.contains(&k) {
                    continue;
                }
                if survivor_seen {
                    merged_away[idx] = true;
                } else {
                    survivor_seen = true;
                }
            }
        }

        // Step 6 (with the merge outcomes applied): only tracks that
        // reached today and lost no merge stay in the search set.
        let mut survivors = Vec::with_capacity(self.search.len());
        for (idx, track) in self.search.drain(..).enumerate() {
            if merged_away[idx] || track.last_day() < day {
                self.archive.push(track);
            } else {
                survivors.push(track);
            }
        }
        self.search = survivors;

        // Step 5: unmatched children seed new tracks.
        for (k, child) in objects.into_iter().enumerate() {
            if used_count[k] == 0 {
                self.search.push(Track::new(day, k, child));
            }
        }
    }

    /// Archive the remaining search set and return the final archive,
    /// applying the `cut_off` duration filter when configured.
    pub fn finish(mut self) -> TrackSet {
        self.archive.append(&mut self.search);
        let mut set = TrackSet::from_tracks(self.archive);
        if let Some(cut_off) = self.params.cut_off {
            set.filter_by_duration(cut_off);
        }
        set
    }

    /// Run the linker over a whole day sequence.
    ///
    /// Arguments
    /// ---------
    /// * `days`: `(day, objects)` pairs in strictly increasing day order.
    /// * `params`: tracking parameters.
    pub fn run(
        days: impl IntoIterator<Item = (DayIndex, DayObjects)>,
        params: &TrackParams,
    ) -> TrackSet {
        Self::run_with_cancel(days, params, || false)
    }

    /// Run the linker with cooperative cancellation.
    ///
    /// `should_cancel` is polled once per day boundary; when it returns
    /// true the remaining days are skipped and the still-active search
    /// set is archived early. The truncated result is a semantically
    /// valid archive for the consumed prefix of the input.
    pub fn run_with_cancel<F>(
        days: impl IntoIterator<Item = (DayIndex, DayObjects)>,
        params: &TrackParams,
        mut should_cancel: F,
    ) -> TrackSet
    where
        F: FnMut() -> bool,
    {
        let mut tracker = Tracker::new(params);

        #[cfg(feature = "progress")]
        let pb = {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner} day {msg} | {per_sec}")
                    .expect("indicatif template"),
            );
            pb
        };

        for (day, objects) in days {
            if should_cancel() {
                break;
            }

            #[cfg(feature = "progress")]
            pb.set_message(format!(
                "{day} ({} active, {} archived)",
                tracker.n_active(),
                tracker.n_archived()
            ));

            tracker.advance(day, objects);

            #[cfg(feature = "progress")]
            pb.inc(1);
        }

        #[cfg(feature = "progress")]
        pb.finish_and_clear();

        tracker.finish()
    }
}
