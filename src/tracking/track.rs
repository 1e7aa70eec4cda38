use std::fmt;

use smallvec::SmallVec;

use crate::constants::DayIndex;
use crate::grid::CellId;
use crate::tracking::object::Object;

/// A time-ordered sequence of objects linked by sufficient overlap.
///
/// Days are stored alongside their objects in parallel append-only
/// vectors; consecutive stored days differ by exactly 1 while the track
/// is active. On a split day the stored object is the union of every
/// child the track matched.
#[derive(Debug, Clone)]
pub struct Track {
    ori_day: DayIndex,
    ori_order: usize,
    days: Vec<DayIndex>,
    objects: Vec<Object>,
    split_days: SmallVec<[DayIndex; 4]>,
    split_num: SmallVec<[usize; 4]>,
}

impl Track {
    /// Seed a new track with its birth day and object.
    pub(crate) fn new(ori_day: DayIndex, ori_order: usize, object: Object) -> Self {
        Self {
            ori_day,
            ori_order,
            days: vec![ori_day],
            objects: vec![object],
            split_days: SmallVec::new(),
            split_num: SmallVec::new(),
        }
    }

    /// Append the next day's object. Days must be contiguous.
    pub(crate) fn push(&mut self, day: DayIndex, object: Object) {
        debug_assert_eq!(day, self.last_day() + 1, "track days must be contiguous");
        self.days.push(day);
        self.objects.push(object);
    }

    /// Record a split: `n` children were absorbed on `day`.
    pub(crate) fn record_split(&mut self, day: DayIndex, n: usize) {
        self.split_days.push(day);
        self.split_num.push(n);
    }

    /// First day of the track's lifetime.
    #[inline]
    pub fn ori_day(&self) -> DayIndex {
        self.ori_day
    }

    /// The birth-day object identifier this track began from.
    #[inline]
    pub fn ori_order(&self) -> usize {
        self.ori_order
    }

    #[inline]
    pub fn last_day(&self) -> DayIndex {
        *self.days.last().expect("a track is never empty")
    }

    #[inline]
    pub fn last_object(&self) -> &Object {
        self.objects.last().expect("a track is never empty")
    }

    /// Number of recorded days.
    #[inline]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Lifetime length in days, `last_day - ori_day + 1`.
    #[inline]
    pub fn duration(&self) -> usize {
        self.last_day() - self.ori_day + 1
    }

    #[inline]
    pub fn days(&self) -> &[DayIndex] {
        &self.days
    }

    #[inline]
    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    /// The object attached on `day`, if the track was alive then.
    pub fn object_on(&self, day: DayIndex) -> Option<&Object> {
        if day < self.ori_day || day > self.last_day() {
            return None;
        }
        Some(&self.objects[day - self.ori_day])
    }

    /// Days on which this track split, with the child counts absorbed.
    #[inline]
    pub fn split_days(&self) -> &[DayIndex] {
        &self.split_days
    }

    #[inline]
    pub fn split_num(&self) -> &[usize] {
        &self.split_num
    }

    /// Iterate `(day, object)` pairs in day order.
    pub fn iter(&self) -> impl Iterator<Item = (DayIndex, &Object)> {
        self.days.iter().copied().zip(self.objects.iter())
    }

    /// The day-indexed cell sequence, the content two tracks are compared
    /// on when archive order must not matter.
    fn content_key(&self) -> Vec<(DayIndex, Vec<CellId>)> {
        self.iter()
            .map(|(day, object)| (day, object.cells().to_vec()))
            .collect()
    }
}

impl fmt::Display for Track {
    /// Compact by default; per-day listing with the alternate flag (`{:#}`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(
                f,
                "Track born day {} (object {}), {} days, {} splits",
                self.ori_day,
                self.ori_order,
                self.len(),
                self.split_days.len()
            )?;
            for (day, object) in self.iter() {
                let split = if self.split_days.contains(&day) {
                    " [split]"
                } else {
                    ""
                };
                writeln!(f, "  day {:>4}: {:>6} cells{}", day, object.len(), split)?;
            }
            Ok(())
        } else {
            write!(
                f,
                "Track(ori_day={}, ori_order={}, days={}..={}, splits={})",
                self.ori_day,
                self.ori_order,
                self.ori_day,
                self.last_day(),
                self.split_days.len()
            )
        }
    }
}

/// Summary statistics for track durations in a [`TrackSet`].
///
/// Percentiles use the nearest-rank method (index `round(q × (N-1))`
/// clamped to range), which stays stable for small archives.
#[derive(Debug, Clone, Copy)]
pub struct DurationStats {
    pub min: usize,
    pub p25: usize,
    pub median: usize,
    pub p95: usize,
    pub max: usize,
}

impl fmt::Display for DurationStats {
    /// Compact by default; pretty multi-line when using the alternate flag (`{:#}`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Track duration (days) — summary")?;
            writeln!(f, "-------------------------------")?;
            writeln!(f, "min    : {}", self.min)?;
            writeln!(f, "p25    : {}", self.p25)?;
            writeln!(f, "median : {}", self.median)?;
            writeln!(f, "p95    : {}", self.p95)?;
            write!(f, "max    : {}", self.max)
        } else {
            write!(
                f,
                "min={}, p25={}, median={}, p95={}, max={}",
                self.min, self.p25, self.median, self.p95, self.max
            )
        }
    }
}

/// The final archive of tracks.
///
/// Archive order is implementation-defined; comparisons that must not
/// depend on it go through [`TrackSet::same_tracks`].
#[derive(Debug, Clone, Default)]
pub struct TrackSet {
    tracks: Vec<Track>,
}

impl TrackSet {
    pub(crate) fn from_tracks(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[inline]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks
    }

    /// Drop every track shorter than `cut_off` days.
    pub fn filter_by_duration(&mut self, cut_off: usize) {
        self.tracks.retain(|t| t.duration() >= cut_off);
    }

    /// Total number of `(day, object)` records across the archive.
    #[inline]
    pub fn total_object_days(&self) -> usize {
        self.tracks.iter().map(Track::len).sum()
    }

    /// Compute distribution statistics for track durations.
    ///
    /// Return
    /// ------
    /// * `None` if the archive is empty.
    /// * `Some(DurationStats)` otherwise.
    pub fn duration_stats(&self) -> Option<DurationStats> {
        let mut durations: Vec<usize> = self.tracks.iter().map(Track::duration).collect();
        if durations.is_empty() {
            return None;
        }
        durations.sort_unstable();

        #[inline]
        fn q_index(n: usize, q: f64) -> usize {
            let pos = q * (n as f64 - 1.0);
            let idx = pos.round() as isize;
            idx.clamp(0, (n as isize) - 1) as usize
        }

        let n = durations.len();
        Some(DurationStats {
            min: durations[0],
            p25: durations[q_index(n, 0.25)],
            median: durations[q_index(n, 0.50)],
            p95: durations[q_index(n, 0.95)],
            max: durations[n - 1],
        })
    }

    /// Archive-order-insensitive equality on day-indexed cell sequences.
    ///
    /// Two archives compare equal iff they hold the same multiset of
    /// tracks, each track compared as its `(day, cells)` sequence.
    pub fn same_tracks(&self, other: &TrackSet) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut a: Vec<_> = self.tracks.iter().map(Track::content_key).collect();
        let mut b: Vec<_> = other.tracks.iter().map(Track::content_key).collect();
        a.sort();
        b.sort();
        a == b
    }
}

impl IntoIterator for TrackSet {
    type Item = Track;
    type IntoIter = std::vec::IntoIter<Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.into_iter()
    }
}

#[cfg(test)]
mod track_test {
    use super::*;

    fn cell_object(cells: &[(usize, usize)]) -> Object {
        Object::new(
            cells
                .iter()
                .map(|&(i, j)| crate::grid::CellId::new(0, i, j))
                .collect(),
        )
    }

    fn simple_track(ori_day: usize, n_days: usize) -> Track {
        let mut track = Track::new(ori_day, 0, cell_object(&[(1, 1), (1, 2)]));
        for d in 1..n_days {
            track.push(ori_day + d, cell_object(&[(1, 1), (1, 2)]));
        }
        track
    }

    #[test]
    fn test_track_accessors() {
        let mut track = Track::new(4, 2, cell_object(&[(0, 0)]));
        track.push(5, cell_object(&[(0, 0), (0, 1)]));
        track.record_split(5, 2);

        assert_eq!(track.ori_day(), 4);
        assert_eq!(track.ori_order(), 2);
        assert_eq!(track.last_day(), 5);
        assert_eq!(track.duration(), 2);
        assert_eq!(track.split_days(), &[5]);
        assert_eq!(track.split_num(), &[2]);
        assert_eq!(track.object_on(5).unwrap().len(), 2);
        assert!(track.object_on(6).is_none());
        assert!(track.object_on(3).is_none());
    }

    #[test]
    fn test_duration_stats() {
        let set = TrackSet::from_tracks(vec![
            simple_track(0, 2),
            simple_track(3, 10),
            simple_track(1, 4),
        ]);
        let stats = set.duration_stats().unwrap();
        assert_eq!(stats.min, 2);
        assert_eq!(stats.median, 4);
        assert_eq!(stats.max, 10);

        assert!(TrackSet::default().duration_stats().is_none());
    }

    #[test]
    fn test_filter_by_duration() {
        let mut set = TrackSet::from_tracks(vec![simple_track(0, 2), simple_track(0, 6)]);
        set.filter_by_duration(5);
        assert_eq!(set.len(), 1);
        assert_eq!(set.tracks()[0].duration(), 6);
    }

    #[test]
    fn test_same_tracks_ignores_archive_order() {
        let a = TrackSet::from_tracks(vec![simple_track(0, 2), simple_track(5, 3)]);
        let b = TrackSet::from_tracks(vec![simple_track(5, 3), simple_track(0, 2)]);
        assert!(a.same_tracks(&b));

        let c = TrackSet::from_tracks(vec![simple_track(0, 2), simple_track(5, 4)]);
        assert!(!a.same_tracks(&c));
    }

    #[test]
    fn test_display_forms() {
        let track = simple_track(3, 4);
        let compact = format!("{track}");
        assert!(compact.contains("days=3..=6"));
        let pretty = format!("{track:#}");
        assert!(pretty.contains("day    3"));
    }
}
