use std::collections::HashMap;

use ahash::RandomState;
use itertools::Itertools;
use log::warn;

use crate::constants::DayIndex;
use crate::grid::{CellId, DayMask, Grid};
use crate::labelling::disjoint_set::DisjointSet;
use crate::params::TrackParams;
use crate::tethys_errors::TethysError;
use crate::tracking::object::Object;
use crate::tracking::track::{Track, TrackSet};

/// Label the stacked mask with time as a third connectivity dimension.
///
/// This is the alternative single-pass mode: each 3-D component becomes a
/// track directly, bypassing the day-to-day linker — and therefore
/// carrying no split or merge annotations. Connectivity is the configured
/// in-plane neighbourhood plus a temporal link between the same cell on
/// consecutive days, so the day span of every component is contiguous.
///
/// When `params.morph_radius > 0`, each time slice first runs through a
/// close-then-open morphological filter with a Chebyshev disc of that
/// radius, walking the topology primitive so cyclic longitudes dilate
/// across the wrap.
///
/// Arguments
/// ---------
/// * `grid`: the grid topology.
/// * `masks`: one mask per day, in day order; days are the positions in
///   this slice.
/// * `params`: supplies `connectivity`, `minpix` (applied to the total
///   3-D component size), and `morph_radius`.
///
/// Return
/// ------
/// * The archive of one track per surviving component, or
///   [`TethysError::ShapeMismatch`] when a mask does not fit the grid.
pub fn label_stacked(
    grid: &Grid,
    masks: &[DayMask],
    params: &TrackParams,
) -> Result<TrackSet, TethysError> {
    for mask in masks {
        if !mask.shape_matches(grid) {
            return Err(TethysError::ShapeMismatch(
                "day mask shape does not match the grid".into(),
            ));
        }
    }

    let filtered: Vec<DayMask>;
    let slices: &[DayMask] = if params.morph_radius == 0 {
        masks
    } else {
        filtered = masks
            .iter()
            .map(|mask| close_then_open(grid, mask, params))
            .collect();
        &filtered
    };

    // Enumerate active (day, cell) pairs in (day, face, i, j) order, so
    // every later bucket comes out day-and-cell sorted.
    let mut index: HashMap<(DayIndex, CellId), usize, RandomState> = HashMap::default();
    let mut entries: Vec<(DayIndex, CellId)> = Vec::new();
    for (day, mask) in slices.iter().enumerate() {
        for f in 0..grid.n_faces() {
            let face = grid.face(f);
            for i in 0..face.nx {
                for j in 0..face.ny {
                    let cell = CellId::new(f, i, j);
                    if mask.get(cell) {
                        index.insert((day, cell), entries.len());
                        entries.push((day, cell));
                    }
                }
            }
        }
    }

    let mut forest = DisjointSet::new(entries.len());
    for (idx, &(day, cell)) in entries.iter().enumerate() {
        for &(di, dj) in params.connectivity.offsets() {
            if let Some(nb) = grid.neighbour(cell, di, dj) {
                if let Some(&nb_idx) = index.get(&(day, nb)) {
                    forest.union(idx, nb_idx);
                }
            }
        }
        if let Some(&nb_idx) = index.get(&(day + 1, cell)) {
            forest.union(idx, nb_idx);
        }
    }

    let mut buckets: HashMap<usize, Vec<(DayIndex, CellId)>, RandomState> = HashMap::default();
    for (idx, &entry) in entries.iter().enumerate() {
        buckets.entry(forest.find(idx)).or_default().push(entry);
    }

    let mut components: Vec<Vec<(DayIndex, CellId)>> = buckets
        .into_values()
        .filter(|component| component.len() >= params.minpix)
        .collect();
    components.sort_by_key(|component| component[0]);

    let mut tracks: Vec<Track> = Vec::with_capacity(components.len());
    let mut prev_day: Option<DayIndex> = None;
    let mut order = 0;
    for component in components {
        let ori_day = component[0].0;
        order = if prev_day == Some(ori_day) { order + 1 } else { 0 };
        prev_day = Some(ori_day);

        let mut day_objects: Vec<(DayIndex, Object)> = Vec::new();
        for (day, group) in &component.into_iter().chunk_by(|&(day, _)| day) {
            let object = Object::from_sorted_cells(group.map(|(_, cell)| cell).collect());
            day_objects.push((day, object));
        }
        let mut day_objects = day_objects.into_iter();
        let (first_day, first_object) = day_objects.next().expect("a component is never empty");
        let mut track = Track::new(first_day, order, first_object);
        for (day, object) in day_objects {
            track.push(day, object);
        }
        tracks.push(track);
    }

    if tracks.is_empty() {
        warn!(
            "stacked labelling produced no components of at least {} cells",
            params.minpix
        );
    }
    Ok(TrackSet::from_tracks(tracks))
}

/// Close (dilate, erode) then open (erode, dilate), `morph_radius`
/// passes each.
fn close_then_open(grid: &Grid, mask: &DayMask, params: &TrackParams) -> DayMask {
    let r = params.morph_radius;
    let mut out = mask.clone();
    for _ in 0..r {
        out = dilate(grid, &out, params);
    }
    for _ in 0..2 * r {
        out = erode(grid, &out, params);
    }
    for _ in 0..r {
        out = dilate(grid, &out, params);
    }
    out
}

fn dilate(grid: &Grid, mask: &DayMask, params: &TrackParams) -> DayMask {
    let mut out = mask.clone();
    for_each_cell(grid, |cell| {
        if mask.get(cell) {
            return;
        }
        let hit = params
            .connectivity
            .offsets()
            .iter()
            .any(|&(di, dj)| grid.neighbour(cell, di, dj).is_some_and(|nb| mask.get(nb)));
        if hit {
            out.set(cell, true);
        }
    });
    out
}

/// A cell survives erosion iff its whole neighbourhood is active; a
/// missing neighbour (true boundary) counts as inactive.
fn erode(grid: &Grid, mask: &DayMask, params: &TrackParams) -> DayMask {
    let mut out = mask.clone();
    for_each_cell(grid, |cell| {
        if !mask.get(cell) {
            return;
        }
        let survives = params
            .connectivity
            .offsets()
            .iter()
            .all(|&(di, dj)| grid.neighbour(cell, di, dj).is_some_and(|nb| mask.get(nb)));
        if !survives {
            out.set(cell, false);
        }
    });
    out
}

fn for_each_cell(grid: &Grid, mut f: impl FnMut(CellId)) {
    for face_idx in 0..grid.n_faces() {
        let face = grid.face(face_idx);
        for i in 0..face.nx {
            for j in 0..face.ny {
                f(CellId::new(face_idx, i, j));
            }
        }
    }
}

#[cfg(test)]
mod stacked_test {
    use super::*;

    fn params(minpix: usize) -> TrackParams {
        TrackParams::builder().minpix(minpix).build().unwrap()
    }

    #[test]
    fn test_persistent_blob_is_one_track() {
        let grid = Grid::flat(12, 12);
        let mut mask = DayMask::new(&grid);
        mask.fill(0, 3..7, 3..7, true);
        let masks = vec![mask.clone(), mask.clone(), mask];

        let set = label_stacked(&grid, &masks, &params(1)).unwrap();
        assert_eq!(set.len(), 1);
        let track = &set.tracks()[0];
        assert_eq!(track.days(), &[0, 1, 2]);
        assert_eq!(track.ori_day(), 0);
        assert!(track.split_days().is_empty());
        assert!(track.objects().iter().all(|o| o.len() == 16));
    }

    #[test]
    fn test_temporal_gap_separates_components() {
        let grid = Grid::flat(12, 12);
        let mut blob = DayMask::new(&grid);
        blob.fill(0, 3..7, 3..7, true);
        let empty = DayMask::new(&grid);
        let masks = vec![blob.clone(), empty, blob];

        let set = label_stacked(&grid, &masks, &params(1)).unwrap();
        assert_eq!(set.len(), 2);
        let mut ori: Vec<usize> = set.iter().map(|t| t.ori_day()).collect();
        ori.sort_unstable();
        assert_eq!(ori, vec![0, 2]);
    }

    #[test]
    fn test_minpix_applies_to_total_component_size() {
        // 4 cells per day over 3 days: 12 cells total survive minpix 10,
        // though every single day is below it.
        let grid = Grid::flat(10, 10);
        let mut mask = DayMask::new(&grid);
        mask.fill(0, 2..4, 2..4, true);
        let masks = vec![mask.clone(), mask.clone(), mask];

        let set = label_stacked(&grid, &masks, &params(10)).unwrap();
        assert_eq!(set.len(), 1);

        // The 2-day variant (8 cells total) falls below the threshold.
        let mut mask = DayMask::new(&grid);
        mask.fill(0, 2..4, 2..4, true);
        let set = label_stacked(&grid, &[mask.clone(), mask], &params(10)).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_wrap_connects_across_seam() {
        let grid = Grid::cylindrical(36, 10);
        let mut mask = DayMask::new(&grid);
        mask.fill(0, 34..36, 3..6, true);
        mask.fill(0, 0..2, 3..6, true);

        let set = label_stacked(&grid, &[mask], &params(1)).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.tracks()[0].objects()[0].len(), 12);
    }

    #[test]
    fn test_close_then_open_bridges_a_gap() {
        // Two 3x3 blocks with a one-column gap: plain labelling sees two
        // components, the closed mask sees one.
        let grid = Grid::flat(12, 8);
        let mut mask = DayMask::new(&grid);
        mask.fill(0, 1..4, 2..5, true);
        mask.fill(0, 5..8, 2..5, true);

        let plain = label_stacked(&grid, &[mask.clone()], &params(1)).unwrap();
        assert_eq!(plain.len(), 2);

        let p = TrackParams::builder().minpix(1).morph_radius(1).build().unwrap();
        let bridged = label_stacked(&grid, &[mask], &p).unwrap();
        assert_eq!(bridged.len(), 1);
    }

    #[test]
    fn test_ori_order_ranks_same_day_births() {
        let grid = Grid::flat(20, 20);
        let mut mask = DayMask::new(&grid);
        mask.fill(0, 1..3, 1..3, true);
        mask.fill(0, 10..12, 10..12, true);

        let set = label_stacked(&grid, &[mask], &params(1)).unwrap();
        assert_eq!(set.len(), 2);
        let mut orders: Vec<usize> = set.iter().map(|t| t.ori_order()).collect();
        orders.sort_unstable();
        assert_eq!(orders, vec![0, 1]);
    }
}
