use tethys::{label_day, label_days, CellId, DayMask, Grid, TrackParams, Tracker};

mod common;
use common::block_mask;

#[test]
fn test_object_crossing_the_longitude_seam_is_single() {
    // Cylindrical 360 x 20 grid; a block straddling the seam: longitudes
    // 355..359 and 0..4, latitudes 9..14 — 10 x 6 = 60 cells.
    let grid = Grid::cylindrical(360, 20);
    let mut mask = DayMask::new(&grid);
    mask.fill(0, 355..360, 9..15, true);
    mask.fill(0, 0..5, 9..15, true);

    let params = TrackParams::default();
    let objects = label_day(&grid, &mask, &params).unwrap();

    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].len(), 60);
    // Cells from both sides of the seam are present.
    assert!(objects[0].contains(CellId::new(0, 359, 10)));
    assert!(objects[0].contains(CellId::new(0, 0, 10)));
}

#[test]
fn test_seam_object_tracks_like_any_other() {
    let grid = Grid::cylindrical(360, 20);
    let mut mask = DayMask::new(&grid);
    mask.fill(0, 355..360, 9..15, true);
    mask.fill(0, 0..5, 9..15, true);

    let params = TrackParams::default();
    let day_objects = label_days(&grid, &[mask.clone(), mask.clone(), mask], &params).unwrap();
    let set = Tracker::run(day_objects.into_iter().enumerate(), &params);

    assert_eq!(set.len(), 1);
    assert_eq!(set.tracks()[0].days(), &[0, 1, 2]);
    assert!(set.tracks()[0].split_days().is_empty());
}

#[test]
fn test_object_below_minpix_is_suppressed() {
    // A 5-cell object under the default minpix of 10 never reaches the
    // tracker, so the archive stays empty.
    let grid = Grid::cylindrical(360, 20);
    let mask = block_mask(&grid, 100..105, 5..6);
    assert_eq!(mask.n_active(), 5);

    let params = TrackParams::default();
    let objects = label_day(&grid, &mask, &params).unwrap();
    assert!(objects.is_empty());

    let set = Tracker::run(vec![(0, objects)], &params);
    assert!(set.is_empty());
}

#[test]
fn test_rerun_produces_identical_objects() {
    let grid = Grid::cylindrical(90, 30);
    let mut mask = DayMask::new(&grid);
    mask.fill(0, 85..90, 4..12, true);
    mask.fill(0, 0..3, 4..12, true);
    mask.fill(0, 40..52, 20..27, true);

    let params = TrackParams::builder().minpix(5).build().unwrap();
    let first = label_day(&grid, &mask, &params).unwrap();
    let second = label_day(&grid, &mask, &params).unwrap();
    assert_eq!(first, second);

    // Emitted objects are pairwise disjoint.
    for (a, o1) in first.iter().enumerate() {
        for o2 in &first[a + 1..] {
            assert_eq!(o1.intersection_len(o2), 0);
        }
    }
}
