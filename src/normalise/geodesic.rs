use ordered_float::OrderedFloat;

use crate::constants::{Degree, Kilometer, RADEG};
use crate::tracking::object::Object;
use crate::tracking::track::Track;

/// Great-circle distance between two points, in kilometers.
///
/// Arguments
/// ---------
/// * `lat1`, `lon1`: first point, in degrees.
/// * `lat2`, `lon2`: second point, in degrees.
/// * `radius`: sphere radius in kilometers.
pub fn haversine(
    lat1: Degree,
    lon1: Degree,
    lat2: Degree,
    lon2: Degree,
    radius: Kilometer,
) -> Kilometer {
    let dlat = (lat2 - lat1) * RADEG;
    let dlon = (lon2 - lon1) * RADEG;
    let a = (dlat / 2.0).sin().powi(2)
        + (lat1 * RADEG).cos() * (lat2 * RADEG).cos() * (dlon / 2.0).sin().powi(2);
    2.0 * radius * a.sqrt().min(1.0).asin()
}

/// Unweighted centroid of an object's member cells, as `(lon, lat)` in
/// degrees.
///
/// The arithmetic mean is taken directly on the coordinate values; no
/// spherical centroid is needed because the result only serves as the
/// origin of a local frame whose scale is `R_max`.
pub fn object_centroid(object: &Object, lon: &[f64], lat: &[f64]) -> (Degree, Degree) {
    debug_assert!(!object.is_empty());
    let mut lon_sum = 0.0;
    let mut lat_sum = 0.0;
    for cell in object.cells() {
        debug_assert_eq!(cell.face, 0, "centroids require a single-face grid");
        lon_sum += lon[cell.i];
        lat_sum += lat[cell.j];
    }
    let n = object.len() as f64;
    (lon_sum / n, lat_sum / n)
}

/// The track's maximum radius: the largest cell-to-centroid haversine
/// distance observed over its lifetime, with the centroid taken per day.
pub fn track_r_max(track: &Track, lon: &[f64], lat: &[f64], radius: Kilometer) -> Kilometer {
    track
        .objects()
        .iter()
        .flat_map(|object| {
            let (lon_c, lat_c) = object_centroid(object, lon, lat);
            object
                .cells()
                .iter()
                .map(move |cell| haversine(lat_c, lon_c, lat[cell.j], lon[cell.i], radius))
        })
        .map(OrderedFloat)
        .max()
        .map(|d| d.0)
        .unwrap_or(0.0)
}
