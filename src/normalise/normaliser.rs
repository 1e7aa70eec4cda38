use itertools::iproduct;
use log::warn;
use ndarray::{s, Array4, Array5, ArrayView4};
use rayon::prelude::*;

use crate::constants::{DPI, RADEG};
use crate::normalise::geodesic::{haversine, object_centroid, track_r_max};
use crate::normalise::interpolate::LinearInterpolator;
use crate::params::TrackParams;
use crate::tethys_errors::TethysError;
use crate::tracking::track::{Track, TrackSet};

/// A read-only view over the anomaly source: a 4-D array
/// `D[lon, lat, day, var]` plus its coordinate vectors.
#[derive(Debug, Clone, Copy)]
pub struct AnomalyField<'a> {
    data: ArrayView4<'a, f64>,
    lon: &'a [f64],
    lat: &'a [f64],
}

impl<'a> AnomalyField<'a> {
    /// Wrap the anomaly array and its coordinates, checking shapes.
    ///
    /// Return
    /// ------
    /// * The view, or [`TethysError::ShapeMismatch`] when the first two
    ///   array axes do not match the coordinate vector lengths.
    pub fn new(
        data: ArrayView4<'a, f64>,
        lon: &'a [f64],
        lat: &'a [f64],
    ) -> Result<Self, TethysError> {
        let (n_lon, n_lat, _, _) = data.dim();
        if n_lon != lon.len() || n_lat != lat.len() {
            return Err(TethysError::ShapeMismatch(format!(
                "anomaly field is {} x {} but coordinates are {} x {}",
                n_lon,
                n_lat,
                lon.len(),
                lat.len()
            )));
        }
        Ok(Self { data, lon, lat })
    }

    #[inline]
    pub fn n_days(&self) -> usize {
        self.data.dim().2
    }

    #[inline]
    pub fn n_vars(&self) -> usize {
        self.data.dim().3
    }
}

/// Project every track of the archive into the standard polar ×
/// lifecycle-phase frame.
///
/// For each track, each day's anomaly field is sampled around the
/// object's centroid in a local frame scaled by the track's maximum
/// radius and interpolated onto a polar grid of resolution
/// `params.resolution`; the per-day slices are then resampled onto
/// `params.n_phases` lifecycle phases. Slices without data support stay
/// NaN: too few samples, outside-hull targets, degenerate
/// triangulations, and zero-radius tracks all degrade locally, never
/// abort the run.
///
/// Arguments
/// ---------
/// * `field`: the anomaly source; its day axis must cover every track day.
/// * `track_set`: the archive to normalise (borrowed read-only).
/// * `params`: supplies `resolution`, `n_phases`, and `earth_radius`.
///
/// Return
/// ------
/// * The tensor `T[r, θ, p, n, v]` of shape
///   `(resolution, resolution, n_phases, n_tracks, n_vars)`, row-major,
///   or [`TethysError::ShapeMismatch`] when a track indexes outside the
///   field.
pub fn normalise_tracks(
    field: &AnomalyField<'_>,
    track_set: &TrackSet,
    params: &TrackParams,
) -> Result<Array5<f64>, TethysError> {
    for track in track_set.iter() {
        validate_track(field, track)?;
    }

    let res = params.resolution;
    let n_phases = params.n_phases;
    let n_vars = field.n_vars();

    // Polar target grid on the unit disc, shared by every track.
    let targets: Vec<(f64, f64)> = iproduct!(0..res, 0..res)
        .map(|(r, theta)| {
            let rho = r as f64 / (res - 1) as f64;
            let angle = DPI * theta as f64 / res as f64;
            (rho * angle.sin(), rho * angle.cos())
        })
        .collect();

    let slices: Vec<Array4<f64>> = track_set
        .tracks()
        .par_iter()
        .map(|track| normalise_track(field, track, params, &targets))
        .collect();

    let mut tensor = Array5::from_elem(
        (res, res, n_phases, track_set.len(), n_vars),
        f64::NAN,
    );
    for (n, slice) in slices.into_iter().enumerate() {
        tensor.slice_mut(s![.., .., .., n, ..]).assign(&slice);
    }
    Ok(tensor)
}

fn validate_track(field: &AnomalyField<'_>, track: &Track) -> Result<(), TethysError> {
    if track.last_day() >= field.n_days() {
        return Err(TethysError::ShapeMismatch(format!(
            "track reaches day {} but the anomaly field has {} days",
            track.last_day(),
            field.n_days()
        )));
    }
    for object in track.objects() {
        for cell in object.cells() {
            if cell.face != 0 || cell.i >= field.lon.len() || cell.j >= field.lat.len() {
                return Err(TethysError::ShapeMismatch(format!(
                    "cell (face {}, {}, {}) lies outside the anomaly field",
                    cell.face, cell.i, cell.j
                )));
            }
        }
    }
    Ok(())
}

/// One track's `(R, R, P, V)` slice.
fn normalise_track(
    field: &AnomalyField<'_>,
    track: &Track,
    params: &TrackParams,
    targets: &[(f64, f64)],
) -> Array4<f64> {
    let res = params.resolution;
    let n_phases = params.n_phases;
    let n_vars = field.n_vars();
    let n_days = track.len();

    let mut out = Array4::from_elem((res, res, n_phases, n_vars), f64::NAN);

    let r_max = track_r_max(track, field.lon, field.lat, params.earth_radius);
    if r_max <= 0.0 {
        warn!(
            "track born day {} has zero radius, skipping normalisation",
            track.ori_day()
        );
        return out;
    }

    // Stage 1: spatial projection, one polar slice per (day, var).
    let mut spatial = Array4::from_elem((res, res, n_days, n_vars), f64::NAN);
    for (pos, (day, object)) in track.iter().enumerate() {
        let (lon_c, lat_c) = object_centroid(object, field.lon, field.lat);

        // Bounding-box prefilter around the centroid, then signed local
        // coordinates on the R_max scale.
        let xs: Vec<Option<f64>> = field
            .lon
            .iter()
            .map(|&lon_i| {
                ((lon_i - lon_c).abs() < 2.0 * r_max).then(|| {
                    (lon_i - lon_c).signum()
                        * haversine(lat_c, lon_c, lat_c, lon_i, params.earth_radius)
                        / r_max
                })
            })
            .collect();
        let ys: Vec<Option<f64>> = field
            .lat
            .iter()
            .map(|&lat_j| {
                ((lat_j - lat_c).abs() * RADEG * params.earth_radius < 2.0 * r_max).then(|| {
                    (lat_j - lat_c).signum()
                        * haversine(lat_c, lon_c, lat_j, lon_c, params.earth_radius)
                        / r_max
                })
            })
            .collect();

        for v in 0..n_vars {
            let mut points: Vec<(f64, f64)> = Vec::new();
            let mut values: Vec<f64> = Vec::new();
            for (i, x) in xs.iter().enumerate() {
                let Some(x) = *x else { continue };
                for (j, y) in ys.iter().enumerate() {
                    let Some(y) = *y else { continue };
                    let value = field.data[[i, j, day, v]];
                    if value.is_finite() {
                        points.push((x, y));
                        values.push(value);
                    }
                }
            }
            if points.len() < 4 {
                continue; // the day's slice stays NaN
            }
            let interp = match LinearInterpolator::new(&points, &values) {
                Ok(interp) => interp,
                Err(err) => {
                    warn!("day {day} of track born day {}: {err}", track.ori_day());
                    continue;
                }
            };
            for ((r, theta), &(x, y)) in iproduct!(0..res, 0..res).zip(targets) {
                if let Some(value) = interp.evaluate(x, y) {
                    spatial[[r, theta, pos, v]] = value;
                }
            }
        }
    }

    // Stage 2: resample each polar cell's day series onto the lifecycle
    // phases.
    for (r, theta) in iproduct!(0..res, 0..res) {
        for v in 0..n_vars {
            let series: Vec<f64> = (0..n_days).map(|d| spatial[[r, theta, d, v]]).collect();
            for (p, value) in interp_phases(&series, n_phases).into_iter().enumerate() {
                out[[r, theta, p, v]] = value;
            }
        }
    }

    out
}

/// Linear resampling of a day series onto `n_phases` lifecycle phases.
///
/// Original samples sit at left-edge phases `d / K`, targets at `p / P`.
/// NaN inputs are skipped; fewer than 2 finite samples yield NaN
/// everywhere; targets beyond the finite range clamp to the end values.
fn interp_phases(series: &[f64], n_phases: usize) -> Vec<f64> {
    let k = series.len() as f64;
    let samples: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(d, &v)| (d as f64 / k, v))
        .collect();
    if samples.len() < 2 {
        return vec![f64::NAN; n_phases];
    }

    let first = samples[0];
    let last = samples[samples.len() - 1];
    (0..n_phases)
        .map(|p| {
            let t = p as f64 / n_phases as f64;
            if t <= first.0 {
                first.1
            } else if t >= last.0 {
                last.1
            } else {
                let w = samples.windows(2).find(|w| w[1].0 >= t).expect(
                    "t is strictly inside the sample range, so a bracketing window exists",
                );
                let (t0, v0) = w[0];
                let (t1, v1) = w[1];
                v0 + (v1 - v0) * (t - t0) / (t1 - t0)
            }
        })
        .collect()
}
