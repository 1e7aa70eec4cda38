use approx::assert_abs_diff_eq;
use ndarray::Array4;

use tethys::normalise::{haversine, track_r_max};
use tethys::{
    composite, label_day, AnomalyField, CellId, CompositeMethod, DayMask, Grid, TrackParams,
    Tracker,
};

mod common;
use common::lin_coords;

const CENTRE_LON: f64 = 20.0;
const CENTRE_LAT: f64 = 0.0;
const DISC_RADIUS_KM: f64 = 200.0;

/// A 49 x 49 quarter-degree grid centred on (20E, 0N).
fn setup_grid() -> (Grid, Vec<f64>, Vec<f64>) {
    let grid = Grid::flat(49, 49);
    let lon = lin_coords(49, 14.0, 0.25);
    let lat = lin_coords(49, -6.0, 0.25);
    (grid, lon, lat)
}

/// Mask of all cells within `DISC_RADIUS_KM` of the centre.
fn disc_mask(grid: &Grid, lon: &[f64], lat: &[f64], earth_radius_km: f64) -> DayMask {
    let mut mask = DayMask::new(grid);
    for (i, &lon_i) in lon.iter().enumerate() {
        for (j, &lat_j) in lat.iter().enumerate() {
            if haversine(CENTRE_LAT, CENTRE_LON, lat_j, lon_i, earth_radius_km) <= DISC_RADIUS_KM {
                mask.set(CellId::new(0, i, j), true);
            }
        }
    }
    mask
}

/// `exp(-d² / sigma²)` of the haversine distance to the centre, constant
/// over days.
fn gaussian_field(
    lon: &[f64],
    lat: &[f64],
    n_days: usize,
    sigma_km: f64,
    earth_radius_km: f64,
) -> Array4<f64> {
    let mut data = Array4::zeros((lon.len(), lat.len(), n_days, 1));
    for (i, &lon_i) in lon.iter().enumerate() {
        for (j, &lat_j) in lat.iter().enumerate() {
            let d = haversine(CENTRE_LAT, CENTRE_LON, lat_j, lon_i, earth_radius_km);
            for day in 0..n_days {
                data[[i, j, day, 0]] = (-d * d / (sigma_km * sigma_km)).exp();
            }
        }
    }
    data
}

#[test]
fn test_radially_symmetric_field_round_trips() {
    let (grid, lon, lat) = setup_grid();
    let params = TrackParams::builder()
        .resolution(25)
        .n_phases(3)
        .build()
        .unwrap();

    // A steady disc-shaped event over two days.
    let mask = disc_mask(&grid, &lon, &lat, params.earth_radius);
    let day_objects: Vec<_> = (0..2)
        .map(|_| label_day(&grid, &mask, &params).unwrap())
        .collect();
    let set = Tracker::run(day_objects.into_iter().enumerate(), &params);
    assert_eq!(set.len(), 1);

    let r_max = track_r_max(&set.tracks()[0], &lon, &lat, params.earth_radius);
    assert!(r_max > 0.0 && r_max <= DISC_RADIUS_KM);
    let sigma = r_max / 2.0;

    let data = gaussian_field(&lon, &lat, 2, sigma, params.earth_radius);
    let field = AnomalyField::new(data.view(), &lon, &lat).unwrap();

    let tensor = tethys::normalise_tracks(&field, &set, &params).unwrap();
    assert_eq!(tensor.dim(), (25, 25, 3, 1, 1));

    // The sample cloud extends well past the unit disc, so every polar
    // target has interpolation support.
    assert!(tensor.iter().all(|v| v.is_finite()));

    // The angular average at each radius recovers the analytic Gaussian:
    // at radial index r the physical distance is (r / (R-1)) * R_max,
    // and with sigma = R_max / 2 the expected value is exp(-4 (r/(R-1))²).
    for r in 0..25 {
        let mean: f64 = (0..25).map(|theta| tensor[[r, theta, 0, 0, 0]]).sum::<f64>() / 25.0;
        let rho = r as f64 / 24.0;
        let expected = (-4.0 * rho * rho).exp();
        assert_abs_diff_eq!(mean, expected, epsilon = 0.05);
    }

    // The field is constant over the lifetime, so every phase agrees.
    for r in 0..25 {
        for theta in 0..25 {
            let p0 = tensor[[r, theta, 0, 0, 0]];
            for p in 1..3 {
                assert_abs_diff_eq!(tensor[[r, theta, p, 0, 0]], p0, epsilon = 1e-9);
            }
        }
    }
}

#[test]
fn test_missing_day_degrades_locally_not_globally() {
    let (grid, lon, lat) = setup_grid();
    let params = TrackParams::builder()
        .resolution(15)
        .n_phases(3)
        .build()
        .unwrap();

    let mask = disc_mask(&grid, &lon, &lat, params.earth_radius);
    let day_objects: Vec<_> = (0..3)
        .map(|_| label_day(&grid, &mask, &params).unwrap())
        .collect();
    let set = Tracker::run(day_objects.into_iter().enumerate(), &params);

    let r_max = track_r_max(&set.tracks()[0], &lon, &lat, params.earth_radius);
    let mut data = gaussian_field(&lon, &lat, 3, r_max / 2.0, params.earth_radius);
    // Knock out the middle day entirely: its spatial slice has no valid
    // samples, but the two remaining days still support every phase.
    data.slice_mut(ndarray::s![.., .., 1, ..]).fill(f64::NAN);

    let field = AnomalyField::new(data.view(), &lon, &lat).unwrap();
    let tensor = tethys::normalise_tracks(&field, &set, &params).unwrap();

    assert!(tensor.iter().all(|v| v.is_finite()));
}

#[test]
fn test_composite_of_single_track_reproduces_it() {
    let (grid, lon, lat) = setup_grid();
    let params = TrackParams::builder()
        .resolution(15)
        .n_phases(2)
        .build()
        .unwrap();

    let mask = disc_mask(&grid, &lon, &lat, params.earth_radius);
    let day_objects: Vec<_> = (0..2)
        .map(|_| label_day(&grid, &mask, &params).unwrap())
        .collect();
    let set = Tracker::run(day_objects.into_iter().enumerate(), &params);

    let r_max = track_r_max(&set.tracks()[0], &lon, &lat, params.earth_radius);
    let data = gaussian_field(&lon, &lat, 2, r_max / 2.0, params.earth_radius);
    let field = AnomalyField::new(data.view(), &lon, &lat).unwrap();
    let tensor = tethys::normalise_tracks(&field, &set, &params).unwrap();

    for method in [
        CompositeMethod::Mean,
        CompositeMethod::Median,
        CompositeMethod::Std,
    ] {
        let comp = composite(&tensor.view(), method);
        assert_eq!(comp.dim(), (15, 15, 2, 1));
        for ((r, theta, p, v), &value) in comp.indexed_iter() {
            let input = tensor[[r, theta, p, 0, v]];
            assert_eq!(value.is_nan(), input.is_nan());
            if input.is_finite() {
                let expected = match method {
                    CompositeMethod::Std => 0.0,
                    _ => input,
                };
                assert_abs_diff_eq!(value, expected, epsilon = 1e-12);
            }
        }
    }
}
