//! # Composite reduction
//!
//! Collapses the normalised tensor `T[r, θ, p, n, v]` across the track
//! axis into a composite `C[r, θ, p, v]`, ignoring NaN inputs. A cell
//! with no finite input stays NaN, so the composite's NaN pattern is
//! exactly the all-NaN pattern of the input slices.
use log::warn;
use ndarray::{Array4, ArrayView5, Zip};

/// Aggregate applied across tracks at each `(r, θ, p, v)` cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMethod {
    Mean,
    Median,
    /// Population standard deviation.
    Std,
}

/// Reduce the normalised tensor across its track axis.
///
/// Arguments
/// ---------
/// * `tensor`: the `(R, R, P, N, V)` normalised tensor.
/// * `method`: the aggregate to apply.
///
/// Return
/// ------
/// * The `(R, R, P, V)` composite. NaN inputs are ignored; a cell whose
///   whole track slice is NaN stays NaN. An empty track axis yields an
///   all-NaN composite with a warning.
pub fn composite(tensor: &ArrayView5<'_, f64>, method: CompositeMethod) -> Array4<f64> {
    let (res_r, res_theta, n_phases, n_tracks, n_vars) = tensor.dim();
    let mut out = Array4::from_elem((res_r, res_theta, n_phases, n_vars), f64::NAN);

    if n_tracks == 0 {
        warn!("composite over an empty track set, returning all-NaN");
        return out;
    }

    // The reduction over tracks is pure per output cell; run it as a
    // parallel-for over the flattened (r, θ, p, v) domain.
    Zip::indexed(&mut out).par_for_each(|(r, theta, p, v), cell| {
        let mut finite: Vec<f64> = (0..n_tracks)
            .map(|n| tensor[[r, theta, p, n, v]])
            .filter(|x| x.is_finite())
            .collect();
        if finite.is_empty() {
            return;
        }
        *cell = match method {
            CompositeMethod::Mean => mean(&finite),
            CompositeMethod::Median => {
                finite.sort_unstable_by(|a, b| a.partial_cmp(b).expect("inputs are finite"));
                let n = finite.len();
                if n % 2 == 1 {
                    finite[n / 2]
                } else {
                    (finite[n / 2 - 1] + finite[n / 2]) / 2.0
                }
            }
            CompositeMethod::Std => {
                let m = mean(&finite);
                let var =
                    finite.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / finite.len() as f64;
                var.sqrt()
            }
        };
    });

    out
}

#[inline]
fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

#[cfg(test)]
mod composite_test {
    use super::*;
    use ndarray::Array5;

    fn tensor_with_tracks(values: &[f64]) -> Array5<f64> {
        let mut t = Array5::from_elem((2, 2, 1, values.len(), 1), f64::NAN);
        for (n, &v) in values.iter().enumerate() {
            t[[0, 0, 0, n, 0]] = v;
            t[[1, 1, 0, n, 0]] = 2.0 * v;
        }
        t
    }

    #[test]
    fn test_mean_ignores_nan_cells() {
        let mut t = tensor_with_tracks(&[1.0, 2.0, 3.0]);
        t[[0, 0, 0, 1, 0]] = f64::NAN; // knock one track out of one cell

        let c = composite(&t.view(), CompositeMethod::Mean);
        assert!((c[[0, 0, 0, 0]] - 2.0).abs() < 1e-12); // mean of 1 and 3
        assert!((c[[1, 1, 0, 0]] - 4.0).abs() < 1e-12); // mean of 2, 4, 6
        assert!(c[[0, 1, 0, 0]].is_nan()); // never had data
    }

    #[test]
    fn test_median_even_and_odd() {
        let t = tensor_with_tracks(&[4.0, 1.0, 3.0]);
        let c = composite(&t.view(), CompositeMethod::Median);
        assert!((c[[0, 0, 0, 0]] - 3.0).abs() < 1e-12);

        let t = tensor_with_tracks(&[4.0, 1.0, 3.0, 2.0]);
        let c = composite(&t.view(), CompositeMethod::Median);
        assert!((c[[0, 0, 0, 0]] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_population_std() {
        let t = tensor_with_tracks(&[1.0, 3.0]);
        let c = composite(&t.view(), CompositeMethod::Std);
        assert!((c[[0, 0, 0, 0]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_track_axis_is_all_nan() {
        let t = Array5::<f64>::zeros((2, 2, 1, 0, 1));
        let c = composite(&t.view(), CompositeMethod::Mean);
        assert!(c.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_nan_iff_input_slice_all_nan() {
        let t = tensor_with_tracks(&[1.0, 2.0]);
        let c = composite(&t.view(), CompositeMethod::Mean);
        for r in 0..2 {
            for theta in 0..2 {
                let any_finite = (0..2).any(|n| t[[r, theta, 0, n, 0]].is_finite());
                assert_eq!(c[[r, theta, 0, 0]].is_finite(), any_finite);
            }
        }
    }
}
