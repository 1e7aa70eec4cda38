//! # Spatial-temporal normalisation
//!
//! Projects each track into a standard polar × lifecycle-phase frame so
//! that tracks of different sizes, shapes, and lifetimes become
//! composable: the event-centred anomaly field is sampled on a polar grid
//! scaled by the track's maximum radius, then resampled over time onto a
//! fixed number of lifecycle phases.
//!
//! Modules
//! -----------------
//! * [`geodesic`] – Haversine distance, per-object centroid, per-track
//!   maximum radius `R_max`.
//! * [`interpolate`] – Scattered linear interpolation (Delaunay +
//!   barycentric), total over the plane: outside-hull queries return
//!   `None`, never an error.
//! * [`normaliser`] – The two-stage projection producing the
//!   `(R, R, P, N, V)` tensor, NaN wherever the data gives no support.
pub mod geodesic;
pub mod interpolate;
pub mod normaliser;

pub use geodesic::{haversine, object_centroid, track_r_max};
pub use interpolate::LinearInterpolator;
pub use normaliser::{normalise_tracks, AnomalyField};
