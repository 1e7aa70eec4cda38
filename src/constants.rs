use crate::tracking::object::Object;

pub const EPS: f64 = 1e-9;

/// Mean Earth radius in kilometers, used by the haversine geodesic.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const RADEG: f64 = std::f64::consts::PI / 180.0; // Degrees -> radians conversion factor
pub const DPI: f64 = 2. * std::f64::consts::PI;

// type def
pub type Degree = f64;
pub type Kilometer = f64;
/// A day index in the input time range. Days are opaque integer indices
/// supplied by the caller; the tracker only requires them to be consumed
/// in increasing order.
pub type DayIndex = usize;

// Type definitions for the labelling and tracking pipeline

/// The ordered list of connected objects found on a single day.
///
/// The position of an object in this list is its local identifier
/// (`ori_order`) for that day, used by the tracker to name births.
pub type DayObjects = Vec<Object>;
