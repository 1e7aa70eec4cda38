pub mod composite;
pub mod constants;
pub mod grid;
pub mod labelling;
pub mod normalise;
pub mod params;
pub mod tethys_errors;
pub mod tracking;

pub use composite::{composite, CompositeMethod};
pub use constants::{DayIndex, DayObjects};
pub use grid::{CellId, DayMask, Edge, EdgeLink, Face, Grid};
pub use labelling::{label_day, label_days, label_stacked};
pub use normalise::{normalise_tracks, AnomalyField};
pub use params::{Connectivity, TrackParams};
pub use tethys_errors::TethysError;
pub use tracking::{Object, Track, TrackSet, Tracker};
