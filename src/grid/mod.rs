//! # Grid topology
//!
//! Declares the atlas of rectangular faces a field lives on, the edge
//! adjacencies joining them, and the single neighbour-lookup primitive the
//! rest of the crate is built on.
//!
//! Data Model
//! -----------------
//! * **Face:** one rectangular tile of shape `(nx, ny)`; `i ∈ 0..nx`
//!   indexes the x/longitude axis, `j ∈ 0..ny` the y/latitude axis.
//! * **EdgeLink:** an oriented pair `(face_a, edge_a) ↔ (face_b, edge_b)`
//!   with an optional reversal of the along-edge coordinate.
//! * **Grid:** the immutable atlas. The degenerate single-face grid with
//!   `Left ↔ Right` of the same face models a cylindrical longitude
//!   ([`Grid::cylindrical`]); multi-face atlases model tiled spheres.
//! * **DayMask:** a grid-shaped boolean field for one day.
//!
//! The topology exposes exactly one primitive, [`Grid::neighbour`]: given
//! a cell and one of the 8 compass offsets, return the neighbour cell
//! (possibly on another face, possibly with the along-edge coordinate
//! reversed) or `None` at a true boundary such as a pole.
//!
//! See also
//! ------------
//! * [`crate::labelling::day_labeller`] – Consumes the primitive for
//!   cross-face component merging.
pub mod topology;

pub use topology::{CellId, DayMask, Edge, EdgeLink, Face, Grid};
