use std::collections::HashMap;
use std::ops::Range;

use ahash::RandomState;
use ndarray::Array2;

use crate::tethys_errors::TethysError;

/// A unique cell identifier across the whole grid atlas.
///
/// The derived ordering (face, then i, then j) is the canonical order used
/// whenever a deterministic cell order is required, e.g. when sorting the
/// objects emitted by the day labeller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId {
    pub face: usize,
    pub i: usize,
    pub j: usize,
}

impl CellId {
    #[inline]
    pub const fn new(face: usize, i: usize, j: usize) -> Self {
        Self { face, i, j }
    }
}

/// One rectangular tile of the grid atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub nx: usize,
    pub ny: usize,
}

impl Face {
    #[inline]
    pub const fn new(nx: usize, ny: usize) -> Self {
        Self { nx, ny }
    }

    #[inline]
    pub const fn n_cells(&self) -> usize {
        self.nx * self.ny
    }
}

/// One of the four sides of a face.
///
/// `Left`/`Right` are the `i = 0` / `i = nx - 1` columns, `Bottom`/`Top`
/// the `j = 0` / `j = ny - 1` rows. The along-edge coordinate runs over
/// `j` for vertical edges and over `i` for horizontal ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

/// An oriented edge adjacency between two face sides.
///
/// `reversed` flips the along-edge coordinate when stepping across, which
/// is how mirrored tile orientations are declared. Linking `Left` to `Top`
/// implies the axis swap: the crossing cell's `j` becomes the neighbour's
/// `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeLink {
    pub face_a: usize,
    pub edge_a: Edge,
    pub face_b: usize,
    pub edge_b: Edge,
    pub reversed: bool,
}

impl EdgeLink {
    pub const fn new(face_a: usize, edge_a: Edge, face_b: usize, edge_b: Edge) -> Self {
        Self {
            face_a,
            edge_a,
            face_b,
            edge_b,
            reversed: false,
        }
    }

    pub const fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }
}

/// An immutable atlas of faces joined along declared edges.
#[derive(Debug, Clone)]
pub struct Grid {
    faces: Vec<Face>,
    links: HashMap<(usize, Edge), (usize, Edge, bool), RandomState>,
}

impl Grid {
    /// Build and validate a grid from its faces and edge adjacencies.
    ///
    /// Arguments
    /// ---------
    /// * `faces`: the per-face shapes of the atlas.
    /// * `links`: the declared edge adjacencies; each link is registered
    ///   in both directions.
    ///
    /// Return
    /// ------
    /// * The immutable grid, or [`TethysError::InvalidGrid`] when the
    ///   atlas is empty, a face has a zero dimension, a link references a
    ///   missing face, linked edges differ in length, or one face side
    ///   carries two links.
    pub fn new(faces: Vec<Face>, links: &[EdgeLink]) -> Result<Self, TethysError> {
        if faces.is_empty() {
            return Err(TethysError::InvalidGrid("grid has no faces".into()));
        }
        for (f, face) in faces.iter().enumerate() {
            if face.nx == 0 || face.ny == 0 {
                return Err(TethysError::InvalidGrid(format!(
                    "face {f} has a zero dimension ({} x {})",
                    face.nx, face.ny
                )));
            }
        }

        let mut table: HashMap<(usize, Edge), (usize, Edge, bool), RandomState> =
            HashMap::default();
        for link in links {
            for &(fa, ea, fb, eb) in &[
                (link.face_a, link.edge_a, link.face_b, link.edge_b),
                (link.face_b, link.edge_b, link.face_a, link.edge_a),
            ] {
                let face_a = faces.get(fa).ok_or_else(|| {
                    TethysError::InvalidGrid(format!("edge link references missing face {fa}"))
                })?;
                let face_b = faces.get(fb).ok_or_else(|| {
                    TethysError::InvalidGrid(format!("edge link references missing face {fb}"))
                })?;
                if edge_len(face_a, ea) != edge_len(face_b, eb) {
                    return Err(TethysError::InvalidGrid(format!(
                        "linked edges ({fa}, {ea:?}) and ({fb}, {eb:?}) differ in length"
                    )));
                }
                if table.insert((fa, ea), (fb, eb, link.reversed)).is_some() {
                    return Err(TethysError::InvalidGrid(format!(
                        "face {fa} side {ea:?} carries more than one edge link"
                    )));
                }
            }
        }

        Ok(Self {
            faces,
            links: table,
        })
    }

    /// The single-face cylindrical grid: cyclic in `i` (longitude), open
    /// in `j` (latitude).
    pub fn cylindrical(nx: usize, ny: usize) -> Self {
        Self::new(
            vec![Face::new(nx, ny)],
            &[EdgeLink::new(0, Edge::Left, 0, Edge::Right)],
        )
        .expect("a cylindrical grid with non-zero dimensions is always valid")
    }

    /// A single flat face with no edge adjacencies (open boundaries).
    pub fn flat(nx: usize, ny: usize) -> Self {
        Self::new(vec![Face::new(nx, ny)], &[])
            .expect("a flat grid with non-zero dimensions is always valid")
    }

    #[inline]
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn face(&self, f: usize) -> &Face {
        &self.faces[f]
    }

    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Total cell count across the atlas.
    pub fn n_cells(&self) -> usize {
        self.faces.iter().map(Face::n_cells).sum()
    }

    /// Resolve one compass step from a cell.
    ///
    /// Arguments
    /// ---------
    /// * `cell`: the starting cell.
    /// * `di`, `dj`: one of the 8 compass offsets, each in {-1, 0, 1}.
    ///
    /// Return
    /// ------
    /// * The neighbour cell, stepping across a declared edge link when the
    ///   offset leaves the face through exactly one side.
    /// * `None` at a true boundary (no link on the crossed side), when the
    ///   mapped along-edge position falls outside the linked face, or when
    ///   a diagonal step exits through two sides at once (a face corner).
    pub fn neighbour(&self, cell: CellId, di: i64, dj: i64) -> Option<CellId> {
        debug_assert!(di.abs() <= 1 && dj.abs() <= 1 && (di, dj) != (0, 0));
        let face = &self.faces[cell.face];
        let ni = cell.i as i64 + di;
        let nj = cell.j as i64 + dj;

        let cross_i = ni < 0 || ni >= face.nx as i64;
        let cross_j = nj < 0 || nj >= face.ny as i64;

        match (cross_i, cross_j) {
            (false, false) => Some(CellId::new(cell.face, ni as usize, nj as usize)),
            // Corner exit: resolved as "no neighbour", consistently.
            (true, true) => None,
            (true, false) => {
                let edge = if ni < 0 { Edge::Left } else { Edge::Right };
                self.cross(cell.face, edge, nj as usize)
            }
            (false, true) => {
                let edge = if nj < 0 { Edge::Bottom } else { Edge::Top };
                self.cross(cell.face, edge, ni as usize)
            }
        }
    }

    /// Step across `edge` of `face` at along-edge position `along`.
    fn cross(&self, face: usize, edge: Edge, along: usize) -> Option<CellId> {
        let &(nb_face, nb_edge, reversed) = self.links.get(&(face, edge))?;
        let nb_shape = &self.faces[nb_face];
        let len = edge_len(nb_shape, nb_edge);
        if along >= len {
            return None;
        }
        let b = if reversed { len - 1 - along } else { along };
        let (i, j) = match nb_edge {
            Edge::Left => (0, b),
            Edge::Right => (nb_shape.nx - 1, b),
            Edge::Bottom => (b, 0),
            Edge::Top => (b, nb_shape.ny - 1),
        };
        Some(CellId::new(nb_face, i, j))
    }
}

#[inline]
fn edge_len(face: &Face, edge: Edge) -> usize {
    match edge {
        Edge::Left | Edge::Right => face.ny,
        Edge::Top | Edge::Bottom => face.nx,
    }
}

/// A grid-shaped boolean field for a single day.
///
/// Stored as one `Array2<bool>` per face, indexed `[i, j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DayMask {
    faces: Vec<Array2<bool>>,
}

impl DayMask {
    /// An all-false mask matching the grid's shape.
    pub fn new(grid: &Grid) -> Self {
        Self {
            faces: grid
                .faces()
                .iter()
                .map(|f| Array2::from_elem((f.nx, f.ny), false))
                .collect(),
        }
    }

    /// Wrap caller-provided per-face fields, checking the shape against
    /// the grid.
    pub fn from_faces(grid: &Grid, faces: Vec<Array2<bool>>) -> Result<Self, TethysError> {
        if faces.len() != grid.n_faces() {
            return Err(TethysError::ShapeMismatch(format!(
                "mask has {} faces, grid has {}",
                faces.len(),
                grid.n_faces()
            )));
        }
        for (f, (field, face)) in faces.iter().zip(grid.faces()).enumerate() {
            if field.dim() != (face.nx, face.ny) {
                return Err(TethysError::ShapeMismatch(format!(
                    "mask face {f} has shape {:?}, grid face has ({}, {})",
                    field.dim(),
                    face.nx,
                    face.ny
                )));
            }
        }
        Ok(Self { faces })
    }

    #[inline]
    pub fn get(&self, cell: CellId) -> bool {
        self.faces[cell.face][[cell.i, cell.j]]
    }

    #[inline]
    pub fn set(&mut self, cell: CellId, value: bool) {
        self.faces[cell.face][[cell.i, cell.j]] = value;
    }

    /// Set a rectangular region of one face.
    pub fn fill(&mut self, face: usize, i_range: Range<usize>, j_range: Range<usize>, value: bool) {
        for i in i_range {
            for j in j_range.clone() {
                self.faces[face][[i, j]] = value;
            }
        }
    }

    #[inline]
    pub fn face(&self, f: usize) -> &Array2<bool> {
        &self.faces[f]
    }

    #[inline]
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    /// True iff this mask has the grid's exact shape.
    pub fn shape_matches(&self, grid: &Grid) -> bool {
        self.faces.len() == grid.n_faces()
            && self
                .faces
                .iter()
                .zip(grid.faces())
                .all(|(field, face)| field.dim() == (face.nx, face.ny))
    }

    /// Number of active cells across all faces.
    pub fn n_active(&self) -> usize {
        self.faces
            .iter()
            .map(|f| f.iter().filter(|&&v| v).count())
            .sum()
    }
}

#[cfg(test)]
mod topology_test {
    use super::*;

    #[test]
    fn test_in_face_steps() {
        let grid = Grid::flat(5, 4);
        let c = CellId::new(0, 2, 2);
        assert_eq!(grid.neighbour(c, 1, 0), Some(CellId::new(0, 3, 2)));
        assert_eq!(grid.neighbour(c, -1, 1), Some(CellId::new(0, 1, 3)));
    }

    #[test]
    fn test_flat_boundaries_have_no_neighbour() {
        let grid = Grid::flat(5, 4);
        assert_eq!(grid.neighbour(CellId::new(0, 0, 2), -1, 0), None);
        assert_eq!(grid.neighbour(CellId::new(0, 4, 2), 1, 0), None);
        assert_eq!(grid.neighbour(CellId::new(0, 2, 0), 0, -1), None);
        assert_eq!(grid.neighbour(CellId::new(0, 2, 3), 0, 1), None);
    }

    #[test]
    fn test_cylindrical_wrap() {
        let grid = Grid::cylindrical(360, 20);
        assert_eq!(
            grid.neighbour(CellId::new(0, 0, 5), -1, 0),
            Some(CellId::new(0, 359, 5))
        );
        assert_eq!(
            grid.neighbour(CellId::new(0, 359, 5), 1, 0),
            Some(CellId::new(0, 0, 5))
        );
        // Diagonal across the wrap shifts the latitude as usual.
        assert_eq!(
            grid.neighbour(CellId::new(0, 0, 5), -1, 1),
            Some(CellId::new(0, 359, 6))
        );
        // Poles stay open.
        assert_eq!(grid.neighbour(CellId::new(0, 10, 0), 0, -1), None);
        assert_eq!(grid.neighbour(CellId::new(0, 10, 19), 0, 1), None);
    }

    #[test]
    fn test_corner_exit_is_none() {
        let grid = Grid::cylindrical(360, 20);
        // Exits through both the wrap edge and the pole at once.
        assert_eq!(grid.neighbour(CellId::new(0, 0, 0), -1, -1), None);
    }

    #[test]
    fn test_two_face_link() {
        // Face 0's right edge meets face 1's left edge, same orientation.
        let faces = vec![Face::new(3, 4), Face::new(5, 4)];
        let links = [EdgeLink::new(0, Edge::Right, 1, Edge::Left)];
        let grid = Grid::new(faces, &links).unwrap();

        assert_eq!(
            grid.neighbour(CellId::new(0, 2, 1), 1, 0),
            Some(CellId::new(1, 0, 1))
        );
        assert_eq!(
            grid.neighbour(CellId::new(1, 0, 3), -1, 0),
            Some(CellId::new(0, 2, 3))
        );
    }

    #[test]
    fn test_reversed_link_flips_along_coordinate() {
        let faces = vec![Face::new(3, 4), Face::new(5, 4)];
        let links = [EdgeLink::new(0, Edge::Right, 1, Edge::Left).reversed()];
        let grid = Grid::new(faces, &links).unwrap();

        assert_eq!(
            grid.neighbour(CellId::new(0, 2, 0), 1, 0),
            Some(CellId::new(1, 0, 3))
        );
    }

    #[test]
    fn test_axis_swap_link() {
        // Face 0's top row meets face 1's left column: the along-edge
        // coordinate changes axis on the way through.
        let faces = vec![Face::new(4, 3), Face::new(5, 4)];
        let links = [EdgeLink::new(0, Edge::Top, 1, Edge::Left)];
        let grid = Grid::new(faces, &links).unwrap();

        assert_eq!(
            grid.neighbour(CellId::new(0, 2, 2), 0, 1),
            Some(CellId::new(1, 0, 2))
        );
    }

    #[test]
    fn test_invalid_grids_are_rejected() {
        assert!(Grid::new(vec![], &[]).is_err());
        assert!(Grid::new(vec![Face::new(0, 4)], &[]).is_err());
        assert!(Grid::new(
            vec![Face::new(3, 3)],
            &[EdgeLink::new(0, Edge::Left, 1, Edge::Right)]
        )
        .is_err());
        // Length mismatch between linked edges.
        assert!(Grid::new(
            vec![Face::new(3, 4), Face::new(3, 5)],
            &[EdgeLink::new(0, Edge::Right, 1, Edge::Left)]
        )
        .is_err());
        // Two links on the same side.
        assert!(Grid::new(
            vec![Face::new(3, 4), Face::new(3, 4)],
            &[
                EdgeLink::new(0, Edge::Right, 1, Edge::Left),
                EdgeLink::new(0, Edge::Right, 1, Edge::Right),
            ]
        )
        .is_err());
    }

    #[test]
    fn test_mask_shape_checks() {
        let grid = Grid::cylindrical(10, 5);
        let mut mask = DayMask::new(&grid);
        assert_eq!(mask.n_active(), 0);
        mask.fill(0, 2..5, 1..3, true);
        assert_eq!(mask.n_active(), 6);
        assert!(mask.get(CellId::new(0, 2, 1)));

        let bad = vec![ndarray::Array2::from_elem((10, 4), false)];
        assert!(DayMask::from_faces(&grid, bad).is_err());
    }
}
