use crate::grid::CellId;

/// A connected set of active cells on a single day.
///
/// Cells are stored sorted ascending and unique; this is a construction
/// invariant that the overlap kernel and the deterministic emission order
/// of the labeller both rely on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    cells: Vec<CellId>,
}

impl Object {
    /// Build an object from cells in any order; sorts and deduplicates.
    pub fn new(mut cells: Vec<CellId>) -> Self {
        cells.sort_unstable();
        cells.dedup();
        Self { cells }
    }

    /// Build an object from cells already sorted ascending and unique.
    pub(crate) fn from_sorted_cells(cells: Vec<CellId>) -> Self {
        debug_assert!(cells.windows(2).all(|w| w[0] < w[1]));
        Self { cells }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    /// The smallest member cell in canonical (face, i, j) order.
    #[inline]
    pub fn min_cell(&self) -> CellId {
        self.cells[0]
    }

    #[inline]
    pub fn contains(&self, cell: CellId) -> bool {
        self.cells.binary_search(&cell).is_ok()
    }

    /// Number of cells present in both objects.
    ///
    /// A single merge walk over the two sorted cell lists; no allocation.
    pub fn intersection_len(&self, other: &Object) -> usize {
        let (mut a, mut b, mut count) = (0, 0, 0);
        while a < self.cells.len() && b < other.cells.len() {
            match self.cells[a].cmp(&other.cells[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    count += 1;
                    a += 1;
                    b += 1;
                }
            }
        }
        count
    }

    /// Overlap ratio `|A ∩ B| / min(|A|, |B|)`.
    ///
    /// The `min` denominator deliberately favours matching a small child
    /// to a large parent, which keeps fast-growing events linked. The
    /// ratio is symmetric, lives in [0, 1], and equals 1 iff one operand
    /// is a subset of the other.
    pub fn overlap(&self, other: &Object) -> f64 {
        let denom = self.len().min(other.len());
        if denom == 0 {
            return 0.0;
        }
        self.intersection_len(other) as f64 / denom as f64
    }

    /// The union of several objects, e.g. the children absorbed on a
    /// split day.
    pub fn union_of<'a>(objects: impl IntoIterator<Item = &'a Object>) -> Object {
        let mut cells: Vec<CellId> = objects
            .into_iter()
            .flat_map(|o| o.cells.iter().copied())
            .collect();
        cells.sort_unstable();
        cells.dedup();
        Self { cells }
    }
}
