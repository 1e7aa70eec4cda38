use std::collections::HashMap;

use ahash::RandomState;
use log::warn;
use ndarray::Array2;
use rayon::prelude::*;

use crate::constants::DayObjects;
use crate::grid::{CellId, DayMask, Grid};
use crate::labelling::disjoint_set::DisjointSet;
use crate::params::TrackParams;
use crate::tethys_errors::TethysError;
use crate::tracking::object::Object;

/// Label the connected objects of a single day mask.
///
/// Components are found with the configured connectivity in two stages:
/// each face is labelled in isolation with a classic two-pass scan, then
/// labels are merged across declared edge adjacencies (the wrap-column
/// pass on a cylindrical grid). Objects smaller than `params.minpix` are
/// dropped strictly after the cross-face merge.
///
/// Arguments
/// ---------
/// * `grid`: the grid topology.
/// * `mask`: the day's boolean field; its shape must match the grid.
/// * `params`: supplies `connectivity` and `minpix`.
///
/// Return
/// ------
/// * The objects of the day, each with its cells sorted ascending, the
///   list ordered by smallest member cell. An empty day is not an error:
///   a warning is logged and the empty list is returned.
pub fn label_day(
    grid: &Grid,
    mask: &DayMask,
    params: &TrackParams,
) -> Result<DayObjects, TethysError> {
    if !mask.shape_matches(grid) {
        return Err(TethysError::ShapeMismatch(
            "day mask shape does not match the grid".into(),
        ));
    }

    // Pass 1: label each face in isolation. `local[f]` holds provisional
    // labels (0 = background); `forests[f]` resolves their equivalences.
    let mut local: Vec<Array2<usize>> = Vec::with_capacity(grid.n_faces());
    let mut forests: Vec<DisjointSet> = Vec::with_capacity(grid.n_faces());
    for f in 0..grid.n_faces() {
        let (labels, forest) = label_face(grid, mask, f, params);
        local.push(labels);
        forests.push(forest);
    }

    // Disjoint global ids by offsetting each face's provisional labels.
    let mut offset = vec![0usize; grid.n_faces() + 1];
    for f in 0..grid.n_faces() {
        offset[f + 1] = offset[f] + forests[f].len();
    }
    let mut global = DisjointSet::new(offset[grid.n_faces()]);

    // Carry the intra-face equivalences into the global forest, then merge
    // across edge links. An offset that stays inside the face was already
    // handled by pass 1; only steps that leave the face consult the
    // topology primitive.
    for f in 0..grid.n_faces() {
        let face = grid.face(f);
        for i in 0..face.nx {
            for j in 0..face.ny {
                let lab = local[f][[i, j]];
                if lab == 0 {
                    continue;
                }
                let root = forests[f].find(lab - 1);
                global.union(offset[f] + lab - 1, offset[f] + root);

                for &(di, dj) in params.connectivity.offsets() {
                    let ni = i as i64 + di;
                    let nj = j as i64 + dj;
                    if ni >= 0 && ni < face.nx as i64 && nj >= 0 && nj < face.ny as i64 {
                        continue;
                    }
                    let Some(nb) = grid.neighbour(CellId::new(f, i, j), di, dj) else {
                        continue;
                    };
                    let nb_lab = local[nb.face][[nb.i, nb.j]];
                    if nb_lab > 0 {
                        global.union(offset[f] + lab - 1, offset[nb.face] + nb_lab - 1);
                    }
                }
            }
        }
    }

    // Bucket cells by global root, in canonical cell order so every
    // bucket comes out sorted.
    let mut buckets: HashMap<usize, Vec<CellId>, RandomState> = HashMap::default();
    for f in 0..grid.n_faces() {
        let face = grid.face(f);
        for i in 0..face.nx {
            for j in 0..face.ny {
                let lab = local[f][[i, j]];
                if lab == 0 {
                    continue;
                }
                let root = global.find(offset[f] + lab - 1);
                buckets.entry(root).or_default().push(CellId::new(f, i, j));
            }
        }
    }

    let mut objects: Vec<Object> = buckets
        .into_values()
        .filter(|cells| cells.len() >= params.minpix)
        .map(Object::from_sorted_cells)
        .collect();
    objects.sort_by_key(|o| o.min_cell());

    if objects.is_empty() {
        warn!("day mask produced no objects of at least {} cells", params.minpix);
    }
    Ok(objects)
}

/// Two-pass connected-component labelling of one face, ignoring all edge
/// links. Returns the provisional label field (0 = background, labels
/// start at 1) and the forest resolving label equivalences.
fn label_face(
    grid: &Grid,
    mask: &DayMask,
    f: usize,
    params: &TrackParams,
) -> (Array2<usize>, DisjointSet) {
    let face = grid.face(f);
    let field = mask.face(f);
    let n_active = field.iter().filter(|&&v| v).count();

    let mut labels = Array2::zeros((face.nx, face.ny));
    let mut forest = DisjointSet::new(n_active);
    let mut next = 0usize;

    // Offsets pointing at already-scanned cells for an (i outer, j inner)
    // ascending scan.
    let prior: Vec<(i64, i64)> = params
        .connectivity
        .offsets()
        .iter()
        .copied()
        .filter(|&(di, dj)| di < 0 || (di == 0 && dj < 0))
        .collect();

    for i in 0..face.nx {
        for j in 0..face.ny {
            if !field[[i, j]] {
                continue;
            }
            let mut assigned: Option<usize> = None;
            for &(di, dj) in &prior {
                let ni = i as i64 + di;
                let nj = j as i64 + dj;
                if ni < 0 || ni >= face.nx as i64 || nj < 0 || nj >= face.ny as i64 {
                    continue;
                }
                let nb = labels[[ni as usize, nj as usize]];
                if nb == 0 {
                    continue;
                }
                match assigned {
                    None => assigned = Some(nb),
                    Some(lab) => {
                        forest.union(lab - 1, nb - 1);
                    }
                }
            }
            let lab = match assigned {
                Some(lab) => lab,
                None => {
                    next += 1;
                    next
                }
            };
            labels[[i, j]] = lab;
        }
    }

    (labels, forest)
}

/// Label a batch of day masks, one result per input day.
///
/// The days are independent, so the batch runs as a parallel-for; output
/// order matches input order.
pub fn label_days(
    grid: &Grid,
    masks: &[DayMask],
    params: &TrackParams,
) -> Result<Vec<DayObjects>, TethysError> {
    masks
        .par_iter()
        .map(|mask| label_day(grid, mask, params))
        .collect()
}
