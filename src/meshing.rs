use rayon::prelude::*;
use crate::index_space::{Axis, IndexSpace, Side};
use crate::layout::{BoxLayout, LevelData};
use crate::patch::Patch;

/// A trait for a container that can respond to queries for a patch whose
/// valid region overlies a point.
///
pub trait PatchQuery {
    /// Return a patch containing the given point in its valid region, if one
    /// exists.
    ///
    fn patch_containing_point(&self, point: (i64, i64)) -> Option<&Patch>;
}

impl PatchQuery for LevelData {
    fn patch_containing_point(&self, point: (i64, i64)) -> Option<&Patch> {
        self.layout().find(point).map(|n| &self.patches()[n])
    }
}

/// Return the ghost indexes of a box which lie inside the problem domain but
/// outside every box of the layout. These are the zones whose values come
/// from the next coarser level. Corner zones are not included; the operator
/// stencils in this crate never read them.
///
pub fn coarse_fine_ghosts(valid: &IndexSpace, layout: &BoxLayout, domain: &IndexSpace) -> Vec<(i64, i64)> {
    let mut ghosts = Vec::new();

    for axis in Axis::ALL {
        for side in Side::ALL {
            if let Some(layer) = valid.adjacent(axis, side, 1).intersect(domain) {
                ghosts.extend(layer.iter().filter(|&index| !layout.contains(index)))
            }
        }
    }
    ghosts
}

/// Interpolate coarse data at the centre of a fine zone. The value is
/// bilinear in the coarse cell-centered values, with the stencil clamped to
/// the coarse domain so that no coarse ghost data is required. If a stencil
/// zone is not covered by the coarse layout, the value of the coarse zone
/// containing the fine zone is used instead.
///
pub fn interpolate_from_coarse<P>(
    coarse: &P,
    coarse_domain: &IndexSpace,
    ratio: i64,
    fine_index: (i64, i64),
) -> f64
where
    P: PatchQuery,
{
    let r = ratio as f64;
    let xc = (fine_index.0 as f64 + 0.5) / r - 0.5;
    let yc = (fine_index.1 as f64 + 0.5) / r - 0.5;
    let i0 = xc.floor() as i64;
    let j0 = yc.floor() as i64;
    let wx = xc - i0 as f64;
    let wy = yc - j0 as f64;

    let clamp = |index: (i64, i64)| {
        let ri = coarse_domain.range(Axis::I);
        let rj = coarse_domain.range(Axis::J);
        (index.0.clamp(ri.start, ri.end - 1), index.1.clamp(rj.start, rj.end - 1))
    };
    let parent = (fine_index.0.div_euclid(ratio), fine_index.1.div_euclid(ratio));
    let parent_value = coarse
        .patch_containing_point(parent)
        .map_or(0.0, |p| p.get(parent));

    let sample = |index: (i64, i64)| {
        let index = clamp(index);
        coarse
            .patch_containing_point(index)
            .map_or(parent_value, |p| p.get(index))
    };

    let y00 = sample((i0, j0));
    let y10 = sample((i0 + 1, j0));
    let y01 = sample((i0, j0 + 1));
    let y11 = sample((i0 + 1, j0 + 1));

    (1.0 - wx) * (1.0 - wy) * y00 + wx * (1.0 - wy) * y10 + (1.0 - wx) * wy * y01 + wx * wy * y11
}

/// Fill the coarse-fine ghost zones of every patch of a level from the next
/// coarser level's data. If `coarse` is `None` the ghost zones are set to
/// zero, which is the homogeneous coarse-fine condition used by correction
/// solves.
///
pub fn fill_coarse_fine_ghosts(
    fine: &mut LevelData,
    fine_domain: &IndexSpace,
    coarse: Option<&LevelData>,
    ratio: i64,
) {
    let layout = fine.layout().clone();
    let coarse_domain = fine_domain.coarsen_by(ratio);

    fine.patches_mut()
        .par_iter_mut()
        .zip(layout.boxes().par_iter())
        .for_each(|(patch, valid)| {
            for index in coarse_fine_ghosts(valid, &layout, fine_domain) {
                let value = match coarse {
                    Some(coarse) => interpolate_from_coarse(coarse, &coarse_domain, ratio, index),
                    None => 0.0,
                };
                patch.set(index, value)
            }
        });
}
