use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::error::Error;
use crate::index_space::{Axis, IndexSpace};
use crate::patch::Patch;




/**
 * The index space of a whole AMR level, together with its cell spacing.
 * Cells outside the domain are physical-boundary ghost cells.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProblemDomain {
    pub space: IndexSpace,
    pub dx: f64,
}




// ============================================================================
impl ProblemDomain {

    pub fn new(space: IndexSpace, dx: f64) -> Self {
        Self { space, dx }
    }

    pub fn refine_by(&self, factor: i64) -> Self {
        Self::new(self.space.refine_by(factor), self.dx / factor as f64)
    }

    pub fn coarsen_by(&self, factor: i64) -> Self {
        Self::new(self.space.coarsen_by(factor), self.dx * factor as f64)
    }

    /**
     * Return the physical location of a cell centre, with the domain's low
     * corner at the origin.
     */
    pub fn cell_center(&self, index: (i64, i64)) -> (f64, f64) {
        let (i0, j0) = self.space.start();
        (self.dx * ((index.0 - i0) as f64 + 0.5),
         self.dx * ((index.1 - j0) as f64 + 0.5))
    }
}




/**
 * A set of disjoint boxes within a problem domain: the valid region of one
 * AMR level (or one multigrid depth of a level).
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxLayout {
    boxes: Vec<IndexSpace>,
}




// ============================================================================
impl BoxLayout {

    pub fn new(boxes: Vec<IndexSpace>) -> Result<Self, Error> {
        for (n, a) in boxes.iter().enumerate() {
            if a.is_empty() {
                return Err(Error::IncompatibleLayout(format!("box {} is empty", n)))
            }
            for b in &boxes[n + 1..] {
                if a.intersect(b).is_some() {
                    return Err(Error::IncompatibleLayout(format!("boxes {:?} and {:?} overlap", a, b)))
                }
            }
        }
        Ok(Self { boxes })
    }

    /**
     * Split a domain into square-ish boxes of at most `max_size` cells on a
     * side.
     */
    pub fn decompose(domain: &IndexSpace, max_size: i64) -> Self {
        let (i0, j0) = domain.start();
        let (i1, j1) = domain.end();
        let mut boxes = Vec::new();
        let mut i = i0;

        while i < i1 {
            let mut j = j0;
            while j < j1 {
                boxes.push(IndexSpace::new(i..(i + max_size).min(i1), j..(j + max_size).min(j1)));
                j += max_size;
            }
            i += max_size;
        }
        Self { boxes }
    }

    pub fn boxes(&self) -> &[IndexSpace] {
        &self.boxes
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn num_cells(&self) -> usize {
        self.boxes.iter().map(IndexSpace::len).sum()
    }

    /**
     * Return the position of the box containing the given index, if any.
     */
    pub fn find(&self, index: (i64, i64)) -> Option<usize> {
        self.boxes.iter().position(|b| b.contains(index))
    }

    pub fn contains(&self, index: (i64, i64)) -> bool {
        self.find(index).is_some()
    }

    pub fn is_coarsenable_by(&self, factor: i64) -> bool {
        self.boxes.iter().all(|b| b.is_coarsenable_by(factor))
    }

    pub fn coarsen_by(&self, factor: i64) -> Self {
        Self { boxes: self.boxes.iter().map(|b| b.coarsen_by(factor)).collect() }
    }

    pub fn refine_by(&self, factor: i64) -> Self {
        Self { boxes: self.boxes.iter().map(|b| b.refine_by(factor)).collect() }
    }

    /**
     * Determine whether every cell of the given space is covered by some box.
     */
    pub fn covers(&self, space: &IndexSpace) -> bool {
        let covered: usize = self.boxes.iter().filter_map(|b| b.intersect(space)).map(|s| s.len()).sum();
        covered == space.len()
    }
}




/**
 * Cell-centered data on a box layout: one patch per box, each extended by
 * `ghost` zones on every side.
 */
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelData {
    layout: BoxLayout,
    ghost: i64,
    patches: Vec<Patch>,
}




// ============================================================================
impl LevelData {

    pub fn new(layout: &BoxLayout, num_fields: usize, ghost: i64) -> Self {
        let patches = layout.boxes.iter().map(|b| Patch::zeros(b.extend_all(ghost), num_fields)).collect();
        Self { layout: layout.clone(), ghost, patches }
    }

    /**
     * Build single-field data with every valid and ghost value given by a
     * function of the index.
     */
    pub fn from_function<F>(layout: &BoxLayout, ghost: i64, f: F) -> Self
    where
        F: Fn((i64, i64)) -> f64
    {
        let patches = layout.boxes.iter().map(|b| Patch::from_function(b.extend_all(ghost), &f)).collect();
        Self { layout: layout.clone(), ghost, patches }
    }

    /**
     * Return zero-valued data with the same layout, field count and ghost
     * width as this one.
     */
    pub fn zeros_like(&self) -> Self {
        Self::new(&self.layout, self.num_fields(), self.ghost)
    }

    pub fn layout(&self) -> &BoxLayout {
        &self.layout
    }

    pub fn ghost(&self) -> i64 {
        self.ghost
    }

    pub fn num_fields(&self) -> usize {
        self.patches.first().map_or(1, Patch::num_fields)
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn patches_mut(&mut self) -> &mut [Patch] {
        &mut self.patches
    }

    /**
     * Iterate over (valid box, patch) pairs.
     */
    pub fn iter(&self) -> impl Iterator<Item = (&IndexSpace, &Patch)> {
        self.layout.boxes.iter().zip(self.patches.iter())
    }

    /**
     * Return the valid value at an index, searching the boxes of the layout.
     */
    pub fn value_at(&self, index: (i64, i64)) -> Option<f64> {
        self.layout.find(index).map(|n| self.patches[n].get(index))
    }

    /**
     * Return a value at an index which may lie in a ghost zone: the valid
     * value if some box contains it, otherwise the first patch holding the
     * index in its ghost region.
     */
    pub fn ghost_value_at(&self, index: (i64, i64)) -> Option<f64> {
        self.value_at(index).or_else(|| {
            self.patches
                .iter()
                .find(|p| p.index_space().contains(index))
                .map(|p| p.get(index))
        })
    }

    pub fn set_val(&mut self, value: f64) {
        self.patches.par_iter_mut().for_each(|p| p.fill(value))
    }

    /**
     * Copy valid values of another level-data object into this one.
     */
    pub fn assign(&mut self, other: &LevelData) {
        self.assert_compatible(other);
        self.patches.par_iter_mut().zip(other.patches.par_iter()).zip(self.layout.boxes.par_iter())
            .for_each(|((p, q), b)| p.copy_from(q, b));
    }

    /**
     * `self += scale * other` over valid cells.
     */
    pub fn incr(&mut self, other: &LevelData, scale: f64) {
        self.axby_in_place(1.0, other, scale)
    }

    /**
     * `self = a * self + b * other` over valid cells.
     */
    pub fn axby_in_place(&mut self, a: f64, other: &LevelData, b: f64) {
        self.assert_compatible(other);
        let boxes = &self.layout.boxes;

        self.patches.par_iter_mut().zip(other.patches.par_iter()).zip(boxes.par_iter())
            .for_each(|((p, q), valid)| {
                for index in valid.iter() {
                    let y = q.get_slice(index).to_vec();
                    for (x, y) in p.get_slice_mut(index).iter_mut().zip(y) {
                        *x = a * *x + b * y
                    }
                }
            });
    }

    /**
     * Multiply valid values cell-by-cell by another field.
     */
    pub fn mult(&mut self, other: &LevelData) {
        self.combine(other, |x, y| x * y)
    }

    /**
     * Divide valid values cell-by-cell by another field.
     */
    pub fn divide(&mut self, other: &LevelData) {
        self.combine(other, |x, y| x / y)
    }

    fn combine<F>(&mut self, other: &LevelData, f: F)
    where
        F: Fn(f64, f64) -> f64 + Sync
    {
        self.assert_compatible(other);
        let boxes = &self.layout.boxes;

        self.patches.par_iter_mut().zip(other.patches.par_iter()).zip(boxes.par_iter())
            .for_each(|((p, q), valid)| {
                for index in valid.iter() {
                    let y = q.get(index);
                    for x in p.get_slice_mut(index) {
                        *x = f(*x, y)
                    }
                }
            });
    }

    /**
     * Return the maximum absolute value over valid cells.
     */
    pub fn norm_max(&self) -> f64 {
        self.iter()
            .map(|(b, p)| b.iter().flat_map(|index| p.get_slice(index).iter().map(|x| x.abs()).collect::<Vec<_>>()).fold(0.0, f64::max))
            .fold(0.0, f64::max)
    }

    /**
     * Return the sum of valid values of the first field.
     */
    pub fn sum(&self) -> f64 {
        self.iter().map(|(b, p)| b.iter().map(|index| p.get(index)).sum::<f64>()).sum()
    }

    /**
     * Copy valid data into the ghost zones of neighbor boxes which overlap
     * it. Ghost zones which overlap no other box are left untouched.
     */
    pub fn exchange(&mut self) {
        let sources = self.patches.clone();
        let boxes = &self.layout.boxes;

        self.patches.par_iter_mut().enumerate().for_each(|(n, patch)| {
            let grown = patch.index_space().clone();
            for (m, (valid, src)) in boxes.iter().zip(&sources).enumerate() {
                if m != n {
                    if let Some(overlap) = valid.intersect(&grown) {
                        patch.copy_from(src, &overlap)
                    }
                }
            }
        });
    }

    fn assert_compatible(&self, other: &LevelData) {
        assert!(self.layout == other.layout, "level data objects are defined on different layouts");
    }
}




/**
 * Face-centered data on a box layout: for each box, one patch per axis,
 * covering the faces normal to that axis.
 */
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FaceData {
    layout: BoxLayout,
    patches: Vec<[Patch; 2]>,
}




// ============================================================================
impl FaceData {

    pub fn new(layout: &BoxLayout, value: f64) -> Self {
        let patches = layout.boxes.iter().map(|b| {
            let mut pi = Patch::zeros(b.extend_upper(1, Axis::I), 1);
            let mut pj = Patch::zeros(b.extend_upper(1, Axis::J), 1);
            pi.fill(value);
            pj.fill(value);
            [pi, pj]
        }).collect();
        Self { layout: layout.clone(), patches }
    }

    /**
     * Build face data from a function of (axis, face index).
     */
    pub fn from_function<F>(layout: &BoxLayout, f: F) -> Self
    where
        F: Fn(Axis, (i64, i64)) -> f64
    {
        let patches = layout.boxes.iter().map(|b| {
            [Patch::from_function(b.extend_upper(1, Axis::I), |index| f(Axis::I, index)),
             Patch::from_function(b.extend_upper(1, Axis::J), |index| f(Axis::J, index))]
        }).collect();
        Self { layout: layout.clone(), patches }
    }

    pub fn layout(&self) -> &BoxLayout {
        &self.layout
    }

    pub fn get(&self, n: usize, axis: Axis) -> &Patch {
        &self.patches[n][axis as usize]
    }

    pub fn get_mut(&mut self, n: usize, axis: Axis) -> &mut Patch {
        &mut self.patches[n][axis as usize]
    }

    pub fn patches(&self) -> &[[Patch; 2]] {
        &self.patches
    }

    pub fn patches_mut(&mut self) -> &mut [[Patch; 2]] {
        &mut self.patches
    }

    /**
     * Return the value on a face, searching boxes whose face space holds it.
     */
    pub fn value_at(&self, axis: Axis, face: (i64, i64)) -> Option<f64> {
        self.patches
            .iter()
            .map(|p| &p[axis as usize])
            .find(|p| p.index_space().contains(face))
            .map(|p| p.get(face))
    }
}




/**
 * Replace valid coarse data under the fine layout with the average of the
 * overlying fine cells. The fine layout must be coarsenable by the ratio.
 */
pub fn average_down(coarse: &mut LevelData, fine: &LevelData, ratio: i64) {
    let inv_volume = 1.0 / (ratio * ratio) as f64;
    let nf = coarse.num_fields();
    let boxes = coarse.layout.boxes.clone();

    coarse.patches.par_iter_mut().zip(boxes.par_iter()).for_each(|(patch, valid)| {
        for (fine_box, fine_patch) in fine.iter() {
            if let Some(overlap) = fine_box.coarsen_by(ratio).intersect(valid) {
                for index in overlap.iter() {
                    let children = IndexSpace::new(index.0..index.0 + 1, index.1..index.1 + 1).refine_by(ratio);
                    let mut sum = vec![0.0; nf];
                    for child in children.iter() {
                        for (s, x) in sum.iter_mut().zip(fine_patch.get_slice(child)) {
                            *s += x
                        }
                    }
                    for (y, s) in patch.get_slice_mut(index).iter_mut().zip(sum) {
                        *y = s * inv_volume
                    }
                }
            }
        }
    });
}




/**
 * Replace coarse face values under the fine layout with the average of the
 * overlying fine faces (the fine faces which lie on coarse faces).
 */
pub fn average_down_faces(coarse: &mut FaceData, fine: &FaceData, ratio: i64) {
    let boxes = coarse.layout.boxes.clone();

    coarse.patches.par_iter_mut().zip(boxes.par_iter()).for_each(|(faces, valid)| {
        for axis in Axis::ALL {
            let other = match axis { Axis::I => Axis::J, Axis::J => Axis::I };

            for (n, fine_box) in fine.layout.boxes.iter().enumerate() {
                let coarse_faces = match fine_box.coarsen_by(ratio).intersect(valid) {
                    Some(overlap) => overlap.extend_upper(1, axis),
                    None => continue,
                };
                let fine_patch = &fine.patches[n][axis as usize];

                for face in coarse_faces.iter() {
                    let normal = axis.component(face) * ratio;
                    let tangent = other.component(face) * ratio;
                    let mut sum = 0.0;
                    let mut count = 0;

                    for t in tangent..tangent + ratio {
                        let f = match axis { Axis::I => (normal, t), Axis::J => (t, normal) };
                        if fine_patch.index_space().contains(f) {
                            sum += fine_patch.get(f);
                            count += 1;
                        }
                    }
                    if count == ratio {
                        faces[axis as usize].set(face, sum / ratio as f64)
                    }
                }
            }
        }
    });
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::index_space::range2d;

    fn two_box_layout() -> BoxLayout {
        BoxLayout::new(vec![range2d(0..4, 0..4), range2d(4..8, 0..4)]).unwrap()
    }

    #[test]
    fn overlapping_boxes_are_rejected() {
        assert!(BoxLayout::new(vec![range2d(0..4, 0..4), range2d(3..8, 0..4)]).is_err());
    }

    #[test]
    fn decomposition_covers_the_domain() {
        let domain = range2d(0..10, 0..7);
        let layout = BoxLayout::decompose(&domain, 4);
        assert_eq!(layout.num_cells(), domain.len());
        assert!(layout.covers(&domain));
    }

    #[test]
    fn exchange_fills_interior_ghosts_only() {
        let layout = two_box_layout();
        let mut data = LevelData::new(&layout, 1, 1);

        for (b, p) in layout.boxes().iter().zip(data.patches_mut()) {
            for index in b.iter() {
                p.set(index, index.0 as f64)
            }
        }
        data.exchange();

        assert_eq!(data.patches()[0].get((4, 2)), 4.0);
        assert_eq!(data.patches()[1].get((3, 2)), 3.0);
        assert_eq!(data.patches()[0].get((-1, 2)), 0.0);
    }

    #[test]
    fn average_down_preserves_the_mean() {
        let coarse_layout = BoxLayout::new(vec![range2d(0..4, 0..4)]).unwrap();
        let fine_layout = BoxLayout::new(vec![range2d(2..6, 2..6)]).unwrap();
        let mut coarse = LevelData::new(&coarse_layout, 1, 1);
        let fine = LevelData::from_function(&fine_layout, 1, |(i, j)| (i + 2 * j) as f64);

        average_down(&mut coarse, &fine, 2);

        assert_eq!(coarse.value_at((1, 1)), Some(0.25 * (6.0 + 7.0 + 8.0 + 9.0)));
        assert_eq!(coarse.value_at((0, 0)), Some(0.0));
    }

    #[test]
    fn axby_only_touches_valid_cells() {
        let layout = two_box_layout();
        let mut x = LevelData::from_function(&layout, 1, |_| 1.0);
        let y = LevelData::from_function(&layout, 1, |_| 2.0);
        x.axby_in_place(2.0, &y, 3.0);
        assert_eq!(x.value_at((5, 1)), Some(8.0));
        assert_eq!(x.patches()[0].get((-1, 0)), 1.0);
        assert_eq!(x.norm_max(), 8.0);
    }
}
