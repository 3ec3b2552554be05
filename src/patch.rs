use serde::{Deserialize, Serialize};
use crate::index_space::IndexSpace;




/**
 * A patch is a mapping from a rectangular index space to associated field
 * values. The mapping is backed by a row-major array of data, with
 * `num_fields` contiguous values per index. The same type serves cell-centered
 * data (where the index space includes any ghost zones) and face-centered
 * data (where the index space is the face space of a box along one axis).
 */
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Patch {
    space: IndexSpace,
    num_fields: usize,
    data: Vec<f64>,
}




impl Patch {




    /**
     * Generate a patch covering the given index space, filled with zeros.
     */
    pub fn zeros(space: IndexSpace, num_fields: usize) -> Self {
        Self {
            data: vec![0.0; space.len() * num_fields],
            space,
            num_fields,
        }
    }




    /**
     * Generate a single-field patch covering the given index space, with
     * values defined from a closure.
     */
    pub fn from_function<F>(space: IndexSpace, f: F) -> Self
    where
        F: Fn((i64, i64)) -> f64
    {
        let data = space.iter().map(f).collect();
        Self { space, num_fields: 1, data }
    }




    /**
     * Generate a patch with several fields, each index written by a closure
     * into its slice.
     */
    pub fn from_slice_function<F>(space: IndexSpace, num_fields: usize, f: F) -> Self
    where
        F: Fn((i64, i64), &mut [f64])
    {
        let mut patch = Self::zeros(space, num_fields);
        let space = patch.space.clone();

        for (index, slice) in space.iter().zip(patch.data.chunks_exact_mut(num_fields)) {
            f(index, slice)
        }
        patch
    }




    pub fn index_space(&self) -> &IndexSpace {
        &self.space
    }

    pub fn num_fields(&self) -> usize {
        self.num_fields
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }




    /**
     * Return the value of the first field at the given index.
     */
    pub fn get(&self, index: (i64, i64)) -> f64 {
        self.get_slice(index)[0]
    }

    pub fn set(&mut self, index: (i64, i64), value: f64) {
        self.get_slice_mut(index)[0] = value
    }

    pub fn get_slice(&self, index: (i64, i64)) -> &[f64] {
        self.validate_index(index);
        let s = self.space.row_major_offset(index) * self.num_fields;
        &self.data[s .. s + self.num_fields]
    }

    pub fn get_slice_mut(&mut self, index: (i64, i64)) -> &mut [f64] {
        self.validate_index(index);
        let s = self.space.row_major_offset(index) * self.num_fields;
        &mut self.data[s .. s + self.num_fields]
    }




    /**
     * Set every value in the patch to a constant.
     */
    pub fn fill(&mut self, value: f64) {
        for x in &mut self.data {
            *x = value
        }
    }




    /**
     * Copy the values of another patch, within the given region, into this
     * one. The region is clipped to the intersection of both patches.
     */
    pub fn copy_from(&mut self, other: &Patch, region: &IndexSpace) {
        assert_eq!(self.num_fields, other.num_fields, "patches have different field counts");

        let overlap = self.space
            .intersect(&other.space)
            .and_then(|s| s.intersect(region));

        if let Some(overlap) = overlap {
            for index in overlap.iter() {
                let src = other.get_slice(index);
                self.get_slice_mut(index).copy_from_slice(src);
            }
        }
    }




    /**
     * Apply a function to each value of this patch, in place.
     */
    pub fn map_in_place<F>(&mut self, f: F)
    where
        F: Fn(f64) -> f64
    {
        for x in &mut self.data {
            *x = f(*x)
        }
    }

    fn validate_index(&self, index: (i64, i64)) {
        if !self.space.contains(index) {
            let (i0, j0) = self.space.start();
            let (i1, j1) = self.space.end();
            panic!("index ({} {}) out of range on patch ({}..{} {}..{})",
                index.0,
                index.1,
                i0,
                i1,
                j0,
                j1);
        }
    }
}
