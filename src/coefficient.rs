use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::index_space::{step, Axis, Side};
use crate::layout::{FaceData, LevelData};




#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Averaging {
    Arithmetic,
    Geometric,
}




/**
 * Interface for a strategy which supplies time-dependent face coefficients
 * to an operator.
 */
pub trait CoefficientInterpolator: Send + Sync {

    /**
     * Overwrite the face data with the coefficient at the given time.
     */
    fn interpolate(&self, target: &mut FaceData, time: f64);
}




/**
 * Linear interpolation (or extrapolation) in time between two snapshots of
 * a face coefficient.
 */
#[derive(Clone, Debug)]
pub struct LinearTimeInterpolator {
    t0: f64,
    b0: FaceData,
    t1: f64,
    b1: FaceData,
}




// ============================================================================
impl Averaging {
    fn average(self, a: f64, b: f64) -> f64 {
        match self {
            Averaging::Arithmetic => 0.5 * (a + b),
            Averaging::Geometric => (a * b).sqrt(),
        }
    }
}




/**
 * Average a cell-centered field onto the faces of each box. The ghost
 * zones of `cell` must already be filled, since boundary faces of a box
 * average the valid zone with its ghost neighbor.
 */
pub fn cell_to_face(cell: &LevelData, method: Averaging) -> FaceData {
    assert!(cell.ghost() >= 1, "cell_to_face requires at least one ghost zone");

    let mut faces = FaceData::new(cell.layout(), 0.0);

    faces.patches_mut()
        .par_iter_mut()
        .zip(cell.patches().par_iter())
        .for_each(|(face_patches, cell_patch)| {
            for axis in Axis::ALL {
                let target = &mut face_patches[axis as usize];
                let space = target.index_space().clone();

                for face in space.iter() {
                    let lo = cell_patch.get(step(face, axis, Side::Lo));
                    let hi = cell_patch.get(face);
                    target.set(face, method.average(lo, hi))
                }
            }
        });

    faces
}




// ============================================================================
impl LinearTimeInterpolator {

    pub fn new(t0: f64, b0: FaceData, t1: f64, b1: FaceData) -> Self {
        assert!(t1 != t0, "interpolation snapshots must be at distinct times");
        assert!(b0.layout() == b1.layout(), "interpolation snapshots are on different layouts");
        Self { t0, b0, t1, b1 }
    }
}

impl CoefficientInterpolator for LinearTimeInterpolator {
    fn interpolate(&self, target: &mut FaceData, time: f64) {
        assert!(target.layout() == self.b0.layout(), "target is on a different layout from the snapshots");

        let w = (time - self.t0) / (self.t1 - self.t0);

        target.patches_mut()
            .par_iter_mut()
            .zip(self.b0.patches().par_iter().zip(self.b1.patches().par_iter()))
            .for_each(|(target, (p0, p1))| {
                for axis in Axis::ALL {
                    let a = axis as usize;
                    let data = target[a].data_mut().iter_mut();

                    for (y, (x0, x1)) in data.zip(p0[a].data().iter().zip(p1[a].data())) {
                        *y = (1.0 - w) * x0 + w * x1
                    }
                }
            });
    }
}
