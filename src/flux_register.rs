use std::collections::HashMap;
use crate::index_space::{step, Axis, IndexSpace, Side};
use crate::layout::{BoxLayout, FaceData, LevelData};




/**
 * One coarse-fine face, identified by the coarse zone beside it (outside
 * the fine region) and the side of that zone on which the face lies.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InterfaceFace {
    pub cell: (i64, i64),
    pub axis: Axis,
    pub side: Side,
}




/**
 * Accumulates the coarse flux and the averaged fine flux through every
 * coarse-fine face between two AMR levels, and applies the difference to
 * the coarse zones beside the interface.
 */
#[derive(Clone, Debug)]
pub struct FluxRegister {
    ratio: i64,
    faces: Vec<InterfaceFace>,
    lookup: HashMap<InterfaceFace, usize>,
    coarse_flux: Vec<f64>,
    fine_flux: Vec<f64>,
}




// ============================================================================
impl InterfaceFace {

    /**
     * Index of this face in the coarse level's face data.
     */
    pub fn coarse_face(&self) -> (i64, i64) {
        match self.side {
            Side::Lo => self.cell,
            Side::Hi => step(self.cell, self.axis, Side::Hi),
        }
    }

    /**
     * Indexes of the fine faces which tile this face.
     */
    pub fn fine_faces(&self, ratio: i64) -> Vec<(i64, i64)> {
        let (fi, fj) = self.coarse_face();
        match self.axis {
            Axis::I => (0..ratio).map(|t| (fi * ratio, fj * ratio + t)).collect(),
            Axis::J => (0..ratio).map(|t| (fi * ratio + t, fj * ratio)).collect(),
        }
    }
}




// ============================================================================
impl FluxRegister {


    /**
     * Find every coarse-fine face between the two layouts. Faces on the
     * physical boundary, and faces between two fine boxes, are excluded.
     *
     * * `coarse`       - The coarse layout
     * * `fine`         - The fine layout, nested in the coarse one
     * * `coarse_domain`- The coarse level's problem domain
     * * `ratio`        - The refinement ratio between the levels
     */
    pub fn new(coarse: &BoxLayout, fine: &BoxLayout, coarse_domain: &IndexSpace, ratio: i64) -> Self {
        let covered = fine.coarsen_by(ratio);
        let mut faces = Vec::new();
        let mut lookup = HashMap::new();

        for region in covered.boxes() {
            for axis in Axis::ALL {
                for side in Side::ALL {
                    let layer = match region.adjacent(axis, side, 1).intersect(coarse_domain) {
                        Some(layer) => layer,
                        None => continue,
                    };
                    for cell in layer.iter() {
                        if covered.contains(cell) || !coarse.contains(cell) {
                            continue;
                        }
                        // the face is on the far side of the coarse zone, as seen from the fine region
                        let face = InterfaceFace { cell, axis, side: side.flip() };

                        if !lookup.contains_key(&face) {
                            lookup.insert(face, faces.len());
                            faces.push(face);
                        }
                    }
                }
            }
        }

        let n = faces.len();
        Self { ratio, faces, lookup, coarse_flux: vec![0.0; n], fine_flux: vec![0.0; n] }
    }

    pub fn faces(&self) -> &[InterfaceFace] {
        &self.faces
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn set_to_zero(&mut self) {
        self.coarse_flux.iter_mut().for_each(|x| *x = 0.0);
        self.fine_flux.iter_mut().for_each(|x| *x = 0.0);
    }

    /**
     * Add `scale` times the coarse flux through each interface face.
     */
    pub fn increment_coarse(&mut self, fluxes: &FaceData, scale: f64) {
        for (face, register) in self.faces.iter().zip(&mut self.coarse_flux) {
            if let Some(f) = fluxes.value_at(face.axis, face.coarse_face()) {
                *register += scale * f
            }
        }
    }

    /**
     * Add `scale` times the average of the fine fluxes tiling each
     * interface face.
     */
    pub fn increment_fine(&mut self, fluxes: &FaceData, scale: f64) {
        let ratio = self.ratio;

        for (face, register) in self.faces.iter().zip(&mut self.fine_flux) {
            let sum: f64 = face.fine_faces(ratio)
                .into_iter()
                .filter_map(|f| fluxes.value_at(face.axis, f))
                .sum();
            *register += scale * sum / ratio as f64
        }
    }

    /**
     * Return the accumulated `(coarse, fine)` flux of a face, if it is an
     * interface face.
     */
    pub fn get(&self, face: &InterfaceFace) -> Option<(f64, f64)> {
        self.lookup.get(face).map(|&n| (self.coarse_flux[n], self.fine_flux[n]))
    }

    /**
     * Add `scale (fine - coarse)` to the coarse zone beside each face, with
     * the sign of the face's outward normal from that zone.
     */
    pub fn reflux(&self, residual: &mut LevelData, scale: f64) {
        for (n, face) in self.faces.iter().enumerate() {
            let correction = scale * face.side.sign() as f64 * (self.fine_flux[n] - self.coarse_flux[n]);

            if let Some(b) = residual.layout().find(face.cell) {
                let p = &mut residual.patches_mut()[b];
                let x = p.get(face.cell) + correction;
                p.set(face.cell, x)
            }
        }
    }
}
