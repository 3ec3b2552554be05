use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::index_space::{step, Axis, IndexSpace, Side};
use crate::layout::LevelData;




/**
 * A linear boundary condition on one face of the problem domain.
 * `Dirichlet(v)` pins the face value, `Neumann(g)` pins the outward normal
 * gradient.
 */
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum BcKind {
    Dirichlet(f64),
    Neumann(f64),
}




/**
 * Linear physical boundary conditions for every face of a 2D domain.
 * Nonlinear (enthalpy) conditions are applied separately, by
 * `nonlinear_bc::fill_enthalpy_ghosts`.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomainBc {
    faces: [[BcKind; 2]; 2],
}




// ============================================================================
impl DomainBc {

    pub fn uniform(kind: BcKind) -> Self {
        Self { faces: [[kind; 2]; 2] }
    }

    pub fn with_face(mut self, axis: Axis, side: Side, kind: BcKind) -> Self {
        self.faces[axis as usize][side as usize] = kind;
        self
    }

    pub fn face(&self, axis: Axis, side: Side) -> BcKind {
        self.faces[axis as usize][side as usize]
    }


    /**
     * Return the ghost value for a zone outside the domain, given the value
     * of the interior zone it mirrors. The homogeneous version of each
     * condition has zero data.
     */
    pub fn ghost_value(&self, axis: Axis, side: Side, interior: f64, dx: f64, homogeneous: bool) -> f64 {
        match self.face(axis, side) {
            BcKind::Dirichlet(v) => {
                let v = if homogeneous { 0.0 } else { v };
                2.0 * v - interior
            }
            BcKind::Neumann(g) => {
                let g = if homogeneous { 0.0 } else { g };
                interior + dx * g
            }
        }
    }


    /**
     * Fill ghost zones lying outside the domain, on every patch of a level.
     * Only the ghost layer adjacent to the valid box is filled; corners are
     * skipped.
     */
    pub fn fill_ghosts(&self, data: &mut LevelData, domain: &IndexSpace, dx: f64, homogeneous: bool) {
        let layout = data.layout().clone();

        data.patches_mut()
            .par_iter_mut()
            .zip(layout.boxes().par_iter())
            .for_each(|(patch, valid)| {
                for axis in Axis::ALL {
                    for side in Side::ALL {
                        let layer = valid.adjacent(axis, side, 1);

                        for ghost in layer.iter().filter(|&index| !domain.contains(index)) {
                            let interior = patch.get(step(ghost, axis, side.flip()));
                            patch.set(ghost, self.ghost_value(axis, side, interior, dx, homogeneous))
                        }
                    }
                }
            });
    }
}




// ============================================================================
impl Default for DomainBc {
    fn default() -> Self {
        Self::uniform(BcKind::Dirichlet(0.0))
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::index_space::range2d;
    use crate::layout::BoxLayout;

    #[test]
    fn dirichlet_ghost_averages_to_face_value() {
        let bc = DomainBc::uniform(BcKind::Dirichlet(2.0));
        let g = bc.ghost_value(Axis::I, Side::Lo, 3.0, 0.1, false);
        assert_eq!(0.5 * (g + 3.0), 2.0);
        assert_eq!(bc.ghost_value(Axis::I, Side::Lo, 3.0, 0.1, true), -3.0);
    }

    #[test]
    fn neumann_ghost_has_prescribed_gradient() {
        let bc = DomainBc::uniform(BcKind::Neumann(0.0)).with_face(Axis::J, Side::Hi, BcKind::Neumann(4.0));
        let g = bc.ghost_value(Axis::J, Side::Hi, 1.0, 0.5, false);
        assert_eq!((g - 1.0) / 0.5, 4.0);
    }

    #[test]
    fn fill_ghosts_leaves_interior_ghosts_alone() {
        let layout = BoxLayout::new(vec![range2d(0..2, 0..2), range2d(2..4, 0..2)]).unwrap();
        let mut data = LevelData::from_function(&layout, 1, |_| 1.0);
        DomainBc::default().fill_ghosts(&mut data, &range2d(0..4, 0..2), 1.0, false);

        assert_eq!(data.patches()[0].get((-1, 0)), -1.0);
        assert_eq!(data.patches()[0].get((2, 0)), 1.0);
        assert_eq!(data.patches()[0].get((0, 2)), -1.0);
    }
}
