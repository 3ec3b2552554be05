use std::sync::Arc;
use log::debug;
use rayon::prelude::*;
use crate::boundary::DomainBc;
use crate::coefficient::CoefficientInterpolator;
use crate::config::RelaxMode;
use crate::flux_register::FluxRegister;
use crate::index_space::{step, Axis, Side};
use crate::layout::{average_down, average_down_faces, BoxLayout, FaceData, LevelData, ProblemDomain};
use crate::meshing::{fill_coarse_fine_ghosts, PatchQuery};
use crate::patch::Patch;




/**
 * The variable-coefficient operator
 *
 * `L[phi] = alpha a phi - beta (c phi + div(b grad phi))`
 *
 * on one AMR level (or one multigrid depth of a level). The cell-centered
 * coefficients `a` and `c` and the face-centered coefficient `b` are owned by
 * the operator. With `c` the Darcy drag coefficient, which is never
 * positive, this is the Darcy-Brinkman momentum operator.
 */
#[derive(Clone)]
pub struct VcOperator {
    domain: ProblemDomain,
    layout: BoxLayout,
    bc: DomainBc,
    ref_to_coarser: Option<i64>,
    alpha: f64,
    beta: f64,
    a_coef: LevelData,
    b_coef: FaceData,
    c_coef: LevelData,
    lambda: Option<LevelData>,
    relax_mode: RelaxMode,
    jacobi_weight: f64,
    time: f64,
    b_interpolator: Option<Arc<dyn CoefficientInterpolator>>,
}




// ============================================================================
impl VcOperator {


    /**
     * Create an operator with unit `a` and `b`, zero `c`, `alpha = 0` and
     * `beta = 1`: the negative Laplacian.
     */
    pub fn new(domain: ProblemDomain, layout: BoxLayout, bc: DomainBc) -> Self {
        Self {
            a_coef: LevelData::from_function(&layout, 0, |_| 1.0),
            b_coef: FaceData::new(&layout, 1.0),
            c_coef: LevelData::new(&layout, 1, 0),
            domain,
            layout,
            bc,
            ref_to_coarser: None,
            alpha: 0.0,
            beta: 1.0,
            lambda: None,
            relax_mode: RelaxMode::GsrbFast,
            jacobi_weight: 2.0 / 3.0,
            time: 0.0,
            b_interpolator: None,
        }
    }

    /**
     * Declare that this level has a coarser AMR level, refined from it by
     * the given ratio. Coarse-fine ghost zones are then interpolated from
     * that level's data.
     */
    pub fn with_ref_to_coarser(mut self, ratio: i64) -> Self {
        self.ref_to_coarser = Some(ratio);
        self
    }

    pub fn with_relax_mode(mut self, mode: RelaxMode, jacobi_weight: f64) -> Self {
        self.relax_mode = mode;
        self.jacobi_weight = jacobi_weight;
        self
    }

    pub fn domain(&self) -> &ProblemDomain {
        &self.domain
    }

    pub fn layout(&self) -> &BoxLayout {
        &self.layout
    }

    pub fn dx(&self) -> f64 {
        self.domain.dx
    }

    pub fn ref_to_coarser(&self) -> Option<i64> {
        self.ref_to_coarser
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn identity_coef(&self) -> &LevelData {
        &self.a_coef
    }

    pub fn b_coef(&self) -> &FaceData {
        &self.b_coef
    }

    pub fn darcy_coef(&self) -> &LevelData {
        &self.c_coef
    }

    pub fn time(&self) -> f64 {
        self.time
    }




    /**
     * Replace all coefficients. Invalidates the relaxation coefficient.
     */
    pub fn set_coefs(&mut self, a_coef: LevelData, b_coef: FaceData, alpha: f64, beta: f64, c_coef: LevelData) {
        assert!(a_coef.layout() == &self.layout, "identity coefficient is on the wrong layout");
        assert!(b_coef.layout() == &self.layout, "face coefficient is on the wrong layout");
        assert!(c_coef.layout() == &self.layout, "darcy coefficient is on the wrong layout");
        self.a_coef = a_coef;
        self.b_coef = b_coef;
        self.c_coef = c_coef;
        self.set_alpha_and_beta(alpha, beta);
    }

    pub fn set_alpha_and_beta(&mut self, alpha: f64, beta: f64) {
        self.alpha = alpha;
        self.beta = beta;
        self.reset_lambda();
    }

    /**
     * Mark the relaxation coefficient as stale. It is recomputed the next
     * time it is needed.
     */
    pub fn reset_lambda(&mut self) {
        self.lambda = None;
    }

    /**
     * Compute the relaxation coefficient: the reciprocal of the diagonal of
     * the operator in each valid zone.
     */
    pub fn compute_lambda(&mut self) {
        self.lambda = Some(self.evaluate_lambda());
    }

    /**
     * Return the relaxation coefficient, computing it if it is stale.
     */
    pub fn lambda(&mut self) -> &LevelData {
        let lambda = self.take_lambda();
        self.lambda.insert(lambda)
    }

    fn take_lambda(&mut self) -> LevelData {
        match self.lambda.take() {
            Some(lambda) => lambda,
            None => self.evaluate_lambda(),
        }
    }

    fn evaluate_lambda(&self) -> LevelData {
        debug!("computing relaxation coefficient on {} boxes (dx = {:.3e})", self.layout.len(), self.dx());

        let mut lambda = LevelData::new(&self.layout, 1, 0);

        lambda.patches_mut().par_iter_mut().enumerate().for_each(|(n, p)| {
            for index in self.layout.boxes()[n].iter() {
                p.set(index, 1.0 / self.diagonal_at(n, index))
            }
        });
        lambda
    }

    pub fn set_b_coef_interpolator(&mut self, interpolator: Arc<dyn CoefficientInterpolator>) {
        self.b_interpolator = Some(interpolator);
    }

    /**
     * Set the time centering of the operator. If a face coefficient
     * interpolator is installed, `b` is re-evaluated at that time.
     */
    pub fn set_time(&mut self, time: f64) {
        self.time = time;

        if let Some(interpolator) = &self.b_interpolator {
            interpolator.interpolate(&mut self.b_coef, time);
            self.reset_lambda();
        }
    }




    /**
     * Fill every ghost zone the stencil reads: first from neighbor boxes,
     * then from the physical boundary conditions, then by interpolation
     * from the coarser level. Passing `None` for `coarse` sets coarse-fine
     * ghost zones to zero.
     */
    pub fn fill_ghosts(&self, phi: &mut LevelData, coarse: Option<&LevelData>, homogeneous: bool) {
        assert!(phi.layout() == &self.layout, "data is on the wrong layout");
        assert!(phi.ghost() >= 1, "operator requires at least one ghost zone");

        phi.exchange();
        self.bc.fill_ghosts(phi, &self.domain.space, self.domain.dx, homogeneous);

        if !self.layout.covers(&self.domain.space) {
            let ratio = match (coarse, self.ref_to_coarser) {
                (Some(_), None) => panic!("coarse data given to an operator with no coarser level"),
                (_, ratio) => ratio.unwrap_or(1),
            };
            fill_coarse_fine_ghosts(phi, &self.domain.space, coarse, ratio)
        }
    }

    /**
     * Evaluate `L[phi]` in the valid zones, with ghost zones filled
     * according to `coarse` and `homogeneous`.
     */
    pub fn apply_op(&self, lhs: &mut LevelData, phi: &mut LevelData, coarse: Option<&LevelData>, homogeneous: bool) {
        self.fill_ghosts(phi, coarse, homogeneous);
        self.apply_op_no_boundary(lhs, phi)
    }

    /**
     * Evaluate `L[phi]` in the valid zones using the ghost values already
     * present in `phi`.
     */
    pub fn apply_op_no_boundary(&self, lhs: &mut LevelData, phi: &LevelData) {
        assert!(lhs.layout() == &self.layout, "output is on the wrong layout");

        lhs.patches_mut().par_iter_mut().enumerate().for_each(|(n, l)| {
            let p = &phi.patches()[n];
            for index in self.layout.boxes()[n].iter() {
                l.set(index, self.apply_at(n, p, index))
            }
        });
    }

    /**
     * Compute `rhs - L[phi]` in the valid zones.
     */
    pub fn residual(&self, res: &mut LevelData, phi: &mut LevelData, rhs: &LevelData, coarse: Option<&LevelData>, homogeneous: bool) {
        self.fill_ghosts(phi, coarse, homogeneous);
        self.residual_no_boundary(res, phi, rhs)
    }

    pub fn residual_no_boundary(&self, res: &mut LevelData, phi: &LevelData, rhs: &LevelData) {
        assert!(rhs.layout() == &self.layout, "right-hand side is on the wrong layout");
        self.apply_op_no_boundary(res, phi);
        res.axby_in_place(-1.0, rhs, 1.0);
    }




    /**
     * Smooth the homogeneous problem `L[phi] = rhs`, with zero physical and
     * coarse-fine boundary data, using the configured relaxation ordering.
     */
    pub fn relax(&mut self, phi: &mut LevelData, rhs: &LevelData, iterations: usize) {
        assert!(rhs.layout() == &self.layout, "right-hand side is on the wrong layout");

        let lambda = self.take_lambda();
        self.relax_with(phi, rhs, &lambda, iterations);
        self.lambda = Some(lambda);
    }

    fn relax_with(&self, phi: &mut LevelData, rhs: &LevelData, lambda: &LevelData, iterations: usize) {
        for _ in 0..iterations {
            match self.relax_mode {
                RelaxMode::GsrbFast => {
                    for colour in 0..2 {
                        self.fill_ghosts(phi, None, true);
                        self.relax_colour(phi, rhs, lambda, |(i, j)| (i + j).rem_euclid(2) == colour);
                    }
                }
                RelaxMode::Multicolor => {
                    for (ci, cj) in [(0, 0), (1, 1), (1, 0), (0, 1)] {
                        self.fill_ghosts(phi, None, true);
                        self.relax_colour(phi, rhs, lambda, |(i, j)| i.rem_euclid(2) == ci && j.rem_euclid(2) == cj);
                    }
                }
                RelaxMode::Lexicographic => {
                    for n in 0..self.layout.len() {
                        self.fill_ghosts(phi, None, true);
                        let p = &mut phi.patches_mut()[n];

                        for index in self.layout.boxes()[n].iter() {
                            let r = rhs.patches()[n].get(index) - self.apply_at(n, p, index);
                            let x = p.get(index) + lambda.patches()[n].get(index) * r;
                            p.set(index, x)
                        }
                    }
                }
                RelaxMode::Jacobi => {
                    let mut res = phi.zeros_like();
                    self.fill_ghosts(phi, None, true);
                    self.residual_no_boundary(&mut res, phi, rhs);
                    res.mult(lambda);
                    phi.incr(&res, self.jacobi_weight);
                }
            }
        }
    }

    fn relax_colour<C>(&self, phi: &mut LevelData, rhs: &LevelData, lambda: &LevelData, colour: C)
    where
        C: Fn((i64, i64)) -> bool + Sync
    {
        phi.patches_mut().par_iter_mut().enumerate().for_each(|(n, p)| {
            for index in self.layout.boxes()[n].iter().filter(|&index| colour(index)) {
                let r = rhs.patches()[n].get(index) - self.apply_at(n, p, index);
                let x = p.get(index) + lambda.patches()[n].get(index) * r;
                p.set(index, x)
            }
        });
    }




    /**
     * Return the flux `beta b d(phi)/dn` on the faces of box `n` normal to
     * `axis`. The ghost zones of `phi` must be filled.
     */
    pub fn get_flux(&self, phi: &LevelData, n: usize, axis: Axis) -> Patch {
        let b = self.b_coef.get(n, axis);
        let p = &phi.patches()[n];
        let scale = self.beta / self.dx();

        Patch::from_function(b.index_space().clone(), |face| {
            scale * b.get(face) * (p.get(face) - p.get(step(face, axis, Side::Lo)))
        })
    }

    /**
     * Return the fluxes on every face of every box.
     */
    pub fn fluxes(&self, phi: &LevelData) -> FaceData {
        let mut fluxes = FaceData::new(&self.layout, 0.0);

        fluxes.patches_mut().par_iter_mut().enumerate().for_each(|(n, f)| {
            for axis in Axis::ALL {
                f[axis as usize] = self.get_flux(phi, n, axis)
            }
        });
        fluxes
    }




    /**
     * Compute the homogeneous residual of `phi` and average it onto the
     * coarser layout `res_coarse`, which must cover this layout coarsened by
     * `ratio`.
     */
    pub fn restrict_residual(&self, res_coarse: &mut LevelData, phi: &mut LevelData, rhs: &LevelData, ratio: i64) {
        let mut res = rhs.zeros_like();
        self.residual(&mut res, phi, rhs, None, true);
        average_down(res_coarse, &res, ratio)
    }

    /**
     * Add a coarse correction to the valid zones of `phi`, piecewise
     * constant over each coarse zone.
     */
    pub fn prolong_increment(&self, phi: &mut LevelData, correction: &LevelData, ratio: i64) {
        assert!(phi.layout() == &self.layout, "data is on the wrong layout");

        phi.patches_mut().par_iter_mut().enumerate().for_each(|(n, p)| {
            for index in self.layout.boxes()[n].iter() {
                let parent = (index.0.div_euclid(ratio), index.1.div_euclid(ratio));

                if let Some(coarse) = correction.patch_containing_point(parent) {
                    let x = p.get(index) + coarse.get(parent);
                    p.set(index, x)
                }
            }
        });
    }

    /**
     * Correct the residual on this (coarse) level next to the finer level,
     * replacing the coarse flux through each coarse-fine face by the average
     * of the fine fluxes through it. Ghost zones of `phi` and `phi_fine`
     * must be filled.
     */
    pub fn reflux(&self, residual: &mut LevelData, phi: &LevelData, phi_fine: &LevelData, finer: &VcOperator, register: &mut FluxRegister) {
        register.set_to_zero();
        register.increment_coarse(&self.fluxes(phi), 1.0);
        register.increment_fine(&finer.fluxes(phi_fine), 1.0);
        register.reflux(residual, 1.0 / self.dx());
    }




    /**
     * Divide by the identity coefficient `a`, zone by zone.
     */
    pub fn divide_by_identity_coef(&self, rhs: &mut LevelData) {
        rhs.divide(&self.a_coef)
    }

    /**
     * Multiply by the identity coefficient `a`, zone by zone.
     */
    pub fn diagonal_scale(&self, rhs: &mut LevelData) {
        rhs.mult(&self.a_coef)
    }




    /**
     * Re-average the coefficients of this (coarser multigrid depth) operator
     * from the operator one depth finer, after that operator's coefficients,
     * scalars or time changed.
     */
    pub fn finer_operator_changed(&mut self, finer: &VcOperator) {
        let factor = (self.dx() / finer.dx()).round() as i64;

        average_down(&mut self.a_coef, &finer.a_coef, factor);
        average_down(&mut self.c_coef, &finer.c_coef, factor);
        average_down_faces(&mut self.b_coef, &finer.b_coef, factor);

        self.alpha = finer.alpha;
        self.beta = finer.beta;
        self.time = finer.time;
        self.reset_lambda();
    }

    /**
     * Return an operator on this layout coarsened by `factor`, with
     * coefficients averaged from this one. Used for the coarser depths of a
     * multigrid hierarchy; the coarse operator has no coarser AMR level.
     */
    pub fn coarsened(&self, factor: i64) -> Self {
        let layout = self.layout.coarsen_by(factor);
        let mut a_coef = LevelData::new(&layout, 1, 0);
        let mut c_coef = LevelData::new(&layout, 1, 0);
        let mut b_coef = FaceData::new(&layout, 0.0);

        average_down(&mut a_coef, &self.a_coef, factor);
        average_down(&mut c_coef, &self.c_coef, factor);
        average_down_faces(&mut b_coef, &self.b_coef, factor);

        Self {
            domain: self.domain.coarsen_by(factor),
            layout,
            bc: self.bc.clone(),
            ref_to_coarser: None,
            alpha: self.alpha,
            beta: self.beta,
            a_coef,
            b_coef,
            c_coef,
            lambda: None,
            relax_mode: self.relax_mode,
            jacobi_weight: self.jacobi_weight,
            time: self.time,
            b_interpolator: None,
        }
    }




    fn apply_at(&self, n: usize, phi: &Patch, index: (i64, i64)) -> f64 {
        let x = phi.get(index);
        let idx2 = 1.0 / (self.dx() * self.dx());
        let mut div = 0.0;

        for axis in Axis::ALL {
            let b = self.b_coef.get(n, axis);
            let hi = step(index, axis, Side::Hi);
            let lo = step(index, axis, Side::Lo);
            div += (b.get(hi) * (phi.get(hi) - x) - b.get(index) * (x - phi.get(lo))) * idx2;
        }
        let a = self.a_coef.patches()[n].get(index);
        let c = self.c_coef.patches()[n].get(index);
        self.alpha * a * x - self.beta * (c * x + div)
    }

    fn diagonal_at(&self, n: usize, index: (i64, i64)) -> f64 {
        let idx2 = 1.0 / (self.dx() * self.dx());
        let mut b_sum = 0.0;

        for axis in Axis::ALL {
            let b = self.b_coef.get(n, axis);
            b_sum += b.get(index) + b.get(step(index, axis, Side::Hi));
        }
        let a = self.a_coef.patches()[n].get(index);
        let c = self.c_coef.patches()[n].get(index);
        self.alpha * a - self.beta * c + self.beta * b_sum * idx2
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use std::f64::consts::PI;
    use crate::boundary::BcKind;
    use crate::coefficient::LinearTimeInterpolator;
    use crate::index_space::range2d;

    fn unit_square(n: i64, max_size: i64) -> (ProblemDomain, BoxLayout) {
        let domain = ProblemDomain::new(range2d(0..n, 0..n), 1.0 / n as f64);
        let layout = BoxLayout::decompose(&domain.space, max_size);
        (domain, layout)
    }

    fn laplacian_error(n: i64) -> f64 {
        let (domain, layout) = unit_square(n, n / 2);
        let op = VcOperator::new(domain.clone(), layout.clone(), DomainBc::default());
        let f = |index| {
            let (x, y) = domain.cell_center(index);
            (PI * x).sin() * (PI * y).sin()
        };
        let mut phi = LevelData::from_function(&layout, 1, f);
        let mut lhs = LevelData::new(&layout, 1, 1);
        op.apply_op(&mut lhs, &mut phi, None, false);

        layout.boxes().iter().flat_map(|b| b.iter().collect::<Vec<_>>())
            .map(|index| (lhs.value_at(index).unwrap() - 2.0 * PI * PI * f(index)).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn operator_converges_at_second_order() {
        let e1 = laplacian_error(16);
        let e2 = laplacian_error(32);
        let order = e1 / e2;
        assert!(order > 3.5 && order < 4.5, "error ratio {}", order);
    }

    #[test]
    fn divergence_matches_boundary_fluxes() {
        let (domain, layout) = unit_square(8, 8);
        let dx = domain.dx;
        let mut op = VcOperator::new(domain, layout.clone(), DomainBc::uniform(BcKind::Neumann(0.3)));
        let b = FaceData::from_function(&layout, |axis, (i, j)| 1.0 + 0.1 * i as f64 + if axis == Axis::J { 0.05 * j as f64 } else { 0.0 });
        op.set_coefs(LevelData::from_function(&layout, 0, |_| 1.0), b, 0.0, 1.5, LevelData::new(&layout, 1, 0));

        let mut phi = LevelData::from_function(&layout, 1, |(i, j)| ((i * 7 + j * 3) % 5) as f64 + 0.1 * (i * j) as f64);
        let mut lhs = LevelData::new(&layout, 1, 1);
        op.apply_op(&mut lhs, &mut phi, None, false);

        let valid = &layout.boxes()[0];
        let volume_integral = lhs.sum() * dx * dx;
        let mut boundary_integral = 0.0;

        for axis in Axis::ALL {
            let flux = op.get_flux(&phi, 0, axis);
            let lo = valid.start();
            let hi = valid.end();

            for face in flux.index_space().iter() {
                if axis.component(face) == axis.component(hi) {
                    boundary_integral += flux.get(face) * dx;
                } else if axis.component(face) == axis.component(lo) {
                    boundary_integral -= flux.get(face) * dx;
                }
            }
        }
        assert!((volume_integral + boundary_integral).abs() < 1e-10);
    }

    #[test]
    fn lambda_is_recomputed_after_coefficients_change() {
        let (domain, layout) = unit_square(8, 4);
        let mut op = VcOperator::new(domain, layout, DomainBc::default());

        op.set_alpha_and_beta(1.0, 1.0);
        assert!((op.lambda().value_at((3, 3)).unwrap() - 1.0 / (1.0 + 4.0 * 64.0)).abs() < 1e-14);

        op.set_alpha_and_beta(2.0, 0.5);
        assert!((op.lambda().value_at((3, 3)).unwrap() - 1.0 / (2.0 + 2.0 * 64.0)).abs() < 1e-14);
    }

    #[test]
    fn darcy_drag_strengthens_the_diagonal() {
        let (domain, layout) = unit_square(8, 8);
        let mut op = VcOperator::new(domain, layout.clone(), DomainBc::default());
        let before = op.lambda().value_at((2, 2)).unwrap();
        let c = LevelData::from_function(&layout, 0, |_| -100.0);
        op.set_coefs(op.identity_coef().clone(), op.b_coef().clone(), 0.0, 1.0, c);
        assert!(op.lambda().value_at((2, 2)).unwrap() < before);
    }

    #[test]
    fn every_relax_mode_smooths_the_residual() {
        for mode in [RelaxMode::GsrbFast, RelaxMode::Lexicographic, RelaxMode::Multicolor, RelaxMode::Jacobi] {
            let (domain, layout) = unit_square(16, 8);
            let mut op = VcOperator::new(domain, layout.clone(), DomainBc::default()).with_relax_mode(mode, 2.0 / 3.0);
            op.set_alpha_and_beta(1.0, 1.0);

            let mut phi = LevelData::from_function(&layout, 1, |(i, j)| ((i * 7 + j * 13) % 5) as f64 - 2.0);
            let rhs = LevelData::new(&layout, 1, 0);
            let mut res = LevelData::new(&layout, 1, 0);

            op.residual(&mut res, &mut phi, &rhs, None, true);
            let r0 = res.norm_max();
            op.relax(&mut phi, &rhs, 10);
            op.residual(&mut res, &mut phi, &rhs, None, true);

            assert!(res.norm_max() < 0.5 * r0, "{:?} did not smooth", mode);
        }
    }

    #[test]
    fn identity_scaling_round_trips() {
        let (domain, layout) = unit_square(8, 4);
        let mut op = VcOperator::new(domain, layout.clone(), DomainBc::default());
        let a = LevelData::from_function(&layout, 0, |(i, _)| 1.0 + i as f64);
        op.set_coefs(a, FaceData::new(&layout, 1.0), 1.0, 1.0, LevelData::new(&layout, 1, 0));

        let mut rhs = LevelData::from_function(&layout, 1, |(_, j)| j as f64);
        op.diagonal_scale(&mut rhs);
        assert_eq!(rhs.value_at((3, 2)), Some(8.0));
        op.divide_by_identity_coef(&mut rhs);
        assert_eq!(rhs.value_at((3, 2)), Some(2.0));
    }

    #[test]
    fn set_time_interpolates_the_face_coefficient() {
        let (domain, layout) = unit_square(8, 8);
        let mut op = VcOperator::new(domain, layout.clone(), DomainBc::default());
        let interp = LinearTimeInterpolator::new(0.0, FaceData::new(&layout, 1.0), 1.0, FaceData::new(&layout, 3.0));
        op.set_b_coef_interpolator(Arc::new(interp));

        let before = op.lambda().value_at((4, 4)).unwrap();
        op.set_time(0.5);

        assert_eq!(op.b_coef().value_at(Axis::I, (4, 4)), Some(2.0));
        assert!((op.lambda().value_at((4, 4)).unwrap() - 0.5 * before).abs() < 1e-14);
    }

    #[test]
    fn coarsened_operator_averages_coefficients() {
        let (domain, layout) = unit_square(8, 4);
        let mut op = VcOperator::new(domain, layout.clone(), DomainBc::default());
        let a = LevelData::from_function(&layout, 0, |(i, _)| i as f64);
        op.set_coefs(a, FaceData::new(&layout, 2.0), 1.0, 1.0, LevelData::new(&layout, 1, 0));

        let coarse = op.coarsened(2);
        assert_eq!(coarse.dx(), 0.25);
        assert_eq!(coarse.identity_coef().value_at((1, 0)), Some(2.5));
        assert_eq!(coarse.b_coef().value_at(Axis::J, (1, 2)), Some(2.0));
    }

    #[test]
    fn coarser_depth_follows_changes_to_the_finer_operator() {
        let (domain, layout) = unit_square(8, 4);
        let mut op = VcOperator::new(domain, layout.clone(), DomainBc::default());
        let mut coarse = op.coarsened(2);
        let before = coarse.lambda().value_at((1, 1)).unwrap();

        op.set_coefs(LevelData::from_function(&layout, 0, |_| 3.0), FaceData::new(&layout, 4.0), 0.5, 2.0, LevelData::new(&layout, 1, 0));
        op.set_time(0.25);
        coarse.finer_operator_changed(&op);

        assert_eq!(coarse.identity_coef().value_at((1, 1)), Some(3.0));
        assert_eq!(coarse.b_coef().value_at(Axis::I, (1, 1)), Some(4.0));
        assert_eq!((coarse.alpha(), coarse.beta(), coarse.time()), (0.5, 2.0, 0.25));
        assert!(coarse.lambda().value_at((1, 1)).unwrap() < before);
    }
}
