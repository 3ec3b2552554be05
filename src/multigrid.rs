use log::{debug, info};
use crate::boundary::DomainBc;
use crate::config::SolverConfig;
use crate::error::Error;
use crate::flux_register::FluxRegister;
use crate::layout::{average_down, BoxLayout, FaceData, LevelData, ProblemDomain};
use crate::operator::VcOperator;




/**
 * Index of an operator in an `OperatorHierarchy`
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OpId(pub usize);




/**
 * An operator together with its place in the hierarchy. Links to other
 * operators are indexes into the same hierarchy.
 */
#[derive(Clone)]
pub struct OperatorNode {
    pub op: VcOperator,
    pub level: usize,
    pub depth: usize,
    pub amr_coarser: Option<OpId>,
    pub mg_coarser: Option<OpId>,
}




/**
 * The coefficients of one AMR level: `a` and `c` cell-centered, `b` on
 * faces
 */
#[derive(Clone, Debug)]
pub struct LevelCoefficients {
    pub a: LevelData,
    pub b: FaceData,
    pub c: LevelData,
}




/**
 * Owns every operator of an AMR multigrid solve: one per AMR level at depth
 * zero, and the successively coarsened operators below each of them.
 */
#[derive(Clone)]
pub struct OperatorHierarchy {
    nodes: Vec<OperatorNode>,
    levels: Vec<OpId>,
    ref_ratios: Vec<i64>,
}




/**
 * Outcome of a composite solve. Running out of iterations is reported here,
 * not raised.
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolveSummary {
    pub iterations: usize,
    pub initial_residual: f64,
    pub final_residual: f64,
    pub converged: bool,
}




/**
 * Composite multigrid solver for `L[phi] = rhs` over all AMR levels, using
 * V-cycles in correction form.
 */
pub struct AmrMultigrid {
    hierarchy: OperatorHierarchy,
    config: SolverConfig,
    registers: Vec<FluxRegister>,
}




/**
 * Build the operators for every AMR level and every multigrid depth, and
 * link them.
 *
 * * `coarsest`   - Problem domain of level 0
 * * `grids`      - Box layout of each level, coarsest first
 * * `ref_ratios` - Refinement ratio from each level to the next finer one
 * * `bc`         - Physical boundary conditions
 * * `coefs`      - Coefficients of each level, on that level's layout
 */
#[allow(clippy::too_many_arguments)]
pub fn build_hierarchy(
    coarsest: ProblemDomain,
    grids: &[BoxLayout],
    ref_ratios: &[i64],
    bc: &DomainBc,
    alpha: f64,
    beta: f64,
    coefs: Vec<LevelCoefficients>,
    config: &SolverConfig) -> Result<OperatorHierarchy, Error>
{
    if grids.is_empty() {
        return Err(Error::IncompatibleLayout("no levels given".to_string()))
    }
    if coefs.len() != grids.len() {
        return Err(Error::IncompatibleLayout(format!("{} coefficient sets for {} levels", coefs.len(), grids.len())))
    }
    if ref_ratios.len() + 1 < grids.len() {
        return Err(Error::IncompatibleLayout(format!("{} refinement ratios for {} levels", ref_ratios.len(), grids.len())))
    }
    if !grids[0].covers(&coarsest.space) {
        return Err(Error::IncompatibleLayout("level 0 does not cover the domain".to_string()))
    }

    let mut domains = vec![coarsest];

    for (l, grid) in grids.iter().enumerate().skip(1) {
        let ratio = ref_ratios[l - 1];
        let coarse_domain = &domains[l - 1];
        let domain = coarse_domain.refine_by(ratio);
        check_nesting(&grids[l - 1], grid, coarse_domain, &domain, ratio, l)?;
        domains.push(domain);
    }

    let mut nodes: Vec<OperatorNode> = Vec::new();
    let mut levels = Vec::new();

    for (l, ((grid, domain), coef)) in grids.iter().zip(domains).zip(coefs).enumerate() {
        if coef.a.layout() != grid || coef.b.layout() != grid || coef.c.layout() != grid {
            return Err(Error::IncompatibleLayout(format!("coefficients of level {} are not on its layout", l)))
        }
        let mut op = VcOperator::new(domain, grid.clone(), bc.clone())
            .with_relax_mode(config.relax_mode, config.jacobi_weight);

        if l > 0 {
            op = op.with_ref_to_coarser(ref_ratios[l - 1])
        }
        op.set_coefs(coef.a, coef.b, alpha, beta, coef.c);

        let top = OpId(nodes.len());
        let amr_coarser = levels.last().copied();
        levels.push(top);
        nodes.push(OperatorNode { op, level: l, depth: 0, amr_coarser, mg_coarser: None });

        let mut depth = 0;
        let mut current = top;

        while can_coarsen(nodes[current.0].op.layout(), config.min_box_size) {
            let coarser = nodes[current.0].op.coarsened(2);
            let id = OpId(nodes.len());
            depth += 1;
            nodes.push(OperatorNode { op: coarser, level: l, depth, amr_coarser: None, mg_coarser: None });
            nodes[current.0].mg_coarser = Some(id);
            current = id;
        }
        debug!("level {}: {} boxes, {} multigrid depths", l, grid.len(), depth + 1);
    }

    Ok(OperatorHierarchy { nodes, levels, ref_ratios: ref_ratios[..grids.len() - 1].to_vec() })
}

fn check_nesting(
    coarse: &BoxLayout,
    fine: &BoxLayout,
    coarse_domain: &ProblemDomain,
    fine_domain: &ProblemDomain,
    ratio: i64,
    level: usize) -> Result<(), Error>
{
    if ratio < 2 {
        return Err(Error::IncompatibleLayout(format!("refinement ratio {} into level {}", ratio, level)))
    }
    if !fine.is_coarsenable_by(ratio) {
        return Err(Error::IncompatibleLayout(format!("level {} is not coarsenable by {}", level, ratio)))
    }
    for b in fine.boxes() {
        if !fine_domain.space.contains_space(b) {
            return Err(Error::IncompatibleLayout(format!("box {:?} of level {} is outside the domain", b, level)))
        }
        let margin = b.coarsen_by(ratio).extend_all(1).intersect(&coarse_domain.space);

        if !margin.map_or(false, |m| coarse.covers(&m)) {
            return Err(Error::IncompatibleLayout(format!("box {:?} of level {} is not properly nested", b, level)))
        }
    }
    Ok(())
}

fn can_coarsen(layout: &BoxLayout, min_box_size: i64) -> bool {
    layout.is_coarsenable_by(2) && layout.boxes().iter().all(|b| {
        let (l, m) = b.dim();
        l as i64 / 2 >= min_box_size && m as i64 / 2 >= min_box_size
    })
}




// ============================================================================
impl OperatorHierarchy {

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn num_operators(&self) -> usize {
        self.nodes.len()
    }

    /**
     * Return the depth-zero operator of an AMR level.
     */
    pub fn level_op(&self, level: usize) -> OpId {
        self.levels[level]
    }

    pub fn node(&self, id: OpId) -> &OperatorNode {
        &self.nodes[id.0]
    }

    pub fn op(&self, id: OpId) -> &VcOperator {
        &self.nodes[id.0].op
    }

    pub fn op_mut(&mut self, id: OpId) -> &mut VcOperator {
        &mut self.nodes[id.0].op
    }

    pub fn ref_ratios(&self) -> &[i64] {
        &self.ref_ratios
    }

    /**
     * Return the refinement ratio from the AMR level with the given domain
     * to the next finer level, or `None` if the level is the finest (or no
     * level has that domain).
     */
    pub fn ref_to_finer(&self, domain: &ProblemDomain) -> Option<i64> {
        self.levels
            .iter()
            .position(|&id| self.op(id).domain() == domain)
            .and_then(|l| self.ref_ratios.get(l).copied())
    }

    /**
     * Set the time on every AMR level operator, re-evaluating any
     * time-dependent face coefficients, and carry the new coefficients down
     * to the coarser multigrid depths.
     */
    pub fn set_time(&mut self, time: f64) {
        for l in 0..self.levels.len() {
            let id = self.levels[l];
            self.op_mut(id).set_time(time);
            self.refresh_depths(l);
        }
    }

    /**
     * Replace the coefficients of one AMR level, and of the multigrid depths
     * below it.
     */
    pub fn set_level_coefs(&mut self, level: usize, coefs: LevelCoefficients, alpha: f64, beta: f64) {
        let id = self.levels[level];
        self.op_mut(id).set_coefs(coefs.a, coefs.b, alpha, beta, coefs.c);
        self.refresh_depths(level);
    }

    pub fn set_alpha_and_beta(&mut self, alpha: f64, beta: f64) {
        for l in 0..self.levels.len() {
            let id = self.levels[l];
            self.op_mut(id).set_alpha_and_beta(alpha, beta);
            self.refresh_depths(l);
        }
    }

    /**
     * Re-average the coefficients of every multigrid depth of a level from
     * its depth-zero operator. Needed after the level operator is modified
     * through `op_mut`.
     */
    pub fn refresh_depths(&mut self, level: usize) {
        let mut current = self.levels[level];

        // a coarser depth is always pushed after its finer one
        while let Some(next) = self.nodes[current.0].mg_coarser {
            let (finer, coarser) = self.nodes.split_at_mut(next.0);
            coarser[0].op.finer_operator_changed(&finer[current.0].op);
            current = next;
        }
    }
}




// ============================================================================
impl AmrMultigrid {

    pub fn new(hierarchy: OperatorHierarchy, config: SolverConfig) -> Self {
        let registers = (1..hierarchy.num_levels())
            .map(|l| {
                let coarse = hierarchy.op(hierarchy.level_op(l - 1));
                let fine = hierarchy.op(hierarchy.level_op(l));
                FluxRegister::new(coarse.layout(), fine.layout(), &coarse.domain().space, hierarchy.ref_ratios[l - 1])
            })
            .collect();
        Self { hierarchy, config, registers }
    }

    pub fn hierarchy(&self) -> &OperatorHierarchy {
        &self.hierarchy
    }

    pub fn hierarchy_mut(&mut self) -> &mut OperatorHierarchy {
        &mut self.hierarchy
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /**
     * Return zero-valued data on each level, with one ghost zone.
     */
    pub fn zeros(&self) -> Vec<LevelData> {
        (0..self.hierarchy.num_levels())
            .map(|l| LevelData::new(self.hierarchy.op(self.hierarchy.level_op(l)).layout(), 1, 1))
            .collect()
    }


    /**
     * Compute the composite residual `rhs - L[phi]` on every level, with
     * inhomogeneous boundary conditions. On coarse zones next to a finer
     * level the fluxes through coarse-fine faces are those of the finer
     * level; coarse zones covered by a finer level hold the average of the
     * finer residual. Returns the max norm over all levels.
     */
    pub fn composite_residual(&mut self, res: &mut [LevelData], phi: &mut [LevelData], rhs: &[LevelData]) -> f64 {
        let num_levels = self.hierarchy.num_levels();

        for l in (0..num_levels).rev() {
            let op = self.hierarchy.op(self.hierarchy.level_op(l));
            let (lower, upper) = phi.split_at_mut(l);
            op.residual(&mut res[l], &mut upper[0], &rhs[l], lower.last(), false);

            if l + 1 < num_levels {
                let finer = self.hierarchy.op(self.hierarchy.level_op(l + 1));
                let (coarse_res, fine_res) = res.split_at_mut(l + 1);
                op.reflux(&mut coarse_res[l], &upper[0], &upper[1], finer, &mut self.registers[l]);
                average_down(&mut coarse_res[l], &fine_res[0], self.hierarchy.ref_ratios[l]);
            }
        }
        res.iter().map(LevelData::norm_max).fold(0.0, f64::max)
    }


    /**
     * Solve `L[phi] = rhs` on all levels, starting from the given `phi`.
     * Each element of `phi` needs at least one ghost zone.
     */
    pub fn solve(&mut self, phi: &mut [LevelData], rhs: &[LevelData]) -> SolveSummary {
        assert_eq!(phi.len(), self.hierarchy.num_levels(), "one solution level per operator level required");
        assert_eq!(rhs.len(), self.hierarchy.num_levels(), "one right-hand side per operator level required");

        let mut res = self.zeros();
        let initial = self.composite_residual(&mut res, phi, rhs);
        let mut norm = initial;
        let mut iterations = 0;

        info!("amr multigrid: initial residual {:.6e}", initial);

        while iterations < self.config.max_iter && !self.is_converged(norm, initial) {
            let mut correction = self.zeros();
            self.vcycle(&mut correction, &mut res);

            for (p, e) in phi.iter_mut().zip(&correction) {
                p.incr(e, 1.0)
            }
            self.average_down_all(phi);

            let last = norm;
            norm = self.composite_residual(&mut res, phi, rhs);
            iterations += 1;

            info!("amr multigrid: iteration {} residual {:.6e} (rate {:.3})", iterations, norm, norm / last);

            // the max norm may grow over the first cycles, while the coarse-fine interface settles
            if iterations >= self.config.min_iter && norm > (1.0 - self.config.hang) * last && !self.is_converged(norm, initial) {
                info!("amr multigrid: solver hung at residual {:.6e}", norm);
                break;
            }
        }

        SolveSummary {
            iterations,
            initial_residual: initial,
            final_residual: norm,
            converged: self.is_converged(norm, initial),
        }
    }

    fn is_converged(&self, norm: f64, initial: f64) -> bool {
        norm <= self.config.tolerance * initial || norm <= self.config.norm_thresh
    }

    fn average_down_all(&self, phi: &mut [LevelData]) {
        for l in (1..phi.len()).rev() {
            let (coarse, fine) = phi.split_at_mut(l);
            average_down(&mut coarse[l - 1], &fine[0], self.hierarchy.ref_ratios[l - 1])
        }
    }


    /**
     * One composite V-cycle for the correction equation `L[e] = r`, where
     * `r` is the composite residual. `r` is used as scratch space.
     */
    fn vcycle(&mut self, e: &mut [LevelData], r: &mut [LevelData]) {
        let finest = self.hierarchy.num_levels() - 1;

        for l in (1..=finest).rev() {
            let id = self.hierarchy.level_op(l);
            let coarse_id = self.hierarchy.level_op(l - 1);
            let ratio = self.hierarchy.ref_ratios[l - 1];

            self.hierarchy.op_mut(id).relax(&mut e[l], &r[l], self.config.num_smooth_down);

            let op = self.hierarchy.op(id);
            let mut fine_res = r[l].zeros_like();
            op.residual(&mut fine_res, &mut e[l], &r[l], None, true);

            let (coarse_r, _) = r.split_at_mut(l);
            average_down(&mut coarse_r[l - 1], &fine_res, ratio);

            // the coarse correction is still zero, so only the fine flux of e contributes
            let (coarse_e, fine_e) = e.split_at(l);
            self.hierarchy.op(coarse_id).reflux(&mut coarse_r[l - 1], &coarse_e[l - 1], &fine_e[0], op, &mut self.registers[l - 1]);
        }

        let bottom = self.hierarchy.level_op(0);
        for _ in 0..self.config.bottom_cycles.max(1) {
            self.mg_vcycle(bottom, &mut e[0], &r[0]);
        }

        for l in 1..=finest {
            let id = self.hierarchy.level_op(l);
            let ratio = self.hierarchy.ref_ratios[l - 1];
            let (coarse_e, fine_e) = e.split_at_mut(l);
            let e_fine = &mut fine_e[0];

            let op = self.hierarchy.op(id);
            op.prolong_increment(e_fine, &coarse_e[l - 1], ratio);

            let mut res = r[l].zeros_like();
            op.residual(&mut res, e_fine, &r[l], Some(&coarse_e[l - 1]), true);

            let mut delta = e_fine.zeros_like();

            if self.config.num_mg > 0 {
                for _ in 0..self.config.num_mg {
                    self.mg_vcycle(id, &mut delta, &res);
                }
            } else {
                self.hierarchy.op_mut(id).relax(&mut delta, &res, self.config.num_smooth_up);
            }
            e_fine.incr(&delta, 1.0);
        }
    }


    /**
     * One multigrid V-cycle over the depths below an operator, for the
     * homogeneous problem `L[e] = r` on that operator's layout.
     */
    pub fn mg_vcycle(&mut self, id: OpId, e: &mut LevelData, r: &LevelData) {
        let coarser = self.hierarchy.node(id).mg_coarser;

        match coarser {
            None => {
                self.hierarchy.op_mut(id).relax(e, r, self.config.num_smooth_bottom)
            }
            Some(coarse_id) => {
                self.hierarchy.op_mut(id).relax(e, r, self.config.num_smooth_down);

                let mut coarse_r = LevelData::new(self.hierarchy.op(coarse_id).layout(), 1, 1);
                self.hierarchy.op(id).restrict_residual(&mut coarse_r, e, r, 2);

                let mut coarse_e = coarse_r.zeros_like();
                self.mg_vcycle(coarse_id, &mut coarse_e, &coarse_r);

                self.hierarchy.op(id).prolong_increment(e, &coarse_e, 2);
                self.hierarchy.op_mut(id).relax(e, r, self.config.num_smooth_up);
            }
        }
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use std::sync::Arc;
    use crate::coefficient::LinearTimeInterpolator;
    use crate::index_space::{range2d, Axis};

    fn unit_coefs(layout: &BoxLayout) -> LevelCoefficients {
        LevelCoefficients {
            a: LevelData::from_function(layout, 0, |_| 1.0),
            b: FaceData::new(layout, 1.0),
            c: LevelData::new(layout, 1, 0),
        }
    }

    fn single_level(n: i64) -> OperatorHierarchy {
        let domain = ProblemDomain::new(range2d(0..n, 0..n), 1.0 / n as f64);
        let grid = BoxLayout::decompose(&domain.space, 8);
        let coefs = vec![unit_coefs(&grid)];
        build_hierarchy(domain, &[grid], &[], &DomainBc::default(), 0.0, 1.0, coefs, &SolverConfig::default()).unwrap()
    }

    #[test]
    fn depths_are_linked_down_to_the_minimum_box_size() {
        let hierarchy = single_level(32);
        let mut id = hierarchy.level_op(0);
        let mut depth = 0;

        while let Some(next) = hierarchy.node(id).mg_coarser {
            assert_eq!(hierarchy.op(next).dx(), 2.0 * hierarchy.op(id).dx());
            id = next;
            depth += 1;
        }
        // boxes of 8 coarsen to 4 and then 2
        assert_eq!(depth, 2);
        assert_eq!(hierarchy.num_operators(), 3);
    }

    #[test]
    fn inconsistent_layouts_are_rejected() {
        let domain = ProblemDomain::new(range2d(0..16, 0..16), 1.0 / 16.0);
        let build = |grids: Vec<BoxLayout>| {
            let coefs = grids.iter().map(unit_coefs).collect();
            build_hierarchy(domain.clone(), &grids, &[2, 2], &DomainBc::default(), 0.0, 1.0, coefs, &SolverConfig::default())
        };
        let level0 = BoxLayout::decompose(&domain.space, 8);

        // level 0 must cover the domain
        assert!(build(vec![BoxLayout::new(vec![range2d(0..8, 0..16)]).unwrap()]).is_err());

        // fine boxes must be coarsenable by the ratio
        assert!(build(vec![level0.clone(), BoxLayout::new(vec![range2d(9..17, 8..16)]).unwrap()]).is_err());

        // level 2 is not surrounded by a zone of level 1
        let level1 = BoxLayout::new(vec![range2d(8..16, 8..16)]).unwrap();
        let level2 = BoxLayout::new(vec![range2d(16..24, 16..24)]).unwrap();
        assert!(build(vec![level0.clone(), level1.clone(), level2]).is_err());

        let level2 = BoxLayout::new(vec![range2d(20..28, 20..28)]).unwrap();
        assert!(build(vec![level0, level1, level2]).is_ok());
    }

    #[test]
    fn ref_to_finer_reports_the_ratio_between_levels() {
        let domain = ProblemDomain::new(range2d(0..16, 0..16), 1.0 / 16.0);
        let coarse = BoxLayout::decompose(&domain.space, 8);
        let fine = BoxLayout::new(vec![range2d(8..24, 8..24)]).unwrap();
        let coefs = vec![unit_coefs(&coarse), unit_coefs(&fine)];
        let hierarchy = build_hierarchy(domain.clone(), &[coarse, fine], &[2], &DomainBc::default(), 1.0, 1.0, coefs, &SolverConfig::default()).unwrap();

        assert_eq!(hierarchy.ref_to_finer(&domain), Some(2));
        assert_eq!(hierarchy.ref_to_finer(&domain.refine_by(2)), None);
        assert_eq!(hierarchy.node(hierarchy.level_op(1)).amr_coarser, Some(hierarchy.level_op(0)));
    }

    #[test]
    fn single_level_poisson_solve_converges() {
        let hierarchy = single_level(32);
        let layout = hierarchy.op(hierarchy.level_op(0)).layout().clone();
        let config = SolverConfig { tolerance: 1e-9, max_iter: 30, ..SolverConfig::default() };
        let mut mg = AmrMultigrid::new(hierarchy, config);

        let mut phi = vec![LevelData::new(&layout, 1, 1)];
        let rhs = vec![LevelData::from_function(&layout, 0, |(i, j)| if (i - 16).abs() < 4 && (j - 16).abs() < 4 { 1.0 } else { 0.0 })];
        let summary = mg.solve(&mut phi, &rhs);

        assert!(summary.converged, "{:?}", summary);
        assert!(summary.iterations < 30);
        assert!(summary.final_residual <= 1e-9 * summary.initial_residual);
    }

    fn point_source(layout: &BoxLayout) -> Vec<LevelData> {
        vec![LevelData::from_function(layout, 0, |(i, j)| if (i - 16).abs() < 4 && (j - 16).abs() < 4 { 1.0 } else { 0.0 })]
    }

    #[test]
    fn set_time_reaches_every_multigrid_depth() {
        let mut hierarchy = single_level(32);
        let top = hierarchy.level_op(0);
        let layout = hierarchy.op(top).layout().clone();
        let interp = LinearTimeInterpolator::new(0.0, FaceData::new(&layout, 1.0), 1.0, FaceData::new(&layout, 100.0));
        hierarchy.op_mut(top).set_b_coef_interpolator(Arc::new(interp));

        hierarchy.set_time(1.0);

        let mut id = top;
        while let Some(next) = hierarchy.node(id).mg_coarser {
            assert_eq!(hierarchy.op(next).b_coef().value_at(Axis::I, (2, 2)), Some(100.0));
            assert_eq!(hierarchy.op(next).time(), 1.0);
            id = next;
        }

        let config = SolverConfig { tolerance: 1e-9, max_iter: 30, ..SolverConfig::default() };
        let mut mg = AmrMultigrid::new(hierarchy, config);
        let mut phi = vec![LevelData::new(&layout, 1, 1)];
        let summary = mg.solve(&mut phi, &point_source(&layout));

        assert!(summary.converged, "{:?}", summary);
        assert!(summary.iterations < 30);
    }

    #[test]
    fn new_level_coefficients_reach_every_multigrid_depth() {
        let mut hierarchy = single_level(32);
        let top = hierarchy.level_op(0);
        let layout = hierarchy.op(top).layout().clone();
        let coefs = LevelCoefficients {
            a: LevelData::from_function(&layout, 0, |_| 1.0),
            b: FaceData::new(&layout, 0.5),
            c: LevelData::from_function(&layout, 0, |_| -50.0),
        };

        hierarchy.set_level_coefs(0, coefs, 1.0, 2.0);

        let bottom = hierarchy.node(hierarchy.node(top).mg_coarser.unwrap()).mg_coarser.unwrap();
        let op = hierarchy.op(bottom);
        assert_eq!(op.darcy_coef().value_at((1, 1)), Some(-50.0));
        assert_eq!(op.b_coef().value_at(Axis::J, (1, 1)), Some(0.5));
        assert_eq!((op.alpha(), op.beta()), (1.0, 2.0));

        let config = SolverConfig { tolerance: 1e-9, max_iter: 30, ..SolverConfig::default() };
        let mut mg = AmrMultigrid::new(hierarchy, config);
        let mut phi = vec![LevelData::new(&layout, 1, 1)];
        assert!(mg.solve(&mut phi, &point_source(&layout)).converged);
    }

    #[test]
    fn hang_test_waits_for_the_minimum_iterations() {
        let hierarchy = single_level(32);
        let layout = hierarchy.op(hierarchy.level_op(0)).layout().clone();

        // every cycle counts as hung, so the solve stops as soon as the test applies
        let config = SolverConfig { hang: 1.0, min_iter: 3, max_iter: 10, ..SolverConfig::default() };
        let mut mg = AmrMultigrid::new(hierarchy, config);
        let mut phi = vec![LevelData::new(&layout, 1, 1)];
        let summary = mg.solve(&mut phi, &point_source(&layout));

        assert_eq!(summary.iterations, 3);
        assert!(!summary.converged);
    }
}
