use serde::{Deserialize, Serialize};




/**
 * Ordering of the Gauss-Seidel (or Jacobi) updates within one relaxation
 * sweep
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelaxMode {
    /// Red-black ordering; each colour is updated in parallel across patches.
    GsrbFast,
    /// Lexicographic ordering, one patch after another.
    Lexicographic,
    /// Four colours, by the parity of each index.
    Multicolor,
    /// Weighted Jacobi, using `SolverConfig::jacobi_weight`.
    Jacobi,
}




/**
 * Root-finding strategy for nonlinear boundary conditions
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BcStrategy {
    Picard,
    Secant,
}




/**
 * Parameters of the multigrid solve. One instance is owned by each
 * `AmrMultigrid` and lives as long as that solver.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Maximum number of composite V-cycles.
    pub max_iter: usize,
    /// Required reduction of the composite residual, relative to the initial one.
    pub tolerance: f64,
    /// Minimum relative reduction per iteration before the solve is declared hung.
    pub hang: f64,
    /// Iterations completed before the hang test applies.
    pub min_iter: usize,
    /// Absolute residual norm below which the solve stops.
    pub norm_thresh: f64,
    pub num_smooth_down: usize,
    pub num_smooth_up: usize,
    pub num_smooth_bottom: usize,
    /// Number of level-local V-cycles used as the smoother on the upsweep.
    pub num_mg: usize,
    pub bottom_cycles: usize,
    pub relax_mode: RelaxMode,
    pub jacobi_weight: f64,
    /// Coarsening of a level stops once any box would be smaller than this.
    pub min_box_size: i64,
}




/**
 * Parameters of the ghost-enthalpy root finder.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NonlinearBcConfig {
    pub max_iter: usize,
    pub max_residual: f64,
    pub relax_coeff: f64,
    /// Initial enthalpy perturbation of the secant step.
    pub perturbation: f64,
    pub strategy: BcStrategy,
}




// ============================================================================
impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iter: 20,
            tolerance: 1e-10,
            hang: 1e-10,
            min_iter: 5,
            norm_thresh: 1e-30,
            num_smooth_down: 2,
            num_smooth_up: 2,
            num_smooth_bottom: 16,
            num_mg: 0,
            bottom_cycles: 4,
            relax_mode: RelaxMode::GsrbFast,
            jacobi_weight: 2.0 / 3.0,
            min_box_size: 2,
        }
    }
}

impl Default for NonlinearBcConfig {
    fn default() -> Self {
        Self {
            max_iter: 3,
            max_residual: 1e-5,
            relax_coeff: 0.5,
            perturbation: 0.01,
            strategy: BcStrategy::Picard,
        }
    }
}
