use std::sync::atomic::{AtomicUsize, Ordering};
use log::{debug, warn};
use rayon::prelude::*;
use crate::config::{BcStrategy, NonlinearBcConfig};
use crate::index_space::{step, Axis, IndexSpace, Side};
use crate::layout::LevelData;
use crate::phase_diagram::PhaseParams;




/**
 * Residuals larger than this are taken to be numerical faults, and are
 * replaced by zero.
 */
pub const RESIDUAL_FAULT_THRESHOLD: f64 = 10.0;




/**
 * The result of one residual evaluation
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Residual {
    pub value: f64,
    pub clamped: bool,
}




/**
 * A temperature condition imposed through the enthalpy in a ghost zone.
 * Implementors evaluate how far a candidate ghost enthalpy is from
 * satisfying the condition.
 */
pub trait NonlinearTemperatureBc {
    fn compute_residual(
        &self,
        ghost_enthalpy: f64,
        ghost_bulk_concentration: f64,
        interior_temperature: f64) -> Residual;
}




/**
 * The Robin condition `a dT/dn - F - b (T - T_ref) = 0`, with `n` the
 * outward normal, discretized between the interior zone and its ghost
 * zone a distance `dx` away. The boundary temperature is the average of the
 * two.
 */
#[derive(Clone, Debug)]
pub struct RobinTemperatureBc {
    pub params: PhaseParams,
    pub dx: f64,
    pub a: f64,
    pub b: f64,
    pub flux: f64,
    pub reference_temperature: f64,
}




/**
 * Per-solve outcome. A solve which exhausts its iteration budget is not an
 * error; it is reported here with `converged = false`.
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolveReport {
    pub ghost_enthalpy: f64,
    pub residual: f64,
    pub iterations: usize,
    pub converged: bool,
    pub clamped_residuals: usize,
    pub flat_steps: usize,
    pub perturbation: f64,
}




/**
 * Counters aggregated over many boundary solves, safe to update from any
 * number of threads.
 */
#[derive(Debug, Default)]
pub struct BcDiagnostics {
    solves: AtomicUsize,
    unconverged_solves: AtomicUsize,
    clamped_residuals: AtomicUsize,
    flat_secant_steps: AtomicUsize,
}




/**
 * Finds the ghost enthalpy which satisfies a nonlinear temperature
 * condition, with the strategy chosen by the configuration.
 */
#[derive(Clone, Debug)]
pub struct NonlinearBcSolver<B> {
    bc: B,
    config: NonlinearBcConfig,
}




// ============================================================================
impl RobinTemperatureBc {

    /**
     * The ghost temperature obtained by solving the discrete Robin condition
     * for it, given the interior temperature.
     */
    pub fn predicted_ghost_temperature(&self, interior_temperature: f64) -> f64 {
        let a_dx = self.a / self.dx;
        (interior_temperature * a_dx + self.flux + self.b * interior_temperature / 2.0 - self.reference_temperature * self.b)
            / (a_dx - self.b / 2.0)
    }
}

impl NonlinearTemperatureBc for RobinTemperatureBc {
    fn compute_residual(
        &self,
        ghost_enthalpy: f64,
        ghost_bulk_concentration: f64,
        interior_temperature: f64) -> Residual
    {
        let ghost_temperature = self.params.compute_temperature(ghost_enthalpy, ghost_bulk_concentration);
        let value = self.predicted_ghost_temperature(interior_temperature) - ghost_temperature;

        if value.abs() > RESIDUAL_FAULT_THRESHOLD {
            warn!("robin boundary residual {:.3e} at ghost enthalpy {:.6} is too large; clamped to zero", value, ghost_enthalpy);
            Residual { value: 0.0, clamped: true }
        } else {
            Residual { value, clamped: false }
        }
    }
}




// ============================================================================
impl BcDiagnostics {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, report: &SolveReport) {
        self.solves.fetch_add(1, Ordering::Relaxed);
        self.clamped_residuals.fetch_add(report.clamped_residuals, Ordering::Relaxed);
        self.flat_secant_steps.fetch_add(report.flat_steps, Ordering::Relaxed);

        if !report.converged {
            self.unconverged_solves.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn solves(&self) -> usize {
        self.solves.load(Ordering::Relaxed)
    }

    pub fn unconverged_solves(&self) -> usize {
        self.unconverged_solves.load(Ordering::Relaxed)
    }

    pub fn clamped_residuals(&self) -> usize {
        self.clamped_residuals.load(Ordering::Relaxed)
    }

    pub fn flat_secant_steps(&self) -> usize {
        self.flat_secant_steps.load(Ordering::Relaxed)
    }
}




// ============================================================================
impl<B: NonlinearTemperatureBc> NonlinearBcSolver<B> {

    pub fn new(bc: B, config: NonlinearBcConfig) -> Self {
        Self { bc, config }
    }

    pub fn bc(&self) -> &B {
        &self.bc
    }

    pub fn config(&self) -> &NonlinearBcConfig {
        &self.config
    }


    /**
     * Solve for the ghost enthalpy, starting from the given estimate.
     *
     * * `ghost_enthalpy`           - The initial estimate
     * * `interior_temperature`     - Temperature of the interior zone
     * * `ghost_bulk_concentration` - Bulk concentration in the ghost zone
     */
    pub fn solve(&self, ghost_enthalpy: f64, interior_temperature: f64, ghost_bulk_concentration: f64) -> SolveReport {
        let report = match self.config.strategy {
            BcStrategy::Picard => self.solve_picard(ghost_enthalpy, interior_temperature, ghost_bulk_concentration),
            BcStrategy::Secant => self.solve_secant(ghost_enthalpy, interior_temperature, ghost_bulk_concentration),
        };

        if !report.converged {
            debug!("boundary solve stopped after {} iterations with residual {:.3e}", report.iterations, report.residual);
        }
        report
    }

    fn solve_picard(&self, mut h: f64, interior_temperature: f64, ghost_bulk_concentration: f64) -> SolveReport {
        let max_residual = self.config.max_residual;
        let mut clamped = 0;
        let mut residual = |h: f64| {
            let r = self.bc.compute_residual(h, ghost_bulk_concentration, interior_temperature);
            clamped += r.clamped as usize;
            r.value
        };

        let mut r = residual(h);
        let mut iterations = 1;
        h += self.config.relax_coeff * r;

        while r.abs() > max_residual && iterations <= self.config.max_iter {
            r = residual(h);
            h += self.config.relax_coeff * r;
            iterations += 1;
        }

        SolveReport {
            ghost_enthalpy: h,
            residual: r,
            iterations,
            converged: r.abs() <= max_residual,
            clamped_residuals: clamped,
            flat_steps: 0,
            perturbation: 0.0,
        }
    }

    fn solve_secant(&self, mut h: f64, interior_temperature: f64, ghost_bulk_concentration: f64) -> SolveReport {
        let max_residual = self.config.max_residual;
        let mut dh = self.config.perturbation;
        let mut clamped = 0;
        let mut flat_steps = 0;
        let mut iterations = 0;
        let mut r_old = max_residual * 10.0;

        let mut residual = |h: f64| {
            let r = self.bc.compute_residual(h, ghost_bulk_concentration, interior_temperature);
            clamped += r.clamped as usize;
            r.value
        };

        while r_old.abs() > max_residual && iterations < self.config.max_iter {
            r_old = residual(h);
            let r_new = residual(h + dh);

            // flat residual, typically on the eutectic plateau
            if (r_new - r_old).abs() < max_residual {
                h += r_old;
                dh *= 2.0;
                flat_steps += 1;
            } else {
                h -= r_old * dh / (r_new - r_old);
            }
            iterations += 1;
        }

        SolveReport {
            ghost_enthalpy: h,
            residual: r_old,
            iterations,
            converged: r_old.abs() <= max_residual,
            clamped_residuals: clamped,
            flat_steps,
            perturbation: dh,
        }
    }
}




/**
 * Solve for the ghost enthalpy of every zone adjacent to one face of the
 * domain. Each ghost zone is independent, and starts from the enthalpy
 * already in it, so ghosts filled on a previous step converge quickly.
 *
 * * `enthalpy`           - Enthalpy on the level; ghost zones are overwritten
 * * `bulk_concentration` - Bulk concentration, including ghost zones
 * * `temperature`        - Temperature in the valid zones
 * * `domain`             - The problem domain index space
 * * `axis`, `side`       - The domain face
 */
#[allow(clippy::too_many_arguments)]
pub fn fill_enthalpy_ghosts<B>(
    enthalpy: &mut LevelData,
    bulk_concentration: &LevelData,
    temperature: &LevelData,
    domain: &IndexSpace,
    axis: Axis,
    side: Side,
    solver: &NonlinearBcSolver<B>,
    diagnostics: &BcDiagnostics)
where
    B: NonlinearTemperatureBc + Sync
{
    let layout = enthalpy.layout().clone();
    assert!(&layout == bulk_concentration.layout() && &layout == temperature.layout(), "boundary fields are on different layouts");

    enthalpy.patches_mut()
        .par_iter_mut()
        .zip(layout.boxes().par_iter())
        .zip(bulk_concentration.patches().par_iter().zip(temperature.patches().par_iter()))
        .for_each(|((h, valid), (c, t))| {
            let layer = valid.adjacent(axis, side, 1);

            for ghost in layer.iter().filter(|&index| !domain.contains(index)) {
                let interior = step(ghost, axis, side.flip());
                let report = solver.solve(h.get(ghost), t.get(interior), c.get(ghost));
                diagnostics.record(&report);
                h.set(ghost, report.ghost_enthalpy)
            }
        });
}
