use clap::Parser;
use log::{info, warn, LevelFilter};
use serde::Serialize;
use simple_logger::SimpleLogger;
use mushy_amr::boundary::DomainBc;
use mushy_amr::coefficient::{cell_to_face, Averaging};
use mushy_amr::config::{BcStrategy, NonlinearBcConfig, SolverConfig};
use mushy_amr::index_space::{range2d, Axis, Side};
use mushy_amr::layout::{BoxLayout, LevelData, ProblemDomain};
use mushy_amr::multigrid::{build_hierarchy, AmrMultigrid, LevelCoefficients};
use mushy_amr::nonlinear_bc::{fill_enthalpy_ghosts, BcDiagnostics, NonlinearBcSolver, RobinTemperatureBc};
use mushy_amr::permeability::{darcy_coefficient, PermeabilityParams};
use mushy_amr::phase_diagram::{update_enthalpy_variables, EnthalpyVariables, PhaseParams};




/**
 * A cooled-from-above mushy layer on a two-level grid: the top boundary
 * loses heat through a Robin condition, the phase diagram gives the
 * temperature and porosity, and one implicit Darcy-Brinkman step is taken
 * for a buoyancy-driven velocity component.
 */
#[derive(Debug, Parser)]
#[clap(version = "0.1")]
struct Opts {
    /// Number of zones per side on the coarse level (a multiple of 8)
    #[clap(short = 'n', long, default_value = "32")]
    resolution: i64,

    #[clap(short = 'd', long, default_value = "1e-2")]
    dt: f64,

    /// Heat transfer coefficient at the top boundary
    #[clap(long, default_value = "1.0")]
    heat_transfer: f64,

    #[clap(long, default_value = "-2.0")]
    reference_temperature: f64,

    #[clap(long, default_value = "100.0")]
    rayleigh: f64,

    /// Use the secant method for the boundary enthalpy, instead of Picard iteration
    #[clap(long)]
    secant: bool,

    #[clap(short = 'l', long, default_value = "info")]
    log_level: LevelFilter,

    #[clap(short = 'o', long, default_value = "mushy.cbor")]
    output: String,
}




#[derive(Serialize)]
struct Output {
    params: PhaseParams,
    domains: Vec<ProblemDomain>,
    enthalpy: Vec<LevelData>,
    temperature: Vec<LevelData>,
    porosity: Vec<LevelData>,
    velocity: Vec<LevelData>,
    iterations: usize,
    residual: f64,
}




fn initial_enthalpy(domain: &ProblemDomain, layout: &BoxLayout) -> LevelData {
    LevelData::from_function(layout, 1, |index| {
        let (_, y) = domain.cell_center(index);
        4.0 + 2.0 * (1.0 - y)
    })
}

fn level_variables(
    domain: &ProblemDomain,
    layout: &BoxLayout,
    params: &PhaseParams,
    opts: &Opts,
    diagnostics: &BcDiagnostics) -> (LevelData, EnthalpyVariables)
{
    let mut enthalpy = initial_enthalpy(domain, layout);
    let concentration = LevelData::from_function(layout, 1, |_| -1.0);
    let vars = update_enthalpy_variables(&enthalpy, &concentration, params);

    let bc = RobinTemperatureBc {
        params: params.clone(),
        dx: domain.dx,
        a: 1.0,
        b: -opts.heat_transfer,
        flux: 0.0,
        reference_temperature: opts.reference_temperature,
    };
    let config = NonlinearBcConfig {
        strategy: if opts.secant { BcStrategy::Secant } else { BcStrategy::Picard },
        ..NonlinearBcConfig::default()
    };
    let solver = NonlinearBcSolver::new(bc, config);

    fill_enthalpy_ghosts(&mut enthalpy, &concentration, &vars.temperature, &domain.space, Axis::J, Side::Hi, &solver, diagnostics);

    let vars = update_enthalpy_variables(&enthalpy, &concentration, params);
    (enthalpy, vars)
}




fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::parse();
    SimpleLogger::new().with_level(opts.log_level).init()?;
    info!("{:?}", opts);

    let params = PhaseParams::default();
    let permeability = PermeabilityParams::default();
    params.validate()?;
    permeability.validate()?;

    let n = opts.resolution;
    let coarse_domain = ProblemDomain::new(range2d(0..n, 0..n), 1.0 / n as f64);
    let fine_domain = coarse_domain.refine_by(2);
    let domains = vec![coarse_domain.clone(), fine_domain];

    // the fine level covers the upper middle of the domain, where the mush forms
    let grids = vec![
        BoxLayout::decompose(&coarse_domain.space, 8),
        BoxLayout::new(vec![range2d(n / 2..3 * n / 2, n..2 * n)])?,
    ];

    let diagnostics = BcDiagnostics::new();
    let (enthalpy, vars): (Vec<_>, Vec<_>) = domains
        .iter()
        .zip(&grids)
        .map(|(domain, layout)| level_variables(domain, layout, &params, &opts, &diagnostics))
        .unzip();

    info!("boundary solves: {} ({} unconverged, {} clamped residuals)",
        diagnostics.solves(),
        diagnostics.unconverged_solves(),
        diagnostics.clamped_residuals());

    let coefs = vars
        .iter()
        .map(|v| LevelCoefficients {
            a: LevelData::from_function(v.porosity.layout(), 1, |_| 1.0),
            b: cell_to_face(&v.porosity, Averaging::Arithmetic),
            c: darcy_coefficient(&v.porosity, &permeability),
        })
        .collect();

    let config = SolverConfig::default();
    let hierarchy = build_hierarchy(coarse_domain, &grids, &[2], &DomainBc::default(), 1.0, opts.dt, coefs, &config)?;
    let mut mg = AmrMultigrid::new(hierarchy, config);

    let rhs: Vec<_> = vars
        .iter()
        .map(|v| {
            let mut source = v.temperature.zeros_like();
            source.incr(&v.temperature, opts.dt * opts.rayleigh);
            source
        })
        .collect();

    let mut velocity = mg.zeros();
    let summary = mg.solve(&mut velocity, &rhs);

    if !summary.converged {
        warn!("velocity solve stopped after {} iterations at residual {:.3e}", summary.iterations, summary.final_residual);
    }

    let (temperature, porosity) = vars.into_iter().map(|v| (v.temperature, v.porosity)).unzip();
    let output = Output {
        params,
        domains,
        enthalpy,
        temperature,
        porosity,
        velocity,
        iterations: summary.iterations,
        residual: summary.final_residual,
    };

    let file = std::fs::File::create(&opts.output)?;
    let mut buffer = std::io::BufWriter::new(file);
    ciborium::ser::into_writer(&output, &mut buffer).map_err(|e| format!("{:?}", e))?;
    info!("wrote {}", opts.output);

    Ok(())
}
