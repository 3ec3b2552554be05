use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::error::Error;
use crate::layout::LevelData;




/**
 * Physical parameters of the binary alloy phase diagram, in dimensionless
 * form. The liquidus is linear, `theta = theta_e + Theta_e - Theta_l`, and
 * the solid takes up solute in proportion to the partition coefficient.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseParams {
    pub stefan: f64,
    pub heat_capacity_ratio: f64,
    pub composition_ratio: f64,
    pub partition_coefficient: f64,
    pub eutectic_temperature: f64,
    pub eutectic_concentration: f64,
}




/**
 * The three transition enthalpies at a fixed bulk concentration:
 * fully solid below `solidus`, on the eutectic plateau up to `eutectic`,
 * mushy up to `liquidus`, and fully liquid above it. Always
 * `solidus <= eutectic <= liquidus`.
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingEnergies {
    pub solidus: f64,
    pub eutectic: f64,
    pub liquidus: f64,
}




#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Regime {
    Solid,
    Eutectic,
    Mushy,
    Liquid,
}




/**
 * Derived thermodynamic quantities at one state point
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThermoState {
    pub regime: Regime,
    pub porosity: f64,
    pub temperature: f64,
    pub liquid_concentration: f64,
    pub solid_concentration: f64,
}




/**
 * Derived fields over a whole level, valid and ghost zones alike
 */
#[derive(Clone, Debug)]
pub struct EnthalpyVariables {
    pub temperature: LevelData,
    pub porosity: LevelData,
    pub liquid_concentration: LevelData,
    pub solid_concentration: LevelData,
}




// ============================================================================
impl Regime {

    /**
     * Whether solid and liquid coexist. The eutectic plateau is a mushy
     * state at fixed temperature.
     */
    pub fn is_mushy(self) -> bool {
        matches!(self, Regime::Eutectic | Regime::Mushy)
    }
}




// ============================================================================
impl PhaseParams {

    /**
     * Check that the parameters lie in their physical range. This is the
     * only failure mode of the closure; once validated, every finite
     * `(H, Theta)` maps to a finite state.
     */
    pub fn validate(&self) -> Result<(), Error> {
        let check = |ok: bool, name: &'static str, value: f64| {
            if ok && value.is_finite() {
                Ok(())
            } else {
                Err(Error::NonPhysicalParameter { name, value })
            }
        };
        check(self.stefan >= 0.0, "stefan", self.stefan)?;
        check(self.heat_capacity_ratio > 0.0, "heat_capacity_ratio", self.heat_capacity_ratio)?;
        check((0.0..1.0).contains(&self.partition_coefficient), "partition_coefficient", self.partition_coefficient)?;
        check(self.composition_ratio + self.eutectic_concentration > 0.0, "composition_ratio", self.composition_ratio)?;
        check(self.eutectic_temperature.is_finite(), "eutectic_temperature", self.eutectic_temperature)?;

        // latent heat is linear in temperature, so checking both ends of the liquidus covers it
        let hottest = self.liquidus_temperature(-self.composition_ratio);
        check(self.latent_heat(self.eutectic_temperature) > 0.0, "latent_heat", self.latent_heat(self.eutectic_temperature))?;
        check(self.latent_heat(hottest) > 0.0, "latent_heat", self.latent_heat(hottest))?;
        Ok(())
    }

    /**
     * Enthalpy difference between liquid and solid at the same temperature.
     * It must be positive over the whole liquidus for the enthalpy to
     * increase with porosity in the mush.
     */
    fn latent_heat(&self, temperature: f64) -> f64 {
        self.stefan + temperature * (1.0 - self.heat_capacity_ratio)
    }

    fn eutectic_latent_heat(&self) -> f64 {
        self.latent_heat(self.eutectic_temperature)
    }

    fn liquidus_temperature(&self, liquid_concentration: f64) -> f64 {
        self.eutectic_temperature + self.eutectic_concentration - liquid_concentration
    }

    /**
     * For an alloy which freezes completely above the eutectic (bulk
     * concentration below the solid concentration at the eutectic), the
     * liquid concentration at which the last liquid freezes. `None` if the
     * alloy reaches the eutectic.
     */
    fn solidus_liquid_concentration(&self, bulk_concentration: f64) -> Option<f64> {
        let pc = self.partition_coefficient;
        let solid_conc_e = self.solid_concentration_of(self.eutectic_concentration);

        if pc > 0.0 && bulk_concentration < solid_conc_e {
            Some((bulk_concentration + (1.0 - pc) * self.composition_ratio) / pc)
        } else {
            None
        }
    }

    fn solid_concentration_of(&self, liquid_concentration: f64) -> f64 {
        let pc = self.partition_coefficient;
        pc * liquid_concentration + (pc - 1.0) * self.composition_ratio
    }

    pub fn compute_temperature(&self, enthalpy: f64, bulk_concentration: f64) -> f64 {
        self.solve(enthalpy, bulk_concentration).temperature
    }

    pub fn compute_porosity(&self, enthalpy: f64, bulk_concentration: f64) -> f64 {
        self.solve(enthalpy, bulk_concentration).porosity
    }

    /**
     * Bounding energies followed by classification: the full closure at a
     * single state point.
     */
    pub fn solve(&self, enthalpy: f64, bulk_concentration: f64) -> ThermoState {
        let bounds = bounding_energies(bulk_concentration, self);
        classify_and_solve(enthalpy, bulk_concentration, &bounds, self)
    }
}




// ============================================================================
impl Default for PhaseParams {
    fn default() -> Self {
        Self {
            stefan: 5.0,
            heat_capacity_ratio: 1.0,
            composition_ratio: 2.0,
            partition_coefficient: 1e-5,
            eutectic_temperature: -1.0,
            eutectic_concentration: 1.0,
        }
    }
}




/**
 * Compute the regime transition enthalpies for a bulk concentration.
 *
 * * `bulk_concentration` - The bulk concentration `Theta`
 * * `params`             - Validated phase parameters
 */
pub fn bounding_energies(bulk_concentration: f64, params: &PhaseParams) -> BoundingEnergies {
    let theta_e = params.eutectic_temperature;
    let conc_e = params.eutectic_concentration;
    let solid_conc_e = params.solid_concentration_of(conc_e);

    let porosity_e = ((bulk_concentration - solid_conc_e) / (conc_e - solid_conc_e)).clamp(0.0, 1.0);

    let solidus = match params.solidus_liquid_concentration(bulk_concentration) {
        Some(cl) => params.heat_capacity_ratio * params.liquidus_temperature(cl),
        None => params.heat_capacity_ratio * theta_e,
    };
    let eutectic = solidus + porosity_e * params.eutectic_latent_heat();
    let liquidus = (params.stefan + theta_e + conc_e - bulk_concentration).max(eutectic);

    BoundingEnergies { solidus, eutectic, liquidus }
}




/**
 * Solve for the thermodynamic state given the enthalpy, bulk concentration
 * and the bounding energies for that concentration. Every branch is closed
 * form. An enthalpy exactly on a regime boundary is resolved to the
 * two-phase side.
 */
pub fn classify_and_solve(
    enthalpy: f64,
    bulk_concentration: f64,
    bounds: &BoundingEnergies,
    params: &PhaseParams,
) -> ThermoState {
    let cp = params.heat_capacity_ratio;
    let theta_e = params.eutectic_temperature;
    let conc_e = params.eutectic_concentration;

    if enthalpy < bounds.solidus {
        ThermoState {
            regime: Regime::Solid,
            porosity: 0.0,
            temperature: enthalpy / cp,
            liquid_concentration: params.solidus_liquid_concentration(bulk_concentration).unwrap_or(conc_e),
            solid_concentration: bulk_concentration,
        }
    } else if enthalpy <= bounds.eutectic && bounds.eutectic > bounds.solidus {
        let porosity = ((enthalpy - bounds.solidus) / params.eutectic_latent_heat()).clamp(0.0, 1.0);
        let solid_concentration = if porosity < 1.0 {
            (bulk_concentration - porosity * conc_e) / (1.0 - porosity)
        } else {
            params.solid_concentration_of(conc_e)
        };
        ThermoState {
            regime: Regime::Eutectic,
            porosity,
            temperature: theta_e,
            liquid_concentration: conc_e,
            solid_concentration,
        }
    } else if enthalpy <= bounds.liquidus {
        mushy_state(enthalpy, bulk_concentration, bounds, params)
    } else {
        ThermoState {
            regime: Regime::Liquid,
            porosity: 1.0,
            temperature: enthalpy - params.stefan,
            liquid_concentration: bulk_concentration,
            solid_concentration: params.solid_concentration_of(bulk_concentration),
        }
    }
}




/**
 * The lever rule with a linear liquidus. Eliminating the temperature and
 * the liquid concentration leaves a quadratic in the porosity.
 */
fn mushy_state(enthalpy: f64, bulk_concentration: f64, bounds: &BoundingEnergies, params: &PhaseParams) -> ThermoState {
    let pc = params.partition_coefficient;
    let cp = params.heat_capacity_ratio;
    let st = params.stefan;
    let q = 1.0 - pc;
    let r = 1.0 - cp;
    let k = params.eutectic_temperature + params.eutectic_concentration + params.composition_ratio;
    let b = bulk_concentration + params.composition_ratio;

    let a2 = q * (st + r * k);
    let a1 = st * pc + cp * k * q + r * (k * pc - b) - enthalpy * q;
    let a0 = cp * (k * pc - b) - enthalpy * pc;

    let porosity = match porosity_root(a2, a1, a0) {
        Some(chi) => chi,
        None => {
            let width = (bounds.liquidus - bounds.eutectic).max(f64::MIN_POSITIVE);
            ((enthalpy - bounds.eutectic) / width).clamp(0.0, 1.0)
        }
    };

    let u = b / (pc + porosity * q).max(1e-12);
    let liquid_concentration = u - params.composition_ratio;

    ThermoState {
        regime: Regime::Mushy,
        porosity,
        temperature: k - u,
        liquid_concentration,
        solid_concentration: params.solid_concentration_of(liquid_concentration),
    }
}




/**
 * Return the root of `a2 x^2 + a1 x + a0` nearest to `[0, 1]`, clamped into
 * the interval. With a positive latent heat exactly one root lies inside.
 */
fn porosity_root(a2: f64, a1: f64, a0: f64) -> Option<f64> {
    // distance from the admissible porosity interval
    let distance = |x: f64| (-x).max(x - 1.0).max(0.0);

    let roots = if a2.abs() < 1e-12 {
        [-a0 / a1, f64::NAN]
    } else {
        let disc = (a1 * a1 - 4.0 * a2 * a0).max(0.0).sqrt();
        [(-a1 + disc) / (2.0 * a2), (-a1 - disc) / (2.0 * a2)]
    };

    roots
        .iter()
        .copied()
        .filter(|x| x.is_finite())
        .fold(None, |best: Option<f64>, x| match best {
            Some(y) if distance(y) <= distance(x) => Some(y),
            _ => Some(x),
        })
        .map(|x| x.clamp(0.0, 1.0))
}




/**
 * Evaluate the closure in every zone of a level, including ghost zones.
 * Zones are independent, so patches are processed in parallel.
 */
pub fn update_enthalpy_variables(enthalpy: &LevelData, bulk_concentration: &LevelData, params: &PhaseParams) -> EnthalpyVariables {
    assert!(enthalpy.layout() == bulk_concentration.layout(), "enthalpy and concentration are on different layouts");

    let mut vars = EnthalpyVariables {
        temperature: enthalpy.zeros_like(),
        porosity: enthalpy.zeros_like(),
        liquid_concentration: enthalpy.zeros_like(),
        solid_concentration: enthalpy.zeros_like(),
    };

    vars.temperature.patches_mut()
        .par_iter_mut()
        .zip(vars.porosity.patches_mut().par_iter_mut())
        .zip(vars.liquid_concentration.patches_mut().par_iter_mut())
        .zip(vars.solid_concentration.patches_mut().par_iter_mut())
        .zip(enthalpy.patches().par_iter().zip(bulk_concentration.patches().par_iter()))
        .for_each(|((((t, chi), cl), cs), (h, c))| {
            let outputs = t.data_mut().iter_mut()
                .zip(chi.data_mut().iter_mut())
                .zip(cl.data_mut().iter_mut())
                .zip(cs.data_mut().iter_mut());

            for ((((t, chi), cl), cs), (&h, &c)) in outputs.zip(h.data().iter().zip(c.data())) {
                let state = params.solve(h, c);
                *t = state.temperature;
                *chi = state.porosity;
                *cl = state.liquid_concentration;
                *cs = state.solid_concentration;
            }
        });

    vars
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::index_space::range2d;
    use crate::layout::BoxLayout;

    fn params() -> PhaseParams {
        PhaseParams {
            stefan: 5.0,
            heat_capacity_ratio: 1.0,
            composition_ratio: 2.0,
            partition_coefficient: 0.0,
            eutectic_temperature: -2.0,
            eutectic_concentration: 2.0,
        }
    }

    fn solid_solution_params(stefan: f64, heat_capacity_ratio: f64) -> PhaseParams {
        PhaseParams {
            stefan,
            heat_capacity_ratio,
            composition_ratio: 1.0,
            partition_coefficient: 0.5,
            eutectic_temperature: -0.5,
            eutectic_concentration: 0.5,
        }
    }

    fn sea_ice_params() -> PhaseParams {
        PhaseParams {
            stefan: 4.0,
            heat_capacity_ratio: 0.5,
            composition_ratio: 3.0,
            partition_coefficient: 0.1,
            eutectic_temperature: -1.5,
            eutectic_concentration: 1.5,
        }
    }

    #[test]
    fn bounding_energies_have_expected_values() {
        let b = bounding_energies(1.0, &params());
        assert!((b.solidus + 2.0).abs() < 1e-12);
        assert!((b.eutectic - 1.75).abs() < 1e-12);
        assert!((b.liquidus - 4.0).abs() < 1e-12);
    }

    #[test]
    fn bounding_energies_are_ordered() {
        for p in [params(), sea_ice_params()] {
            for n in 0..200 {
                let c = -1.0 + 0.025 * n as f64;
                let b = bounding_energies(c, &p);
                assert!(b.solidus <= b.eutectic);
                assert!(b.eutectic <= b.liquidus);
            }
        }
    }

    #[test]
    fn regimes_are_classified_by_enthalpy() {
        let p = params();
        let b = bounding_energies(1.0, &p);
        assert_eq!(classify_and_solve(-3.0, 1.0, &b, &p).regime, Regime::Solid);
        assert_eq!(classify_and_solve(0.0, 1.0, &b, &p).regime, Regime::Eutectic);
        assert_eq!(classify_and_solve(3.0, 1.0, &b, &p).regime, Regime::Mushy);
        assert_eq!(classify_and_solve(5.0, 1.0, &b, &p).regime, Regime::Liquid);
        assert_eq!(classify_and_solve(b.liquidus, 1.0, &b, &p).regime, Regime::Mushy);
        assert_eq!(classify_and_solve(b.solidus, 1.0, &b, &p).regime, Regime::Eutectic);
    }

    #[test]
    fn mushy_state_satisfies_liquidus_and_lever_rule() {
        let p = sea_ice_params();
        let c = 0.5;
        let b = bounding_energies(c, &p);
        let h = 0.5 * (b.eutectic + b.liquidus);
        let s = classify_and_solve(h, c, &b, &p);
        let cp = p.heat_capacity_ratio;

        assert_eq!(s.regime, Regime::Mushy);
        assert!((s.temperature - (p.eutectic_temperature + p.eutectic_concentration - s.liquid_concentration)).abs() < 1e-10);
        assert!((s.porosity * s.liquid_concentration + (1.0 - s.porosity) * s.solid_concentration - c).abs() < 1e-10);
        assert!((s.porosity * p.stefan + (s.porosity + (1.0 - s.porosity) * cp) * s.temperature - h).abs() < 1e-10);
    }

    #[test]
    fn closure_is_continuous_across_regime_boundaries() {
        let eps = 1e-9;

        let all_params = [
            params(),
            sea_ice_params(),
            solid_solution_params(1.0, 1.0),
            solid_solution_params(5.0, 1.0),
            solid_solution_params(2.0, 2.0),
        ];

        for p in all_params {
            assert!(p.validate().is_ok());

            // from just above the lowest admissible concentration up to the eutectic
            let lowest = -p.composition_ratio;
            for n in 1..40 {
                let c = lowest + (p.eutectic_concentration - lowest) * n as f64 / 40.0;
                let b = bounding_energies(c, &p);

                for h in [b.solidus, b.eutectic, b.liquidus] {
                    let lo = classify_and_solve(h - eps, c, &b, &p);
                    let hi = classify_and_solve(h + eps, c, &b, &p);
                    assert!((lo.porosity - hi.porosity).abs() < 1e-6, "{:?} c={} h={}: {:?} {:?}", p, c, h, lo, hi);
                    assert!((lo.temperature - hi.temperature).abs() < 1e-6, "{:?} c={} h={}: {:?} {:?}", p, c, h, lo, hi);
                }
            }
        }
    }

    #[test]
    fn alloy_below_the_solid_eutectic_concentration_never_reaches_the_eutectic() {
        let p = solid_solution_params(1.0, 1.0);
        let c = -0.5;
        let b = bounding_energies(c, &p);

        // the last liquid freezes at Theta_l = (Theta + (1 - pc) C) / pc = 0, on the liquidus at theta = 0
        assert!((b.solidus - 0.0).abs() < 1e-12);
        assert_eq!(b.eutectic, b.solidus);

        let solid = classify_and_solve(b.solidus - 1e-3, c, &b, &p);
        let mushy = classify_and_solve(b.solidus, c, &b, &p);
        assert_eq!(solid.regime, Regime::Solid);
        assert_eq!(mushy.regime, Regime::Mushy);
        assert!(mushy.porosity.abs() < 1e-12);
        assert!((mushy.temperature - solid.temperature).abs() < 2e-3);
        assert!((solid.solid_concentration - c).abs() < 1e-12);

        for n in 0..100 {
            let h = b.solidus - 1.0 + 0.05 * n as f64;
            assert_ne!(p.solve(h, c).regime, Regime::Eutectic);
        }
    }

    #[test]
    fn porosity_is_bounded_and_temperature_increases_with_enthalpy() {
        let p = sea_ice_params();

        for c in [-0.5, 0.0, 0.7, 1.4, 2.0] {
            let mut last = f64::NEG_INFINITY;

            for n in 0..400 {
                let h = -5.0 + 0.025 * n as f64;
                let s = p.solve(h, c);
                assert!((0.0..=1.0).contains(&s.porosity));
                assert!(s.temperature.is_finite() && s.liquid_concentration.is_finite() && s.solid_concentration.is_finite());
                assert!(s.temperature >= last - 1e-12);
                last = s.temperature;
            }
        }
    }

    #[test]
    fn re_evaluation_is_bit_identical() {
        let p = sea_ice_params();
        for h in [-4.0, 0.3, 10.0] {
            assert_eq!(p.solve(h, 0.7), p.solve(h, 0.7));
        }
    }

    #[test]
    fn non_physical_parameters_are_rejected() {
        assert!(params().validate().is_ok());
        assert!(PhaseParams { stefan: -1.0, ..params() }.validate().is_err());
        assert!(PhaseParams { partition_coefficient: 1.0, ..params() }.validate().is_err());
        assert!(PhaseParams { heat_capacity_ratio: 0.0, ..params() }.validate().is_err());

        // no latent heat, or latent heat changing sign along the liquidus
        assert!(PhaseParams { stefan: 0.0, ..params() }.validate().is_err());
        assert!(solid_solution_params(0.0, 2.0).validate().is_err());
        assert!(solid_solution_params(0.5, 2.0).validate().is_err());
    }

    #[test]
    fn level_update_matches_pointwise_closure() {
        let p = params();
        let layout = BoxLayout::new(vec![range2d(0..4, 0..4), range2d(4..8, 0..4)]).unwrap();
        let h = LevelData::from_function(&layout, 1, |(i, j)| -3.0 + i as f64 + 0.1 * j as f64);
        let c = LevelData::from_function(&layout, 1, |_| 1.0);
        let vars = update_enthalpy_variables(&h, &c, &p);

        for index in [(0, 0), (3, 2), (6, 1), (8, 4)] {
            let s = p.solve(h.ghost_value_at(index).unwrap(), 1.0);
            assert_eq!(vars.temperature.ghost_value_at(index), Some(s.temperature));
            assert_eq!(vars.porosity.ghost_value_at(index), Some(s.porosity));
        }
    }
}
