use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::error::Error;
use crate::layout::LevelData;




/**
 * Dependence of the permeability on the porosity `chi`
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermeabilityLaw {
    /// `1`, independent of porosity
    Constant,
    /// `chi^3`
    Cubic,
    /// `chi^3 / (1 - chi)^2`
    KozenyCarman,
    /// `-chi^2 ln(1 - chi)`
    Log,
}




#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PermeabilityParams {
    pub law: PermeabilityLaw,
    /// Darcy number: the reference permeability.
    pub darcy: f64,
    /// Permeability of an empty Hele-Shaw cell, if the flow is confined to one.
    pub hele_shaw: Option<f64>,
    /// Porosity below which zones are treated as having this porosity.
    pub porosity_floor: f64,
    /// Upper bound on the law's value, for laws which diverge as `chi -> 1`.
    pub max_permeability: f64,
}




// ============================================================================
impl PermeabilityParams {

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.darcy > 0.0) {
            return Err(Error::NonPhysicalParameter { name: "darcy", value: self.darcy })
        }
        if let Some(k) = self.hele_shaw {
            if !(k > 0.0) {
                return Err(Error::NonPhysicalParameter { name: "hele_shaw", value: k })
            }
        }
        if !(self.porosity_floor > 0.0 && self.porosity_floor < 1.0) {
            return Err(Error::NonPhysicalParameter { name: "porosity_floor", value: self.porosity_floor })
        }
        if !(self.max_permeability > 0.0) {
            return Err(Error::NonPhysicalParameter { name: "max_permeability", value: self.max_permeability })
        }
        Ok(())
    }


    /**
     * The dimensionless permeability at a porosity, including the Darcy
     * number and the Hele-Shaw limit. Always positive.
     */
    pub fn permeability(&self, porosity: f64) -> f64 {
        let chi = porosity.clamp(self.porosity_floor, 1.0);

        let law = match self.law {
            PermeabilityLaw::Constant => 1.0,
            PermeabilityLaw::Cubic => chi.powi(3),
            PermeabilityLaw::KozenyCarman => chi.powi(3) / (1.0 - chi).powi(2),
            PermeabilityLaw::Log => -chi * chi * (1.0 - chi).ln(),
        };
        let k = self.darcy * law.min(self.max_permeability);

        match self.hele_shaw {
            Some(k_hs) => 1.0 / (1.0 / k_hs + 1.0 / k),
            None => k,
        }
    }


    /**
     * The Darcy drag coefficient `c = -chi / K`, which is never positive.
     * Zones below the porosity floor get the (large, finite) drag of the
     * floor.
     */
    pub fn darcy_coefficient(&self, porosity: f64) -> f64 {
        let chi = porosity.clamp(self.porosity_floor, 1.0);
        -chi / self.permeability(chi)
    }
}




// ============================================================================
impl Default for PermeabilityParams {
    fn default() -> Self {
        Self {
            law: PermeabilityLaw::KozenyCarman,
            darcy: 1e-3,
            hele_shaw: None,
            porosity_floor: 1e-3,
            max_permeability: 1e4,
        }
    }
}




/**
 * Build the cell-centered Darcy coefficient field from a porosity field,
 * including ghost zones.
 */
pub fn darcy_coefficient(porosity: &LevelData, params: &PermeabilityParams) -> LevelData {
    let mut c = porosity.clone();
    c.patches_mut().par_iter_mut().for_each(|p| p.map_in_place(|chi| params.darcy_coefficient(chi)));
    c
}
