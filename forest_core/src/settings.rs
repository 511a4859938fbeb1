//! # Engine Defaults
//!
//! Fallback values for the stand parameters a caller may leave out. A
//! record store carries one set of defaults; the CLI layers its own over
//! them from configuration.

use serde::{Deserialize, Serialize};

use crate::equations::{
    CARBON_FRACTION, DEFAULT_ANIMAL_EMISSION_KG_DAY, DEFAULT_MIN_TREES_FOR_PLOT, DEFAULT_ROOT_RATIO,
};

/// Defaults applied to stand parameters that were not provided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineDefaults {
    /// Root-to-aboveground biomass ratio
    pub root_ratio: f64,

    /// Emission of one grazing animal (kg/day)
    pub animal_emission_kg_day: f64,

    /// Target tree count for the recommended plot
    pub min_trees_for_plot: u32,

    /// Carbon fraction of dry biomass
    pub carbon_fraction: f64,
}

impl Default for EngineDefaults {
    fn default() -> Self {
        EngineDefaults {
            root_ratio: DEFAULT_ROOT_RATIO,
            animal_emission_kg_day: DEFAULT_ANIMAL_EMISSION_KG_DAY,
            min_trees_for_plot: DEFAULT_MIN_TREES_FOR_PLOT,
            carbon_fraction: CARBON_FRACTION,
        }
    }
}
