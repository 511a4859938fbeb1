//! # Carbon and Grazing Equilibrium
//!
//! Carbon stored in stand biomass, the mean daily capture rate over the
//! stand's life, and the number of grazing animals per hectare whose
//! emissions that capture offsets.

/// Carbon fraction of dry biomass
pub const CARBON_FRACTION: f64 = 0.49;

/// Default emission of one grazing animal (kg/day)
pub const DEFAULT_ANIMAL_EMISSION_KG_DAY: f64 = 5.0;

/// Days per year used to convert stand age
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Stored carbon (t/ha) in the given total biomass (t/ha).
pub fn carbon_forest_tn_per_ha(biomass_total_tn_per_ha: f64, fraction: f64) -> f64 {
    biomass_total_tn_per_ha * fraction
}

/// Stand age in whole days (half-to-even rounding).
pub fn days_from_age(age_years: f64) -> i64 {
    (age_years * DAYS_PER_YEAR).round_ties_even() as i64
}

/// Mean carbon capture (kg/day/ha) over the stand's age.
///
/// Returns `0.0` when the age in days is ≤ 0.
pub fn capture_kg_per_day_per_ha(carbon_tn_per_ha: f64, age_years: f64) -> f64 {
    let days = age_years * DAYS_PER_YEAR;
    if days <= 0.0 {
        return 0.0;
    }
    (carbon_tn_per_ha / days) * 1000.0
}

/// Animals per hectare whose daily emission equals the capture rate.
///
/// Returns `0.0` when the emission rate is ≤ 0.
pub fn animals_per_ha_equilibrium(capture_kg_per_day_per_ha: f64, animal_emission_kg_day: f64) -> f64 {
    if animal_emission_kg_day <= 0.0 {
        return 0.0;
    }
    capture_kg_per_day_per_ha / animal_emission_kg_day
}
