//! # Per-Tree Allometric Equations
//!
//! Basal area, stem volume and biomass of a single tree from its diameter
//! at breast height (DAP, cm) and total height (m).
//!
//! The volume and biomass expressions are empirical regressions fitted
//! outside this crate. Their coefficients are reproduced exactly and must
//! not be re-derived.
//!
//! Inputs are expected to be ≥ 0. A zero diameter or height is degenerate
//! (the regressions return their intercepts) but never panics.

use std::f64::consts::PI;

use crate::units::{Centimeters, Meters};

/// Intercept of the total with-bark volume regression (m³)
pub const VOLUME_TOTAL_WITH_BARK_INTERCEPT: f64 = 0.0006;
/// Slope of the total with-bark volume regression
pub const VOLUME_TOTAL_WITH_BARK_SLOPE: f64 = 0.3348;

/// Intercept of the total without-bark volume regression (m³)
pub const VOLUME_TOTAL_WITHOUT_BARK_INTERCEPT: f64 = -0.0021;
/// Slope of the total without-bark volume regression
pub const VOLUME_TOTAL_WITHOUT_BARK_SLOPE: f64 = 0.3127;

/// Intercept of the merchantable (15 cm top) with-bark volume regression (m³)
pub const VOLUME_MERCHANTABLE_WITH_BARK_INTERCEPT: f64 = -0.0136;
/// Slope of the merchantable (15 cm top) with-bark volume regression
pub const VOLUME_MERCHANTABLE_WITH_BARK_SLOPE: f64 = 0.3247;

/// Bark-free/with-bark ratio used when the total with-bark volume is not positive
pub const FALLBACK_BARK_RATIO: f64 = 0.93;

/// Intercept of the aboveground biomass regression (kg)
pub const BIOMASS_ABOVE_INTERCEPT: f64 = -0.0808;
/// Scale coefficient of the aboveground biomass regression
pub const BIOMASS_ABOVE_COEFFICIENT: f64 = 0.0206;
/// DAP exponent of the aboveground biomass regression
pub const BIOMASS_ABOVE_DAP_EXPONENT: f64 = 2.337;
/// Height exponent of the aboveground biomass regression
pub const BIOMASS_ABOVE_HEIGHT_EXPONENT: f64 = 0.614;

/// Default root-to-aboveground biomass ratio
pub const DEFAULT_ROOT_RATIO: f64 = 0.263;

/// Square of the diameter expressed in meters.
fn dap_m_squared(dap_cm: f64) -> f64 {
    let dap_m: Meters = Centimeters(dap_cm).into();
    dap_m.0.powi(2)
}

/// Basal area (m²): g = π·d²/4, with d in meters.
///
/// ```rust
/// use forest_core::equations::basal_area_m2;
///
/// let g = basal_area_m2(30.0);
/// assert!((g - 0.0706858347).abs() < 1e-9);
/// ```
pub fn basal_area_m2(dap_cm: f64) -> f64 {
    (PI * dap_m_squared(dap_cm)) / 4.0
}

/// Total stem volume with bark (m³).
pub fn volume_total_with_bark_m3(dap_cm: f64, height_m: f64) -> f64 {
    VOLUME_TOTAL_WITH_BARK_INTERCEPT + VOLUME_TOTAL_WITH_BARK_SLOPE * dap_m_squared(dap_cm) * height_m
}

/// Total stem volume without bark (m³).
pub fn volume_total_without_bark_m3(dap_cm: f64, height_m: f64) -> f64 {
    VOLUME_TOTAL_WITHOUT_BARK_INTERCEPT + VOLUME_TOTAL_WITHOUT_BARK_SLOPE * dap_m_squared(dap_cm) * height_m
}

/// Merchantable volume to a 15 cm top, with bark (m³).
pub fn volume_merchantable_with_bark_m3(dap_cm: f64, height_m: f64) -> f64 {
    VOLUME_MERCHANTABLE_WITH_BARK_INTERCEPT
        + VOLUME_MERCHANTABLE_WITH_BARK_SLOPE * dap_m_squared(dap_cm) * height_m
}

/// Merchantable volume to a 15 cm top, without bark (m³).
///
/// Known approximation: there is no fitted regression for this figure, so
/// the with-bark merchantable volume is scaled by the without/with-bark
/// ratio of the total volumes. When the with-bark total is not positive the
/// ratio falls back to [`FALLBACK_BARK_RATIO`].
pub fn volume_merchantable_without_bark_m3(dap_cm: f64, height_m: f64) -> f64 {
    let total_with_bark = volume_total_with_bark_m3(dap_cm, height_m);
    let total_without_bark = volume_total_without_bark_m3(dap_cm, height_m);
    let ratio = if total_with_bark > 0.0 {
        total_without_bark / total_with_bark
    } else {
        FALLBACK_BARK_RATIO
    };
    volume_merchantable_with_bark_m3(dap_cm, height_m) * ratio
}

/// Aboveground biomass (kg): -0.0808 + 0.0206·DAP^2.337·H^0.614
pub fn biomass_above_kg(dap_cm: f64, height_m: f64) -> f64 {
    BIOMASS_ABOVE_INTERCEPT
        + BIOMASS_ABOVE_COEFFICIENT
            * dap_cm.powf(BIOMASS_ABOVE_DAP_EXPONENT)
            * height_m.powf(BIOMASS_ABOVE_HEIGHT_EXPONENT)
}

/// Root biomass (kg) as a fixed fraction of the aboveground biomass.
pub fn biomass_root_kg(biomass_above_kg: f64, root_ratio: f64) -> f64 {
    biomass_above_kg * root_ratio
}
