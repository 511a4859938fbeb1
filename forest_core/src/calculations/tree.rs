//! # Per-Tree Metrics
//!
//! Applies the allometric equations to one tree observation.
//!
//! ## Example
//!
//! ```rust
//! use forest_core::calculations::tree::{compute_per_tree, TreeObservation};
//! use forest_core::equations::DEFAULT_ROOT_RATIO;
//!
//! let tree = TreeObservation::new(30.0, 20.0);
//! let metrics = compute_per_tree(&tree, DEFAULT_ROOT_RATIO);
//!
//! assert!((metrics.basal_area_m2 - 0.0707).abs() < 1e-4);
//! assert_eq!(metrics.biomass_total_kg, metrics.biomass_above_kg + metrics.biomass_root_kg);
//! ```

use serde::{Deserialize, Serialize};

use super::{ensure_finite, round_to};
use crate::equations::{
    basal_area_m2, biomass_above_kg, biomass_root_kg, volume_merchantable_with_bark_m3,
    volume_merchantable_without_bark_m3, volume_total_with_bark_m3, volume_total_without_bark_m3,
};
use crate::errors::{MetricsError, MetricsResult};

/// One measured tree. Identified only by its position in the input list.
///
/// ## JSON Example
///
/// ```json
/// { "dap_cm": 30.0, "height_m": 20.0 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TreeObservation {
    /// Diameter at breast height (cm)
    #[serde(default)]
    pub dap_cm: f64,

    /// Total height (m)
    #[serde(default)]
    pub height_m: f64,
}

impl TreeObservation {
    pub fn new(dap_cm: f64, height_m: f64) -> Self {
        TreeObservation { dap_cm, height_m }
    }

    /// Validate the measurement. `index` names the tree in error messages.
    pub fn validate(&self, index: usize) -> MetricsResult<()> {
        for (name, value) in [("dap_cm", self.dap_cm), ("height_m", self.height_m)] {
            if !value.is_finite() || value < 0.0 {
                return Err(MetricsError::invalid_input(
                    format!("trees[{}].{}", index, name),
                    value.to_string(),
                    "Tree measurements must be finite and non-negative",
                ));
            }
        }
        Ok(())
    }
}

/// Metrics derived from a single tree.
///
/// Serialized with the field names of the measurement records
/// (`ab_m2`, `vol_total_cc_m3`, ...), where `cc` is with bark and `sc`
/// without.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerTreeMetrics {
    /// Echoed diameter at breast height (cm)
    pub dap_cm: f64,

    /// Echoed total height (m)
    pub height_m: f64,

    /// Basal area (m²)
    #[serde(rename = "ab_m2")]
    pub basal_area_m2: f64,

    /// Total stem volume with bark (m³)
    #[serde(rename = "vol_total_cc_m3")]
    pub volume_total_with_bark_m3: f64,

    /// Total stem volume without bark (m³)
    #[serde(rename = "vol_total_sc_m3")]
    pub volume_total_without_bark_m3: f64,

    /// Merchantable volume to a 15 cm top, with bark (m³)
    #[serde(rename = "vol_maderable15_cc_m3")]
    pub volume_merchantable_with_bark_m3: f64,

    /// Merchantable volume to a 15 cm top, without bark (m³)
    #[serde(rename = "vol_maderable15_sc_m3")]
    pub volume_merchantable_without_bark_m3: f64,

    /// Aboveground biomass (kg)
    pub biomass_above_kg: f64,

    /// Root biomass (kg)
    pub biomass_root_kg: f64,

    /// Aboveground + root biomass (kg)
    pub biomass_total_kg: f64,
}

impl PerTreeMetrics {
    /// Copy rounded for reporting: 4 decimals for areas and volumes,
    /// 3 decimals for biomass.
    pub fn rounded(&self) -> Self {
        PerTreeMetrics {
            dap_cm: self.dap_cm,
            height_m: self.height_m,
            basal_area_m2: round_to(self.basal_area_m2, 4),
            volume_total_with_bark_m3: round_to(self.volume_total_with_bark_m3, 4),
            volume_total_without_bark_m3: round_to(self.volume_total_without_bark_m3, 4),
            volume_merchantable_with_bark_m3: round_to(self.volume_merchantable_with_bark_m3, 4),
            volume_merchantable_without_bark_m3: round_to(self.volume_merchantable_without_bark_m3, 4),
            biomass_above_kg: round_to(self.biomass_above_kg, 3),
            biomass_root_kg: round_to(self.biomass_root_kg, 3),
            biomass_total_kg: round_to(self.biomass_total_kg, 3),
        }
    }

    /// Reject the tree when any figure overflowed or left the real domain.
    /// `index` names the tree in error messages.
    pub fn ensure_finite(&self, index: usize) -> MetricsResult<()> {
        let figures = [
            ("ab_m2", self.basal_area_m2),
            ("vol_total_cc_m3", self.volume_total_with_bark_m3),
            ("vol_total_sc_m3", self.volume_total_without_bark_m3),
            ("vol_maderable15_cc_m3", self.volume_merchantable_with_bark_m3),
            ("vol_maderable15_sc_m3", self.volume_merchantable_without_bark_m3),
            ("biomass_above_kg", self.biomass_above_kg),
            ("biomass_root_kg", self.biomass_root_kg),
            ("biomass_total_kg", self.biomass_total_kg),
        ];
        for (name, value) in figures {
            ensure_finite(&format!("per_tree[{}].{}", index, name), value)?;
        }
        Ok(())
    }
}

/// Compute full-precision metrics for one tree.
pub fn compute_per_tree(tree: &TreeObservation, root_ratio: f64) -> PerTreeMetrics {
    let dap = tree.dap_cm;
    let h = tree.height_m;
    let above = biomass_above_kg(dap, h);
    let root = biomass_root_kg(above, root_ratio);

    PerTreeMetrics {
        dap_cm: dap,
        height_m: h,
        basal_area_m2: basal_area_m2(dap),
        volume_total_with_bark_m3: volume_total_with_bark_m3(dap, h),
        volume_total_without_bark_m3: volume_total_without_bark_m3(dap, h),
        volume_merchantable_with_bark_m3: volume_merchantable_with_bark_m3(dap, h),
        volume_merchantable_without_bark_m3: volume_merchantable_without_bark_m3(dap, h),
        biomass_above_kg: above,
        biomass_root_kg: root,
        biomass_total_kg: above + root,
    }
}
