//! # Unit Types
//!
//! Lightweight newtype wrappers for the metric units used in forest
//! mensuration. They keep the cm → m and kg → t conversions in one place
//! while serializing as plain numbers.
//!
//! ## Units
//!
//! - Length: centimeters (stem diameter), meters (height, spacing)
//! - Area: square meters (plot, basal area, planting cell)
//! - Mass: kilograms (per-tree biomass), tonnes (per-hectare biomass)
//!
//! ## Example
//!
//! ```rust
//! use forest_core::units::{Centimeters, Kilograms, Meters, Tonnes};
//!
//! let dap = Centimeters(30.0);
//! let dap_m: Meters = dap.into();
//! assert_eq!(dap_m.0, 0.3);
//!
//! let biomass: Tonnes = Kilograms(1500.0).into();
//! assert_eq!(biomass.0, 1.5);
//! ```

use serde::{Deserialize, Serialize};

/// Square meters in one hectare
pub const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// Kilograms in one metric tonne
pub const KILOGRAMS_PER_TONNE: f64 = 1_000.0;

// ============================================================================
// Length Units
// ============================================================================

/// Length in centimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Centimeters(pub f64);

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

impl From<Centimeters> for Meters {
    fn from(cm: Centimeters) -> Self {
        Meters(cm.0 / 100.0)
    }
}

// ============================================================================
// Area Units
// ============================================================================

/// Area in square meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareMeters(pub f64);

impl SquareMeters {
    /// Area of a rectangular planting cell (spacing in row × spacing between rows)
    pub fn from_spacing(in_row: Meters, between_rows: Meters) -> Self {
        SquareMeters(in_row.0 * between_rows.0)
    }
}

// ============================================================================
// Mass Units
// ============================================================================

/// Mass in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilograms(pub f64);

/// Mass in metric tonnes
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tonnes(pub f64);

impl From<Kilograms> for Tonnes {
    fn from(kg: Kilograms) -> Self {
        Tonnes(kg.0 / KILOGRAMS_PER_TONNE)
    }
}
