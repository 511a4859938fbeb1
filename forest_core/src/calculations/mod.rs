//! # Stand Metric Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Input` / plain value types for inputs (JSON-serializable)
//! - `*Metrics` / `*Aggregates` / `*Output` for results (JSON-serializable)
//! - pure functions from the former to the latter
//!
//! ## Available Calculations
//!
//! - [`tree`] - Per-tree basal area, volumes and biomass
//! - [`aggregate`] - Plot means and per-hectare totals
//! - [`metrics`] - Full request/response bundle (per-tree, aggregates,
//!   site, plot geometry, carbon)
//!
//! ## Rounding
//!
//! Reported figures are rounded with [`round_to`], which rounds half to
//! even after scaling by the requested power of ten. Tests compare against
//! the same helper applied to full-precision formula values, so the rule
//! only matters at exact `.xx5` boundaries.
//!
//! ## Finiteness
//!
//! Finite inputs can still overflow (a 1e200 cm diameter) or leave the
//! real domain (a negative height raised to a fractional power). Every
//! reported figure is checked before it leaves the crate, and non-finite
//! results are rejected as [`MetricsError::InvalidInput`].

pub mod aggregate;
pub(crate) mod counts;
pub mod metrics;
pub mod tree;

// Re-export commonly used types
pub use aggregate::{aggregate_plot_metrics, DensitySource, PlotAggregates, StandParameters};
pub use metrics::{
    calculate, calculate_with, plot_geometry, CarbonFigures, MetricsInput, MetricsOutput, PlotGeometry, SiteFigures,
};
pub use tree::{compute_per_tree, PerTreeMetrics, TreeObservation};

use crate::errors::{MetricsError, MetricsResult};

/// Round `value` to `decimals` places, ties to even.
///
/// ```rust
/// use forest_core::calculations::round_to;
///
/// assert_eq!(round_to(0.070685834, 4), 0.0707);
/// assert_eq!(round_to(2.5, 0), 2.0);
/// ```
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Reject a computed figure that is NaN or infinite.
pub(crate) fn ensure_finite(field: &str, value: f64) -> MetricsResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MetricsError::invalid_input(
            field,
            value.to_string(),
            "Computed value is not finite; check the measurements",
        ))
    }
}
