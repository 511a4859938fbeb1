//! # Plot Geometry
//!
//! Sizing of circular sample plots.

use std::f64::consts::PI;

use crate::units::{Meters, SquareMeters};

/// Default number of trees a sample plot should contain
pub const DEFAULT_MIN_TREES_FOR_PLOT: u32 = 20;

/// Smallest plot area (m²) that holds `min_trees` trees at the given spacing.
///
/// ```rust
/// use forest_core::equations::recommended_plot_area_m2;
///
/// assert_eq!(recommended_plot_area_m2(5.0, 5.0, 20), 500.0);
/// ```
pub fn recommended_plot_area_m2(distance_in_row_m: f64, distance_between_rows_m: f64, min_trees: u32) -> f64 {
    let cell = SquareMeters::from_spacing(Meters(distance_in_row_m), Meters(distance_between_rows_m));
    f64::from(min_trees) * cell.0
}

/// Radius (m) of a circular plot with the given area: r = √(A/π).
///
/// Negative areas are outside the domain and yield NaN.
pub fn plot_radius_from_area_m(area_m2: f64) -> f64 {
    (area_m2 / PI).sqrt()
}
