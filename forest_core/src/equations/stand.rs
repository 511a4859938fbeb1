//! # Stand Density
//!
//! Stocking density (trees per hectare) from planting spacing or from a
//! counted plot. Both degrade to `0.0` on non-positive divisors; an
//! unknown spacing or plot area is a legitimate data-entry state.

use crate::units::{Meters, SquareMeters, SQUARE_METERS_PER_HECTARE};

/// Trees per hectare implied by a rectangular planting grid.
///
/// Returns `0.0` if either distance is ≤ 0.
///
/// ```rust
/// use forest_core::equations::trees_per_hectare;
///
/// assert_eq!(trees_per_hectare(5.0, 5.0), 400.0);
/// assert_eq!(trees_per_hectare(0.0, 5.0), 0.0);
/// ```
pub fn trees_per_hectare(distance_in_row_m: f64, distance_between_rows_m: f64) -> f64 {
    if distance_in_row_m <= 0.0 || distance_between_rows_m <= 0.0 {
        return 0.0;
    }
    let cell = SquareMeters::from_spacing(Meters(distance_in_row_m), Meters(distance_between_rows_m));
    SQUARE_METERS_PER_HECTARE / cell.0
}

/// Trees per hectare from a tree count on a measured plot.
///
/// Returns `0.0` if the plot area is ≤ 0.
pub fn trees_per_hectare_from_plot(tree_count: usize, plot_area_m2: f64) -> f64 {
    if plot_area_m2 <= 0.0 {
        return 0.0;
    }
    (tree_count as f64 * SQUARE_METERS_PER_HECTARE) / plot_area_m2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_spacing() {
        assert_eq!(trees_per_hectare(5.0, 5.0), 400.0);
        assert!((trees_per_hectare(3.0, 4.0) - 833.333333).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_spacing_is_zero() {
        assert_eq!(trees_per_hectare(0.0, 5.0), 0.0);
        assert_eq!(trees_per_hectare(5.0, -2.0), 0.0);
    }

    #[test]
    fn test_plot_density() {
        assert_eq!(trees_per_hectare_from_plot(20, 500.0), 400.0);
        assert_eq!(trees_per_hectare_from_plot(20, 0.0), 0.0);
        assert_eq!(trees_per_hectare_from_plot(0, 500.0), 0.0);
    }
}
