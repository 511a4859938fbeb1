//! # Plot Metrics Bundle
//!
//! The full calculation a client requests for one plot: per-tree metrics,
//! plot aggregates, site figures, recommended plot geometry and carbon
//! figures, computed in one pass from a [`MetricsInput`].
//!
//! ## Example
//!
//! ```rust
//! use forest_core::calculations::metrics::{calculate, MetricsInput};
//!
//! let input: MetricsInput = serde_json::from_str(r#"{
//!     "trees": [{"dap_cm": 30.0, "height_m": 20.0}],
//!     "distance_in_row_m": 5.0,
//!     "distance_between_rows_m": 5.0,
//!     "age_years": 10,
//!     "site_index_m": 22.0
//! }"#).unwrap();
//!
//! let output = calculate(&input).unwrap();
//! assert_eq!(output.aggregates.trees_per_ha, 400);
//! assert_eq!(output.site.dominant_height_from_site_index_m, Some(22.0));
//! assert_eq!(output.plot.recommended_area_m2_for_min_trees, 500.0);
//! ```

use serde::{Deserialize, Serialize};

use super::aggregate::{aggregate_plot_metrics, PlotAggregates, StandParameters};
use super::{ensure_finite, round_to};
use super::tree::{compute_per_tree, PerTreeMetrics, TreeObservation};
use crate::equations::{
    animals_per_ha_equilibrium, capture_kg_per_day_per_ha, carbon_forest_tn_per_ha, days_from_age,
    plot_radius_from_area_m, recommended_plot_area_m2, try_dominant_height_from_site_index,
    try_site_index_from_dominant_height,
};
use crate::errors::{MetricsError, MetricsResult};
use crate::settings::EngineDefaults;

/// Request for a full plot calculation.
///
/// Stand parameters are flattened into the same JSON object as the tree
/// list.
///
/// ## JSON Example
///
/// ```json
/// {
///   "trees": [{ "dap_cm": 30.0, "height_m": 20.0 }],
///   "distance_in_row_m": 5.0,
///   "distance_between_rows_m": 5.0,
///   "plot_area_m2": 0,
///   "age_years": 10,
///   "species_root_ratio": 0.263,
///   "min_trees_for_plot": 20,
///   "animal_emission_kg_day": 5.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsInput {
    /// Measured trees
    pub trees: Vec<TreeObservation>,

    /// Stand parameters
    #[serde(flatten)]
    pub stand: StandParameters,
}

impl MetricsInput {
    pub fn new(trees: Vec<TreeObservation>, stand: StandParameters) -> Self {
        MetricsInput { trees, stand }
    }

    /// Validate input parameters for a calculation.
    pub fn validate(&self) -> MetricsResult<()> {
        if self.trees.is_empty() {
            return Err(MetricsError::invalid_input(
                "trees",
                "[]",
                "Provide a list of trees with dap_cm and height_m",
            ));
        }
        self.validate_measurements()
    }

    /// Validate every tree and stand number. An empty tree list passes.
    pub fn validate_measurements(&self) -> MetricsResult<()> {
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(index)?;
        }
        self.stand.validate()
    }
}

/// Site-quality figures. Each is present only when its input was given
/// and the stand age is positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteFigures {
    /// Dominant height implied by the given site index (m)
    pub dominant_height_from_site_index_m: Option<f64>,

    /// Site index implied by the given dominant height (m)
    pub site_index_from_dominant_height_m: Option<f64>,

    /// Stand age used (years)
    pub age_years: f64,
}

/// Recommended and provided sample plot geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotGeometry {
    /// Minimum plot area holding `min_trees_for_plot` trees (m²)
    pub recommended_area_m2_for_min_trees: f64,

    /// Radius of the recommended circular plot (m)
    pub recommended_radius_m: f64,

    /// Measured plot area, when one was given (m²)
    pub provided_area_m2: Option<f64>,

    /// Radius of the measured plot (m)
    pub radius_from_provided_area_m: Option<f64>,

    /// Target tree count used
    pub min_trees_for_plot: u32,
}

/// Carbon stock, capture and grazing equilibrium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonFigures {
    /// Carbon stored in stand biomass (t/ha)
    #[serde(rename = "c_bosque_tn_per_ha")]
    pub carbon_tn_per_ha: f64,

    /// Mean daily capture over the stand's age (kg/day/ha)
    pub capture_kg_per_day_per_ha: f64,

    /// Emission of one grazing animal used (kg/day)
    pub animal_emission_kg_day: f64,

    /// Animals per hectare whose emissions the capture offsets
    pub animals_per_ha_equilibrium: f64,

    /// Stand age in days
    #[serde(default)]
    pub stand_age_days: i64,
}

/// Complete result of a plot calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsOutput {
    /// Rounded metrics for each tree, in input order
    pub per_tree: Vec<PerTreeMetrics>,

    /// Plot means and per-hectare totals
    pub aggregates: PlotAggregates,

    /// Site index / dominant height
    pub site: SiteFigures,

    /// Plot sizing
    pub plot: PlotGeometry,

    /// Carbon and grazing equilibrium
    pub carbon: CarbonFigures,
}

/// Run a full plot calculation with the built-in defaults.
pub fn calculate(input: &MetricsInput) -> MetricsResult<MetricsOutput> {
    calculate_with(input, &EngineDefaults::default())
}

/// Run a full plot calculation, filling unset stand parameters from `defaults`.
///
/// # Returns
///
/// * `Ok(MetricsOutput)` - Calculation results
/// * `Err(MetricsError::InvalidInput)` - Empty tree list, non-finite or
///   negative measurements, or a computed figure that is not finite
pub fn calculate_with(input: &MetricsInput, defaults: &EngineDefaults) -> MetricsResult<MetricsOutput> {
    input.validate()?;

    let stand = input.stand.clone().with_defaults(defaults);
    let root_ratio = stand.root_ratio();

    let per_tree = input
        .trees
        .iter()
        .enumerate()
        .map(|(index, tree)| -> MetricsResult<PerTreeMetrics> {
            let metrics = compute_per_tree(tree, root_ratio);
            metrics.ensure_finite(index)?;
            Ok(metrics.rounded())
        })
        .collect::<MetricsResult<Vec<_>>>()?;

    let aggregates = aggregate_plot_metrics(&input.trees, &stand);
    aggregates.ensure_finite()?;
    let site = site_figures(&stand)?;
    let plot = plot_geometry(&stand)?;
    let carbon = carbon_figures(&aggregates, &stand)?;

    tracing::debug!(
        trees = input.trees.len(),
        density_source = ?aggregates.density_source,
        trees_per_ha = aggregates.trees_per_ha,
        "calculated plot metrics"
    );

    Ok(MetricsOutput {
        per_tree,
        aggregates,
        site,
        plot,
        carbon,
    })
}

fn site_figures(stand: &StandParameters) -> MetricsResult<SiteFigures> {
    let age = stand.age();

    // Undefined-domain errors (age <= 0) are reported as absent figures.
    let dominant_height = stand
        .site_index_m
        .and_then(|si| try_dominant_height_from_site_index(si, age).ok())
        .map(|hd| round_to(hd, 2));
    let site_index = stand
        .dominant_height_m
        .and_then(|hd| try_site_index_from_dominant_height(hd, age).ok())
        .map(|si| round_to(si, 2));

    for (field, value) in [
        ("site.dominant_height_from_site_index_m", dominant_height),
        ("site.site_index_from_dominant_height_m", site_index),
    ] {
        if let Some(v) = value {
            ensure_finite(field, v)?;
        }
    }

    Ok(SiteFigures {
        dominant_height_from_site_index_m: dominant_height,
        site_index_from_dominant_height_m: site_index,
        age_years: age,
    })
}

/// Recommended plot for the stand's spacing and target tree count, plus
/// the radius of the measured plot when a positive area was given.
///
/// The provided area is echoed as given. A negative spacing product has
/// no real plot radius and is rejected as invalid input.
///
/// ```rust
/// use forest_core::calculations::{plot_geometry, StandParameters};
///
/// let stand = StandParameters {
///     min_trees_for_plot: Some(20),
///     plot_area_m2: Some(123.456),
///     ..StandParameters::from_spacing(5.0, 5.0)
/// };
/// let plot = plot_geometry(&stand).unwrap();
/// assert_eq!(plot.recommended_area_m2_for_min_trees, 500.0);
/// assert_eq!(plot.provided_area_m2, Some(123.456));
/// ```
pub fn plot_geometry(stand: &StandParameters) -> MetricsResult<PlotGeometry> {
    let min_trees = stand.min_trees_for_plot();
    let recommended_area = recommended_plot_area_m2(
        stand.distance_in_row_m,
        stand.distance_between_rows_m,
        min_trees,
    );
    let recommended_radius = plot_radius_from_area_m(recommended_area);
    ensure_finite("plot.recommended_area_m2_for_min_trees", recommended_area)?;
    ensure_finite("plot.recommended_radius_m", recommended_radius)?;

    let provided_area = stand.plot_area_m2.filter(|area| *area > 0.0);

    Ok(PlotGeometry {
        recommended_area_m2_for_min_trees: round_to(recommended_area, 2),
        recommended_radius_m: round_to(recommended_radius, 2),
        provided_area_m2: provided_area,
        radius_from_provided_area_m: provided_area.map(|area| round_to(plot_radius_from_area_m(area), 2)),
        min_trees_for_plot: min_trees,
    })
}

fn carbon_figures(aggregates: &PlotAggregates, stand: &StandParameters) -> MetricsResult<CarbonFigures> {
    let age = stand.age();
    let emission = stand.animal_emission_kg_day();

    let carbon = carbon_forest_tn_per_ha(aggregates.biomass_total_tn_per_ha, stand.carbon_fraction());
    let capture = capture_kg_per_day_per_ha(carbon, age);
    let animals = animals_per_ha_equilibrium(capture, emission);

    ensure_finite("carbon.c_bosque_tn_per_ha", carbon)?;
    ensure_finite("carbon.capture_kg_per_day_per_ha", capture)?;
    ensure_finite("carbon.animals_per_ha_equilibrium", animals)?;

    Ok(CarbonFigures {
        carbon_tn_per_ha: round_to(carbon, 2),
        capture_kg_per_day_per_ha: round_to(capture, 3),
        animal_emission_kg_day: emission,
        animals_per_ha_equilibrium: round_to(animals, 2),
        stand_age_days: days_from_age(age),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::aggregate::DensitySource;
    use crate::equations::{
        basal_area_m2, biomass_above_kg, biomass_root_kg, dominant_height_from_site_index,
        site_index_from_dominant_height, trees_per_hectare, volume_total_with_bark_m3, CARBON_FRACTION,
    };

    fn reference_input() -> MetricsInput {
        serde_json::from_str(
            r#"{
                "trees": [{"dap_cm": 30.0, "height_m": 20.0}],
                "distance_in_row_m": 5.0,
                "distance_between_rows_m": 5.0,
                "plot_area_m2": 0,
                "age_years": 10,
                "species_root_ratio": 0.263,
                "min_trees_for_plot": 20,
                "animal_emission_kg_day": 5.0
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_end_to_end_single_tree() {
        let output = calculate(&reference_input()).unwrap();
        let agg = &output.aggregates;

        let tph = trees_per_hectare(5.0, 5.0);
        let above = biomass_above_kg(30.0, 20.0);
        let root = biomass_root_kg(above, 0.263);

        assert_eq!(agg.basal_area_per_ha_m2, round_to(basal_area_m2(30.0) * tph, 2));
        assert_eq!(agg.volume_total_with_bark_per_ha_m3, round_to(volume_total_with_bark_m3(30.0, 20.0) * tph, 2));
        assert_eq!(agg.biomass_total_tn_per_ha, round_to((above + root) * tph / 1000.0, 2));
        assert_eq!(agg.density_source, DensitySource::BySpacing);

        assert_eq!(output.per_tree.len(), 1);
        assert_eq!(output.per_tree[0].basal_area_m2, 0.0707);
        assert_eq!(output.per_tree[0].biomass_above_kg, round_to(above, 3));
    }

    #[test]
    fn test_carbon_chain_uses_rounded_biomass() {
        let output = calculate(&reference_input()).unwrap();
        let carbon = CARBON_FRACTION * output.aggregates.biomass_total_tn_per_ha;
        let capture = carbon / (10.0 * 365.0) * 1000.0;

        assert_eq!(output.carbon.carbon_tn_per_ha, round_to(carbon, 2));
        assert_eq!(output.carbon.capture_kg_per_day_per_ha, round_to(capture, 3));
        assert_eq!(output.carbon.animals_per_ha_equilibrium, round_to(capture / 5.0, 2));
        assert_eq!(output.carbon.animal_emission_kg_day, 5.0);
        assert_eq!(output.carbon.stand_age_days, 3650);
    }

    #[test]
    fn test_plot_geometry() {
        let output = calculate(&reference_input()).unwrap();
        assert_eq!(output.plot.recommended_area_m2_for_min_trees, 500.0);
        assert_eq!(output.plot.recommended_radius_m, 12.62);
        assert_eq!(output.plot.provided_area_m2, None);
        assert_eq!(output.plot.radius_from_provided_area_m, None);
        assert_eq!(output.plot.min_trees_for_plot, 20);

        let mut input = reference_input();
        input.stand.plot_area_m2 = Some(400.0);
        let output = calculate(&input).unwrap();
        assert_eq!(output.plot.provided_area_m2, Some(400.0));
        assert_eq!(output.plot.radius_from_provided_area_m, Some(11.28));
        assert_eq!(output.aggregates.density_source, DensitySource::ByPlot);
        assert_eq!(output.aggregates.trees_per_ha, 25);
    }

    #[test]
    fn test_site_figures() {
        let mut input = reference_input();
        input.stand.age_years = Some(6.0);
        input.stand.site_index_m = Some(22.0);
        input.stand.dominant_height_m = Some(14.0);

        let output = calculate(&input).unwrap();
        assert_eq!(
            output.site.dominant_height_from_site_index_m,
            Some(round_to(dominant_height_from_site_index(22.0, 6.0), 2))
        );
        assert_eq!(
            output.site.site_index_from_dominant_height_m,
            Some(round_to(site_index_from_dominant_height(14.0, 6.0), 2))
        );
        assert_eq!(output.site.age_years, 6.0);
    }

    #[test]
    fn test_site_figures_absent_without_age() {
        let mut input = reference_input();
        input.stand.age_years = None;
        input.stand.site_index_m = Some(22.0);
        input.stand.dominant_height_m = Some(14.0);

        let output = calculate(&input).unwrap();
        assert_eq!(output.site.dominant_height_from_site_index_m, None);
        assert_eq!(output.site.site_index_from_dominant_height_m, None);
        assert_eq!(output.carbon.capture_kg_per_day_per_ha, 0.0);
        assert_eq!(output.carbon.animals_per_ha_equilibrium, 0.0);
    }

    #[test]
    fn test_zero_emission_gives_zero_equilibrium() {
        let mut input = reference_input();
        input.stand.animal_emission_kg_day = Some(0.0);
        let output = calculate(&input).unwrap();
        assert!(output.carbon.capture_kg_per_day_per_ha > 0.0);
        assert_eq!(output.carbon.animals_per_ha_equilibrium, 0.0);
    }

    #[test]
    fn test_empty_trees_rejected() {
        let mut input = reference_input();
        input.trees.clear();
        let err = calculate(&input).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_defaults_fill_missing_parameters() {
        let input: MetricsInput = serde_json::from_str(
            r#"{"trees": [{"dap_cm": 30.0, "height_m": 20.0}], "distance_in_row_m": 3, "distance_between_rows_m": 3}"#,
        )
        .unwrap();
        let defaults = EngineDefaults {
            min_trees_for_plot: 10,
            animal_emission_kg_day: 4.0,
            ..EngineDefaults::default()
        };
        let output = calculate_with(&input, &defaults).unwrap();
        assert_eq!(output.plot.min_trees_for_plot, 10);
        assert_eq!(output.plot.recommended_area_m2_for_min_trees, 90.0);
        assert_eq!(output.carbon.animal_emission_kg_day, 4.0);
    }

    #[test]
    fn test_output_serialization() {
        let output = calculate(&reference_input()).unwrap();
        let json = serde_json::to_string_pretty(&output).unwrap();
        assert!(json.contains("per_tree"));
        assert!(json.contains("\"density_source\": \"BY_SPACING\""));

        let roundtrip: MetricsOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, output);
    }

    #[test]
    fn test_output_uses_record_field_names() {
        let output = calculate(&reference_input()).unwrap();
        let json = serde_json::to_value(&output).unwrap();
        assert!(json["aggregates"].get("ab_per_ha_m2").is_some());
        assert!(json["per_tree"][0].get("ab_m2").is_some());
        assert_eq!(json["carbon"]["c_bosque_tn_per_ha"], output.carbon.carbon_tn_per_ha);
    }

    #[test]
    fn test_overflowing_tree_rejected() {
        let mut input = reference_input();
        input.trees = vec![TreeObservation::new(1e200, 20.0)];
        let err = calculate(&input).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_negative_height_rejected() {
        let mut input = reference_input();
        input.trees = vec![TreeObservation::new(30.0, -1.0)];
        match calculate(&input).unwrap_err() {
            MetricsError::InvalidInput { field, .. } => assert_eq!(field, "trees[0].height_m"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_negative_spacing_has_no_plot_radius() {
        let mut input = reference_input();
        input.stand.distance_in_row_m = -5.0;
        match calculate(&input).unwrap_err() {
            MetricsError::InvalidInput { field, .. } => assert_eq!(field, "plot.recommended_radius_m"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_provided_area_echoed_unrounded() {
        let mut input = reference_input();
        input.stand.plot_area_m2 = Some(123.456);
        let output = calculate(&input).unwrap();
        assert_eq!(output.plot.provided_area_m2, Some(123.456));
    }

    #[test]
    fn test_validate_measurements_allows_empty_trees() {
        let mut input = reference_input();
        input.trees.clear();
        assert!(input.validate_measurements().is_ok());
        assert!(input.validate().is_err());
    }
}
