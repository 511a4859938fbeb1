//! # Plot Aggregation
//!
//! Combines per-tree metrics into plot means and per-hectare totals.
//!
//! ## Density Resolution
//!
//! Per-tree means are scaled by a stocking density resolved in priority
//! order:
//!
//! 1. **By plot**: `n · 10000 / plot_area_m2` when a positive plot area is given
//! 2. **By spacing**: `10000 / (d_row · d_between)` otherwise
//!
//! Both estimates are reported alongside the resolved value and its
//! [`DensitySource`].
//!
//! ## Rounding
//!
//! Means, per-hectare areas, volumes and biomass are rounded to 2 decimals,
//! per-tree basal area to 4 decimals, densities to whole trees. Scaling
//! always uses the unrounded density.
//!
//! ## Example
//!
//! ```rust
//! use forest_core::calculations::aggregate::{aggregate_plot_metrics, DensitySource, StandParameters};
//! use forest_core::calculations::tree::TreeObservation;
//!
//! let trees = vec![TreeObservation::new(30.0, 20.0), TreeObservation::new(26.0, 18.5)];
//! let stand = StandParameters::from_spacing(5.0, 5.0);
//!
//! let agg = aggregate_plot_metrics(&trees, &stand);
//! assert_eq!(agg.trees_per_ha, 400);
//! assert_eq!(agg.density_source, DensitySource::BySpacing);
//! ```

use serde::{Deserialize, Serialize};

use super::{counts, ensure_finite, round_to};
use super::tree::{compute_per_tree, TreeObservation};
use crate::equations::{trees_per_hectare, trees_per_hectare_from_plot};
use crate::errors::{MetricsError, MetricsResult};
use crate::settings::EngineDefaults;
use crate::units::{Kilograms, Tonnes};

/// Stand-level inputs shared by every tree in a plot.
///
/// Optional values fall back to [`EngineDefaults`] (see
/// [`StandParameters::with_defaults`]) or to the built-in constants.
///
/// ## JSON Example
///
/// ```json
/// {
///   "distance_in_row_m": 5.0,
///   "distance_between_rows_m": 5.0,
///   "plot_area_m2": 500.0,
///   "age_years": 10,
///   "species_root_ratio": 0.263,
///   "site_index_m": 22.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StandParameters {
    /// Planting distance within a row (m)
    #[serde(default)]
    pub distance_in_row_m: f64,

    /// Planting distance between rows (m)
    #[serde(default)]
    pub distance_between_rows_m: f64,

    /// Measured plot area (m²); 0 or absent means "not measured"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_area_m2: Option<f64>,

    /// Stand age (years)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_years: Option<f64>,

    /// Root-to-aboveground biomass ratio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_ratio: Option<f64>,

    /// Root ratio under the name field records use; `root_ratio` wins
    /// when both are given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species_root_ratio: Option<f64>,

    /// Emission of one grazing animal (kg/day)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animal_emission_kg_day: Option<f64>,

    /// Target tree count for the recommended plot; `20.0` reads as 20
    #[serde(
        default,
        deserialize_with = "counts::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_trees_for_plot: Option<u32>,

    /// Carbon fraction of dry biomass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_fraction: Option<f64>,

    /// Known site index (m at age 10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_index_m: Option<f64>,

    /// Measured dominant height (m)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_height_m: Option<f64>,
}

impl StandParameters {
    /// Stand described only by its planting spacing.
    pub fn from_spacing(distance_in_row_m: f64, distance_between_rows_m: f64) -> Self {
        StandParameters {
            distance_in_row_m,
            distance_between_rows_m,
            ..Default::default()
        }
    }

    /// Fill every unset defaultable field from `defaults`.
    pub fn with_defaults(mut self, defaults: &EngineDefaults) -> Self {
        let root_ratio = self.root_ratio.or(self.species_root_ratio).unwrap_or(defaults.root_ratio);
        self.root_ratio = Some(root_ratio);
        self.animal_emission_kg_day.get_or_insert(defaults.animal_emission_kg_day);
        self.min_trees_for_plot.get_or_insert(defaults.min_trees_for_plot);
        self.carbon_fraction.get_or_insert(defaults.carbon_fraction);
        self
    }

    /// Plot area, or 0 when not measured
    pub fn plot_area(&self) -> f64 {
        self.plot_area_m2.unwrap_or(0.0)
    }

    /// Stand age, or 0 when unknown
    pub fn age(&self) -> f64 {
        self.age_years.unwrap_or(0.0)
    }

    pub fn root_ratio(&self) -> f64 {
        self.root_ratio
            .or(self.species_root_ratio)
            .unwrap_or_else(|| EngineDefaults::default().root_ratio)
    }

    pub fn animal_emission_kg_day(&self) -> f64 {
        self.animal_emission_kg_day
            .unwrap_or_else(|| EngineDefaults::default().animal_emission_kg_day)
    }

    pub fn min_trees_for_plot(&self) -> u32 {
        self.min_trees_for_plot
            .unwrap_or_else(|| EngineDefaults::default().min_trees_for_plot)
    }

    pub fn carbon_fraction(&self) -> f64 {
        self.carbon_fraction
            .unwrap_or_else(|| EngineDefaults::default().carbon_fraction)
    }

    /// Reject non-finite numbers. Zero and negative values are accepted;
    /// the equations treat them as unknown.
    pub fn validate(&self) -> MetricsResult<()> {
        let values = [
            ("distance_in_row_m", Some(self.distance_in_row_m)),
            ("distance_between_rows_m", Some(self.distance_between_rows_m)),
            ("plot_area_m2", self.plot_area_m2),
            ("age_years", self.age_years),
            ("root_ratio", self.root_ratio),
            ("species_root_ratio", self.species_root_ratio),
            ("animal_emission_kg_day", self.animal_emission_kg_day),
            ("carbon_fraction", self.carbon_fraction),
            ("site_index_m", self.site_index_m),
            ("dominant_height_m", self.dominant_height_m),
        ];
        for (field, value) in values {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(MetricsError::invalid_input(field, v.to_string(), "Value must be finite"));
                }
            }
        }
        Ok(())
    }
}

/// Which estimate the per-hectare figures were scaled by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DensitySource {
    /// Tree count over measured plot area
    ByPlot,
    /// Planting spacing
    #[default]
    BySpacing,
}

/// Plot means and per-hectare totals.
///
/// Serialized with the field names of the measurement records
/// (`ab_per_ha_m2`, `vol_total_cc_per_ha_m3`, ...). Metrics submitted
/// without the biomass, density breakdown or source fields still parse;
/// see [`PlotAggregates::normalized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotAggregates {
    /// Number of trees measured
    #[serde(deserialize_with = "counts::deserialize")]
    pub trees_count: usize,

    /// Mean DAP (cm)
    pub dap_mean_cm: f64,

    /// Mean total height (m)
    pub height_mean_m: f64,

    /// Mean of squared DAP (cm²)
    pub dap2_mean: f64,

    /// Mean basal area per tree (m²)
    #[serde(rename = "ab_per_tree_m2")]
    pub basal_area_per_tree_m2: f64,

    /// Basal area per hectare (m²/ha)
    #[serde(rename = "ab_per_ha_m2")]
    pub basal_area_per_ha_m2: f64,

    /// Total volume with bark (m³/ha)
    #[serde(rename = "vol_total_cc_per_ha_m3")]
    pub volume_total_with_bark_per_ha_m3: f64,

    /// Total volume without bark (m³/ha)
    #[serde(rename = "vol_total_sc_per_ha_m3")]
    pub volume_total_without_bark_per_ha_m3: f64,

    /// Merchantable volume with bark (m³/ha)
    #[serde(rename = "vol_merchantable15_cc_per_ha_m3")]
    pub volume_merchantable_with_bark_per_ha_m3: f64,

    /// Merchantable volume without bark (m³/ha)
    #[serde(rename = "vol_merchantable15_sc_per_ha_m3")]
    pub volume_merchantable_without_bark_per_ha_m3: f64,

    /// Aboveground biomass (t/ha)
    #[serde(default)]
    pub biomass_above_tn_per_ha: f64,

    /// Root biomass (t/ha)
    #[serde(default)]
    pub biomass_root_tn_per_ha: f64,

    /// Aboveground + root biomass (t/ha)
    #[serde(default)]
    pub biomass_total_tn_per_ha: f64,

    /// Resolved stocking density (trees/ha)
    #[serde(deserialize_with = "counts::deserialize")]
    pub trees_per_ha: u64,

    /// Density from planting spacing (trees/ha)
    #[serde(default, deserialize_with = "counts::deserialize")]
    pub trees_per_ha_by_spacing: u64,

    /// Density from plot count (trees/ha), when a plot area was given
    #[serde(default, deserialize_with = "counts::option::deserialize")]
    pub trees_per_ha_by_plot: Option<u64>,

    /// Estimate used for `trees_per_ha`
    #[serde(default)]
    pub density_source: DensitySource,
}

impl PlotAggregates {
    /// Aggregate of an empty plot: every figure zero, density from spacing.
    fn empty(trees_per_ha_by_spacing: f64) -> Self {
        let by_spacing = round_count(trees_per_ha_by_spacing);
        PlotAggregates {
            trees_count: 0,
            dap_mean_cm: 0.0,
            height_mean_m: 0.0,
            dap2_mean: 0.0,
            basal_area_per_tree_m2: 0.0,
            basal_area_per_ha_m2: 0.0,
            volume_total_with_bark_per_ha_m3: 0.0,
            volume_total_without_bark_per_ha_m3: 0.0,
            volume_merchantable_with_bark_per_ha_m3: 0.0,
            volume_merchantable_without_bark_per_ha_m3: 0.0,
            biomass_above_tn_per_ha: 0.0,
            biomass_root_tn_per_ha: 0.0,
            biomass_total_tn_per_ha: 0.0,
            trees_per_ha: by_spacing,
            trees_per_ha_by_spacing: by_spacing,
            trees_per_ha_by_plot: None,
            density_source: DensitySource::BySpacing,
        }
    }

    /// Reject the aggregate when any figure overflowed or left the real
    /// domain.
    pub fn ensure_finite(&self) -> MetricsResult<()> {
        let figures = [
            ("dap_mean_cm", self.dap_mean_cm),
            ("height_mean_m", self.height_mean_m),
            ("dap2_mean", self.dap2_mean),
            ("ab_per_tree_m2", self.basal_area_per_tree_m2),
            ("ab_per_ha_m2", self.basal_area_per_ha_m2),
            ("vol_total_cc_per_ha_m3", self.volume_total_with_bark_per_ha_m3),
            ("vol_total_sc_per_ha_m3", self.volume_total_without_bark_per_ha_m3),
            ("vol_merchantable15_cc_per_ha_m3", self.volume_merchantable_with_bark_per_ha_m3),
            ("vol_merchantable15_sc_per_ha_m3", self.volume_merchantable_without_bark_per_ha_m3),
            ("biomass_above_tn_per_ha", self.biomass_above_tn_per_ha),
            ("biomass_root_tn_per_ha", self.biomass_root_tn_per_ha),
            ("biomass_total_tn_per_ha", self.biomass_total_tn_per_ha),
        ];
        for (name, value) in figures {
            ensure_finite(&format!("metrics.{}", name), value)?;
        }
        Ok(())
    }

    /// Fill the fields that submitted metrics may omit.
    ///
    /// A plot estimate exists exactly when the plot density was used, so
    /// the source follows `trees_per_ha_by_plot`. An empty plot reports
    /// only the spacing density.
    pub fn normalized(mut self) -> Self {
        self.density_source = if self.trees_per_ha_by_plot.is_some() {
            DensitySource::ByPlot
        } else {
            DensitySource::BySpacing
        };
        if self.trees_count == 0 {
            self.trees_per_ha_by_spacing = self.trees_per_ha;
        }
        self
    }
}

/// Round a density to whole trees.
fn round_count(trees_per_ha: f64) -> u64 {
    trees_per_ha.round_ties_even() as u64
}

/// Running sums over the plot's trees.
#[derive(Default)]
struct Sums {
    dap: f64,
    height: f64,
    dap2: f64,
    basal_area: f64,
    vol_total_cc: f64,
    vol_total_sc: f64,
    vol_merch_cc: f64,
    vol_merch_sc: f64,
    biomass_above_kg: f64,
    biomass_root_kg: f64,
}

/// Aggregate a plot's trees into means and per-hectare totals.
///
/// An empty `trees` slice yields an all-zero aggregate whose density still
/// comes from the spacing.
pub fn aggregate_plot_metrics(trees: &[TreeObservation], stand: &StandParameters) -> PlotAggregates {
    let tph_spacing = trees_per_hectare(stand.distance_in_row_m, stand.distance_between_rows_m);

    let n = trees.len();
    if n == 0 {
        return PlotAggregates::empty(tph_spacing);
    }

    let root_ratio = stand.root_ratio();
    let mut sums = Sums::default();
    for tree in trees {
        let m = compute_per_tree(tree, root_ratio);
        sums.dap += tree.dap_cm;
        sums.height += tree.height_m;
        sums.dap2 += tree.dap_cm.powi(2);
        sums.basal_area += m.basal_area_m2;
        sums.vol_total_cc += m.volume_total_with_bark_m3;
        sums.vol_total_sc += m.volume_total_without_bark_m3;
        sums.vol_merch_cc += m.volume_merchantable_with_bark_m3;
        sums.vol_merch_sc += m.volume_merchantable_without_bark_m3;
        sums.biomass_above_kg += m.biomass_above_kg;
        sums.biomass_root_kg += m.biomass_root_kg;
    }

    let count = n as f64;
    let basal_area_per_tree = sums.basal_area / count;

    let tph_plot = trees_per_hectare_from_plot(n, stand.plot_area());
    let (tph, density_source) = if tph_plot > 0.0 {
        (tph_plot, DensitySource::ByPlot)
    } else {
        (tph_spacing, DensitySource::BySpacing)
    };

    let per_ha = |sum: f64| round_to((sum / count) * tph, 2);
    let tonnes_per_ha = |sum_kg: f64| {
        let t: Tonnes = Kilograms((sum_kg / count) * tph).into();
        round_to(t.0, 2)
    };

    PlotAggregates {
        trees_count: n,
        dap_mean_cm: round_to(sums.dap / count, 2),
        height_mean_m: round_to(sums.height / count, 2),
        dap2_mean: round_to(sums.dap2 / count, 2),
        basal_area_per_tree_m2: round_to(basal_area_per_tree, 4),
        basal_area_per_ha_m2: round_to(basal_area_per_tree * tph, 2),
        volume_total_with_bark_per_ha_m3: per_ha(sums.vol_total_cc),
        volume_total_without_bark_per_ha_m3: per_ha(sums.vol_total_sc),
        volume_merchantable_with_bark_per_ha_m3: per_ha(sums.vol_merch_cc),
        volume_merchantable_without_bark_per_ha_m3: per_ha(sums.vol_merch_sc),
        biomass_above_tn_per_ha: tonnes_per_ha(sums.biomass_above_kg),
        biomass_root_tn_per_ha: tonnes_per_ha(sums.biomass_root_kg),
        biomass_total_tn_per_ha: tonnes_per_ha(sums.biomass_above_kg + sums.biomass_root_kg),
        trees_per_ha: round_count(tph),
        trees_per_ha_by_spacing: round_count(tph_spacing),
        trees_per_ha_by_plot: (tph_plot > 0.0).then(|| round_count(tph_plot)),
        density_source,
    }
}
