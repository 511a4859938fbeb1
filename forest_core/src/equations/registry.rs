//! # Equation Registry
//!
//! Central list of every formula the engine evaluates, with the metadata
//! needed to audit it against its forestry source: plain-text formula,
//! variables, assumptions and the function that implements it.
//!
//! ## Usage
//!
//! ```rust
//! use forest_core::equations::registry::{Equation, ALL_EQUATIONS};
//!
//! let meta = Equation::BasalArea.metadata();
//! assert_eq!(meta.source_function, "basal_area_m2");
//! assert!(ALL_EQUATIONS.contains(&Equation::SiteIndex));
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Equation Categories
// ============================================================================

/// Categories for grouping equations in the reference document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquationCategory {
    /// Per-tree cross-section
    TreeGeometry,
    /// Per-tree stem volume regressions
    StemVolume,
    /// Per-tree biomass regressions
    Biomass,
    /// Trees per hectare
    StandDensity,
    /// Site index / dominant height curves
    SiteQuality,
    /// Sample plot sizing
    PlotDesign,
    /// Carbon stock and grazing equilibrium
    Carbon,
}

impl EquationCategory {
    /// Display name for the category
    pub fn display_name(&self) -> &'static str {
        match self {
            EquationCategory::TreeGeometry => "Tree Geometry",
            EquationCategory::StemVolume => "Stem Volume",
            EquationCategory::Biomass => "Biomass",
            EquationCategory::StandDensity => "Stand Density",
            EquationCategory::SiteQuality => "Site Quality",
            EquationCategory::PlotDesign => "Plot Design",
            EquationCategory::Carbon => "Carbon",
        }
    }

    /// Sort order in the reference document (lower = earlier)
    pub fn sort_order(&self) -> u8 {
        match self {
            EquationCategory::TreeGeometry => 1,
            EquationCategory::StemVolume => 2,
            EquationCategory::Biomass => 3,
            EquationCategory::StandDensity => 4,
            EquationCategory::SiteQuality => 5,
            EquationCategory::PlotDesign => 6,
            EquationCategory::Carbon => 7,
        }
    }
}

// ============================================================================
// Variable Definition
// ============================================================================

/// Definition of a variable used in an equation.
#[derive(Debug, Clone)]
pub struct Variable {
    /// Symbol (e.g., "DAP", "H")
    pub symbol: &'static str,
    /// Description
    pub description: &'static str,
    /// Units (e.g., "cm", "m", "t/ha")
    pub units: &'static str,
}

impl Variable {
    pub const fn new(symbol: &'static str, description: &'static str, units: &'static str) -> Self {
        Self { symbol, description, units }
    }
}

const DAP: Variable = Variable::new("DAP", "Diameter at breast height", "cm");
const H: Variable = Variable::new("H", "Total tree height", "m");
const AGE: Variable = Variable::new("age", "Stand age", "years");

// ============================================================================
// Equation Metadata
// ============================================================================

/// Complete metadata for one formula.
#[derive(Debug, Clone)]
pub struct EquationMetadata {
    /// Human-readable name
    pub name: &'static str,
    /// The formula in plain text
    pub formula_plain: &'static str,
    /// Variable definitions
    pub variables: Vec<Variable>,
    /// Assumptions or limitations
    pub assumptions: Vec<&'static str>,
    /// Category for grouping
    pub category: EquationCategory,
    /// Source module where the equation implementation lives
    pub source_module: &'static str,
    /// Function name implementing the equation
    pub source_function: &'static str,
}

// ============================================================================
// Equation Enum
// ============================================================================

/// All formulas evaluated by the metrics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Equation {
    /// g = π·(DAP/100)²/4
    BasalArea,
    /// Total volume with bark
    VolumeTotalWithBark,
    /// Total volume without bark
    VolumeTotalWithoutBark,
    /// Merchantable (15 cm top) volume with bark
    VolumeMerchantableWithBark,
    /// Merchantable volume without bark (ratio approximation)
    VolumeMerchantableWithoutBark,
    /// Aboveground biomass regression
    BiomassAbove,
    /// Root biomass from root ratio
    BiomassRoot,
    /// N/ha from planting spacing
    TreesPerHectareSpacing,
    /// N/ha from plot count
    TreesPerHectarePlot,
    /// Hd from SI and age
    DominantHeight,
    /// SI from Hd and age
    SiteIndex,
    /// Minimum plot area for a target tree count
    RecommendedPlotArea,
    /// Circular plot radius from area
    PlotRadius,
    /// Carbon stock from biomass
    CarbonStock,
    /// Daily carbon capture
    CaptureRate,
    /// Animals per hectare at emission equilibrium
    AnimalEquilibrium,
}

/// Every registered equation, in document order.
pub const ALL_EQUATIONS: &[Equation] = &[
    Equation::BasalArea,
    Equation::VolumeTotalWithBark,
    Equation::VolumeTotalWithoutBark,
    Equation::VolumeMerchantableWithBark,
    Equation::VolumeMerchantableWithoutBark,
    Equation::BiomassAbove,
    Equation::BiomassRoot,
    Equation::TreesPerHectareSpacing,
    Equation::TreesPerHectarePlot,
    Equation::DominantHeight,
    Equation::SiteIndex,
    Equation::RecommendedPlotArea,
    Equation::PlotRadius,
    Equation::CarbonStock,
    Equation::CaptureRate,
    Equation::AnimalEquilibrium,
];

impl Equation {
    /// Get full metadata for this equation
    pub fn metadata(&self) -> EquationMetadata {
        match self {
            Equation::BasalArea => EquationMetadata {
                name: "Basal Area",
                formula_plain: "g = pi * (DAP/100)^2 / 4",
                variables: vec![DAP, Variable::new("g", "Basal area", "m²")],
                assumptions: vec!["Circular stem cross-section at breast height"],
                category: EquationCategory::TreeGeometry,
                source_module: "equations::allometry",
                source_function: "basal_area_m2",
            },
            Equation::VolumeTotalWithBark => EquationMetadata {
                name: "Total Volume, With Bark",
                formula_plain: "V = 0.0006 + 0.3348 * (DAP/100)^2 * H",
                variables: vec![DAP, H, Variable::new("V", "Stem volume", "m³")],
                assumptions: vec!["Empirical regression; coefficients fixed"],
                category: EquationCategory::StemVolume,
                source_module: "equations::allometry",
                source_function: "volume_total_with_bark_m3",
            },
            Equation::VolumeTotalWithoutBark => EquationMetadata {
                name: "Total Volume, Without Bark",
                formula_plain: "V = -0.0021 + 0.3127 * (DAP/100)^2 * H",
                variables: vec![DAP, H, Variable::new("V", "Stem volume", "m³")],
                assumptions: vec!["Empirical regression; coefficients fixed"],
                category: EquationCategory::StemVolume,
                source_module: "equations::allometry",
                source_function: "volume_total_without_bark_m3",
            },
            Equation::VolumeMerchantableWithBark => EquationMetadata {
                name: "Merchantable Volume (15 cm top), With Bark",
                formula_plain: "V = -0.0136 + 0.3247 * (DAP/100)^2 * H",
                variables: vec![DAP, H, Variable::new("V", "Stem volume", "m³")],
                assumptions: vec!["Empirical regression; coefficients fixed"],
                category: EquationCategory::StemVolume,
                source_module: "equations::allometry",
                source_function: "volume_merchantable_with_bark_m3",
            },
            Equation::VolumeMerchantableWithoutBark => EquationMetadata {
                name: "Merchantable Volume (15 cm top), Without Bark",
                formula_plain: "V = V_merch_cc * (V_total_sc / V_total_cc), ratio = 0.93 if V_total_cc <= 0",
                variables: vec![DAP, H, Variable::new("V", "Stem volume", "m³")],
                assumptions: vec![
                    "Known approximation: ratio of total volumes, not a fitted regression",
                ],
                category: EquationCategory::StemVolume,
                source_module: "equations::allometry",
                source_function: "volume_merchantable_without_bark_m3",
            },
            Equation::BiomassAbove => EquationMetadata {
                name: "Aboveground Biomass",
                formula_plain: "B = -0.0808 + 0.0206 * DAP^2.337 * H^0.614",
                variables: vec![DAP, H, Variable::new("B", "Aboveground biomass", "kg")],
                assumptions: vec!["Empirical regression; coefficients fixed"],
                category: EquationCategory::Biomass,
                source_module: "equations::allometry",
                source_function: "biomass_above_kg",
            },
            Equation::BiomassRoot => EquationMetadata {
                name: "Root Biomass",
                formula_plain: "B_root = B_above * r (r = 0.263 by default)",
                variables: vec![
                    Variable::new("B_above", "Aboveground biomass", "kg"),
                    Variable::new("r", "Root-to-aboveground ratio", "-"),
                ],
                assumptions: vec![],
                category: EquationCategory::Biomass,
                source_module: "equations::allometry",
                source_function: "biomass_root_kg",
            },
            Equation::TreesPerHectareSpacing => EquationMetadata {
                name: "Trees per Hectare (Spacing)",
                formula_plain: "N = 10000 / (d_row * d_between)",
                variables: vec![
                    Variable::new("d_row", "Distance within row", "m"),
                    Variable::new("d_between", "Distance between rows", "m"),
                ],
                assumptions: vec!["N = 0 when either distance <= 0"],
                category: EquationCategory::StandDensity,
                source_module: "equations::stand",
                source_function: "trees_per_hectare",
            },
            Equation::TreesPerHectarePlot => EquationMetadata {
                name: "Trees per Hectare (Plot Count)",
                formula_plain: "N = n * 10000 / A",
                variables: vec![
                    Variable::new("n", "Trees counted on plot", "-"),
                    Variable::new("A", "Plot area", "m²"),
                ],
                assumptions: vec!["N = 0 when A <= 0"],
                category: EquationCategory::StandDensity,
                source_module: "equations::stand",
                source_function: "trees_per_hectare_from_plot",
            },
            Equation::DominantHeight => EquationMetadata {
                name: "Dominant Height from Site Index",
                formula_plain: "Hd = SI * (1 - e^(-0.14 age))^(1/0.67) / (1 - e^(-1.4))^(1/0.67)",
                variables: vec![AGE, Variable::new("SI", "Site index at age 10", "m")],
                assumptions: vec!["Reference age 10 years", "age > 0"],
                category: EquationCategory::SiteQuality,
                source_module: "equations::site",
                source_function: "dominant_height_from_site_index",
            },
            Equation::SiteIndex => EquationMetadata {
                name: "Site Index from Dominant Height",
                formula_plain: "SI = Hd * (1 - e^(-1.4))^(1/0.67) / (1 - e^(-0.14 age))^(1/0.67)",
                variables: vec![AGE, Variable::new("Hd", "Dominant height", "m")],
                assumptions: vec!["Reference age 10 years", "Undefined at age = 0"],
                category: EquationCategory::SiteQuality,
                source_module: "equations::site",
                source_function: "site_index_from_dominant_height",
            },
            Equation::RecommendedPlotArea => EquationMetadata {
                name: "Recommended Plot Area",
                formula_plain: "A = n_min * d_row * d_between",
                variables: vec![
                    Variable::new("n_min", "Target tree count (default 20)", "-"),
                    Variable::new("A", "Plot area", "m²"),
                ],
                assumptions: vec![],
                category: EquationCategory::PlotDesign,
                source_module: "equations::plot",
                source_function: "recommended_plot_area_m2",
            },
            Equation::PlotRadius => EquationMetadata {
                name: "Circular Plot Radius",
                formula_plain: "r = sqrt(A / pi)",
                variables: vec![Variable::new("A", "Plot area", "m²"), Variable::new("r", "Radius", "m")],
                assumptions: vec![],
                category: EquationCategory::PlotDesign,
                source_module: "equations::plot",
                source_function: "plot_radius_from_area_m",
            },
            Equation::CarbonStock => EquationMetadata {
                name: "Forest Carbon Stock",
                formula_plain: "C = B_total * f (f = 0.49 by default)",
                variables: vec![
                    Variable::new("B_total", "Total biomass", "t/ha"),
                    Variable::new("C", "Carbon stock", "t/ha"),
                ],
                assumptions: vec!["Carbon fraction 0.49 by default"],
                category: EquationCategory::Carbon,
                source_module: "equations::carbon",
                source_function: "carbon_forest_tn_per_ha",
            },
            Equation::CaptureRate => EquationMetadata {
                name: "Daily Carbon Capture",
                formula_plain: "c = C / (age * 365) * 1000",
                variables: vec![AGE, Variable::new("C", "Carbon stock", "t/ha")],
                assumptions: vec!["c = 0 when age * 365 <= 0"],
                category: EquationCategory::Carbon,
                source_module: "equations::carbon",
                source_function: "capture_kg_per_day_per_ha",
            },
            Equation::AnimalEquilibrium => EquationMetadata {
                name: "Grazing Equilibrium",
                formula_plain: "animals = c / e (e = 5.0 kg/day by default)",
                variables: vec![
                    Variable::new("c", "Carbon capture", "kg/day/ha"),
                    Variable::new("e", "Emission per animal", "kg/day"),
                ],
                assumptions: vec!["animals = 0 when e <= 0"],
                category: EquationCategory::Carbon,
                source_module: "equations::carbon",
                source_function: "animals_per_ha_equilibrium",
            },
        }
    }

    /// Categories present in the registry, in document order
    pub fn all_categories() -> Vec<EquationCategory> {
        let mut categories: Vec<EquationCategory> = Vec::new();
        for eq in ALL_EQUATIONS {
            let category = eq.metadata().category;
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        categories.sort_by_key(|c| c.sort_order());
        categories
    }

    /// All equations in a category
    pub fn in_category(category: EquationCategory) -> Vec<Equation> {
        ALL_EQUATIONS
            .iter()
            .copied()
            .filter(|eq| eq.metadata().category == category)
            .collect()
    }
}

/// Render the formula set as a markdown reference.
pub fn generate_equations_markdown() -> String {
    let mut output = String::with_capacity(8_000);

    output.push_str(
        r#"# Forest Metrics Equations Reference

> **Auto-generated from source code. Do not edit manually.**
>
> Regenerate with: `forest equations`

This document lists every formula used by the metrics engine. Regression
coefficients are reproduced exactly from their forestry source.

---

"#,
    );

    for category in Equation::all_categories() {
        output.push_str(&format!("## {}\n\n", category.display_name()));

        for equation in Equation::in_category(category) {
            let meta = equation.metadata();

            output.push_str(&format!("### {}\n\n", meta.name));
            output.push_str(&format!("**Formula:** `{}`\n\n", meta.formula_plain));

            if !meta.variables.is_empty() {
                output.push_str("**Variables:**\n\n");
                output.push_str("| Symbol | Description | Units |\n");
                output.push_str("|--------|-------------|-------|\n");
                for var in &meta.variables {
                    output.push_str(&format!("| {} | {} | {} |\n", var.symbol, var.description, var.units));
                }
                output.push('\n');
            }

            if !meta.assumptions.is_empty() {
                output.push_str("**Assumptions:**\n\n");
                for assumption in &meta.assumptions {
                    output.push_str(&format!("- {}\n", assumption));
                }
                output.push('\n');
            }

            output.push_str(&format!(
                "**Source:** `{}::{}`\n\n",
                meta.source_module, meta.source_function
            ));
        }
    }

    output
}
