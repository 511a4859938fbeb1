//! # Forest Mensuration Equations
//!
//! Every closed-form formula the metrics engine evaluates lives here.
//! Keeping them in one place makes the set auditable against its forestry
//! source and keeps the calculations free of magic numbers.
//!
//! ## Modules
//!
//! - [`allometry`] - Per-tree basal area, volume and biomass
//! - [`stand`] - Trees per hectare
//! - [`site`] - Site index / dominant height curves
//! - [`plot`] - Sample plot sizing
//! - [`carbon`] - Carbon stock, capture rate, grazing equilibrium
//! - [`registry`] - Equation metadata for the generated reference
//!
//! ## Units
//!
//! Diameter in cm, heights and distances in m, areas in m², per-tree
//! biomass in kg and per-hectare biomass and carbon in t/ha.

pub mod allometry;
pub mod carbon;
pub mod plot;
pub mod registry;
pub mod site;
pub mod stand;

pub use allometry::{
    basal_area_m2,
    biomass_above_kg,
    biomass_root_kg,
    volume_merchantable_with_bark_m3,
    volume_merchantable_without_bark_m3,
    volume_total_with_bark_m3,
    volume_total_without_bark_m3,
    DEFAULT_ROOT_RATIO,
};

pub use carbon::{
    animals_per_ha_equilibrium,
    capture_kg_per_day_per_ha,
    carbon_forest_tn_per_ha,
    days_from_age,
    CARBON_FRACTION,
    DEFAULT_ANIMAL_EMISSION_KG_DAY,
};

pub use plot::{plot_radius_from_area_m, recommended_plot_area_m2, DEFAULT_MIN_TREES_FOR_PLOT};

pub use site::{
    dominant_height_from_site_index,
    site_index_from_dominant_height,
    try_dominant_height_from_site_index,
    try_site_index_from_dominant_height,
    REFERENCE_AGE_YEARS,
};

pub use stand::{trees_per_hectare, trees_per_hectare_from_plot};

pub use registry::{generate_equations_markdown, Equation, EquationCategory, EquationMetadata, ALL_EQUATIONS};
