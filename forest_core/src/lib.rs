//! # forest_core - Forest Stand Metrics Engine
//!
//! `forest_core` turns tree measurements (diameter at breast height and
//! total height) plus stand parameters into per-tree and per-hectare
//! forest metrics: basal area, stem volume, biomass, carbon stock, site
//! index and recommended plot geometry. All inputs and outputs are
//! JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: every metric is a pure function of its inputs
//! - **Auditable**: regression coefficients are named constants and the
//!   formula set is listed in [`equations::registry`]
//! - **Degenerate-safe**: zero or negative divisors (spacing, plot area,
//!   age, emission rate) yield `0.0` instead of an error
//! - **Rich Errors**: structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use forest_core::calculations::{calculate, MetricsInput, StandParameters, TreeObservation};
//!
//! let input = MetricsInput::new(
//!     vec![TreeObservation::new(30.0, 20.0), TreeObservation::new(27.5, 19.0)],
//!     StandParameters {
//!         age_years: Some(10.0),
//!         ..StandParameters::from_spacing(5.0, 5.0)
//!     },
//! );
//!
//! let output = calculate(&input).unwrap();
//! println!("{}", serde_json::to_string_pretty(&output).unwrap());
//! ```
//!
//! ## Modules
//!
//! - [`equations`] - Closed-form allometric, site, plot and carbon formulas
//! - [`calculations`] - Per-tree metrics, plot aggregation, full request bundle
//! - [`records`] - Measurement record store
//! - [`file_io`] - Store persistence with atomic saves and locking
//! - [`settings`] - Defaults for omitted stand parameters
//! - [`units`] - Metric unit wrappers
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod equations;
pub mod errors;
pub mod file_io;
pub mod records;
pub mod settings;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{calculate, calculate_with, MetricsInput, MetricsOutput};
pub use errors::{MetricsError, MetricsResult};
pub use file_io::{load_or_create_store, load_store, save_store, FileLock};
pub use records::{MeasurementRecord, MeasurementStore, NewRecord, RecordUpdate};
pub use settings::EngineDefaults;
