//! # Measurement Records
//!
//! The `MeasurementStore` keeps computed plot metrics together with the
//! input that produced them. Stores serialize to human-readable JSON (see
//! [`crate::file_io`] for atomic saves and locking).
//!
//! ## Structure
//!
//! ```text
//! MeasurementStore
//! ├── meta: StoreMetadata (schema version, timestamps)
//! ├── settings: EngineDefaults (root ratio, emission, min trees, carbon fraction)
//! └── records: HashMap<Uuid, MeasurementRecord>
//! ```
//!
//! ## Example
//!
//! ```rust
//! use forest_core::calculations::{MetricsInput, StandParameters, TreeObservation};
//! use forest_core::records::{MeasurementStore, NewRecord};
//!
//! let mut store = MeasurementStore::new();
//! let input = MetricsInput::new(
//!     vec![TreeObservation::new(30.0, 20.0)],
//!     StandParameters::from_spacing(5.0, 5.0),
//! );
//!
//! let record = store.create(NewRecord::from_input(input).with_plot("P-12")).unwrap();
//! assert_eq!(record.metrics.trees_per_ha, 400);
//! assert_eq!(store.list().len(), 1);
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::{aggregate_plot_metrics, MetricsInput, PlotAggregates};
use crate::errors::{MetricsError, MetricsResult};
use crate::settings::EngineDefaults;

/// Current schema version for store files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// One stored measurement: the input as submitted and the plot aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Record identifier
    pub id: Uuid,

    /// Optional reference to the plot this measurement belongs to
    pub plot_reference: Option<String>,

    /// Input data as submitted
    pub input_data: Option<MetricsInput>,

    /// Plot aggregates, either submitted or computed from `input_data`
    pub metrics: PlotAggregates,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a record.
///
/// When `metrics` is absent they are computed from `input_data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRecord {
    #[serde(default)]
    pub plot_reference: Option<String>,
    #[serde(default)]
    pub input_data: Option<MetricsInput>,
    #[serde(default)]
    pub metrics: Option<PlotAggregates>,
}

impl NewRecord {
    /// Record whose metrics will be computed from `input`
    pub fn from_input(input: MetricsInput) -> Self {
        NewRecord {
            input_data: Some(input),
            ..Default::default()
        }
    }

    /// Attach a plot reference
    pub fn with_plot(mut self, plot_reference: impl Into<String>) -> Self {
        self.plot_reference = Some(plot_reference.into());
        self
    }
}

/// Partial update of a record. Unset fields are left unchanged.
///
/// Replacing `input_data` without supplying `metrics` recomputes the
/// metrics from the new input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(default)]
    pub plot_reference: Option<String>,
    #[serde(default)]
    pub input_data: Option<MetricsInput>,
    #[serde(default)]
    pub metrics: Option<PlotAggregates>,
}

/// Store metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// When the store was created
    pub created: DateTime<Utc>,

    /// When the store was last modified
    pub modified: DateTime<Utc>,
}

/// Root container for measurement records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementStore {
    /// Store metadata (version, timestamps)
    pub meta: StoreMetadata,

    /// Defaults applied when computing metrics from input data
    #[serde(default)]
    pub settings: EngineDefaults,

    /// All records, keyed by UUID
    pub records: HashMap<Uuid, MeasurementRecord>,
}

impl MeasurementStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        let now = Utc::now();
        MeasurementStore {
            meta: StoreMetadata {
                version: SCHEMA_VERSION.to_string(),
                created: now,
                modified: now,
            },
            settings: EngineDefaults::default(),
            records: HashMap::new(),
        }
    }

    /// Create a new empty store with the given defaults.
    pub fn with_settings(settings: EngineDefaults) -> Self {
        MeasurementStore {
            settings,
            ..MeasurementStore::new()
        }
    }

    /// Aggregates for `input`, with the store's defaults applied.
    fn compute_metrics(&self, input: &MetricsInput) -> PlotAggregates {
        let stand = input.stand.clone().with_defaults(&self.settings);
        aggregate_plot_metrics(&input.trees, &stand)
    }

    /// Metrics to store for a record: the submitted ones, else computed from
    /// `input`. Every number must be finite so the store stays loadable.
    fn resolve_metrics(
        &self,
        submitted: Option<PlotAggregates>,
        input: Option<&MetricsInput>,
    ) -> MetricsResult<Option<PlotAggregates>> {
        if let Some(input) = input {
            input.validate_measurements()?;
        }
        let metrics = match (submitted, input) {
            (Some(metrics), _) => metrics.normalized(),
            (None, Some(input)) => self.compute_metrics(input),
            (None, None) => return Ok(None),
        };
        metrics.ensure_finite()?;
        Ok(Some(metrics))
    }

    /// Add a record.
    ///
    /// # Returns
    ///
    /// * `Ok(MeasurementRecord)` - The stored record
    /// * `Err(MetricsError::MissingField)` - Neither metrics nor input data given
    /// * `Err(MetricsError::InvalidInput)` - Negative or non-finite measurements,
    ///   or metrics that are not finite
    pub fn create(&mut self, new: NewRecord) -> MetricsResult<MeasurementRecord> {
        let metrics = self
            .resolve_metrics(new.metrics, new.input_data.as_ref())?
            .ok_or_else(|| MetricsError::missing_field("input_data"))?;

        let now = Utc::now();
        let record = MeasurementRecord {
            id: Uuid::new_v4(),
            plot_reference: new.plot_reference,
            input_data: new.input_data,
            metrics,
            created_at: now,
            updated_at: now,
        };

        self.records.insert(record.id, record.clone());
        self.touch();
        tracing::info!(id = %record.id, plot = ?record.plot_reference, "created measurement record");
        Ok(record)
    }

    /// Get a record by UUID.
    pub fn get(&self, id: &Uuid) -> MetricsResult<&MeasurementRecord> {
        self.records.get(id).ok_or_else(|| MetricsError::record_not_found(id))
    }

    /// All records, newest first.
    pub fn list(&self) -> Vec<&MeasurementRecord> {
        let mut records: Vec<&MeasurementRecord> = self.records.values().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        records
    }

    /// Records for one plot, newest first.
    pub fn list_for_plot(&self, plot_reference: &str) -> Vec<&MeasurementRecord> {
        self.list()
            .into_iter()
            .filter(|r| r.plot_reference.as_deref() == Some(plot_reference))
            .collect()
    }

    /// Apply a partial update to a record.
    ///
    /// The record is left untouched when the new input or metrics are
    /// rejected.
    pub fn update(&mut self, id: &Uuid, update: RecordUpdate) -> MetricsResult<MeasurementRecord> {
        if !self.records.contains_key(id) {
            return Err(MetricsError::record_not_found(id));
        }
        let metrics = self.resolve_metrics(update.metrics, update.input_data.as_ref())?;

        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| MetricsError::record_not_found(id))?;

        if let Some(plot_reference) = update.plot_reference {
            record.plot_reference = Some(plot_reference);
        }
        if let Some(input) = update.input_data {
            record.input_data = Some(input);
        }
        if let Some(metrics) = metrics {
            record.metrics = metrics;
        }
        record.updated_at = Utc::now();

        let updated = record.clone();
        self.touch();
        tracing::info!(id = %id, "updated measurement record");
        Ok(updated)
    }

    /// Remove a record by UUID, returning it.
    pub fn delete(&mut self, id: &Uuid) -> MetricsResult<MeasurementRecord> {
        let record = self
            .records
            .remove(id)
            .ok_or_else(|| MetricsError::record_not_found(id))?;
        self.touch();
        tracing::info!(id = %id, "deleted measurement record");
        Ok(record)
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

impl Default for MeasurementStore {
    fn default() -> Self {
        MeasurementStore::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::{DensitySource, StandParameters, TreeObservation};
    use chrono::Duration;

    fn sample_input(dap_cm: f64) -> MetricsInput {
        MetricsInput::new(
            vec![TreeObservation::new(dap_cm, 20.0)],
            StandParameters::from_spacing(5.0, 5.0),
        )
    }

    #[test]
    fn test_store_creation() {
        let store = MeasurementStore::new();
        assert_eq!(store.meta.version, SCHEMA_VERSION);
        assert_eq!(store.record_count(), 0);
        assert_eq!(store.settings, EngineDefaults::default());
    }

    #[test]
    fn test_create_computes_metrics_from_input() {
        let mut store = MeasurementStore::new();
        let record = store.create(NewRecord::from_input(sample_input(30.0))).unwrap();

        assert_eq!(record.metrics.trees_count, 1);
        assert_eq!(record.metrics.trees_per_ha, 400);
        assert_eq!(record.metrics.density_source, DensitySource::BySpacing);
        assert_eq!(store.get(&record.id).unwrap(), &record);
    }

    #[test]
    fn test_create_keeps_submitted_metrics() {
        let mut store = MeasurementStore::new();
        let submitted = aggregate_plot_metrics(&[], &StandParameters::from_spacing(2.0, 2.0));
        let record = store
            .create(NewRecord {
                metrics: Some(submitted.clone()),
                input_data: Some(sample_input(30.0)),
                plot_reference: None,
            })
            .unwrap();
        assert_eq!(record.metrics, submitted);
    }

    #[test]
    fn test_create_with_empty_trees_is_zero_aggregate() {
        let mut store = MeasurementStore::new();
        let input = MetricsInput::new(vec![], StandParameters::from_spacing(5.0, 5.0));
        let record = store.create(NewRecord::from_input(input)).unwrap();
        assert_eq!(record.metrics.trees_count, 0);
        assert_eq!(record.metrics.trees_per_ha, 400);
    }

    #[test]
    fn test_create_rejects_overflowing_measurement() {
        let mut store = MeasurementStore::new();
        let err = store.create(NewRecord::from_input(sample_input(1e200))).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert_eq!(store.record_count(), 0);
    }

    #[test]
    fn test_create_rejects_negative_height() {
        let mut store = MeasurementStore::new();
        let input = MetricsInput::new(
            vec![TreeObservation::new(30.0, -1.0)],
            StandParameters::from_spacing(5.0, 5.0),
        );
        let err = store.create(NewRecord::from_input(input)).unwrap_err();
        match err {
            MetricsError::InvalidInput { field, .. } => assert_eq!(field, "trees[0].height_m"),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(store.record_count(), 0);
    }

    #[test]
    fn test_create_rejects_non_finite_submitted_metrics() {
        let mut store = MeasurementStore::new();
        let mut metrics = aggregate_plot_metrics(
            &[TreeObservation::new(30.0, 20.0)],
            &StandParameters::from_spacing(5.0, 5.0),
        );
        metrics.biomass_total_tn_per_ha = f64::INFINITY;
        let err = store
            .create(NewRecord { metrics: Some(metrics), ..Default::default() })
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert_eq!(store.record_count(), 0);
    }

    #[test]
    fn test_create_normalizes_record_shaped_metrics() {
        let mut store = MeasurementStore::new();
        let new: NewRecord = serde_json::from_str(
            r#"{
                "plot_reference": "P-3",
                "metrics": {
                    "trees_count": 0,
                    "dap_mean_cm": 0.0,
                    "height_mean_m": 0.0,
                    "dap2_mean": 0.0,
                    "ab_per_tree_m2": 0.0,
                    "ab_per_ha_m2": 0.0,
                    "vol_total_cc_per_ha_m3": 0.0,
                    "vol_total_sc_per_ha_m3": 0.0,
                    "vol_merchantable15_cc_per_ha_m3": 0.0,
                    "vol_merchantable15_sc_per_ha_m3": 0.0,
                    "trees_per_ha": 625.0
                }
            }"#,
        )
        .unwrap();
        let record = store.create(new).unwrap();
        assert_eq!(record.metrics.trees_per_ha, 625);
        assert_eq!(record.metrics.trees_per_ha_by_spacing, 625);
        assert_eq!(record.metrics.density_source, DensitySource::BySpacing);
    }

    #[test]
    fn test_update_rejects_invalid_input_and_keeps_record() {
        let mut store = MeasurementStore::new();
        let record = store.create(NewRecord::from_input(sample_input(20.0))).unwrap();

        let err = store
            .update(
                &record.id,
                RecordUpdate {
                    input_data: Some(sample_input(1e200)),
                    plot_reference: Some("P-9".to_string()),
                    metrics: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert_eq!(store.get(&record.id).unwrap(), &record);
    }

    #[test]
    fn test_update_missing_record() {
        let mut store = MeasurementStore::new();
        let err = store.update(&Uuid::new_v4(), RecordUpdate::default()).unwrap_err();
        assert_eq!(err.error_code(), "RECORD_NOT_FOUND");
    }

    #[test]
    fn test_create_requires_input_or_metrics() {
        let mut store = MeasurementStore::new();
        let err = store.create(NewRecord::default()).unwrap_err();
        assert_eq!(err, MetricsError::missing_field("input_data"));
    }

    #[test]
    fn test_store_settings_apply_to_computed_metrics() {
        let mut store = MeasurementStore::with_settings(EngineDefaults {
            root_ratio: 0.5,
            ..EngineDefaults::default()
        });
        let record = store.create(NewRecord::from_input(sample_input(30.0))).unwrap();
        let expected = aggregate_plot_metrics(
            &[TreeObservation::new(30.0, 20.0)],
            &StandParameters {
                root_ratio: Some(0.5),
                ..StandParameters::from_spacing(5.0, 5.0)
            },
        );
        assert_eq!(record.metrics.biomass_root_tn_per_ha, expected.biomass_root_tn_per_ha);
    }

    #[test]
    fn test_list_newest_first() {
        let mut store = MeasurementStore::new();
        let old = store.create(NewRecord::from_input(sample_input(20.0))).unwrap();
        let mid = store.create(NewRecord::from_input(sample_input(25.0))).unwrap();
        let new = store.create(NewRecord::from_input(sample_input(30.0))).unwrap();

        let base = Utc::now();
        store.records.get_mut(&old.id).unwrap().created_at = base - Duration::days(2);
        store.records.get_mut(&mid.id).unwrap().created_at = base - Duration::days(1);
        store.records.get_mut(&new.id).unwrap().created_at = base;

        let ids: Vec<Uuid> = store.list().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![new.id, mid.id, old.id]);
    }

    #[test]
    fn test_list_for_plot() {
        let mut store = MeasurementStore::new();
        store.create(NewRecord::from_input(sample_input(20.0)).with_plot("A")).unwrap();
        store.create(NewRecord::from_input(sample_input(25.0)).with_plot("B")).unwrap();
        store.create(NewRecord::from_input(sample_input(30.0))).unwrap();

        let for_a = store.list_for_plot("A");
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].plot_reference.as_deref(), Some("A"));
    }

    #[test]
    fn test_update_recomputes_metrics() {
        let mut store = MeasurementStore::new();
        let record = store.create(NewRecord::from_input(sample_input(20.0))).unwrap();

        let updated = store
            .update(
                &record.id,
                RecordUpdate {
                    input_data: Some(sample_input(40.0)),
                    plot_reference: Some("P-7".to_string()),
                    metrics: None,
                },
            )
            .unwrap();

        assert_eq!(updated.metrics.dap_mean_cm, 40.0);
        assert_eq!(updated.plot_reference.as_deref(), Some("P-7"));
        assert_eq!(updated.created_at, record.created_at);
        assert!(updated.updated_at >= record.updated_at);
    }

    #[test]
    fn test_update_plot_reference_only_keeps_metrics() {
        let mut store = MeasurementStore::new();
        let record = store.create(NewRecord::from_input(sample_input(20.0))).unwrap();
        let updated = store
            .update(&record.id, RecordUpdate { plot_reference: Some("Z".into()), ..Default::default() })
            .unwrap();
        assert_eq!(updated.metrics, record.metrics);
        assert_eq!(updated.input_data, record.input_data);
    }

    #[test]
    fn test_delete() {
        let mut store = MeasurementStore::new();
        let record = store.create(NewRecord::from_input(sample_input(20.0))).unwrap();

        let removed = store.delete(&record.id).unwrap();
        assert_eq!(removed.id, record.id);
        assert_eq!(store.record_count(), 0);

        let err = store.delete(&record.id).unwrap_err();
        assert_eq!(err.error_code(), "RECORD_NOT_FOUND");
        assert!(store.get(&record.id).is_err());
    }

    #[test]
    fn test_store_serialization() {
        let mut store = MeasurementStore::new();
        let record = store.create(NewRecord::from_input(sample_input(30.0)).with_plot("P-1")).unwrap();

        let json = serde_json::to_string_pretty(&store).unwrap();
        assert!(json.contains("P-1"));
        assert!(json.contains(SCHEMA_VERSION));

        let roundtrip: MeasurementStore = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.get(&record.id).unwrap().plot_reference.as_deref(), Some("P-1"));
    }
}
