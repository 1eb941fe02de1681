//! End-to-end ingestion orchestration.

use crate::core::validate::{RuleRegistry, ValidationResult};
use crate::core::{detect, extract, mapping};
use crate::domain::model::{ColumnMap, DataType, Feature, RawRow};
use crate::utils::error::Result;
use serde::Serialize;

/// Everything one ingestion produces, handed back to the caller in a single
/// immutable package. Address datasets come back with `features: None` and
/// `needs_geocoding: true`; the raw rows ride along for the external
/// geocoder either way.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub features: Option<Vec<Feature>>,
    pub data_type: DataType,
    pub column_map: ColumnMap,
    pub original_columns: Vec<String>,
    pub row_count: usize,
    pub raw_data: Vec<RawRow>,
    pub needs_geocoding: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
}

/// Sequences mapping → type detection → validation → extraction for one
/// request. Owns its rule registry; build one per session and reuse it, or
/// hand each concurrent request its own.
pub struct IngestPipeline {
    registry: RuleRegistry,
    strict: bool,
}

impl Default for IngestPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestPipeline {
    pub fn new() -> Self {
        Self::with_registry(RuleRegistry::with_builtin_rules())
    }

    pub fn with_registry(registry: RuleRegistry) -> Self {
        Self {
            registry,
            strict: true,
        }
    }

    /// Use the loose row-validation profile instead of the strict default.
    pub fn loose(mut self) -> Self {
        self.strict = false;
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Controlled reconfiguration point; not safe to call while a
    /// validation pass on this pipeline is in flight elsewhere.
    pub fn registry_mut(&mut self) -> &mut RuleRegistry {
        &mut self.registry
    }

    /// Run the whole pipeline over already-materialized rows.
    ///
    /// Fails only when no recognizable geometry columns exist; every
    /// row-level problem is recorded in the validation report instead.
    pub fn ingest(&self, headers: &[String], rows: Vec<RawRow>) -> Result<IngestOutcome> {
        let column_map = mapping::detect_mappings(headers);
        tracing::debug!("mapped {} of {} columns", column_map.len(), headers.len());

        let data_type = detect::detect_type(&column_map, headers)?;
        tracing::info!("detected {} dataset with {} rows", data_type, rows.len());

        if data_type == DataType::Address {
            // Extraction is deferred to the external geocoder.
            return Ok(IngestOutcome {
                features: None,
                data_type,
                column_map,
                original_columns: headers.to_vec(),
                row_count: rows.len(),
                raw_data: rows,
                needs_geocoding: true,
                validation: None,
            });
        }

        let validation = if self.strict {
            self.registry.validate_data(&rows, &column_map, data_type)
        } else {
            self.registry
                .validate_csv_data(&rows, &column_map, data_type)
        };
        tracing::info!("{}", validation.summary());

        let features = extract::extract(&rows, &column_map, data_type);

        Ok(IngestOutcome {
            features: Some(features),
            data_type,
            column_map,
            original_columns: headers.to_vec(),
            row_count: rows.len(),
            raw_data: rows,
            needs_geocoding: false,
            validation: Some(validation),
        })
    }
}
