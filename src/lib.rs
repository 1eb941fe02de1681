pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::{CliConfig, IngestOptions};
pub use crate::core::pipeline::{IngestOutcome, IngestPipeline};
pub use crate::core::validate::{
    RuleRegistry, ValidationError, ValidationResult, ValidationWarning,
};
pub use crate::domain::model::{CellValue, ColumnMap, DataType, Feature, Geometry, RawRow, Role};
pub use crate::utils::error::{IngestError, Result};
