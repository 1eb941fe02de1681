pub mod detect;
pub mod extract;
pub mod mapping;
pub mod pipeline;
pub mod validate;

pub use crate::domain::model::{CellValue, ColumnMap, DataType, Feature, Geometry, RawRow, Role};
pub use crate::utils::error::Result;
pub use self::pipeline::{IngestOutcome, IngestPipeline};
pub use self::validate::{RuleRegistry, ValidationError, ValidationResult, ValidationWarning};
