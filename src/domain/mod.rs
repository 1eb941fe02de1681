pub mod model;

pub use self::model::{CellValue, ColumnMap, DataType, Feature, Geometry, RawRow, Role};
