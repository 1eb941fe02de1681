use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(
        "Could not determine data type from columns: [{headers}]. \
         Expected a WKT geometry column, latitude and longitude columns, \
         or address columns (street, city, zip)."
    )]
    UnrecognizedSchema { headers: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

pub type Result<T> = std::result::Result<T, IngestError>;
