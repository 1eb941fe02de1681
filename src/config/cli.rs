use crate::config::IngestOptions;
use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extension, validate_non_empty_string, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "geo-ingest")]
#[command(about = "Ingest tabular geographic data into validated features")]
pub struct CliConfig {
    /// CSV file to ingest
    pub input: String,

    #[arg(long, help = "Use the loose row-validation profile")]
    pub loose: bool,

    #[arg(long, help = "Process at most this many rows")]
    pub limit: Option<usize>,

    #[arg(long, help = "Write the full ingestion result as JSON to this path")]
    pub report: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl IngestOptions for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn strict(&self) -> bool {
        !self.loose
    }

    fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    fn report_path(&self) -> Option<&str> {
        self.report.as_deref()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("input", &self.input)?;
        validate_file_extension("input", &self.input, &["csv", "tsv"])?;
        Ok(())
    }
}
