pub mod cli;

pub use self::cli::CliConfig;

/// Ingestion options as seen by the pipeline wiring, independent of where
/// they came from.
pub trait IngestOptions {
    fn input_path(&self) -> &str;
    fn strict(&self) -> bool;
    fn row_limit(&self) -> Option<usize>;
    fn report_path(&self) -> Option<&str>;
}
