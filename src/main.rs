use clap::Parser;
use geo_ingest::adapters::csv_reader;
use geo_ingest::utils::{logger, validation::Validate};
use geo_ingest::{CliConfig, IngestOptions, IngestPipeline};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();
    logger::init_cli_logger(config.verbose);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let (headers, mut rows) = csv_reader::read_path(config.input_path())?;
    if let Some(limit) = config.row_limit() {
        rows.truncate(limit);
        tracing::info!("row limit applied, processing {} rows", rows.len());
    }

    let pipeline = if config.strict() {
        IngestPipeline::new()
    } else {
        IngestPipeline::new().loose()
    };

    let outcome = match pipeline.ingest(&headers, rows) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("ingestion failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    if outcome.needs_geocoding {
        println!(
            "📍 Address dataset detected: {} rows need geocoding before they can become features.",
            outcome.row_count
        );
    } else {
        let features = outcome.features.as_ref().map(Vec::len).unwrap_or(0);
        println!(
            "✅ Ingested {} dataset: {} of {} rows extracted as features.",
            outcome.data_type, features, outcome.row_count
        );
        if let Some(validation) = &outcome.validation {
            println!("   {}", validation.summary());
            for line in validation.format_errors() {
                println!("   {}", line);
            }
        }
    }

    if let Some(report_path) = config.report_path() {
        let json = serde_json::to_string_pretty(&outcome)?;
        std::fs::write(report_path, json)?;
        println!("📁 Report written to: {}", report_path);
    }

    Ok(())
}
