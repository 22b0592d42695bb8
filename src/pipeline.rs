use crate::config::Config;
use crate::error::Result;
use crate::output::{generate_run_id, output_path, CsvRecordWriter};
use crate::types::PublicationSource;
use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};

/// Result of a complete pipeline run
#[derive(Debug)]
pub struct PipelineResult {
    pub venue: String,
    pub units_processed: usize,
    pub units_skipped: usize,
    pub records_written: usize,
    pub errors: Vec<String>,
    pub output_file: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct Pipeline;

impl Pipeline {
    /// Run one source end to end into a freshly named CSV file.
    pub async fn run(source: &dyn PublicationSource, config: &Config) -> Result<PipelineResult> {
        let path = output_path(
            &config.output_dir,
            &config.output_path_template,
            source.venue(),
            &generate_run_id(),
        );
        let mut writer = CsvRecordWriter::create(&path, source.header())?;
        Self::run_with_writer(source, &mut writer).await
    }

    /// Drive the unit loop: resolve units, collect each one in order, and
    /// append its rows before moving on.
    #[instrument(skip(source, writer), fields(venue = %source.venue()))]
    pub async fn run_with_writer(
        source: &dyn PublicationSource,
        writer: &mut CsvRecordWriter,
    ) -> Result<PipelineResult> {
        let venue = source.venue().to_string();
        let started_at = Utc::now();
        info!("🚀 Starting pipeline for {}", venue);
        println!("🚀 Starting pipeline for {}", venue);

        let mut errors = Vec::new();
        let mut units_processed = 0;
        let mut units_skipped = 0;

        let units = match source.work_units().await {
            Ok(units) => units,
            Err(e) => {
                error!("Failed to resolve work for {}: {}", venue, e);
                println!("❌ Failed to retrieve the parent page: {}", e);
                errors.push(e.to_string());
                Vec::new()
            }
        };
        info!("📡 {} units to process", units.len());

        for unit in &units {
            println!("📡 {} ({})", unit.label, unit.year);
            match source.collect(unit).await {
                Ok(records) => {
                    writer.append(&records)?;
                    units_processed += 1;
                    info!(
                        year = %unit.year,
                        records = records.len(),
                        "✅ Wrote records for {}",
                        unit.label
                    );
                }
                Err(e) => {
                    units_skipped += 1;
                    warn!("Skipping {}: {}", unit.label, e);
                    errors.push(format!("{}: {}", unit.label, e));
                }
            }
        }

        let output_file = writer.path().to_string_lossy().to_string();
        info!("💾 Data has been written to {}", output_file);

        Ok(PipelineResult {
            venue,
            units_processed,
            units_skipped,
            records_written: writer.rows_written(),
            errors,
            output_file,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
