use crate::error::{Result, ScraperError};
use crate::types::PublicationRecord;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Random per-run suffix: a v4 UUID without hyphens.
pub fn generate_run_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Substitute `{venue}` and `{run_id}` into the file name template.
pub fn output_path(output_dir: &Path, template: &str, venue: &str, run_id: &str) -> PathBuf {
    let filename = template
        .replace("{venue}", venue)
        .replace("{run_id}", run_id);
    output_dir.join(filename)
}

/// CSV output for one pipeline run.
///
/// The header goes out on creation and every batch is flushed as soon as it
/// is appended, so an interrupted run leaves a readable prefix on disk.
pub struct CsvRecordWriter {
    path: PathBuf,
    header: &'static [&'static str],
    writer: csv::Writer<File>,
    rows_written: usize,
}

impl CsvRecordWriter {
    pub fn create(path: &Path, header: &'static [&'static str]) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        writer.write_record(header)?;
        writer.flush()?;
        debug!("Created {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            header,
            writer,
            rows_written: 0,
        })
    }

    pub fn append(&mut self, records: &[PublicationRecord]) -> Result<()> {
        for record in records {
            if record.header() != self.header {
                return Err(ScraperError::Output(format!(
                    "record '{}' does not match the header of {}",
                    record.title,
                    self.path.display()
                )));
            }
            self.writer.write_record(record.to_row())?;
            self.rows_written += 1;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
