use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use ocscan_logging::{Logger, ScanEvent};
use ocscan_source::{SessionSource, Sink};

use crate::error::ScanError;
use crate::report::SessionReport;

/// Outcome of an export run
#[derive(Debug, Default)]
pub struct ExportSummary {
    /// Files written, in export order
    pub saved: Vec<PathBuf>,
    /// Sessions that could not be re-fetched or written
    pub failures: Vec<ScanError>,
}

impl ExportSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Re-fetches matching sessions and saves the raw documents
pub struct Exporter<'a> {
    source: &'a dyn SessionSource,
    sink: &'a dyn Sink,
    logger: Arc<Logger>,
}

impl<'a> Exporter<'a> {
    pub fn new(source: &'a dyn SessionSource, sink: &'a dyn Sink, logger: Arc<Logger>) -> Self {
        Self {
            source,
            sink,
            logger,
        }
    }

    /// Export every report with at least one match to
    /// `<output_dir>/<session_id>.json`.
    ///
    /// Fails only if `output_dir` cannot be created. Per-session failures are
    /// collected in the summary.
    pub async fn export(
        &self,
        reports: &[SessionReport],
        output_dir: &Path,
    ) -> Result<ExportSummary, ScanError> {
        let pending: Vec<&SessionReport> = reports.iter().filter(|r| r.is_match()).collect();
        let mut summary = ExportSummary::default();
        if pending.is_empty() {
            return Ok(summary);
        }

        if self.sink.ensure_directory(output_dir)? {
            self.logger.log(&ScanEvent::DirectoryCreated {
                path: output_dir.to_path_buf(),
            });
        }

        self.logger.log(&ScanEvent::ExportStarted {
            sessions: pending.len(),
            output_dir: output_dir.to_path_buf(),
        });

        for (idx, report) in pending.iter().enumerate() {
            self.logger.log(&ScanEvent::ExportProgress {
                index: idx + 1,
                total: pending.len(),
                created_at: report.created_at.clone(),
                session_id: report.session_id.clone(),
            });

            match self.export_one(report, output_dir).await {
                Ok((path, bytes)) => {
                    debug!(session_id = %report.session_id, bytes, "Exported session");
                    self.logger.log(&ScanEvent::ExportSaved {
                        path: path.clone(),
                        bytes,
                    });
                    summary.saved.push(path);
                }
                Err(e) => {
                    debug!(session_id = %report.session_id, error = %e, "Export failed");
                    self.logger.log(&ScanEvent::ExportFailed {
                        session_id: report.session_id.clone(),
                        error: e.to_string(),
                    });
                    summary.failures.push(e);
                }
            }
        }

        info!(
            saved = summary.saved.len(),
            failed = summary.failed(),
            "Export finished"
        );
        self.logger.log(&ScanEvent::ExportCompleted {
            saved: summary.saved.len(),
            failed: summary.failed(),
            output_dir: output_dir.to_path_buf(),
        });

        Ok(summary)
    }

    async fn export_one(
        &self,
        report: &SessionReport,
        output_dir: &Path,
    ) -> Result<(PathBuf, usize), ScanError> {
        let destination = destination_for(output_dir, &report.session_id)?;
        let raw = self
            .source
            .fetch_session(&report.session_id)
            .await
            .map_err(|e| ScanError::fetch_failed(&report.session_id, e))?;
        self.sink.write(&destination, raw.as_bytes())?;
        Ok((destination, raw.len()))
    }
}

/// `<output_dir>/<session_id>.json`, refusing ids that would leave the
/// directory
fn destination_for(output_dir: &Path, session_id: &str) -> Result<PathBuf, ScanError> {
    let file_name = format!("{}.json", session_id);
    let unsafe_id = session_id.is_empty()
        || session_id == "."
        || session_id == ".."
        || session_id.contains(['/', '\\']);
    if unsafe_id {
        return Err(ScanError::WriteFailed {
            destination: output_dir.join(&file_name),
            reason: "session id is not a valid file name".to_string(),
        });
    }
    Ok(output_dir.join(file_name))
}
