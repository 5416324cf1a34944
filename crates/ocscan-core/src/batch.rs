use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use ocscan_logging::{Logger, ScanEvent};
use ocscan_source::{SessionListing, SessionSource};

use crate::error::ScanError;
use crate::report::{BatchResult, SessionReport};
use crate::scanner::SessionScanner;

/// Scans every listed session, one at a time, in listing order
pub struct BatchDriver<'a> {
    source: &'a dyn SessionSource,
    scanner: SessionScanner,
    logger: Arc<Logger>,
    interrupted: Arc<AtomicBool>,
}

impl<'a> BatchDriver<'a> {
    pub fn new(source: &'a dyn SessionSource, scanner: SessionScanner, logger: Arc<Logger>) -> Self {
        Self {
            source,
            scanner,
            logger,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a handle to signal interruption
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    /// Run the batch. Fails only when the session listing cannot be
    /// obtained; per-session failures are counted and skipped.
    pub async fn run(&self) -> Result<BatchResult, ScanError> {
        self.logger.log(&ScanEvent::ListingStarted);
        let sessions = self.source.list_sessions().await?;
        self.logger.log(&ScanEvent::ListingCompleted {
            sessions: sessions.len(),
        });
        info!(source = self.source.name(), sessions = sessions.len(), "Scanning sessions");

        let mut result = BatchResult {
            listed: sessions.len(),
            ..Default::default()
        };

        for listing in &sessions {
            if self.interrupted.load(Ordering::SeqCst) {
                info!(processed = result.processed, "Batch interrupted by user");
                self.logger.log(&ScanEvent::BatchInterrupted {
                    processed: result.processed,
                });
                result.interrupted = true;
                break;
            }

            let Some(session_id) = listing.id.as_deref() else {
                result.skipped += 1;
                self.logger.log(&ScanEvent::SessionSkipped {
                    reason: "session without ID".to_string(),
                });
                continue;
            };

            result.processed += 1;
            self.logger.log(&ScanEvent::SessionStarted {
                index: result.processed,
                total: sessions.len(),
                session_id: session_id.to_string(),
            });

            match self.scan_session(session_id, listing).await {
                Ok(report) if report.is_match() => {
                    self.log_report(&report);
                    result.reports.push(report);
                }
                Ok(_) => {
                    debug!(session_id, "No matches");
                }
                Err(e @ ScanError::ParseFailed { .. }) => {
                    debug!(session_id, error = %e, "Skipping session");
                    result.parse_failures += 1;
                    self.logger.log(&ScanEvent::ParseFailed {
                        session_id: session_id.to_string(),
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    debug!(session_id, error = %e, "Skipping session");
                    result.fetch_failures += 1;
                    self.logger.log(&ScanEvent::FetchFailed {
                        session_id: session_id.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        self.logger.log(&ScanEvent::BatchCompleted {
            matched: result.reports.len(),
            processed: result.processed,
        });

        Ok(result)
    }

    /// Fetch, parse and scan a single session
    pub async fn scan_session(
        &self,
        session_id: &str,
        listing: &SessionListing,
    ) -> Result<SessionReport, ScanError> {
        let raw = self
            .source
            .fetch_session(session_id)
            .await
            .map_err(|e| ScanError::fetch_failed(session_id, e))?;

        let document: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| ScanError::ParseFailed {
                id: session_id.to_string(),
                reason: e.to_string(),
            })?;

        if document.get("messages").is_none() {
            debug!(session_id, "Session document has no messages");
        }

        Ok(self.scanner.scan(session_id, listing, &document))
    }

    fn log_report(&self, report: &SessionReport) {
        self.logger.log(&ScanEvent::MatchFound {
            session_id: report.session_id.clone(),
            match_count: report.matches.len(),
        });
        for (idx, found) in report.matches.iter().enumerate() {
            self.logger.log(&ScanEvent::MatchDetail {
                index: idx + 1,
                file_path: found.file_path.clone(),
                message_id: found.message_id.clone(),
                jq_path: found.path.render(),
                content: found.content.clone(),
            });
        }
    }
}
