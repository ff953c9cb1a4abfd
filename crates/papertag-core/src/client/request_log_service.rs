use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PapertagError, Result};
use crate::fs::REQUEST_LOG_FILE;
use crate::jsonl::parse_jsonl_tolerant;
use crate::models::RequestLogEntry;

use super::Papertag;

impl Papertag {
    pub fn list_request_logs(&self, limit: usize) -> Result<Vec<RequestLogEntry>> {
        self.list_request_logs_filtered(limit, None, None)
    }

    /// The newest `limit` entries matching the filters, oldest first. Torn or
    /// malformed lines are skipped.
    pub fn list_request_logs_filtered(
        &self,
        limit: usize,
        operation: Option<&str>,
        status: Option<&str>,
    ) -> Result<Vec<RequestLogEntry>> {
        let Some(raw) = self.fs.read_optional(REQUEST_LOG_FILE)? else {
            return Ok(Vec::new());
        };
        let outcome = parse_jsonl_tolerant::<RequestLogEntry>(&raw);
        if outcome.skipped_lines > 0 {
            debug!(skipped = outcome.skipped_lines, "request log has unreadable lines");
        }
        let mut entries = outcome
            .items
            .into_iter()
            .filter(|entry| operation.is_none_or(|value| entry.operation == value))
            .filter(|entry| status.is_none_or(|value| entry.status == value))
            .collect::<Vec<_>>();
        let keep_from = entries.len().saturating_sub(limit);
        Ok(entries.split_off(keep_from))
    }

    // Runs `op`, then records one request log line: `ok`, `warning` when
    // `warning` returns a message for the output, or `error`.
    pub(super) fn logged<T>(
        &self,
        operation: &str,
        target: Option<String>,
        op: impl FnOnce() -> Result<T>,
        details: impl FnOnce(&T) -> Option<Value>,
        warning: impl FnOnce(&T) -> Option<String>,
    ) -> Result<T> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        match op() {
            Ok(output) => {
                let details = details(&output);
                match warning(&output) {
                    Some(message) => {
                        self.log_request_warning(
                            request_id, operation, started, target, &message, details,
                        );
                    }
                    None => {
                        self.log_request_status(
                            request_id, operation, "ok", started, target, details,
                        );
                    }
                }
                Ok(output)
            }
            Err(err) => {
                self.log_request_error(request_id, operation, started, target, &err);
                Err(err)
            }
        }
    }

    fn try_log_request(&self, entry: &RequestLogEntry) {
        let appended = serde_json::to_string(entry)
            .map_err(PapertagError::from)
            .and_then(|mut line| {
                line.push('\n');
                self.fs.append(REQUEST_LOG_FILE, &line)
            });
        if let Err(err) = appended {
            warn!(
                operation = %entry.operation,
                request_id = %entry.request_id,
                error = %err,
                "failed to append request log entry"
            );
        }
    }

    fn log_request_status(
        &self,
        request_id: String,
        operation: &str,
        status: &str,
        started: Instant,
        target: Option<String>,
        details: Option<Value>,
    ) {
        self.try_log_request(&RequestLogEntry {
            request_id,
            operation: operation.to_string(),
            status: status.to_string(),
            latency_ms: started.elapsed().as_millis(),
            created_at: Utc::now().to_rfc3339(),
            target,
            error_code: None,
            error_message: None,
            details,
        });
    }

    fn log_request_error(
        &self,
        request_id: String,
        operation: &str,
        started: Instant,
        target: Option<String>,
        err: &PapertagError,
    ) {
        let details = err.to_payload(operation, target.clone()).details;
        self.try_log_request(&RequestLogEntry {
            request_id,
            operation: operation.to_string(),
            status: "error".to_string(),
            latency_ms: started.elapsed().as_millis(),
            created_at: Utc::now().to_rfc3339(),
            target,
            error_code: Some(err.code().to_string()),
            error_message: Some(err.to_string()),
            details,
        });
    }

    fn log_request_warning(
        &self,
        request_id: String,
        operation: &str,
        started: Instant,
        target: Option<String>,
        warning_message: &str,
        details: Option<Value>,
    ) {
        self.try_log_request(&RequestLogEntry {
            request_id,
            operation: operation.to_string(),
            status: "warning".to_string(),
            latency_ms: started.elapsed().as_millis(),
            created_at: Utc::now().to_rfc3339(),
            target,
            error_code: None,
            error_message: Some(warning_message.to_string()),
            details,
        });
    }
}
