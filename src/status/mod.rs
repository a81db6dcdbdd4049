use crate::api::{ApiClient, ApiError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{info, warn};

pub const POLL_INTERVAL_MS: u64 = 30_000;

const FETCH_ERROR_MESSAGE: &str = "Failed to load jobs";

/// Server-owned processing record, mirrored for display only. The status
/// string is free-form; the client never infers transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "upload_id")]
    pub id: String,
    pub filename: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Badge color for the well-known server statuses; anything unrecognized
/// renders neutral.
pub fn status_color_hex(status: &str) -> &'static str {
    match status {
        "queued" => "#17a2b8",
        "processing" => "#ffc107",
        "completed" => "#28a745",
        "failed" => "#dc3545",
        _ => "#6c757d",
    }
}

struct FetchOutcome {
    seq: u64,
    result: Result<Vec<Job>, ApiError>,
}

/// Keeps a display-ready job list fresh via interval polling and manual
/// refresh. Fetches are tagged with a sequence number at issue time and an
/// outcome only applies if it is the newest seen, so a stale response can
/// never overwrite a fresher one. The list is always replaced wholesale; a
/// failed fetch keeps the last good list and sets an error message.
pub struct StatusPoller {
    api: ApiClient,
    jobs: Vec<Job>,
    error: Option<String>,
    pending: usize,
    next_seq: u64,
    applied_seq: u64,
    interval: Option<Duration>,
    last_fetch: Option<Instant>,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
}

impl StatusPoller {
    pub fn new(api: ApiClient) -> Self {
        let (tx, rx) = channel();
        Self {
            api,
            jobs: Vec::new(),
            error: None,
            pending: 0,
            next_seq: 0,
            applied_seq: 0,
            interval: None,
            last_fetch: None,
            tx,
            rx,
        }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn loading(&self) -> bool {
        self.pending > 0
    }

    pub fn is_polling(&self) -> bool {
        self.interval.is_some()
    }

    /// Immediate fetch, then a repeating fetch every `interval`.
    pub fn start(&mut self, interval: Duration) {
        info!(interval_ms = interval.as_millis() as u64, "status polling started");
        self.interval = Some(interval);
        self.fetch_now();
    }

    /// Cancels the schedule; must be called on teardown so nothing fetches
    /// after the consumer is gone. Outstanding responses are still drained
    /// (and de-duplicated by sequence) if the poller is reused.
    pub fn stop(&mut self) {
        if self.interval.take().is_some() {
            info!("status polling stopped");
        }
    }

    /// Manual refresh. The UI disables its refresh control while `loading`
    /// is true; the interval timer keeps firing regardless.
    pub fn fetch_now(&mut self) {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.pending += 1;
        self.last_fetch = Some(Instant::now());

        let api = self.api.clone();
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let rt = Runtime::new().expect("tokio runtime");
            let result = rt.block_on(async { api.get_json::<Vec<Job>>("/uploads").await });
            tx.send(FetchOutcome { seq, result }).unwrap_or_default();
        });
    }

    /// Frame driver: drains finished fetches and fires the interval when due.
    pub fn tick(&mut self, now: Instant) {
        self.drain();
        if let Some(every) = self.interval {
            let due = self
                .last_fetch
                .map_or(true, |at| now.duration_since(at) >= every);
            if due {
                self.fetch_now();
            }
        }
    }

    fn drain(&mut self) {
        while let Ok(outcome) = self.rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            if outcome.seq <= self.applied_seq {
                // a newer fetch already resolved
                continue;
            }
            self.applied_seq = outcome.seq;
            match outcome.result {
                Ok(jobs) => {
                    self.jobs = jobs;
                    self.error = None;
                }
                Err(err) => {
                    warn!(%err, "job list fetch failed");
                    self.error = Some(FETCH_ERROR_MESSAGE.to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn poller() -> StatusPoller {
        StatusPoller::new(ApiClient::with_static_token("http://127.0.0.1:9", "test"))
    }

    fn job(id: &str, status: &str) -> Job {
        Job {
            id: id.to_string(),
            filename: format!("{id}.zip"),
            status: status.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn newer_outcome_replaces_the_list_wholesale() {
        let mut p = poller();
        p.pending = 2;
        p.tx.send(FetchOutcome {
            seq: 1,
            result: Ok(vec![job("1", "queued"), job("2", "queued")]),
        })
        .unwrap();
        p.drain();
        assert_eq!(p.jobs().len(), 2);

        p.tx.send(FetchOutcome {
            seq: 2,
            result: Ok(vec![job("1", "completed")]),
        })
        .unwrap();
        p.drain();
        assert_eq!(p.jobs().len(), 1);
        assert_eq!(p.jobs()[0].status, "completed");
        assert!(!p.loading());
    }

    #[test]
    fn stale_outcome_is_discarded() {
        let mut p = poller();
        p.pending = 2;
        p.tx.send(FetchOutcome {
            seq: 2,
            result: Ok(vec![job("1", "completed")]),
        })
        .unwrap();
        p.drain();

        // the slower, older fetch resolves afterwards
        p.tx.send(FetchOutcome {
            seq: 1,
            result: Ok(vec![job("1", "queued")]),
        })
        .unwrap();
        p.drain();
        assert_eq!(p.jobs()[0].status, "completed");
    }

    #[test]
    fn failure_sets_error_and_keeps_previous_list() {
        let mut p = poller();
        p.pending = 2;
        p.tx.send(FetchOutcome {
            seq: 1,
            result: Ok(vec![job("1", "queued")]),
        })
        .unwrap();
        p.drain();

        p.tx.send(FetchOutcome {
            seq: 2,
            result: Err(ApiError::Transport("connection refused".into())),
        })
        .unwrap();
        p.drain();
        assert_eq!(p.error(), Some(FETCH_ERROR_MESSAGE));
        assert_eq!(p.jobs().len(), 1);

        // a later success clears the message
        p.pending = 1;
        p.tx.send(FetchOutcome {
            seq: 3,
            result: Ok(vec![]),
        })
        .unwrap();
        p.drain();
        assert_eq!(p.error(), None);
        assert!(p.jobs().is_empty());
    }

    #[test]
    fn stale_success_cannot_clear_a_newer_failure() {
        let mut p = poller();
        p.pending = 2;
        p.tx.send(FetchOutcome {
            seq: 2,
            result: Err(ApiError::Transport("timeout".into())),
        })
        .unwrap();
        p.tx.send(FetchOutcome {
            seq: 1,
            result: Ok(vec![job("1", "queued")]),
        })
        .unwrap();
        p.drain();
        assert_eq!(p.error(), Some(FETCH_ERROR_MESSAGE));
        assert!(p.jobs().is_empty());
    }

    #[test]
    fn stop_clears_the_schedule() {
        let mut p = poller();
        p.interval = Some(Duration::from_millis(50));
        p.stop();
        assert!(!p.is_polling());
        let seq_before = p.next_seq;
        p.tick(Instant::now());
        assert_eq!(p.next_seq, seq_before);
    }

    #[test]
    fn unknown_status_renders_neutral() {
        assert_eq!(status_color_hex("completed"), "#28a745");
        assert_eq!(status_color_hex("archived"), "#6c757d");
    }

    #[test]
    fn job_decodes_the_wire_shape() {
        let payload = serde_json::json!({
            "upload_id": "abc",
            "filename": "menu.vxml",
            "status": "processing",
            "created_at": "2026-08-01T10:00:00Z",
            "updated_at": "2026-08-01T10:05:00Z"
        });
        let decoded: Job = serde_json::from_value(payload).unwrap();
        assert_eq!(decoded.id, "abc");
        assert_eq!(decoded.status, "processing");
    }
}
