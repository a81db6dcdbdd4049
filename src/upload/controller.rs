use crate::upload::transport::{ProgressFn, UploadTransport};
use crate::upload::types::{
    is_allowed_file, CompletedUpload, SelectedFile, UploadError, UploadFailure, UploadPhase,
    UploadProgress,
};
use chrono::Utc;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

enum UploadEvent {
    Progress {
        attempt: u64,
        progress: UploadProgress,
    },
    Finished {
        attempt: u64,
        outcome: Result<String, UploadFailure>,
    },
}

impl UploadEvent {
    fn attempt(&self) -> u64 {
        match self {
            UploadEvent::Progress { attempt, .. } | UploadEvent::Finished { attempt, .. } => {
                *attempt
            }
        }
    }
}

/// State machine for one upload session: exactly one file, exactly one
/// attempt in flight. A retry starts a fresh attempt over the same
/// file/project; events from older attempts are discarded.
pub struct UploadController {
    transport: UploadTransport,
    phase: UploadPhase,
    file: Option<SelectedFile>,
    project_key: Option<String>,
    notice: Option<UploadError>,
    attempt: u64,
    cancel: Option<CancellationToken>,
    events: Option<Receiver<UploadEvent>>,
}

impl UploadController {
    pub fn new(transport: UploadTransport) -> Self {
        Self {
            transport,
            phase: UploadPhase::Idle,
            file: None,
            project_key: None,
            notice: None,
            attempt: 0,
            cancel: None,
            events: None,
        }
    }

    pub fn phase(&self) -> &UploadPhase {
        &self.phase
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn project_key(&self) -> Option<&str> {
        self.project_key.as_deref()
    }

    pub fn set_project(&mut self, key: Option<String>) {
        self.project_key = key;
    }

    pub fn progress(&self) -> Option<UploadProgress> {
        match &self.phase {
            UploadPhase::Uploading(progress) => Some(*progress),
            _ => None,
        }
    }

    /// The message to surface, validation notice or attempt failure.
    pub fn error(&self) -> Option<UploadError> {
        self.notice.clone().or(match &self.phase {
            UploadPhase::Failed(err) => Some(err.clone()),
            _ => None,
        })
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.phase, UploadPhase::Selected)
    }

    pub fn can_retry(&self) -> bool {
        matches!(&self.phase, UploadPhase::Failed(err) if err.is_retryable()) && self.file.is_some()
    }

    /// Validates the extension; a mismatch clears the selection and records
    /// `InvalidFileType` without leaving a non-selected state.
    pub fn select_file(&mut self, file: SelectedFile) {
        if self.phase.is_uploading() {
            return;
        }
        self.notice = None;
        if !is_allowed_file(&file.name) {
            self.file = None;
            self.phase = UploadPhase::Idle;
            self.notice = Some(UploadError::InvalidFileType);
            return;
        }
        info!(file = %file.name, size = file.size, "file selected");
        self.file = Some(file);
        self.phase = UploadPhase::Selected;
    }

    /// No-op unless the state is exactly `Selected` (prevents duplicate
    /// concurrent uploads); missing file or project surfaces a validation
    /// notice without contacting the transport.
    pub fn submit(&mut self) {
        match self.phase {
            UploadPhase::Selected => {}
            UploadPhase::Idle | UploadPhase::Cancelled => {
                if self.file.is_none() {
                    self.notice = Some(UploadError::NoFileSelected);
                }
                return;
            }
            _ => return,
        }
        match self.project_key.as_deref() {
            Some(key) if !key.is_empty() => {}
            _ => {
                self.notice = Some(UploadError::NoProjectSelected);
                return;
            }
        }
        self.notice = None;
        self.start_attempt();
    }

    /// Aborts the transport when uploading, otherwise a pure local reset;
    /// always ends fully reset in `Idle`.
    pub fn cancel(&mut self) {
        if let Some(token) = self.cancel.take() {
            info!("upload cancelled");
            token.cancel();
        }
        self.events = None;
        self.file = None;
        self.notice = None;
        self.phase = UploadPhase::Idle;
    }

    /// Clears the failure and re-submits the same file/project:
    /// `Failed -> Uploading` directly.
    pub fn retry(&mut self) {
        if !self.can_retry() {
            return;
        }
        info!("retrying upload");
        self.notice = None;
        self.start_attempt();
    }

    /// Drains worker events; returns the completion summary the moment an
    /// attempt succeeds. Call once per frame.
    pub fn poll(&mut self) -> Option<CompletedUpload> {
        let mut batch = Vec::new();
        if let Some(events) = &self.events {
            while let Ok(event) = events.try_recv() {
                batch.push(event);
            }
        }
        let mut completed = None;
        for event in batch {
            if let Some(summary) = self.apply(event) {
                completed = Some(summary);
            }
        }
        completed
    }

    fn start_attempt(&mut self) {
        let Some(file) = self.file.clone() else {
            self.notice = Some(UploadError::NoFileSelected);
            return;
        };
        let project_key = self.project_key.clone().unwrap_or_default();

        self.attempt += 1;
        let attempt = self.attempt;
        let (tx, rx) = channel();
        self.events = Some(rx);
        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        self.phase = UploadPhase::Uploading(UploadProgress::start(file.size));

        info!(file = %file.name, %project_key, attempt, "starting upload");

        let transport = self.transport.clone();
        let progress_tx = tx.clone();
        std::thread::spawn(move || {
            let rt = Runtime::new().expect("tokio runtime");
            rt.block_on(async {
                let on_progress: ProgressFn = Arc::new(move |progress| {
                    progress_tx
                        .send(UploadEvent::Progress { attempt, progress })
                        .unwrap_or_default();
                });
                let outcome = transport.send(&file, &project_key, on_progress, token).await;
                tx.send(UploadEvent::Finished { attempt, outcome })
                    .unwrap_or_default();
            });
        });
    }

    /// Events are dropped unless they belong to the current attempt and the
    /// controller is still uploading; a response arriving after a cancel or
    /// a fresh attempt must not alter displayed state.
    fn apply(&mut self, event: UploadEvent) -> Option<CompletedUpload> {
        if event.attempt() != self.attempt || !self.phase.is_uploading() {
            return None;
        }
        match event {
            UploadEvent::Progress { progress, .. } => {
                if let UploadPhase::Uploading(current) = &self.phase {
                    // progress never moves backwards within one attempt
                    if progress.loaded >= current.loaded {
                        self.phase = UploadPhase::Uploading(progress);
                    }
                }
                None
            }
            UploadEvent::Finished { outcome, .. } => {
                self.cancel = None;
                self.events = None;
                match outcome {
                    Ok(job_id) => {
                        let file = self.file.as_ref()?;
                        let summary = CompletedUpload {
                            file_name: file.name.clone(),
                            file_type: file.type_label(),
                            uploaded_at: Utc::now(),
                            size: file.size,
                            job_id,
                        };
                        info!(job_id = %summary.job_id, "upload succeeded");
                        self.phase = UploadPhase::Succeeded(summary.clone());
                        Some(summary)
                    }
                    Err(failure) => {
                        let error = UploadError::classify(failure);
                        warn!(%error, "upload failed");
                        self.phase = UploadPhase::Failed(error);
                        None
                    }
                }
            }
        }
    }
}
