use crate::api::ApiClient;
use crate::upload::types::{SelectedFile, UploadFailure, UploadProgress};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const CHUNK_SIZE: usize = 64 * 1024;

pub type ProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

#[derive(Deserialize)]
struct UploadAccepted {
    job_id: String,
}

/// Wraps the single multipart POST carrying `file` and `project_key`.
/// Reports raw outcomes; see `UploadError::classify` for the mapping.
#[derive(Clone)]
pub struct UploadTransport {
    api: ApiClient,
}

impl UploadTransport {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Issues the upload and resolves to the server-assigned job id.
    /// `on_progress` fires as body chunks are handed to the connection; it
    /// never fires when the total is unknown. Triggering `cancel` before
    /// completion aborts the request and yields `UploadFailure::Cancelled`.
    pub async fn send(
        &self,
        file: &SelectedFile,
        project_key: &str,
        on_progress: ProgressFn,
        cancel: CancellationToken,
    ) -> Result<String, UploadFailure> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| UploadFailure::Network(format!("failed to read {}: {e}", file.name)))?;
        let total = bytes.len() as u64;

        let chunks: Vec<Vec<u8>> = bytes.chunks(CHUNK_SIZE).map(|c| c.to_vec()).collect();
        let sent = Arc::new(AtomicU64::new(0));
        let body_stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            let loaded = sent.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
            if total > 0 {
                on_progress(UploadProgress::new(loaded, total));
            }
            Ok::<Vec<u8>, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(Body::wrap_stream(body_stream), total)
            .file_name(file.name.clone())
            .mime_str(file.mime_hint)
            .map_err(|e| UploadFailure::Network(e.to_string()))?;
        let form = Form::new()
            .text("project_key", project_key.to_string())
            .part("file", part);

        debug!(file = %file.name, size = total, project_key, "sending upload");

        let request = self.api.request(Method::POST, "/upload").multipart(form).send();
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(UploadFailure::Cancelled),
            result = request => result.map_err(|e| UploadFailure::Network(e.to_string()))?,
        };

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body.get("detail")?.as_str().map(str::to_string));
            return Err(UploadFailure::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let accepted: UploadAccepted = response
            .json()
            .await
            .map_err(|e| UploadFailure::Network(format!("invalid upload response: {e}")))?;
        Ok(accepted.job_id)
    }
}
