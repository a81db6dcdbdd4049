use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Extensions the server accepts, matched case-insensitively on the suffix.
pub const ALLOWED_EXTENSIONS: [&str; 2] = [".zip", ".vxml"];

pub fn is_allowed_file(name: &str) -> bool {
    let lowered = name.to_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext))
}

/// Display label derived from the extension, e.g. "report.zip" -> "ZIP".
pub fn file_type_label(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_uppercase(),
        _ => "UNKNOWN".to_string(),
    }
}

pub(crate) fn mime_hint_for(name: &str) -> &'static str {
    let lowered = name.to_lowercase();
    if lowered.ends_with(".zip") {
        "application/zip"
    } else if lowered.ends_with(".vxml") {
        "text/xml"
    } else {
        "application/octet-stream"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub mime_hint: &'static str,
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let size = std::fs::metadata(&path)?.len();
        let mime_hint = mime_hint_for(&name);
        Ok(Self {
            path,
            name,
            size,
            mime_hint,
        })
    }

    pub fn type_label(&self) -> String {
        file_type_label(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
    pub percentage: u8,
}

impl UploadProgress {
    /// `percentage = round(loaded * 100 / total)`, clamped to 0..=100.
    /// An unknown total reports zero percent rather than dividing.
    pub fn new(loaded: u64, total: u64) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            (((loaded as f64) * 100.0 / (total as f64)).round() as u64).min(100) as u8
        };
        Self {
            loaded,
            total,
            percentage,
        }
    }

    pub fn start(total: u64) -> Self {
        Self::new(0, total)
    }

    pub fn fraction(&self) -> f32 {
        f32::from(self.percentage) / 100.0
    }
}

/// Summary handed to the consumer once an upload succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedUpload {
    pub file_name: String,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub size: u64,
    pub job_id: String,
}

/// Raw transport outcome. The adapter reports what happened on the wire;
/// classification into user-facing errors is the controller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    Status { status: u16, detail: Option<String> },
    Network(String),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("Please select a file to upload.")]
    NoFileSelected,

    #[error("Please select a project first.")]
    NoProjectSelected,

    #[error("Invalid file type. Only .zip and .vxml files are allowed.")]
    InvalidFileType,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("File is too large. Please select a smaller file.")]
    TooLarge,

    #[error("Upload cancelled by user.")]
    Cancelled,

    #[error("Upload failed. Please try again.")]
    Transport(String),
}

impl UploadError {
    pub fn classify(failure: UploadFailure) -> Self {
        match failure {
            UploadFailure::Status {
                status: 400,
                detail,
            } => UploadError::InvalidRequest(detail.unwrap_or_else(|| {
                "Invalid request. Please check your file and try again.".to_string()
            })),
            UploadFailure::Status { status: 413, .. } => UploadError::TooLarge,
            UploadFailure::Status { status, .. } => {
                UploadError::Transport(format!("server returned {status}"))
            }
            UploadFailure::Network(detail) => UploadError::Transport(detail),
            UploadFailure::Cancelled => UploadError::Cancelled,
        }
    }

    /// Recoverable failures get a retry affordance; cancellation and
    /// validation rejections do not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UploadError::InvalidRequest(_) | UploadError::TooLarge | UploadError::Transport(_)
        )
    }
}

/// One tagged value instead of independent `uploading`/`loading`/`error`
/// flags: progress only exists while uploading, a job id only once
/// succeeded, an attempt error only once failed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    Selected,
    Uploading(UploadProgress),
    Succeeded(CompletedUpload),
    Failed(UploadError),
    Cancelled,
}

impl UploadPhase {
    pub fn is_uploading(&self) -> bool {
        matches!(self, UploadPhase::Uploading(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadPhase::Succeeded(_) | UploadPhase::Failed(_) | UploadPhase::Cancelled
        )
    }
}
