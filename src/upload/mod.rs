mod controller;
mod transport;
mod types;

pub use controller::UploadController;
pub use transport::{ProgressFn, UploadTransport};
pub use types::{
    file_type_label, is_allowed_file, CompletedUpload, SelectedFile, UploadError, UploadFailure,
    UploadPhase, UploadProgress, ALLOWED_EXTENSIONS,
};
