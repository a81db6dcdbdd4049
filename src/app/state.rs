use crate::api::ApiClient;
use crate::projects::{FormErrors, ProjectDirectory};
use crate::upload::CompletedUpload;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

pub const TOAST_TTL: Duration = Duration::from_secs(5);

pub const DEFAULT_DB_CONFIG: &str = "{\n  \"uri\": \"neo4j://localhost:7687\",\n  \"index\": \"\"\n}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Projects,
    Manage,
    Processing,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub raised_at: Instant,
}

/// Outcome of a background CRUD call: the toast message on success, the
/// server detail on failure.
pub type OpOutcome = Result<&'static str, String>;

/// Projects overview: a fresh directory per mount.
pub struct ProjectsState {
    pub directory: ProjectDirectory,
}

impl ProjectsState {
    pub fn new(api: ApiClient) -> Self {
        let mut directory = ProjectDirectory::new(api);
        directory.load();
        Self { directory }
    }
}

/// Project management page: list, modal form, confirm-before-delete.
pub struct ManageState {
    pub directory: ProjectDirectory,
    pub modal_open: bool,
    pub editing: Option<String>,
    pub name_input: String,
    pub db_config_input: String,
    pub form_errors: FormErrors,
    pub submitting: bool,
    pub delete_confirm: Option<String>,
    pub op_rx: Option<Receiver<OpOutcome>>,
}

impl ManageState {
    pub fn new(api: ApiClient) -> Self {
        let mut directory = ProjectDirectory::new(api);
        directory.load();
        Self {
            directory,
            modal_open: false,
            editing: None,
            name_input: String::new(),
            db_config_input: String::new(),
            form_errors: FormErrors::default(),
            submitting: false,
            delete_confirm: None,
            op_rx: None,
        }
    }

    pub fn open_create(&mut self) {
        self.editing = None;
        self.name_input.clear();
        self.db_config_input = DEFAULT_DB_CONFIG.to_string();
        self.form_errors = FormErrors::default();
        self.modal_open = true;
    }

    pub fn open_edit(&mut self, key: &str, name: &str, db_config: &serde_json::Value) {
        self.editing = Some(key.to_string());
        self.name_input = name.to_string();
        self.db_config_input =
            serde_json::to_string_pretty(db_config).unwrap_or_else(|_| "{}".to_string());
        self.form_errors = FormErrors::default();
        self.modal_open = true;
    }

    pub fn close_modal(&mut self) {
        self.modal_open = false;
        self.editing = None;
        self.name_input.clear();
        self.db_config_input.clear();
        self.form_errors = FormErrors::default();
    }
}

/// Data-processing page: project selection feeding the upload controller,
/// plus the uploads acknowledged this mount. Job state lives on the status
/// page; nothing here simulates processing transitions.
pub struct ProcessingState {
    pub directory: ProjectDirectory,
    pub modal_open: bool,
    pub files: Vec<CompletedUpload>,
}

impl ProcessingState {
    pub fn new(api: ApiClient) -> Self {
        let mut directory = ProjectDirectory::new(api);
        directory.load();
        Self {
            directory,
            modal_open: false,
            files: Vec::new(),
        }
    }
}
