mod state;
mod ui;

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::projects::{self, ProjectPayload};
use crate::status::{StatusPoller, POLL_INTERVAL_MS};
use crate::upload::{SelectedFile, UploadController, UploadTransport};
use eframe::{egui, App};
use state::{ManageState, ProcessingState, ProjectsState, Toast, ToastKind, View, TOAST_TTL};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::info;

pub struct VxmlConsole {
    api: ApiClient,
    view: View,
    projects: ProjectsState,
    manage: ManageState,
    processing: ProcessingState,
    uploader: UploadController,
    poller: StatusPoller,
    toasts: Vec<Toast>,
}

impl VxmlConsole {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        info!(base_url = %config.base_url, "initializing VXML console");
        let token = config.bearer_token.clone();
        let api = ApiClient::new(config.base_url, Arc::new(move || token.clone()));
        Self {
            view: View::Projects,
            projects: ProjectsState::new(api.clone()),
            manage: ManageState::new(api.clone()),
            processing: ProcessingState::new(api.clone()),
            uploader: UploadController::new(UploadTransport::new(api.clone())),
            poller: StatusPoller::new(api.clone()),
            api,
            toasts: Vec::new(),
        }
    }

    /// View switch doubles as unmount/mount: per-view state is rebuilt
    /// fresh and the poller only runs while the status page is shown.
    pub fn set_view(&mut self, view: View) {
        if self.view == view {
            return;
        }
        if self.view == View::Status {
            self.poller.stop();
        }
        match view {
            View::Projects => self.projects = ProjectsState::new(self.api.clone()),
            View::Manage => self.manage = ManageState::new(self.api.clone()),
            View::Processing => {
                self.uploader.cancel();
                self.uploader.set_project(None);
                self.processing = ProcessingState::new(self.api.clone());
            }
            View::Status => self.poller.start(Duration::from_millis(POLL_INTERVAL_MS)),
        }
        self.view = view;
    }

    /// Jump from the projects overview straight into data processing with
    /// the clicked project preselected.
    pub fn open_project(&mut self, key: String) {
        self.set_view(View::Processing);
        self.uploader.set_project(Some(key));
    }

    pub fn toast(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.toasts.push(Toast {
            message: message.into(),
            kind,
            raised_at: Instant::now(),
        });
    }

    pub fn pick_upload_file(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("VXML uploads", &["zip", "vxml"])
            .pick_file()
        else {
            return;
        };
        match SelectedFile::from_path(path) {
            Ok(file) => self.uploader.select_file(file),
            Err(e) => self.toast(ToastKind::Error, format!("Could not read file: {e}")),
        }
    }

    pub fn submit_project_form(&mut self) {
        let payload = match projects::validate_form(&self.manage.name_input, &self.manage.db_config_input)
        {
            Ok(payload) => payload,
            Err(errors) => {
                self.manage.form_errors = errors;
                return;
            }
        };
        self.manage.form_errors = Default::default();
        self.manage.submitting = true;
        self.spawn_project_op(payload, self.manage.editing.clone());
    }

    fn spawn_project_op(&mut self, payload: ProjectPayload, editing: Option<String>) {
        let (tx, rx) = channel();
        self.manage.op_rx = Some(rx);
        let api = self.api.clone();
        std::thread::spawn(move || {
            let rt = Runtime::new().expect("tokio runtime");
            let outcome = rt.block_on(async {
                match editing {
                    Some(key) => projects::update_project(&api, &key, &payload)
                        .await
                        .map(|_| "Project updated"),
                    None => projects::create_project(&api, &payload)
                        .await
                        .map(|_| "Project created"),
                }
            });
            tx.send(outcome.map_err(op_error_message)).unwrap_or_default();
        });
    }

    /// First click arms the confirmation, the second one deletes.
    pub fn request_delete(&mut self, key: String) {
        if self.manage.delete_confirm.as_deref() != Some(key.as_str()) {
            self.manage.delete_confirm = Some(key);
            return;
        }
        self.manage.delete_confirm = None;
        self.manage.submitting = true;
        let (tx, rx) = channel();
        self.manage.op_rx = Some(rx);
        let api = self.api.clone();
        std::thread::spawn(move || {
            let rt = Runtime::new().expect("tokio runtime");
            let outcome = rt.block_on(async {
                projects::delete_project(&api, &key)
                    .await
                    .map(|_| "Project deleted")
            });
            tx.send(outcome.map_err(op_error_message)).unwrap_or_default();
        });
    }

    fn update_state(&mut self, ctx: &egui::Context) {
        // keep frames coming while background work resolves
        ctx.request_repaint_after(Duration::from_millis(200));

        self.toasts.retain(|t| t.raised_at.elapsed() < TOAST_TTL);

        self.projects.directory.poll();
        self.manage.directory.poll();
        self.processing.directory.poll();
        self.poller.tick(Instant::now());

        if let Some(done) = self.uploader.poll() {
            self.processing.files.push(done);
            self.processing.modal_open = false;
            self.uploader.cancel();
            self.toast(ToastKind::Success, "Upload queued");
        }

        let outcome = self
            .manage
            .op_rx
            .as_ref()
            .and_then(|rx| rx.try_recv().ok());
        if let Some(outcome) = outcome {
            self.manage.op_rx = None;
            self.manage.submitting = false;
            match outcome {
                Ok(message) => {
                    self.manage.close_modal();
                    // re-mount the list so it reflects the change
                    self.manage.directory = crate::projects::ProjectDirectory::new(self.api.clone());
                    self.manage.directory.load();
                    self.toast(ToastKind::Success, message);
                }
                Err(message) => self.toast(ToastKind::Error, message),
            }
        }
    }
}

fn op_error_message(err: crate::api::ApiError) -> String {
    match err {
        crate::api::ApiError::Status {
            detail: Some(detail),
            ..
        } => detail,
        _ => "Operation failed".to_string(),
    }
}

impl App for VxmlConsole {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
