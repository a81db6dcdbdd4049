use super::state::{ToastKind, View};
use super::VxmlConsole;
use crate::projects::Project;
use crate::status::status_color_hex;
use crate::utils::color::ColorExt;
use crate::utils::file_size::format_size;
use chrono::{DateTime, Local, Utc};
use eframe::egui::{self, Align2, Color32, RichText};

const SUCCESS: &str = "#28a745";
const DANGER: &str = "#dc3545";
const MUTED: &str = "#6c757d";

fn local_timestamp(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn error_box(ui: &mut egui::Ui, message: &str) {
    egui::Frame::none()
        .fill(Color32::from_rgb(248, 215, 218))
        .inner_margin(10.0)
        .rounding(4.0)
        .show(ui, |ui| {
            ui.colored_label(Color32::from_rgb(114, 28, 36), message);
        });
}

fn status_badge(ui: &mut egui::Ui, status: &str) {
    ui.colored_label(Color32::from_hex_or_gray(status_color_hex(status)), status);
}

impl VxmlConsole {
    pub fn render(&mut self, ctx: &egui::Context) {
        self.render_nav(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| match self.view {
                View::Projects => self.render_projects(ui),
                View::Manage => self.render_manage(ui),
                View::Processing => self.render_processing(ui),
                View::Status => self.render_status(ui),
            });
        });

        if self.manage.modal_open {
            self.render_project_modal(ctx);
        }
        if self.processing.modal_open {
            self.render_upload_modal(ctx);
        }
        self.render_toasts(ctx);
    }

    fn render_nav(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("nav").default_width(180.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("VXML Console");
            ui.add_space(20.0);
            if ui.selectable_label(self.view == View::Projects, "📁 Projects").clicked() {
                self.set_view(View::Projects);
            }
            if ui
                .selectable_label(self.view == View::Manage, "🔧 Project Management")
                .clicked()
            {
                self.set_view(View::Manage);
            }
            if ui
                .selectable_label(self.view == View::Status, "📊 My Uploads")
                .clicked()
            {
                self.set_view(View::Status);
            }
        });
    }

    fn render_projects(&mut self, ui: &mut egui::Ui) {
        ui.add_space(10.0);
        ui.heading("Projects");
        ui.label(
            RichText::new("Manage and access your data processing projects")
                .color(Color32::from_hex_or_gray(MUTED)),
        );
        ui.add_space(15.0);

        if ui.button("➕ New Project").clicked() {
            self.set_view(View::Manage);
            self.manage.open_create();
            return;
        }
        ui.add_space(15.0);

        if let Some(error) = self.projects.directory.error() {
            error_box(ui, error);
            return;
        }
        if self.projects.directory.loading() {
            ui.label("Loading projects...");
            return;
        }

        let projects: Vec<Project> = self.projects.directory.projects().to_vec();
        if projects.is_empty() {
            ui.add_space(30.0);
            ui.vertical_centered(|ui| {
                ui.label(RichText::new("No projects yet").heading().color(Color32::from_hex_or_gray(MUTED)));
                ui.label("Create your first project to start managing configurations");
            });
            return;
        }

        for project in &projects {
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.label(RichText::new(project.name.as_str()).strong());
                        ui.label(
                            RichText::new(format!("key: {}", project.key))
                                .monospace()
                                .color(Color32::from_hex_or_gray(MUTED)),
                        );
                        if let Some(description) = &project.description {
                            ui.label(description);
                        }
                    });
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Open ▶").clicked() {
                            self.open_project(project.key.clone());
                        }
                    });
                });
            });
            ui.add_space(6.0);
        }
    }

    fn render_manage(&mut self, ui: &mut egui::Ui) {
        ui.add_space(10.0);
        ui.heading("Project Management");
        ui.label(
            RichText::new("Manage project configurations and database settings")
                .color(Color32::from_hex_or_gray(MUTED)),
        );
        ui.add_space(15.0);

        if ui.button("➕ New Project").clicked() {
            self.manage.open_create();
        }
        ui.add_space(15.0);

        if let Some(error) = self.manage.directory.error() {
            error_box(ui, error);
            return;
        }
        if self.manage.directory.loading() {
            ui.label("Loading projects...");
            return;
        }

        let projects: Vec<Project> = self.manage.directory.projects().to_vec();
        if projects.is_empty() {
            ui.label("No projects yet");
            return;
        }

        egui::Grid::new("projects-table")
            .num_columns(4)
            .striped(true)
            .spacing([20.0, 8.0])
            .show(ui, |ui| {
                ui.label(RichText::new("Key").strong());
                ui.label(RichText::new("Name").strong());
                ui.label(RichText::new("DB Config").strong());
                ui.label(RichText::new("Actions").strong());
                ui.end_row();

                for project in &projects {
                    ui.label(RichText::new(project.key.as_str()).monospace());
                    ui.label(&project.name);
                    let preview = serde_json::to_string(&project.db_config)
                        .unwrap_or_else(|_| "{}".to_string());
                    ui.label(RichText::new(preview).monospace().small());
                    ui.horizontal(|ui| {
                        if ui.button("Edit").clicked() {
                            self.manage.open_edit(&project.key, &project.name, &project.db_config);
                        }
                        let confirming =
                            self.manage.delete_confirm.as_deref() == Some(project.key.as_str());
                        let delete_label = if confirming { "Confirm Delete" } else { "Delete" };
                        if ui
                            .button(RichText::new(delete_label).color(Color32::from_hex_or_gray(DANGER)))
                            .clicked()
                        {
                            self.request_delete(project.key.clone());
                        }
                        if confirming && ui.button("Cancel").clicked() {
                            self.manage.delete_confirm = None;
                        }
                    });
                    ui.end_row();
                }
            });
    }

    fn render_project_modal(&mut self, ctx: &egui::Context) {
        let title = if self.manage.editing.is_some() {
            "Edit Project"
        } else {
            "Create New Project"
        };
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.set_width(420.0);

                ui.label(RichText::new("Project Name").strong());
                ui.text_edit_singleline(&mut self.manage.name_input);
                if let Some(error) = &self.manage.form_errors.name {
                    ui.colored_label(Color32::from_hex_or_gray(DANGER), error);
                }
                ui.add_space(10.0);

                ui.label(RichText::new("Database Configuration (JSON)").strong());
                ui.add(
                    egui::TextEdit::multiline(&mut self.manage.db_config_input)
                        .font(egui::TextStyle::Monospace)
                        .desired_rows(8)
                        .desired_width(f32::INFINITY),
                );
                if let Some(error) = &self.manage.form_errors.db_config {
                    ui.colored_label(Color32::from_hex_or_gray(DANGER), error);
                }
                ui.add_space(15.0);

                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        self.manage.close_modal();
                    }
                    let save_label = if self.manage.submitting {
                        "Saving..."
                    } else if self.manage.editing.is_some() {
                        "Update Project"
                    } else {
                        "Create Project"
                    };
                    if ui
                        .add_enabled(!self.manage.submitting, egui::Button::new(save_label))
                        .clicked()
                    {
                        self.submit_project_form();
                    }
                });
            });
    }

    fn render_processing(&mut self, ui: &mut egui::Ui) {
        ui.add_space(10.0);
        let mut back = false;
        ui.horizontal(|ui| {
            back = ui.button("⬅ Projects").clicked();
        });
        if back {
            self.set_view(View::Projects);
            return;
        }
        ui.add_space(5.0);

        let project_name = self
            .uploader
            .project_key()
            .and_then(|key| self.processing.directory.project_named(key))
            .map(|p| p.name.clone());
        match &project_name {
            Some(name) => ui.heading(format!("{name} - Data Processing")),
            None => ui.heading("Data Processing"),
        };
        ui.label(
            RichText::new("Upload and process your files for this project")
                .color(Color32::from_hex_or_gray(MUTED)),
        );
        ui.add_space(15.0);

        if let Some(error) = self.processing.directory.error() {
            error_box(ui, error);
        }

        // project selector fed by the per-mount directory
        let options: Vec<(String, String)> = self
            .processing
            .directory
            .projects()
            .iter()
            .map(|p| (p.key.clone(), p.name.clone()))
            .collect();
        let selected_label = self
            .uploader
            .project_key()
            .map(|k| {
                options
                    .iter()
                    .find(|(key, _)| key == k)
                    .map(|(_, name)| name.clone())
                    .unwrap_or_else(|| k.to_string())
            })
            .unwrap_or_else(|| "Select a project".to_string());
        let mut picked = None;
        ui.horizontal(|ui| {
            ui.label("Project:");
            egui::ComboBox::from_id_source("project-select")
                .selected_text(selected_label)
                .show_ui(ui, |ui| {
                    for (key, name) in &options {
                        let selected = self.uploader.project_key() == Some(key.as_str());
                        if ui.selectable_label(selected, name).clicked() {
                            picked = Some(key.clone());
                        }
                    }
                });
        });
        if let Some(key) = picked {
            self.uploader.set_project(Some(key));
        }
        ui.add_space(15.0);

        ui.group(|ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(10.0);
                ui.heading("📤 Upload Files");
                ui.label("Upload .zip or .vxml files to process for your project");
                ui.add_space(10.0);
                if ui.button("Choose File to Upload").clicked() {
                    self.processing.modal_open = true;
                }
                ui.add_space(10.0);
            });
        });

        if !self.processing.files.is_empty() {
            ui.add_space(15.0);
            ui.label(RichText::new("Uploaded Files").strong());
            ui.add_space(5.0);
            let files = self.processing.files.clone();
            for file in &files {
                ui.group(|ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(file.file_name.as_str()).strong());
                        ui.colored_label(Color32::from_hex_or_gray("#17a2b8"), "Uploaded");
                    });
                    ui.label(
                        RichText::new(format!(
                            "Type: {} | Size: {} | Job: {} | {}",
                            file.file_type,
                            format_size(file.size),
                            file.job_id,
                            local_timestamp(&file.uploaded_at),
                        ))
                        .small()
                        .color(Color32::from_hex_or_gray(MUTED)),
                    );
                });
                ui.add_space(4.0);
            }
            ui.add_space(5.0);
            ui.label(
                RichText::new("Job progress is tracked on the My Uploads page.")
                    .small()
                    .color(Color32::from_hex_or_gray(MUTED)),
            );
        }
    }

    fn render_upload_modal(&mut self, ctx: &egui::Context) {
        egui::Window::new("Upload File")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.set_width(420.0);

                ui.label(RichText::new("Select File (.zip or .vxml only)").strong());
                ui.label(
                    RichText::new("Only one file can be uploaded at a time.")
                        .small()
                        .color(Color32::from_hex_or_gray(MUTED)),
                );
                ui.add_space(8.0);

                let uploading = self.uploader.phase().is_uploading();
                if ui
                    .add_enabled(!uploading, egui::Button::new("📁 Choose File"))
                    .clicked()
                {
                    self.pick_upload_file();
                }

                if let Some(file) = self.uploader.selected() {
                    ui.add_space(8.0);
                    ui.group(|ui| {
                        ui.label(format!("File: {}", file.name));
                        ui.label(format!("Size: {}", format_size(file.size)));
                        ui.label(format!("Type: {}", file.type_label()));
                    });
                }

                if let Some(progress) = self.uploader.progress() {
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        ui.label("Upload Progress");
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(format!("{}%", progress.percentage));
                        });
                    });
                    let bar_color = if progress.percentage == 100 { SUCCESS } else { "#007bff" };
                    ui.add(
                        egui::ProgressBar::new(progress.fraction())
                            .fill(Color32::from_hex_or_gray(bar_color)),
                    );
                }

                if let Some(error) = self.uploader.error() {
                    ui.add_space(8.0);
                    error_box(ui, &error.to_string());
                }

                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        // aborts any in-flight request and fully resets
                        self.uploader.cancel();
                        self.processing.modal_open = false;
                    }
                    if self.uploader.can_retry() && ui.button("Retry").clicked() {
                        self.uploader.retry();
                    }
                    let upload_label = if uploading { "Uploading..." } else { "Upload" };
                    if ui
                        .add_enabled(self.uploader.can_submit(), egui::Button::new(upload_label))
                        .clicked()
                    {
                        self.uploader.submit();
                    }
                });
            });
    }

    fn render_status(&mut self, ui: &mut egui::Ui) {
        ui.add_space(10.0);
        ui.heading("My Uploads");
        ui.add_space(10.0);

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!self.poller.loading(), egui::Button::new("🔄 Refresh"))
                .clicked()
            {
                self.poller.fetch_now();
            }
            if self.poller.loading() {
                ui.label("Loading...");
            }
        });
        ui.add_space(10.0);

        if let Some(error) = self.poller.error() {
            error_box(ui, error);
            ui.add_space(10.0);
        }

        let jobs = self.poller.jobs().to_vec();
        egui::Grid::new("jobs-table")
            .num_columns(5)
            .striped(true)
            .spacing([24.0, 8.0])
            .show(ui, |ui| {
                ui.label(RichText::new("ID").strong());
                ui.label(RichText::new("Filename").strong());
                ui.label(RichText::new("Status").strong());
                ui.label(RichText::new("Created").strong());
                ui.label(RichText::new("Updated").strong());
                ui.end_row();

                for job in &jobs {
                    ui.label(RichText::new(job.id.as_str()).monospace());
                    ui.label(&job.filename);
                    status_badge(ui, &job.status);
                    ui.label(local_timestamp(&job.created_at));
                    ui.label(local_timestamp(&job.updated_at));
                    ui.end_row();
                }
            });
        if jobs.is_empty() {
            ui.add_space(10.0);
            ui.vertical_centered(|ui| {
                ui.label(RichText::new("No uploads found").color(Color32::from_hex_or_gray(MUTED)));
            });
        }
    }

    fn render_toasts(&mut self, ctx: &egui::Context) {
        for (index, toast) in self.toasts.iter().enumerate() {
            let fill = match toast.kind {
                ToastKind::Success => Color32::from_hex_or_gray(SUCCESS),
                ToastKind::Error => Color32::from_hex_or_gray(DANGER),
            };
            egui::Window::new(format!("toast-{index}"))
                .title_bar(false)
                .resizable(false)
                .anchor(Align2::RIGHT_TOP, [-16.0, 16.0 + 52.0 * index as f32])
                .frame(egui::Frame::none().fill(fill).inner_margin(12.0).rounding(4.0))
                .show(ctx, |ui| {
                    ui.colored_label(Color32::WHITE, &toast.message);
                });
        }
    }
}

