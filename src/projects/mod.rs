use crate::api::{self, ApiClient};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::mpsc::{channel, Receiver};
use tokio::runtime::Runtime;
use tracing::warn;

const LOAD_ERROR_MESSAGE: &str = "Failed to load projects";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub db_config: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create/update body: a name plus the database configuration blob the
/// server stores verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectPayload {
    pub name: String,
    pub db_config: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub name: Option<String>,
    pub db_config: Option<String>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.db_config.is_none()
    }
}

fn config_field_present(config: &Value, field: &str) -> bool {
    match config.get(field) {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

/// Validates the project form: name required; db_config must be JSON
/// carrying non-empty `uri` and `index` entries.
pub fn validate_form(name: &str, db_config: &str) -> Result<ProjectPayload, FormErrors> {
    let mut errors = FormErrors::default();

    let name = name.trim();
    if name.is_empty() {
        errors.name = Some("Project name is required".to_string());
    }

    let mut parsed = None;
    match serde_json::from_str::<Value>(db_config) {
        Ok(config) => {
            if !config_field_present(&config, "uri") {
                errors.db_config = Some("Database URI is required in config".to_string());
            }
            if !config_field_present(&config, "index") {
                errors.db_config = Some("Database index is required in config".to_string());
            }
            parsed = Some(config);
        }
        Err(_) => {
            errors.db_config = Some("Invalid JSON format".to_string());
        }
    }

    if errors.is_empty() {
        Ok(ProjectPayload {
            name: name.to_string(),
            db_config: parsed.unwrap_or(Value::Null),
        })
    } else {
        Err(errors)
    }
}

pub async fn fetch_projects(api: &ApiClient) -> api::Result<Vec<Project>> {
    api.get_json("/api/v1/projects").await
}

pub async fn create_project(api: &ApiClient, payload: &ProjectPayload) -> api::Result<()> {
    submit_payload(api, Method::POST, "/api/v1/projects".to_string(), payload).await
}

pub async fn update_project(
    api: &ApiClient,
    key: &str,
    payload: &ProjectPayload,
) -> api::Result<()> {
    submit_payload(api, Method::PUT, format!("/api/v1/projects/{key}"), payload).await
}

pub async fn delete_project(api: &ApiClient, key: &str) -> api::Result<()> {
    api.delete(&format!("/api/v1/projects/{key}")).await
}

async fn submit_payload(
    api: &ApiClient,
    method: Method,
    path: String,
    payload: &ProjectPayload,
) -> api::Result<()> {
    let response = api
        .request(method, &path)
        .json(payload)
        .send()
        .await
        .map_err(|e| api::ApiError::Transport(e.to_string()))?;
    if response.status().is_success() {
        Ok(())
    } else {
        Err(ApiClient::status_error(response).await)
    }
}

/// Loads the selectable project list once per view mount. No refresh, no
/// invalidation; consumers create a fresh instance when they remount.
pub struct ProjectDirectory {
    api: ApiClient,
    projects: Vec<Project>,
    error: Option<String>,
    started: bool,
    rx: Option<Receiver<api::Result<Vec<Project>>>>,
}

impl ProjectDirectory {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            projects: Vec::new(),
            error: None,
            started: false,
            rx: None,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn loading(&self) -> bool {
        self.rx.is_some()
    }

    pub fn project_named(&self, key: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.key == key)
    }

    /// Kicks off the one fetch; later calls are no-ops.
    pub fn load(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let (tx, rx) = channel();
        self.rx = Some(rx);
        let api = self.api.clone();
        std::thread::spawn(move || {
            let rt = Runtime::new().expect("tokio runtime");
            let result = rt.block_on(async { fetch_projects(&api).await });
            tx.send(result).unwrap_or_default();
        });
    }

    pub fn poll(&mut self) {
        let Some(rx) = &self.rx else { return };
        match rx.try_recv() {
            Ok(Ok(projects)) => {
                self.projects = projects;
                self.error = None;
                self.rx = None;
            }
            Ok(Err(err)) => {
                warn!(%err, "project list load failed");
                self.error = Some(LOAD_ERROR_MESSAGE.to_string());
                self.rx = None;
            }
            Err(_) => {}
        }
    }
}
