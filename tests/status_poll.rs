//! Status list and project directory against a mocked server: replacement
//! semantics, failure handling, and the CRUD round trips.

use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use vxml_console::api::ApiClient;
use vxml_console::projects::{self, ProjectDirectory, ProjectPayload};
use vxml_console::status::StatusPoller;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> ApiClient {
    ApiClient::with_static_token(server.uri(), "test-token")
}

fn job_body(id: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "upload_id": id,
        "filename": format!("{id}.zip"),
        "status": status,
        "created_at": "2026-08-01T10:00:00Z",
        "updated_at": "2026-08-01T10:05:00Z"
    })
}

async fn drive(poller: &mut StatusPoller, done: impl Fn(&StatusPoller) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        poller.tick(std::time::Instant::now());
        if done(poller) {
            return;
        }
        assert!(Instant::now() < deadline, "poller never reached the expected state");
        sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn refresh_replaces_the_list_entirely() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uploads"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([job_body("1", "queued")])),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uploads"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([job_body("1", "completed")])),
        )
        .mount(&server)
        .await;

    let mut poller = StatusPoller::new(api_for(&server));
    poller.fetch_now();
    drive(&mut poller, |p| !p.jobs().is_empty()).await;
    assert_eq!(poller.jobs()[0].status, "queued");

    poller.fetch_now();
    drive(&mut poller, |p| p.jobs()[0].status == "completed").await;
    assert_eq!(poller.jobs().len(), 1);
    assert_eq!(poller.error(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_failure_keeps_the_previous_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uploads"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([job_body("1", "queued")])),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uploads"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut poller = StatusPoller::new(api_for(&server));
    poller.fetch_now();
    drive(&mut poller, |p| !p.jobs().is_empty()).await;

    poller.fetch_now();
    drive(&mut poller, |p| p.error().is_some()).await;
    assert_eq!(poller.error(), Some("Failed to load jobs"));
    assert_eq!(poller.jobs().len(), 1);
    assert_eq!(poller.jobs()[0].status, "queued");
}

#[tokio::test(flavor = "multi_thread")]
async fn start_fetches_immediately_and_loading_clears() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uploads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let mut poller = StatusPoller::new(api_for(&server));
    poller.start(Duration::from_secs(60));
    assert!(poller.loading());
    assert!(poller.is_polling());

    drive(&mut poller, |p| !p.loading()).await;
    assert!(poller.jobs().is_empty());
    assert_eq!(poller.error(), None);

    poller.stop();
    assert!(!poller.is_polling());
}

#[tokio::test(flavor = "multi_thread")]
async fn directory_loads_once_and_reports_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"key": "p1", "name": "Voice KB", "db_config": {"uri": "neo4j://localhost", "index": "kb"}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut directory = ProjectDirectory::new(api_for(&server));
    directory.load();
    let deadline = Instant::now() + Duration::from_secs(5);
    while directory.loading() {
        directory.poll();
        assert!(Instant::now() < deadline);
        sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(directory.projects().len(), 1);
    assert_eq!(directory.project_named("p1").unwrap().name, "Voice KB");

    // load() is once per mount
    directory.load();
    sleep(Duration::from_millis(100)).await;
    directory.poll();
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn directory_failure_sets_a_load_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut directory = ProjectDirectory::new(api_for(&server));
    directory.load();
    let deadline = Instant::now() + Duration::from_secs(5);
    while directory.loading() {
        directory.poll();
        assert!(Instant::now() < deadline);
        sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(directory.error(), Some("Failed to load projects"));
    assert!(directory.projects().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn project_crud_round_trips() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/projects"))
        .and(body_partial_json(serde_json::json!({"name": "Voice KB"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/projects/p1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/projects/p1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let payload = ProjectPayload {
        name: "Voice KB".to_string(),
        db_config: serde_json::json!({"uri": "neo4j://localhost", "index": "kb"}),
    };

    projects::create_project(&api, &payload).await.unwrap();
    projects::update_project(&api, "p1", &payload).await.unwrap();
    projects::delete_project(&api, "p1").await.unwrap();
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn crud_failure_carries_the_server_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "detail": "name already taken"
        })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let payload = ProjectPayload {
        name: "dup".to_string(),
        db_config: serde_json::json!({"uri": "u", "index": "i"}),
    };
    let err = projects::create_project(&api, &payload).await.unwrap_err();
    match err {
        vxml_console::api::ApiError::Status { status, detail } => {
            assert_eq!(status, 400);
            assert_eq!(detail.as_deref(), Some("name already taken"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
