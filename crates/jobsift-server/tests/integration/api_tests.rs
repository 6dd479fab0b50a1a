use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use jobsift_core::error::FetchError;
use jobsift_core::run::Portal;
use jobsift_core::testutil::{MockProvider, raw_item_value};

use crate::integration::common::{TestApp, setup_test_app};

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn authed(app: &TestApp, request: axum::http::request::Builder) -> axum::http::request::Builder {
    request.header("authorization", format!("Bearer {}", app.token))
}

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app(MockProvider::succeeding(vec![]));

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"], "ok");
}

#[tokio::test]
async fn unauthenticated_request_returns_401() {
    let app = setup_test_app(MockProvider::succeeding(vec![]));

    let response = app
        .router
        .oneshot(Request::get("/v1/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_returns_401() {
    let app = setup_test_app(MockProvider::succeeding(vec![]));

    let response = app
        .router
        .oneshot(
            Request::get("/v1/jobs")
                .header("authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sync_accepts_and_completes_in_background() {
    let app = setup_test_app(MockProvider::succeeding(vec![raw_item_value(
        "Rust Engineer",
        "https://www.linkedin.com/jobs/view/rust-engineer-555",
        "Acme",
    )]));

    let request = authed(&app, Request::post("/v1/job-fetcher/sync"))
        .header("content-type", "application/json")
        .body(Body::from(r#"{"title": "Rust Engineer", "rows": 10}"#))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "started");
    let run_id = json["run_id"].as_str().unwrap().to_string();

    // Drain the background pipeline, then read the finalized run back.
    app.state.orchestrator.shutdown().await;

    let request = authed(&app, Request::get("/v1/job-fetcher/runs"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["runs"][0]["id"], run_id.as_str());
    assert_eq!(json["runs"][0]["status"], "completed");
    assert_eq!(json["runs"][0]["jobs_found"], 1);
    assert_eq!(json["runs"][0]["new_jobs_added"], 1);
}

#[tokio::test]
async fn sync_rejects_out_of_range_rows() {
    let app = setup_test_app(MockProvider::succeeding(vec![]));

    let request = authed(&app, Request::post("/v1/job-fetcher/sync"))
        .header("content-type", "application/json")
        .body(Body::from(r#"{"rows": 500}"#))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "validation_error");
    assert!(app.state.runs.runs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn sync_rejects_unknown_portal() {
    let app = setup_test_app(MockProvider::succeeding(vec![]));

    let request = authed(&app, Request::post("/v1/job-fetcher/sync"))
        .header("content-type", "application/json")
        .body(Body::from(r#"{"portal": "monster"}"#))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dataset_ingest_reports_dedup_counts() {
    let provider = MockProvider::succeeding(vec![]).with_dataset_items(vec![
        raw_item_value(
            "Backend Engineer",
            "https://www.linkedin.com/jobs/view/backend-engineer-777",
            "Globex",
        ),
        raw_item_value(
            "Data Engineer",
            "https://www.linkedin.com/jobs/view/data-engineer-778",
            "Initech",
        ),
    ]);
    let app = setup_test_app(provider);
    // One of the two items already exists for this owner.
    app.state.jobs.seed(app.owner, Portal::Linkedin, "777");

    let request = authed(
        &app,
        Request::post("/v1/job-fetcher/sync-from-dataset?dataset_id=ds-1"),
    )
    .body(Body::empty())
    .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "completed");
    assert_eq!(json["jobs_found"], 2);
    assert_eq!(json["new_jobs_added"], 1);
    assert_eq!(app.state.jobs.record_count(), 2);
}

#[tokio::test]
async fn dataset_ingest_provider_failure_returns_502() {
    let provider =
        MockProvider::with_dataset_error(FetchError::ProviderUnavailable("down".into()));
    let app = setup_test_app(provider);

    let request = authed(
        &app,
        Request::post("/v1/job-fetcher/sync-from-dataset?dataset_id=ds-1"),
    )
    .body(Body::empty())
    .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    // The failure is still captured on a run record.
    let runs = app.state.runs.runs.lock().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status.to_string(), "failed");
}

#[tokio::test]
async fn list_jobs_rejects_unknown_sort_column() {
    let app = setup_test_app(MockProvider::succeeding(vec![]));

    let request = authed(&app, Request::get("/v1/jobs?sort=id%3B%20DROP%20TABLE"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "validation_error");
}

#[tokio::test]
async fn get_missing_job_returns_404() {
    let app = setup_test_app(MockProvider::succeeding(vec![]));

    let request = authed(
        &app,
        Request::get(format!("/v1/jobs/{}", uuid::Uuid::new_v4())),
    )
    .body(Body::empty())
    .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn job_listing_and_status_update_flow() {
    let provider = MockProvider::succeeding(vec![]).with_dataset_items(vec![raw_item_value(
        "Platform Engineer",
        "https://www.linkedin.com/jobs/view/platform-engineer-900",
        "Acme",
    )]);
    let app = setup_test_app(provider);

    let request = authed(
        &app,
        Request::post("/v1/job-fetcher/sync-from-dataset?dataset_id=ds-2"),
    )
    .body(Body::empty())
    .unwrap();
    app.router.clone().oneshot(request).await.unwrap();

    let request = authed(&app, Request::get("/v1/jobs?q=platform"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    let job = &json["jobs"][0];
    assert_eq!(job["status"], "new");
    assert_eq!(job["external_job_id"], "900");
    let job_id = job["id"].as_str().unwrap().to_string();

    let request = authed(&app, Request::put(format!("/v1/jobs/{job_id}/status")))
        .header("content-type", "application/json")
        .body(Body::from(r#"{"status": "reviewed"}"#))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "reviewed");
}

#[tokio::test]
async fn status_update_rejects_non_settable_values() {
    let provider = MockProvider::succeeding(vec![]).with_dataset_items(vec![raw_item_value(
        "Analyst",
        "https://www.linkedin.com/jobs/view/analyst-901",
        "Acme",
    )]);
    let app = setup_test_app(provider);

    let request = authed(
        &app,
        Request::post("/v1/job-fetcher/sync-from-dataset?dataset_id=ds-3"),
    )
    .body(Body::empty())
    .unwrap();
    app.router.clone().oneshot(request).await.unwrap();

    let job_id = app.state.jobs.jobs.lock().unwrap()[0].id;

    for bad in ["applied", "expired", "new", "archived"] {
        let request = authed(&app, Request::put(format!("/v1/jobs/{job_id}/status")))
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"status": "{bad}"}}"#)))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "status {bad}");
    }

    // No mutation went through.
    let status = app.state.jobs.jobs.lock().unwrap()[0].status;
    assert_eq!(status.to_string(), "new");
}

#[tokio::test]
async fn status_update_on_missing_job_returns_404() {
    let app = setup_test_app(MockProvider::succeeding(vec![]));

    let request = authed(
        &app,
        Request::put(format!("/v1/jobs/{}/status", uuid::Uuid::new_v4())),
    )
    .header("content-type", "application/json")
    .body(Body::from(r#"{"status": "queued"}"#))
    .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
