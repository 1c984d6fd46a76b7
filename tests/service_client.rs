//! `ServiceClient` against an in-process HTTP backend.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use hr_copilot::core::{CandidateApi, ClientError, ServiceClient};
use hr_copilot::types::{CandidateStatus, FilterRequest, Page, ProcessingStatus};
use hr_copilot::upload_validator::UploadValidator;

#[derive(Clone, Default)]
struct Recorded {
    status_bodies: Arc<Mutex<Vec<Value>>>,
    filter_bodies: Arc<Mutex<Vec<Value>>>,
    uploaded: Arc<Mutex<Vec<(String, String, usize)>>>,
    deleted: Arc<Mutex<Vec<i64>>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

fn candidate_json(id: i64, name: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "experience_years": 4,
        "skills": ["Rust", "SQL"],
        "status": status,
        "created_at": "2024-03-01T10:00:00",
        "updated_at": null
    })
}

async fn list_candidates(
    State(recorded): State<Recorded>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    recorded.queries.lock().unwrap().push(query);
    Json(json!([
        candidate_json(1, "Ana", "pending"),
        candidate_json(2, "Bo", "hired")
    ]))
}

async fn get_candidate(Path(id): Path<i64>) -> impl IntoResponse {
    if id == 1 {
        (StatusCode::OK, Json(candidate_json(1, "Ana", "pending")))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Candidate not found" })),
        )
    }
}

async fn delete_candidate(State(recorded): State<Recorded>, Path(id): Path<i64>) -> StatusCode {
    recorded.deleted.lock().unwrap().push(id);
    StatusCode::NO_CONTENT
}

async fn update_status(
    State(recorded): State<Recorded>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let status = body["status"].as_str().unwrap_or("pending").to_string();
    recorded.status_bodies.lock().unwrap().push(body);
    Json(candidate_json(id, "Ana", &status))
}

async fn filter_candidates(
    State(recorded): State<Recorded>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    recorded.queries.lock().unwrap().push(query);
    recorded.filter_bodies.lock().unwrap().push(body.clone());
    Json(json!({
        "candidates": [candidate_json(2, "Bo", "hired")],
        "total_count": 1,
        "filter_criteria": body
    }))
}

async fn upload(State(recorded): State<Recorded>, mut multipart: Multipart) -> Json<Value> {
    let mut names = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap();
        recorded
            .uploaded
            .lock()
            .unwrap()
            .push((field_name, file_name.clone(), bytes.len()));
        names.push(file_name);
    }
    Json(json!({
        "message": format!("Processed {} files", names.len()),
        "uploaded_files": names,
        "failed_files": [],
        "total_processed": names.len()
    }))
}

async fn resume_content(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({
        "id": id,
        "filename": "ana.pdf",
        "processing_status": "completed",
        "raw_text": "Ana - Rust, SQL",
        "extracted_data": { "skills": ["Rust", "SQL"] },
        "candidate_id": 1
    }))
}

async fn download_resume(Path(id): Path<i64>) -> impl IntoResponse {
    if id == 1 {
        (
            StatusCode::OK,
            [("content-type", "application/pdf")],
            b"%PDF-1.4 stored resume".to_vec(),
        )
            .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Only PDF files can be previewed" })),
        )
            .into_response()
    }
}

async fn broken_json() -> &'static str {
    "<html>gateway error</html>"
}

async fn slow_suggestions() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({}))
}

async fn spawn_backend(recorded: Recorded) -> String {
    let app = Router::new()
        .route("/api/candidates/", get(list_candidates))
        .route("/api/candidates/filter", post(filter_candidates))
        .route(
            "/api/candidates/:id",
            get(get_candidate).delete(delete_candidate),
        )
        .route("/api/candidates/:id/status", patch(update_status))
        .route("/api/resumes/upload", post(upload))
        .route("/api/resumes/candidate/:id", get(broken_json))
        .route("/api/resumes/:id/content", get(resume_content))
        .route("/api/resumes/:id/download", get(download_resume))
        .route("/api/filters/suggestions", get(slow_suggestions))
        .with_state(recorded);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api/", addr)
}

async fn client(recorded: Recorded) -> ServiceClient {
    let base_url = spawn_backend(recorded).await;
    ServiceClient::new(&base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn fetch_all_decodes_candidates() {
    let recorded = Recorded::default();
    let client = client(recorded.clone()).await;

    let candidates = client.fetch_all(Page::new(20, 10)).await.unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].name, "Ana");
    assert_eq!(candidates[1].status, CandidateStatus::Hired);
    assert_eq!(candidates[0].skills, vec!["Rust".to_string(), "SQL".to_string()]);
    assert!(candidates[0].created_at.is_some());

    let queries = recorded.queries.lock().unwrap();
    assert_eq!(queries[0]["skip"], "20");
    assert_eq!(queries[0]["limit"], "10");
}

#[tokio::test]
async fn base_url_trailing_slash_is_trimmed() {
    let client = client(Recorded::default()).await;
    assert!(client.base_url().ends_with("/api"));
    assert_eq!(client.get(1).await.unwrap().id, 1);
}

#[tokio::test]
async fn not_found_surfaces_backend_detail() {
    let client = client(Recorded::default()).await;

    match client.get(99).await {
        Err(ClientError::Remote { status, message }) => {
            assert_eq!(status, Some(404));
            assert_eq!(message, "Candidate not found");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn update_status_sends_status_and_notes() {
    let recorded = Recorded::default();
    let client = client(recorded.clone()).await;

    let updated = client
        .update_status(1, CandidateStatus::Interviewed, Some("phone screen done"))
        .await
        .unwrap();
    assert_eq!(updated.status, CandidateStatus::Interviewed);

    let bodies = recorded.status_bodies.lock().unwrap();
    assert_eq!(
        bodies[0],
        json!({ "status": "interviewed", "notes": "phone screen done" })
    );
}

#[tokio::test]
async fn delete_hits_candidate_url() {
    let recorded = Recorded::default();
    let client = client(recorded.clone()).await;

    client.remove(7).await.unwrap();
    assert_eq!(*recorded.deleted.lock().unwrap(), vec![7]);
}

#[tokio::test]
async fn filter_posts_request_body() {
    let recorded = Recorded::default();
    let client = client(recorded.clone()).await;

    let request = FilterRequest {
        skills: vec!["Rust".to_string()],
        status: Some(CandidateStatus::Hired),
        ..Default::default()
    };
    let response = client.filter(&request, Page::default()).await.unwrap();
    assert_eq!(response.total_count, 1);
    assert_eq!(response.candidates[0].id, 2);

    let bodies = recorded.filter_bodies.lock().unwrap();
    assert_eq!(bodies[0]["skills"], json!(["Rust"]));
    assert_eq!(bodies[0]["status"], "hired");

    let queries = recorded.queries.lock().unwrap();
    assert_eq!(queries[0]["skip"], "0");
    assert_eq!(queries[0]["limit"], "100");
}

#[tokio::test]
async fn resume_content_is_decoded() {
    let client = client(Recorded::default()).await;

    let content = client.resume_content(4).await.unwrap();
    assert_eq!(content.id, 4);
    assert_eq!(content.processing_status, ProcessingStatus::Completed);
    assert_eq!(content.raw_text.as_deref(), Some("Ana - Rust, SQL"));
    assert_eq!(content.extracted_data.unwrap()["skills"][0], "Rust");
}

#[tokio::test]
async fn download_returns_raw_bytes() {
    let client = client(Recorded::default()).await;

    let bytes = client.download_resume(1).await.unwrap();
    assert_eq!(bytes, b"%PDF-1.4 stored resume".to_vec());

    match client.download_resume(2).await {
        Err(ClientError::Remote { status, message }) => {
            assert_eq!(status, Some(400));
            assert_eq!(message, "Only PDF files can be previewed");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn upload_sends_one_files_part_per_resume() {
    let recorded = Recorded::default();
    let client = client(recorded.clone()).await;
    let validator = UploadValidator::default();

    let files = vec![
        validator
            .validate_bytes("ana.pdf", b"%PDF-1.4 resume".to_vec())
            .unwrap(),
        validator
            .validate_bytes("bo.docx", b"PK\x03\x04 resume".to_vec())
            .unwrap(),
    ];
    let response = client.upload_resumes(files).await.unwrap();
    assert_eq!(response.total_processed, 2);
    assert_eq!(
        response.uploaded_files,
        vec!["ana.pdf".to_string(), "bo.docx".to_string()]
    );

    let uploaded = recorded.uploaded.lock().unwrap();
    assert_eq!(uploaded.len(), 2);
    assert!(uploaded.iter().all(|(field, _, _)| field == "files"));
    assert_eq!(uploaded[0].1, "ana.pdf");
    assert_eq!(uploaded[0].2, 15);
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let client = client(Recorded::default()).await;

    let err = client.candidate_resumes(1).await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let base_url = spawn_backend(Recorded::default()).await;
    let client = ServiceClient::new(&base_url, Duration::from_millis(200)).unwrap();

    let err = client.suggestions().await.unwrap_err();
    assert!(err.is_timeout(), "got {:?}", err);
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn unreachable_backend_is_a_remote_error_without_status() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ServiceClient::new(&format!("http://{}/api", addr), Duration::from_secs(2)).unwrap();
    let err = client.fetch_all(Page::default()).await.unwrap_err();
    assert!(!err.is_timeout());
    assert_eq!(err.status(), None);
}
