//! Integration tests for the analysis server

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use newslens_analyzer::{Analyzer, AnalyzerConfig, PromptKind};
use newslens_domain::{
    AnalysisRecord, AnalysisRepository, CollaboratorError, FailureKind, NewAnalysisRecord,
    ObjectStore,
};
use newslens_llm::MockCompletionClient;
use newslens_server::{
    config::ServerConfig,
    handlers::{
        create_router, AnalysisResponse, AppState, ErrorResponse, HealthCheckResponse,
        WelcomeResponse,
    },
};
use newslens_store::{FilesystemObjectStore, SqliteRecordStore, UPLOAD_PREFIX};
use serde::de::DeserializeOwned;
use std::io::{Cursor, Write};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot

const BOUNDARY: &str = "X-NEWSLENS-BOUNDARY";
const DOCX_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Mock that answers all three prompts
fn scripted_client() -> MockCompletionClient {
    let mut client = MockCompletionClient::new("None");
    client.add_response(PromptKind::Summary.answer_cue(), "Leaders met in Geneva.");
    client.add_response(PromptKind::Nationalities.answer_cue(), "German, French, German");
    client.add_response(
        PromptKind::Entities.answer_cue(),
        "Organizations: UN, Greenpeace\nPeople: None",
    );
    client
}

/// Helper to create test application state
fn create_test_state(client: MockCompletionClient) -> AppState {
    AppState {
        analyzer: Arc::new(Analyzer::new(Arc::new(client), AnalyzerConfig::default())),
        object_store: None,
        repository: None,
        max_upload_bytes: 1024 * 1024,
    }
}

/// Builds a multipart/form-data body
#[derive(Default)]
struct Form {
    body: Vec<u8>,
}

impl Form {
    fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn request(mut self) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

async fn json<T: DeserializeOwned>(response: Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Object store that always fails
struct BrokenObjectStore;

#[async_trait]
impl ObjectStore for BrokenObjectStore {
    async fn put(&self, _: &[u8], _: &str, _: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Storage("bucket unavailable".to_string()))
    }
}

/// Repository that always fails
struct BrokenRepository;

impl AnalysisRepository for BrokenRepository {
    fn save(&self, _: &NewAnalysisRecord) -> Result<i64, CollaboratorError> {
        Err(CollaboratorError::Persistence("database is locked".to_string()))
    }

    fn get(&self, _: i64) -> Result<Option<AnalysisRecord>, CollaboratorError> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_root_endpoint() {
    let app = create_router(create_test_state(MockCompletionClient::default()));

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let welcome: WelcomeResponse = json(response).await;
    assert_eq!(welcome.message, "Welcome to the AI News Analyzer Backend!");
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let dir = TempDir::new().unwrap();
    let mut state = create_test_state(MockCompletionClient::default());
    state.object_store = Some(Arc::new(FilesystemObjectStore::new(dir.path())));
    let app = create_router(state);

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthCheckResponse = json(response).await;
    assert_eq!(health.status, "ok");
    assert!(health.llm_configured);
    assert!(health.storage_configured);
    assert!(!health.database_configured);
}

#[tokio::test]
async fn test_analyze_text_content() {
    let app = create_router(create_test_state(scripted_client()));

    let request = Form::default()
        .text("text_content", "French and German leaders met UN officials.")
        .request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let analysis: AnalysisResponse = json(response).await;
    assert_eq!(analysis.filename, None);
    assert_eq!(analysis.object_key, None);
    assert_eq!(analysis.summary.as_deref(), Some("Leaders met in Geneva."));
    assert_eq!(analysis.nationalities, vec!["French", "German"]);
    assert_eq!(analysis.organizations, vec!["Greenpeace", "UN"]);
    assert!(analysis.people.is_empty());
}

#[tokio::test]
async fn test_response_field_names() {
    let app = create_router(create_test_state(MockCompletionClient::new("None")));

    let request = Form::default().text("text_content", "Some article.").request();
    let response = app.oneshot(request).await.unwrap();
    let value: serde_json::Value = json(response).await;

    let object = value.as_object().unwrap();
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        ["filename", "nationalities", "object_key", "organizations", "people", "summary"]
    );
    assert!(object["summary"].is_string());
}

#[tokio::test]
async fn test_degraded_analysis_still_succeeds() {
    let app = create_router(create_test_state(MockCompletionClient::failing(
        FailureKind::NotConfigured,
    )));

    let request = Form::default().text("text_content", "Some article.").request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let analysis: AnalysisResponse = json(response).await;
    assert_eq!(analysis.summary, None);
    assert!(analysis.nationalities.is_empty());
    assert!(analysis.organizations.is_empty());
    assert!(analysis.people.is_empty());
}

#[tokio::test]
async fn test_analyze_txt_upload() {
    let client = scripted_client();
    let app = create_router(create_test_state(client.clone()));

    let request = Form::default()
        .file("file_upload", "story.txt", "text/plain", b"A caf\xe9 in Paris.")
        .request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let analysis: AnalysisResponse = json(response).await;
    assert_eq!(analysis.filename.as_deref(), Some("story.txt"));
    assert!(client.prompts()[0].contains("A café in Paris."));
}

#[tokio::test]
async fn test_analyze_docx_upload() {
    let client = scripted_client();
    let app = create_router(create_test_state(client.clone()));

    let request = Form::default()
        .file("file_upload", "story.docx", DOCX_TYPE, &docx(&["Hello", "", "World"]))
        .request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(client.prompts()[0].contains("Hello\n\nWorld"));
}

#[tokio::test]
async fn test_file_wins_over_text() {
    let client = scripted_client();
    let app = create_router(create_test_state(client.clone()));

    let request = Form::default()
        .text("text_content", "TEXT FIELD CONTENT")
        .file("file_upload", "story.txt", "text/plain", b"FILE CONTENT")
        .request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let prompts = client.prompts();
    assert!(prompts.iter().all(|p| p.contains("FILE CONTENT")));
    assert!(prompts.iter().all(|p| !p.contains("TEXT FIELD CONTENT")));
}

#[tokio::test]
async fn test_upload_is_stored_and_persisted() {
    let dir = TempDir::new().unwrap();
    let objects = Arc::new(FilesystemObjectStore::new(dir.path().join("objects")));
    let records = Arc::new(SqliteRecordStore::new(dir.path().join("records.db")).unwrap());

    let mut state = create_test_state(scripted_client());
    state.object_store = Some(objects.clone());
    state.repository = Some(records.clone());
    let app = create_router(state);

    let request = Form::default()
        .file("file_upload", "Story.TXT", "text/plain", b"Leaders met.")
        .request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let analysis: AnalysisResponse = json(response).await;

    let key = analysis.object_key.expect("upload should be stored");
    assert!(key.starts_with(UPLOAD_PREFIX));
    assert!(key.ends_with(".txt"));
    assert_eq!(objects.read(&key).await.unwrap(), b"Leaders met.");

    assert_eq!(records.count().unwrap(), 1);
    let record = records.get(1).unwrap().expect("record should be persisted");
    assert_eq!(record.original_filename.as_deref(), Some("Story.TXT"));
    assert_eq!(record.object_key.as_deref(), Some(key.as_str()));
    assert_eq!(record.result.summary.as_deref(), Some("Leaders met in Geneva."));
    assert_eq!(record.result.organizations, vec!["Greenpeace", "UN"]);
}

#[tokio::test]
async fn test_text_input_is_persisted_without_upload() {
    let dir = TempDir::new().unwrap();
    let records = Arc::new(SqliteRecordStore::new(":memory:").unwrap());

    let mut state = create_test_state(scripted_client());
    state.object_store = Some(Arc::new(FilesystemObjectStore::new(dir.path())));
    state.repository = Some(records.clone());
    let app = create_router(state);

    let request = Form::default().text("text_content", "Leaders met.").request();
    let analysis: AnalysisResponse = json(app.oneshot(request).await.unwrap()).await;

    assert_eq!(analysis.object_key, None);
    let record = records.get(1).unwrap().unwrap();
    assert_eq!(record.original_filename, None);
    assert_eq!(record.object_key, None);
}

#[tokio::test]
async fn test_collaborator_failures_do_not_fail_request() {
    let mut state = create_test_state(scripted_client());
    state.object_store = Some(Arc::new(BrokenObjectStore));
    state.repository = Some(Arc::new(BrokenRepository));
    let app = create_router(state);

    let request = Form::default()
        .file("file_upload", "story.txt", "text/plain", b"Leaders met.")
        .request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let analysis: AnalysisResponse = json(response).await;
    assert_eq!(analysis.object_key, None);
    assert_eq!(analysis.filename.as_deref(), Some("story.txt"));
    assert_eq!(analysis.summary.as_deref(), Some("Leaders met in Geneva."));
}

#[tokio::test]
async fn test_missing_input() {
    let client = MockCompletionClient::default();
    let app = create_router(create_test_state(client.clone()));

    let response = app.oneshot(Form::default().request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = json(response).await;
    assert!(error.detail.contains("No input provided"));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_whitespace_only_text() {
    let client = MockCompletionClient::default();
    let app = create_router(create_test_state(client.clone()));

    let request = Form::default().text("text_content", " \n\t ").request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = json(response).await;
    assert_eq!(error.detail, "Input text is empty");
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_text_too_long() {
    let client = MockCompletionClient::default();
    let mut state = create_test_state(client.clone());
    state.analyzer = Arc::new(Analyzer::new(
        Arc::new(client.clone()),
        AnalyzerConfig {
            max_text_length: 10,
            ..AnalyzerConfig::default()
        },
    ));
    let app = create_router(state);

    let request = Form::default()
        .text("text_content", "This article is longer than ten characters.")
        .request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_empty_file() {
    let app = create_router(create_test_state(MockCompletionClient::default()));

    let request = Form::default()
        .file("file_upload", "empty.txt", "text/plain", b"")
        .request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = json(response).await;
    assert!(error.detail.contains("empty.txt"));
}

#[tokio::test]
async fn test_unsupported_file_type() {
    let app = create_router(create_test_state(MockCompletionClient::default()));

    let request = Form::default()
        .file("file_upload", "slides.pdf", "application/pdf", b"%PDF-1.7")
        .request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_undecodable_text_file() {
    let app = create_router(create_test_state(MockCompletionClient::default()));

    let request = Form::default()
        .file("file_upload", "quotes.txt", "text/plain", b"\x93quoted\x94")
        .request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = json(response).await;
    assert!(error.detail.contains("quotes.txt"));
    assert!(error.detail.contains("Windows-1252"));
}

#[tokio::test]
async fn test_corrupt_docx() {
    let app = create_router(create_test_state(MockCompletionClient::default()));

    let request = Form::default()
        .file("file_upload", "broken.docx", DOCX_TYPE, b"definitely not a zip")
        .request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = json(response).await;
    assert!(error.detail.contains("broken.docx"));
}

#[tokio::test]
async fn test_body_limit() {
    let mut state = create_test_state(MockCompletionClient::default());
    state.max_upload_bytes = 256;
    let app = create_router(state);

    let request = Form::default()
        .file("file_upload", "big.txt", "text/plain", &vec![b'a'; 4096])
        .request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[test]
fn test_server_config_from_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("newslens.toml");
    std::fs::write(
        &path,
        r#"
        bind_address = "127.0.0.1"
        bind_port = 9100

        [analyzer]
        completion_timeout_secs = 20

        [database]
        path = "records.db"
    "#,
    )
    .unwrap();

    let config = ServerConfig::from_file(&path).unwrap();
    assert_eq!(config.bind_addr(), "127.0.0.1:9100");
    assert_eq!(config.analyzer.completion_timeout_secs, 20);
    assert!(config.database.is_some());
    assert!(config.storage.is_none());
}
