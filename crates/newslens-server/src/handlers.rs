//! HTTP request handlers for the analysis service.
//!
//! Implements the welcome, health check and article analysis endpoints
//! using axum.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use newslens_analyzer::{Analyzer, InputError};
use newslens_content::{ContentError, FileKind};
use newslens_domain::{AnalysisRepository, AnalysisResult, NewAnalysisRecord, ObjectStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Multipart field carrying raw article text
pub const TEXT_FIELD: &str = "text_content";
/// Multipart field carrying an uploaded file
pub const FILE_FIELD: &str = "file_upload";

const WELCOME_MESSAGE: &str = "Welcome to the AI News Analyzer Backend!";
const NO_INPUT_MESSAGE: &str =
    "No input provided. Please provide 'text_content' or upload a 'file_upload'.";
const MISSING_FILENAME_MESSAGE: &str = "Uploaded file is missing a filename.";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Article analyzer
    pub analyzer: Arc<Analyzer>,
    /// Upload storage, when configured
    pub object_store: Option<Arc<dyn ObjectStore>>,
    /// Record persistence, when configured
    pub repository: Option<Arc<dyn AnalysisRepository>>,
    /// Request body limit for `/analyze`
    pub max_upload_bytes: usize,
}

/// Welcome response
#[derive(Debug, Serialize, Deserialize)]
pub struct WelcomeResponse {
    /// Greeting
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Always "ok" while the process is serving
    pub status: String,
    /// Whether the completion provider has a credential
    pub llm_configured: bool,
    /// Whether uploads are stored
    pub storage_configured: bool,
    /// Whether results are persisted
    pub database_configured: bool,
}

/// Analysis response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Uploaded file name, when the input was a file
    pub filename: Option<String>,
    /// Storage key of the uploaded file, when it was stored
    pub object_key: Option<String>,
    /// Summary, if one could be produced
    pub summary: Option<String>,
    /// Nationalities, countries and demonyms
    pub nationalities: Vec<String>,
    /// Organizations
    pub organizations: Vec<String>,
    /// People
    pub people: Vec<String>,
}

impl AnalysisResponse {
    fn new(filename: Option<String>, object_key: Option<String>, result: AnalysisResult) -> Self {
        Self {
            filename,
            object_key,
            summary: result.summary,
            nationalities: result.nationalities,
            organizations: result.organizations,
            people: result.people,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub detail: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Article text rejected by validation
    Input(InputError),
    /// Uploaded file could not be turned into text
    Content(ContentError),
    /// Malformed or unreadable multipart body
    Multipart(MultipartError),
    /// Request is missing something or names an unsupported type
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Input(e @ InputError::Empty) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Input(e @ InputError::TooLong(..)) => {
                (StatusCode::PAYLOAD_TOO_LARGE, e.to_string())
            }
            AppError::Content(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Multipart(e) => (e.status(), e.body_text()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        debug!("Request rejected with {}: {}", status, message);

        let body = Json(ErrorResponse { detail: message });
        (status, body).into_response()
    }
}

impl From<InputError> for AppError {
    fn from(e: InputError) -> Self {
        AppError::Input(e)
    }
}

impl From<ContentError> for AppError {
    fn from(e: ContentError) -> Self {
        AppError::Content(e)
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Multipart(e)
    }
}

/// A file part of the analysis form
#[derive(Debug)]
struct UploadedFile {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Fields of the analysis form
#[derive(Debug, Default)]
struct AnalysisForm {
    text: Option<String>,
    file: Option<UploadedFile>,
}

async fn read_form(mut multipart: Multipart) -> Result<AnalysisForm, AppError> {
    let mut form = AnalysisForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(TEXT_FIELD) => form.text = Some(field.text().await?),
            Some(FILE_FIELD) => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                form.file = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes,
                });
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    Ok(form)
}

/// A file that passed the type check and was extracted
struct AcceptedUpload {
    filename: String,
    content_type: String,
    bytes: Bytes,
}

/// Check an uploaded file's type and extract its text
fn accept_file(file: UploadedFile) -> Result<(String, AcceptedUpload), AppError> {
    let filename = file
        .filename
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::BadRequest(MISSING_FILENAME_MESSAGE.to_string()))?;

    let declared_type = file.content_type.unwrap_or_default();
    let by_content_type = FileKind::from_content_type(&declared_type);
    let by_extension = FileKind::from_filename(&filename);

    if by_content_type.is_none() && by_extension.is_none() {
        return Err(AppError::BadRequest(format!(
            "Invalid file content type '{}' for '{}'. Allowed types: .txt, .docx",
            declared_type, filename
        )));
    }

    info!("Processing uploaded file '{}' ({} bytes)", filename, file.bytes.len());
    let text = newslens_content::extract(&filename, &file.bytes)?;

    // Keep the declared type when it is an allowed one, otherwise derive it
    let content_type = match (by_content_type, by_extension) {
        (Some(_), _) => declared_type,
        (None, Some(kind)) => kind.content_type().to_string(),
        (None, None) => FALLBACK_CONTENT_TYPE.to_string(),
    };

    Ok((
        text,
        AcceptedUpload {
            filename,
            content_type,
            bytes: file.bytes,
        },
    ))
}

/// GET / - Welcome message
async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}

/// GET /health - Liveness plus which collaborators are configured
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
        llm_configured: state.analyzer.is_configured(),
        storage_configured: state.object_store.is_some(),
        database_configured: state.repository.is_some(),
    })
}

/// POST /analyze - Analyze raw text or an uploaded `.txt`/`.docx` file
///
/// A file wins over text when both are sent. Storage and persistence run
/// after the analysis and never fail the request.
async fn analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let form = read_form(multipart).await?;

    let (article, upload) = match form.file {
        Some(file) => {
            if form.text.is_some() {
                debug!("Both text and file supplied, using the file");
            }
            let (text, upload) = accept_file(file)?;
            (text, Some(upload))
        }
        None => match form.text {
            Some(text) if !text.is_empty() => {
                info!("Processing text content input");
                (text, None)
            }
            _ => return Err(AppError::BadRequest(NO_INPUT_MESSAGE.to_string())),
        },
    };

    let text = state.analyzer.validate_input(&article)?;
    let result = state.analyzer.analyze(text).await?;

    let object_key = match (&upload, &state.object_store) {
        (Some(upload), Some(store)) => store_upload(store.as_ref(), upload).await,
        _ => None,
    };
    let filename = upload.map(|upload| upload.filename);

    if let Some(repository) = &state.repository {
        let record = NewAnalysisRecord {
            original_filename: filename.clone(),
            object_key: object_key.clone(),
            result: result.clone(),
        };
        persist(Arc::clone(repository), record).await;
    }

    Ok(Json(AnalysisResponse::new(filename, object_key, result)))
}

async fn store_upload(store: &dyn ObjectStore, upload: &AcceptedUpload) -> Option<String> {
    match store
        .put(&upload.bytes, &upload.filename, &upload.content_type)
        .await
    {
        Ok(key) => Some(key),
        Err(e) => {
            warn!("Upload of '{}' not stored: {}", upload.filename, e);
            None
        }
    }
}

async fn persist(repository: Arc<dyn AnalysisRepository>, record: NewAnalysisRecord) {
    match tokio::task::spawn_blocking(move || repository.save(&record)).await {
        Ok(Ok(id)) => info!("Saved analysis record {}", id),
        Ok(Err(e)) => error!("Failed to save analysis record: {}", e),
        Err(e) => error!("Persistence task failed: {}", e),
    }
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    AxumRouter::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/analyze", post(analyze).layer(body_limit))
        .with_state(state)
}
