//! BAA Document Viewer Service
//!
//! Uploads a PDF, scans it for the configured terms, summarizes every match
//! and serves highlight positions for the page the browser is showing.

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use baa_models::{
    Chunk, DocumentHandle, DocumentInfo, Fragment, HighlightSet, MatchRecord, RenderedPage,
    SearchStatus, SearchTerms,
};
use baa_scanner::{term_chunks, PageAction, PipelineOptions, SearchPipeline, ViewerState};
use baa_utils::{
    init_logging, validate_file_type, validate_model, validate_pdf_upload, AppConfig, BaaError, ErrorResponse,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

mod gemini_client;
mod pdf_processor;
mod sessions;

use gemini_client::GeminiClient;
use pdf_processor::PdfProcessor;
use sessions::SessionRegistry;

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(error: BaaError) -> ApiError {
    let status = StatusCode::from_u16(error.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(error)))
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
    pub config: Arc<AppConfig>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({}), using defaults", e);
        AppConfig::default()
    });

    init_logging(&config.logging)?;
    info!("Starting BAA Document Viewer Service");

    let extractor = PdfProcessor::new(Duration::from_secs(config.server.timeout_seconds))?;
    let summarizer = GeminiClient::new(&config.summarizer)?;
    let pipeline = SearchPipeline::new(
        Arc::new(extractor),
        Arc::new(summarizer),
        PipelineOptions::from(&config.summarizer),
    );

    let sessions = SessionRegistry::new(
        pipeline,
        Duration::from_millis(config.search.highlight_deferral_ms),
    );

    spawn_idle_eviction(
        sessions.clone(),
        Duration::from_secs(config.server.session_idle_seconds),
    );

    let app = create_app(AppState {
        sessions,
        config: Arc::new(config.clone()),
    });

    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    let listener = TcpListener::bind(&addr).await?;
    info!("Document Viewer Service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drops sessions the browser has abandoned.
fn spawn_idle_eviction(sessions: SessionRegistry, idle: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval((idle / 4).max(Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            let evicted = sessions.evict_idle(idle).await;
            if evicted > 0 {
                let remaining = sessions.len().await;
                info!(evicted, remaining, "Evicted idle sessions");
            }
        }
    });
}

fn create_app(state: AppState) -> Router {
    // leave headroom for the multipart envelope around the file itself
    let body_limit = state.config.server.max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/sessions", post(create_session))
        .route("/api/v1/sessions/:id", get(get_session).delete(close_session))
        .route("/api/v1/sessions/:id/document", post(upload_document))
        .route("/api/v1/sessions/:id/select", post(select_result))
        .route("/api/v1/sessions/:id/page", post(change_page))
        .route("/api/v1/sessions/:id/rendered", post(report_rendered))
        .route("/api/v1/sessions/:id/highlights", get(get_highlights))
        .route("/api/v1/sessions/:id/export", get(export_results))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST, Method::DELETE])
                        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
                )
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "document-viewer",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: Uuid,
}

async fn create_session(State(state): State<AppState>) -> Json<SessionCreatedResponse> {
    let session_id = state.sessions.create().await;
    Json(SessionCreatedResponse { session_id })
}

async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.sessions.remove(id).await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// A result as listed in the sidebar, with its context split for marking.
#[derive(Debug, Serialize)]
pub struct ResultView {
    pub index: usize,
    pub page: u32,
    pub term: String,
    pub context: String,
    pub summary: String,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub generation: u64,
    pub status: SearchStatus,
    pub document: Option<DocumentInfo>,
    pub terms: SearchTerms,
    pub page_count: Option<u32>,
    pub current_page: u32,
    pub selected: Option<usize>,
    pub results: Vec<ResultView>,
}

impl From<ViewerState> for SessionResponse {
    fn from(state: ViewerState) -> Self {
        let results = state
            .results()
            .iter()
            .enumerate()
            .map(|(index, record)| ResultView {
                index,
                page: record.page(),
                term: record.term().to_string(),
                context: record.context().to_string(),
                summary: record.summary().to_string(),
                chunks: term_chunks(record.context(), state.terms().as_slice()),
            })
            .collect();

        Self {
            generation: state.generation(),
            status: state.status().clone(),
            document: state.document().cloned(),
            terms: state.terms().clone(),
            page_count: state.page_count(),
            current_page: state.current_page(),
            selected: state.selected_index(),
            results,
        }
    }
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SessionResponse> {
    let session = state.sessions.get(id).await.map_err(api_error)?;
    Ok(Json(SessionResponse::from(session.snapshot().await)))
}

#[derive(Debug, Serialize)]
pub struct DocumentUploadResponse {
    pub document_id: Uuid,
    pub filename: String,
    /// Unknown until a `url` document has been fetched.
    pub size_bytes: Option<usize>,
    pub generation: u64,
    pub terms: SearchTerms,
    pub status: String,
}

/// Upload a PDF and start searching it
///
/// Multipart fields: `file` or `url` (one is required; `file` wins when both
/// are sent) and `terms` (optional, `|`-separated).
async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<DocumentUploadResponse> {
    let session = state.sessions.get(id).await.map_err(api_error)?;
    let search = &state.config.search;

    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut url_field: Option<String> = None;
    let mut terms_field: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(BaaError::validation("upload", format!("Upload error: {}", e))))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("terms") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| api_error(BaaError::validation("terms", e.to_string())))?;
                terms_field = Some(text);
            }
            Some("url") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| api_error(BaaError::validation("url", e.to_string())))?;
                url_field = Some(text.trim().to_string());
            }
            _ => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown.pdf".to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| api_error(BaaError::validation("file", format!("Read error: {}", e))))?;
                file = Some((filename, content_type, data.to_vec()));
            }
        }
    }

    let (document, size_bytes) = match (file, url_field) {
        (Some((filename, content_type, data)), _) => {
            validate_pdf_upload(
                &filename,
                content_type.as_deref(),
                data.len() as u64,
                state.config.server.max_upload_bytes as u64,
            )
            .map_err(api_error)?;

            let size_bytes = data.len();
            (DocumentHandle::inline(filename, data), Some(size_bytes))
        }
        (None, Some(url)) => {
            let filename = remote_file_name(&url)
                .ok_or_else(|| api_error(BaaError::validation("url", "Expected an http(s) URL of a PDF")))?;
            validate_file_type(&filename, &["pdf"])
                .map_err(|_| api_error(BaaError::validation("url", "Please link a PDF file")))?;

            (DocumentHandle::url(filename, url), None)
        }
        (None, None) => return Err(api_error(BaaError::validation("file", "No file provided"))),
    };

    let terms = match terms_field {
        Some(raw) => SearchTerms::parse(&raw, &search.term_separator),
        None => SearchTerms::from_list(&search.default_terms),
    };

    let document_id = document.id;
    let filename = document.file_name.clone();

    // the search runs in the background; clients poll the session snapshot
    let (generation, _task) = session.load_document(document, terms.clone()).await;

    Ok(Json(DocumentUploadResponse {
        document_id,
        filename,
        size_bytes,
        generation,
        terms,
        status: "searching".to_string(),
    }))
}

/// Last path segment of an http(s) URL, ignoring query and fragment.
fn remote_file_name(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let path = rest.split(['?', '#']).next().unwrap_or_default();
    let (_, segment) = path.rsplit_once('/')?;

    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub index: usize,
}

#[derive(Debug, Serialize)]
pub struct SelectResponse {
    pub index: usize,
    pub current_page: u32,
    pub record: MatchRecord,
}

async fn select_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectRequest>,
) -> ApiResult<SelectResponse> {
    let session = state.sessions.get(id).await.map_err(api_error)?;
    let record = session.select(request.index).await.map_err(api_error)?;

    Ok(Json(SelectResponse {
        index: request.index,
        current_page: record.page(),
        record,
    }))
}

#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub current_page: u32,
}

async fn change_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(action): Json<PageAction>,
) -> ApiResult<PageResponse> {
    let session = state.sessions.get(id).await.map_err(api_error)?;
    let current_page = session.navigate(action).await.map_err(api_error)?;
    Ok(Json(PageResponse { current_page }))
}

/// Renderer notification for the page now on screen.
#[derive(Debug, Deserialize, Validate)]
pub struct RenderedRequest {
    #[validate(range(min = 1))]
    pub page: u32,
    /// Total pages, once the renderer knows it.
    #[validate(range(min = 1))]
    pub page_count: Option<u32>,
    pub fragments: Vec<String>,
}

async fn report_rendered(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RenderedRequest>,
) -> Result<StatusCode, ApiError> {
    validate_model(&request).map_err(api_error)?;
    let session = state.sessions.get(id).await.map_err(api_error)?;

    if let Some(page_count) = request.page_count {
        session.set_page_count(page_count).await;
    }

    let fragments = request
        .fragments
        .into_iter()
        .enumerate()
        .map(|(index, text)| Fragment { index, text })
        .collect();
    session.report_rendered(RenderedPage {
        page: request.page,
        fragments,
    });

    Ok(StatusCode::ACCEPTED)
}

#[derive(Debug, Serialize)]
pub struct HighlightResponse {
    pub ready: bool,
    #[serde(flatten)]
    pub highlights: HighlightSet,
}

async fn get_highlights(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<HighlightResponse> {
    let session = state.sessions.get(id).await.map_err(api_error)?;

    match session.highlights().await {
        Ok(highlights) => Ok(Json(HighlightResponse {
            ready: true,
            highlights,
        })),
        // not an error: the browser retries once the page has rendered
        Err(BaaError::FragmentsNotReady { .. }) => Ok(Json(HighlightResponse {
            ready: false,
            highlights: HighlightSet::default(),
        })),
        Err(e) => Err(api_error(e)),
    }
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub count: usize,
    pub text: String,
}

async fn export_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ExportResponse> {
    let session = state.sessions.get(id).await.map_err(api_error)?;
    let snapshot = session.snapshot().await;

    if snapshot.results().is_empty() {
        return Err(api_error(BaaError::not_found("search results to copy")));
    }

    Ok(Json(ExportResponse {
        count: snapshot.results().len(),
        text: snapshot.results().export_text(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use baa_models::{DocumentSource, PageText};
    use baa_scanner::{InMemoryPages, PageSource, Summarizer, TextExtractor};
    use baa_utils::BaaResult;
    use tower::ServiceExt;

    const BOUNDARY: &str = "baa-test-boundary";

    /// Inline uploads get a one page document; linked documents cannot be read.
    struct OnePage;

    #[async_trait]
    impl TextExtractor for OnePage {
        async fn open(&self, document: &DocumentHandle) -> BaaResult<Box<dyn PageSource>> {
            match document.source {
                DocumentSource::Inline(_) => Ok(Box::new(InMemoryPages::new(vec![PageText::from_lines(
                    1,
                    ["", "The breach was", "bad.", "", "Unrelated text."],
                )]))),
                DocumentSource::Url(_) => Err(BaaError::document_unreadable("offline")),
            }
        }
    }

    struct Fixed;

    #[async_trait]
    impl Summarizer for Fixed {
        async fn summarize(&self, _text: &str) -> anyhow::Result<String> {
            Ok("summary".to_string())
        }
    }

    fn app() -> Router {
        let pipeline = SearchPipeline::new(Arc::new(OnePage), Arc::new(Fixed), PipelineOptions::default());
        create_app(AppState {
            sessions: SessionRegistry::new(pipeline, Duration::from_millis(20)),
            config: Arc::new(AppConfig::default()),
        })
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn get(uri: String) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: String, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// Multipart body with one part per `(name, file name, content type, content)`.
    fn multipart(uri: String, parts: &[(&str, Option<&str>, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, file_name, content_type, content) in parts {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match file_name {
                Some(file_name) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    name, file_name
                )),
                None => body.push_str(&format!("Content-Disposition: form-data; name=\"{}\"\r\n", name)),
            }
            if let Some(content_type) = content_type {
                body.push_str(&format!("Content-Type: {}\r\n", content_type));
            }
            body.push_str(&format!("\r\n{}\r\n", content));
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn new_session(app: &Router) -> String {
        let (status, json) = send(app, Request::post("/api/v1/sessions").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        json["session_id"].as_str().unwrap().to_string()
    }

    async fn wait_for_search(app: &Router, id: &str) -> serde_json::Value {
        for _ in 0..100 {
            let (_, json) = send(app, get(format!("/api/v1/sessions/{}", id))).await;
            if json["status"]["state"] != "searching" {
                return json;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("search did not finish");
    }

    #[tokio::test]
    async fn test_upload_search_and_highlight() {
        let app = app();
        let id = new_session(&app).await;

        let (status, json) = send(
            &app,
            multipart(
                format!("/api/v1/sessions/{}/document", id),
                &[
                    ("file", Some("report.pdf"), Some("application/pdf"), "%PDF-1.4"),
                    ("terms", None, None, "Breach"),
                ],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["terms"], serde_json::json!(["breach"]));
        assert_eq!(json["size_bytes"], 8);

        let snapshot = wait_for_search(&app, &id).await;
        assert_eq!(snapshot["status"]["state"], "complete");
        assert_eq!(snapshot["selected"], 0);
        assert_eq!(snapshot["results"][0]["context"], "The breach was bad.  Unrelated text.");

        // the renderer has not reported the page yet
        let highlights = format!("/api/v1/sessions/{}/highlights", id);
        let (status, json) = send(&app, get(highlights.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ready"], false);

        let (status, _) = send(
            &app,
            post_json(
                format!("/api/v1/sessions/{}/rendered", id),
                serde_json::json!({
                    "page": 1,
                    "page_count": 1,
                    "fragments": ["", "The breach was", "bad.", "", "Unrelated text."]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (_, json) = send(&app, get(highlights)).await;
        assert_eq!(json["ready"], true);
        assert_eq!(json["paragraph"], serde_json::json!([1, 2]));
        assert_eq!(json["term"], serde_json::json!([1]));

        let (status, json) = send(&app, get(format!("/api/v1/sessions/{}/export", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["text"], "Page 1: The breach was bad.  Unrelated text.");
    }

    #[tokio::test]
    async fn test_export_without_results_is_not_found() {
        let app = app();
        let id = new_session(&app).await;

        let (status, json) = send(&app, get(format!("/api/v1/sessions/{}/export", id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_upload_rejects_non_pdf() {
        let app = app();
        let id = new_session(&app).await;

        let (status, json) = send(
            &app,
            multipart(
                format!("/api/v1/sessions/{}/document", id),
                &[("file", Some("notes.txt"), Some("text/plain"), "hello")],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            &app,
            multipart(format!("/api/v1/sessions/{}/document", id), &[("terms", None, None, "breach")]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_url_upload_failure_surfaces_in_status() {
        let app = app();
        let id = new_session(&app).await;
        let uri = format!("/api/v1/sessions/{}/document", id);

        let (status, _) = send(&app, multipart(uri.clone(), &[("url", None, None, "http://example.test/")])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(
            &app,
            multipart(uri, &[("url", None, None, "http://example.test/files/report.pdf?v=2")]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["filename"], "report.pdf");
        assert!(json["size_bytes"].is_null());

        let snapshot = wait_for_search(&app, &id).await;
        assert_eq!(snapshot["status"]["state"], "failed");
        assert!(snapshot["results"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_and_closed_sessions() {
        let app = app();
        let (status, _) = send(&app, get(format!("/api/v1/sessions/{}", Uuid::new_v4()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let id = new_session(&app).await;
        let delete = || {
            Request::delete(format!("/api/v1/sessions/{}", id))
                .body(Body::empty())
                .unwrap()
        };
        assert_eq!(send(&app, delete()).await.0, StatusCode::NO_CONTENT);
        assert_eq!(send(&app, delete()).await.0, StatusCode::NOT_FOUND);
        assert_eq!(
            send(&app, get(format!("/api/v1/sessions/{}", id))).await.0,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_remote_file_name() {
        assert_eq!(remote_file_name("https://host/a/b.pdf?x=1#p"), Some("b.pdf".to_string()));
        assert_eq!(remote_file_name("http://host/"), None);
        assert_eq!(remote_file_name("ftp://host/b.pdf"), None);
    }
}
