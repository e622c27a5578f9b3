use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{sse::{Event, Sse}, IntoResponse},
    routing::{delete, get, post, put},
    Json, Router,
};
use futures_util::stream::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    orchestrator::{GenerationOutcome, GenerationResult, Studio, StudioError, StudioSnapshot},
    styles::StyleCatalog,
    types::{GeneratedImage, GenerationConfig},
};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn router(studio: Arc<Studio>) -> Router {
    Router::new()
        .route("/api/key", get(key_status).put(select_key))
        .route("/api/image", post(upload_image).delete(clear_image))
        .route("/api/description", put(put_description))
        .route("/api/state", get(get_state))
        .route("/api/styles", get(get_styles))
        .route("/api/styles/selected", put(select_style))
        .route("/api/styles/suggest", post(suggest_styles))
        .route("/api/config", get(get_config).put(put_config))
        .route("/api/generate", post(generate))
        .route("/api/result", get(get_result))
        .route("/api/history", get(list_history))
        .route("/api/history/{id}", delete(delete_history))
        .route("/api/events", get(events))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(studio)
}

pub async fn serve(bind: &str, studio: Arc<Studio>) -> Result<()> {
    let app = router(studio);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("posterkit studio listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatus {
    has_api_key: bool,
}

async fn key_status(State(st): State<Arc<Studio>>) -> Json<KeyStatus> {
    Json(KeyStatus { has_api_key: st.gate().has_key() })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectKeyReq {
    api_key: String,
}

async fn select_key(State(st): State<Arc<Studio>>, Json(req): Json<SelectKeyReq>) -> Result<Json<KeyStatus>, ApiErr> {
    if !st.gate().select_key(&req.api_key) {
        return Err(ApiErr::bad_request("API key cannot be set for this provider"));
    }
    Ok(Json(KeyStatus { has_api_key: true }))
}

async fn upload_image(State(st): State<Arc<Studio>>, body: Bytes) -> Result<Json<StudioSnapshot>, ApiErr> {
    st.upload(&body).await?;
    Ok(Json(st.snapshot()))
}

async fn clear_image(State(st): State<Arc<Studio>>) -> Result<Json<StudioSnapshot>, ApiErr> {
    st.clear_image()?;
    Ok(Json(st.snapshot()))
}

#[derive(Deserialize)]
struct DescriptionReq {
    description: String,
}

async fn put_description(
    State(st): State<Arc<Studio>>,
    Json(req): Json<DescriptionReq>,
) -> Result<Json<StudioSnapshot>, ApiErr> {
    st.set_description(req.description)?;
    Ok(Json(st.snapshot()))
}

async fn get_state(State(st): State<Arc<Studio>>) -> Json<StudioSnapshot> {
    Json(st.snapshot())
}

async fn get_styles(State(st): State<Arc<Studio>>) -> Json<StyleCatalog> {
    Json(st.styles())
}

#[derive(Deserialize)]
struct SelectStyleReq {
    id: String,
}

async fn select_style(State(st): State<Arc<Studio>>, Json(req): Json<SelectStyleReq>) -> Result<Json<StyleCatalog>, ApiErr> {
    st.select_style(&req.id)?;
    Ok(Json(st.styles()))
}

async fn suggest_styles(State(st): State<Arc<Studio>>) -> Result<Json<StyleCatalog>, ApiErr> {
    st.suggest_styles().await?;
    Ok(Json(st.styles()))
}

async fn get_config(State(st): State<Arc<Studio>>) -> Json<GenerationConfig> {
    Json(st.config())
}

async fn put_config(State(st): State<Arc<Studio>>, Json(cfg): Json<GenerationConfig>) -> StatusCode {
    st.set_config(cfg);
    StatusCode::NO_CONTENT
}

async fn generate(State(st): State<Arc<Studio>>) -> Result<axum::response::Response, ApiErr> {
    match st.generate().await? {
        Some(outcome) => Ok(Json::<GenerationOutcome>(outcome).into_response()),
        // no image or no style: nothing to do
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn get_result(State(st): State<Arc<Studio>>) -> Json<GenerationResult> {
    Json(st.result())
}

async fn list_history(State(st): State<Arc<Studio>>) -> Json<Vec<GeneratedImage>> {
    Json(st.history())
}

async fn delete_history(State(st): State<Arc<Studio>>, Path(id): Path<String>) -> Result<StatusCode, ApiErr> {
    if !st.delete_history(&id) {
        return Err(ApiErr::not_found(format!("No history entry {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn events(
    State(st): State<Arc<Studio>>,
) -> Sse<impl futures_util::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let stream = BroadcastStream::new(st.subscribe())
        .filter_map(|msg| async move { msg.ok() })
        .map(|evt| {
            let json = serde_json::to_string(&evt).unwrap_or_default();
            Ok(Event::default().event("message").data(json))
        });
    Sse::new(stream)
}

#[derive(Debug)]
struct ApiErr {
    status: StatusCode,
    code: String,
    message: String,
    suggestion: Option<String>,
}

impl ApiErr {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request".to_string(),
            message: message.into(),
            suggestion: None,
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "not_found".to_string(),
            message: message.into(),
            suggestion: None,
        }
    }
}

impl From<StudioError> for ApiErr {
    fn from(e: StudioError) -> Self {
        let (status, code, suggestion) = match &e {
            StudioError::NoApiKey => (
                StatusCode::UNAUTHORIZED,
                "no_api_key",
                Some("Select an API key with PUT /api/key first.".to_string()),
            ),
            StudioError::Busy(_) => (
                StatusCode::CONFLICT,
                "busy",
                Some("Wait for the current step to finish.".to_string()),
            ),
            StudioError::UnknownStyle(_) => (StatusCode::NOT_FOUND, "unknown_style", None),
            StudioError::InvalidImage(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_image",
                Some("Upload a PNG, JPEG, WebP or GIF file.".to_string()),
            ),
            StudioError::Alert(_) => (StatusCode::BAD_GATEWAY, "alert", None),
        };
        Self { status, code: code.to_string(), message: e.to_string(), suggestion }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> axum::response::Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            code: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            suggestion: Option<String>,
        }
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
                code: self.code,
                suggestion: self.suggestion,
            }),
        )
            .into_response()
    }
}
