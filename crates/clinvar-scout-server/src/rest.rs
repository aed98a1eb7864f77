//! HTTP REST surface over the extractor.
//!
//! `GET|POST /extract` runs one extraction per request; `GET /health`
//! reports the resource picture the strategy decision is based on.

use std::sync::Arc;
use std::time::Instant;

use axum::async_trait;
use axum::extract::{FromRequest, Query, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};

use clinvar_scout::monitor::decide_strategy;
use clinvar_scout::{ExtractError, Extractor, Strategy};

use crate::config::{Environment, ServerConfig};
use crate::validate::{resolve_input, InputError, EXAMPLE_URL};

pub type SharedExtractor = Arc<Extractor>;

/// Build the axum Router with all REST endpoints.
pub fn router(state: SharedExtractor, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/extract", get(extract_query).post(extract_body))
        .layer(cors(config))
        .with_state(state)
}

fn cors(config: &ServerConfig) -> CorsLayer {
    match config.environment {
        Environment::Development => CorsLayer::very_permissive(),
        Environment::Production => {
            let origins: Vec<HeaderValue> = config
                .allowed_origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        tracing::warn!("ignoring invalid CORS origin {o:?}");
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
                .allow_credentials(true)
        }
    }
}

/// Bind and serve until the process is stopped.
pub async fn start(config: ServerConfig, extractor: Extractor) -> anyhow::Result<()> {
    let app = router(Arc::new(extractor), &config);
    let addr = config.addr();
    tracing::info!("REST API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Errors ──────────────────────────────────────────────────────

pub enum ApiError {
    Input(InputError),
    Extract(ExtractError),
}

impl From<InputError> for ApiError {
    fn from(e: InputError) -> Self {
        ApiError::Input(e)
    }
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        ApiError::Extract(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Input(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": {
                        "kind": e.kind(),
                        "message": e.to_string(),
                        "example": EXAMPLE_URL,
                    }
                }),
            ),
            ApiError::Extract(e) => {
                let status = match e {
                    ExtractError::ExtractionFailed { .. } => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (
                    status,
                    json!({ "error": { "kind": e.kind(), "message": e.to_string() } }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

// ── Request bodies ──────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct UrlParams {
    #[serde(default)]
    url: Option<String>,
}

/// `url` from either a JSON or a form-encoded body.
struct UrlBody(Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for UrlBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let params = if is_json {
            Json::<UrlParams>::from_request(req, state)
                .await
                .map(|Json(p)| p)
                .map_err(|e| {
                    tracing::debug!("rejected JSON body: {e}");
                    InputError::Missing
                })?
        } else {
            Form::<UrlParams>::from_request(req, state)
                .await
                .map(|Form(p)| p)
                .map_err(|e| {
                    tracing::debug!("rejected form body: {e}");
                    InputError::Missing
                })?
        };
        Ok(UrlBody(params.url))
    }
}

// ── Handlers ────────────────────────────────────────────────────

async fn extract_query(
    State(extractor): State<SharedExtractor>,
    Query(params): Query<UrlParams>,
) -> Result<Json<Value>, ApiError> {
    run_extract(&extractor, params.url).await
}

async fn extract_body(
    State(extractor): State<SharedExtractor>,
    UrlBody(url): UrlBody,
) -> Result<Json<Value>, ApiError> {
    run_extract(&extractor, url).await
}

async fn run_extract(extractor: &Extractor, input: Option<String>) -> Result<Json<Value>, ApiError> {
    let url = resolve_input(input.as_deref().unwrap_or_default())?;
    let start = Instant::now();
    tracing::info!("extract request for {url}");

    let result = extractor.extract(&url).await;
    let elapsed = start.elapsed().as_secs_f64();
    match result {
        Ok(record) => {
            tracing::info!("extract request completed in {elapsed:.2} seconds");
            let body = serde_json::to_value(record).unwrap_or(Value::Null);
            Ok(Json(body))
        }
        Err(e) => {
            tracing::error!("extract request failed after {elapsed:.2} seconds: {e}");
            Err(e.into())
        }
    }
}

async fn health(State(extractor): State<SharedExtractor>) -> Json<Value> {
    let timestamp = chrono::Utc::now().to_rfc3339();
    match extractor.sample_resources().await {
        Ok(sample) => {
            let strategy = decide_strategy(Some(&sample), extractor.config().overrides);
            Json(json!({
                "status": "ok",
                "resources": {
                    "memory_available_mb": sample.available_memory_mb,
                    "cpu_percent": sample.cpu_percent,
                    "container": sample.in_container,
                    "heavy_viable": strategy == Strategy::Heavy,
                },
                "strategy": strategy,
                "timestamp": timestamp,
            }))
        }
        Err(e) => {
            tracing::warn!("health check could not sample resources: {e:#}");
            Json(json!({
                "status": "degraded",
                "error": e.to_string(),
                "strategy": Strategy::Light,
                "timestamp": timestamp,
            }))
        }
    }
}
