use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, info};

use crate::cli::ServeArgs;
use crate::core::types::{HlaTypingCategory, Locus, TargetHlaCategory};
use crate::lookup::dispatcher::LookupError;
use crate::lookup::service::HlaMetadataService;
use crate::scoring::ScoringInfo;

/// Security configuration constants to prevent `DoS` attacks
pub const MAX_REQUEST_BODY_SIZE: usize = 64 * 1024; // 64KB
pub const MAX_CONCURRENT_REQUESTS: usize = 100;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state
pub struct AppState {
    pub service: HlaMetadataService,
}

/// Error body returned for every failed request
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
    pub details: Option<String>,
}

/// Create a safe error response that prevents information disclosure
/// while logging detailed errors server-side for debugging
pub fn create_safe_error_response(
    error_type: &str,
    user_message: &str,
    internal_error: Option<&str>,
) -> ErrorResponse {
    if let Some(internal_msg) = internal_error {
        tracing::error!("Internal error ({}): {}", error_type, internal_msg);
    }

    ErrorResponse {
        error: user_message.to_string(),
        error_type: error_type.to_string(),
        details: None,
    }
}

/// Failure of an API request
enum ApiError {
    Lookup(LookupError),
    Task(String),
}

impl From<LookupError> for ApiError {
    fn from(error: LookupError) -> Self {
        Self::Lookup(error)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Task(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = match self {
            Self::Lookup(error) => error,
            Self::Task(message) => {
                let body = create_safe_error_response(
                    "internal_error",
                    "The lookup could not be completed",
                    Some(&message),
                );
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };

        let message = error.to_string();
        let (status, body) = match &error {
            LookupError::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                create_safe_error_response("not_found", &message, None),
            ),
            LookupError::VersionNotFound(_) => (
                StatusCode::NOT_FOUND,
                create_safe_error_response("version_not_found", &message, None),
            ),
            LookupError::InvalidTyping(_) => (
                StatusCode::BAD_REQUEST,
                create_safe_error_response("invalid_typing", &message, None),
            ),
            LookupError::UnsupportedCategory(_) => (
                StatusCode::BAD_REQUEST,
                create_safe_error_response("unsupported_category", &message, None),
            ),
            LookupError::UnsupportedOperation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                create_safe_error_response("unsupported_operation", &message, None),
            ),
            LookupError::Expansion(_) | LookupError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                create_safe_error_response(
                    "internal_error",
                    "The lookup could not be completed",
                    Some(&message),
                ),
            ),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub locus: Locus,
    pub name: String,
    pub version: Option<String>,
    /// Classify the name when omitted
    pub category: Option<HlaTypingCategory>,
}

#[derive(Debug, Serialize)]
struct LookupResponse {
    category: HlaTypingCategory,
    locus: Locus,
    lookup_name: String,
    nomenclature_version: String,
    scoring_info: ScoringInfo,
    rows: usize,
}

#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    pub locus: Locus,
    pub name: String,
    pub target: TargetHlaCategory,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VersionParams {
    pub version: Option<String>,
}

/// Run the web server
///
/// # Errors
///
/// Returns an error if the dictionaries cannot be loaded, the tokio runtime
/// cannot be created, or the server fails to start.
pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move { run_server(args).await })
}

/// Routes over `service`, without middleware
pub fn api_router(service: HlaMetadataService) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/api/versions", get(versions_handler))
        .route("/api/lookup", get(lookup_handler))
        .route("/api/convert", get(convert_handler))
        .route("/api/p-groups", get(p_groups_handler))
        .with_state(state)
}

/// Create the application router with all routes and middleware configured.
///
/// # Errors
///
/// Returns an error if the rate limiter configuration is invalid.
pub fn create_router(service: HlaMetadataService) -> anyhow::Result<Router> {
    // Configure IP-based rate limiting
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(10)
        .burst_size(50)
        .finish()
        .context("Invalid rate limit configuration")?;

    let app = api_router(service).layer(
        ServiceBuilder::new()
            // Security headers for browser protection
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-content-type-options"),
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-frame-options"),
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("referrer-policy"),
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ))
            // IP-based rate limiting to prevent abuse
            .layer(GovernorLayer {
                config: Arc::new(governor_conf),
            })
            // Request timeout to prevent slow client attacks
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                REQUEST_TIMEOUT,
            ))
            // Limit concurrent requests to prevent DOS
            .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
            .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_SIZE)),
    );

    Ok(app)
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let service = args.dictionaries.service()?;
    info!("Serving nomenclature versions: {}", service.versions().join(", "));
    let app = create_router(service)?;

    let addr = format!("{}:{}", args.address, args.port);
    println!("Starting hla-dictionary web server at http://{addr}");

    if args.open {
        let _ = open::that(format!("http://{addr}/api/versions"));
    }

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn versions_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let versions = state.service.versions();
    Json(serde_json::json!({
        "latest": versions.last(),
        "versions": versions,
    }))
}

async fn lookup_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LookupParams>,
) -> Result<Json<LookupResponse>, ApiError> {
    debug!("Lookup {}*{}", params.locus, params.name);

    // Dictionary lookups are CPU bound; keep them off the async workers
    let response = tokio::task::spawn_blocking(move || -> Result<LookupResponse, LookupError> {
        let service = &state.service;
        let version = service.resolve_version(params.version.as_deref())?;
        let result = match params.category {
            Some(category) => service.lookup(category, params.locus, &params.name, &version)?,
            None => service.lookup_typing(params.locus, &params.name, &version)?,
        };
        let scoring_info = result.scoring_info()?;

        Ok(LookupResponse {
            category: result.category,
            locus: result.locus,
            lookup_name: result.lookup_name,
            nomenclature_version: result.nomenclature_version,
            scoring_info,
            rows: result.rows.len(),
        })
    })
    .await??;

    Ok(Json(response))
}

async fn convert_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConvertParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let response = tokio::task::spawn_blocking(move || -> Result<serde_json::Value, LookupError> {
        let service = &state.service;
        let version = service.resolve_version(params.version.as_deref())?;
        let names = service.convert(params.locus, &params.name, params.target, &version)?;

        Ok(serde_json::json!({
            "locus": params.locus,
            "lookup_name": params.name,
            "target": params.target,
            "nomenclature_version": version,
            "names": names,
        }))
    })
    .await??;

    Ok(Json(response))
}

async fn p_groups_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VersionParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let version = state.service.resolve_version(params.version.as_deref())?;
    let p_groups = state.service.get_all_p_groups(&version)?;

    Ok(Json(serde_json::json!({
        "nomenclature_version": version,
        "p_groups": p_groups,
    })))
}
