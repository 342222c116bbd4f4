//! REST API server for docx-mcp.
//!
//! Exposes the document control plane under `/api/v1`: document records and
//! content, the editing operations, review (comments, versions, revisions),
//! exports and templates. Errors are JSON `{ "error": message }` bodies.

mod error;
mod routes;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, FromRequest, Json, Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use docx_core::control::{ControlError, DocxControlPlane};
use docx_core::document::WordDocument;
use docx_core::editor::DocumentResult;
use serde::de::DeserializeOwned;
use surrealdb::Connection;
use tracing::info;

pub use error::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Configuration for the REST API server.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub addr: SocketAddr,
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
    /// When set, `/api/v1` requests must carry this value in `X-API-Key`.
    pub api_key: Option<String>,
}

impl ApiServerConfig {
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            max_body_bytes: 50 * 1024 * 1024,
            request_timeout: Duration::from_secs(30),
            api_key: None,
        }
    }

    #[must_use]
    pub const fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 4010)))
    }
}

/// HTTP API server wrapper.
pub struct ApiServer<C: Connection> {
    config: ApiServerConfig,
    state: AppState<C>,
}

impl<C: Connection> ApiServer<C> {
    #[must_use]
    pub fn new(control: DocxControlPlane<C>, config: ApiServerConfig) -> Self {
        let state = AppState::new(control, &config);
        Self { config, state }
    }
}

impl<C> ApiServer<C>
where
    C: Connection + Send + Sync + 'static,
{
    /// Runs the HTTP server until shutdown.
    ///
    /// # Errors
    /// Returns any listener or server error.
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.config.addr;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let app = build_router(self.state, self.config.max_body_bytes);

        info!("docx-api listening on {addr}");
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Builds the full router for a control plane. Used by the server and by
/// tests that drive the API without a listener.
pub fn router<C>(control: DocxControlPlane<C>, config: &ApiServerConfig) -> Router
where
    C: Connection + Send + Sync + 'static,
{
    build_router(AppState::new(control, config), config.max_body_bytes)
}

pub(crate) struct AppState<C: Connection> {
    control: DocxControlPlane<C>,
    request_timeout: Duration,
    api_key: Option<Arc<str>>,
}

impl<C: Connection> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            control: self.control.clone(),
            request_timeout: self.request_timeout,
            api_key: self.api_key.clone(),
        }
    }
}

impl<C: Connection> AppState<C> {
    fn new(control: DocxControlPlane<C>, config: &ApiServerConfig) -> Self {
        Self {
            control,
            request_timeout: config.request_timeout,
            api_key: config.api_key.as_deref().map(Arc::from),
        }
    }

    pub(crate) const fn control(&self) -> &DocxControlPlane<C> {
        &self.control
    }

    /// Runs a control-plane call under the request timeout. An edit that
    /// has already been applied when the timeout fires still finishes its
    /// save in the background.
    pub(crate) async fn run<T, F>(&self, future: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ControlError>>,
    {
        tokio::time::timeout(self.request_timeout, future)
            .await
            .map_err(|_| ApiError::timeout())?
            .map_err(ApiError::from)
    }

    pub(crate) async fn read<T, F>(&self, document_id: &str, operation: F) -> Result<T, ApiError>
    where
        F: FnOnce(&WordDocument) -> DocumentResult<T>,
    {
        self.run(self.control.read(document_id, operation)).await
    }

    pub(crate) async fn edit<T, F>(&self, document_id: &str, operation: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut WordDocument) -> DocumentResult<T>,
    {
        self.run(self.control.edit(document_id, operation)).await
    }
}

/// JSON body extractor whose rejections use the API error shape.
pub(crate) struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

fn build_router<C>(state: AppState<C>, max_body_bytes: usize) -> Router
where
    C: Connection + Send + Sync + 'static,
{
    let api = routes::api_routes::<C>().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_api_key::<C>,
    ));
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/health", get(health))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn require_api_key<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = &state.api_key {
        let provided = headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());
        if provided != Some(expected.as_ref()) {
            return ApiError::unauthorized().into_response();
        }
    }
    next.run(request).await
}
