//! Application startup and lifecycle management.

use crate::classifier::{BurnClassifier, DigitClassifier};
use crate::config::DigitConfig;
use crate::handlers;
use crate::preprocess::PreprocessOptions;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, get_service, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: DigitConfig,
    pub classifier: Arc<dyn DigitClassifier>,
    pub preprocess: PreprocessOptions,
}

impl AppState {
    pub fn new(config: DigitConfig, classifier: Arc<dyn DigitClassifier>) -> Self {
        let preprocess = PreprocessOptions {
            max_image_dimension: config.limits.max_image_dimension,
            reject_blank: config.limits.reject_blank_images,
        };
        Self {
            config,
            classifier,
            preprocess,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let static_dir = PathBuf::from(&state.config.frontend.static_dir);
    let index = ServeFile::new(static_dir.join("index.html"));
    let body_limit = state.config.limits.max_request_bytes;

    Router::new()
        .route("/", get_service(index))
        .route(
            "/predict",
            post(handlers::predict).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

type ServerFuture = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

pub struct Application {
    port: u16,
    server: ServerFuture,
    state: AppState,
}

impl Application {
    /// Load the model named in the configuration and bind the listener.
    pub async fn build(config: DigitConfig) -> Result<Self, AppError> {
        let model_path = config.model.path.clone();
        let classifier = tokio::task::spawn_blocking(move || BurnClassifier::load(&model_path))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?
            .map_err(|e| {
                tracing::error!(path = %config.model.path, error = %e, "Failed to load model");
                AppError::ConfigError(anyhow::Error::new(e))
            })?;

        Self::build_with_classifier(config, Arc::new(classifier)).await
    }

    /// Bind the listener around an already constructed classifier.
    pub async fn build_with_classifier(
        config: DigitConfig,
        classifier: Arc<dyn DigitClassifier>,
    ) -> Result<Self, AppError> {
        tracing::info!(classifier = classifier.name(), "Classifier ready");

        let state = AppState::new(config, classifier);
        let app = build_router(state.clone());

        // port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::pin(server.into_future()),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
