//! HTTP surface: `POST /api` and a liveness check.

use std::future::Future;
use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::engine::Engine;
use crate::error::OverlayError;

/// Form body of `POST /api`. Absent fields read as empty and fail validation.
#[derive(Debug, Default, Deserialize)]
pub struct OverlayForm {
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub overlay: String,
}

pub fn router(engine: Arc<Engine>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api", post(overlay))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(engine)
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown requested, draining connections");
}

async fn health() -> &'static str {
    "ok"
}

async fn overlay(
    State(engine): State<Arc<Engine>>,
    form: Result<Form<OverlayForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!("request body too large");
            return rejection.into_response();
        }
        Err(rejection) => return reject(OverlayError::MalformedForm(rejection.body_text())),
    };

    match engine.handle(&form.base, &form.overlay).await {
        Ok(reply) => {
            let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::OK);
            (status, [(CONTENT_TYPE, "application/json")], reply.body).into_response()
        }
        Err(err) => reject(err),
    }
}

fn reject(err: OverlayError) -> Response {
    if err.is_client_error() {
        warn!(status = err.status().as_u16(), error = %err, "request rejected");
    } else {
        error!(status = err.status().as_u16(), error = %err, "request failed");
    }
    err.into_response()
}
