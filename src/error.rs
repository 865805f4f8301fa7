//! Request failures and how they are rendered to callers.

use std::fmt;

use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Which input image a decode failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Base,
    Overlay,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRole::Base => f.write_str("base"),
            ImageRole::Overlay => f.write_str("overlay"),
        }
    }
}

/// Every way a request can fail. Each variant is terminal for the request.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Missing base URL or overlay image")]
    Validation,

    #[error("Failed to parse form: {0}")]
    MalformedForm(String),

    #[error("Failed to fetch base image: {0}")]
    Fetch(String),

    #[error("Failed to fetch base image: invalid content type: {0} (expected image/png)")]
    ContentType(String),

    #[error("Failed to decode {role} image: failed to decode PNG: {source}")]
    Decode {
        role: ImageRole,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to decode overlay image: failed to decode base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Failed to encode composite image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Failed to send request to MineSkin: {0:#}")]
    Upload(#[source] anyhow::Error),

    #[error("Failed to upload skin to MineSkin: {body}")]
    Remote { status: u16, body: String },

    #[error("Failed to set cache: {0:#}")]
    CacheWrite(#[source] anyhow::Error),
}

impl OverlayError {
    /// HTTP status reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            OverlayError::Validation
            | OverlayError::MalformedForm(_)
            | OverlayError::Fetch(_)
            | OverlayError::ContentType(_)
            | OverlayError::Decode { .. }
            | OverlayError::Encoding(_) => StatusCode::BAD_REQUEST,
            OverlayError::Encode(_)
            | OverlayError::Upload(_)
            | OverlayError::Remote { .. }
            | OverlayError::CacheWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller sent something unusable, as opposed to a failure on our side.
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl IntoResponse for OverlayError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}
