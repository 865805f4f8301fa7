//! Request orchestration: validate, consult the cache, build the composite,
//! upload it, remember the answer.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::cache::{Cache, derive_key};
use crate::consts::{DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_BASE_BYTES};
use crate::error::OverlayError;
use crate::imaging;
use crate::upload::Uploader;

pub struct EngineConfig {
    /// Upper bound on fetching the base image.
    pub fetch_timeout: Duration,
    /// Largest base image body read from the remote host.
    pub max_base_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_base_bytes: DEFAULT_MAX_BASE_BYTES,
        }
    }
}

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Cache,
    Upload,
}

/// A successful answer: the hosting service's status and JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub source: ReplySource,
}

/// Long-lived request handler. Built once at startup and shared by every
/// request; holds the HTTP client, the cache and the uploader.
pub struct Engine {
    client: reqwest::Client,
    cache: Arc<dyn Cache>,
    uploader: Arc<dyn Uploader>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        client: reqwest::Client,
        cache: Arc<dyn Cache>,
        uploader: Arc<dyn Uploader>,
        config: EngineConfig,
    ) -> Self {
        Self {
            client,
            cache,
            uploader,
            config,
        }
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend()
    }

    /// Handle one overlay request. Every failure ends the request; nothing is retried.
    #[instrument(skip_all)]
    pub async fn handle(&self, base: &str, overlay: &str) -> Result<Reply, OverlayError> {
        if base.is_empty() || overlay.is_empty() {
            return Err(OverlayError::Validation);
        }

        let key = derive_key(base, overlay);
        debug!(%key, "derived cache key");

        // A broken cache must not take the service down with it.
        match self.cache.get(&key).await {
            Ok(Some(cached)) if !cached.is_empty() => {
                info!(%key, "cache hit");
                return Ok(Reply {
                    status: 200,
                    body: cached,
                    source: ReplySource::Cache,
                });
            }
            Ok(_) => debug!(%key, "cache miss"),
            Err(e) => warn!(
                %key,
                error = %format_args!("{e:#}"),
                "cache read failed, treating as miss"
            ),
        }

        let base_image = imaging::fetch_base(
            &self.client,
            base,
            self.config.fetch_timeout,
            self.config.max_base_bytes,
        )
        .await?;
        let overlay_image = imaging::decode_overlay(overlay)?;

        let composite = imaging::composite(&base_image, &overlay_image);
        let png = imaging::encode_png(&composite)?;
        debug!(
            width = composite.width(),
            height = composite.height(),
            bytes = png.len(),
            "composite encoded"
        );

        let remote = self
            .uploader
            .upload(png)
            .await
            .map_err(OverlayError::Upload)?;
        info!(%key, status = remote.status, "upload answered");

        if !remote.is_ok() {
            return Err(OverlayError::Remote {
                status: remote.status,
                body: remote.body,
            });
        }

        // The upload already happened; a failed write still fails the request.
        self.cache
            .set(&key, &remote.body)
            .await
            .map_err(OverlayError::CacheWrite)?;

        Ok(Reply {
            status: remote.status,
            body: remote.body,
            source: ReplySource::Upload,
        })
    }
}
