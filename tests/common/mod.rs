#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use axum::Router;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::routing::get;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{Rgba, RgbaImage};
use tokio::net::TcpListener;

use skin_overlay::cache::{Cache, SqliteCache};
use skin_overlay::consts::DATA_URI_PREFIX;
use skin_overlay::engine::{Engine, EngineConfig};
use skin_overlay::imaging::encode_png;
use skin_overlay::upload::Uploader;
use skin_overlay::upload::mock::MockUploader;

pub const UPLOAD_OK: &str = r#"{"uuid":"4f1c","texture":{"url":"https://textures.example/4f1c"}}"#;

/// Opaque 2×2 grid with four distinct colors and no chroma-key pixel.
pub fn opaque_base() -> RgbaImage {
    let mut grid = RgbaImage::new(2, 2);
    grid.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    grid.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
    grid.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
    grid.put_pixel(1, 1, Rgba([80, 90, 100, 255]));
    grid
}

pub fn transparent(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]))
}

/// Overlay payload as a browser would send it, data URI marker included.
pub fn overlay_payload(grid: &RgbaImage) -> String {
    format!("{DATA_URI_PREFIX}{}", STANDARD.encode(encode_png(grid).unwrap()))
}

/// Bind an ephemeral local port and serve `router` on it.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Stand-in for the host serving base skins.
pub async fn image_host() -> String {
    let base_png = encode_png(&opaque_base()).unwrap();

    let router = Router::new()
        .route(
            "/base.png",
            get(move || {
                let body = base_png.clone();
                async move { ([(CONTENT_TYPE, "image/png")], body) }
            }),
        )
        .route(
            "/base-charset.png",
            get(|| async {
                let body = encode_png(&opaque_base()).unwrap();
                ([(CONTENT_TYPE, "image/png; charset=binary")], body)
            }),
        )
        .route(
            "/page.html",
            get(|| async { ([(CONTENT_TYPE, "text/html")], "<html></html>") }),
        )
        .route(
            "/garbage.png",
            get(|| async { ([(CONTENT_TYPE, "image/png")], b"not a png".to_vec()) }),
        )
        .route(
            "/gone.png",
            get(|| async { (StatusCode::NOT_FOUND, [(CONTENT_TYPE, "image/png")], "gone") }),
        )
        .route(
            "/huge.png",
            get(|| async {
                let noise: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
                ([(CONTENT_TYPE, "image/png")], noise)
            }),
        )
        .route(
            "/slow.png",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                let body = encode_png(&opaque_base()).unwrap();
                ([(CONTENT_TYPE, "image/png")], body)
            }),
        );

    format!("http://{}", spawn(router).await)
}

pub fn engine(cache: Arc<dyn Cache>, uploader: Arc<dyn Uploader>) -> Engine {
    engine_with(cache, uploader, EngineConfig::default())
}

pub fn engine_with(
    cache: Arc<dyn Cache>,
    uploader: Arc<dyn Uploader>,
    config: EngineConfig,
) -> Engine {
    Engine::new(
        reqwest::Client::new(),
        cache,
        uploader,
        EngineConfig {
            fetch_timeout: Duration::from_millis(500),
            ..config
        },
    )
}

pub fn mem_cache() -> Arc<SqliteCache> {
    Arc::new(SqliteCache::in_memory().unwrap())
}

pub fn ok_uploader() -> Arc<MockUploader> {
    Arc::new(MockUploader::new(200, UPLOAD_OK))
}

/// Counts lookups and writes on top of an in-memory store.
pub struct CountingCache {
    inner: SqliteCache,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
}

impl CountingCache {
    pub fn new() -> Self {
        Self {
            inner: SqliteCache::in_memory().unwrap(),
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Cache for CountingCache {
    fn backend(&self) -> &'static str {
        "counting"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }
}

/// A cache whose reads and/or writes always fail, like an unreachable server.
pub struct BrokenCache {
    pub fail_get: bool,
    pub fail_set: bool,
}

#[async_trait]
impl Cache for BrokenCache {
    fn backend(&self) -> &'static str {
        "broken"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        if self.fail_get {
            bail!("connection refused");
        }
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        if self.fail_set {
            bail!("READONLY You can't write against a read only replica.");
        }
        Ok(())
    }
}

/// URL-encode form fields the way a browser submits them.
pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoded(k), urlencoded(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => {
                out.push_str(&format!("%{:02X}", b));
            }
        }
    }
    out
}
