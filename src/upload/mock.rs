use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{RemoteResponse, Uploader};

/// A scripted uploader for tests. Answers every call with the same response
/// and remembers what it was sent.
pub struct MockUploader {
    status: u16,
    body: String,
    calls: AtomicUsize,
    last_upload: Mutex<Option<Vec<u8>>>,
}

impl MockUploader {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            calls: AtomicUsize::new(0),
            last_upload: Mutex::new(None),
        }
    }

    /// Number of uploads attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The PNG bytes of the most recent upload.
    pub fn last_upload(&self) -> Option<Vec<u8>> {
        self.last_upload.lock().ok().and_then(|png| png.clone())
    }
}

#[async_trait]
impl Uploader for MockUploader {
    async fn upload(&self, png: Vec<u8>) -> Result<RemoteResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_upload.lock() {
            *last = Some(png);
        }
        Ok(RemoteResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

