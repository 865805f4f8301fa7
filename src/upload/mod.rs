pub mod mineskin;
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;

pub use mineskin::MineSkinUploader;

/// What the hosting service said about an upload, passed to callers verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
}

impl RemoteResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Publishes a finished PNG. `Err` means the request never got an answer;
/// a rejection by the service is an `Ok` with a non-200 status.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, png: Vec<u8>) -> Result<RemoteResponse>;
}
