use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::multipart::{Form, Part};

use super::{RemoteResponse, Uploader};
use crate::consts::{self, UPLOAD_FIELD, UPLOAD_FILE_NAME};

/// Uploads skins to the MineSkin generate endpoint.
pub struct MineSkinUploader {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl MineSkinUploader {
    pub fn new(client: reqwest::Client, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl Uploader for MineSkinUploader {
    async fn upload(&self, png: Vec<u8>) -> Result<RemoteResponse> {
        let Some(api_key) = &self.api_key else {
            bail!("no MineSkin API key configured. Set MINESKIN_API_KEY or pass --api-key.");
        };

        let part = Part::bytes(png)
            .file_name(UPLOAD_FILE_NAME)
            .mime_str("image/png")?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let resp = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .header(USER_AGENT, consts::USER_AGENT)
            .multipart(form)
            .send()
            .await
            .context("upload request failed")?;

        let status = resp.status().as_u16();
        let bytes = resp
            .bytes()
            .await
            .context("failed to read MineSkin response")?;
        // Passed through untouched; invalid UTF-8 becomes U+FFFD.
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(RemoteResponse { status, body })
    }
}
