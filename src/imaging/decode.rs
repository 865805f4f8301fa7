use std::error::Error as _;
use std::time::Duration;

use base64::Engine;
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use image::{ImageFormat, RgbaImage};
use reqwest::header::CONTENT_TYPE;

use crate::consts::{DATA_URI_PREFIX, PNG_CONTENT_TYPE};
use crate::error::{ImageRole, OverlayError};

/// Standard alphabet, padded, tolerant of non-zero trailing bits.
const OVERLAY_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decode PNG bytes into an RGBA grid.
pub fn decode_png(bytes: &[u8], role: ImageRole) -> Result<RgbaImage, OverlayError> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|source| OverlayError::Decode { role, source })?;
    Ok(image.to_rgba8())
}

/// Drop a leading `data:image/png;base64,` marker if present.
pub fn strip_data_uri(payload: &str) -> &str {
    payload.strip_prefix(DATA_URI_PREFIX).unwrap_or(payload)
}

/// Decode an inline overlay: optional data URI marker, base64, PNG.
///
/// Line breaks inside the base64 are ignored, so wrapped output from
/// `base64` or MIME encoders is accepted.
pub fn decode_overlay(payload: &str) -> Result<RgbaImage, OverlayError> {
    let encoded: String = strip_data_uri(payload)
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n'))
        .collect();
    let bytes = OVERLAY_BASE64.decode(encoded)?;
    decode_png(&bytes, ImageRole::Overlay)
}

/// Fetch the base image and decode it. The host must answer with a PNG
/// content type and at most `max_bytes` of body.
pub async fn fetch_base(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
    max_bytes: usize,
) -> Result<RgbaImage, OverlayError> {
    let mut resp = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| OverlayError::Fetch(describe(&e)))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(OverlayError::Fetch(format!("base host answered {status}")));
    }

    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !content_type.starts_with(PNG_CONTENT_TYPE) {
        return Err(OverlayError::ContentType(content_type));
    }

    let too_large = || OverlayError::Fetch(format!("base image exceeds {max_bytes} bytes"));
    if resp
        .content_length()
        .is_some_and(|len| len > max_bytes as u64)
    {
        return Err(too_large());
    }

    // Content-Length may be absent (chunked), so enforce the cap while reading too.
    let mut bytes = Vec::new();
    while let Some(chunk) = resp
        .chunk()
        .await
        .map_err(|e| OverlayError::Fetch(describe(&e)))?
    {
        if bytes.len() + chunk.len() > max_bytes {
            return Err(too_large());
        }
        bytes.extend_from_slice(&chunk);
    }
    decode_png(&bytes, ImageRole::Base)
}

/// reqwest keeps the useful part (timeout, refused, dns) in the source chain.
fn describe(err: &reqwest::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
