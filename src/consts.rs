//! Project-wide constants.

use std::time::Duration;

/// User agent sent to the upload service and to base image hosts.
pub const USER_AGENT: &str = concat!(
    "Skin-Overlay/",
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CARGO_PKG_NAME"),
    ")"
);

/// Exact RGB value keyed out of every composite. Not configurable.
pub const CHROMA_KEY: [u8; 3] = [0, 0, 254];

/// Prefix stripped from the overlay payload before base64 decoding.
pub const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Content type the base image host must declare.
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Separator between the base locator and overlay payload in the cache key.
pub const CACHE_KEY_SEPARATOR: &str = ":";

/// Length of a derived cache key, in base64 characters.
pub const CACHE_KEY_LEN: usize = 16;

/// Default skin upload endpoint.
pub const DEFAULT_UPLOAD_URL: &str = "https://api.mineskin.org/generate/upload";

/// Multipart field and file name of the uploaded composite.
pub const UPLOAD_FIELD: &str = "file";
pub const UPLOAD_FILE_NAME: &str = "skin.png";

/// Base image fetch timeout when none is configured.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Default cache store: a SQLite file in the working directory.
pub const DEFAULT_CACHE_URL: &str = "sqlite:skin-overlay.db";

/// Largest base image body accepted from a remote host.
pub const DEFAULT_MAX_BASE_BYTES: usize = 4 * 1024 * 1024;

/// Request body limit. Skins are tiny; base64 inflates them by a third.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
