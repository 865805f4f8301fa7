//! Pixel work: decoding inputs, compositing, PNG serialization.

pub mod composite;
pub mod decode;

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use crate::error::OverlayError;

pub use composite::{blend_over, composite, key_out};
pub use decode::{decode_overlay, decode_png, fetch_base, strip_data_uri};

/// Serialize a pixel grid to PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, OverlayError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(OverlayError::Encode)?;
    Ok(buf)
}
