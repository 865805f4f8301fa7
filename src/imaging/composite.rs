//! Source-over compositing and chroma-key removal.
//!
//! Pixels are straight (non-premultiplied) RGBA8. Blending weighs each
//! channel by alpha in 16-bit space so fully opaque sources and fully
//! transparent sources come out exact.

use image::{Rgba, RgbaImage};

use crate::consts::CHROMA_KEY;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Blend `src` over `dst` ("over" operator).
pub fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = u32::from(src[3]);
    let da = u32::from(dst[3]);

    // Contribution of each side, in units of 1/(255*255).
    let src_weight = sa * 255;
    let dst_weight = da * (255 - sa);
    let total = src_weight + dst_weight;
    if total == 0 {
        return TRANSPARENT;
    }

    let channel = |i: usize| -> u8 {
        let mixed = u32::from(src[i]) * src_weight + u32::from(dst[i]) * dst_weight;
        ((mixed + total / 2) / total) as u8
    };
    let alpha = (total + 127) / 255;

    Rgba([channel(0), channel(1), channel(2), alpha.min(255) as u8])
}

/// Draw `layer` onto `canvas` at the origin. Only the overlapping region is touched.
fn draw_over(canvas: &mut RgbaImage, layer: &RgbaImage) {
    let width = canvas.width().min(layer.width());
    let height = canvas.height().min(layer.height());
    for y in 0..height {
        for x in 0..width {
            let blended = blend_over(*canvas.get_pixel(x, y), *layer.get_pixel(x, y));
            canvas.put_pixel(x, y, blended);
        }
    }
}

/// Make every pixel whose RGB is exactly the chroma key fully transparent.
/// Channels are straight (not premultiplied), so translucent key pixels match
/// as well. Returns how many pixels were keyed out.
pub fn key_out(image: &mut RgbaImage) -> usize {
    let mut keyed = 0;
    for pixel in image.pixels_mut() {
        if pixel[0] == CHROMA_KEY[0] && pixel[1] == CHROMA_KEY[1] && pixel[2] == CHROMA_KEY[2] {
            *pixel = TRANSPARENT;
            keyed += 1;
        }
    }
    keyed
}

/// Composite `overlay` over `base` and key out the reserved color.
///
/// The result always has the base's dimensions. An overlay of another size
/// only affects the region both grids share.
pub fn composite(base: &RgbaImage, overlay: &RgbaImage) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(base.width(), base.height(), TRANSPARENT);
    draw_over(&mut out, base);
    draw_over(&mut out, overlay);
    key_out(&mut out);
    out
}
