use rayon::prelude::*;

use crate::foundation::error::{PressError, PressResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::frame::RasterImage;

/// Premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

const OPAQUE_BLACK: PremulRgba8 = [0, 0, 0, 255];

/// Source-over of premultiplied `src` onto `dst` with an extra opacity factor.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Source-over of a premultiplied buffer onto `dst`, in place.
pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> PressResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(PressError::rasterization(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    dst.par_chunks_exact_mut(4)
        .zip(src.par_chunks_exact(4))
        .for_each(|(d, s)| {
            let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
            d.copy_from_slice(&out);
        });
    Ok(())
}

/// Composite a premultiplied buffer onto opaque black, in place.
///
/// The result is opaque: `color = fg * a`, `alpha = 255`.
pub fn flatten_onto_black(rgba: &mut [u8]) {
    rgba.par_chunks_exact_mut(4).for_each(|px| {
        let out = over(OPAQUE_BLACK, [px[0], px[1], px[2], px[3]], 1.0);
        px.copy_from_slice(&out);
    });
}

/// Per-channel saturating addition of `src` into `dst`; alpha stays opaque.
pub fn add_saturating_in_place(dst: &mut RasterImage, src: &RasterImage) -> PressResult<()> {
    if dst.width != src.width || dst.height != src.height {
        return Err(PressError::rasterization(format!(
            "cannot add {}x{} frame into {}x{} frame",
            src.width, src.height, dst.width, dst.height
        )));
    }
    dst.data
        .par_chunks_exact_mut(4)
        .zip(src.data.par_chunks_exact(4))
        .for_each(|(d, s)| {
            for i in 0..3 {
                d[i] = d[i].saturating_add(s[i]);
            }
            d[3] = 255;
        });
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
