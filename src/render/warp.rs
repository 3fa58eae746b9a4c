//! Projector-space resampling of the canonical raster.

use rayon::prelude::*;

use crate::calibration::homography::Homography;
use crate::foundation::core::Canvas;
use crate::foundation::error::{PressError, PressResult};
use crate::foundation::math::clamp_u8;
use crate::render::frame::RasterImage;

/// Bicubic kernel sharpness (same as the common `INTER_CUBIC` convention).
const CUBIC_A: f32 = -0.75;
const W_EPS: f64 = 1e-12;

/// Pre-warp an opaque canonical raster into a projector frame.
///
/// `projector_to_canonical` is evaluated at every output pixel to find its source position, so the
/// canonical content lands where the inverse mapping sends it. Sampling is bicubic; everything
/// outside the canonical raster is opaque black.
#[tracing::instrument(level = "debug", skip_all, fields(w = out.width, h = out.height))]
pub fn warp_perspective(
    canonical: &RasterImage,
    projector_to_canonical: &Homography,
    out: Canvas,
) -> RasterImage {
    let m = projector_to_canonical.coeffs_f64();
    let mut dst = RasterImage::black(out);
    let row_bytes = (out.width as usize) * 4;
    if row_bytes == 0 {
        return dst;
    }

    dst.data
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let yf = y as f64;
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let xf = x as f64;
                let w = m[6] * xf + m[7] * yf + m[8];
                if !w.is_finite() || w.abs() <= W_EPS {
                    continue;
                }
                let sx = (m[0] * xf + m[1] * yf + m[2]) / w;
                let sy = (m[3] * xf + m[4] * yf + m[5]) / w;
                if let Some(rgb) = sample_bicubic(canonical, sx, sy) {
                    px[..3].copy_from_slice(&rgb);
                }
            }
        });
    dst
}

/// Stretch the canonical raster to the output size without perspective correction.
pub fn resize_bilinear(canonical: &RasterImage, out: Canvas) -> PressResult<RasterImage> {
    let src = image::RgbaImage::from_raw(canonical.width, canonical.height, canonical.data.clone())
        .ok_or_else(|| PressError::rasterization("canonical buffer does not match its size"))?;
    let resized = image::imageops::resize(
        &src,
        out.width,
        out.height,
        image::imageops::FilterType::Triangle,
    );
    RasterImage::from_rgba8(out.width, out.height, resized.into_raw())
}

fn cubic_weights(t: f32) -> [f32; 4] {
    let a = CUBIC_A;
    let w0 = ((a * (t + 1.0) - 5.0 * a) * (t + 1.0) + 8.0 * a) * (t + 1.0) - 4.0 * a;
    let w1 = ((a + 2.0) * t - (a + 3.0)) * t * t + 1.0;
    let u = 1.0 - t;
    let w2 = ((a + 2.0) * u - (a + 3.0)) * u * u + 1.0;
    [w0, w1, w2, 1.0 - w0 - w1 - w2]
}

/// Bicubic RGB sample at `(x, y)`; taps outside the raster read as black.
fn sample_bicubic(src: &RasterImage, x: f64, y: f64) -> Option<[u8; 3]> {
    let (w, h) = (i64::from(src.width), i64::from(src.height));
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    if x < -2.0 || y < -2.0 || x > (w + 1) as f64 || y > (h + 1) as f64 {
        return None;
    }

    let (x0, y0) = (x.floor(), y.floor());
    let wx = cubic_weights((x - x0) as f32);
    let wy = cubic_weights((y - y0) as f32);
    let (x0, y0) = (x0 as i64, y0 as i64);

    let stride = src.width as usize * 4;
    let mut acc = [0.0f32; 3];
    for (j, wyj) in wy.iter().enumerate() {
        let sy = y0 - 1 + j as i64;
        if sy < 0 || sy >= h {
            continue;
        }
        let row = sy as usize * stride;
        for (i, wxi) in wx.iter().enumerate() {
            let sx = x0 - 1 + i as i64;
            if sx < 0 || sx >= w {
                continue;
            }
            let k = wyj * wxi;
            let o = row + sx as usize * 4;
            for c in 0..3 {
                acc[c] += k * f32::from(src.data[o + c]);
            }
        }
    }
    Some([clamp_u8(acc[0]), clamp_u8(acc[1]), clamp_u8(acc[2])])
}

#[cfg(test)]
#[path = "../../tests/unit/render/warp.rs"]
mod tests;
