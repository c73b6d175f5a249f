//! Scene-depth proxies derived from a haze image.
//!
//! The color-attenuation prior models depth as a linear function of HSV value
//! and saturation, `d = θ0 + θ1·v + θ2·s`, followed by a minimum filter that
//! suppresses white objects near the camera.
use crate::image::{ImageF32, ImageView, ImageViewMut, RgbImageF32};

/// Produces an unrefined depth map with the haze image's `H × W` shape.
pub trait DepthEstimator: Send + Sync {
    fn depth_map(&self, haze: &RgbImageF32) -> ImageF32;
}

pub const CAP_THETA0: f32 = 0.121_779;
pub const CAP_THETA1: f32 = 0.959_710;
pub const CAP_THETA2: f32 = -0.780_245;

#[derive(Clone, Copy, Debug)]
pub struct ColorAttenuationDepth {
    /// Side of the square minimum-filter window (pixels).
    pub patch: usize,
}

impl Default for ColorAttenuationDepth {
    fn default() -> Self {
        Self { patch: 15 }
    }
}

impl ColorAttenuationDepth {
    pub fn new(patch: usize) -> Self {
        Self { patch }
    }

    /// Pointwise prior without the minimum filter, clamped at zero.
    pub fn raw_depth(haze: &RgbImageF32) -> ImageF32 {
        let data = haze
            .data
            .iter()
            .map(|&[r, g, b]| {
                let v = r.max(g).max(b);
                let min = r.min(g).min(b);
                let s = if v > 0.0 { (v - min) / v } else { 0.0 };
                (CAP_THETA0 + CAP_THETA1 * v + CAP_THETA2 * s).max(0.0)
            })
            .collect();
        ImageF32 {
            w: haze.w,
            h: haze.h,
            data,
        }
    }
}

impl DepthEstimator for ColorAttenuationDepth {
    fn depth_map(&self, haze: &RgbImageF32) -> ImageF32 {
        let raw = Self::raw_depth(haze);
        min_filter(&raw, self.patch / 2)
    }
}

/// Separable square minimum filter of radius `radius` with edge clamping.
pub fn min_filter(src: &ImageF32, radius: usize) -> ImageF32 {
    if radius == 0 || src.is_empty() {
        return src.clone();
    }
    let mut horiz = ImageF32::new(src.w, src.h);
    for y in 0..src.h {
        let row = src.row(y);
        let out = horiz.row_mut(y);
        for (x, dst) in out.iter_mut().enumerate() {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius).min(src.w - 1);
            *dst = row[x0..=x1].iter().copied().fold(f32::INFINITY, f32::min);
        }
    }
    let mut out = ImageF32::new(src.w, src.h);
    for y in 0..src.h {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius).min(src.h - 1);
        for x in 0..src.w {
            let v = (y0..=y1)
                .map(|yy| horiz.get(x, yy))
                .fold(f32::INFINITY, f32::min);
            out.set(x, y, v);
        }
    }
    out
}
