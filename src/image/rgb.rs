//! Three-channel f32 tensor (`[H, W, 3]`) normalized to [0, 1].
use super::{ImageView, RgbImageU8};

#[derive(Clone, Debug, PartialEq)]
pub struct RgbImageF32 {
    pub w: usize,
    pub h: usize,
    pub data: Vec<[f32; 3]>,
}

impl RgbImageF32 {
    pub fn filled(w: usize, h: usize, px: [f32; 3]) -> Self {
        Self {
            w,
            h,
            data: vec![px; w * h],
        }
    }

    pub fn from_pixels(w: usize, h: usize, data: Vec<[f32; 3]>) -> Option<Self> {
        (data.len() == w * h).then_some(Self { w, h, data })
    }

    /// Normalize a raw codec buffer by dividing every channel by 255.
    pub fn from_u8(raw: &RgbImageU8) -> Self {
        let data = raw
            .data
            .chunks_exact(3)
            .map(|c| [c[0] as f32 / 255.0, c[1] as f32 / 255.0, c[2] as f32 / 255.0])
            .collect();
        Self {
            w: raw.w,
            h: raw.h,
            data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [f32; 3] {
        self.data[y * self.w + x]
    }

    /// Maximum channel value at `(h, w)`.
    pub fn max_channel(&self, h: usize, w: usize) -> f32 {
        let [r, g, b] = self.at(h, w);
        r.max(g).max(b)
    }
}

impl ImageView for RgbImageF32 {
    type Pixel = [f32; 3];

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[[f32; 3]] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}
