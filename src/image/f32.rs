//! Owned single-channel f32 map in row-major layout.
//!
//! Holds transmission maps, depth proxies and the intermediate box-filter
//! statistics of the guided filter. Values are not clamped; callers that need
//! the [0, 1] range normalize on the way in.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageF32 {
    /// Map width in pixels
    pub w: usize,
    /// Map height in pixels
    pub h: usize,
    /// Backing storage in row-major order (`h * w` values)
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized map of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self::filled(w, h, 0.0)
    }

    pub fn filled(w: usize, h: usize, value: f32) -> Self {
        Self {
            w,
            h,
            data: vec![value; w * h],
        }
    }

    /// Wrap an existing row-major buffer. Returns `None` when the length does
    /// not match `w * h`.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Option<Self> {
        (data.len() == w * h).then_some(Self { w, h, data })
    }

    /// Build a map from `rows[h][w]`. Ragged input yields `None`.
    pub fn from_rows(rows: &[Vec<f32>]) -> Option<Self> {
        let h = rows.len();
        let w = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != w) {
            return None;
        }
        Some(Self {
            w,
            h,
            data: rows.concat(),
        })
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Apply `f` to every value, producing a new map of the same shape.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            w: self.w,
            h: self.h,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl crate::image::traits::ImageView for ImageF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}

impl crate::image::traits::ImageViewMut for ImageF32 {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.w;
        let end = start + self.w;
        &mut self.data[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageView;

    #[test]
    fn from_rows_keeps_row_major_order() {
        let map = ImageF32::from_rows(&[vec![0.1, 0.2], vec![0.3, 0.4]]).unwrap();
        assert_eq!(map.shape(), (2, 2));
        assert_eq!(map.at(1, 0), 0.3);
        assert_eq!(map.get(1, 0), 0.2);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(ImageF32::from_rows(&[vec![0.1, 0.2], vec![0.3]]).is_none());
        assert!(ImageF32::from_vec(2, 2, vec![0.0; 3]).is_none());
    }
}
