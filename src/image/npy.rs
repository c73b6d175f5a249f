//! NumPy `.npy` transmission artifacts.
//!
//! Arrays must be `(H, W)` or `(H, W, 1)` of `f8` or `f4`. Values are taken
//! as stored; unlike 8-bit images they are not rescaled.
use super::ImageF32;
use crate::error::{PipelineError, Result};
use npyz::{NpyFile, Order};
use std::fs;
use std::path::Path;

pub fn is_npy(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("npy"))
}

pub fn load_npy_map(path: &Path) -> Result<ImageF32> {
    let bytes = fs::read(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_npy_map(&bytes, path)
}

/// Decode an in-memory `.npy` buffer; `path` only labels errors.
pub fn parse_npy_map(bytes: &[u8], path: &Path) -> Result<ImageF32> {
    let fail = |reason: String| PipelineError::Array {
        path: path.to_path_buf(),
        reason,
    };
    let npy = NpyFile::new(bytes).map_err(|e| fail(e.to_string()))?;
    let (h, w) = match *npy.shape() {
        [h, w] | [h, w, 1] => (h as usize, w as usize),
        ref other => return Err(fail(format!("expected an (H, W) array, got shape {other:?}"))),
    };
    let order = npy.order();
    let values: Vec<f32> = match npy.into_vec::<f64>() {
        Ok(v) => v.into_iter().map(|x| x as f32).collect(),
        Err(_) => NpyFile::new(bytes)
            .and_then(|npy| npy.into_vec::<f32>())
            .map_err(|e| fail(format!("expected f4 or f8 values: {e}")))?,
    };
    if values.len() != w * h {
        return Err(fail(format!(
            "{} values for shape ({h}, {w})",
            values.len()
        )));
    }
    let data = match order {
        Order::C => values,
        // Column-major: element (y, x) sits at x * h + y.
        Order::Fortran => (0..h)
            .flat_map(|y| (0..w).map(move |x| (y, x)))
            .map(|(y, x)| values[x * h + y])
            .collect(),
    };
    ImageF32::from_vec(w, h, data).ok_or_else(|| fail("empty array".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageView;

    /// Version 1.0 `.npy` buffer with a space-padded header.
    fn npy_bytes(descr: &str, fortran: bool, shape: &str, payload: &[u8]) -> Vec<u8> {
        let mut header = format!(
            "{{'descr': '{descr}', 'fortran_order': {}, 'shape': {shape}, }}",
            if fortran { "True" } else { "False" }
        );
        while (10 + header.len() + 1) % 64 != 0 {
            header.push(' ');
        }
        header.push('\n');
        let mut out = b"\x93NUMPY\x01\x00".to_vec();
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn f8(values: &[f64]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn c_order_f8_array_keeps_values() {
        let bytes = npy_bytes("<f8", false, "(2, 3)", &f8(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]));
        let map = parse_npy_map(&bytes, Path::new("t.npy")).unwrap();
        assert_eq!(map.shape(), (2, 3));
        assert_eq!(map.at(1, 0), 0.4f64 as f32);
    }

    #[test]
    fn fortran_f4_array_is_transposed_to_row_major() {
        let payload: Vec<u8> = [1.0f32, 4.0, 2.0, 5.0, 3.0, 6.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let bytes = npy_bytes("<f4", true, "(2, 3)", &payload);
        let map = parse_npy_map(&bytes, Path::new("t.npy")).unwrap();
        assert_eq!(map.data, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn non_matrix_shapes_are_rejected() {
        let bytes = npy_bytes("<f8", false, "(4,)", &f8(&[0.0; 4]));
        let err = parse_npy_map(&bytes, Path::new("t.npy")).unwrap_err();
        assert!(matches!(err, PipelineError::Array { .. }), "{err}");
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(is_npy(Path::new("a/0001_0.8_0.9.NPY")));
        assert!(!is_npy(Path::new("a/0001_0.8_0.9.png")));
    }
}
