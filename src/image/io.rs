//! Codec seam and JSON helpers.
//!
//! - `ImageCodec`: decode haze/result images and transmission artifacts.
//! - `FsCodec`: the default codec, backed by the `image` crate and `.npy`
//!   arrays.
//! - `load_rgb_normalized`: decode through any codec and divide by 255.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::npy::{is_npy, load_npy_map};
use super::{ImageF32, RgbImageF32, RgbImageU8};
use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Decoder used by producers and by the depth-map estimator.
///
/// Implementations must be shareable across worker threads.
pub trait ImageCodec: Send + Sync {
    /// Decode a 3-channel image, raw range [0, 255].
    fn decode_rgb(&self, path: &Path) -> Result<RgbImageU8>;

    /// Decode a single-channel transmission artifact in [0, 1].
    fn decode_map(&self, path: &Path) -> Result<ImageF32>;
}

/// Filesystem codec. `.npy` artifacts are read as float arrays; everything
/// else goes through the formats enabled on the `image` crate, with 8-bit
/// maps divided by 255.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsCodec;

impl ImageCodec for FsCodec {
    fn decode_rgb(&self, path: &Path) -> Result<RgbImageU8> {
        let img = image::open(path)
            .map_err(|source| PipelineError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .into_rgb8();
        let w = img.width() as usize;
        let h = img.height() as usize;
        RgbImageU8::new(w, h, img.into_raw())
            .ok_or_else(|| PipelineError::EmptyImage(path.display().to_string()))
    }

    fn decode_map(&self, path: &Path) -> Result<ImageF32> {
        if is_npy(path) {
            return load_npy_map(path);
        }
        let img = image::open(path)
            .map_err(|source| PipelineError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .into_luma8();
        let w = img.width() as usize;
        let h = img.height() as usize;
        let data = img.into_raw().into_iter().map(|v| v as f32 / 255.0).collect();
        ImageF32::from_vec(w, h, data)
            .ok_or_else(|| PipelineError::EmptyImage(path.display().to_string()))
    }
}

/// Decode an RGB image and normalize it to [0, 1].
pub fn load_rgb_normalized(codec: &dyn ImageCodec, path: &Path) -> Result<RgbImageF32> {
    let raw = codec.decode_rgb(path)?;
    if raw.w == 0 || raw.h == 0 {
        return Err(PipelineError::EmptyImage(path.display().to_string()));
    }
    Ok(RgbImageF32::from_u8(&raw))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value).map_err(|source| PipelineError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| PipelineError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}
