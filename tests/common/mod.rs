#![allow(dead_code)]

pub mod synthetic_image;

use alpha_estimator::image::io::ImageCodec;
use alpha_estimator::image::{ImageF32, RgbImageU8};
use alpha_estimator::{PipelineError, Result};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// In-memory codec keyed by path.
#[derive(Default)]
pub struct MemoryCodec {
    rgb: HashMap<PathBuf, RgbImageU8>,
    maps: HashMap<PathBuf, ImageF32>,
}

impl MemoryCodec {
    pub fn insert_rgb(&mut self, path: impl Into<PathBuf>, img: RgbImageU8) {
        self.rgb.insert(path.into(), img);
    }

    pub fn insert_map(&mut self, path: impl Into<PathBuf>, map: ImageF32) {
        self.maps.insert(path.into(), map);
    }
}

fn missing(path: &Path) -> PipelineError {
    PipelineError::Io {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::NotFound, "not in memory codec"),
    }
}

impl ImageCodec for MemoryCodec {
    fn decode_rgb(&self, path: &Path) -> Result<RgbImageU8> {
        self.rgb.get(path).cloned().ok_or_else(|| missing(path))
    }

    fn decode_map(&self, path: &Path) -> Result<ImageF32> {
        self.maps.get(path).cloned().ok_or_else(|| missing(path))
    }
}

/// Write `map` as a C-order little-endian `f8` `.npy` file.
pub fn write_npy(path: &Path, map: &ImageF32) {
    let mut header = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}), }}",
        map.h, map.w
    );
    while (10 + header.len() + 1) % 64 != 0 {
        header.push(' ');
    }
    header.push('\n');
    let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
    bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    for v in &map.data {
        bytes.extend_from_slice(&(*v as f64).to_le_bytes());
    }
    std::fs::write(path, bytes).expect("write npy");
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("alpha_estimator_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
