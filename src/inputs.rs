//! Input enumeration: directory listings and the haze lookup table.
use crate::error::{PipelineError, Result};
use crate::image::RgbImageF32;
use crate::naming::FilenameParser;
use log::warn;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// An image resolved to its index key and normalized tensor.
#[derive(Clone, Debug)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub key: String,
    pub tensor: RgbImageF32,
}

/// Regular, non-hidden files of `dir`, sorted by path.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_err = |source| PipelineError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !entry.file_type().map_err(io_err)?.is_file() {
            continue;
        }
        files.push(entry.path());
    }
    files.sort();
    Ok(files)
}

#[derive(Clone, Debug, Default)]
pub struct GridSearchInputs {
    /// Dehazed result images, one task each.
    pub results: Vec<PathBuf>,
    pub haze_lookup: HashMap<String, PathBuf>,
}

/// Index haze images by key and list the dehazed results to process.
pub fn enumerate_grid_search_inputs(
    haze_dir: &Path,
    result_dir: &Path,
    parser: &dyn FilenameParser,
) -> Result<GridSearchInputs> {
    let results = list_files(result_dir)?;
    Ok(GridSearchInputs {
        results,
        haze_lookup: haze_lookup(list_files(haze_dir)?, parser),
    })
}

/// Key -> path table. Names too short to carry a key are skipped.
pub fn haze_lookup(
    haze_images: impl IntoIterator<Item = PathBuf>,
    parser: &dyn FilenameParser,
) -> HashMap<String, PathBuf> {
    let mut table = HashMap::new();
    for path in haze_images {
        match parser.index_key(&path) {
            Ok(key) => {
                if let Some(previous) = table.insert(key.clone(), path) {
                    warn!("index key {key} shared by {}", previous.display());
                }
            }
            Err(err) => warn!("skipping haze image: {err}"),
        }
    }
    table
}

pub fn enumerate_transmission_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    list_files(dir)
}
