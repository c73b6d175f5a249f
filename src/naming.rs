//! Filename conventions shared by the haze, result and transmission folders.
//!
//! Every artifact name starts with a fixed-width index key. Haze images and
//! transmission artifacts additionally carry the scattering coefficient and
//! the ground-truth atmospheric light: `<key>_<beta>_<alpha>.<ext>`, e.g.
//! `0042_0.8_0.85.png`. Dehazed results only need the key prefix.
use crate::error::{PipelineError, Result};
use std::path::Path;

pub const DEFAULT_INDEX_WIDTH: usize = 4;

#[derive(Clone, Debug, PartialEq)]
pub struct ArtifactName {
    pub beta: f64,
    pub alpha: f64,
    pub key: String,
}

pub trait FilenameParser: Send + Sync {
    /// Fixed-width key prefix of the file name.
    fn index_key(&self, path: &Path) -> Result<String>;

    /// Scattering coefficient, ground-truth alpha and key of an artifact.
    fn parse(&self, path: &Path) -> Result<ArtifactName>;
}

#[derive(Clone, Copy, Debug)]
pub struct UnderscoreNameParser {
    pub index_width: usize,
}

impl Default for UnderscoreNameParser {
    fn default() -> Self {
        Self {
            index_width: DEFAULT_INDEX_WIDTH,
        }
    }
}

impl UnderscoreNameParser {
    pub fn new(index_width: usize) -> Self {
        Self { index_width }
    }
}

impl FilenameParser for UnderscoreNameParser {
    fn index_key(&self, path: &Path) -> Result<String> {
        let name = file_name(path)?;
        let key: String = name.chars().take(self.index_width).collect();
        if self.index_width == 0 || key.chars().count() < self.index_width {
            return Err(PipelineError::FileName {
                name: name.to_string(),
                reason: format!("shorter than the {}-character index key", self.index_width),
            });
        }
        Ok(key)
    }

    fn parse(&self, path: &Path) -> Result<ArtifactName> {
        let name = file_name(path)?;
        let key = self.index_key(path)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name);
        let fields: Vec<&str> = stem.split('_').collect();
        let fail = |reason: String| PipelineError::FileName {
            name: name.to_string(),
            reason,
        };
        if fields.len() < 3 {
            return Err(fail(format!(
                "expected <key>_<beta>_<alpha>, found {} field(s)",
                fields.len()
            )));
        }
        let number = |field: &str, what: &str| -> Result<f64> {
            field
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| fail(format!("{what} field {field:?} is not a number")))
        };
        let beta = number(fields[1], "beta")?;
        let alpha = number(fields[2], "alpha")?;
        if alpha <= 0.0 {
            return Err(fail(format!("alpha must be positive, got {alpha}")));
        }
        Ok(ArtifactName { beta, alpha, key })
    }
}

fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PipelineError::FileName {
            name: path.display().to_string(),
            reason: "not a UTF-8 file name".to_string(),
        })
}
