use crate::error::{PipelineError, Result};
use crate::estimator::{DepthMapOptions, EstimationMode, GridSearchOptions};
use crate::naming::DEFAULT_INDEX_WIDTH;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write the run report as pretty JSON here.
    pub json_out: Option<PathBuf>,
}

/// Runtime configuration for one pipeline run. Every field has a default, so
/// `{}` is a valid config for the grid-search mode over the default folders.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: EstimationMode,
    pub haze_dir: PathBuf,
    pub result_dir: PathBuf,
    pub transmission_dir: PathBuf,
    /// Width of the index-key prefix shared by correlated file names.
    pub index_width: usize,
    /// Extension of haze images looked up from transmission artifact stems.
    pub haze_extension: String,
    /// Producer and consumer thread count. Defaults to the available
    /// parallelism.
    pub workers: Option<usize>,
    pub grid_search: GridSearchOptions,
    pub depth_map: DepthMapOptions,
    pub output: OutputConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: EstimationMode::GridSearch,
            haze_dir: PathBuf::from("./HazeImages/TestImages"),
            result_dir: PathBuf::from("./ClearResultImages"),
            transmission_dir: PathBuf::from("./ClearImages/TransImages"),
            index_width: DEFAULT_INDEX_WIDTH,
            haze_extension: "jpg".to_string(),
            workers: None,
            grid_search: GridSearchOptions::default(),
            depth_map: DepthMapOptions::default(),
            output: OutputConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.index_width == 0 {
            return Err(PipelineError::InvalidOption {
                field: "index_width",
                reason: "must be at least 1".to_string(),
            });
        }
        self.grid_search.validate()?;
        self.depth_map.validate()
    }

    /// Threads per pool; never zero.
    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(|| thread::available_parallelism().map_or(1, |n| n.get()))
            .max(1)
    }
}

/// Read and validate a JSON config.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let contents = fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: PipelineConfig =
        serde_json::from_str(&contents).map_err(|source| PipelineError::Config {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::TransmissionSource;

    #[test]
    fn empty_object_uses_defaults() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.mode, EstimationMode::GridSearch);
        assert_eq!(config.index_width, 4);
        assert_eq!(config.grid_search, GridSearchOptions::default());
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn nested_sections_merge_with_defaults() {
        let json = r#"{
            "mode": "depth_map",
            "workers": 3,
            "depth_map": { "transmission_source": "artifact", "quantile": 0.01 },
            "output": { "json_out": "out/report.json" }
        }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.mode, EstimationMode::DepthMap);
        assert_eq!(config.worker_count(), 3);
        assert_eq!(
            config.depth_map.transmission_source,
            TransmissionSource::Artifact
        );
        assert_eq!(config.depth_map.quantile, 0.01);
        assert_eq!(config.depth_map.guided_radius, 60);
        assert_eq!(
            config.output.json_out.as_deref(),
            Some(Path::new("out/report.json"))
        );
    }

    #[test]
    fn load_config_rejects_an_empty_search_range() {
        let path = std::env::temp_dir().join(format!(
            "alpha_estimator_bad_range_{}.json",
            std::process::id()
        ));
        fs::write(&path, r#"{ "grid_search": { "step": 0.0 } }"#).unwrap();
        let err = load_config(&path).unwrap_err();
        let _ = fs::remove_file(&path);
        assert!(
            matches!(err, PipelineError::InvalidOption { field: "grid_search.step", .. }),
            "{err}"
        );

        let reversed: PipelineConfig = serde_json::from_str(
            r#"{ "grid_search": { "initial_alpha": 0.95, "final_alpha": 0.8 } }"#,
        )
        .unwrap();
        assert!(reversed.validate().is_err());
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn statistics_modes_parse_but_are_not_implemented() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "mode": "transmission_histogram" }"#).unwrap();
        assert!(config.mode.ensure_implemented().is_err());
    }
}
