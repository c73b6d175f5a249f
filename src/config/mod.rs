pub mod pipeline;

pub use self::pipeline::{load_config, OutputConfig, PipelineConfig};
