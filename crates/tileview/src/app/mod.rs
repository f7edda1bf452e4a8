mod config;
mod input;
mod loop_runner;
mod metrics;
mod presenter;

pub use config::{load_view_config, load_view_config_file, ConfigError, ViewConfig, CONFIG_ENV_VAR};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
