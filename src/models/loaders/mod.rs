pub mod toml_loader;

pub use toml_loader::{load_survey_config, save_survey_config};
