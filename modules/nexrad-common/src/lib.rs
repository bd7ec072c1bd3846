pub mod config;
pub mod error;
pub mod file_config;
pub mod types;

pub use config::{Config, RenderSettings};
pub use error::{CommonError, Result};
pub use file_config::{load_file_config, FileConfig};
pub use types::*;
