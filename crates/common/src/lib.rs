pub mod config;
pub mod errors;
pub mod logging;

pub use config::RagConfig;
pub use errors::{PipelineError, PipelineResult};
pub use logging::init_logging;
