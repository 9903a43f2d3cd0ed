pub mod config;
pub mod error;
pub mod export;
pub mod input;
pub mod state;
pub mod trial;
pub use config::ExperimentConfig;
pub use error::{ConfigError, ExperimentError, ExportError};
pub use export::{CsvExporter, Exporter};
pub use input::Key;
pub use state::{ExperimentEvent, TrialController};
pub use trial::{Trial, TrialTimestamps};
