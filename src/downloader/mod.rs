pub mod controller;
pub mod core;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod source;

pub use controller::DownloadController;
pub use core::ChunkedDownloader;
pub use error::DownloadError;
pub use models::{DownloadOutcome, DownloadProgress, DownloadTask, OverwritePolicy, PauseSignal};
pub use pipeline::{DownloadPipeline, PipelineConfig, PipelineError, PipelineReport, Target};
