use std::path::PathBuf;

pub mod audio;
pub mod config;
pub mod detector;
pub mod range;
pub mod runner;
pub mod segment;
pub mod util;

pub use config::Config;
pub use range::TimeRange;
pub use segment::{AnalysisMode, EpisodeId, Segment};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },
    #[error("invalid chapter pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("fingerprint data not found at: {0:?}")]
    FingerprintDataNotFound(PathBuf),
    #[cfg(feature = "rayon")]
    #[error("thread pool error: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),
    #[error("bincode error: {0}")]
    BincodeError(#[from] bincode::Error),
    #[error("serde_json error: {0}")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
