//! hl-results: content-addressed run store for calculation reports.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::{compute_fingerprint, compute_run_id};
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    #[error("Stored result for run {run_id} does not match its fingerprint")]
    FingerprintMismatch { run_id: String },
}
