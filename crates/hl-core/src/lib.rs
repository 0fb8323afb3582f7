//! hl-core: stable foundation for heatload.
//!
//! Contains:
//! - numeric (Real + tolerances + decimal-faithful rounding)
//! - load (the 7-slot LoadVector and its field names)
//! - error (shared error types)

pub mod error;
pub mod load;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use error::{HlError, HlResult};
pub use load::*;
pub use numeric::*;
