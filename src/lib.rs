//! ytclip library
//!
//! Turns a video reference and an ordered list of time segments into one
//! stitched clip: fetch the source, cut each segment by stream copy and
//! concatenate the successful cuts in request order. The pipeline runs behind
//! ports so every external tool can be replaced in tests.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod http;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{ClipRequest, ClipResponse, RunId, Segment};
pub use error::{YtClipError, YtClipResult};
