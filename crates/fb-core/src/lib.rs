//! Configuration, types, and shared structures for fftbin.
//!
//! This crate holds the decoded frame type, the spectrum view used by
//! consumers, and the TOML configuration shared across the workspace.

pub mod config;
pub mod error;
pub mod frame;

pub use config::{LinkConfig, ResyncMode};
pub use error::CoreError;
pub use frame::{Frame, Peak, Spectrum};
