//! Wire protocol for FFT bin frames.
//!
//! A frame is `AA BB`, a `u32` little-endian byte length, then
//! `length / 4` little-endian `f32` samples. There is no checksum.
//!
//! Responsibilities:
//! - Synchronize on the magic header and decode exactly one frame per call
//! - Bound blocking reads with a deadline or a cancellation token
//! - Encode frames in the same layout
//!
//! Non-responsibilities:
//! - Opening transports
//! - Interpreting the samples

pub mod deadline;
pub mod encode;
pub mod error;
pub mod reader;

pub use deadline::{CancelToken, Deadline};
pub use encode::{encode_frame, encoded_len, write_frame};
pub use error::FrameError;
pub use fb_core::config::ResyncMode;
pub use reader::{FrameReader, LENGTH_FIELD_SIZE, MAGIC, ReadStats, ReaderState, read_frame};
