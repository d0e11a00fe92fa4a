//! Microphone clip capture.

pub mod recorder;

pub use recorder::{ClipRecorder, CpalClipSource};
