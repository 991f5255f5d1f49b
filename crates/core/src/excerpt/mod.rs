//! Excerpt derivation: measure a staged video and cut a short clip from it.
//!
//! The engine is a small state machine over an external [`MediaTool`]. Its
//! three-way [`ExcerptOutcome`] decides what happens to the source file.

mod config;
mod engine;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::ExcerptConfig;
pub use engine::ExcerptEngine;
pub use error::ExcerptError;
pub use ffmpeg::FfmpegTool;
pub use traits::MediaTool;
pub use types::{
    classify_duration, Excerpt, ExcerptOutcome, ExcerptReport, ExcerptState, ExcerptWindow,
};
