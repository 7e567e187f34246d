//! Storyreel domain crate.
//!
//! Everything needed to turn a narration track, a background clip and a short
//! story into a captioned portrait video, with no HTTP concerns. The API crate
//! drives [`pipeline::render`] once per request.

pub mod command;
pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod naming;
pub mod pipeline;
pub mod subtitles;
pub mod workspace;
