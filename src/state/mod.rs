//! State management module
//!
//! This module contains the core data structures for the client:
//! - MediaSource: identity and metadata of the currently active video
//! - ConversionConfig: the live settings aggregate and its submit snapshot
//! - TrimRange / CropRegion: editor-owned region values
//! - OutputArtifact: the result of a successful conversion

mod config;
mod media;

pub use config::*;
pub use media::*;
