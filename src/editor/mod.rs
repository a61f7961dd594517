//! Interactive region editors
//!
//! Both editors are toolkit-free: the hosting layer feeds them field
//! values and pointer coordinates, and reads validated regions back out.
//! - CropRegionEditor: rectangle over the video frame, drag/resize
//! - TrimRangeEditor: dual-handle time range over the clip duration

mod crop;
mod trim;

pub use crop::*;
pub use trim::*;
