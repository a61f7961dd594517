//! Shared defaults and bounds for conversion settings.
//! These values mirror what the backend accepts; the editors and the CLI
//! both read them instead of carrying their own copies.

/// Smallest crop dimension, in natural pixels, per axis.
pub const MIN_CROP_DIMENSION: f64 = 10.0;

/// Fraction of the frame used to seed the visual crop selection when no
/// crop exists yet.
pub const DEFAULT_VISUAL_CROP_FRACTION: f64 = 0.75;

pub const DEFAULT_FPS: u32 = 10;
pub const MIN_FPS: u32 = 1;
pub const MAX_FPS: u32 = 60;

pub const DEFAULT_OUTPUT_WIDTH: u32 = 320;
pub const MIN_OUTPUT_WIDTH: u32 = 100;
pub const MAX_OUTPUT_WIDTH: u32 = 1920;

pub const DEFAULT_SPEED_FACTOR: f64 = 1.0;
pub const MIN_SPEED_FACTOR: f64 = 0.1;
pub const MAX_SPEED_FACTOR: f64 = 5.0;

pub const DEFAULT_FONT_SIZE: u32 = 20;
pub const DEFAULT_TEXT_COLOR: &str = "white";
pub const DEFAULT_FONT_STYLE: &str = "Arial";

/// Font styles the backend can render for text overlays.
pub const FONT_STYLES: &[&str] = &[
    "Arial",
    "Times New Roman",
    "Courier New",
    "Verdana",
    "Georgia",
    "Comic Sans MS",
];

/// File extensions accepted for local selection. Anything else is rejected
/// before an upload is attempted.
pub const ALLOWED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "webm", "mkv"];

/// Upload body chunk size for progress reporting.
pub const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;
