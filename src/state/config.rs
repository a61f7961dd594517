//! Conversion configuration
//!
//! This module contains everything the Convert call is built from:
//! - ConversionConfig: the live, user-mutated settings aggregate
//! - TrimRange / CropRegion: the region values mirrored in from the editors
//! - ConvertRequest: the immutable payload snapshot taken at submit time
//! - OutputArtifact: the result of a successful conversion

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_FONT_SIZE, DEFAULT_FONT_STYLE, DEFAULT_FPS, DEFAULT_OUTPUT_WIDTH,
    DEFAULT_SPEED_FACTOR, DEFAULT_TEXT_COLOR,
};
use crate::geometry::RectF;

/// Output container for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Gif,
    Mp4,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Gif => "gif",
            OutputFormat::Mp4 => "mp4",
        }
    }

    /// The format a submit derives from the audio flag: audio forces MP4.
    pub fn for_audio(include_audio: bool) -> Self {
        if include_audio {
            OutputFormat::Mp4
        } else {
            OutputFormat::Gif
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anchor position for the text overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextPosition {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Trim window in seconds. Invariant: `0 <= start <= end <= duration`,
/// maintained by the trim editor on every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// The whole clip.
    pub fn full(duration: f64) -> Self {
        Self { start: 0.0, end: duration.max(0.0) }
    }

    pub fn is_valid_for(&self, duration: f64) -> bool {
        0.0 <= self.start && self.start <= self.end && self.end <= duration
    }
}

/// Crop rectangle in natural pixels of the source frame.
/// Invariant: `width >= 1`, `height >= 1`, `x + width <= natural_width`,
/// `y + height <= natural_height`. Absence (`Option::None` at the usage
/// sites) means no crop, the full frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Commit a working rect by rounding to whole pixels. Rounding a
    /// float rect that barely fits can land one pixel outside the frame,
    /// so committed regions go through [`clamped_to`](Self::clamped_to)
    /// after this.
    pub fn from_rect(rect: RectF) -> Self {
        Self {
            x: rect.x.round().max(0.0) as u32,
            y: rect.y.round().max(0.0) as u32,
            width: rect.width.round().max(1.0) as u32,
            height: rect.height.round().max(1.0) as u32,
        }
    }

    /// Clamp the integer region into the frame: size first, then origin,
    /// so the result always satisfies the bounds invariant.
    pub fn clamped_to(self, natural_width: u32, natural_height: u32) -> Self {
        let width = self.width.clamp(1, natural_width.max(1));
        let height = self.height.clamp(1, natural_height.max(1));
        Self {
            x: self.x.min(natural_width.saturating_sub(width)),
            y: self.y.min(natural_height.saturating_sub(height)),
            width,
            height,
        }
    }

    pub fn to_rect(self) -> RectF {
        RectF::new(self.x as f64, self.y as f64, self.width as f64, self.height as f64)
    }

    pub fn fits_within(&self, natural_width: u32, natural_height: u32) -> bool {
        self.width >= 1
            && self.height >= 1
            && self.x as u64 + self.width as u64 <= natural_width as u64
            && self.y as u64 + self.height as u64 <= natural_height as u64
    }

    /// True when the region is exactly the full frame at the origin;
    /// the payload treats that as "no crop".
    pub fn covers_frame(&self, natural_width: u32, natural_height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.width == natural_width && self.height == natural_height
    }
}

/// Text overlay parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub text: String,
    pub font_size: u32,
    pub position: TextPosition,
    pub color: String,
    pub bg_color: Option<String>,
    pub font_style: String,
}

impl Default for TextOverlay {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: DEFAULT_FONT_SIZE,
            position: TextPosition::Center,
            color: DEFAULT_TEXT_COLOR.to_string(),
            bg_color: None,
            font_style: DEFAULT_FONT_STYLE.to_string(),
        }
    }
}

/// The live settings aggregate, mutated by user input and presets and read
/// exactly once, as a snapshot, when a Convert is submitted.
///
/// `output_format` is a display hint only (presets set it); the submitted
/// format is derived from `include_audio` at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    pub fps: u32,
    pub width: u32,
    pub include_audio: bool,
    pub speed_factor: f64,
    pub reverse: bool,
    pub output_format: OutputFormat,
    pub text: TextOverlay,
    pub trim: TrimRange,
    pub crop: Option<CropRegion>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            width: DEFAULT_OUTPUT_WIDTH,
            include_audio: false,
            speed_factor: DEFAULT_SPEED_FACTOR,
            reverse: false,
            output_format: OutputFormat::Gif,
            text: TextOverlay::default(),
            trim: TrimRange::new(0.0, 0.0),
            crop: None,
        }
    }
}

/// Immutable payload for `POST /convert`, snapshotted at submit time so
/// concurrent edits cannot relabel an in-flight request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub filename: String,
    pub fps: u32,
    pub width: u32,
    pub start_time: f64,
    pub end_time: f64,
    pub text: Option<String>,
    pub font_size: u32,
    pub text_position: TextPosition,
    pub text_color: String,
    pub text_bg_color: Option<String>,
    pub font_style: String,
    pub speed_factor: f64,
    pub reverse: bool,
    pub include_audio: bool,
    pub output_format: OutputFormat,
    pub crop_x: Option<u32>,
    pub crop_y: Option<u32>,
    pub crop_w: Option<u32>,
    pub crop_h: Option<u32>,
}

impl ConvertRequest {
    /// Snapshot `config` for `filename`. This is the single place the
    /// output format is derived from the audio flag.
    pub fn from_config(filename: impl Into<String>, config: &ConversionConfig) -> Self {
        let output_format = OutputFormat::for_audio(config.include_audio);
        let text = if config.text.text.is_empty() {
            None
        } else {
            Some(config.text.text.clone())
        };
        Self {
            filename: filename.into(),
            fps: config.fps,
            width: config.width,
            start_time: config.trim.start,
            end_time: config.trim.end,
            text,
            font_size: config.text.font_size,
            text_position: config.text.position,
            text_color: config.text.color.clone(),
            text_bg_color: config.text.bg_color.clone(),
            font_style: config.text.font_style.clone(),
            speed_factor: config.speed_factor,
            reverse: config.reverse,
            include_audio: output_format == OutputFormat::Mp4,
            output_format,
            crop_x: config.crop.map(|crop| crop.x),
            crop_y: config.crop.map(|crop| crop.y),
            crop_w: config.crop.map(|crop| crop.width),
            crop_h: config.crop.map(|crop| crop.height),
        }
    }
}

/// Result of a successful Convert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputArtifact {
    pub url: String,
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConversionConfig::default();
        assert_eq!(config.fps, 10);
        assert_eq!(config.width, 320);
        assert!(!config.include_audio);
        assert_eq!(config.output_format, OutputFormat::Gif);
        assert!(config.crop.is_none());
    }

    #[test]
    fn test_output_format_derivation() {
        assert_eq!(OutputFormat::for_audio(true), OutputFormat::Mp4);
        assert_eq!(OutputFormat::for_audio(false), OutputFormat::Gif);
    }

    #[test]
    fn test_snapshot_derives_format_from_audio_not_hint() {
        let mut config = ConversionConfig::default();
        config.output_format = OutputFormat::Mp4; // stale display hint
        config.include_audio = false;
        let request = ConvertRequest::from_config("clip.mp4", &config);
        assert_eq!(request.output_format, OutputFormat::Gif);
        assert!(!request.include_audio);
    }

    #[test]
    fn test_snapshot_empty_text_becomes_null() {
        let config = ConversionConfig::default();
        let request = ConvertRequest::from_config("clip.mp4", &config);
        assert_eq!(request.text, None);
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("text").unwrap().is_null());
    }

    #[test]
    fn test_snapshot_crop_fields() {
        let mut config = ConversionConfig::default();
        config.crop = Some(CropRegion { x: 10, y: 20, width: 300, height: 200 });
        let request = ConvertRequest::from_config("clip.mp4", &config);
        assert_eq!(request.crop_x, Some(10));
        assert_eq!(request.crop_h, Some(200));
    }

    #[test]
    fn test_wire_enum_spellings() {
        assert_eq!(serde_json::to_value(OutputFormat::Mp4).unwrap(), "mp4");
        assert_eq!(serde_json::to_value(TextPosition::BottomLeft).unwrap(), "bottom-left");
        assert_eq!(serde_json::to_value(TextPosition::Center).unwrap(), "center");
    }

    #[test]
    fn test_trim_range_validity() {
        assert!(TrimRange::new(0.0, 30.0).is_valid_for(30.0));
        assert!(!TrimRange::new(-1.0, 10.0).is_valid_for(30.0));
        assert!(!TrimRange::new(10.0, 5.0).is_valid_for(30.0));
        assert!(!TrimRange::new(0.0, 31.0).is_valid_for(30.0));
    }

    #[test]
    fn test_crop_region_bounds() {
        let crop = CropRegion { x: 100, y: 100, width: 500, height: 500 };
        assert!(crop.fits_within(600, 600));
        assert!(!crop.fits_within(599, 600));
        assert!(CropRegion { x: 0, y: 0, width: 600, height: 600 }.covers_frame(600, 600));
        assert!(!crop.covers_frame(600, 600));
    }

    #[test]
    fn test_fits_within_is_total_at_extreme_values() {
        // x + width would overflow u32; the check must still reject.
        let crop = CropRegion { x: u32::MAX, y: 0, width: u32::MAX, height: 10 };
        assert!(!crop.fits_within(1920, 1080));
        let crop = CropRegion { x: 0, y: u32::MAX, width: 10, height: u32::MAX };
        assert!(!crop.fits_within(1920, 1080));
    }

    #[test]
    fn test_clamped_to_restores_bounds_invariant() {
        // One pixel past the right edge, as rounding a half-pixel rect
        // can produce.
        let crop = CropRegion { x: 101, y: 0, width: 1820, height: 1080 }.clamped_to(1920, 1080);
        assert!(crop.fits_within(1920, 1080));
        assert_eq!((crop.x, crop.width), (100, 1820));
        // Oversized regions shrink before the origin moves.
        let crop = CropRegion { x: 50, y: 50, width: 5000, height: 5000 }.clamped_to(1920, 1080);
        assert_eq!(crop, CropRegion { x: 0, y: 0, width: 1920, height: 1080 });
    }
}
