//! Command-line front end: one invocation walks a video through the
//! whole pipeline (upload or URL fetch, analysis, conversion, download).

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::backend::{artifact_filename, BackendClient, ProgressFn};
use crate::constants::FONT_STYLES;
use crate::editor::{
    AspectRatioMode, CropField, CropRegionEditor, TrimRangeEditor, ASPECT_RATIO_CHOICES,
};
use crate::error::ClientError;
use crate::pipeline::ConversionPipeline;
use crate::presets::PresetResolver;
use crate::probe::{MediaProbe, NullProbe, ProbedMetadata, StaticProbe};
use crate::state::TextPosition;
use crate::utils::{format_seconds, parse_crop_spec, parse_size_spec};

#[derive(Parser, Debug)]
#[command(
    name = "vid2gif",
    version,
    about = "Convert a video to GIF or MP4 through the conversion backend"
)]
pub struct Cli {
    /// Backend base URL.
    #[arg(long, default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Local video file to upload (MP4, AVI, MOV, WEBM, or MKV).
    #[arg(long, conflicts_with = "url")]
    pub file: Option<PathBuf>,

    /// Remote video URL for the backend to fetch.
    #[arg(long)]
    pub url: Option<String>,

    /// Apply a named preset before other settings.
    #[arg(long)]
    pub preset: Option<String>,

    /// List the available presets and exit.
    #[arg(long, default_value_t = false)]
    pub list_presets: bool,

    /// Output frame rate (1-60).
    #[arg(long)]
    pub fps: Option<u32>,

    /// Output width in pixels (100-1920); height keeps the aspect.
    #[arg(long)]
    pub width: Option<u32>,

    /// Trim start, in seconds.
    #[arg(long)]
    pub start: Option<f64>,

    /// Trim end, in seconds.
    #[arg(long)]
    pub end: Option<f64>,

    /// Crop region as `x,y,w,h` in natural pixels.
    #[arg(long)]
    pub crop: Option<String>,

    /// Aspect-ratio lock for the crop: custom, original, 16:9, 4:3, 1:1,
    /// 3:2, 2:3, or 9:16.
    #[arg(long)]
    pub aspect: Option<String>,

    /// Natural video dimensions as `WxH`, when known up front.
    #[arg(long)]
    pub natural_size: Option<String>,

    /// Source duration in seconds, when known up front.
    #[arg(long)]
    pub duration: Option<f64>,

    /// Overlay text.
    #[arg(long)]
    pub text: Option<String>,

    /// Overlay font size.
    #[arg(long)]
    pub font_size: Option<u32>,

    /// Overlay position: center, top-left, top-right, bottom-left,
    /// bottom-right.
    #[arg(long)]
    pub text_position: Option<String>,

    /// Overlay text color.
    #[arg(long)]
    pub text_color: Option<String>,

    /// Overlay background color (none by default).
    #[arg(long)]
    pub text_bg_color: Option<String>,

    /// Overlay font style.
    #[arg(long)]
    pub font_style: Option<String>,

    /// Playback speed factor (0.1-5.0).
    #[arg(long)]
    pub speed: Option<f64>,

    /// Reverse playback.
    #[arg(long, default_value_t = false)]
    pub reverse: bool,

    /// Keep the audio track (forces MP4 output).
    #[arg(long, default_value_t = false)]
    pub audio: bool,

    /// Where to write the result; defaults to the artifact's filename.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub async fn run(cli: Cli) -> Result<(), ClientError> {
    let presets = PresetResolver::builtin();
    if cli.list_presets {
        for preset in presets.presets() {
            let settings = &preset.settings;
            println!(
                "{:32} {:>2} fps, {:>4}px{}{}",
                preset.name,
                settings.fps,
                settings.width,
                if settings.include_audio { ", audio" } else { "" },
                if settings.reverse { ", reversed" } else { "" },
            );
        }
        return Ok(());
    }

    let probe = build_probe(&cli)?;
    let mut pipeline = ConversionPipeline::new(BackendClient::new(&cli.api_url), probe);

    match (&cli.file, &cli.url) {
        (Some(file), _) => {
            let progress: ProgressFn = Arc::new(|percent| {
                eprint!("\ruploading... {:3}%", percent);
            });
            pipeline.select_file(file, Some(progress)).await?;
            eprintln!();
        }
        (None, Some(url)) => pipeline.select_url(url).await?,
        (None, None) => {
            return Err(ClientError::InvalidInput(
                "Select a video with --file or provide a --url.".to_string(),
            ));
        }
    }

    pipeline.analyze().await?;
    if !pipeline.state().scene_marks().is_empty() {
        tracing::info!(marks = pipeline.state().scene_marks().len(), "scene changes detected");
    }

    if let Some(name) = &cli.preset {
        if !presets.apply(name, pipeline.state_mut().config_mut()) {
            return Err(ClientError::InvalidInput(format!(
                "Unknown preset '{}'. Use --list-presets to see what exists.",
                name
            )));
        }
    }
    apply_settings(&cli, &mut pipeline)?;
    apply_trim(&cli, &mut pipeline)?;
    apply_crop(&cli, &mut pipeline)?;

    let trim = pipeline.state().config().trim;
    tracing::info!(
        start = %format_seconds(trim.start),
        end = %format_seconds(trim.end),
        "converting"
    );
    pipeline.convert().await?;
    let artifact = pipeline
        .state()
        .output()
        .cloned()
        .ok_or_else(|| ClientError::InvalidInput("Conversion produced no artifact.".to_string()))?;

    let fallback = format!("output.{}", artifact.format.as_str());
    let dest = cli
        .output
        .unwrap_or_else(|| artifact_filename(&artifact.url, &fallback));
    let written = pipeline.backend().download(&artifact.url, &dest).await?;
    eprintln!("wrote {} ({} bytes, {})", dest.display(), written, artifact.format);
    Ok(())
}

/// Seed the local probe from what the caller already knows; the browser
/// would learn this from its preview element, the CLI takes flags.
fn build_probe(cli: &Cli) -> Result<Box<dyn MediaProbe + Send + Sync>, ClientError> {
    let dimensions = match cli.natural_size.as_deref() {
        Some(spec) => Some(parse_size_spec(spec).ok_or_else(|| {
            ClientError::InvalidInput("--natural-size must look like 1920x1080.".to_string())
        })?),
        None => None,
    };
    if dimensions.is_none() && cli.duration.is_none() {
        return Ok(Box::new(NullProbe));
    }
    let (width, height) = dimensions.unwrap_or((0, 0));
    Ok(Box::new(StaticProbe::new(ProbedMetadata {
        width,
        height,
        duration_seconds: cli.duration.unwrap_or(0.0),
    })))
}

fn apply_settings(cli: &Cli, pipeline: &mut ConversionPipeline) -> Result<(), ClientError> {
    let config = pipeline.state_mut().config_mut();
    if let Some(fps) = cli.fps {
        config.fps = fps;
    }
    if let Some(width) = cli.width {
        config.width = width;
    }
    if let Some(speed) = cli.speed {
        config.speed_factor = speed;
    }
    if cli.reverse {
        config.reverse = true;
    }
    if cli.audio {
        config.include_audio = true;
    }
    if let Some(text) = &cli.text {
        config.text.text = text.clone();
    }
    if let Some(size) = cli.font_size {
        config.text.font_size = size;
    }
    if let Some(position) = &cli.text_position {
        config.text.position = parse_text_position(position).ok_or_else(|| {
            ClientError::InvalidInput(format!("Unknown text position '{}'.", position))
        })?;
    }
    if let Some(color) = &cli.text_color {
        config.text.color = color.clone();
    }
    if let Some(color) = &cli.text_bg_color {
        config.text.bg_color = Some(color.clone());
    }
    if let Some(style) = &cli.font_style {
        config.text.font_style = resolve_font_style(style).ok_or_else(|| {
            ClientError::InvalidInput(format!(
                "Unknown font style '{}'. Known: {}.",
                style,
                FONT_STYLES.join(", ")
            ))
        })?;
    }
    Ok(())
}

fn apply_trim(cli: &Cli, pipeline: &mut ConversionPipeline) -> Result<(), ClientError> {
    if cli.start.is_none() && cli.end.is_none() {
        return Ok(());
    }
    let duration = pipeline
        .state()
        .media()
        .map(|media| media.duration_seconds)
        .unwrap_or(0.0);
    let mut editor = TrimRangeEditor::new();
    editor.set_duration(duration, Some(pipeline.state().config().trim));
    editor.set_scene_marks(pipeline.state().scene_marks().to_vec());
    if !editor.available() {
        return Err(ClientError::InvalidInput(
            "Trim is unavailable until the video duration is known.".to_string(),
        ));
    }
    if let Some(start) = cli.start {
        editor.set_start(start);
    }
    if let Some(end) = cli.end {
        editor.set_end(end);
    }
    pipeline.state_mut().config_mut().trim = editor.range();
    Ok(())
}

fn apply_crop(cli: &Cli, pipeline: &mut ConversionPipeline) -> Result<(), ClientError> {
    if cli.crop.is_none() && cli.aspect.is_none() {
        return Ok(());
    }
    let Some((width, height)) = pipeline
        .state()
        .media()
        .filter(|media| media.has_dimensions())
        .map(|media| (media.natural_width, media.natural_height))
    else {
        return Err(ClientError::InvalidInput(
            "Video dimensions are unknown; pass --natural-size WxH to crop.".to_string(),
        ));
    };

    let mut editor = CropRegionEditor::new();
    editor.reset_for_media(width, height);
    editor.set_display_size(width as f64, height as f64);
    if let Some(aspect) = &cli.aspect {
        let mode = parse_aspect(aspect).ok_or_else(|| {
            ClientError::InvalidInput(format!("Unknown aspect ratio '{}'.", aspect))
        })?;
        editor.set_aspect_ratio(mode);
    }
    if let Some(spec) = &cli.crop {
        let (x, y, w, h) = parse_crop_spec(spec).ok_or_else(|| {
            ClientError::InvalidInput("--crop must look like x,y,w,h.".to_string())
        })?;
        editor.set_field(CropField::X, x as f64);
        editor.set_field(CropField::Y, y as f64);
        editor.set_field(CropField::Width, w as f64);
        editor.set_field(CropField::Height, h as f64);
    }
    if !editor.issues().is_empty() {
        let messages: Vec<&str> = editor
            .issues()
            .iter()
            .map(|issue| issue.message.as_str())
            .collect();
        return Err(ClientError::InvalidInput(messages.join(" ")));
    }
    pipeline.state_mut().config_mut().crop = editor.crop_region();
    Ok(())
}

fn parse_text_position(value: &str) -> Option<TextPosition> {
    match value.trim().to_ascii_lowercase().as_str() {
        "center" => Some(TextPosition::Center),
        "top-left" => Some(TextPosition::TopLeft),
        "top-right" => Some(TextPosition::TopRight),
        "bottom-left" => Some(TextPosition::BottomLeft),
        "bottom-right" => Some(TextPosition::BottomRight),
        _ => None,
    }
}

/// Canonicalize a font style against the known table, case-insensitively.
fn resolve_font_style(value: &str) -> Option<String> {
    let wanted = value.trim().to_ascii_lowercase();
    FONT_STYLES
        .iter()
        .find(|style| style.to_ascii_lowercase() == wanted)
        .map(|style| style.to_string())
}

/// Resolve an aspect flag against the choice table; `16:9` matches the
/// `16:9 (Widescreen)` entry.
fn parse_aspect(value: &str) -> Option<AspectRatioMode> {
    let wanted = value.trim().to_ascii_lowercase();
    ASPECT_RATIO_CHOICES
        .iter()
        .find(|(label, _)| {
            let label = label.to_ascii_lowercase();
            label == wanted || label.starts_with(&format!("{} ", wanted))
        })
        .map(|(_, mode)| *mode)
        .or(match wanted.as_str() {
            "custom" => Some(AspectRatioMode::Custom),
            "original" => Some(AspectRatioMode::Original),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_position_kebab_names() {
        assert_eq!(parse_text_position("center"), Some(TextPosition::Center));
        assert_eq!(parse_text_position("Bottom-Left"), Some(TextPosition::BottomLeft));
        assert_eq!(parse_text_position("middle"), None);
    }

    #[test]
    fn test_resolve_font_style_is_case_insensitive() {
        assert_eq!(resolve_font_style("arial").as_deref(), Some("Arial"));
        assert_eq!(
            resolve_font_style("comic sans ms").as_deref(),
            Some("Comic Sans MS")
        );
        assert_eq!(resolve_font_style("Papyrus"), None);
    }

    #[test]
    fn test_parse_aspect_matches_choice_table() {
        assert!(matches!(parse_aspect("16:9"), Some(AspectRatioMode::Fixed(_))));
        assert!(matches!(parse_aspect("1:1"), Some(AspectRatioMode::Fixed(r)) if r == 1.0));
        assert_eq!(parse_aspect("original"), Some(AspectRatioMode::Original));
        assert_eq!(parse_aspect("custom"), Some(AspectRatioMode::Custom));
        assert_eq!(parse_aspect("5:4"), None);
    }

    #[test]
    fn test_cli_requires_file_or_url() {
        let cli = Cli::parse_from(["vid2gif"]);
        assert!(cli.file.is_none() && cli.url.is_none());
    }
}
