//! Named conversion presets.
//!
//! A preset is a bundle of output/effects settings applied atomically to
//! a `ConversionConfig`. Presets never touch trim, crop, or the text
//! overlay; those belong to their editors. The table is plain data
//! handed to the resolver, not a module-level singleton.

use serde::{Deserialize, Serialize};

use crate::state::{ConversionConfig, OutputFormat};

/// The fields a preset overwrites, all at once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresetSettings {
    pub fps: u32,
    pub width: u32,
    pub include_audio: bool,
    pub speed_factor: f64,
    pub reverse: bool,
    /// Display hint only; the submitted format is derived from the audio
    /// flag at snapshot time.
    pub output_format_hint: OutputFormat,
}

/// A named settings bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub settings: PresetSettings,
}

impl Preset {
    fn new(name: &str, settings: PresetSettings) -> Self {
        Self { name: name.to_string(), settings }
    }
}

/// Resolves preset names against a table supplied as data.
#[derive(Debug, Clone)]
pub struct PresetResolver {
    presets: Vec<Preset>,
}

impl PresetResolver {
    pub fn new(presets: Vec<Preset>) -> Self {
        Self { presets }
    }

    /// The stock preset table shipped with the product.
    pub fn builtin() -> Self {
        Self::new(builtin_presets())
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|preset| preset.name == name)
    }

    /// Overwrite the preset-scoped fields of `config`. An unknown name is
    /// a no-op; returns whether anything was applied.
    pub fn apply(&self, name: &str, config: &mut ConversionConfig) -> bool {
        let Some(preset) = self.find(name) else {
            return false;
        };
        let settings = preset.settings;
        config.fps = settings.fps;
        config.width = settings.width;
        config.include_audio = settings.include_audio;
        config.speed_factor = settings.speed_factor;
        config.reverse = settings.reverse;
        config.output_format = OutputFormat::for_audio(settings.include_audio);
        true
    }
}

fn builtin_presets() -> Vec<Preset> {
    let gif = |fps, width| PresetSettings {
        fps,
        width,
        include_audio: false,
        speed_factor: 1.0,
        reverse: false,
        output_format_hint: OutputFormat::Gif,
    };
    vec![
        Preset::new("Default (Custom)", gif(10, 320)),
        Preset::new("High-Quality GIF", gif(15, 480)),
        Preset::new("Small Email GIF", gif(8, 200)),
        Preset::new(
            "Social Media MP4 (Short Clip)",
            PresetSettings {
                fps: 24,
                width: 720,
                include_audio: true,
                speed_factor: 1.0,
                reverse: false,
                output_format_hint: OutputFormat::Mp4,
            },
        ),
        Preset::new("Animated Emoji (Tiny GIF)", gif(10, 128)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CropRegion, TrimRange};

    #[test]
    fn test_builtin_table() {
        let resolver = PresetResolver::builtin();
        assert_eq!(resolver.presets().len(), 5);
        assert!(resolver.find("High-Quality GIF").is_some());
    }

    #[test]
    fn test_apply_overwrites_all_scoped_fields() {
        let resolver = PresetResolver::builtin();
        let mut config = ConversionConfig::default();
        assert!(resolver.apply("Social Media MP4 (Short Clip)", &mut config));
        assert_eq!(config.fps, 24);
        assert_eq!(config.width, 720);
        assert!(config.include_audio);
        assert_eq!(config.output_format, OutputFormat::Mp4);
    }

    #[test]
    fn test_apply_never_touches_regions_or_text() {
        let resolver = PresetResolver::builtin();
        let mut config = ConversionConfig::default();
        config.trim = TrimRange::new(2.0, 8.0);
        config.crop = Some(CropRegion { x: 1, y: 2, width: 30, height: 40 });
        config.text.text = "hello".to_string();

        resolver.apply("Small Email GIF", &mut config);
        assert_eq!(config.trim, TrimRange::new(2.0, 8.0));
        assert_eq!(config.crop, Some(CropRegion { x: 1, y: 2, width: 30, height: 40 }));
        assert_eq!(config.text.text, "hello");
    }

    #[test]
    fn test_unknown_preset_is_noop() {
        let resolver = PresetResolver::builtin();
        let mut config = ConversionConfig::default();
        let before = config.clone();
        assert!(!resolver.apply("Does Not Exist", &mut config));
        assert_eq!(config, before);
    }

    #[test]
    fn test_apply_is_total_overwrite() {
        // Applying one preset after another leaves no residue of the first.
        let resolver = PresetResolver::builtin();
        let mut config = ConversionConfig::default();
        resolver.apply("Social Media MP4 (Short Clip)", &mut config);
        resolver.apply("Animated Emoji (Tiny GIF)", &mut config);
        assert_eq!(config.fps, 10);
        assert_eq!(config.width, 128);
        assert!(!config.include_audio);
        assert_eq!(config.output_format, OutputFormat::Gif);
    }
}
