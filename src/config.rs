//! View configuration loaded from `config/view.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use bagview_compose::ChannelParams;
use bagview_scene::Rgba;
use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "config/view.toml";

/// Well-known location of the model manifest, loaded once at startup.
pub const DEFAULT_MODEL_PATH: &str = "assets/model/package.json";

/// Top-level view configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Preview viewport width in pixels.
    pub viewport_width: u32,
    /// Preview viewport height in pixels.
    pub viewport_height: u32,
    /// Path of the model manifest.
    pub model_path: PathBuf,
    /// Bag color applied at startup and restored by RESET.
    pub default_color: String,
    /// Font family active at startup.
    pub default_font: String,
    /// Viewport background color.
    pub background: String,
    /// Address the control server listens on.
    pub control_addr: String,
    /// Title channel canvas parameters.
    pub title: CanvasConfig,
    /// Flavor channel canvas parameters.
    pub flavor: CanvasConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            viewport_width: 960,
            viewport_height: 720,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            default_color: "#ff0000".to_string(),
            default_font: "Arial".to_string(),
            background: "#ffffff".to_string(),
            control_addr: "127.0.0.1:4460".to_string(),
            title: CanvasConfig::title(),
            flavor: CanvasConfig::flavor(),
        }
    }
}

/// Per-channel canvas setup: buffer dimensions, shrink-to-fit
/// parameters and the fixed mirroring correction.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Buffer width in pixels (fixed for the canvas lifetime).
    pub width: u32,
    /// Buffer height in pixels.
    pub height: u32,
    /// Starting font size.
    pub base_px: f32,
    /// Shrink step.
    pub step_px: f32,
    /// Smallest font size the shrink loop reaches.
    pub floor_px: f32,
    /// Width budget as a fraction of the buffer width.
    pub max_width_frac: f32,
    /// Vertical anchor as a fraction of the buffer height.
    pub anchor_frac: f32,
    /// Text fill color.
    pub fill: String,
    /// Flip the horizontal coordinate space (for label meshes whose UV
    /// transform shows text reversed).
    pub mirror_x: bool,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self::title()
    }
}

impl CanvasConfig {
    /// Title channel defaults.
    pub fn title() -> Self {
        Self {
            width: 1024,
            height: 1024,
            base_px: 500.0,
            step_px: 4.0,
            floor_px: 80.0,
            max_width_frac: 0.80,
            anchor_frac: 0.40,
            fill: "#222222".to_string(),
            mirror_x: true,
        }
    }

    /// Flavor channel defaults.
    pub fn flavor() -> Self {
        Self {
            width: 1024,
            height: 512,
            base_px: 300.0,
            step_px: 4.0,
            floor_px: 60.0,
            max_width_frac: 0.85,
            anchor_frac: 0.50,
            fill: "#222222".to_string(),
            mirror_x: false,
        }
    }

    /// Compositing parameters for this channel.
    pub fn params(&self) -> ChannelParams {
        ChannelParams {
            base_px: self.base_px,
            step_px: self.step_px,
            floor_px: self.floor_px,
            max_width_frac: self.max_width_frac,
            anchor_frac: self.anchor_frac,
            fill: Rgba::from_hex(&self.fill).unwrap_or(Rgba::BLACK),
        }
    }
}

impl ViewConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to
    /// defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ViewConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    ViewConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                ViewConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_variant() {
        let cfg = ViewConfig::default();
        assert_eq!(cfg.default_color, "#ff0000");
        assert_eq!(cfg.title.base_px, 500.0);
        assert_eq!(cfg.title.max_width_frac, 0.80);
        assert!(cfg.title.mirror_x);
        assert!(!cfg.flavor.mirror_x);
        assert_eq!(cfg.flavor.floor_px, 60.0);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let cfg: ViewConfig = toml::from_str(
            r##"
            default_color = "#00ff00"

            [title]
            base_px = 400.0
            "##,
        )
        .expect("partial config parses");
        assert_eq!(cfg.default_color, "#00ff00");
        assert_eq!(cfg.title.base_px, 400.0);
        assert_eq!(cfg.title.floor_px, 80.0);
        assert_eq!(cfg.viewport_width, 960);
    }

    #[test]
    fn bad_fill_color_falls_back_to_black() {
        let mut canvas = CanvasConfig::title();
        canvas.fill = "not-a-color".to_string();
        let params = canvas.params();
        assert_eq!(params.fill.to_rgba8(), [0, 0, 0, 255]);
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let cfg = ViewConfig::load_from_path(Path::new("/nonexistent/view.toml"));
        assert_eq!(cfg.control_addr, "127.0.0.1:4460");
    }
}
