#![warn(missing_docs)]
//! Raster text compositor: renders user-supplied strings into
//! fixed-size RGBA canvases with greedy shrink-to-fit sizing.
//!
//! The canvases double as live texture sources; the host re-uploads a
//! canvas whenever its dirty flag is taken.

mod canvas;
mod compositor;
mod fonts;

pub use canvas::TextCanvas;
pub use compositor::{fit_font_size, measure_text, render_text};
pub use fonts::{FontResolver, FontStore};

use bagview_scene::Rgba;
use thiserror::Error;

/// Errors produced while resolving or parsing fonts.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// No font file could be located for the requested family.
    #[error("unknown font family '{0}'")]
    UnresolvedFamily(String),
    /// The resolved font file could not be parsed.
    #[error("failed to parse font data for '{family}': {reason}")]
    FontParse {
        /// Family whose data failed to parse.
        family: String,
        /// Parser-reported reason.
        reason: String,
    },
}

/// Per-channel compositing parameters.
///
/// `base_px`/`step_px`/`floor_px` drive the greedy shrink loop;
/// `max_width_frac` is the width budget as a fraction of the canvas
/// width; `anchor_frac` positions the vertical center of the text
/// block (label art is printed slightly above true center).
#[derive(Debug, Clone, Copy)]
pub struct ChannelParams {
    /// Starting font size in pixels.
    pub base_px: f32,
    /// Shrink decrement per iteration.
    pub step_px: f32,
    /// Smallest size the loop will reach.
    pub floor_px: f32,
    /// Width budget as a fraction of canvas width.
    pub max_width_frac: f32,
    /// Vertical anchor as a fraction of canvas height.
    pub anchor_frac: f32,
    /// Text fill color.
    pub fill: Rgba,
}

impl ChannelParams {
    /// Defaults for the title channel.
    pub fn title() -> Self {
        Self {
            base_px: 500.0,
            step_px: 4.0,
            floor_px: 80.0,
            max_width_frac: 0.80,
            anchor_frac: 0.40,
            fill: Rgba::new(0.133, 0.133, 0.133, 1.0),
        }
    }

    /// Defaults for the flavor channel.
    pub fn flavor() -> Self {
        Self {
            base_px: 300.0,
            step_px: 4.0,
            floor_px: 60.0,
            max_width_frac: 0.85,
            anchor_frac: 0.50,
            fill: Rgba::new(0.133, 0.133, 0.133, 1.0),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use fontdue::{Font, FontSettings};

    /// Parse the first system font found, or `None` on fontless CI.
    pub fn load_any_system_font() -> Option<Font> {
        let candidates = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
            "/usr/share/fonts/google-noto/NotoSans-Regular.ttf",
            "/System/Library/Fonts/Helvetica.ttc",
            "/Library/Fonts/Arial.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ];
        candidates.iter().find_map(|path| {
            let bytes = std::fs::read(path).ok()?;
            Font::from_bytes(bytes, FontSettings::default()).ok()
        })
    }
}
