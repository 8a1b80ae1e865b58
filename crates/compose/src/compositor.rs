//! Shrink-to-fit text compositing onto label canvases.

use fontdue::Font;

use crate::{ChannelParams, TextCanvas};

/// Greedy shrink-to-fit: walk down from `base_px` in `step_px`
/// decrements until `measure` fits `max_width` or `floor_px` is
/// reached. Ties at the floor are accepted even when still overflowing
/// (clipping is tolerated rather than searched around).
pub fn fit_font_size<F: Fn(f32) -> f32>(
    measure: F,
    base_px: f32,
    step_px: f32,
    floor_px: f32,
    max_width: f32,
) -> f32 {
    let mut size = base_px;
    while measure(size) > max_width && size > floor_px {
        size = (size - step_px).max(floor_px);
    }
    size
}

/// Measure the rendered advance width of `text` at `px`.
pub fn measure_text(font: &Font, text: &str, px: f32) -> f32 {
    text.chars()
        .map(|c| font.metrics(c, px).advance_width)
        .sum()
}

/// Render `text` onto `canvas`: full clear, auto-fit size, centered
/// horizontally, vertically anchored at `anchor_frac` of the canvas
/// height, then mark dirty for the next texture upload.
///
/// Empty (or whitespace-only) text leaves the canvas cleared.
pub fn render_text(canvas: &mut TextCanvas, text: &str, font: &Font, params: &ChannelParams) {
    // Every redraw starts from a blank canvas; partial redraws would
    // ghost remnants of longer prior text.
    canvas.clear();
    if text.trim().is_empty() {
        return;
    }

    let max_width = params.max_width_frac * canvas.width() as f32;
    let size = fit_font_size(
        |px| measure_text(font, text, px),
        params.base_px,
        params.step_px,
        params.floor_px,
        max_width,
    );

    let width = measure_text(font, text, size);
    let (ascent, descent) = font
        .horizontal_line_metrics(size)
        .map(|m| (m.ascent, m.descent))
        .unwrap_or((size * 0.8, size * -0.2));

    let anchor_y = params.anchor_frac * canvas.height() as f32;
    let baseline = anchor_y + (ascent + descent) / 2.0;
    let mut pen_x = (canvas.width() as f32 - width) / 2.0;

    for c in text.chars() {
        let (metrics, coverage) = font.rasterize(c, size);
        let glyph_x = (pen_x + metrics.xmin as f32).round() as i32;
        let glyph_y = (baseline - (metrics.height as f32 + metrics.ymin as f32)).round() as i32;

        for row in 0..metrics.height {
            for col in 0..metrics.width {
                canvas.blend_pixel(
                    glyph_x + col as i32,
                    glyph_y + row as i32,
                    params.fill,
                    coverage[row * metrics.width + col],
                );
            }
        }
        pen_x += metrics.advance_width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::load_any_system_font;
    use bagview_scene::TextureId;

    #[test]
    fn fit_keeps_base_size_when_text_fits() {
        let size = fit_font_size(|px| px * 0.5, 500.0, 4.0, 80.0, 800.0);
        assert_eq!(size, 500.0);
    }

    #[test]
    fn fit_shrinks_in_steps_until_width_fits() {
        // width == 2*px, budget 800 -> first fitting size is 400.
        let size = fit_font_size(|px| px * 2.0, 500.0, 4.0, 80.0, 800.0);
        assert_eq!(size, 400.0);
    }

    #[test]
    fn fit_stops_at_floor_even_when_overflowing() {
        let size = fit_font_size(|px| px * 100.0, 500.0, 4.0, 80.0, 800.0);
        assert_eq!(size, 80.0);
    }

    #[test]
    fn fit_never_returns_below_floor_with_uneven_steps() {
        let size = fit_font_size(|px| px * 100.0, 100.0, 7.0, 80.0, 10.0);
        assert_eq!(size, 80.0);
    }

    #[test]
    fn render_empty_text_only_clears() {
        let Some(font) = load_any_system_font() else {
            eprintln!("skipping: no system font available");
            return;
        };
        let mut canvas = TextCanvas::new(64, 64, false, TextureId(1));
        render_text(&mut canvas, "SALT", &font, &ChannelParams::title());
        assert!(canvas.pixels().iter().any(|&b| b != 0));

        render_text(&mut canvas, "   ", &font, &ChannelParams::title());
        assert!(canvas.pixels().iter().all(|&b| b == 0));
        assert!(canvas.is_dirty());
    }

    #[test]
    fn long_text_shrinks_below_base_and_fits_budget() {
        let Some(font) = load_any_system_font() else {
            eprintln!("skipping: no system font available");
            return;
        };
        let params = ChannelParams::title();
        let mut canvas = TextCanvas::new(1024, 1024, false, TextureId(1));
        let text = "A VERY LONG FLAVOR TITLE THAT OVERFLOWS";
        render_text(&mut canvas, text, &font, &params);

        let max_width = params.max_width_frac * canvas.width() as f32;
        let chosen = fit_font_size(
            |px| measure_text(&font, text, px),
            params.base_px,
            params.step_px,
            params.floor_px,
            max_width,
        );
        assert!(chosen < params.base_px);
        let rendered_width = measure_text(&font, text, chosen);
        assert!(chosen == params.floor_px || rendered_width <= max_width);
    }

    #[test]
    fn short_text_renders_around_the_anchor_line() {
        let Some(font) = load_any_system_font() else {
            eprintln!("skipping: no system font available");
            return;
        };
        let params = ChannelParams::title();
        let mut canvas = TextCanvas::new(256, 256, false, TextureId(1));
        render_text(&mut canvas, "OK", &font, &params);

        // All ink should sit in the upper half plus a margin: the title
        // anchor is at 40% of the height.
        let mut min_y = u32::MAX;
        let mut max_y = 0;
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                if canvas.pixel(x, y)[3] > 0 {
                    min_y = min_y.min(y);
                    max_y = max_y.max(y);
                }
            }
        }
        assert!(min_y < max_y, "expected some rendered coverage");
        let mid = (min_y + max_y) / 2;
        let anchor = (params.anchor_frac * canvas.height() as f32) as u32;
        assert!(
            mid.abs_diff(anchor) < canvas.height() / 8,
            "ink centered at {mid}, anchor {anchor}"
        );
    }
}
