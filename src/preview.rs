//! Software preview of the customized package.
//!
//! The real product shot comes from the host's GPU renderer; headless
//! sessions still need captures that reflect the current state, so
//! this paints a flat stand-in: background, bag silhouette in the
//! current bag color, and each label canvas blended into its printed
//! region.

use bagview_capture::Frame;
use bagview_compose::TextCanvas;
use bagview_scene::Rgba;

const BAG_WIDTH_FRAC: f32 = 0.55;
const BAG_HEIGHT_FRAC: f32 = 0.70;
// Label print regions as fractions of the bag rect (x0, y0, x1, y1).
const TITLE_REGION: [f32; 4] = [0.15, 0.18, 0.85, 0.52];
const FLAVOR_REGION: [f32; 4] = [0.20, 0.58, 0.80, 0.82];

#[derive(Debug, Clone, Copy)]
struct Rect {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl Rect {
    fn centered(width: u32, height: u32, w_frac: f32, h_frac: f32) -> Self {
        let w = (width as f32 * w_frac) as u32;
        let h = (height as f32 * h_frac) as u32;
        let x0 = (width - w) / 2;
        let y0 = (height - h) / 2;
        Self {
            x0,
            y0,
            x1: x0 + w,
            y1: y0 + h,
        }
    }

    fn inner(&self, fracs: [f32; 4]) -> Self {
        let w = (self.x1 - self.x0) as f32;
        let h = (self.y1 - self.y0) as f32;
        Self {
            x0: self.x0 + (w * fracs[0]) as u32,
            y0: self.y0 + (h * fracs[1]) as u32,
            x1: self.x0 + (w * fracs[2]) as u32,
            y1: self.y0 + (h * fracs[3]) as u32,
        }
    }
}

/// Render the preview frame for the current customization state.
pub fn render_frame(
    width: u32,
    height: u32,
    background: Rgba,
    bag_color: Option<Rgba>,
    title: Option<&TextCanvas>,
    flavor: Option<&TextCanvas>,
) -> Frame {
    let mut frame = Frame::blank(width, height);
    fill_rect(
        &mut frame,
        Rect {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        },
        background,
    );

    // No loaded model means no bag to paint; the capture stays a plain
    // backdrop instead of failing.
    let Some(bag_color) = bag_color else {
        return frame;
    };

    let bag = Rect::centered(width, height, BAG_WIDTH_FRAC, BAG_HEIGHT_FRAC);
    fill_rect(&mut frame, bag, bag_color);

    if let Some(canvas) = title {
        blit_canvas(&mut frame, bag.inner(TITLE_REGION), canvas);
    }
    if let Some(canvas) = flavor {
        blit_canvas(&mut frame, bag.inner(FLAVOR_REGION), canvas);
    }
    frame
}

fn fill_rect(frame: &mut Frame, rect: Rect, color: Rgba) {
    let rgba = color.to_rgba8();
    for y in rect.y0..rect.y1.min(frame.height) {
        for x in rect.x0..rect.x1.min(frame.width) {
            let offset = ((y * frame.width + x) * 4) as usize;
            frame.rgba[offset..offset + 4].copy_from_slice(&rgba);
        }
    }
}

/// Nearest-neighbor scale of the canvas into `rect`, source-over.
fn blit_canvas(frame: &mut Frame, rect: Rect, canvas: &TextCanvas) {
    let rect_w = rect.x1.saturating_sub(rect.x0);
    let rect_h = rect.y1.saturating_sub(rect.y0);
    if rect_w == 0 || rect_h == 0 {
        return;
    }

    for y in 0..rect_h.min(frame.height.saturating_sub(rect.y0)) {
        let src_y = y * canvas.height() / rect_h;
        for x in 0..rect_w.min(frame.width.saturating_sub(rect.x0)) {
            let src_x = x * canvas.width() / rect_w;
            let src = canvas.pixel(src_x, src_y);
            if src[3] == 0 {
                continue;
            }

            let offset = (((rect.y0 + y) * frame.width + rect.x0 + x) * 4) as usize;
            let dst = &mut frame.rgba[offset..offset + 4];
            let src_a = f32::from(src[3]) / 255.0;
            for c in 0..3 {
                let blended =
                    f32::from(src[c]) * src_a + f32::from(dst[c]) * (1.0 - src_a);
                dst[c] = blended.round() as u8;
            }
            let dst_a = f32::from(dst[3]) / 255.0;
            dst[3] = ((src_a + dst_a * (1.0 - src_a)) * 255.0).round() as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * frame.width + x) * 4) as usize;
        [
            frame.rgba[offset],
            frame.rgba[offset + 1],
            frame.rgba[offset + 2],
            frame.rgba[offset + 3],
        ]
    }

    #[test]
    fn background_fills_the_viewport_without_a_model() {
        let frame = render_frame(64, 64, Rgba::WHITE, None, None, None);
        assert_eq!(pixel(&frame, 0, 0), [255, 255, 255, 255]);
        assert_eq!(pixel(&frame, 32, 32), [255, 255, 255, 255]);
    }

    #[test]
    fn bag_color_shows_at_the_center() {
        let green = Rgba::from_hex("#00ff00").unwrap();
        let frame = render_frame(100, 100, Rgba::WHITE, Some(green), None, None);
        assert_eq!(pixel(&frame, 50, 50), [0, 255, 0, 255]);
        // Corners stay background.
        assert_eq!(pixel(&frame, 1, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn transparent_canvases_leave_the_bag_untouched() {
        use bagview_scene::TextureId;

        let red = Rgba::from_hex("#ff0000").unwrap();
        let title = TextCanvas::new(32, 32, false, TextureId(1));
        let flavor = TextCanvas::new(32, 32, false, TextureId(2));
        let frame = render_frame(100, 100, Rgba::WHITE, Some(red), Some(&title), Some(&flavor));
        assert_eq!(pixel(&frame, 50, 50), [255, 0, 0, 255]);
    }
}
