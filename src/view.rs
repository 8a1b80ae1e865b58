//! The customizer view: owns the loaded model, the customization
//! state and the label canvases, and applies controller commands.

use bagview_capture::{png_data_uri, Frame};
use bagview_compose::{render_text, ChannelParams, FontResolver, FontStore, TextCanvas};
use bagview_scene::{
    bind_label_materials, resolve_bindings, LabelBindings, LabelChannel, ModelGraph, Rgba,
    TextureId,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ViewConfig;
use crate::control::protocol::{self, Command};
use crate::preview;

/// Live texture handle for the title canvas.
pub const TITLE_TEXTURE: TextureId = TextureId(1);
/// Live texture handle for the flavor canvas.
pub const FLAVOR_TEXTURE: TextureId = TextureId(2);

/// Current customization values: the single source of truth every
/// redraw reads. Mutated only by command application; no history.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomizationState {
    /// Bag body color.
    pub base_color: Rgba,
    /// Title text ("" renders nothing).
    pub title: String,
    /// Flavor text ("" renders nothing).
    pub flavor: String,
    /// Requested font family, shared by all text channels.
    pub font_family: String,
}

/// The embeddable view: model graph, bindings, state, canvases and the
/// latest preview frame.
///
/// Constructed synchronously once the model finishes loading. When the
/// model failed to load, [`CustomizerView::inert`] yields a view whose
/// commands are all safe no-ops.
pub struct CustomizerView {
    config: ViewConfig,
    graph: Option<ModelGraph>,
    bindings: LabelBindings,
    state: CustomizationState,
    fonts: FontStore,
    title_params: ChannelParams,
    flavor_params: ChannelParams,
    title_canvas: Option<TextCanvas>,
    flavor_canvas: Option<TextCanvas>,
    frame: Option<Frame>,
    frame_stale: bool,
    default_color: Rgba,
    background: Rgba,
}

impl CustomizerView {
    /// Build the view around a loaded model graph.
    pub fn new(config: ViewConfig, graph: ModelGraph, resolver: Box<dyn FontResolver>) -> Self {
        Self::build(config, Some(graph), resolver)
    }

    /// Build a view with no model: every command is a safe no-op and
    /// captures yield a plain backdrop.
    pub fn inert(config: ViewConfig, resolver: Box<dyn FontResolver>) -> Self {
        Self::build(config, None, resolver)
    }

    fn build(
        config: ViewConfig,
        graph: Option<ModelGraph>,
        resolver: Box<dyn FontResolver>,
    ) -> Self {
        let bindings = match &graph {
            Some(graph) => resolve_bindings(graph),
            None => LabelBindings::default(),
        };
        let mut graph = graph;
        if let Some(graph) = &mut graph {
            bind_label_materials(graph, &bindings, TITLE_TEXTURE, FLAVOR_TEXTURE);
        }

        // One fixed-size buffer per resolved label channel, for the
        // life of the view.
        let title_canvas = bindings.title.as_ref().map(|_| {
            TextCanvas::new(
                config.title.width,
                config.title.height,
                config.title.mirror_x,
                TITLE_TEXTURE,
            )
        });
        let flavor_canvas = bindings.flavor.as_ref().map(|_| {
            TextCanvas::new(
                config.flavor.width,
                config.flavor.height,
                config.flavor.mirror_x,
                FLAVOR_TEXTURE,
            )
        });

        let mut fonts = FontStore::new(resolver);
        if let Err(err) = fonts.select(&config.default_font) {
            warn!(%err, "starting without a usable font; text stays blank");
        }

        let default_color =
            Rgba::from_hex(&config.default_color).unwrap_or(Rgba::new(1.0, 0.0, 0.0, 1.0));
        let background = Rgba::from_hex(&config.background).unwrap_or(Rgba::WHITE);

        let mut view = Self {
            title_params: config.title.params(),
            flavor_params: config.flavor.params(),
            state: CustomizationState {
                base_color: default_color,
                title: String::new(),
                flavor: String::new(),
                font_family: config.default_font.clone(),
            },
            config,
            graph,
            bindings,
            fonts,
            title_canvas,
            flavor_canvas,
            frame: None,
            frame_stale: true,
            default_color,
            background,
        };
        view.set_color(default_color);
        view
    }

    /// Apply one command to completion. Returns the outbound event to
    /// send back, if the command produces one.
    pub fn apply(&mut self, command: Command) -> Option<Value> {
        match command {
            Command::SetColor { color } => {
                match Rgba::from_hex(&color) {
                    Ok(rgba) => self.set_color(rgba),
                    // Permissive contract: unparseable values are
                    // ignored like malformed commands.
                    Err(err) => debug!(%err, "ignoring SET_COLOR"),
                }
                None
            }
            Command::SetTitle { title } => {
                if self.bindings.surface(LabelChannel::Title).is_none() {
                    debug!("no title surface resolved; SET_TITLE ignored");
                    return None;
                }
                self.state.title = title;
                self.redraw(LabelChannel::Title);
                None
            }
            Command::SetFlavor { flavor } => {
                if self.bindings.surface(LabelChannel::Flavor).is_none() {
                    debug!("no flavor surface resolved; SET_FLAVOR ignored");
                    return None;
                }
                self.state.flavor = flavor;
                self.redraw(LabelChannel::Flavor);
                None
            }
            Command::SetFont { font } => {
                match self.fonts.select(&font) {
                    Ok(_) => {
                        self.state.font_family = font;
                        // Fonts stay consistent across channels, so
                        // every active canvas redraws its current text.
                        self.redraw(LabelChannel::Title);
                        self.redraw(LabelChannel::Flavor);
                    }
                    Err(err) => warn!(%err, "keeping previous font"),
                }
                None
            }
            Command::Reset => {
                self.state.title.clear();
                self.state.flavor.clear();
                if let Some(canvas) = &mut self.title_canvas {
                    canvas.clear();
                }
                if let Some(canvas) = &mut self.flavor_canvas {
                    canvas.clear();
                }
                // Cleared canvases stay blank until the next SET_TITLE;
                // no text redraw here.
                self.set_color(self.default_color);
                None
            }
            Command::GetScreenshot => {
                self.refresh_frame();
                let frame = self.frame.as_ref()?;
                match png_data_uri(frame) {
                    Ok(uri) => Some(protocol::event_screenshot_result(uri)),
                    Err(err) => {
                        warn!(%err, "capture failed");
                        None
                    }
                }
            }
            Command::Unknown => None,
        }
    }

    /// Per-frame step: pick up dirty canvases and refresh the preview.
    pub fn frame(&mut self) {
        self.refresh_frame();
    }

    fn refresh_frame(&mut self) {
        let title_dirty = self
            .title_canvas
            .as_mut()
            .is_some_and(TextCanvas::take_dirty);
        let flavor_dirty = self
            .flavor_canvas
            .as_mut()
            .is_some_and(TextCanvas::take_dirty);
        if title_dirty || flavor_dirty {
            self.frame_stale = true;
        }
        if self.frame_stale || self.frame.is_none() {
            self.frame = Some(preview::render_frame(
                self.config.viewport_width,
                self.config.viewport_height,
                self.background,
                self.graph.as_ref().map(|_| self.state.base_color),
                self.title_canvas.as_ref(),
                self.flavor_canvas.as_ref(),
            ));
            self.frame_stale = false;
        }
    }

    fn set_color(&mut self, rgba: Rgba) {
        let Some(graph) = &mut self.graph else {
            return;
        };
        let Some(path) = &self.bindings.color_target else {
            debug!("no color target resolved; color change ignored");
            return;
        };
        self.state.base_color = rgba;
        if let Some(material) = graph.material_mut(path) {
            material.base_color = rgba;
        }
        self.frame_stale = true;
    }

    fn redraw(&mut self, channel: LabelChannel) {
        let canvas = match channel {
            LabelChannel::Title => self.title_canvas.as_mut(),
            LabelChannel::Flavor => self.flavor_canvas.as_mut(),
        };
        let Some(canvas) = canvas else {
            return;
        };
        let Some(font) = self.fonts.active() else {
            // No usable font anywhere; keep the canvas blank.
            canvas.clear();
            return;
        };
        let (text, params) = match channel {
            LabelChannel::Title => (&self.state.title, &self.title_params),
            LabelChannel::Flavor => (&self.state.flavor, &self.flavor_params),
        };
        render_text(canvas, text, &font, params);
    }

    /// Current customization values.
    pub fn state(&self) -> &CustomizationState {
        &self.state
    }

    /// Bindings resolved at load time.
    pub fn bindings(&self) -> &LabelBindings {
        &self.bindings
    }

    /// The loaded model, if any.
    pub fn graph(&self) -> Option<&ModelGraph> {
        self.graph.as_ref()
    }

    /// Title canvas, if the channel resolved.
    pub fn title_canvas(&self) -> Option<&TextCanvas> {
        self.title_canvas.as_ref()
    }

    /// Flavor canvas, if the channel resolved.
    pub fn flavor_canvas(&self) -> Option<&TextCanvas> {
        self.flavor_canvas.as_ref()
    }

    /// Whether a usable font is active.
    pub fn font_available(&self) -> bool {
        self.fonts.active().is_some()
    }

    /// Latest preview frame (rendering it first if stale).
    pub fn latest_frame(&mut self) -> &Frame {
        self.refresh_frame();
        self.frame.as_ref().expect("frame rendered by refresh")
    }
}
