//! One-shot classification of a loaded model graph into customization
//! roles.
//!
//! Runs synchronously after model load and never again. Classification
//! is a pure pass over the graph snapshot; binding then rewrites the
//! resolved label materials with fresh copies pointing at the live
//! texture buffers.

use tracing::debug;

use crate::{Material, ModelGraph, NodePath, TextureId};

/// Mesh name that deterministically wins the color-target role.
pub const BAG_BODY_NODE: &str = "Bag_Main";
/// Mesh name bound to the title channel.
pub const TITLE_LABEL_NODE: &str = "Label_Top";
/// Mesh name bound to the flavor channel.
pub const FLAVOR_LABEL_NODE: &str = "Label_Bottom";
/// Per-channel floor above which a material color counts as near-white
/// for the heuristic fallback (0-1 scale).
pub const NEAR_WHITE_THRESHOLD: f32 = 0.7;

/// Text channel a label surface displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelChannel {
    /// Primary product title.
    Title,
    /// Secondary flavor line.
    Flavor,
}

/// Role assigned to a node by classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// The mesh whose material color tracks SET_COLOR.
    ColorTarget,
    /// Surface displaying the title texture.
    TitleLabel,
    /// Surface displaying the flavor texture.
    FlavorLabel,
    /// No customization role.
    Unclassified,
}

/// A resolved label surface: which node, which channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSurface {
    /// Path of the label node in the graph.
    pub path: NodePath,
    /// Channel rendered onto this surface.
    pub channel: LabelChannel,
}

/// Output of resolution, computed once at load time.
///
/// Absent entries are valid configurations: commands addressing them
/// become no-ops at the view layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelBindings {
    /// Node whose material color SET_COLOR mutates.
    pub color_target: Option<NodePath>,
    /// Title label surface, if the model has one.
    pub title: Option<LabelSurface>,
    /// Flavor label surface, if the model has one.
    pub flavor: Option<LabelSurface>,
}

impl LabelBindings {
    /// Surface for a channel, if resolved.
    pub fn surface(&self, channel: LabelChannel) -> Option<&LabelSurface> {
        match channel {
            LabelChannel::Title => self.title.as_ref(),
            LabelChannel::Flavor => self.flavor.as_ref(),
        }
    }
}

struct Candidate {
    path: NodePath,
    name: String,
    has_material: bool,
    near_white: bool,
}

fn collect(graph: &ModelGraph) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    graph.visit(|path, node| {
        candidates.push(Candidate {
            path: path.clone(),
            name: node.name.clone(),
            has_material: node.material.is_some(),
            near_white: node
                .material
                .as_ref()
                .is_some_and(|m| m.base_color.is_near_white()),
        });
    });
    candidates
}

/// Resolve the customization bindings for a loaded graph.
///
/// Color target: the mesh named [`BAG_BODY_NODE`] wins when present,
/// otherwise the first mesh (preorder) carrying a material. Labels:
/// meshes named [`TITLE_LABEL_NODE`] / [`FLAVOR_LABEL_NODE`]; when
/// neither name matches anywhere, the first near-white-material mesh
/// other than the color target becomes the sole title surface. The
/// heuristic is a fallback, never combined with named matching.
pub fn resolve_bindings(graph: &ModelGraph) -> LabelBindings {
    let candidates = collect(graph);

    let color_target = candidates
        .iter()
        .find(|c| c.name == BAG_BODY_NODE && c.has_material)
        .or_else(|| candidates.iter().find(|c| c.has_material))
        .map(|c| c.path.clone());

    let named_surface = |name: &str, channel: LabelChannel| {
        candidates
            .iter()
            .find(|c| c.name == name && c.has_material)
            .map(|c| LabelSurface {
                path: c.path.clone(),
                channel,
            })
    };

    let mut title = named_surface(TITLE_LABEL_NODE, LabelChannel::Title);
    let mut flavor = named_surface(FLAVOR_LABEL_NODE, LabelChannel::Flavor);

    if title.is_none() && flavor.is_none() {
        title = candidates
            .iter()
            .filter(|c| Some(&c.path) != color_target.as_ref())
            .find(|c| c.near_white)
            .map(|c| {
                debug!(node = %c.name, "label fallback: near-white mesh selected");
                LabelSurface {
                    path: c.path.clone(),
                    channel: LabelChannel::Title,
                }
            });
        flavor = None;
    }

    LabelBindings {
        color_target,
        title,
        flavor,
    }
}

/// Classify every node of the graph against the resolved bindings.
///
/// Pure view over [`resolve_bindings`] output, mainly for diagnostics
/// and tests; each node gets exactly one role.
pub fn classify(graph: &ModelGraph) -> Vec<(NodePath, NodeRole)> {
    let bindings = resolve_bindings(graph);
    let mut roles = Vec::new();
    graph.visit(|path, _| {
        let role = if bindings.color_target.as_ref() == Some(path) {
            NodeRole::ColorTarget
        } else if bindings.title.as_ref().is_some_and(|s| &s.path == path) {
            NodeRole::TitleLabel
        } else if bindings.flavor.as_ref().is_some_and(|s| &s.path == path) {
            NodeRole::FlavorLabel
        } else {
            NodeRole::Unclassified
        };
        roles.push((path.clone(), role));
    });
    roles
}

/// Rebind each resolved label surface's material to its channel's live
/// texture.
///
/// Every rebound surface gets a fresh material copy (see
/// [`Material::into_label_material`]); nothing else in the graph is
/// touched. Missing surfaces are skipped.
pub fn bind_label_materials(
    graph: &mut ModelGraph,
    bindings: &LabelBindings,
    title_texture: TextureId,
    flavor_texture: TextureId,
) {
    let mut rebind = |surface: &LabelSurface, texture: TextureId| {
        if let Some(node) = graph.node_mut(&surface.path) {
            let base = node.material.take().unwrap_or_else(Material::default);
            node.material = Some(base.into_label_material(texture));
        }
    };

    if let Some(surface) = &bindings.title {
        rebind(surface, title_texture);
    }
    if let Some(surface) = &bindings.flavor {
        rebind(surface, flavor_texture);
    }
}
