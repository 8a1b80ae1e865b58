#![warn(missing_docs)]
//! Mesh-graph data model and label-binding resolution for the
//! customization view.
//!
//! The graph mirrors what an external model loader hands us: named
//! sub-meshes with per-node materials. Resolution classifies nodes into
//! a color target and label surfaces exactly once after load.

mod resolver;

pub use resolver::{
    bind_label_materials, classify, resolve_bindings, LabelBindings, LabelChannel, LabelSurface,
    NodeRole, BAG_BODY_NODE, FLAVOR_LABEL_NODE, NEAR_WHITE_THRESHOLD, TITLE_LABEL_NODE,
};

use glam::Vec4;
use thiserror::Error;

/// Errors produced by scene-level parsing.
#[derive(Debug, Error)]
pub enum SceneError {
    /// A color string could not be parsed as `#rgb`/`#rrggbb`/`#rrggbbaa`.
    #[error("invalid color value '{0}'")]
    Color(String),
}

/// Linear RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba(pub Vec4);

impl Rgba {
    /// Opaque white.
    pub const WHITE: Self = Self(Vec4::new(1.0, 1.0, 1.0, 1.0));
    /// Opaque black.
    pub const BLACK: Self = Self(Vec4::new(0.0, 0.0, 0.0, 1.0));

    /// Build a color from individual channels.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self(Vec4::new(r, g, b, a))
    }

    /// Red channel.
    pub fn r(&self) -> f32 {
        self.0.x
    }

    /// Green channel.
    pub fn g(&self) -> f32 {
        self.0.y
    }

    /// Blue channel.
    pub fn b(&self) -> f32 {
        self.0.z
    }

    /// Alpha channel.
    pub fn a(&self) -> f32 {
        self.0.w
    }

    /// Parse a CSS-style hex color: `#rgb`, `#rrggbb` or `#rrggbbaa`,
    /// case-insensitive, leading `#` optional.
    pub fn from_hex(input: &str) -> Result<Self, SceneError> {
        let hex = input.trim().trim_start_matches('#');
        let invalid = || SceneError::Color(input.to_string());

        // Byte-range slicing below requires ASCII; anything else is
        // not a hex color anyway.
        if !hex.is_ascii() {
            return Err(invalid());
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        let nibble = |s: &str| {
            u8::from_str_radix(s, 16)
                .map(|v| v * 16 + v)
                .map_err(|_| invalid())
        };

        let (r, g, b, a) = match hex.len() {
            3 => (
                nibble(&hex[0..1])?,
                nibble(&hex[1..2])?,
                nibble(&hex[2..3])?,
                255,
            ),
            6 => (
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            ),
            8 => (
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            ),
            _ => return Err(invalid()),
        };

        Ok(Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        ))
    }

    /// Convert to packed 8-bit RGBA.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            quantize(self.r()),
            quantize(self.g()),
            quantize(self.b()),
            quantize(self.a()),
        ]
    }

    /// Whether every RGB channel exceeds the near-white threshold used
    /// by the heuristic label classifier.
    pub fn is_near_white(&self) -> bool {
        self.r() > NEAR_WHITE_THRESHOLD
            && self.g() > NEAR_WHITE_THRESHOLD
            && self.b() > NEAR_WHITE_THRESHOLD
    }
}

/// Handle the host's rendering runtime maps to a live texture.
///
/// The view allocates one per label channel; the compositor's canvas is
/// the backing store the runtime re-uploads when marked dirty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Surface material of a mesh node.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Optional authored material name (e.g. a slot name from the source asset).
    pub name: Option<String>,
    /// Base (albedo) color.
    pub base_color: Rgba,
    /// Live texture bound to the material, if any.
    pub texture: Option<TextureId>,
    /// Whether alpha blending is enabled.
    pub transparent: bool,
    /// Whether both faces render.
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color: Rgba::WHITE,
            texture: None,
            transparent: false,
            double_sided: false,
        }
    }
}

impl Material {
    /// Create an opaque single-sided material with the given color.
    pub fn new(base_color: Rgba) -> Self {
        Self {
            base_color,
            ..Self::default()
        }
    }

    /// Authored name, builder style.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Produce the fresh, exclusively-owned copy a label surface is
    /// rebound with: transparency on, texture pointed at the channel's
    /// live buffer. The original instance is never mutated.
    pub fn into_label_material(self, texture: TextureId) -> Self {
        Self {
            texture: Some(texture),
            transparent: true,
            double_sided: true,
            ..self
        }
    }
}

/// One named sub-mesh of a loaded model.
#[derive(Debug, Clone)]
pub struct MeshNode {
    /// Node name as authored in the source asset.
    pub name: String,
    /// Material on this node, if it carries one.
    pub material: Option<Material>,
    /// Child nodes.
    pub children: Vec<MeshNode>,
}

impl MeshNode {
    /// Create a leaf node with no material.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            material: None,
            children: Vec::new(),
        }
    }

    /// Attach a material, builder style.
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    /// Append a child node, builder style.
    pub fn with_child(mut self, child: MeshNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Path from the graph root to a node: child indices, root-first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Path of the root node.
    pub fn root() -> Self {
        Self::default()
    }

    /// Extend the path by one child index.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Child indices, root-first.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

/// Immutable snapshot of a loaded model: a named root with nested
/// sub-meshes. Owned by the view for its whole lifetime; materials are
/// the only part mutated after load.
#[derive(Debug, Clone)]
pub struct ModelGraph {
    name: String,
    root: MeshNode,
}

impl ModelGraph {
    /// Wrap a loaded root node.
    pub fn new(name: impl Into<String>, root: MeshNode) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root node.
    pub fn root(&self) -> &MeshNode {
        &self.root
    }

    /// Visit every node in preorder with its path.
    pub fn visit<F: FnMut(&NodePath, &MeshNode)>(&self, mut f: F) {
        fn walk<F: FnMut(&NodePath, &MeshNode)>(path: &NodePath, node: &MeshNode, f: &mut F) {
            f(path, node);
            for (index, child) in node.children.iter().enumerate() {
                walk(&path.child(index), child, f);
            }
        }
        walk(&NodePath::root(), &self.root, &mut f);
    }

    /// Look up a node by path.
    pub fn node(&self, path: &NodePath) -> Option<&MeshNode> {
        let mut current = &self.root;
        for &index in path.indices() {
            current = current.children.get(index)?;
        }
        Some(current)
    }

    /// Mutable node lookup.
    pub fn node_mut(&mut self, path: &NodePath) -> Option<&mut MeshNode> {
        let mut current = &mut self.root;
        for &index in path.indices() {
            current = current.children.get_mut(index)?;
        }
        Some(current)
    }

    /// Mutable access to the material at `path`, if the node has one.
    pub fn material_mut(&mut self, path: &NodePath) -> Option<&mut Material> {
        self.node_mut(path)?.material.as_mut()
    }
}
