#![warn(missing_docs)]
//! Model manifest schema + validation helpers.
//!
//! The manifest is the loaded-model exchange format: the external
//! loader (out of scope here) has already decoded the source asset
//! into named sub-meshes with materials, serialized as JSON. This
//! crate validates that shape and produces the in-memory graph the
//! resolver classifies.

use std::collections::HashSet;
use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use bagview_scene::{Material, MeshNode, ModelGraph, Rgba};

/// Errors emitted while loading or validating a model manifest.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Wrap IO failures when reading manifest files.
    #[error("failed to read model manifest: {0}")]
    Io(#[from] std::io::Error),
    /// Wrap JSON parsing issues.
    #[error("failed to parse model manifest: {0}")]
    Parse(#[from] serde_json::Error),
    /// Validation errors describing why a manifest is inconsistent.
    #[error("invalid model manifest: {0}")]
    Invalid(String),
}

/// Material entry of a manifest node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestMaterial {
    /// Optional authored material name.
    #[serde(default)]
    pub name: Option<String>,
    /// Base color as a CSS-style hex string.
    pub color: String,
    /// Whether alpha blending is enabled.
    #[serde(default)]
    pub transparent: bool,
    /// Whether both faces render.
    #[serde(default)]
    pub double_sided: bool,
}

/// One node of the serialized mesh graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestNode {
    /// Node name as authored in the source asset.
    pub name: String,
    /// Material carried by this node, if any.
    #[serde(default)]
    pub material: Option<ManifestMaterial>,
    /// Child nodes.
    #[serde(default)]
    pub children: Vec<ManifestNode>,
}

/// Serialized model: a named root with nested sub-meshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Model name.
    pub name: String,
    /// Root node of the mesh graph.
    pub root: ManifestNode,
}

impl ModelManifest {
    /// Parse a manifest from a JSON string and validate contents.
    pub fn parse_str(input: &str) -> Result<Self, AssetError> {
        let manifest: ModelManifest = serde_json::from_str(input)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load a manifest from a file on disk.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let data = fs::read_to_string(path)?;
        Self::parse_str(&data)
    }

    /// Validate the structure of the manifest and return `Ok(())` if
    /// consistent.
    pub fn validate(&self) -> Result<(), AssetError> {
        if self.name.is_empty() {
            return Err(AssetError::Invalid("model name must not be empty".into()));
        }

        let mut seen = HashSet::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if node.name.is_empty() {
                return Err(AssetError::Invalid("node name must not be empty".into()));
            }
            if !seen.insert(node.name.as_str()) {
                return Err(AssetError::Invalid(format!(
                    "duplicate node name '{}'",
                    node.name
                )));
            }
            if let Some(material) = &node.material {
                if Rgba::from_hex(&material.color).is_err() {
                    return Err(AssetError::Invalid(format!(
                        "node '{}' has unparseable material color '{}'",
                        node.name, material.color
                    )));
                }
            }
            stack.extend(node.children.iter());
        }
        Ok(())
    }

    /// Convert into the in-memory graph the resolver works on.
    ///
    /// Assumes [`Self::validate`] passed; colors are re-parsed here and
    /// fall back to white if validation was skipped.
    pub fn into_graph(self) -> ModelGraph {
        fn convert(node: ManifestNode) -> MeshNode {
            let mut mesh = MeshNode::new(node.name);
            if let Some(material) = node.material {
                let color = Rgba::from_hex(&material.color).unwrap_or(Rgba::WHITE);
                let mut out = Material::new(color);
                out.name = material.name;
                out.transparent = material.transparent;
                out.double_sided = material.double_sided;
                mesh.material = Some(out);
            }
            mesh.children = node.children.into_iter().map(convert).collect();
            mesh
        }

        let name = self.name;
        ModelGraph::new(name, convert(self.root))
    }
}

/// Load and validate a manifest, producing the mesh graph directly.
pub fn graph_from_file(path: impl AsRef<Path>) -> Result<ModelGraph, AssetError> {
    Ok(ModelManifest::load_file(path)?.into_graph())
}

/// Parse and validate a manifest string, producing the mesh graph.
pub fn graph_from_str(input: &str) -> Result<ModelGraph, AssetError> {
    Ok(ModelManifest::parse_str(input)?.into_graph())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r##"{
        "name": "chips-bag",
        "root": {
            "name": "Scene",
            "children": [
                { "name": "Bag_Main", "material": { "color": "#ff0000" } },
                { "name": "Label_Top", "material": { "color": "#ffffff", "name": "Label_Mat" } },
                { "name": "Label_Bottom", "material": { "color": "#ffffff" } }
            ]
        }
    }"##;

    #[test]
    fn parses_and_converts_reference_manifest() {
        let graph = graph_from_str(MANIFEST).expect("manifest parses");
        assert_eq!(graph.name(), "chips-bag");
        assert_eq!(graph.root().children.len(), 3);

        let bag = &graph.root().children[0];
        assert_eq!(bag.name, "Bag_Main");
        assert_eq!(
            bag.material.as_ref().unwrap().base_color.to_rgba8(),
            [255, 0, 0, 255]
        );
        let label = &graph.root().children[1];
        assert_eq!(
            label.material.as_ref().unwrap().name.as_deref(),
            Some("Label_Mat")
        );
    }

    #[test]
    fn rejects_duplicate_node_names() {
        let input = r##"{
            "name": "bag",
            "root": {
                "name": "Scene",
                "children": [
                    { "name": "mesh" },
                    { "name": "mesh" }
                ]
            }
        }"##;
        let err = ModelManifest::parse_str(input).unwrap_err();
        assert!(matches!(err, AssetError::Invalid(_)));
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_unparseable_colors() {
        let input = r##"{
            "name": "bag",
            "root": { "name": "Scene", "material": { "color": "tomato" } }
        }"##;
        let err = ModelManifest::parse_str(input).unwrap_err();
        assert!(err.to_string().contains("unparseable material color"));
    }

    #[test]
    fn rejects_empty_names() {
        let input = r##"{ "name": "", "root": { "name": "Scene" } }"##;
        assert!(ModelManifest::parse_str(input).is_err());

        let input = r##"{ "name": "bag", "root": { "name": "" } }"##;
        assert!(ModelManifest::parse_str(input).is_err());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = ModelManifest::parse_str("{ not json").unwrap_err();
        assert!(matches!(err, AssetError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = graph_from_file("/nonexistent/model.json").unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }
}
