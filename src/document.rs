use crate::error::{ResolveError, Result};
use crate::reference::resolve_reference;
use crate::types::InspectOutput;
use flate2::read::GzDecoder;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

// Documents are JSON, either plain or wrapped in a gzip stream.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub const DOCUMENT_SECTIONS: [&str; 6] = [
    "asset_info",
    "scene",
    "node_library",
    "material_library",
    "geometry_library",
    "image_library",
];

#[derive(Debug)]
pub struct SceneDocument {
    root: Value,
    compressed: bool,
    node_index: HashMap<String, usize>,
    library_node_index: HashMap<String, usize>,
    library_material_index: HashMap<String, usize>,
}

impl SceneDocument {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let compressed = bytes.len() >= 2 && bytes[..2] == GZIP_MAGIC;
        let text = if compressed {
            let mut decoder = GzDecoder::new(bytes);
            let mut text = String::new();
            decoder.read_to_string(&mut text).map_err(|err| {
                ResolveError::MalformedDocument(format!("gzip stream did not decode: {err}"))
            })?;
            text
        } else {
            String::from_utf8(bytes.to_vec()).map_err(|_| {
                ResolveError::MalformedDocument("document is not UTF-8 text".to_string())
            })?
        };

        let root: Value = serde_json::from_str(&text)
            .map_err(|err| ResolveError::MalformedDocument(format!("invalid JSON: {err}")))?;

        let scene = root.get("scene").and_then(Value::as_object).ok_or_else(|| {
            ResolveError::MalformedDocument("missing top-level 'scene' object".to_string())
        })?;
        if !scene.get("nodes").is_some_and(Value::is_array) {
            return Err(ResolveError::MalformedDocument(
                "scene carries no 'nodes' array".to_string(),
            ));
        }

        let node_index = index_by_id(scene_member_array(&root, "nodes"));
        let library_node_index = index_by_id(section_array(&root, "node_library"));
        let library_material_index = index_by_id(section_array(&root, "material_library"));

        Ok(Self {
            root,
            compressed,
            node_index,
            library_node_index,
            library_material_index,
        })
    }

    pub fn compressed(&self) -> bool {
        self.compressed
    }

    pub fn file_version(&self) -> Option<&str> {
        self.root.get("file_version").and_then(Value::as_str)
    }

    pub fn scene_nodes(&self) -> &[Value] {
        scene_member_array(&self.root, "nodes")
    }

    pub fn scene_materials(&self) -> &[Value] {
        scene_member_array(&self.root, "materials")
    }

    pub fn node_library(&self) -> &[Value] {
        section_array(&self.root, "node_library")
    }

    pub fn material_library(&self) -> &[Value] {
        section_array(&self.root, "material_library")
    }

    pub fn geometry_library(&self) -> &[Value] {
        section_array(&self.root, "geometry_library")
    }

    pub fn image_library(&self) -> &[Value] {
        section_array(&self.root, "image_library")
    }

    pub fn scene_node_by_id(&self, id: &str) -> Option<&Value> {
        self.node_index
            .get(id)
            .and_then(|pos| self.scene_nodes().get(*pos))
    }

    pub fn scene_node_by_reference(&self, reference: &str) -> Option<&Value> {
        self.scene_node_by_id(&resolve_reference(reference))
    }

    pub fn library_node_by_reference(&self, reference: &str) -> Option<&Value> {
        let id = resolve_reference(reference);
        self.library_node_index
            .get(&id)
            .and_then(|pos| self.node_library().get(*pos))
    }

    pub fn library_material_by_reference(&self, reference: &str) -> Option<&Value> {
        let id = resolve_reference(reference);
        self.library_material_index
            .get(&id)
            .and_then(|pos| self.material_library().get(*pos))
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.root.get(name)
    }

    pub fn raw(&self) -> &Value {
        &self.root
    }
}

pub fn node_has_geometries(node: &Value) -> bool {
    node.get("geometries")
        .and_then(Value::as_array)
        .is_some_and(|geometries| !geometries.is_empty())
}

pub fn node_is_instance(node: &Value) -> bool {
    node.get("instance_of").and_then(Value::as_str).is_some()
}

pub fn inspect_scene_document(path: &Path) -> Result<InspectOutput> {
    let doc = SceneDocument::from_path(path)?;
    let nodes = doc.scene_nodes();
    Ok(InspectOutput {
        path: path.to_string_lossy().to_string(),
        compressed: doc.compressed(),
        file_version: doc.file_version().map(str::to_string),
        scene_nodes: nodes.len(),
        geometry_nodes: nodes.iter().filter(|n| node_has_geometries(n)).count(),
        instance_nodes: nodes.iter().filter(|n| node_is_instance(n)).count(),
        scene_materials: doc.scene_materials().len(),
        node_library: doc.node_library().len(),
        material_library: doc.material_library().len(),
        geometry_library: doc.geometry_library().len(),
        image_library: doc.image_library().len(),
    })
}

fn section_array<'a>(root: &'a Value, section: &str) -> &'a [Value] {
    root.get(section)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn scene_member_array<'a>(root: &'a Value, member: &str) -> &'a [Value] {
    root.get("scene")
        .and_then(|scene| scene.get(member))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn index_by_id(entries: &[Value]) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for (pos, entry) in entries.iter().enumerate() {
        if let Some(id) = entry.get("id").and_then(Value::as_str) {
            // First occurrence wins for duplicate ids.
            index.entry(id.to_string()).or_insert(pos);
        }
    }
    index
}
