use crate::content_path::ContentPathResolver;
use crate::document::SceneDocument;
use crate::object_graph::{merged_channel_records, scene_material_library};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct TextureEntry {
    pub material_id: String,
    pub channel_id: String,
    pub raw_path: String,
    pub resolved_path: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextureReport {
    pub entries: Vec<TextureEntry>,
    pub resolved_count: usize,
    pub unresolved_count: usize,
    pub notes: Vec<String>,
}

// Walks every image-bearing channel of every scene material, in document
// order. With probe enabled, resolved files also get their pixel dimensions
// read from the image header.
pub fn build_texture_report(
    doc: &SceneDocument,
    paths: &mut ContentPathResolver,
    probe: bool,
) -> TextureReport {
    let mut entries = Vec::new();
    let mut notes = Vec::new();

    for material in doc.scene_materials() {
        let material_id = material
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let (_, library) = scene_material_library(doc, material);

        for (channel_id, record) in merged_channel_records(material, library) {
            let Some(raw_path) = record.get("image_file").and_then(Value::as_str) else {
                continue;
            };
            let resolved = paths.resolve(raw_path).unwrap_or_default();
            let (width, height) = match (&resolved, probe) {
                (Some(path), true) => match image::image_dimensions(path) {
                    Ok((width, height)) => (Some(width), Some(height)),
                    Err(err) => {
                        notes.push(format!("could not probe '{}': {err}", path.display()));
                        (None, None)
                    }
                },
                _ => (None, None),
            };
            entries.push(TextureEntry {
                material_id: material_id.clone(),
                channel_id,
                raw_path: raw_path.to_string(),
                resolved_path: resolved.map(|path| path.to_string_lossy().to_string()),
                width,
                height,
            });
        }
    }

    if !paths.has_roots() && !entries.is_empty() {
        notes.push("no content roots configured".to_string());
    }

    let resolved_count = entries
        .iter()
        .filter(|entry| entry.resolved_path.is_some())
        .count();
    let unresolved_count = entries.len() - resolved_count;
    TextureReport {
        entries,
        resolved_count,
        unresolved_count,
        notes,
    }
}
