use crate::channels::{ChannelValue, extra_channels, first_level_channels, map_channel};
use crate::content_path::ContentPathResolver;
use crate::document::{SceneDocument, node_has_geometries};
use crate::error::{ResolveError, Result};
use crate::reference::{is_external_reference, resolve_reference};
use crate::shader_type::ShaderTypeResolver;
use crate::transform::{Vec3, compose_absolute, instance_transform, origin, own_transform};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialChannelSet {
    pub name: String,
    pub type_id: String,
    pub channels: BTreeMap<String, ChannelValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInstance {
    pub id: String,
    pub label: String,
    pub origin: Vec3,
    pub rotation: Vec3,
    pub translation: Vec3,
    pub scale: Vec3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: String,
    pub label: String,
    pub origin: Vec3,
    pub rotation: Vec3,
    pub translation: Vec3,
    pub scale: Vec3,
    pub parent_id: Option<String>,
    pub materials: Vec<MaterialChannelSet>,
    pub instances: Vec<ObjectInstance>,
}

// One object per scene node that owns geometry, in document order. Cameras,
// lights, bones and instance placements never become objects themselves.
pub fn build_objects(
    doc: &SceneDocument,
    paths: &mut ContentPathResolver,
    shader_types: &mut ShaderTypeResolver,
    notes: &mut Vec<String>,
) -> Result<Vec<SceneObject>> {
    let mut instances = collect_instances(doc, notes)?;
    let mut objects = Vec::new();

    for node in doc.scene_nodes() {
        let Some(id) = node.get("id").and_then(Value::as_str) else {
            continue;
        };
        if !node_has_geometries(node) {
            continue;
        }
        let geometry_ids = geometry_ids(node);

        let composed = compose_absolute(doc, node, own_transform(node))?;
        let parent_id = node
            .get("parent")
            .and_then(Value::as_str)
            .map(resolve_reference)
            .filter(|parent| doc.scene_node_by_id(parent).is_some());

        let mut materials = Vec::new();
        for material in doc.scene_materials() {
            let Some(geometry_ref) = material.get("geometry").and_then(Value::as_str) else {
                continue;
            };
            if !geometry_ids.contains(&resolve_reference(geometry_ref)) {
                continue;
            }
            materials.push(material_channel_set(doc, material, paths, shader_types)?);
        }

        objects.push(SceneObject {
            id: id.to_string(),
            label: node_label(node),
            origin: origin(node),
            rotation: composed.rotation,
            translation: composed.translation,
            scale: composed.scale,
            parent_id,
            materials,
            instances: instances.remove(id).unwrap_or_default(),
        });
    }

    for (target, dropped) in instances {
        for instance in dropped {
            notes.push(format!(
                "instance '{}' dropped: target node '{}' owns no geometry in this scene",
                instance.id, target
            ));
        }
    }

    Ok(objects)
}

pub fn object_ids(doc: &SceneDocument) -> Vec<String> {
    doc.scene_nodes()
        .iter()
        .filter(|node| node_has_geometries(node))
        .filter_map(|node| node.get("id").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

// Scene-level channel values always win over library defaults; within the
// scene record, first-class channel groups win over "extra" blocks.
pub fn merged_channel_records<'a>(
    material: &'a Value,
    library: Option<&'a Value>,
) -> Vec<(String, &'a Value)> {
    let mut merged: Vec<(String, &'a Value)> = Vec::new();
    let mut seen = HashSet::new();
    let stages = [
        first_level_channels(material),
        extra_channels(material),
        library.map(extra_channels).unwrap_or_default(),
    ];
    for stage in stages {
        for (id, record) in stage {
            if seen.insert(id.clone()) {
                merged.push((id, record));
            }
        }
    }
    merged
}

pub fn scene_material_library<'a>(
    doc: &'a SceneDocument,
    material: &Value,
) -> (String, Option<&'a Value>) {
    let url = material
        .get("url")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let library = if is_external_reference(&url) {
        None
    } else {
        doc.library_material_by_reference(&url)
    };
    (url, library)
}

fn material_channel_set(
    doc: &SceneDocument,
    material: &Value,
    paths: &mut ContentPathResolver,
    shader_types: &mut ShaderTypeResolver,
) -> Result<MaterialChannelSet> {
    let (url, library) = scene_material_library(doc, material);
    let type_id = shader_types.resolve(&url, material, library)?;

    let mut channels = BTreeMap::new();
    for (channel_id, record) in merged_channel_records(material, library) {
        channels.insert(channel_id, map_channel(record, paths));
    }

    Ok(MaterialChannelSet {
        name: material_name(material),
        type_id,
        channels,
    })
}

fn collect_instances(
    doc: &SceneDocument,
    notes: &mut Vec<String>,
) -> Result<BTreeMap<String, Vec<ObjectInstance>>> {
    let mut grouped: BTreeMap<String, Vec<ObjectInstance>> = BTreeMap::new();
    for node in doc.scene_nodes() {
        let Some(target_ref) = node.get("instance_of").and_then(Value::as_str) else {
            continue;
        };
        let id = node
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match instance_transform(doc, node) {
            Ok((origin, placed)) => {
                grouped
                    .entry(resolve_reference(target_ref))
                    .or_default()
                    .push(ObjectInstance {
                        id,
                        label: node_label(node),
                        origin,
                        rotation: placed.rotation,
                        translation: placed.translation,
                        scale: placed.scale,
                    });
            }
            Err(ResolveError::DanglingReference { reference, .. }) => {
                notes.push(format!(
                    "instance '{id}' dropped: node definition '{reference}' not in node_library"
                ));
            }
            Err(err) => return Err(err),
        }
    }
    Ok(grouped)
}

fn node_label(node: &Value) -> String {
    for key in ["label", "name", "id"] {
        if let Some(text) = node.get(key).and_then(Value::as_str) {
            return text.to_string();
        }
    }
    String::new()
}

fn material_name(material: &Value) -> String {
    if let Some(group) = material
        .get("groups")
        .and_then(Value::as_array)
        .and_then(|groups| groups.first())
        .and_then(Value::as_str)
    {
        return group.to_string();
    }
    material
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn geometry_ids(node: &Value) -> HashSet<String> {
    let mut ids = HashSet::new();
    if let Some(geometries) = node.get("geometries").and_then(Value::as_array) {
        for geometry in geometries {
            if let Some(id) = geometry.get("id").and_then(Value::as_str) {
                ids.insert(id.to_string());
            }
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(doc: &SceneDocument) -> (Vec<SceneObject>, Vec<String>) {
        let mut paths = ContentPathResolver::new(Vec::new());
        let mut shader_types = ShaderTypeResolver::new();
        let mut notes = Vec::new();
        let objects = build_objects(doc, &mut paths, &mut shader_types, &mut notes).unwrap();
        (objects, notes)
    }

    fn sample() -> SceneDocument {
        SceneDocument::from_bytes(
            json!({
                "scene": {
                    "nodes": [
                        {
                            "id": "Pine-1",
                            "label": "Pine Tall",
                            "geometries": [ { "id": "Pine-1-0" } ],
                            "rotation": [ { "id": "y", "current_value": 45.0 } ],
                            "center_point": [ { "id": "y", "value": 2.0 } ]
                        },
                        { "id": "Camera" },
                        {
                            "id": "Pine-2",
                            "label": "Pine Copy",
                            "instance_of": "#Pine-1",
                            "url": "#Pine%20Tall"
                        },
                        {
                            "id": "Ghost",
                            "instance_of": "#Nothing",
                            "url": "#Pine%20Tall"
                        },
                        {
                            "id": "Broken",
                            "instance_of": "#Pine-1",
                            "url": "#Missing"
                        }
                    ],
                    "materials": [
                        {
                            "id": "Bark",
                            "geometry": "#Pine-1-0",
                            "groups": [ "Trunk" ],
                            "url": "#Bark%20Base",
                            "diffuse": {
                                "channel": {
                                    "id": "diffuse",
                                    "type": "float_color",
                                    "value": [1.0, 1.0, 1.0],
                                    "current_value": [0.25, 0.25, 0.25]
                                }
                            },
                            "extra": [
                                {
                                    "type": "studio/material/uber_iray",
                                    "channels": [
                                        {
                                            "channel": {
                                                "id": "diffuse",
                                                "type": "float_color",
                                                "value": [1.0, 1.0, 1.0],
                                                "current_value": [0.9, 0.9, 0.9]
                                            }
                                        },
                                        {
                                            "channel": {
                                                "id": "glossy",
                                                "type": "float",
                                                "value": 0.3,
                                                "current_value": 0.6
                                            }
                                        }
                                    ]
                                }
                            ]
                        },
                        { "id": "Orphan", "geometry": "#NoSuchGeometry", "url": "#Bark%20Base" }
                    ]
                },
                "node_library": [
                    {
                        "id": "Pine Tall",
                        "center_point": [ { "id": "y", "value": 2.0 } ],
                        "translation": [ { "id": "x", "value": 0.0, "current_value": 6.0 } ],
                        "rotation": [ { "id": "y", "value": 0.0, "current_value": 380.0 } ]
                    }
                ],
                "material_library": [
                    {
                        "id": "Bark Base",
                        "extra": [
                            {
                                "type": "studio/material/uber_iray",
                                "channels": [
                                    {
                                        "channel": {
                                            "id": "diffuse",
                                            "type": "float_color",
                                            "value": [0.75, 0.75, 0.75]
                                        }
                                    },
                                    {
                                        "channel": {
                                            "id": "bump",
                                            "type": "float",
                                            "value": 0.1
                                        }
                                    }
                                ]
                            }
                        ]
                    }
                ]
            })
            .to_string()
            .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn only_geometry_nodes_become_objects() {
        let doc = sample();
        let (objects, _) = build(&doc);
        assert_eq!(objects.len(), 1);
        let object = &objects[0];
        assert_eq!(object.id, "Pine-1");
        assert_eq!(object.label, "Pine Tall");
        assert_eq!(object.rotation, [0.0, 45.0, 0.0]);
        assert_eq!(object.origin, [0.0, 2.0, 0.0]);
        assert_eq!(object.parent_id, None);
        assert_eq!(object_ids(&doc), ["Pine-1"]);
    }

    #[test]
    fn materials_attach_by_geometry_and_orphans_are_silent() {
        let doc = sample();
        let (objects, _) = build(&doc);
        let materials = &objects[0].materials;
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].name, "Trunk");
        assert_eq!(materials[0].type_id, "uber_iray");
    }

    #[test]
    fn scene_channels_win_and_library_fills_gaps() {
        let doc = sample();
        let (objects, _) = build(&doc);
        let channels = &objects[0].materials[0].channels;

        // First-level 0.25 beats the scene extra 0.9 and the library 0.75.
        assert_eq!(
            channels["diffuse"].as_rgba(),
            Some((0.25, 0.25, 0.25, 1.0))
        );
        assert_eq!(
            channels["glossy"],
            ChannelValue::Float {
                value: 0.6,
                default_value: 0.3,
                image_file: None
            }
        );
        // Only present in the library record.
        assert_eq!(
            channels["bump"],
            ChannelValue::Float {
                value: 0.1,
                default_value: 0.1,
                image_file: None
            }
        );
    }

    #[test]
    fn instances_attach_to_their_target() {
        let doc = sample();
        let (objects, _) = build(&doc);
        let instances = &objects[0].instances;
        assert_eq!(instances.len(), 1);
        let placed = &instances[0];
        assert_eq!(placed.id, "Pine-2");
        assert_eq!(placed.label, "Pine Copy");
        assert_eq!(placed.origin, [0.0, 2.0, 0.0]);
        assert_eq!(placed.translation, [6.0, 0.0, 0.0]);
        // 380 wraps into one turn.
        assert!((placed.rotation[1] - 20.0).abs() < 1e-9);
    }

    #[test]
    fn dangling_instances_are_dropped_with_notes() {
        let doc = sample();
        let (objects, notes) = build(&doc);
        assert_eq!(objects[0].instances.len(), 1);
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().any(|n| n.contains("'Broken'")));
        assert!(notes.iter().any(|n| n.contains("'Ghost'")));
    }

    #[test]
    fn parent_ids_only_point_at_known_nodes() {
        let doc = SceneDocument::from_bytes(
            json!({
                "scene": {
                    "nodes": [
                        { "id": "root", "geometries": [ { "id": "g0" } ] },
                        {
                            "id": "child",
                            "parent": "#root",
                            "geometries": [ { "id": "g1" } ]
                        },
                        {
                            "id": "stray",
                            "parent": "#elsewhere",
                            "geometries": [ { "id": "g2" } ]
                        }
                    ]
                }
            })
            .to_string()
            .as_bytes(),
        )
        .unwrap();
        let (objects, _) = build(&doc);
        assert_eq!(objects[1].parent_id.as_deref(), Some("root"));
        assert_eq!(objects[2].parent_id, None);
    }

    #[test]
    fn unresolved_shader_type_fails_the_build() {
        let doc = SceneDocument::from_bytes(
            json!({
                "scene": {
                    "nodes": [ { "id": "n", "geometries": [ { "id": "g" } ] } ],
                    "materials": [ { "id": "m", "geometry": "#g", "url": "#nowhere" } ]
                }
            })
            .to_string()
            .as_bytes(),
        )
        .unwrap();
        let mut paths = ContentPathResolver::new(Vec::new());
        let mut shader_types = ShaderTypeResolver::new();
        let mut notes = Vec::new();
        let err = build_objects(&doc, &mut paths, &mut shader_types, &mut notes).unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvedShaderType(_)));
    }
}
