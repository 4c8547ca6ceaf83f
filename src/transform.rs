use crate::document::SceneDocument;
use crate::error::{ResolveError, Result};
use crate::reference::resolve_reference;
use serde_json::Value;
use std::collections::HashSet;

pub type Vec3 = [f64; 3];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub rotation: Vec3,
    pub translation: Vec3,
    pub scale: Vec3,
}

const AXES: [&str; 3] = ["x", "y", "z"];

// Per-axis transform properties are arrays of channel records keyed by axis
// id; "current_value" is authoritative over the authored "value".
pub fn axis_triple(record: &Value, key: &str, default: f64) -> Vec3 {
    let mut out = [default; 3];
    let Some(entries) = record.get(key).and_then(Value::as_array) else {
        return out;
    };
    for entry in entries {
        let Some(axis) = entry.get("id").and_then(Value::as_str) else {
            continue;
        };
        if let Some(slot) = AXES.iter().position(|a| *a == axis)
            && let Some(value) = channel_number(entry)
        {
            out[slot] = value;
        }
    }
    out
}

fn channel_number(entry: &Value) -> Option<f64> {
    entry
        .get("current_value")
        .and_then(Value::as_f64)
        .or_else(|| entry.get("value").and_then(Value::as_f64))
}

pub fn general_scale(record: &Value) -> f64 {
    record
        .get("general_scale")
        .and_then(channel_number)
        .unwrap_or(1.0)
}

pub fn own_transform(record: &Value) -> NodeTransform {
    let uniform = general_scale(record);
    let mut scale = axis_triple(record, "scale", 1.0);
    for axis in &mut scale {
        *axis *= uniform;
    }
    NodeTransform {
        rotation: axis_triple(record, "rotation", 0.0),
        translation: axis_triple(record, "translation", 0.0),
        scale,
    }
}

pub fn origin(record: &Value) -> Vec3 {
    axis_triple(record, "center_point", 0.0)
}

// Walks the parent chain, summing rotation/translation and multiplying scale
// level by level. The visited set catches parent cycles; a parent reference
// that points outside the document just ends the chain.
pub fn compose_absolute(
    doc: &SceneDocument,
    node: &Value,
    own: NodeTransform,
) -> Result<NodeTransform> {
    let mut absolute = own;
    let mut visited = HashSet::new();
    if let Some(id) = node.get("id").and_then(Value::as_str) {
        visited.insert(id.to_string());
    }

    let mut current = node;
    while let Some(parent_ref) = current.get("parent").and_then(Value::as_str) {
        let parent_id = resolve_reference(parent_ref);
        let Some(parent) = doc.scene_node_by_id(&parent_id) else {
            break;
        };
        if !visited.insert(parent_id.clone()) {
            return Err(ResolveError::MalformedDocument(format!(
                "cyclic parent chain at node '{parent_id}'"
            )));
        }
        let parent_own = own_transform(parent);
        for axis in 0..3 {
            absolute.rotation[axis] += parent_own.rotation[axis];
            absolute.translation[axis] += parent_own.translation[axis];
            absolute.scale[axis] *= parent_own.scale[axis];
        }
        current = parent;
    }
    Ok(absolute)
}

pub fn wrap_rotation(rotation: Vec3) -> Vec3 {
    [
        rotation[0].rem_euclid(360.0),
        rotation[1].rem_euclid(360.0),
        rotation[2].rem_euclid(360.0),
    ]
}

// An instance node carries no transform of its own; it starts from the
// library definition its url points at, then composes up the scene parent
// chain like any other node. Rotations wrap into [0, 360).
pub fn instance_transform(doc: &SceneDocument, instance_node: &Value) -> Result<(Vec3, NodeTransform)> {
    let url = instance_node.get("url").and_then(Value::as_str).unwrap_or_default();
    let Some(definition) = doc.library_node_by_reference(url) else {
        return Err(ResolveError::DanglingReference {
            reference: url.to_string(),
            section: "node_library".to_string(),
        });
    };
    let composed = compose_absolute(doc, instance_node, own_transform(definition))?;
    Ok((
        origin(definition),
        NodeTransform {
            rotation: wrap_rotation(composed.rotation),
            ..composed
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> SceneDocument {
        SceneDocument::from_bytes(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn missing_properties_default_to_identity() {
        let own = own_transform(&json!({ "id": "n" }));
        assert_eq!(own.rotation, [0.0, 0.0, 0.0]);
        assert_eq!(own.translation, [0.0, 0.0, 0.0]);
        assert_eq!(own.scale, [1.0, 1.0, 1.0]);
        assert_eq!(origin(&json!({ "id": "n" })), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn current_value_is_authoritative() {
        let own = own_transform(&json!({
            "translation": [
                { "id": "x", "value": 1.0, "current_value": 4.0 },
                { "id": "z", "value": 2.0 }
            ]
        }));
        assert_eq!(own.translation, [4.0, 0.0, 2.0]);
    }

    #[test]
    fn general_scale_multiplies_every_axis() {
        let own = own_transform(&json!({
            "scale": [ { "id": "y", "current_value": 2.0 } ],
            "general_scale": { "current_value": 0.5 }
        }));
        assert_eq!(own.scale, [0.5, 1.0, 0.5]);
    }

    #[test]
    fn chain_composition_sums_and_multiplies() {
        let doc = doc(json!({
            "scene": {
                "nodes": [
                    {
                        "id": "root",
                        "rotation": [ { "id": "x", "current_value": 10.0 } ],
                        "translation": [ { "id": "x", "current_value": 1.0 } ],
                        "scale": [ { "id": "x", "current_value": 2.0 } ]
                    },
                    {
                        "id": "mid",
                        "parent": "#root",
                        "rotation": [ { "id": "x", "current_value": 20.0 } ],
                        "translation": [ { "id": "x", "current_value": 2.0 } ],
                        "scale": [ { "id": "x", "current_value": 3.0 } ]
                    },
                    {
                        "id": "leaf",
                        "parent": "#mid",
                        "rotation": [ { "id": "x", "current_value": 5.0 } ],
                        "translation": [ { "id": "x", "current_value": 4.0 } ]
                    }
                ]
            }
        }));
        let leaf = doc.scene_node_by_id("leaf").unwrap();
        let absolute = compose_absolute(&doc, leaf, own_transform(leaf)).unwrap();
        assert_eq!(absolute.rotation, [35.0, 0.0, 0.0]);
        assert_eq!(absolute.translation, [7.0, 0.0, 0.0]);
        assert_eq!(absolute.scale, [6.0, 1.0, 1.0]);
    }

    #[test]
    fn dangling_parent_ends_the_chain() {
        let doc = doc(json!({
            "scene": {
                "nodes": [
                    {
                        "id": "leaf",
                        "parent": "#gone",
                        "rotation": [ { "id": "x", "current_value": 15.0 } ]
                    }
                ]
            }
        }));
        let leaf = doc.scene_node_by_id("leaf").unwrap();
        let absolute = compose_absolute(&doc, leaf, own_transform(leaf)).unwrap();
        assert_eq!(absolute.rotation, [15.0, 0.0, 0.0]);
    }

    #[test]
    fn parent_cycle_is_malformed() {
        let doc = doc(json!({
            "scene": {
                "nodes": [
                    { "id": "a", "parent": "#b" },
                    { "id": "b", "parent": "#a" }
                ]
            }
        }));
        let a = doc.scene_node_by_id("a").unwrap();
        let err = compose_absolute(&doc, a, own_transform(a)).unwrap_err();
        assert!(matches!(err, ResolveError::MalformedDocument(_)));
    }

    #[test]
    fn self_parent_is_malformed() {
        let doc = doc(json!({
            "scene": { "nodes": [ { "id": "selfie", "parent": "#selfie" } ] }
        }));
        let node = doc.scene_node_by_id("selfie").unwrap();
        let err = compose_absolute(&doc, node, own_transform(node)).unwrap_err();
        assert!(matches!(err, ResolveError::MalformedDocument(_)));
    }

    #[test]
    fn rotations_wrap_into_one_turn() {
        assert_eq!(wrap_rotation([370.0, -30.0, 360.0]), [10.0, 330.0, 0.0]);
    }

    #[test]
    fn instance_transform_reads_the_library_definition() {
        let doc = doc(json!({
            "scene": {
                "nodes": [
                    { "id": "anchor", "rotation": [ { "id": "x", "current_value": 350.0 } ] },
                    { "id": "copy", "parent": "#anchor", "instance_of": "#Pine", "url": "#Pine%20Tall" }
                ]
            },
            "node_library": [
                {
                    "id": "Pine Tall",
                    "center_point": [ { "id": "y", "value": 1.5 } ],
                    "rotation": [ { "id": "x", "value": 0.0, "current_value": 20.0 } ]
                }
            ]
        }));
        let copy = doc.scene_node_by_id("copy").unwrap();
        let (origin, placed) = instance_transform(&doc, copy).unwrap();
        assert_eq!(origin, [0.0, 1.5, 0.0]);
        // 350 + 20 wraps to 10.
        assert!((placed.rotation[0] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn instance_with_missing_definition_is_dangling() {
        let doc = doc(json!({
            "scene": {
                "nodes": [ { "id": "copy", "instance_of": "#Pine", "url": "#Gone" } ]
            }
        }));
        let copy = doc.scene_node_by_id("copy").unwrap();
        let err = instance_transform(&doc, copy).unwrap_err();
        match err {
            ResolveError::DanglingReference { reference, section } => {
                assert_eq!(reference, "#Gone");
                assert_eq!(section, "node_library");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
