use crate::error::{ResolveError, Result};
use crate::reference::{is_external_reference, resolve_reference};
use serde_json::Value;
use std::collections::HashMap;

// Materials authored through the shader mixer all declare this generic type;
// the real shader name then hides in the brick settings payload.
pub const BRICK_MATERIAL_TYPE: &str = "studio/material/daz_brick";
const MATERIAL_TYPE_PREFIX: &str = "studio/material/";

#[derive(Debug, Default)]
pub struct ShaderTypeResolver {
    // Within one document the same material url always names the same shader.
    cache: HashMap<String, String>,
}

impl ShaderTypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(
        &mut self,
        url: &str,
        scene_material: &Value,
        library_material: Option<&Value>,
    ) -> Result<String> {
        if let Some(hit) = self.cache.get(url) {
            return Ok(hit.clone());
        }
        let type_id = resolve_uncached(url, scene_material, library_material)?;
        self.cache.insert(url.to_string(), type_id.clone());
        Ok(type_id)
    }
}

fn resolve_uncached(
    url: &str,
    scene_material: &Value,
    library_material: Option<&Value>,
) -> Result<String> {
    // External documents are never opened; the fragment itself names the
    // shader.
    if is_external_reference(url) {
        return Ok(slugify(&resolve_reference(url)));
    }

    if let Some(declared) = extra_type(scene_material)
        && declared != BRICK_MATERIAL_TYPE
    {
        return Ok(slugify(strip_type_prefix(declared)));
    }

    if let Some(library) = library_material {
        if let Some(direct) = library.get("type").and_then(Value::as_str) {
            return Ok(slugify(strip_type_prefix(direct)));
        }
        if let Some(declared) = extra_type(library) {
            if declared == BRICK_MATERIAL_TYPE {
                if let Some(name) = brick_shader_name(library) {
                    return Ok(slugify(name));
                }
            } else {
                return Ok(slugify(strip_type_prefix(declared)));
            }
        }
    }

    Err(ResolveError::UnresolvedShaderType(url.to_string()))
}

fn extra_type(record: &Value) -> Option<&str> {
    record
        .get("extra")?
        .as_array()?
        .iter()
        .find_map(|extra| extra.get("type").and_then(Value::as_str))
}

fn brick_shader_name(record: &Value) -> Option<&str> {
    record.get("extra")?.as_array()?.iter().find_map(|extra| {
        extra
            .get("brick_settings")?
            .get("value")?
            .get("BrickUserName")?
            .as_str()
    })
}

fn strip_type_prefix(raw: &str) -> &str {
    raw.strip_prefix(MATERIAL_TYPE_PREFIX).unwrap_or(raw)
}

fn slugify(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}
