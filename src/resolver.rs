use crate::content_path::ContentPathResolver;
use crate::document::SceneDocument;
use crate::error::Result;
use crate::name_map::NameMap;
use crate::object_graph::{SceneObject, build_objects};
use crate::shader_type::ShaderTypeResolver;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedScene {
    pub objects: Vec<SceneObject>,
    #[serde(flatten)]
    pub names: NameMap,
    pub notes: Vec<String>,
}

// One resolver per set of content roots. Each resolve call works on exactly
// one document; nothing is shared across concurrent resolutions.
#[derive(Debug)]
pub struct SceneResolver {
    paths: ContentPathResolver,
}

impl SceneResolver {
    pub fn new(content_roots: Vec<PathBuf>) -> Self {
        Self {
            paths: ContentPathResolver::new(content_roots),
        }
    }

    pub fn resolve_file(&mut self, path: &Path) -> Result<ResolvedScene> {
        let doc = SceneDocument::from_path(path)?;
        self.resolve_document(&doc)
    }

    pub fn resolve_bytes(&mut self, bytes: &[u8]) -> Result<ResolvedScene> {
        let doc = SceneDocument::from_bytes(bytes)?;
        self.resolve_document(&doc)
    }

    pub fn resolve_document(&mut self, doc: &SceneDocument) -> Result<ResolvedScene> {
        // Shader-type memoization is only sound within one document; the
        // content-path cache depends only on the roots and may live on.
        let mut shader_types = ShaderTypeResolver::new();
        let mut notes = Vec::new();
        let missed_before = self.paths.unresolved_lookups();

        let objects = build_objects(doc, &mut self.paths, &mut shader_types, &mut notes)?;

        let missed = self.paths.unresolved_lookups() - missed_before;
        if missed > 0 {
            if self.paths.has_roots() {
                notes.push(format!(
                    "{missed} image paths not found under the configured content roots"
                ));
            } else {
                notes.push(format!(
                    "no content roots configured; {missed} image channels left unresolved"
                ));
            }
        }

        let names = NameMap::build(objects.iter().map(|object| object.id.as_str()));
        Ok(ResolvedScene {
            objects,
            names,
            notes,
        })
    }
}
