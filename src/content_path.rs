use crate::error::{ResolveError, Result};
use crate::reference::decode_percent;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

// Document asset paths are percent-encoded, use forward slashes and start at a
// content-root boundary ("/Runtime/Textures/..."). The casing stored in the
// document does not have to match the filesystem.
#[derive(Debug)]
pub struct ContentPathResolver {
    roots: Vec<PathBuf>,
    cache: HashMap<String, PathBuf>,
    unresolved: usize,
}

impl ContentPathResolver {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            cache: HashMap::new(),
            unresolved: 0,
        }
    }

    pub fn has_roots(&self) -> bool {
        !self.roots.is_empty()
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn unresolved_lookups(&self) -> usize {
        self.unresolved
    }

    pub fn resolve(&mut self, raw_path: &str) -> Result<Option<PathBuf>> {
        if let Some(hit) = self.cache.get(raw_path) {
            return Ok(Some(hit.clone()));
        }
        if self.roots.is_empty() {
            self.unresolved += 1;
            return Err(ResolveError::ContentRootNotFound);
        }

        let rel = normalize_content_path(raw_path);
        if rel.is_empty() {
            self.unresolved += 1;
            return Ok(None);
        }

        for root in &self.roots {
            if let Some(found) = resolve_in_root(root, &rel) {
                // Only hits are cached; a miss may start resolving once the
                // user installs the missing content.
                self.cache.insert(raw_path.to_string(), found.clone());
                return Ok(Some(found));
            }
        }
        self.unresolved += 1;
        Ok(None)
    }
}

fn normalize_content_path(raw: &str) -> String {
    let decoded = decode_percent(raw.trim()).replace('\\', "/");
    decoded.trim_start_matches('/').to_string()
}

fn resolve_in_root(root: &Path, rel: &str) -> Option<PathBuf> {
    let direct = root.join(rel);
    if direct.exists() {
        return Some(direct);
    }
    let mut current = root.to_path_buf();
    for component in rel.split('/').filter(|c| !c.is_empty()) {
        current = match_component(&current, component)?;
    }
    Some(current)
}

fn match_component(dir: &Path, component: &str) -> Option<PathBuf> {
    let exact = dir.join(component);
    if exact.exists() {
        return Some(exact);
    }
    // Unreadable directories count as not containing the component.
    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        if entry
            .file_name()
            .to_string_lossy()
            .eq_ignore_ascii_case(component)
        {
            return Some(entry.path());
        }
    }
    None
}
