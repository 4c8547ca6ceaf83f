use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

// Colon-separated list, highest priority after explicit --content-root flags.
pub const CONTENT_ROOTS_ENV: &str = "KDZ_CONTENT_ROOTS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    pub version: u32,
    #[serde(default)]
    pub content_roots: Vec<PathBuf>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            version: 1,
            content_roots: Vec::new(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<ContentConfig> {
    if !path.exists() {
        return Ok(ContentConfig::default());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: ContentConfig = serde_json::from_str(&text)
        .with_context(|| format!("Invalid config JSON in {}", path.display()))?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &ContentConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config)?;
    fs::write(path, text)
        .with_context(|| format!("Failed to write config {}", path.display()))?;
    Ok(())
}

pub fn add_root(config: &mut ContentConfig, root: PathBuf) -> bool {
    if config.content_roots.contains(&root) {
        return false;
    }
    config.content_roots.push(root);
    true
}

pub fn remove_root(config: &mut ContentConfig, root: &Path) -> bool {
    let before = config.content_roots.len();
    config.content_roots.retain(|existing| existing != root);
    before != config.content_roots.len()
}

// Flags first, then the environment, then the config file; duplicates keep
// their first (highest priority) position.
pub fn effective_content_roots(cli_roots: &[PathBuf], config_path: &Path) -> Result<Vec<PathBuf>> {
    let mut roots: Vec<PathBuf> = Vec::new();
    for root in cli_roots {
        push_unique(&mut roots, root.clone());
    }
    if let Ok(env_roots) = env::var(CONTENT_ROOTS_ENV) {
        for piece in env_roots.split(':').filter(|piece| !piece.is_empty()) {
            push_unique(&mut roots, PathBuf::from(piece));
        }
    }
    for root in load_config(config_path)?.content_roots {
        push_unique(&mut roots, root);
    }
    Ok(roots)
}

fn push_unique(roots: &mut Vec<PathBuf>, root: PathBuf) {
    if !roots.contains(&root) {
        roots.push(root);
    }
}
