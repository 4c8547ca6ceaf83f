use anyhow::{Context, Result, bail};

pub mod channels;
pub mod cli;
pub mod content_config;
pub mod content_path;
pub mod document;
pub mod error;
pub mod name_map;
pub mod object_graph;
pub mod reference;
pub mod resolver;
pub mod shader_type;
pub mod textures;
pub mod transform;
pub mod types;

use chrono::Local;
use cli::{Cli, Commands, ConfigCommands};
use content_config::{add_root, effective_content_roots, load_config, remove_root, save_config};
use content_path::ContentPathResolver;
use document::{DOCUMENT_SECTIONS, SceneDocument, inspect_scene_document};
use name_map::NameMap;
use object_graph::object_ids;
use resolver::{ResolvedScene, SceneResolver};
use serde::Serialize;
use std::fs;
use std::path::Path;
use textures::build_texture_report;

#[derive(Debug, Serialize)]
struct ResolveManifest {
    version: u32,
    generated_at: String,
    source: String,
    content_roots: Vec<String>,
    scene: ResolvedScene,
}

fn load_document(path: &Path) -> Result<SceneDocument> {
    SceneDocument::from_path(path)
        .with_context(|| format!("Failed to load scene document {}", path.display()))
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Inspect { scene } => {
            let info = inspect_scene_document(&scene)
                .with_context(|| format!("Failed to load scene document {}", scene.display()))?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
        Commands::Dump { scene, section } => {
            let doc = load_document(&scene)?;
            match section {
                Some(name) => {
                    let Some(value) = doc.section(&name) else {
                        bail!(
                            "No '{}' section in {} (known sections: {})",
                            name,
                            scene.display(),
                            DOCUMENT_SECTIONS.join(", ")
                        );
                    };
                    println!("{}", serde_json::to_string_pretty(value)?);
                }
                None => println!("{}", serde_json::to_string_pretty(doc.raw())?),
            }
            Ok(())
        }
        Commands::Resolve {
            scene,
            content_roots,
            config,
            output,
        } => {
            let roots = effective_content_roots(&content_roots, &config)?;
            if roots.is_empty() {
                eprintln!(
                    "[warn] no content roots configured; image channels will stay unresolved"
                );
            }
            let doc = load_document(&scene)?;
            let mut resolver = SceneResolver::new(roots.clone());
            let resolved = resolver.resolve_document(&doc)?;

            match output {
                Some(out_path) => {
                    for note in &resolved.notes {
                        eprintln!("[warn] {note}");
                    }
                    let manifest = ResolveManifest {
                        version: 1,
                        generated_at: Local::now().format("%Y-%m-%d %H:%M:%S %z").to_string(),
                        source: scene.to_string_lossy().to_string(),
                        content_roots: roots
                            .iter()
                            .map(|root| root.to_string_lossy().to_string())
                            .collect(),
                        scene: resolved,
                    };
                    if let Some(parent) = out_path.parent()
                        && !parent.as_os_str().is_empty()
                    {
                        fs::create_dir_all(parent)
                            .with_context(|| format!("Failed to create {}", parent.display()))?;
                    }
                    fs::write(&out_path, serde_json::to_string_pretty(&manifest)?)
                        .with_context(|| format!("Failed to write {}", out_path.display()))?;
                    println!("[ok] resolved {} objects", manifest.scene.objects.len());
                    println!("[ok] manifest: {}", out_path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&resolved)?),
            }
            Ok(())
        }
        Commands::NameMap { scene } => {
            let doc = load_document(&scene)?;
            let ids = object_ids(&doc);
            let names = NameMap::build(ids.iter().map(String::as_str));
            println!("{}", serde_json::to_string_pretty(&names)?);
            Ok(())
        }
        Commands::Textures {
            scene,
            content_roots,
            config,
            probe,
        } => {
            let roots = effective_content_roots(&content_roots, &config)?;
            let doc = load_document(&scene)?;
            let mut paths = ContentPathResolver::new(roots);
            let report = build_texture_report(&doc, &mut paths, probe);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Config { command } => run_config(command),
    }
}

fn run_config(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::AddRoot { root, config } => {
            let mut cfg = load_config(&config)?;
            if add_root(&mut cfg, root.clone()) {
                save_config(&config, &cfg)?;
                println!("[ok] added content root {}", root.display());
            } else {
                println!("[ok] content root already present: {}", root.display());
            }
            Ok(())
        }
        ConfigCommands::RemoveRoot { root, config } => {
            let mut cfg = load_config(&config)?;
            if remove_root(&mut cfg, &root) {
                save_config(&config, &cfg)?;
                println!("[ok] removed content root {}", root.display());
            } else {
                eprintln!("[warn] content root not in config: {}", root.display());
            }
            Ok(())
        }
        ConfigCommands::List { config } => {
            let cfg = load_config(&config)?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            Ok(())
        }
    }
}
