use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kitsune-dazscene")]
#[command(about = "Kitsune DAZ Studio scene document resolver")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Inspect {
        scene: PathBuf,
    },
    Dump {
        scene: PathBuf,
        #[arg(long)]
        section: Option<String>,
    },
    Resolve {
        scene: PathBuf,
        #[arg(long = "content-root")]
        content_roots: Vec<PathBuf>,
        #[arg(long, default_value_os_t = default_config_path())]
        config: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    NameMap {
        scene: PathBuf,
    },
    Textures {
        scene: PathBuf,
        #[arg(long = "content-root")]
        content_roots: Vec<PathBuf>,
        #[arg(long, default_value_os_t = default_config_path())]
        config: PathBuf,
        #[arg(long)]
        probe: bool,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    AddRoot {
        root: PathBuf,
        #[arg(long, default_value_os_t = default_config_path())]
        config: PathBuf,
    },
    RemoveRoot {
        root: PathBuf,
        #[arg(long, default_value_os_t = default_config_path())]
        config: PathBuf,
    },
    List {
        #[arg(long, default_value_os_t = default_config_path())]
        config: PathBuf,
    },
}

fn default_config_path() -> PathBuf {
    if let Ok(home) = env::var("HOME") {
        return PathBuf::from(home).join(".config/kitsune-dazscene/config.json");
    }
    PathBuf::from("config.json")
}
