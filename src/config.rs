use anyhow::Context as _;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Runtime configuration. Every field has a default, so a partial (or empty)
/// JSON object is a valid config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Window width in screen pixels.
    pub screen_width: i32,
    /// Window height in screen pixels.
    pub screen_height: i32,
    /// Integer zoom applied to map pixels.
    pub scale: i32,
    /// Tile edge in map pixels. Every map must use square tiles of this size.
    pub tile_size: u32,
    /// Directory holding `<id>.json` maps.
    pub maps_dir: PathBuf,
    /// Directory holding audio; map songs live in `<voice_dir>/map`.
    pub voice_dir: PathBuf,
    /// Directory holding localisation tables.
    pub localisation_dir: PathBuf,
    /// Banner counter units advanced per second.
    pub banner_speed: f32,
    /// Font size of the map-name banner.
    pub banner_font_size: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            screen_width: 720,
            screen_height: 480,
            scale: 2,
            tile_size: 16,
            maps_dir: PathBuf::from("data/world/maps"),
            voice_dir: PathBuf::from("data/voice"),
            localisation_dir: PathBuf::from("data/localisation"),
            banner_speed: 60.0,
            banner_font_size: 32.0,
        }
    }
}

impl Config {
    /// Reads a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path)
            .with_context(|| format!("Reading config file {}", path.display()))?;
        let cfg: Config = serde_json::from_str(&txt)
            .with_context(|| format!("Parsing config file {}", path.display()))?;
        if cfg.scale <= 0 || cfg.tile_size == 0 {
            anyhow::bail!("{}: scale and tile_size must be positive", path.display());
        }
        info!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    /// Height of the map-name banner band.
    pub fn banner_height(&self) -> i32 {
        self.screen_height / 7
    }
}

/// Key to display-string table.
#[derive(Debug, Clone, Default)]
pub struct Localisation {
    entries: HashMap<String, String>,
}

impl Localisation {
    /// Empty table; every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges every `*.json` object of strings found directly in `dir`.
    /// Files are applied in name order, later files overriding earlier keys.
    pub fn load_dir(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let mut files = std::fs::read_dir(dir)
            .with_context(|| format!("Reading localisation directory {}", dir.display()))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        files.retain(|p| p.extension().and_then(|e| e.to_str()) == Some("json"));
        files.sort();

        let mut loc = Self::new();
        for file in files {
            let txt = std::fs::read_to_string(&file)
                .with_context(|| format!("Reading localisation file {}", file.display()))?;
            let kvs: HashMap<String, String> = serde_json::from_str(&txt)
                .with_context(|| format!("Parsing localisation file {}", file.display()))?;
            debug!(file = %file.display(), keys = kvs.len(), "merged localisation table");
            loc.extend(kvs);
        }
        Ok(loc)
    }

    /// Adds or replaces one entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Adds or replaces many entries.
    pub fn extend(&mut self, kvs: impl IntoIterator<Item = (String, String)>) {
        self.entries.extend(kvs);
    }

    /// Looks up a display string.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// What the world and its sprites can see of the host.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Runtime configuration.
    pub config: Config,
    /// Display strings.
    pub localisation: Localisation,
}

impl Context {
    /// Bundles a config and a localisation table.
    pub fn new(config: Config, localisation: Localisation) -> Self {
        Self {
            config,
            localisation,
        }
    }
}
