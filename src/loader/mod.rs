pub mod json_loader;

use crate::error::MapError;
use crate::ir_map::IrMap;
use std::path::PathBuf;
use tracing::debug;

/// Where map definitions come from.
///
/// Returns the decoded map together with the directory tileset images are
/// resolved against.
pub trait MapSource {
    /// Decode the map named `id`.
    fn load(&self, id: &str) -> Result<(IrMap, PathBuf), MapError>;
}

/// Reads `<dir>/<id>.json` Tiled maps from disk.
#[derive(Debug, Clone)]
pub struct FileMapSource {
    dir: PathBuf,
}

impl FileMapSource {
    /// Source rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl MapSource for FileMapSource {
    fn load(&self, id: &str) -> Result<(IrMap, PathBuf), MapError> {
        let path = self.dir.join(format!("{id}.json"));
        debug!(map = id, path = %path.display(), "reading map file");
        json_loader::decode_map_file_to_ir(&path)
    }
}
