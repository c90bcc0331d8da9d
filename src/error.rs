use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or drawing a map.
#[derive(Debug, Error)]
pub enum MapError {
    /// Map, tileset or texture file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// File was read but is not valid Tiled JSON.
    #[error("failed to parse {path}: {source}")]
    Json {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// Structurally valid JSON describing something this crate cannot use.
    #[error("invalid map: {0}")]
    InvalidMap(String),
    /// Tiles are not square or do not match the configured tile size.
    #[error("map `{map}` has {tile_w}x{tile_h} tiles, expected {expected}x{expected}")]
    InvalidTileSize {
        /// Map id.
        map: String,
        /// Declared tile width.
        tile_w: u32,
        /// Declared tile height.
        tile_h: u32,
        /// Configured tile size.
        expected: u32,
    },
    /// A tile layer's data length does not match its dimensions.
    #[error("layer `{layer}` has {len} cells, expected {expected}")]
    InvalidLayerSize {
        /// Layer name.
        layer: String,
        /// Number of cells in `data`.
        len: usize,
        /// `width * height` of the map.
        expected: usize,
    },
    /// A layer cell references a gid no tileset covers.
    #[error("layer `{layer}` references gid {gid}, highest known gid is {max_gid}")]
    InvalidTileGid {
        /// Layer name.
        layer: String,
        /// Offending gid (flip flags stripped).
        gid: u32,
        /// Highest gid covered by the tilesets.
        max_gid: u32,
    },
    /// A tile object references a gid no tileset covers.
    #[error("object {object_id} in layer `{layer}` references gid {gid}, highest known gid is {max_gid}")]
    InvalidObjectGid {
        /// Layer name.
        layer: String,
        /// Object id.
        object_id: u32,
        /// Offending gid.
        gid: u32,
        /// Highest gid covered by the tilesets.
        max_gid: u32,
    },
    /// Custom property with a type this crate does not decode.
    #[error("property `{name}` has unsupported type `{kind}`")]
    UnsupportedPropertyType {
        /// Property name.
        name: String,
        /// Declared Tiled type.
        kind: String,
    },
    /// A known property carries a value that cannot be interpreted.
    #[error("property `{name}` has invalid value `{value}`")]
    InvalidProperty {
        /// Property name.
        name: String,
        /// Offending value, rendered as text.
        value: String,
    },
    /// An object is missing a property it requires.
    #[error("object {object_id} is missing property `{name}`")]
    MissingProperty {
        /// Object id.
        object_id: u32,
        /// Missing property name.
        name: String,
    },
    /// A sprite object names a class with no registered factory.
    #[error("no sprite factory registered for class `{0}`")]
    UnknownSpriteKind(String),
    /// A tileset image could not be decoded into a texture.
    #[error("failed to load texture {path}: {reason}")]
    Texture {
        /// Image path.
        path: PathBuf,
        /// Backend message.
        reason: String,
    },
    /// A layer index past the end of the map's layer list.
    #[error("layer index {0} is out of bounds")]
    LayerOutOfBounds(usize),
}
