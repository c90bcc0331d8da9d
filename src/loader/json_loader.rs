// src/loader/json_loader.rs
use crate::error::MapError;
use crate::ir_map::*;
use crate::spatial::GID_MASK;
use macroquad::prelude::*;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct JsonLayer {
    #[serde(default)]
    data: Vec<u32>,
    #[serde(default)]
    width: usize,
    #[serde(default)]
    height: usize,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default = "one")]
    opacity: f32,
    #[serde(default)]
    offsetx: f32,
    #[serde(default)]
    offsety: f32,
    #[serde(default)]
    name: String,
    #[serde(default)]
    class: String,
    #[serde(rename = "type")]
    kind: Option<String>, // "tilelayer" expected here
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    objects: Vec<JsonObject>,
}

fn default_true() -> bool {
    true
}
fn one() -> f32 {
    1.0
}
fn right_down() -> String {
    "right-down".to_owned()
}

#[derive(Deserialize)]
struct ExternalTilesetRef {
    firstgid: u32,
    source: String,
}

#[derive(Deserialize)]
struct EmbeddedTileset {
    firstgid: u32,
    #[serde(flatten)]
    tileset: ExternalTileset,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonTilesetRef {
    External(ExternalTilesetRef),
    Embedded(EmbeddedTileset),
}

#[derive(Deserialize)]
struct JsonMap {
    width: u32,
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default = "right_down")]
    renderorder: String,
    layers: Vec<JsonLayer>,
    #[serde(default)]
    tilesets: Vec<JsonTilesetRef>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct ExternalTileset {
    tilewidth: u32,
    tileheight: u32,
    tilecount: u32,
    columns: u32,
    image: String,
    #[serde(default)]
    spacing: u32,
    #[serde(default)]
    margin: u32,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    tiles: Vec<JsonTile>,
}

#[derive(Deserialize)]
struct JsonProperty {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    value: JsonValue,
}

#[derive(Deserialize)]
struct JsonObject {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    rotation: f32,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    point: bool,
    #[serde(default)]
    polygon: Vec<JsonObjectPoint>,
    #[serde(default)]
    polyline: Vec<JsonObjectPoint>,
    #[serde(default)]
    gid: Option<u32>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct JsonObjectPoint {
    x: f32,
    y: f32,
}

#[derive(Deserialize, Default)]
struct JsonObjectGroup {
    #[serde(default)]
    objects: Vec<JsonObject>,
}

#[derive(Deserialize)]
struct JsonFrame {
    tileid: u32,
    duration: u32,
}

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    objectgroup: JsonObjectGroup,
    #[serde(default)]
    animation: Vec<JsonFrame>,
}

fn json_property_to_ir(prop: JsonProperty) -> Result<Option<(String, PropertyValue)>, MapError> {
    let JsonProperty { name, kind, value } = prop;

    let parsed = match kind.as_deref() {
        Some("bool") => value.as_bool().map(PropertyValue::Bool),
        Some("int") | Some("object") => value.as_i64().map(PropertyValue::I64),
        Some("float") => value.as_f64().map(|n| PropertyValue::F32(n as f32)),
        Some("string") | Some("file") | Some("color") | Some("class") => {
            value.as_str().map(|s| PropertyValue::String(s.to_owned()))
        }
        Some(other) => {
            return Err(MapError::UnsupportedPropertyType {
                name,
                kind: other.to_owned(),
            });
        }
        None => {
            if let Some(v) = value.as_bool() {
                Some(PropertyValue::Bool(v))
            } else if let Some(v) = value.as_i64() {
                Some(PropertyValue::I64(v))
            } else if let Some(v) = value.as_f64() {
                Some(PropertyValue::F32(v as f32))
            } else {
                value.as_str().map(|s| PropertyValue::String(s.to_owned()))
            }
        }
    };

    Ok(parsed.map(|value| (name, value)))
}

fn properties_from_json(props: Vec<JsonProperty>) -> Result<Properties, MapError> {
    let mut out = Properties::new();
    for p in props {
        if let Some((name, value)) = json_property_to_ir(p)? {
            out.insert(name, value);
        }
    }
    Ok(out)
}

fn object_to_ir(obj: JsonObject) -> Result<IrObject, MapError> {
    let shape = if let Some(gid) = obj.gid {
        IrObjectShape::Tile { gid }
    } else if obj.point {
        IrObjectShape::Point
    } else if !obj.polygon.is_empty() {
        IrObjectShape::Polygon(obj.polygon.into_iter().map(|p| vec2(p.x, p.y)).collect())
    } else if !obj.polyline.is_empty() {
        IrObjectShape::Polyline(obj.polyline.into_iter().map(|p| vec2(p.x, p.y)).collect())
    } else {
        IrObjectShape::Rectangle
    };

    let class_name = if !obj.class.is_empty() {
        obj.class
    } else {
        obj.kind
    };

    Ok(IrObject {
        id: obj.id,
        name: obj.name,
        class_name,
        x: obj.x,
        y: obj.y,
        width: obj.width,
        height: obj.height,
        rotation: obj.rotation,
        visible: obj.visible,
        shape,
        properties: properties_from_json(obj.properties)?,
    })
}

/// Pixel extent of `cells` tiles of `tile` pixels must stay addressable as `i32`.
fn fits_in_pixels(cells: u32, tile: u32) -> bool {
    cells
        .checked_mul(tile.max(1))
        .is_some_and(|px| px <= i32::MAX as u32)
}

fn tileset_to_ir(first_gid: u32, ext: ExternalTileset, image: String) -> Result<IrTileset, MapError> {
    if ext.columns == 0 || ext.tilecount == 0 {
        return Err(MapError::InvalidMap(format!(
            "tileset `{image}` has no tiles"
        )));
    }
    let tiles = ext
        .tiles
        .into_iter()
        .map(|tile| -> Result<IrTileMetadata, MapError> {
            if tile.id >= ext.tilecount {
                return Err(MapError::InvalidMap(format!(
                    "tile {} of `{image}` is past its {} tiles",
                    tile.id, ext.tilecount
                )));
            }
            if let Some(frame) = tile.animation.iter().find(|f| f.duration == 0) {
                return Err(MapError::InvalidMap(format!(
                    "tile {} of `{image}` has a zero-length animation frame (tile {})",
                    tile.id, frame.tileid
                )));
            }
            Ok(IrTileMetadata {
                id: tile.id,
                properties: properties_from_json(tile.properties)?,
                objects: tile
                    .objectgroup
                    .objects
                    .into_iter()
                    .map(object_to_ir)
                    .collect::<Result<Vec<_>, _>>()?,
                animation: tile
                    .animation
                    .into_iter()
                    .map(|f| IrFrame {
                        tile_id: f.tileid,
                        duration_ms: f.duration,
                    })
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(IrTileset {
        first_gid,
        image,
        tile_w: ext.tilewidth,
        tile_h: ext.tileheight,
        tilecount: ext.tilecount,
        columns: ext.columns,
        spacing: ext.spacing,
        margin: ext.margin,
        properties: properties_from_json(ext.properties)?,
        tiles,
    })
}

fn read_text(path: &Path) -> Result<String, MapError> {
    std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and decodes a `.json` map file.
pub fn decode_map_file_to_ir(path: impl AsRef<Path>) -> Result<(IrMap, PathBuf), MapError> {
    let p = path.as_ref();
    if p.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(MapError::InvalidMap(format!(
            "Map file must be a JSON file: {}",
            p.display()
        )));
    }

    let txt = read_text(p)?;
    decode_map_str(&txt, p)
}

/// Decodes map JSON that was read from `path`. External tilesets and images
/// are resolved relative to `path`'s directory.
pub fn decode_map_str(txt: &str, path: &Path) -> Result<(IrMap, PathBuf), MapError> {
    let j: JsonMap = serde_json::from_str(txt).map_err(|source| MapError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let map_dir = path
        .parent()
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./"));

    if j.width == 0 || j.height == 0 {
        return Err(MapError::InvalidMap(format!(
            "{} has zero size {}x{}",
            path.display(),
            j.width,
            j.height
        )));
    }
    let expected_cells = j
        .width
        .checked_mul(j.height)
        .filter(|_| fits_in_pixels(j.width, j.tilewidth) && fits_in_pixels(j.height, j.tileheight))
        .ok_or_else(|| {
            MapError::InvalidMap(format!(
                "{} is too large: {}x{} tiles of {}x{}",
                path.display(),
                j.width,
                j.height,
                j.tilewidth,
                j.tileheight
            ))
        })? as usize;
    if j.renderorder != "right-down" {
        return Err(MapError::InvalidMap(format!(
            "{}: unsupported render order `{}`",
            path.display(),
            j.renderorder
        )));
    }

    // Build IR tilesets
    let mut ir_tilesets = Vec::with_capacity(j.tilesets.len());
    for ts in j.tilesets {
        let tileset = match ts {
            JsonTilesetRef::External(ExternalTilesetRef { firstgid, source }) => {
                if !source.ends_with(".json") {
                    return Err(MapError::InvalidMap(format!(
                        "External tileset must be JSON: {source}"
                    )));
                }
                let ts_path = map_dir.join(&source);
                let ext_txt = read_text(&ts_path)?;
                let ext: ExternalTileset =
                    serde_json::from_str(&ext_txt).map_err(|source| MapError::Json {
                        path: ts_path,
                        source,
                    })?;
                // Image paths inside a tileset are relative to the tileset file.
                let image = match Path::new(&source).parent() {
                    Some(dir) if !dir.as_os_str().is_empty() => {
                        dir.join(&ext.image).to_string_lossy().into_owned()
                    }
                    _ => ext.image.clone(),
                };
                tileset_to_ir(firstgid, ext, image)?
            }
            JsonTilesetRef::Embedded(EmbeddedTileset { firstgid, tileset }) => {
                let image = tileset.image.clone();
                tileset_to_ir(firstgid, tileset, image)?
            }
        };
        if tileset.last_gid().is_none() {
            return Err(MapError::InvalidMap(format!(
                "tileset `{}` covers gids {}+{}, outside the gid space",
                tileset.image, tileset.first_gid, tileset.tilecount
            )));
        }
        ir_tilesets.push(tileset);
    }

    // Sorted by first_gid; the map searches tilesets in this order
    ir_tilesets.sort_by_key(|t| t.first_gid);

    let max_gid = ir_tilesets
        .iter()
        .filter_map(IrTileset::last_gid)
        .max()
        .unwrap_or(0);

    // Build IR layers
    let mut ir_layers = Vec::with_capacity(j.layers.len());
    for l in j.layers {
        let layer_name = l.name.clone();
        let properties = properties_from_json(l.properties)?;
        let layer_kind = match l.kind.as_deref().unwrap_or("tilelayer") {
            "tilelayer" => {
                if l.data.len() != expected_cells {
                    return Err(MapError::InvalidLayerSize {
                        layer: layer_name,
                        len: l.data.len(),
                        expected: expected_cells,
                    });
                }
                for &raw_gid in &l.data {
                    let gid = raw_gid & GID_MASK;
                    if gid != 0 && gid > max_gid {
                        return Err(MapError::InvalidTileGid {
                            layer: layer_name.clone(),
                            gid,
                            max_gid,
                        });
                    }
                }
                IrLayerKind::Tiles {
                    width: j.width as usize,
                    height: j.height as usize,
                    data: l.data,
                }
            }
            "objectgroup" => IrLayerKind::Objects {
                objects: l
                    .objects
                    .into_iter()
                    .map(|obj| {
                        if let Some(raw_gid) = obj.gid {
                            let gid = raw_gid & GID_MASK;
                            if gid == 0 || gid > max_gid {
                                return Err(MapError::InvalidObjectGid {
                                    layer: layer_name.clone(),
                                    object_id: obj.id,
                                    gid,
                                    max_gid,
                                });
                            }
                        }
                        object_to_ir(obj)
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            },
            _ => IrLayerKind::Unsupported,
        };
        ir_layers.push(IrLayer {
            name: l.name,
            class: l.class,
            visible: l.visible,
            opacity: l.opacity,
            offset: vec2(l.offsetx, l.offsety),
            properties,
            kind: layer_kind,
        });
    }

    Ok((
        IrMap {
            width: j.width,
            height: j.height,
            tile_w: j.tilewidth,
            tile_h: j.tileheight,
            properties: properties_from_json(j.properties)?,
            tilesets: ir_tilesets,
            layers: ir_layers,
        },
        map_dir,
    ))
}
