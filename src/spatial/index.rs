use macroquad::prelude::*;

/// Map-local tile coordinate. Origin top-left, x grows right, y grows down.
pub type TilePos = IVec2;

/// Raw Tiled gid, possibly carrying flip flags in its top bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(pub u32);

pub const FLIP_H: u32 = 0x8000_0000; // bit 31
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
pub const GID_MASK: u32 = 0x1FFF_FFFF; // keep lower 29 bits (bit 28 is free)

/// Flip flags of one placed tile. Tiled applies the diagonal flip first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileFlip {
    pub h: bool,
    pub v: bool,
    pub d: bool,
}

impl TileId {
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    #[inline] pub fn is_empty(self) -> bool { self.clean() == 0 }
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }

    pub fn flip(self) -> TileFlip {
        TileFlip {
            h: self.flip_h(),
            v: self.flip_v(),
            d: self.flip_d(),
        }
    }
}

/// Half-open rectangle of tile cells: `min` inclusive, `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileRect {
    pub min: TilePos,
    pub max: TilePos,
}

impl TileRect {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: IVec2::new(x0, y0),
            max: IVec2::new(x1, y1),
        }
    }

    /// Rectangle covering a whole `width` x `height` grid.
    pub fn of_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    #[inline]
    pub fn width(&self) -> i32 {
        (self.max.x - self.min.x).max(0)
    }

    #[inline]
    pub fn height(&self) -> i32 {
        (self.max.y - self.min.y).max(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    #[inline]
    pub fn contains(&self, p: TilePos) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    pub fn intersect(&self, other: &TileRect) -> TileRect {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        TileRect {
            min,
            max: max.max(min),
        }
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = TilePos> + '_ {
        (self.min.y..self.max.y)
            .flat_map(move |y| (self.min.x..self.max.x).map(move |x| ivec2(x, y)))
    }

    /// Smallest tile rectangle covering a pixel-space box. Zero-sized boxes
    /// still cover the cell they sit in.
    pub fn from_pixels(x: f32, y: f32, w: f32, h: f32, tile_size: u32) -> Self {
        let ts = tile_size as f32;
        let x0 = (x / ts).floor() as i32;
        let y0 = (y / ts).floor() as i32;
        let x1 = (((x + w) / ts).ceil() as i32).max(x0 + 1);
        let y1 = (((y + h) / ts).ceil() as i32).max(y0 + 1);
        Self::new(x0, y0, x1, y1)
    }
}
