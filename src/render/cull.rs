use crate::spatial::{Direction, TileRect};
use macroquad::prelude::*;

/// Screen size in screen pixels plus the integer zoom applied to map pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub screen: IVec2,
    pub scale: i32,
}

impl Viewport {
    pub fn new(width: i32, height: i32, scale: i32) -> Self {
        Self {
            screen: ivec2(width, height),
            scale: scale.max(1),
        }
    }

    /// Visible extent in unscaled map pixels.
    pub fn world_size(&self) -> IVec2 {
        self.screen / self.scale
    }
}

/// Tiles of a `size`-tile map drawn with its top-left at `offset` (unscaled
/// pixels) that intersect the viewport.
pub fn visible_tile_rect(offset: IVec2, size: IVec2, tile_size: i32, vp: Viewport) -> TileRect {
    let px = size * tile_size;
    let x0 = (-offset.x).max(0) / tile_size;
    let y0 = (-offset.y).max(0) / tile_size;
    let x1 = size.x - ((offset.x + px.x) * vp.scale - vp.screen.x).max(0) / (tile_size * vp.scale);
    let y1 = size.y - ((offset.y + px.y) * vp.scale - vp.screen.y).max(0) / (tile_size * vp.scale);

    let min = ivec2(x0, y0).clamp(IVec2::ZERO, size);
    let max = ivec2(x1, y1).clamp(IVec2::ZERO, size).max(min);
    TileRect { min, max }
}

/// Whether a neighbour in `direction` of a map at `offset` with `pixel_size`
/// can show up on screen.
pub fn neighbor_visible(direction: Direction, offset: IVec2, pixel_size: IVec2, vp: Viewport) -> bool {
    match direction {
        Direction::Up => offset.y > 0,
        Direction::Down => (offset.y + pixel_size.y) * vp.scale < vp.screen.y,
        Direction::Left => offset.x > 0,
        Direction::Right => (offset.x + pixel_size.x) * vp.scale < vp.screen.x,
    }
}

/// Offset of a neighbour placed edge-to-edge against a map at `offset`.
pub fn neighbor_offset(direction: Direction, offset: IVec2, pixel_size: IVec2, neighbor_size: IVec2) -> IVec2 {
    match direction {
        Direction::Up => ivec2(offset.x, offset.y - neighbor_size.y),
        Direction::Down => ivec2(offset.x, offset.y + pixel_size.y),
        Direction::Left => ivec2(offset.x - neighbor_size.x, offset.y),
        Direction::Right => ivec2(offset.x + pixel_size.x, offset.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_visible_map_covers_every_tile() {
        let vp = Viewport::new(320, 320, 1);
        let r = visible_tile_rect(ivec2(0, 0), ivec2(10, 10), 16, vp);
        assert_eq!(r, TileRect::new(0, 0, 10, 10));
    }

    #[test]
    fn clips_tiles_scrolled_off_each_edge() {
        let vp = Viewport::new(320, 240, 2); // 160x120 map pixels
        // 20x20 map (320px) scrolled 40px left and 24px up.
        let r = visible_tile_rect(ivec2(-40, -24), ivec2(20, 20), 16, vp);
        assert_eq!(r.min, ivec2(2, 1));
        // right edge sits at 280px unscaled, 120px past the viewport => 7 tiles hidden
        assert_eq!(r.max.x, 13);
        // bottom edge sits at 296px, 176px past => 11 tiles hidden
        assert_eq!(r.max.y, 9);
    }

    #[test]
    fn half_hidden_tiles_are_kept() {
        let vp = Viewport::new(100, 100, 1);
        let r = visible_tile_rect(ivec2(-8, 0), ivec2(10, 10), 16, vp);
        assert_eq!(r.min.x, 0);
        // right edge at 152, 52px past => 3 whole tiles hidden, the 4th partially visible
        assert_eq!(r.max.x, 7);
    }

    #[test]
    fn map_entirely_off_screen_yields_empty_rect() {
        let vp = Viewport::new(160, 160, 1);
        let r = visible_tile_rect(ivec2(400, 0), ivec2(10, 10), 16, vp);
        assert!(r.is_empty());
        let r = visible_tile_rect(ivec2(-400, 0), ivec2(10, 10), 16, vp);
        assert!(r.is_empty());
    }

    #[test]
    fn neighbours_show_only_past_visible_edges() {
        let vp = Viewport::new(320, 320, 1);
        let size = ivec2(160, 160);
        assert!(!neighbor_visible(Direction::Up, ivec2(0, 0), size, vp));
        assert!(!neighbor_visible(Direction::Left, ivec2(0, 0), size, vp));
        assert!(neighbor_visible(Direction::Right, ivec2(0, 0), size, vp));
        assert!(neighbor_visible(Direction::Down, ivec2(0, 0), size, vp));
        assert!(neighbor_visible(Direction::Up, ivec2(0, 1), size, vp));
        assert!(!neighbor_visible(Direction::Right, ivec2(160, 0), size, vp));
    }

    #[test]
    fn neighbours_stack_edge_to_edge() {
        let here = ivec2(10, 20);
        let size = ivec2(160, 96);
        let other = ivec2(64, 48);
        assert_eq!(neighbor_offset(Direction::Up, here, size, other), ivec2(10, -28));
        assert_eq!(neighbor_offset(Direction::Down, here, size, other), ivec2(10, 116));
        assert_eq!(neighbor_offset(Direction::Left, here, size, other), ivec2(-54, 20));
        assert_eq!(neighbor_offset(Direction::Right, here, size, other), ivec2(170, 20));
    }
}
