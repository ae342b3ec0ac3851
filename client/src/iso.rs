//! Isometric projection between grid cells, world pixels and pointer positions.
//!
//! World space is the untransformed pixel plane of the tile layer: the centre
//! of cell `(x, y)` sits at [`grid_to_screen`]. The viewport maps world space
//! onto the container with a uniform scale followed by a translation.

use kasland_shared::GridPos;

/// Footprint of one tile sprite in world pixels.
pub const TILE_WIDTH: f64 = 100.0;
pub const TILE_HEIGHT: f64 = 50.0;

/// Distance between neighbouring cell centres along each screen axis.
/// Slightly wider than half a sprite so adjacent tiles leave a thin seam.
pub const TILE_SPACING_X: f64 = 55.0;
pub const TILE_SPACING_Y: f64 = 27.5;

/// Client-space rectangle of the map container, as reported by
/// `getBoundingClientRect`. Pointer positions named `page_*` share this space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContainerRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainerRect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn from_dom(rect: &web_sys::DomRect) -> Self {
        Self::new(rect.left(), rect.top(), rect.width(), rect.height())
    }

    /// Container-local centre point.
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    pub fn max_dim(&self) -> f64 {
        self.width.max(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Convert page coordinates into container-local ones.
    pub fn to_local(&self, page_x: f64, page_y: f64) -> (f64, f64) {
        (page_x - self.left, page_y - self.top)
    }
}

/// Centre of a grid cell in world pixels.
pub fn grid_to_screen(x: i64, y: i64) -> (f64, f64) {
    (
        (x - y) as f64 * TILE_SPACING_X,
        (x + y) as f64 * TILE_SPACING_Y,
    )
}

/// Nearest grid cell to a world-space point.
pub fn screen_to_grid(px: f64, py: f64) -> GridPos {
    let u = px / TILE_SPACING_X;
    let v = py / TILE_SPACING_Y;
    GridPos::new(((u + v) / 2.0).round() as i64, ((v - u) / 2.0).round() as i64)
}

/// Top-left corner for a tile node whose centre must land on the cell centre.
pub fn tile_origin(pos: GridPos) -> (f64, f64) {
    let (cx, cy) = grid_to_screen(pos.x, pos.y);
    (cx - TILE_WIDTH / 2.0, cy - TILE_HEIGHT / 2.0)
}

/// World point at the visual centre of a `map_size` x `map_size` diamond.
pub fn map_center(map_size: u32) -> (f64, f64) {
    if map_size == 0 {
        return (0.0, 0.0);
    }
    (0.0, f64::from(map_size - 1) * TILE_SPACING_Y)
}

/// Undo the container origin, the layer scale and the layer offset.
///
/// `offset` is the layer translation expressed in world units, i.e. the
/// layer paints world point `w` at container-local `(w + offset) * scale`.
pub fn pointer_to_world(
    pointer_x: f64,
    pointer_y: f64,
    rect: &ContainerRect,
    scale: f64,
    offset: (f64, f64),
) -> (f64, f64) {
    let (local_x, local_y) = rect.to_local(pointer_x, pointer_y);
    (local_x / scale - offset.0, local_y / scale - offset.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn origin_cell_projects_to_world_origin() {
        assert_eq!(grid_to_screen(0, 0), (0.0, 0.0));
        assert_eq!(grid_to_screen(1, 0), (55.0, 27.5));
        assert_eq!(grid_to_screen(0, 1), (-55.0, 27.5));
    }

    #[test]
    fn points_near_a_cell_centre_snap_to_it() {
        let (cx, cy) = grid_to_screen(4, 2);
        assert_eq!(screen_to_grid(cx + 12.0, cy - 6.0), GridPos::new(4, 2));
        assert_eq!(screen_to_grid(cx - 20.0, cy + 5.0), GridPos::new(4, 2));
    }

    #[test]
    fn tile_origin_centres_sprite_on_cell() {
        assert_eq!(tile_origin(GridPos::new(0, 0)), (-50.0, -25.0));
    }

    #[test]
    fn map_center_sits_between_top_and_bottom_corners() {
        let (top_x, top_y) = grid_to_screen(0, 0);
        let (bottom_x, bottom_y) = grid_to_screen(9, 9);
        let center = map_center(10);
        assert_eq!(center, ((top_x + bottom_x) / 2.0, (top_y + bottom_y) / 2.0));
        assert_eq!(map_center(0), (0.0, 0.0));
    }

    #[test]
    fn pointer_to_world_removes_origin_scale_and_offset() {
        let rect = ContainerRect::new(10.0, 20.0, 800.0, 600.0);
        let (wx, wy) = pointer_to_world(110.0, 220.0, &rect, 2.0, (5.0, -5.0));
        assert_eq!((wx, wy), (45.0, 105.0));
    }

    proptest! {
        #[test]
        fn grid_round_trips_through_screen(x in 0i64..500, y in 0i64..500) {
            let (px, py) = grid_to_screen(x, y);
            prop_assert_eq!(screen_to_grid(px, py), GridPos::new(x, y));
        }

        #[test]
        fn pointer_to_world_inverts_layer_transform(
            wx in -5_000.0f64..5_000.0,
            wy in -5_000.0f64..5_000.0,
            scale in 0.05f64..8.0,
            ox in -2_000.0f64..2_000.0,
            oy in -2_000.0f64..2_000.0,
        ) {
            let rect = ContainerRect::new(30.0, 45.0, 1024.0, 768.0);
            let page_x = rect.left + (wx + ox) * scale;
            let page_y = rect.top + (wy + oy) * scale;
            let (bx, by) = pointer_to_world(page_x, page_y, &rect, scale, (ox, oy));
            prop_assert!((bx - wx).abs() < 1e-6);
            prop_assert!((by - wy).abs() < 1e-6);
        }
    }
}
