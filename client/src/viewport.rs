use kasland_shared::GridPos;

use crate::iso::{self, ContainerRect, TILE_HEIGHT, TILE_WIDTH};

pub const MAX_SCALE: f64 = 8.0;
/// Relative scale change per unit of zoom delta (one wheel notch).
const ZOOM_FACTOR: f64 = 0.1;
/// Share of the container the whole map occupies at the initial scale.
const FIT_RATIO: f64 = 0.9;
/// Fixed over-scroll allowance added to the container width before scaling,
/// so the map can be pushed well past its edges for framing.
const OVERSCROLL_PX: f64 = 3500.0;

/// Viewport owns the pan/zoom state of the tile layer.
///
/// `offset_x`/`offset_y` are a world-space displacement of the map relative to
/// the container centre: with zero offset the middle of the map sits in the
/// middle of the container, and a positive offset moves the map right/down.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
    pub initial_scale: f64,
    container: ContainerRect,
    map_size: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
            initial_scale: 1.0,
            container: ContainerRect::default(),
            map_size: 0,
        }
    }
}

/// Final transform for the tile layer, applied with `transform-origin: 0 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
}

impl LayerTransform {
    pub fn css(&self) -> String {
        format!(
            "translate({:.3}px, {:.3}px) scale({:.5})",
            self.translate_x, self.translate_y, self.scale
        )
    }

    /// Translation expressed in world units (the layer paints `w` at `(w + o) * s`).
    pub fn world_offset(&self) -> (f64, f64) {
        (self.translate_x / self.scale, self.translate_y / self.scale)
    }
}

impl Viewport {
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn container(&self) -> ContainerRect {
        self.container
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn map_size(&self) -> u32 {
        self.map_size
    }

    /// Whether a new container size or map size calls for a refit.
    pub fn needs_fit(&self, container: &ContainerRect, map_size: u32) -> bool {
        self.map_size != map_size
            || self.container.width != container.width
            || self.container.height != container.height
    }

    /// Track a container that moved on the page without resizing.
    pub fn set_container_origin(&mut self, container: &ContainerRect) {
        self.container.left = container.left;
        self.container.top = container.top;
    }

    /// Recompute the minimum scale so the whole map fits, and reset to it.
    pub fn fit_to_container(&mut self, container: ContainerRect, map_size: u32) {
        self.container = container;
        self.map_size = map_size;

        // Nothing to fit yet: stay at unit scale until a real size arrives.
        let initial = if map_size == 0 || container.is_empty() {
            1.0
        } else {
            let ideal = container.max_dim() / (f64::from(map_size) * TILE_WIDTH.max(TILE_HEIGHT));
            (ideal * FIT_RATIO).min(1.0)
        };
        self.initial_scale = if initial.is_finite() && initial > 0.0 {
            initial
        } else {
            1.0
        };
        self.scale = self.initial_scale;
        self.clamp_offset();
    }

    /// Pan by a world-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.offset_x += dx;
        self.offset_y += dy;
        self.clamp_offset();
    }

    /// Zoom toward a focus point given in page coordinates. Positive `delta`
    /// zooms out, negative zooms in.
    pub fn zoom_at(&mut self, delta: f64, page_x: f64, page_y: f64) {
        if !delta.is_finite() {
            return;
        }
        let old_scale = self.scale;
        let new_scale =
            (old_scale * (1.0 - delta * ZOOM_FACTOR)).clamp(self.initial_scale, MAX_SCALE);

        // Keep the world point under the pointer fixed on screen.
        let (local_x, local_y) = self.container.to_local(page_x, page_y);
        let (center_x, center_y) = self.container.center();
        let from_center_x = local_x - center_x;
        let from_center_y = local_y - center_y;
        self.offset_x -= from_center_x * (1.0 / old_scale - 1.0 / new_scale);
        self.offset_y -= from_center_y * (1.0 / old_scale - 1.0 / new_scale);
        self.scale = new_scale;
        self.clamp_offset();
    }

    /// Rendered map footprint in container pixels at the current scale.
    pub fn map_extent_px(&self) -> (f64, f64) {
        let n = f64::from(self.map_size);
        (n * TILE_WIDTH * self.scale, n * TILE_HEIGHT * self.scale)
    }

    /// Largest allowed `|offset_x|` and `|offset_y|` at the current scale.
    pub fn offset_bounds(&self) -> (f64, f64) {
        let margin = self.scale * (self.container.width + OVERSCROLL_PX);
        let (map_w, map_h) = self.map_extent_px();
        let bound_x = ((map_w - self.container.width) / 2.0 + margin) / self.scale;
        let bound_y = ((map_h - self.container.height) / 2.0 + margin) / self.scale;
        (bound_x.max(0.0), bound_y.max(0.0))
    }

    fn clamp_offset(&mut self) {
        let (bound_x, bound_y) = self.offset_bounds();
        self.offset_x = self.offset_x.clamp(-bound_x, bound_x);
        self.offset_y = self.offset_y.clamp(-bound_y, bound_y);
    }

    /// Centre the map in the container, shift by the pan offset, then scale.
    pub fn layer_transform(&self) -> LayerTransform {
        let (center_x, center_y) = self.container.center();
        let (map_cx, map_cy) = iso::map_center(self.map_size);
        LayerTransform {
            translate_x: center_x + self.scale * (self.offset_x - map_cx),
            translate_y: center_y + self.scale * (self.offset_y - map_cy),
            scale: self.scale,
        }
    }

    /// Convert page coordinates into world coordinates.
    pub fn page_to_world(&self, page_x: f64, page_y: f64) -> (f64, f64) {
        let transform = self.layer_transform();
        iso::pointer_to_world(
            page_x,
            page_y,
            &self.container,
            self.scale,
            transform.world_offset(),
        )
    }

    /// Convert world coordinates into container-local coordinates.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn world_to_local(&self, wx: f64, wy: f64) -> (f64, f64) {
        let transform = self.layer_transform();
        (
            transform.translate_x + wx * transform.scale,
            transform.translate_y + wy * transform.scale,
        )
    }

    /// Grid cell under a page-space pointer.
    pub fn page_to_grid(&self, page_x: f64, page_y: f64) -> GridPos {
        let (wx, wy) = self.page_to_world(page_x, page_y);
        iso::screen_to_grid(wx, wy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fitted(map_size: u32) -> Viewport {
        let mut vp = Viewport::default();
        vp.fit_to_container(ContainerRect::new(40.0, 60.0, 1000.0, 800.0), map_size);
        vp
    }

    #[test]
    fn fit_uses_largest_container_dimension() {
        let vp = fitted(20);
        // 0.9 * 1000 / (20 * 100)
        assert!((vp.initial_scale - 0.45).abs() < 1e-12);
        assert_eq!(vp.scale, vp.initial_scale);
    }

    #[test]
    fn fit_never_exceeds_unit_scale() {
        let vp = fitted(2);
        assert_eq!(vp.initial_scale, 1.0);
    }

    #[test]
    fn empty_map_fits_at_unit_scale() {
        let vp = fitted(0);
        assert_eq!(vp.initial_scale, 1.0);
        assert_eq!(vp.scale, 1.0);

        let mut vp = Viewport::default();
        vp.fit_to_container(ContainerRect::new(0.0, 0.0, 0.0, 0.0), 20);
        assert_eq!(vp.initial_scale, 1.0);
    }

    #[test]
    fn zoom_out_stops_at_initial_scale() {
        let mut vp = fitted(20);
        for _ in 0..10 {
            vp.zoom_at(1.0, 540.0, 460.0);
        }
        assert_eq!(vp.scale, vp.initial_scale);
    }

    #[test]
    fn zoom_in_stops_at_max_scale() {
        let mut vp = fitted(20);
        for _ in 0..200 {
            vp.zoom_at(-1.0, 540.0, 460.0);
        }
        assert_eq!(vp.scale, MAX_SCALE);
    }

    #[test]
    fn zoom_keeps_point_under_cursor() {
        let mut vp = fitted(20);
        let (px, py) = (820.0, 250.0);
        let before = vp.page_to_world(px, py);
        vp.zoom_at(-1.0, px, py);
        let after = vp.page_to_world(px, py);
        assert!(vp.scale > vp.initial_scale);
        assert!((before.0 - after.0).abs() < 1e-9);
        assert!((before.1 - after.1).abs() < 1e-9);
    }

    #[test]
    fn zoom_at_container_centre_leaves_offset_alone() {
        let mut vp = fitted(20);
        vp.pan(12.0, -7.0);
        vp.zoom_at(-1.0, 540.0, 460.0);
        assert!((vp.offset_x - 12.0).abs() < 1e-9);
        assert!((vp.offset_y + 7.0).abs() < 1e-9);
    }

    #[test]
    fn unpanned_layer_centres_the_map() {
        let vp = fitted(20);
        let (cx, cy) = iso::map_center(20);
        let (lx, ly) = vp.world_to_local(cx, cy);
        assert!((lx - 500.0).abs() < 1e-9);
        assert!((ly - 400.0).abs() < 1e-9);
    }

    #[test]
    fn pan_is_clamped_to_bounds() {
        let mut vp = fitted(20);
        vp.pan(1.0e9, -1.0e9);
        let (bx, by) = vp.offset_bounds();
        assert_eq!(vp.offset_x, bx);
        assert_eq!(vp.offset_y, -by);
    }

    #[test]
    fn bounds_never_go_negative_on_huge_maps() {
        let vp = fitted(1_000);
        let (bx, by) = vp.offset_bounds();
        assert!(bx >= 0.0);
        assert!(by >= 0.0);
    }

    #[test]
    fn page_to_grid_hits_the_cell_under_the_pointer() {
        let mut vp = fitted(10);
        vp.zoom_at(-3.0, 300.0, 300.0);
        let (wx, wy) = iso::grid_to_screen(3, 6);
        let (lx, ly) = vp.world_to_local(wx, wy);
        let container = vp.container();
        let hit = vp.page_to_grid(lx + container.left, ly + container.top);
        assert_eq!(hit, GridPos::new(3, 6));
    }

    #[test]
    fn css_transform_lists_translate_before_scale() {
        let transform = LayerTransform {
            translate_x: 10.0,
            translate_y: -2.5,
            scale: 0.5,
        };
        assert_eq!(
            transform.css(),
            "translate(10.000px, -2.500px) scale(0.50000)"
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Pan(f64, f64),
        Zoom(f64, f64, f64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-5_000.0f64..5_000.0, -5_000.0f64..5_000.0).prop_map(|(dx, dy)| Op::Pan(dx, dy)),
            (-3.0f64..3.0, 0.0f64..1100.0, 0.0f64..900.0)
                .prop_map(|(d, x, y)| Op::Zoom(d, x, y)),
        ]
    }

    proptest! {
        #[test]
        fn scale_and_offset_stay_clamped(
            map_size in 1u32..400,
            ops in proptest::collection::vec(op(), 1..60),
        ) {
            let mut vp = fitted(map_size);
            for op in ops {
                match op {
                    Op::Pan(dx, dy) => vp.pan(dx, dy),
                    Op::Zoom(d, x, y) => vp.zoom_at(d, x, y),
                }
                prop_assert!(vp.scale >= vp.initial_scale);
                prop_assert!(vp.scale <= MAX_SCALE);
                let (bx, by) = vp.offset_bounds();
                prop_assert!(vp.offset_x.abs() <= bx + 1e-9);
                prop_assert!(vp.offset_y.abs() <= by + 1e-9);
            }
        }

        #[test]
        fn zoom_to_cursor_is_stable(
            delta in -2.0f64..2.0,
            px in 40.0f64..1040.0,
            py in 60.0f64..860.0,
        ) {
            let mut vp = fitted(30);
            vp.zoom_at(-4.0, 540.0, 460.0);
            let before = vp.page_to_world(px, py);
            vp.zoom_at(delta, px, py);
            let after = vp.page_to_world(px, py);
            prop_assert!((before.0 - after.0).abs() < 1e-6);
            prop_assert!((before.1 - after.1).abs() < 1e-6);
        }
    }
}
