//! Pointer and touch disambiguation for the map container.
//!
//! Handlers run synchronously inside browser event callbacks; the dispatcher
//! only sees plain coordinates and timestamps, so every transition can be
//! exercised without a DOM.

use crate::viewport::Viewport;

/// Wheel notches zoom by a fixed step regardless of the reported delta size.
const WHEEL_STEP: f64 = 1.0;
/// Zoom delta per pixel of pinch distance change.
const PINCH_ZOOM_PER_PX: f64 = 0.01;
/// Quick-tap window for the container-level hit test.
pub const QUICK_TAP_MAX_MS: f64 = 200.0;
/// Tap window for touches that start and end on the same tile node.
pub const TILE_TAP_MAX_MS: f64 = 500.0;
/// Maximum finger travel for a touch to still count as a tap.
pub const TAP_MAX_TRAVEL_PX: f64 = 10.0;
/// Maximum mouse travel between press and click for the click to select.
const CLICK_MAX_TRAVEL_PX: f64 = 5.0;

/// A touch contact in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &TouchPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(&self, other: &TouchPoint) -> TouchPoint {
        TouchPoint::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Where and when a potential tap began.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchOrigin {
    pub point: TouchPoint,
    pub at_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchKind {
    Tap,
    Drag,
}

/// Tap iff the touch was short and barely moved.
pub fn classify_touch(duration_ms: f64, travel_px: f64, max_duration_ms: f64) -> TouchKind {
    if duration_ms < max_duration_ms && travel_px < TAP_MAX_TRAVEL_PX {
        TouchKind::Tap
    } else {
        TouchKind::Drag
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// Mouse drag or one-finger pan. `origin` is only set for a touch that
    /// started as a single finger, which is the only kind that may become a tap.
    Dragging {
        last: TouchPoint,
        origin: Option<TouchOrigin>,
    },
    /// Two-finger pinch; `distance` is the previous frame's finger spread.
    Pinching { distance: f64 },
}

/// What an input event did to the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    None,
    Pan,
    Zoom,
    /// A completed tap at a page-space point.
    Tap(TouchPoint),
}

#[derive(Debug, Default)]
pub struct GestureDispatcher {
    state: GestureState,
    mouse_press: Option<TouchPoint>,
}

impl GestureDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn mouse_down(&mut self, x: f64, y: f64) {
        let point = TouchPoint::new(x, y);
        self.mouse_press = Some(point);
        self.state = GestureState::Dragging {
            last: point,
            origin: None,
        };
    }

    pub fn mouse_move(&mut self, x: f64, y: f64, vp: &mut Viewport) -> Gesture {
        self.drag_to(TouchPoint::new(x, y), vp)
    }

    /// Release or leave; both end the drag.
    pub fn mouse_up(&mut self) {
        if matches!(self.state, GestureState::Dragging { origin: None, .. }) {
            self.state = GestureState::Idle;
        }
    }

    /// A click only selects if the mouse barely moved since the press.
    pub fn click_allowed(&self, x: f64, y: f64) -> bool {
        match self.mouse_press {
            Some(press) => {
                (x - press.x).abs() < CLICK_MAX_TRAVEL_PX && (y - press.y).abs() < CLICK_MAX_TRAVEL_PX
            }
            None => true,
        }
    }

    pub fn wheel(&mut self, delta_y: f64, x: f64, y: f64, vp: &mut Viewport) -> Gesture {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return Gesture::None;
        }
        let delta = if delta_y > 0.0 { WHEEL_STEP } else { -WHEEL_STEP };
        vp.zoom_at(delta, x, y);
        Gesture::Zoom
    }

    /// `touches` is every finger currently on the surface.
    pub fn touch_start(&mut self, touches: &[TouchPoint], now_ms: f64) {
        match touches {
            [] => {}
            [only] => {
                self.state = match self.state {
                    GestureState::Idle => GestureState::Dragging {
                        last: *only,
                        origin: Some(TouchOrigin {
                            point: *only,
                            at_ms: now_ms,
                        }),
                    },
                    // A finger landing mid-gesture never starts a tap.
                    _ => GestureState::Dragging {
                        last: *only,
                        origin: None,
                    },
                };
            }
            [first, second, ..] => {
                self.state = GestureState::Pinching {
                    distance: first.distance_to(second),
                };
            }
        }
    }

    pub fn touch_move(&mut self, touches: &[TouchPoint], vp: &mut Viewport) -> Gesture {
        match touches {
            [] => Gesture::None,
            [only] => match self.state {
                GestureState::Dragging { .. } => self.drag_to(*only, vp),
                GestureState::Pinching { .. } => {
                    // Second finger vanished without an end event; continue as a plain pan.
                    self.state = GestureState::Dragging {
                        last: *only,
                        origin: None,
                    };
                    Gesture::None
                }
                GestureState::Idle => Gesture::None,
            },
            [first, second, ..] => {
                let current = first.distance_to(second);
                let GestureState::Pinching { distance } = self.state else {
                    self.state = GestureState::Pinching { distance: current };
                    return Gesture::None;
                };
                // Incremental: compare against the previous frame only.
                self.state = GestureState::Pinching { distance: current };
                let delta = (distance - current) * PINCH_ZOOM_PER_PX;
                if delta == 0.0 {
                    return Gesture::None;
                }
                let mid = first.midpoint(second);
                vp.zoom_at(delta, mid.x, mid.y);
                Gesture::Zoom
            }
        }
    }

    /// `remaining` are the fingers still down, `released` the one that lifted.
    pub fn touch_end(
        &mut self,
        remaining: &[TouchPoint],
        released: TouchPoint,
        now_ms: f64,
    ) -> Gesture {
        match remaining {
            [] => {
                let state = std::mem::take(&mut self.state);
                let GestureState::Dragging {
                    origin: Some(origin),
                    ..
                } = state
                else {
                    return Gesture::None;
                };
                let duration = now_ms - origin.at_ms;
                let travel = released.distance_to(&origin.point);
                match classify_touch(duration, travel, QUICK_TAP_MAX_MS) {
                    TouchKind::Tap => Gesture::Tap(released),
                    TouchKind::Drag => Gesture::None,
                }
            }
            [only] => {
                // Pinch down to one finger: pan from here, no stale pinch baseline.
                self.state = GestureState::Dragging {
                    last: *only,
                    origin: None,
                };
                Gesture::None
            }
            [first, second, ..] => {
                self.state = GestureState::Pinching {
                    distance: first.distance_to(second),
                };
                Gesture::None
            }
        }
    }

    pub fn touch_cancel(&mut self) {
        self.state = GestureState::Idle;
    }

    fn drag_to(&mut self, point: TouchPoint, vp: &mut Viewport) -> Gesture {
        let GestureState::Dragging { last, origin } = self.state else {
            return Gesture::None;
        };
        let dx = (point.x - last.x) / vp.scale;
        let dy = (point.y - last.y) / vp.scale;
        self.state = GestureState::Dragging {
            last: point,
            origin,
        };
        if dx == 0.0 && dy == 0.0 {
            return Gesture::None;
        }
        vp.pan(dx, dy);
        Gesture::Pan
    }
}

/// Per-tile tap detection with the longer tile-level window.
#[derive(Debug, Default, Clone, Copy)]
pub struct TapTracker {
    start: Option<TouchOrigin>,
}

impl TapTracker {
    pub fn press(&mut self, point: TouchPoint, now_ms: f64) {
        self.start = Some(TouchOrigin {
            point,
            at_ms: now_ms,
        });
    }

    /// Returns true when the release completes a tap on the tile.
    pub fn release(&mut self, point: TouchPoint, now_ms: f64) -> bool {
        let Some(start) = self.start.take() else {
            return false;
        };
        classify_touch(
            now_ms - start.at_ms,
            point.distance_to(&start.point),
            TILE_TAP_MAX_MS,
        ) == TouchKind::Tap
    }
}
