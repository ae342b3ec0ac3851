use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, MouseEvent, TouchEvent, TouchList, WheelEvent};

use kasland_shared::GridPos;

use crate::app::{FitRequest, SelectedParcel, WalletAccount};
use crate::border;
use crate::config::{self, Settings};
use crate::gesture::{Gesture, GestureDispatcher, GestureState, TouchPoint};
use crate::iso::ContainerRect;
use crate::render_loop::FrameScheduler;
use crate::store::LocalStore;
use crate::tile_dom::{ActivationHandler, DomTiles, TileActivation};
use crate::tiles::RenderCache;
use crate::viewport::Viewport;

/// How long a tapped tile keeps its highlight class.
const TOUCH_FLASH_MS: u32 = 300;

const MAP_CSS: &str = r#"
#map .tile { position: absolute; width: 100px; height: 50px; cursor: pointer; user-select: none; }
#map .tile-image { position: absolute; left: 0; bottom: 0; width: 100%; pointer-events: none; }
#map .tile.user-owned .tile-image { filter: drop-shadow(0 0 6px #f5c542); }
#map .tile.tile-touched .tile-image { filter: brightness(1.3); }
#map .rarity-indicator { position: absolute; top: -18px; right: 18px; width: 14px; height: 14px; border-radius: 50%; font: 700 9px/14px 'JetBrains Mono', monospace; text-align: center; color: #0c0e17; background: #9a9590; }
#map .rarity-indicator.rare { background: #4fa3f7; }
#map .rarity-indicator.epic { background: #b36bf5; }
#map .rarity-indicator.legendary { background: #f5c542; }
#map .sale-indicator { position: absolute; left: 50%; top: -10px; transform: translateX(-50%); padding: 1px 4px; border-radius: 3px; font: 700 8px 'JetBrains Mono', monospace; color: #fff; background: rgba(220, 60, 60, 0.85); white-space: nowrap; }
#map .tree { position: absolute; width: 100px; height: 50px; pointer-events: none; }
#map .tree img { position: absolute; left: 0; bottom: 0; width: 100%; transform-origin: 50% 100%; }
#map-container.hide-border .tree { display: none; }
"#;

thread_local! {
    static TILE_CACHE: RefCell<Option<RenderCache<DomTiles>>> = const { RefCell::new(None) };
}

/// Drop every tile node along with the cache that owns them.
fn release_tiles() {
    TILE_CACHE.with(|slot| {
        if let Some(mut cache) = slot.borrow_mut().take() {
            cache.clear();
        }
    });
}

fn drag_cursor(dragging: bool) -> &'static str {
    if dragging { "grabbing" } else { "grab" }
}

fn set_cursor(container: &HtmlElement, dragging: bool) {
    HtmlElement::style(container)
        .set_property("cursor", drag_cursor(dragging))
        .ok();
}

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn touch_points(list: &TouchList) -> Vec<TouchPoint> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|t| TouchPoint::new(t.client_x() as f64, t.client_y() as f64))
        .collect()
}

/// Grid cell of the tile element under a client-space point, if any.
fn tile_at_point(x: f64, y: f64) -> Option<(HtmlElement, GridPos)> {
    let hit = document()?.element_from_point(x as f32, y as f32)?;
    let tile: HtmlElement = hit.closest(".tile").ok()??.dyn_into().ok()?;
    let dataset = tile.dataset();
    let gx = dataset.get("x")?.parse().ok()?;
    let gy = dataset.get("y")?.parse().ok()?;
    Some((tile, GridPos::new(gx, gy)))
}

fn flash_touched(tile: HtmlElement) {
    if tile.class_list().add_1("tile-touched").is_err() {
        return;
    }
    Timeout::new(TOUCH_FLASH_MS, move || {
        let _ = tile.class_list().remove_1("tile-touched");
    })
    .forget();
}

fn select(selected: RwSignal<Option<GridPos>>, pos: GridPos) {
    if selected.get_untracked() != Some(pos) {
        selected.set(Some(pos));
    }
}

/// Isometric tile map: a clipping container with one transformed layer that
/// holds every tile element.
#[component]
pub fn MapView() -> impl IntoView {
    let store: RwSignal<LocalStore> = expect_context();
    let viewport: RwSignal<Viewport> = expect_context();
    let settings: RwSignal<Settings> = expect_context();
    let WalletAccount(account) = expect_context();
    let SelectedParcel(selected) = expect_context();
    let FitRequest(fit_request) = expect_context();

    let container_ref = NodeRef::<leptos::html::Div>::new();
    let layer_ref = NodeRef::<leptos::html::Div>::new();

    let dispatcher = Rc::new(RefCell::new(GestureDispatcher::new()));
    let border_placed = Rc::new(Cell::new(false));

    let generation = Memo::new(move |_| store.with(|s| s.generation()));
    let map_size = Memo::new(move |_| store.with(|s| s.map_size()));

    // Layer transform is written at most once per frame.
    let scheduler = Rc::new(FrameScheduler::new(move || {
        let Some(layer) = layer_ref.get_untracked() else {
            return;
        };
        let transform = viewport.with_untracked(|vp| vp.layer_transform());
        HtmlElement::style(&layer)
            .set_property("transform", &transform.css())
            .ok();
    }));

    Effect::new({
        let scheduler = scheduler.clone();
        move || {
            viewport.track();
            scheduler.request();
        }
    });

    // Fit once data arrives, and again whenever the map or container changes size.
    Effect::new(move || {
        let n = map_size.get();
        fit_request.track();
        let Some(container) = container_ref.get() else {
            return;
        };
        if n == 0 {
            return;
        }
        let rect = ContainerRect::from_dom(&container.get_bounding_client_rect());
        if rect.is_empty() {
            return;
        }
        let needs_fit = viewport.with_untracked(|vp| vp.needs_fit(&rect, n));
        if needs_fit {
            log::debug!(
                "fitting {n}x{n} map into {:.0}x{:.0} container",
                rect.width,
                rect.height
            );
            viewport.update(|vp| vp.fit_to_container(rect, n));
        } else {
            viewport.update_untracked(|vp| vp.set_container_origin(&rect));
        }
    });

    let on_activate: ActivationHandler = {
        let dispatcher = dispatcher.clone();
        Rc::new(move |activation| match activation {
            TileActivation::Click {
                pos,
                page_x,
                page_y,
            } => {
                if dispatcher.borrow().click_allowed(page_x, page_y) {
                    select(selected, pos);
                }
            }
            TileActivation::Tap { pos } => select(selected, pos),
        })
    };

    // Reconcile tiles against the store; ownership highlight follows the wallet.
    Effect::new(move || {
        generation.track();
        let account = account.get();
        let Some(layer) = layer_ref.get() else {
            return;
        };
        TILE_CACHE.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.is_none() {
                let Some(document) = document() else {
                    return;
                };
                let layer: HtmlElement = layer.into();
                *slot = Some(RenderCache::new(DomTiles::new(
                    document,
                    layer,
                    on_activate.clone(),
                )));
            }
            let Some(tiles) = slot.as_mut() else {
                return;
            };
            store.with_untracked(|s| {
                if !s.has_data() {
                    return;
                }
                let report = tiles.reconcile(
                    s.snapshot().parcels.values(),
                    s.map_size(),
                    account.as_deref(),
                );
                log::debug!(
                    "reconciled {} tiles: {} new, {} changed, {} evicted, {} dropped, {} failed",
                    tiles.len(),
                    report.created,
                    report.updated,
                    report.evicted,
                    report.dropped,
                    report.failed
                );
            });
        });
    });
    on_cleanup(release_tiles);

    // Border trees are planned once per session, the first time they are wanted.
    Effect::new({
        let border_placed = border_placed.clone();
        move || {
            let enabled = settings.with(|s| s.show_border);
            let n = map_size.get();
            if !enabled || n == 0 || border_placed.get() {
                return;
            }
            let (Some(layer), Some(document)) = (layer_ref.get(), document()) else {
                return;
            };
            let seed = (js_sys::Date::now() as u64) ^ (js_sys::Math::random() * 1e15) as u64;
            let mut rng = SmallRng::seed_from_u64(seed);
            let mobile = config::is_mobile_width(config::window_width());
            let trees = border::plan_border(n, mobile, &mut rng);
            match border::place_border(&document, &layer, &trees) {
                Ok(count) => log::info!("placed {count} border trees"),
                Err(e) => log::warn!("border placement stopped early: {e}"),
            }
            border_placed.set(true);
        }
    });

    let on_wheel = {
        let dispatcher = dispatcher.clone();
        move |e: WheelEvent| {
            e.prevent_default();
            let (x, y) = (e.client_x() as f64, e.client_y() as f64);
            viewport.maybe_update(|vp| {
                dispatcher.borrow_mut().wheel(e.delta_y(), x, y, vp) != Gesture::None
            });
        }
    };

    let on_mouse_down = {
        let dispatcher = dispatcher.clone();
        move |e: MouseEvent| {
            if e.button() != 0 {
                return;
            }
            dispatcher
                .borrow_mut()
                .mouse_down(e.client_x() as f64, e.client_y() as f64);
            if let Some(container) = container_ref.get_untracked() {
                set_cursor(&container, true);
            }
        }
    };

    let on_mouse_move = {
        let dispatcher = dispatcher.clone();
        move |e: MouseEvent| {
            if !matches!(dispatcher.borrow().state(), GestureState::Dragging { .. }) {
                return;
            }
            let (x, y) = (e.client_x() as f64, e.client_y() as f64);
            viewport
                .maybe_update(|vp| dispatcher.borrow_mut().mouse_move(x, y, vp) == Gesture::Pan);
        }
    };

    let on_mouse_up = {
        let dispatcher = dispatcher.clone();
        move |_: MouseEvent| {
            dispatcher.borrow_mut().mouse_up();
            if let Some(container) = container_ref.get_untracked() {
                set_cursor(&container, false);
            }
        }
    };

    // Clicks between tiles still resolve through the coordinate transform.
    let on_click = {
        let dispatcher = dispatcher.clone();
        move |e: MouseEvent| {
            let (x, y) = (e.client_x() as f64, e.client_y() as f64);
            if !dispatcher.borrow().click_allowed(x, y) {
                return;
            }
            let pos = viewport.with_untracked(|vp| vp.page_to_grid(x, y));
            if store.with_untracked(|s| s.parcel(pos).is_some()) {
                select(selected, pos);
            } else if selected.get_untracked().is_some() {
                selected.set(None);
            }
        }
    };

    let on_touch_start = {
        let dispatcher = dispatcher.clone();
        move |e: TouchEvent| {
            let touches = touch_points(&e.touches());
            if touches.len() == 1 {
                e.prevent_default();
            }
            if let Some(container) = container_ref.get_untracked() {
                let rect = ContainerRect::from_dom(&container.get_bounding_client_rect());
                viewport.update_untracked(|vp| vp.set_container_origin(&rect));
            }
            dispatcher
                .borrow_mut()
                .touch_start(&touches, js_sys::Date::now());
        }
    };

    let on_touch_move = {
        let dispatcher = dispatcher.clone();
        move |e: TouchEvent| {
            e.prevent_default();
            let touches = touch_points(&e.touches());
            viewport.maybe_update(|vp| {
                dispatcher.borrow_mut().touch_move(&touches, vp) != Gesture::None
            });
        }
    };

    let on_touch_end = {
        let dispatcher = dispatcher.clone();
        move |e: TouchEvent| {
            e.prevent_default();
            let remaining = touch_points(&e.touches());
            let Some(released) = touch_points(&e.changed_touches()).first().copied() else {
                return;
            };
            let gesture =
                dispatcher
                    .borrow_mut()
                    .touch_end(&remaining, released, js_sys::Date::now());
            let Gesture::Tap(point) = gesture else {
                return;
            };
            match tile_at_point(point.x, point.y) {
                Some((tile, pos)) => {
                    flash_touched(tile);
                    select(selected, pos);
                }
                None => {
                    let pos = viewport.with_untracked(|vp| vp.page_to_grid(point.x, point.y));
                    if store.with_untracked(|s| s.parcel(pos).is_some()) {
                        select(selected, pos);
                    }
                }
            }
        }
    };

    let on_touch_cancel = {
        let dispatcher = dispatcher.clone();
        move |_: TouchEvent| dispatcher.borrow_mut().touch_cancel()
    };

    view! {
        <style>{MAP_CSS}</style>
        <div
            id="map-container"
            node_ref=container_ref
            class:hide-border=move || !settings.with(|s| s.show_border)
            style="position: relative; width: 100%; height: 100%; overflow: hidden; touch-action: none; cursor: grab;"
            on:wheel=on_wheel
            on:mousedown=on_mouse_down
            on:mousemove=on_mouse_move
            on:mouseup=on_mouse_up.clone()
            on:mouseleave=on_mouse_up
            on:click=on_click
            on:touchstart=on_touch_start
            on:touchmove=on_touch_move
            on:touchend=on_touch_end
            on:touchcancel=on_touch_cancel
        >
            <div
                id="map"
                node_ref=layer_ref
                style="position: absolute; left: 0; top: 0; transform-origin: 0 0; transition: transform 0.2s ease-out; will-change: transform;"
            />
        </div>
    }
}
