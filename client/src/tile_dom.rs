use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, HtmlImageElement, MouseEvent, TouchEvent};

use kasland_shared::GridPos;

use crate::gesture::{TapTracker, TouchPoint};
use crate::iso;
use crate::tiles::{RarityBadge, TileSurface, TileVisual};

#[derive(Debug, thiserror::Error)]
#[error("DOM operation failed: {0}")]
pub struct DomError(String);

impl From<JsValue> for DomError {
    fn from(value: JsValue) -> Self {
        DomError(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

/// How a tile was activated by the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileActivation {
    /// Mouse click; the page point lets the caller reject clicks that end a drag.
    Click { pos: GridPos, page_x: f64, page_y: f64 },
    Tap { pos: GridPos },
}

pub type ActivationHandler = Rc<dyn Fn(TileActivation)>;

/// A live tile element plus the listeners that must be detached on eviction.
pub struct TileNode {
    element: HtmlElement,
    image: HtmlImageElement,
    rarity: Option<Element>,
    sale: Option<Element>,
    on_click: Closure<dyn Fn(MouseEvent)>,
    on_touch_start: Closure<dyn Fn(TouchEvent)>,
    on_touch_end: Closure<dyn Fn(TouchEvent)>,
}

/// Paints tiles as absolutely positioned elements inside the map layer.
pub struct DomTiles {
    document: Document,
    layer: HtmlElement,
    on_activate: ActivationHandler,
}

impl DomTiles {
    pub fn new(document: Document, layer: HtmlElement, on_activate: ActivationHandler) -> Self {
        Self {
            document,
            layer,
            on_activate,
        }
    }

    fn div(&self, class: &str) -> Result<Element, DomError> {
        let el = self.document.create_element("div")?;
        el.set_class_name(class);
        Ok(el)
    }

    fn sync_rarity(&self, node: &mut TileNode, badge: Option<&RarityBadge>) -> Result<(), DomError> {
        let Some(badge) = badge else {
            if let Some(el) = node.rarity.take() {
                el.remove();
            }
            return Ok(());
        };
        let class = format!("rarity-indicator {}", badge.class);
        if let Some(el) = &node.rarity {
            el.set_class_name(&class);
            el.set_text_content(Some(&badge.letter));
        } else {
            let el = self.div(&class)?;
            el.set_text_content(Some(&badge.letter));
            node.element.append_child(&el)?;
            node.rarity = Some(el);
        }
        Ok(())
    }

    fn sync_sale(&self, node: &mut TileNode, label: Option<&str>) -> Result<(), DomError> {
        let Some(label) = label else {
            if let Some(el) = node.sale.take() {
                el.remove();
            }
            return Ok(());
        };
        if let Some(el) = &node.sale {
            el.set_text_content(Some(label));
        } else {
            let el = self.div("sale-indicator")?;
            el.set_text_content(Some(label));
            node.element.append_child(&el)?;
            node.sale = Some(el);
        }
        Ok(())
    }

    fn apply(&self, node: &mut TileNode, visual: &TileVisual) -> Result<(), DomError> {
        node.element.set_class_name(&visual.class_list());
        let src = visual.sprite.src();
        if node.image.get_attribute("src").as_deref() != Some(src.as_str()) {
            node.image.set_src(&src);
        }
        self.sync_rarity(node, visual.rarity.as_ref())?;
        self.sync_sale(node, visual.sale_label())
    }
}

fn first_touch(list: &web_sys::TouchList) -> Option<TouchPoint> {
    let touch = list.get(0)?;
    Some(TouchPoint::new(
        f64::from(touch.client_x()),
        f64::from(touch.client_y()),
    ))
}

impl TileSurface for DomTiles {
    type Node = TileNode;
    type Error = DomError;

    fn create(&mut self, pos: GridPos, visual: &TileVisual) -> Result<TileNode, DomError> {
        let element: HtmlElement = self.div(&visual.class_name)?.unchecked_into();
        let image: HtmlImageElement = self.document.create_element("img")?.unchecked_into();
        image.set_class_name("tile-image");
        image.set_draggable(false);
        element.append_child(&image)?;

        let (left, top) = iso::tile_origin(pos);
        let style = element.style();
        style.set_property("left", &format!("{left}px"))?;
        style.set_property("top", &format!("{top}px"))?;
        let dataset = element.dataset();
        dataset.set("x", &pos.x.to_string())?;
        dataset.set("y", &pos.y.to_string())?;

        let handler = self.on_activate.clone();
        let on_click = Closure::<dyn Fn(MouseEvent)>::new(move |e: MouseEvent| {
            e.stop_propagation();
            handler(TileActivation::Click {
                pos,
                page_x: f64::from(e.client_x()),
                page_y: f64::from(e.client_y()),
            });
        });

        let tracker = Rc::new(Cell::new(TapTracker::default()));
        let start_tracker = tracker.clone();
        let on_touch_start = Closure::<dyn Fn(TouchEvent)>::new(move |e: TouchEvent| {
            if let Some(point) = first_touch(&e.touches()) {
                let mut t = start_tracker.get();
                t.press(point, js_sys::Date::now());
                start_tracker.set(t);
            }
        });

        let handler = self.on_activate.clone();
        let on_touch_end = Closure::<dyn Fn(TouchEvent)>::new(move |e: TouchEvent| {
            let Some(point) = first_touch(&e.changed_touches()) else {
                return;
            };
            let mut t = tracker.get();
            let tapped = t.release(point, js_sys::Date::now());
            tracker.set(t);
            if tapped {
                // Suppress the synthetic click that would follow.
                e.prevent_default();
                handler(TileActivation::Tap { pos });
            }
        });

        element.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        element.add_event_listener_with_callback(
            "touchstart",
            on_touch_start.as_ref().unchecked_ref(),
        )?;
        element
            .add_event_listener_with_callback("touchend", on_touch_end.as_ref().unchecked_ref())?;

        let mut node = TileNode {
            element,
            image,
            rarity: None,
            sale: None,
            on_click,
            on_touch_start,
            on_touch_end,
        };
        self.apply(&mut node, visual)?;
        self.layer.append_child(&node.element)?;
        Ok(node)
    }

    fn update(&mut self, node: &mut TileNode, visual: &TileVisual) -> Result<(), DomError> {
        self.apply(node, visual)
    }

    fn remove(&mut self, node: TileNode) {
        let el = &node.element;
        el.remove_event_listener_with_callback("click", node.on_click.as_ref().unchecked_ref())
            .ok();
        el.remove_event_listener_with_callback(
            "touchstart",
            node.on_touch_start.as_ref().unchecked_ref(),
        )
        .ok();
        el.remove_event_listener_with_callback(
            "touchend",
            node.on_touch_end.as_ref().unchecked_ref(),
        )
        .ok();
        el.remove();
    }
}
