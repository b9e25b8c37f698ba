//! DOM host: a `<canvas>` appended to the host element, with its listeners.
//!
//! Listener closures hold a `Weak` handle to the painter slot, never a strong
//! one, so a disposed or freed painter is simply not found on dispatch.

use crate::gl::WebGl;
use paint_core::{
    Container, ContextOptions, EventKind, PaintError, Painter, Surface, SurfaceEvent,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent, WebGl2RenderingContext,
};

/// Where the live painter is kept. Empty before initialization completes
/// and after dispose.
pub type PainterSlot = Rc<RefCell<Option<Painter<CanvasSurface>>>>;
type WeakSlot = Weak<RefCell<Option<Painter<CanvasSurface>>>>;

// ─── Container ───────────────────────────────────────────────────────────

/// Inline style for the canvas. A block-level canvas filling its container
/// leaves no line-box gap below it, so sizing the canvas from the container
/// rect does not grow the container on each resize.
const CANVAS_STYLE: [(&str, &str); 3] = [
    ("display", "block"),
    ("width", "100%"),
    ("height", "100%"),
];

pub struct DomContainer {
    element: HtmlElement,
    slot: WeakSlot,
}

impl DomContainer {
    pub fn new(element: HtmlElement, slot: &PainterSlot) -> Self {
        Self {
            element,
            slot: Rc::downgrade(slot),
        }
    }
}

impl Container for DomContainer {
    type Surface = CanvasSurface;

    fn create_surface(&self) -> Result<CanvasSurface, PaintError> {
        let unavailable = |msg: &str| PaintError::ContextUnavailable(msg.to_string());

        let document = web_sys::window()
            .ok_or_else(|| unavailable("Could not get window"))?
            .document()
            .ok_or_else(|| unavailable("Could not get document"))?;
        let canvas = document
            .create_element("canvas")
            .map_err(|_| unavailable("Could not create canvas element"))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| unavailable("Created element is not a canvas"))?;
        let style = canvas.style();
        for (property, value) in CANVAS_STYLE {
            style
                .set_property(property, value)
                .map_err(|_| unavailable("Could not style canvas"))?;
        }
        self.element
            .append_child(&canvas)
            .map_err(|_| unavailable("Could not append canvas"))?;

        Ok(CanvasSurface {
            canvas,
            container: self.element.clone(),
            slot: self.slot.clone(),
        })
    }
}

// ─── Surface ─────────────────────────────────────────────────────────────

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    container: HtmlElement,
    slot: WeakSlot,
}

/// A registered DOM listener. Dropping it drops the closure.
pub struct DomSubscription {
    target: EventTarget,
    name: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Surface for CanvasSurface {
    type Gl = WebGl;
    type Subscription = DomSubscription;

    fn acquire_context(&mut self, options: &ContextOptions) -> Option<WebGl> {
        let attributes = match context_attributes(options) {
            Ok(attributes) => attributes,
            Err(e) => {
                log::warn!("context attributes ignored: {e:?}");
                JsValue::UNDEFINED
            }
        };
        let context = self
            .canvas
            .get_context_with_context_options("webgl2", &attributes)
            .ok()
            .flatten()?;
        context
            .dyn_into::<WebGl2RenderingContext>()
            .ok()
            .map(WebGl::new)
    }

    fn bounding_rect(&self) -> (f64, f64) {
        let rect = self.container.get_bounding_client_rect();
        (rect.width(), rect.height())
    }

    fn pixel_size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn set_pixel_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn subscribe(&mut self, kind: EventKind) -> Result<DomSubscription, PaintError> {
        let name = kind.dom_name();
        let failed = || PaintError::EventSubscription(name.to_string());

        let target: EventTarget = match kind {
            EventKind::Resize => web_sys::window().ok_or_else(failed)?.into(),
            _ => self.canvas.clone().into(),
        };

        let slot = self.slot.clone();
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Some(event) = translate(kind, &event) {
                dispatch(&slot, event);
            }
        });
        target
            .add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())
            .map_err(|_| failed())?;

        Ok(DomSubscription {
            target,
            name,
            callback,
        })
    }

    fn unsubscribe(&mut self, subscription: DomSubscription) {
        let removed = subscription.target.remove_event_listener_with_callback(
            subscription.name,
            subscription.callback.as_ref().unchecked_ref(),
        );
        if removed.is_err() {
            log::warn!("Error removing {} listener", subscription.name);
        }
    }

    fn detach(&mut self) {
        self.canvas.remove();
    }
}

// ─── Event plumbing ──────────────────────────────────────────────────────

fn context_attributes(options: &ContextOptions) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(options).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&json)
}

fn translate(kind: EventKind, event: &Event) -> Option<SurfaceEvent> {
    if kind == EventKind::Resize {
        return Some(SurfaceEvent::Resize);
    }
    let mouse = event.dyn_ref::<MouseEvent>()?;
    let (x, y) = (mouse.offset_x() as f32, mouse.offset_y() as f32);
    match kind {
        EventKind::PointerDown => Some(SurfaceEvent::PointerDown { x, y }),
        EventKind::PointerMove => Some(SurfaceEvent::PointerMove { x, y }),
        EventKind::PointerUp => Some(SurfaceEvent::PointerUp { x, y }),
        EventKind::Resize => None,
    }
}

fn dispatch(slot: &WeakSlot, event: SurfaceEvent) {
    let Some(slot) = slot.upgrade() else {
        return;
    };
    // Events fired from inside a painter call (e.g. a synchronous resize
    // during initialization) are dropped instead of panicking on the borrow.
    let Ok(mut guard) = slot.try_borrow_mut() else {
        log::warn!("{:?} arrived during a painter call, skipped", event.kind());
        return;
    };
    let Some(painter) = guard.as_mut() else {
        return;
    };
    if let Err(e) = painter.handle_event(event) {
        log::warn!("{:?} not handled: {e}", event.kind());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_is_a_block_filling_its_container() {
        let style: std::collections::HashMap<_, _> = CANVAS_STYLE.into_iter().collect();
        assert_eq!(style["display"], "block");
        assert_eq!(style["width"], "100%");
        assert_eq!(style["height"], "100%");
    }
}
