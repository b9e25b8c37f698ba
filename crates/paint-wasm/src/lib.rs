//! WASM bridge for the painter: mounts a flat-colored WebGL2 canvas into a
//! host element and exposes the color/dispose lifecycle to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The host awaits the module,
//! constructs `new Painter(element)`, and must call `dispose()` (or `free()`)
//! when the element is torn down.

mod dom;
mod gl;
#[cfg(target_arch = "wasm32")]
mod logger;

use dom::{DomContainer, PainterSlot};
use paint_core::{Color, PaintError, PainterConfig};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

/// The JS-facing painter handle.
///
/// Owns the slot the DOM listeners dispatch into. `free()` drops the slot,
/// which disposes the painter if the host did not.
#[wasm_bindgen]
pub struct Painter {
    slot: PainterSlot,
}

#[wasm_bindgen]
impl Painter {
    /// Mount a painter into `target` with the default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(target: &HtmlElement) -> Result<Painter, JsValue> {
        Self::create(target, &PainterConfig::default())
    }

    /// Mount a painter configured from a JSON object, e.g.
    /// `{"initialColor":{"r":255,"g":0,"b":0},"context":{"antialias":false}}`.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(target: &HtmlElement, config: &str) -> Result<Painter, JsValue> {
        let config = PainterConfig::from_json(config).map_err(to_js)?;
        Self::create(target, &config)
    }

    /// Change the fill color. `rgba` is `[r, g, b]` or `[r, g, b, a]` with
    /// RGB in `0..=255` and alpha in `0..=1`. Other lengths are ignored.
    ///
    /// Throws after `dispose()`.
    #[wasm_bindgen(js_name = changeColor)]
    pub fn change_color(&self, rgba: &[f32]) -> Result<(), JsValue> {
        self.apply_color(rgba).map_err(to_js)
    }

    /// Release every GPU resource and listener. Safe to call repeatedly.
    pub fn dispose(&self) {
        let painter = match self.slot.try_borrow_mut() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                log::warn!("dispose called during a painter call, ignored");
                return;
            }
        };
        if let Some(mut painter) = painter {
            painter.dispose();
        }
    }

    #[wasm_bindgen(getter, js_name = isDisposed)]
    pub fn is_disposed(&self) -> bool {
        self.slot.try_borrow().is_ok_and(|slot| slot.is_none())
    }
}

// ─── Private helpers ─────────────────────────────────────────────────────

impl Painter {
    fn create(target: &HtmlElement, config: &PainterConfig) -> Result<Painter, JsValue> {
        setup_console();

        let slot: PainterSlot = Rc::new(RefCell::new(None));
        let container = DomContainer::new(target.clone(), &slot);
        let painter = paint_core::Painter::initialize(&container, config).map_err(to_js)?;
        *slot.borrow_mut() = Some(painter);

        log::info!("Initialized Painter");
        Ok(Self { slot })
    }

    /// The disposed check runs before the input is inspected.
    fn apply_color(&self, rgba: &[f32]) -> Result<(), PaintError> {
        let mut slot = self.slot.try_borrow_mut().map_err(|_| PaintError::Busy)?;
        let painter = slot.as_mut().ok_or(PaintError::UseAfterDispose)?;
        let Some(color) = Color::from_slice(rgba) else {
            log::warn!("changeColor: expected 3 or 4 components, got {}", rgba.len());
            return Ok(());
        };
        painter.change_color(color)
    }
}

fn to_js(error: PaintError) -> JsValue {
    JsValue::from_str(&error_message(&error))
}

fn error_message(error: &PaintError) -> String {
    if error.is_construction_error() {
        format!("Painter initialization failed: {error}")
    } else {
        error.to_string()
    }
}

// ─── Console logging and panic hook ──────────────────────────────────────

fn setup_console() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SETUP: Once = Once::new();
        SETUP.call_once(|| {
            let level = if cfg!(debug_assertions) {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            };
            logger::install(level);
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Painter WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paint_core::ShaderStage;
    use pretty_assertions::assert_eq;

    #[test]
    fn construction_errors_are_prefixed() {
        let msg = error_message(&PaintError::ShaderLink {
            log: "varying mismatch".to_string(),
        });
        assert_eq!(
            msg,
            "Painter initialization failed: Unable to link shader program:\nvarying mismatch"
        );

        let msg = error_message(&PaintError::ShaderCompile {
            stage: ShaderStage::Vertex,
            log: "bad".to_string(),
        });
        assert!(msg.contains("vertex shader"));
    }

    fn disposed() -> Painter {
        Painter {
            slot: Rc::new(RefCell::new(None)),
        }
    }

    #[test]
    fn disposed_painter_rejects_every_color_shape() {
        let painter = disposed();
        let shapes: [&[f32]; 4] = [&[1.0, 2.0], &[0.0, 255.0, 0.0], &[0.0, 255.0, 0.0, 1.0], &[]];
        for rgba in shapes {
            assert_eq!(painter.apply_color(rgba), Err(PaintError::UseAfterDispose));
        }
    }

    #[test]
    fn is_disposed_does_not_panic_while_slot_is_borrowed() {
        let painter = disposed();
        assert!(painter.is_disposed());

        let _guard = painter.slot.borrow_mut();
        assert!(!painter.is_disposed());
        assert_eq!(painter.apply_color(&[0.0, 0.0, 0.0]), Err(PaintError::Busy));
    }

    #[test]
    fn use_after_dispose_is_reported_plainly() {
        assert_eq!(
            error_message(&PaintError::UseAfterDispose),
            "Painter used after dispose"
        );
    }
}
