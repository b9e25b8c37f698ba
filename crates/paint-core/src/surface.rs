//! The drawing surface, its host element, and the canvas host that owns both
//! the surface and its rendering context.

use crate::backend::GlBackend;
use crate::config::ContextOptions;
use crate::error::PaintError;
use crate::events::EventKind;

/// The pixel rectangle clip space maps onto.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

// ─── Host traits ─────────────────────────────────────────────────────────

/// A drawing surface mounted inside a container (a `<canvas>` in the browser).
///
/// Implemented differently by each host environment:
/// - WASM: an `HtmlCanvasElement` appended to the host element
/// - tests: `headless::HeadlessSurface`
pub trait Surface {
    type Gl: GlBackend;
    type Subscription;

    /// Request a WebGL2-capable context. `None` when the host cannot provide one.
    fn acquire_context(&mut self, options: &ContextOptions) -> Option<Self::Gl>;

    /// The container's current on-screen size in CSS pixels.
    fn bounding_rect(&self) -> (f64, f64);

    fn pixel_size(&self) -> (u32, u32);
    fn set_pixel_size(&mut self, width: u32, height: u32);

    fn subscribe(&mut self, kind: EventKind) -> Result<Self::Subscription, PaintError>;
    fn unsubscribe(&mut self, subscription: Self::Subscription);

    /// Remove the surface from its container.
    fn detach(&mut self);
}

/// The host element a surface is created in.
pub trait Container {
    type Surface: Surface;

    fn create_surface(&self) -> Result<Self::Surface, PaintError>;
}

// ─── Canvas host ─────────────────────────────────────────────────────────

/// Owns the surface and its rendering context.
///
/// No GPU call can precede context acquisition: the context only exists
/// inside a `CanvasHost`.
pub struct CanvasHost<S: Surface> {
    surface: S,
    gl: S::Gl,
    viewport: Viewport,
}

impl<S: Surface> CanvasHost<S> {
    /// Create a surface in `container` and acquire its context.
    ///
    /// # Errors
    /// `PaintError::ContextUnavailable` if the surface cannot be created or
    /// has no WebGL2 context. A surface created before the failure is
    /// detached again.
    pub fn create<C>(container: &C, options: &ContextOptions) -> Result<Self, PaintError>
    where
        C: Container<Surface = S>,
    {
        let mut surface = container.create_surface()?;
        let Some(gl) = surface.acquire_context(options) else {
            surface.detach();
            return Err(PaintError::ContextUnavailable(
                "WebGL2 not supported".to_string(),
            ));
        };
        log::debug!("rendering context acquired");
        Ok(Self {
            surface,
            gl,
            viewport: Viewport::default(),
        })
    }

    /// Set the surface's pixel size and map the viewport onto it.
    pub fn resize(&mut self, width: u32, height: u32) -> Viewport {
        if self.surface.pixel_size() != (width, height) {
            self.surface.set_pixel_size(width, height);
        }
        let viewport = Viewport {
            x: 0,
            y: 0,
            width: i32::try_from(width).unwrap_or(i32::MAX),
            height: i32::try_from(height).unwrap_or(i32::MAX),
        };
        self.gl
            .viewport(viewport.x, viewport.y, viewport.width, viewport.height);
        self.viewport = viewport;
        log::trace!("resize: w:{width}, h:{height}");
        viewport
    }

    /// Resize to the container's bounding rectangle, truncating fractional
    /// pixels.
    pub fn fit_to_container(&mut self) -> Viewport {
        let (width, height) = self.surface.bounding_rect();
        // `as` saturates: negative and NaN become 0.
        self.resize(width as u32, height as u32)
    }

    pub fn size(&self) -> (u32, u32) {
        self.surface.pixel_size()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn gl_mut(&mut self) -> &mut S::Gl {
        &mut self.gl
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Release the context and detach the surface.
    pub fn release(&mut self) {
        self.gl.lose_context();
        self.surface.detach();
        log::debug!("rendering context released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{Faults, GlCall, HeadlessContainer};
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_context_detaches_surface() {
        let container = HeadlessContainer::with_faults(
            400.0,
            300.0,
            Faults {
                no_context: true,
                ..Faults::default()
            },
        );
        let result = CanvasHost::create(&container, &ContextOptions::default());

        assert!(matches!(result, Err(PaintError::ContextUnavailable(_))));
        let ledger = container.ledger();
        assert_eq!(ledger.borrow().live_handles(), 0);
        assert_eq!(ledger.borrow().attached_surfaces(), 0);
    }

    #[test]
    fn resize_updates_surface_and_viewport() {
        let container = HeadlessContainer::new(400.0, 300.0);
        let mut host = CanvasHost::create(&container, &ContextOptions::default()).unwrap();

        let viewport = host.resize(800, 600);
        assert_eq!(host.size(), (800, 600));
        assert_eq!(
            viewport,
            Viewport {
                x: 0,
                y: 0,
                width: 800,
                height: 600
            }
        );
        assert_eq!(
            container.ledger().borrow().calls().last(),
            Some(&GlCall::Viewport(0, 0, 800, 600))
        );
    }

    #[test]
    fn fit_truncates_fractional_rect() {
        let container = HeadlessContainer::new(399.7, 300.2);
        let mut host = CanvasHost::create(&container, &ContextOptions::default()).unwrap();
        host.fit_to_container();
        assert_eq!(host.size(), (399, 300));
        assert_eq!(host.viewport().width, 399);
    }

    #[test]
    fn release_loses_context_and_detaches() {
        let container = HeadlessContainer::new(400.0, 300.0);
        let mut host = CanvasHost::create(&container, &ContextOptions::default()).unwrap();
        assert_eq!(container.ledger().borrow().attached_surfaces(), 1);

        host.release();
        let ledger = container.ledger();
        assert_eq!(ledger.borrow().live_handles(), 0);
        assert_eq!(ledger.borrow().attached_surfaces(), 0);
    }
}
