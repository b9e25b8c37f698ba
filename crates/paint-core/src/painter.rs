//! The painter: sole owner of every GPU resource behind one surface.
//!
//! Lifecycle is `initialize` → (`render` | `change_color` | `handle_event`)*
//! → `dispose`. After `dispose` every mutating method returns
//! [`PaintError::UseAfterDispose`] and no GPU call is issued.

use crate::backend::GlBackend;
use crate::brush::Brush;
use crate::buffer::{FULL_SURFACE_QUAD, RenderBuffer};
use crate::color::{Color, ColorUniform};
use crate::config::PainterConfig;
use crate::error::PaintError;
use crate::events::{EventBridge, PointerState, Route, SurfaceEvent};
use crate::shader::{COLOR_UNIFORM, ShaderProgram, ShaderProgramBuilder};
use crate::surface::{CanvasHost, Container, Surface, Viewport};

type Location<S> = <<S as Surface>::Gl as GlBackend>::UniformLocation;

pub struct Painter<S: Surface> {
    host: CanvasHost<S>,
    program: ShaderProgram<S::Gl>,
    buffer: RenderBuffer<S::Gl>,
    color: ColorUniform<Location<S>>,
    bridge: EventBridge<S::Subscription>,
    brush: Brush,
    clear_color: [f32; 4],
    frames_rendered: u64,
    disposed: bool,
}

impl<S: Surface> Painter<S> {
    /// Bring a painter up inside `container`.
    ///
    /// Steps run in a fixed order: context, shaders, geometry, viewport,
    /// listeners, first render. A failing step releases everything the
    /// earlier steps allocated before the error is returned.
    ///
    /// # Errors
    /// `ContextUnavailable`, `ShaderCompile`, `ShaderLink`, or
    /// `EventSubscription`.
    pub fn initialize<C>(container: &C, config: &PainterConfig) -> Result<Self, PaintError>
    where
        C: Container<Surface = S>,
    {
        let mut host = CanvasHost::create(container, &config.context)?;
        host.gl_mut().enable_blending();

        let program = match ShaderProgramBuilder::new(host.gl_mut()).build_default() {
            Ok(program) => program,
            Err(e) => {
                host.release();
                return Err(e);
            }
        };

        let buffer = match RenderBuffer::upload(host.gl_mut(), &FULL_SURFACE_QUAD, 2) {
            Ok(buffer) => buffer,
            Err(e) => {
                program.release(host.gl_mut());
                host.release();
                return Err(e);
            }
        };

        host.fit_to_container();

        let bridge = match EventBridge::attach(host.surface_mut()) {
            Ok(bridge) => bridge,
            Err(e) => {
                buffer.release(host.gl_mut());
                program.release(host.gl_mut());
                host.release();
                return Err(e);
            }
        };

        let location = program.uniform(COLOR_UNIFORM).cloned();
        let color = ColorUniform::new(location, config.initial_color);

        let mut painter = Self {
            host,
            program,
            buffer,
            color,
            bridge,
            brush: Brush::new(),
            clear_color: config.clear_color,
            frames_rendered: 0,
            disposed: false,
        };
        painter.render()?;
        log::debug!("painter initialized at {:?}", painter.host.size());
        Ok(painter)
    }

    /// Clear, bind, upload the color, and issue one draw call.
    ///
    /// GPU errors reported after the draw are logged and the frame dropped;
    /// they never surface to the caller.
    pub fn render(&mut self) -> Result<(), PaintError> {
        self.ensure_live()?;

        let gl = self.host.gl_mut();
        gl.clear(self.clear_color);
        self.program.bind(gl);
        self.buffer
            .bind_attribute(gl, self.program.position_attribute());
        self.color.upload(gl);
        self.buffer.draw(gl);

        while let Some(code) = gl.take_error() {
            log::warn!("render: GPU error 0x{code:04X}");
        }
        self.frames_rendered += 1;
        log::trace!("frame {} rendered", self.frames_rendered);
        Ok(())
    }

    /// Store `color` in the uniform and re-render. Invalid channel values
    /// are clamped.
    pub fn change_color(&mut self, color: Color) -> Result<(), PaintError> {
        self.ensure_live()?;
        self.color.set_color(color);
        self.render()
    }

    /// Route a host notification: resize re-fits and redraws, pointer
    /// events are only recorded.
    pub fn handle_event(&mut self, event: SurfaceEvent) -> Result<(), PaintError> {
        self.ensure_live()?;
        match self.bridge.route(event, self.host.size()) {
            Route::Redraw => {
                self.host.fit_to_container();
                self.render()
            }
            Route::Captured => Ok(()),
        }
    }

    /// Release listeners, buffer, program, shaders, brush, and context.
    /// Calling this more than once is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.bridge.teardown(self.host.surface_mut());

        let gl = self.host.gl_mut();
        gl.use_program(None);
        self.buffer.release(gl);
        self.program.release(gl);
        self.brush.release();
        self.host.release();

        self.disposed = true;
        log::debug!("painter disposed after {} frames", self.frames_rendered);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Current normalized RGBA.
    pub fn color(&self) -> [f32; 4] {
        self.color.value()
    }

    pub fn size(&self) -> (u32, u32) {
        self.host.size()
    }

    pub fn viewport(&self) -> Viewport {
        self.host.viewport()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn pointer(&self) -> PointerState {
        self.bridge.pointer()
    }

    pub fn listener_count(&self) -> usize {
        self.bridge.listener_count()
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    fn ensure_live(&self) -> Result<(), PaintError> {
        if self.disposed {
            return Err(PaintError::UseAfterDispose);
        }
        Ok(())
    }
}

impl<S: Surface> Drop for Painter<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{Faults, GlCall, HeadlessContainer};
    use pretty_assertions::assert_eq;

    fn painter(container: &HeadlessContainer) -> Painter<crate::headless::HeadlessSurface> {
        Painter::initialize(container, &PainterConfig::default()).unwrap()
    }

    #[test]
    fn initialize_renders_once_with_default_gray() {
        let container = HeadlessContainer::new(400.0, 300.0);
        let painter = painter(&container);

        let gray = 128.0 / 255.0;
        assert_eq!(painter.frames_rendered(), 1);
        assert_eq!(painter.color(), [gray, gray, gray, 1.0]);
        assert_eq!(container.ledger().borrow().last_uniform(), Some([gray, gray, gray, 1.0]));
    }

    #[test]
    fn render_clears_to_configured_color() {
        let container = HeadlessContainer::new(10.0, 10.0);
        let config = PainterConfig {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            ..PainterConfig::default()
        };
        let _painter = Painter::initialize(&container, &config).unwrap();
        assert!(container
            .ledger()
            .borrow()
            .calls()
            .contains(&GlCall::Clear([0.0, 0.0, 0.0, 1.0])));
    }

    #[test]
    fn gpu_error_during_render_is_swallowed() {
        let container = HeadlessContainer::with_faults(
            400.0,
            300.0,
            Faults {
                gl_errors: vec![0x0502],
                ..Faults::default()
            },
        );
        let mut painter = painter(&container);
        assert_eq!(painter.frames_rendered(), 1);
        painter.render().unwrap();
        assert_eq!(painter.frames_rendered(), 2);
    }

    #[test]
    fn render_drains_every_pending_gpu_error() {
        let container = HeadlessContainer::with_faults(
            400.0,
            300.0,
            Faults {
                gl_errors: vec![0x0500, 0x0502, 0x0505],
                ..Faults::default()
            },
        );
        let _painter = painter(&container);
        assert_eq!(container.ledger().borrow().pending_errors(), 0);
    }

    #[test]
    fn pointer_events_do_not_redraw() {
        let container = HeadlessContainer::new(400.0, 300.0);
        let mut painter = painter(&container);

        painter
            .handle_event(SurfaceEvent::PointerDown { x: 100.0, y: 75.0 })
            .unwrap();
        painter
            .handle_event(SurfaceEvent::PointerMove { x: 300.0, y: 225.0 })
            .unwrap();

        assert_eq!(painter.frames_rendered(), 1);
        let pointer = painter.pointer();
        assert!(pointer.pressed);
        assert_eq!(pointer.position, Some((300.0, 225.0)));
        assert_eq!(pointer.clip, Some((0.5, -0.5)));
    }

    #[test]
    fn dispose_releases_brush_and_is_idempotent() {
        let container = HeadlessContainer::new(400.0, 300.0);
        let mut painter = painter(&container);
        painter.dispose();
        painter.dispose();

        assert!(painter.is_disposed());
        assert!(painter.brush().is_released());
        assert_eq!(container.ledger().borrow().count(|c| *c == GlCall::LoseContext), 1);
    }

    #[test]
    fn drop_disposes() {
        let container = HeadlessContainer::new(400.0, 300.0);
        drop(painter(&container));

        let ledger = container.ledger();
        assert_eq!(ledger.borrow().live_handles(), 0);
        assert_eq!(ledger.borrow().active_listeners(), 0);
    }

    #[test]
    fn every_entry_point_rejects_use_after_dispose() {
        let container = HeadlessContainer::new(400.0, 300.0);
        let mut painter = painter(&container);
        painter.dispose();
        let calls_before = container.ledger().borrow().calls().len();

        assert_eq!(painter.render(), Err(PaintError::UseAfterDispose));
        assert_eq!(
            painter.change_color(Color::rgb(1.0, 2.0, 3.0)),
            Err(PaintError::UseAfterDispose)
        );
        assert_eq!(
            painter.handle_event(SurfaceEvent::Resize),
            Err(PaintError::UseAfterDispose)
        );
        assert_eq!(container.ledger().borrow().calls().len(), calls_before);
        assert_eq!(container.ledger().borrow().calls_after_context_loss(), 0);
    }
}
