//! Headless host: a recording GPU backend and an in-memory surface.
//!
//! Every GL call is appended to a shared [`GpuLedger`] together with the set
//! of live GPU handles, registered listeners, and attached surfaces. Failures
//! are injected through [`Faults`]. Used by the test suites and by hosts that
//! want to drive a painter without a browser.

use crate::backend::GlBackend;
use crate::config::ContextOptions;
use crate::error::PaintError;
use crate::events::EventKind;
use crate::shader::{COLOR_UNIFORM, POSITION_ATTRIBUTE, ShaderStage};
use crate::surface::{Container, Surface};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::rc::Rc;

pub type SharedLedger = Rc<RefCell<GpuLedger>>;

pub fn new_ledger() -> SharedLedger {
    Rc::new(RefCell::new(GpuLedger::default()))
}

/// A recorded backend call. Handles are ledger-assigned integers.
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    AcquireContext,
    CreateShader(ShaderStage),
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram,
    AttachShader { program: u32, shader: u32 },
    DetachShader { program: u32, shader: u32 },
    LinkProgram(u32),
    DeleteProgram(u32),
    UseProgram(Option<u32>),
    Uniform4f([f32; 4]),
    CreateBuffer,
    BindArrayBuffer(Option<u32>),
    BufferData { len: usize },
    DeleteBuffer(u32),
    VertexAttribPointer { location: u32, components: i32, stride: i32 },
    EnableVertexAttribArray(u32),
    EnableBlending,
    Viewport(i32, i32, i32, i32),
    Clear([f32; 4]),
    DrawTriangles { first: i32, count: i32 },
    LoseContext,
}

/// Failures to inject into a headless host.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// The container cannot create a surface at all.
    pub no_surface: bool,
    /// The surface has no WebGL2 context.
    pub no_context: bool,
    pub compile_failure: Option<ShaderStage>,
    pub link_failure: bool,
    pub subscribe_failure: Option<EventKind>,
    /// Error flags raised by the first draw, reported one per `take_error`.
    pub gl_errors: Vec<u32>,
}

// ─── Ledger ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct GpuLedger {
    calls: Vec<GlCall>,
    live: BTreeSet<u32>,
    next_handle: u32,
    listeners: BTreeMap<u32, EventKind>,
    next_listener: u32,
    attached: usize,
    calls_after_loss: usize,
    pending_errors: VecDeque<u32>,
}

impl GpuLedger {
    fn allocate(&mut self) -> u32 {
        self.next_handle += 1;
        self.live.insert(self.next_handle);
        self.next_handle
    }

    fn free(&mut self, handle: u32) {
        self.live.remove(&handle);
    }

    pub fn calls(&self) -> &[GlCall] {
        &self.calls
    }

    pub fn count(&self, predicate: impl Fn(&GlCall) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }

    /// Index of the first call matching `predicate`.
    pub fn position(&self, predicate: impl Fn(&GlCall) -> bool) -> Option<usize> {
        self.calls.iter().position(predicate)
    }

    /// Live GPU objects, the context included.
    pub fn live_handles(&self) -> usize {
        self.live.len()
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.len()
    }

    pub fn listener_kinds(&self) -> Vec<EventKind> {
        self.listeners.values().copied().collect()
    }

    pub fn attached_surfaces(&self) -> usize {
        self.attached
    }

    pub fn draw_count(&self) -> usize {
        self.count(|c| matches!(c, GlCall::DrawTriangles { .. }))
    }

    pub fn last_uniform(&self) -> Option<[f32; 4]> {
        self.calls.iter().rev().find_map(|c| match c {
            GlCall::Uniform4f(value) => Some(*value),
            _ => None,
        })
    }

    /// Error flags raised but not yet read back through `take_error`.
    pub fn pending_errors(&self) -> usize {
        self.pending_errors.len()
    }

    /// Calls issued on a context after it was lost. Must stay 0.
    pub fn calls_after_context_loss(&self) -> usize {
        self.calls_after_loss
    }
}

// ─── GL backend ──────────────────────────────────────────────────────────

pub struct HeadlessGl {
    ledger: SharedLedger,
    faults: Faults,
    context: u32,
    lost: bool,
    shaders: HashMap<u32, (ShaderStage, bool)>,
    programs: HashMap<u32, bool>,
    attachments: HashMap<u32, Vec<u32>>,
}

impl HeadlessGl {
    /// Acquire a context: allocates the context handle in the ledger.
    pub fn new(ledger: SharedLedger, faults: Faults) -> Self {
        let context = {
            let mut l = ledger.borrow_mut();
            l.calls.push(GlCall::AcquireContext);
            l.pending_errors.extend(faults.gl_errors.iter().copied());
            l.allocate()
        };
        Self {
            ledger,
            faults,
            context,
            lost: false,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            attachments: HashMap::new(),
        }
    }

    fn record(&self, call: GlCall) {
        let mut ledger = self.ledger.borrow_mut();
        if self.lost {
            ledger.calls_after_loss += 1;
        }
        ledger.calls.push(call);
    }

    fn allocate(&self, call: GlCall) -> u32 {
        self.record(call);
        self.ledger.borrow_mut().allocate()
    }

    fn free(&self, call: GlCall, handle: u32) {
        self.record(call);
        self.ledger.borrow_mut().free(handle);
    }
}

impl GlBackend for HeadlessGl {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type UniformLocation = u32;

    fn create_shader(&mut self, stage: ShaderStage) -> Option<u32> {
        let shader = self.allocate(GlCall::CreateShader(stage));
        self.shaders.insert(shader, (stage, false));
        Some(shader)
    }

    fn shader_source(&mut self, _shader: &u32, _source: &str) {}

    fn compile_shader(&mut self, shader: &u32) {
        self.record(GlCall::CompileShader(*shader));
        let failing = self.faults.compile_failure;
        if let Some((stage, compiled)) = self.shaders.get_mut(shader) {
            *compiled = failing != Some(*stage);
        }
    }

    fn shader_compiled(&self, shader: &u32) -> bool {
        self.shaders.get(shader).is_some_and(|(_, compiled)| *compiled)
    }

    fn shader_info_log(&self, shader: &u32) -> Option<String> {
        if self.shader_compiled(shader) {
            Some(String::new())
        } else {
            Some("ERROR: 0:1: '' : syntax error".to_string())
        }
    }

    fn delete_shader(&mut self, shader: &u32) {
        self.free(GlCall::DeleteShader(*shader), *shader);
        self.shaders.remove(shader);
    }

    fn create_program(&mut self) -> Option<u32> {
        let program = self.allocate(GlCall::CreateProgram);
        self.programs.insert(program, false);
        Some(program)
    }

    fn attach_shader(&mut self, program: &u32, shader: &u32) {
        self.record(GlCall::AttachShader {
            program: *program,
            shader: *shader,
        });
        self.attachments.entry(*program).or_default().push(*shader);
    }

    fn detach_shader(&mut self, program: &u32, shader: &u32) {
        self.record(GlCall::DetachShader {
            program: *program,
            shader: *shader,
        });
        if let Some(attached) = self.attachments.get_mut(program) {
            attached.retain(|s| s != shader);
        }
    }

    fn link_program(&mut self, program: &u32) {
        self.record(GlCall::LinkProgram(*program));
        let shaders_ok = self
            .attachments
            .get(program)
            .is_some_and(|attached| attached.len() == 2 && attached.iter().all(|s| self.shader_compiled(s)));
        let linked = shaders_ok && !self.faults.link_failure;
        self.programs.insert(*program, linked);
    }

    fn program_linked(&self, program: &u32) -> bool {
        self.programs.get(program).copied().unwrap_or(false)
    }

    fn program_info_log(&self, program: &u32) -> Option<String> {
        if self.program_linked(program) {
            Some(String::new())
        } else {
            Some("ERROR: failed to link: varying mismatch".to_string())
        }
    }

    fn delete_program(&mut self, program: &u32) {
        self.free(GlCall::DeleteProgram(*program), *program);
        self.programs.remove(program);
        self.attachments.remove(program);
    }

    fn use_program(&mut self, program: Option<&u32>) {
        self.record(GlCall::UseProgram(program.copied()));
    }

    fn uniform_location(&self, program: &u32, name: &str) -> Option<u32> {
        (self.program_linked(program) && name == COLOR_UNIFORM).then_some(0)
    }

    fn attrib_location(&self, program: &u32, name: &str) -> Option<u32> {
        (self.program_linked(program) && name == POSITION_ATTRIBUTE).then_some(0)
    }

    fn uniform4f(&mut self, _location: &u32, value: [f32; 4]) {
        self.record(GlCall::Uniform4f(value));
    }

    fn create_buffer(&mut self) -> Option<u32> {
        Some(self.allocate(GlCall::CreateBuffer))
    }

    fn bind_array_buffer(&mut self, buffer: Option<&u32>) {
        self.record(GlCall::BindArrayBuffer(buffer.copied()));
    }

    fn buffer_static_data(&mut self, data: &[f32]) {
        self.record(GlCall::BufferData { len: data.len() });
    }

    fn delete_buffer(&mut self, buffer: &u32) {
        self.free(GlCall::DeleteBuffer(*buffer), *buffer);
    }

    fn vertex_attrib_pointer(&mut self, location: u32, components: i32, stride: i32, _offset: i32) {
        self.record(GlCall::VertexAttribPointer {
            location,
            components,
            stride,
        });
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        self.record(GlCall::EnableVertexAttribArray(location));
    }

    fn enable_blending(&mut self) {
        self.record(GlCall::EnableBlending);
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::Viewport(x, y, width, height));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.record(GlCall::Clear(color));
    }

    fn draw_triangles(&mut self, first: i32, count: i32) {
        self.record(GlCall::DrawTriangles { first, count });
    }

    fn take_error(&mut self) -> Option<u32> {
        self.ledger.borrow_mut().pending_errors.pop_front()
    }

    fn lose_context(&mut self) {
        if self.lost {
            return;
        }
        self.free(GlCall::LoseContext, self.context);
        self.lost = true;
    }
}

// ─── Surface and container ───────────────────────────────────────────────

/// Listener handle returned by [`HeadlessSurface::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessSubscription(u32);

pub struct HeadlessSurface {
    ledger: SharedLedger,
    rect: Rc<Cell<(f64, f64)>>,
    faults: Faults,
    size: (u32, u32),
    attached: bool,
}

impl HeadlessSurface {
    pub fn new(ledger: SharedLedger, rect: (f64, f64), faults: Faults) -> Self {
        Self::with_shared_rect(ledger, Rc::new(Cell::new(rect)), faults)
    }

    fn with_shared_rect(ledger: SharedLedger, rect: Rc<Cell<(f64, f64)>>, faults: Faults) -> Self {
        ledger.borrow_mut().attached += 1;
        Self {
            ledger,
            rect,
            faults,
            // Default size of a fresh `<canvas>`.
            size: (300, 150),
            attached: true,
        }
    }
}

impl Surface for HeadlessSurface {
    type Gl = HeadlessGl;
    type Subscription = HeadlessSubscription;

    fn acquire_context(&mut self, _options: &ContextOptions) -> Option<HeadlessGl> {
        if self.faults.no_context {
            return None;
        }
        Some(HeadlessGl::new(self.ledger.clone(), self.faults.clone()))
    }

    fn bounding_rect(&self) -> (f64, f64) {
        self.rect.get()
    }

    fn pixel_size(&self) -> (u32, u32) {
        self.size
    }

    fn set_pixel_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn subscribe(&mut self, kind: EventKind) -> Result<HeadlessSubscription, PaintError> {
        if self.faults.subscribe_failure == Some(kind) {
            return Err(PaintError::EventSubscription(kind.dom_name().to_string()));
        }
        let mut ledger = self.ledger.borrow_mut();
        ledger.next_listener += 1;
        let id = ledger.next_listener;
        ledger.listeners.insert(id, kind);
        Ok(HeadlessSubscription(id))
    }

    fn unsubscribe(&mut self, subscription: HeadlessSubscription) {
        self.ledger.borrow_mut().listeners.remove(&subscription.0);
    }

    fn detach(&mut self) {
        if self.attached {
            self.attached = false;
            self.ledger.borrow_mut().attached -= 1;
        }
    }
}

/// An in-memory host element with a resizable bounding rectangle.
pub struct HeadlessContainer {
    ledger: SharedLedger,
    rect: Rc<Cell<(f64, f64)>>,
    faults: Faults,
}

impl HeadlessContainer {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_faults(width, height, Faults::default())
    }

    pub fn with_faults(width: f64, height: f64, faults: Faults) -> Self {
        Self {
            ledger: new_ledger(),
            rect: Rc::new(Cell::new((width, height))),
            faults,
        }
    }

    pub fn ledger(&self) -> SharedLedger {
        self.ledger.clone()
    }

    /// Change the on-screen size. Surfaces see it on their next
    /// `bounding_rect` query.
    pub fn set_bounding_rect(&self, width: f64, height: f64) {
        self.rect.set((width, height));
    }
}

impl Container for HeadlessContainer {
    type Surface = HeadlessSurface;

    fn create_surface(&self) -> Result<HeadlessSurface, PaintError> {
        if self.faults.no_surface {
            return Err(PaintError::ContextUnavailable(
                "Could not create canvas element".to_string(),
            ));
        }
        Ok(HeadlessSurface::with_shared_rect(
            self.ledger.clone(),
            self.rect.clone(),
            self.faults.clone(),
        ))
    }
}
