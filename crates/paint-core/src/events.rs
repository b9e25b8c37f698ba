//! Host notifications and the bridge that routes them into the painter.
//!
//! Resize notifications re-fit the surface and redraw. Pointer notifications
//! only update [`PointerState`]; they are the hook for stroke drawing and
//! have no visible effect yet.

use crate::error::PaintError;
use crate::surface::Surface;

/// A listener the bridge registers on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Resize,
    PointerDown,
    PointerMove,
    PointerUp,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Resize,
        EventKind::PointerDown,
        EventKind::PointerMove,
        EventKind::PointerUp,
    ];

    /// DOM event name.
    pub fn dom_name(self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::PointerDown => "mousedown",
            Self::PointerMove => "mousemove",
            Self::PointerUp => "mouseup",
        }
    }
}

/// A notification delivered by the host. Pointer positions are in surface
/// pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    Resize,
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
}

impl SurfaceEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Resize => EventKind::Resize,
            Self::PointerDown { .. } => EventKind::PointerDown,
            Self::PointerMove { .. } => EventKind::PointerMove,
            Self::PointerUp { .. } => EventKind::PointerUp,
        }
    }

    pub fn position(&self) -> Option<(f32, f32)> {
        match self {
            Self::PointerDown { x, y } | Self::PointerMove { x, y } | Self::PointerUp { x, y } => {
                Some((*x, *y))
            }
            Self::Resize => None,
        }
    }
}

// ─── Pointer state ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub pressed: bool,
    /// Last position in surface pixels.
    pub position: Option<(f32, f32)>,
    /// Last position in clip space, y up.
    pub clip: Option<(f32, f32)>,
}

impl PointerState {
    fn record(&mut self, x: f32, y: f32, (width, height): (u32, u32)) {
        self.position = Some((x, y));
        self.clip = to_clip_space(x, y, width, height);
    }
}

/// Map a pixel position to clip space. `None` for an empty surface.
pub fn to_clip_space(x: f32, y: f32, width: u32, height: u32) -> Option<(f32, f32)> {
    if width == 0 || height == 0 {
        return None;
    }
    let cx = 2.0 * x / width as f32 - 1.0;
    let cy = -(2.0 * y / height as f32 - 1.0);
    Some((cx, cy))
}

// ─── Bridge ──────────────────────────────────────────────────────────────

/// What the painter must do after the bridge has routed an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Re-fit the surface to its container, then render.
    Redraw,
    /// Captured in pointer state only.
    Captured,
}

/// Holds the listener subscriptions and pointer state.
pub struct EventBridge<Sub> {
    subscriptions: Vec<Sub>,
    pointer: PointerState,
}

impl<Sub> EventBridge<Sub> {
    /// Subscribe to every [`EventKind`] on `surface`.
    ///
    /// # Errors
    /// Propagates the first subscription failure after unsubscribing the
    /// listeners registered so far.
    pub fn attach<S>(surface: &mut S) -> Result<Self, PaintError>
    where
        S: Surface<Subscription = Sub>,
    {
        let mut bridge = Self {
            subscriptions: Vec::with_capacity(EventKind::ALL.len()),
            pointer: PointerState::default(),
        };
        for kind in EventKind::ALL {
            match surface.subscribe(kind) {
                Ok(subscription) => bridge.subscriptions.push(subscription),
                Err(e) => {
                    bridge.teardown(surface);
                    return Err(e);
                }
            }
        }
        log::debug!("{} listeners registered", bridge.subscriptions.len());
        Ok(bridge)
    }

    pub fn route(&mut self, event: SurfaceEvent, surface_size: (u32, u32)) -> Route {
        match event {
            SurfaceEvent::Resize => Route::Redraw,
            SurfaceEvent::PointerDown { x, y } => {
                self.pointer.pressed = true;
                self.pointer.record(x, y, surface_size);
                Route::Captured
            }
            SurfaceEvent::PointerMove { x, y } => {
                self.pointer.record(x, y, surface_size);
                log::trace!("pointer at {:?} (clip {:?})", self.pointer.position, self.pointer.clip);
                Route::Captured
            }
            SurfaceEvent::PointerUp { x, y } => {
                self.pointer.pressed = false;
                self.pointer.record(x, y, surface_size);
                Route::Captured
            }
        }
    }

    /// Unsubscribe every listener. Safe to call repeatedly.
    pub fn teardown<S>(&mut self, surface: &mut S)
    where
        S: Surface<Subscription = Sub>,
    {
        let count = self.subscriptions.len();
        for subscription in self.subscriptions.drain(..) {
            surface.unsubscribe(subscription);
        }
        if count > 0 {
            log::debug!("{count} listeners removed");
        }
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{Faults, HeadlessSurface, new_ledger};
    use pretty_assertions::assert_eq;

    #[test]
    fn clip_space_maps_corners() {
        assert_eq!(to_clip_space(0.0, 0.0, 400, 300), Some((-1.0, 1.0)));
        assert_eq!(to_clip_space(400.0, 300.0, 400, 300), Some((1.0, -1.0)));
        assert_eq!(to_clip_space(200.0, 150.0, 400, 300), Some((0.0, 0.0)));
        assert_eq!(to_clip_space(1.0, 1.0, 0, 300), None);
    }

    #[test]
    fn pointer_events_are_captured_without_redraw() {
        let mut surface = HeadlessSurface::new(new_ledger(), (400.0, 300.0), Faults::default());
        let mut bridge = EventBridge::attach(&mut surface).unwrap();

        let route = bridge.route(SurfaceEvent::PointerDown { x: 200.0, y: 150.0 }, (400, 300));
        assert_eq!(route, Route::Captured);
        assert!(bridge.pointer().pressed);
        assert_eq!(bridge.pointer().clip, Some((0.0, 0.0)));

        bridge.route(SurfaceEvent::PointerUp { x: 0.0, y: 0.0 }, (400, 300));
        assert_eq!(
            bridge.pointer(),
            PointerState {
                pressed: false,
                position: Some((0.0, 0.0)),
                clip: Some((-1.0, 1.0)),
            }
        );
    }

    #[test]
    fn resize_requests_redraw() {
        let mut surface = HeadlessSurface::new(new_ledger(), (400.0, 300.0), Faults::default());
        let mut bridge = EventBridge::attach(&mut surface).unwrap();
        assert_eq!(bridge.route(SurfaceEvent::Resize, (400, 300)), Route::Redraw);
    }

    #[test]
    fn teardown_removes_every_listener() {
        let ledger = new_ledger();
        let mut surface = HeadlessSurface::new(ledger.clone(), (400.0, 300.0), Faults::default());
        let mut bridge = EventBridge::attach(&mut surface).unwrap();
        assert_eq!(bridge.listener_count(), 4);
        assert_eq!(ledger.borrow().active_listeners(), 4);

        bridge.teardown(&mut surface);
        bridge.teardown(&mut surface);
        assert_eq!(bridge.listener_count(), 0);
        assert_eq!(ledger.borrow().active_listeners(), 0);
    }

    #[test]
    fn failed_subscription_rolls_back() {
        let ledger = new_ledger();
        let faults = Faults {
            subscribe_failure: Some(EventKind::PointerMove),
            ..Faults::default()
        };
        let mut surface = HeadlessSurface::new(ledger.clone(), (400.0, 300.0), faults);
        let result = EventBridge::attach(&mut surface);

        assert!(matches!(result, Err(PaintError::EventSubscription(_))));
        assert_eq!(ledger.borrow().active_listeners(), 0);
    }
}
