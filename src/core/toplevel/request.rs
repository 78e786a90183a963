//! Client requests and the listeners that receive them.
//!
//! A request never changes toplevel state by itself. It is handed to the
//! listener the compositor registered for that kind of request; the
//! compositor decides what to do and publishes the outcome through the
//! regular mutators.

use super::state::{OutputId, ToplevelId};

/// A decoded client request addressed to one toplevel.
#[derive(Debug, Clone, PartialEq)]
pub enum ToplevelRequest<Seat, Surface> {
    Maximize { maximized: bool },
    Minimize { minimized: bool },
    Fullscreen { fullscreen: bool, output: Option<OutputId> },
    Activate { seat: Seat },
    Close,
    Move { x: i32, y: i32 },
    SetRectangle { surface: Surface, x: i32, y: i32, width: i32, height: i32 },
}

impl<Seat, Surface> ToplevelRequest<Seat, Surface> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Maximize { .. } => "maximize",
            Self::Minimize { .. } => "minimize",
            Self::Fullscreen { .. } => "fullscreen",
            Self::Activate { .. } => "activate",
            Self::Close => "close",
            Self::Move { .. } => "move",
            Self::SetRectangle { .. } => "set_rectangle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaximizeEvent {
    pub toplevel: ToplevelId,
    pub maximized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimizeEvent {
    pub toplevel: ToplevelId,
    pub minimized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullscreenEvent {
    pub toplevel: ToplevelId,
    pub fullscreen: bool,
    /// Output hint; `None` lets the compositor choose.
    pub output: Option<OutputId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivateEvent<Seat> {
    pub toplevel: ToplevelId,
    pub seat: Seat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseEvent {
    pub toplevel: ToplevelId,
}

/// Requested top-left position in global coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveEvent {
    pub toplevel: ToplevelId,
    pub x: i32,
    pub y: i32,
}

/// Where a task bar shows this toplevel, in `surface`-local coordinates.
/// A zero-sized rectangle clears the hint.
#[derive(Debug, Clone, PartialEq)]
pub struct RectangleEvent<Surface> {
    pub toplevel: ToplevelId,
    pub surface: Surface,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

type Listener<E> = Option<Box<dyn FnMut(&E)>>;

/// Per-toplevel request listeners, at most one per request kind.
pub(crate) struct ToplevelListeners<Seat, Surface> {
    pub maximize: Listener<MaximizeEvent>,
    pub minimize: Listener<MinimizeEvent>,
    pub fullscreen: Listener<FullscreenEvent>,
    pub activate: Listener<ActivateEvent<Seat>>,
    pub close: Listener<CloseEvent>,
    pub move_to: Listener<MoveEvent>,
    pub rectangle: Listener<RectangleEvent<Surface>>,
    pub destroy: Option<Box<dyn FnOnce(ToplevelId)>>,
}

impl<Seat, Surface> Default for ToplevelListeners<Seat, Surface> {
    fn default() -> Self {
        Self {
            maximize: None,
            minimize: None,
            fullscreen: None,
            activate: None,
            close: None,
            move_to: None,
            rectangle: None,
            destroy: None,
        }
    }
}

impl<Seat, Surface> ToplevelListeners<Seat, Surface> {
    /// Hand `request` to its listener. Returns `false` if none is registered.
    pub fn dispatch(&mut self, toplevel: ToplevelId, request: ToplevelRequest<Seat, Surface>) -> bool {
        fn call<E>(listener: &mut Listener<E>, event: E) -> bool {
            match listener.as_mut() {
                Some(f) => {
                    f(&event);
                    true
                }
                None => false,
            }
        }

        match request {
            ToplevelRequest::Maximize { maximized } => {
                call(&mut self.maximize, MaximizeEvent { toplevel, maximized })
            }
            ToplevelRequest::Minimize { minimized } => {
                call(&mut self.minimize, MinimizeEvent { toplevel, minimized })
            }
            ToplevelRequest::Fullscreen { fullscreen, output } => {
                call(&mut self.fullscreen, FullscreenEvent { toplevel, fullscreen, output })
            }
            ToplevelRequest::Activate { seat } => {
                call(&mut self.activate, ActivateEvent { toplevel, seat })
            }
            ToplevelRequest::Close => call(&mut self.close, CloseEvent { toplevel }),
            ToplevelRequest::Move { x, y } => call(&mut self.move_to, MoveEvent { toplevel, x, y }),
            ToplevelRequest::SetRectangle { surface, x, y, width, height } => call(
                &mut self.rectangle,
                RectangleEvent { toplevel, surface, x, y, width, height },
            ),
        }
    }
}
