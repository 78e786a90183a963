//! Foreign toplevel management core.
//!
//! Tracks every managed toplevel window and multicasts its title, app id,
//! state flags, outputs and parent to the clients that bound it. Client
//! requests are forwarded to compositor-registered listeners; the core never
//! applies window-management policy on its own.
//!
//! The core is transport-independent. See [`binding`] for the seam and
//! `core::wayland` for the Wayland implementation.

pub mod binding;
pub mod handle;
pub mod manager;
pub mod output;
pub mod request;
pub mod state;
mod tests;

pub use binding::{GlobalBinding, ToplevelBinding};
pub use handle::ToplevelHandle;
pub use manager::Manager;
pub use output::OutputMembership;
pub use request::{
    ActivateEvent, CloseEvent, FullscreenEvent, MaximizeEvent, MinimizeEvent, MoveEvent,
    RectangleEvent, ToplevelRequest,
};
pub use state::{BindingId, GlobalId, OutputId, ToplevelId, ToplevelState};
