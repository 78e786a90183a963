// box-toplevel
// Copyright (c) 2026
//
// Server-side foreign toplevel management for Wayland compositors.
// The toplevel core is transport-independent; core/wayland adapts it to
// wayland-server resources.

pub mod core;
pub mod config;
pub mod util;
pub mod prelude;

pub use config::ManagerConfig;
pub use core::errors::{CoreError, Result};
pub use core::toplevel::{Manager, ToplevelHandle, ToplevelId, ToplevelState};

pub mod reexports {
    pub use wayland_server;
}
