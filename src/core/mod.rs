pub mod errors;
pub mod runtime;
pub mod toplevel;
pub mod wayland;

// Re-export key types
pub use errors::{CoreError, Result};
pub use runtime::IdleQueue;
pub use toplevel::{Manager, ToplevelHandle, ToplevelId, ToplevelState};
