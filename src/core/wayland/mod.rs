//! Wayland transport for the toplevel manager.
//!
//! `protocol` holds the scanner-generated bindings, `output` maps output ids
//! to client `wl_output` objects, and `foreign_toplevel_management` carries
//! the dispatch implementations.

pub mod foreign_toplevel_management;
pub mod output;
pub mod protocol;

pub use foreign_toplevel_management::{
    ForeignToplevelHandler, ForeignToplevelManagerState, ToplevelGlobalData, ToplevelHandleData,
    WlManager, WlToplevel,
};
pub use output::OutputResources;
