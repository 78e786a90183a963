//! Identifiers and state flags for managed toplevels.

use std::fmt;

use bitflags::bitflags;

/// Stable identifier of a toplevel within one [`Manager`](super::Manager).
///
/// Identifiers are never reused, so a stale id held by a client binding
/// simply stops resolving once the toplevel is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToplevelId(pub(crate) u32);

impl ToplevelId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ToplevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toplevel#{}", self.0)
    }
}

/// Compositor-side output reference.
///
/// The compositor owns the numbering; the manager only compares ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(pub u32);

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output#{}", self.0)
    }
}

/// Key of one client's subscription to one toplevel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub(crate) u64);

/// Key of one client's binding to the manager global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalId(pub(crate) u64);

bitflags! {
    /// Window state flags. They are independent of each other; no
    /// combination is rejected here.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ToplevelState: u32 {
        const MAXIMIZED = 1 << 0;
        const MINIMIZED = 1 << 1;
        const ACTIVATED = 1 << 2;
        const FULLSCREEN = 1 << 3;
    }
}

impl ToplevelState {
    pub fn is_maximized(self) -> bool {
        self.contains(Self::MAXIMIZED)
    }

    pub fn is_minimized(self) -> bool {
        self.contains(Self::MINIMIZED)
    }

    pub fn is_activated(self) -> bool {
        self.contains(Self::ACTIVATED)
    }

    pub fn is_fullscreen(self) -> bool {
        self.contains(Self::FULLSCREEN)
    }
}
