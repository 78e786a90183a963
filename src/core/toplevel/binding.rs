//! Client bindings and the transport seam.
//!
//! The manager never talks to a socket. Each client's view of a toplevel is
//! a [`ToplevelBinding`] and each client's view of the manager global is a
//! [`GlobalBinding`]; the Wayland glue in `core::wayland` implements both
//! over protocol resources, tests implement them over recording mocks.
//!
//! Bindings are owned by the transport. The manager keeps them in an arena
//! keyed by [`BindingId`] and toplevels refer to them by id only.

use std::collections::HashMap;
use std::fmt;

use super::output::OutputMembership;
use super::state::{BindingId, OutputId, ToplevelId, ToplevelState};
use crate::core::errors::Result;

/// One client's subscription to one toplevel.
pub trait ToplevelBinding: Clone {
    /// `false` once the client destroyed the object or disconnected.
    fn is_alive(&self) -> bool;

    /// Whether both bindings belong to the same client connection.
    fn same_client(&self, other: &Self) -> bool;

    fn send_title(&self, title: &str);
    fn send_app_id(&self, app_id: &str);
    fn send_state(&self, state: ToplevelState);

    /// Returns `false` if the event could not be delivered, e.g. the client
    /// has no object for that output yet.
    fn send_output_enter(&self, output: OutputId) -> bool;
    fn send_output_leave(&self, output: OutputId) -> bool;

    /// `parent` is this client's binding to the parent toplevel.
    fn send_parent(&self, parent: Option<&Self>);
    fn send_done(&self);
    fn send_closed(&self);
}

/// One client's binding to the manager global.
pub trait GlobalBinding {
    type Toplevel: ToplevelBinding;
    /// Seat reference carried by activation requests.
    type Seat: Clone + fmt::Debug;
    /// Surface reference carried by rectangle hints.
    type Surface: Clone + fmt::Debug;

    fn is_alive(&self) -> bool;

    /// Announce `toplevel` to this client and return the per-toplevel
    /// binding created for it.
    ///
    /// Fails only on transport resource exhaustion; the failure stays local
    /// to this client.
    fn advertise(&self, toplevel: ToplevelId, binding: BindingId) -> Result<Self::Toplevel>;

    /// No more toplevels will be advertised on this binding.
    fn send_finished(&self);
}

// ============================================================================
// Binding Arena
// ============================================================================

#[derive(Debug)]
pub(crate) struct BindingEntry<T> {
    pub toplevel: ToplevelId,
    pub resource: T,
    /// Outputs this client has been told about.
    pub announced: OutputMembership,
}

#[derive(Debug)]
pub(crate) struct Bindings<T> {
    entries: HashMap<BindingId, BindingEntry<T>>,
    next_id: u64,
}

impl<T: ToplevelBinding> Bindings<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn allocate(&mut self) -> BindingId {
        let id = BindingId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, id: BindingId, toplevel: ToplevelId, resource: T) {
        self.entries.insert(id, BindingEntry {
            toplevel,
            resource,
            announced: OutputMembership::new(),
        });
    }

    pub fn remove(&mut self, id: BindingId) -> Option<BindingEntry<T>> {
        self.entries.remove(&id)
    }

    pub fn get(&self, id: BindingId) -> Option<&BindingEntry<T>> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: BindingId) -> Option<&mut BindingEntry<T>> {
        self.entries.get_mut(&id)
    }

    pub fn is_live(&self, id: BindingId) -> bool {
        self.entries.get(&id).is_some_and(|e| e.resource.is_alive())
    }

    /// The binding among `candidates` that belongs to the same client as
    /// `like`.
    pub fn for_client<'a>(&'a self, candidates: &[BindingId], like: &T) -> Option<&'a T> {
        candidates
            .iter()
            .filter_map(|id| self.entries.get(id))
            .map(|e| &e.resource)
            .find(|r| r.is_alive() && r.same_client(like))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
