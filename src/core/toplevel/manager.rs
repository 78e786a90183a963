//! The toplevel manager: registry of live toplevels and of the clients
//! bound to the global.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use super::binding::{Bindings, GlobalBinding, ToplevelBinding};
use super::handle::{Toplevel, ToplevelHandle};
use super::request::ToplevelRequest;
use super::state::{BindingId, GlobalId, OutputId, ToplevelId};
use crate::config::ManagerConfig;
use crate::core::errors::{CoreError, Result};
use crate::core::runtime::IdleQueue;
use crate::util::logging::{IDLE, MANAGER};
use crate::wlog;

static NEXT_MANAGER_SERIAL: AtomicU32 = AtomicU32::new(1);

/// Process-wide registry and factory of toplevels.
///
/// The compositor creates one manager at startup and passes it by reference
/// to every toplevel operation. All methods run on the compositor's event
/// loop thread; nothing here locks.
///
/// Dropping the manager tears it down like [`Manager::destroy`].
pub struct Manager<G: GlobalBinding> {
    serial: u32,
    pub(super) config: ManagerConfig,

    pub(super) toplevels: HashMap<ToplevelId, Toplevel<G>>,
    /// Live toplevels in creation order
    pub(super) order: Vec<ToplevelId>,
    pub(super) bindings: Bindings<G::Toplevel>,
    pub(super) idle: IdleQueue<ToplevelId>,

    globals: Vec<(GlobalId, G)>,
    next_toplevel: u32,
    next_global: u64,

    destroy_listeners: Vec<Box<dyn FnOnce()>>,
    destroyed: bool,
}

impl<G: GlobalBinding> Manager<G> {
    pub fn new(config: ManagerConfig) -> Self {
        let config = config.sanitized();
        let serial = NEXT_MANAGER_SERIAL.fetch_add(1, Ordering::Relaxed);
        wlog!(MANAGER, "Created toplevel manager #{} (version {})", serial, config.version);
        Self {
            serial,
            config,
            toplevels: HashMap::new(),
            order: Vec::new(),
            bindings: Bindings::new(),
            idle: IdleQueue::new(),
            globals: Vec::new(),
            next_toplevel: 1,
            next_global: 1,
            destroy_listeners: Vec::new(),
            destroyed: false,
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create a toplevel and advertise it to every bound client.
    pub fn create_handle(&mut self) -> ToplevelHandle {
        let id = ToplevelId(self.next_toplevel);
        self.next_toplevel += 1;

        self.toplevels.insert(id, Toplevel::new());
        self.order.push(id);
        tracing::debug!("Created {}", id);

        self.prune_globals();
        for index in 0..self.globals.len() {
            if let Some(binding) = self.advertise(index, id) {
                self.send_initial_state(binding);
            }
        }

        ToplevelHandle::new(id, self.serial)
    }

    /// Tear down every toplevel and global binding, then notify
    /// [`on_destroy`](Self::on_destroy) listeners.
    pub fn destroy(mut self) {
        self.teardown();
    }

    /// Register an observer for manager destruction.
    pub fn on_destroy(&mut self, listener: impl FnOnce() + 'static) {
        self.destroy_listeners.push(Box::new(listener));
    }

    fn teardown(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        wlog!(MANAGER, "Destroying toplevel manager #{} ({} toplevels)", self.serial, self.order.len());

        while let Some(id) = self.order.last().copied() {
            self.destroy_toplevel(id);
        }
        for (_, global) in self.globals.drain(..) {
            if global.is_alive() {
                global.send_finished();
            }
        }
        self.bindings.clear();
        self.idle.clear();

        for listener in self.destroy_listeners.drain(..) {
            listener();
        }
    }

    // =========================================================================
    // Global Bindings
    // =========================================================================

    /// Register a client's binding to the global and advertise every live
    /// toplevel to it.
    ///
    /// All per-toplevel bindings are created before any initial state is
    /// sent, so parent references resolve regardless of creation order.
    pub fn bind_global(&mut self, global: G) -> GlobalId {
        let id = GlobalId(self.next_global);
        self.next_global += 1;
        self.globals.push((id, global));
        let index = self.globals.len() - 1;

        let order = self.order.clone();
        let created: Vec<BindingId> = order
            .into_iter()
            .filter_map(|toplevel| self.advertise(index, toplevel))
            .collect();
        for binding in &created {
            self.send_initial_state(*binding);
        }

        wlog!(MANAGER, "Global bound ({:?}), advertised {} toplevels", id, created.len());
        id
    }

    /// The client asked to stop receiving new toplevels.
    ///
    /// Sends `finished` and forgets the global binding. Toplevel bindings the
    /// client already holds keep receiving events.
    pub fn stop(&mut self, global: GlobalId) {
        if let Some(index) = self.globals.iter().position(|(id, _)| *id == global) {
            let (_, binding) = self.globals.remove(index);
            if binding.is_alive() {
                binding.send_finished();
            }
            wlog!(MANAGER, "Global {:?} stopped", global);
        }
    }

    /// Forget a global binding the transport destroyed.
    pub fn unbind_global(&mut self, global: GlobalId) {
        self.globals.retain(|(id, _)| *id != global);
    }

    pub fn global_count(&self) -> usize {
        self.globals.len()
    }

    fn prune_globals(&mut self) {
        self.globals.retain(|(_, g)| g.is_alive());
    }

    /// Create a per-toplevel binding through the global at `index`.
    fn advertise(&mut self, index: usize, toplevel: ToplevelId) -> Option<BindingId> {
        let binding = self.bindings.allocate();
        let resource = match self.globals[index].1.advertise(toplevel, binding) {
            Ok(resource) => resource,
            Err(err) => {
                tracing::warn!("Could not advertise {}: {}", toplevel, err);
                return None;
            }
        };
        self.bindings.insert(binding, toplevel, resource);
        if let Some(record) = self.toplevels.get_mut(&toplevel) {
            record.bindings.push(binding);
        }
        Some(binding)
    }

    // =========================================================================
    // Toplevel Bindings
    // =========================================================================

    /// Register an already-created per-toplevel binding and send it the
    /// toplevel's current state.
    ///
    /// Transports that create toplevel objects on client request use this
    /// instead of relying on [`bind_global`](Self::bind_global).
    pub fn bind(&mut self, toplevel: ToplevelId, resource: G::Toplevel) -> Result<BindingId> {
        if !self.toplevels.contains_key(&toplevel) {
            return Err(CoreError::InvalidToplevelId(toplevel));
        }
        let binding = self.bindings.allocate();
        self.bindings.insert(binding, toplevel, resource);
        if let Some(record) = self.toplevels.get_mut(&toplevel) {
            record.bindings.push(binding);
        }
        self.send_initial_state(binding);
        Ok(binding)
    }

    /// Forget a per-toplevel binding (client destroyed it or disconnected).
    pub fn unbind(&mut self, binding: BindingId) {
        let Some(entry) = self.bindings.remove(binding) else {
            return;
        };
        if let Some(record) = self.toplevels.get_mut(&entry.toplevel) {
            record.bindings.retain(|b| *b != binding);
        }
        tracing::debug!("Unbound {:?} from {}", binding, entry.toplevel);
    }

    /// Full current state for a fresh binding: no history, just the facts.
    fn send_initial_state(&mut self, binding: BindingId) {
        let Some(entry) = self.bindings.get(binding) else {
            return;
        };
        let Some(record) = self.toplevels.get(&entry.toplevel) else {
            return;
        };
        let resource = &entry.resource;

        if let Some(title) = &record.title {
            resource.send_title(title);
        }
        if let Some(app_id) = &record.app_id {
            resource.send_app_id(app_id);
        }
        resource.send_state(record.state);
        if let Some(parent) = record.parent.and_then(|p| self.toplevels.get(&p)) {
            if let Some(parent_resource) = self.bindings.for_client(&parent.bindings, resource) {
                resource.send_parent(Some(parent_resource));
            }
        }
        let delivered: Vec<OutputId> = record
            .outputs
            .iter()
            .filter(|output| resource.send_output_enter(*output))
            .collect();
        resource.send_done();

        if let Some(entry) = self.bindings.get_mut(binding) {
            for output in delivered {
                entry.announced.enter(output);
            }
        }
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Forward a client request to the listener registered on the toplevel.
    ///
    /// Requests racing the toplevel's destruction return
    /// [`CoreError::InvalidToplevelId`]; the transport ignores them.
    pub fn handle_request(
        &mut self,
        toplevel: ToplevelId,
        request: ToplevelRequest<G::Seat, G::Surface>,
    ) -> Result<()> {
        let Some(record) = self.toplevels.get_mut(&toplevel) else {
            return Err(CoreError::InvalidToplevelId(toplevel));
        };
        let kind = request.kind();
        tracing::debug!("{} requested {}", toplevel, kind);
        if !record.listeners.dispatch(toplevel, request) {
            tracing::debug!("No {} listener on {}, request dropped", kind, toplevel);
        }
        Ok(())
    }

    // =========================================================================
    // Idle Flush
    // =========================================================================

    /// Run every pending flush. Call once per event-loop tick.
    ///
    /// Returns the number of toplevels flushed.
    pub fn dispatch_idle(&mut self) -> usize {
        let pending = self.idle.take_all();
        let mut flushed = 0;
        for toplevel in pending {
            if self.toplevels.contains_key(&toplevel) {
                self.flush(toplevel);
                flushed += 1;
            }
        }
        if flushed > 0 {
            tracing::trace!("[{}] Flushed {} toplevels", IDLE, flushed);
        }
        flushed
    }

    pub fn has_pending_flush(&self, toplevel: ToplevelId) -> bool {
        self.idle.is_pending(toplevel)
    }

    pub(super) fn schedule_flush(&mut self, toplevel: ToplevelId) {
        if self.config.coalesce_outputs {
            self.idle.schedule(toplevel);
        } else {
            self.flush(toplevel);
        }
    }

    /// Record an attribute change and schedule the `done` that closes it.
    pub(super) fn mark_changed(&mut self, toplevel: ToplevelId) {
        if let Some(record) = self.toplevels.get_mut(&toplevel) {
            record.dirty = true;
        }
        self.schedule_flush(toplevel);
    }

    /// Bring every binding's output view up to date, then mark the batch
    /// done. Bindings that received nothing in this batch get no `done`.
    fn flush(&mut self, toplevel: ToplevelId) {
        let live = self.live_bindings(toplevel);
        let Some(record) = self.toplevels.get_mut(&toplevel) else {
            return;
        };
        let dirty = std::mem::replace(&mut record.dirty, false);
        for binding in live {
            let Some(entry) = self.bindings.get_mut(binding) else {
                continue;
            };
            let mut changed = dirty;
            let (left, entered) = record.outputs.diff(&entry.announced);
            for output in left {
                changed |= entry.resource.send_output_leave(output);
                entry.announced.leave(output);
            }
            for output in entered {
                if entry.resource.send_output_enter(output) {
                    entry.announced.enter(output);
                    changed = true;
                }
            }
            if changed {
                entry.resource.send_done();
            }
        }
    }

    // =========================================================================
    // Outputs
    // =========================================================================

    /// The compositor removed an output: drop it from every toplevel.
    pub fn output_destroyed(&mut self, output: OutputId) {
        let affected: Vec<ToplevelId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.toplevels.get_mut(id).is_some_and(|r| r.outputs.leave(output)))
            .collect();
        tracing::debug!("{} destroyed, leaving {} toplevels", output, affected.len());
        for toplevel in affected {
            self.schedule_flush(toplevel);
        }
    }

    /// A client bound a new object for `output`; resend enters it missed.
    pub fn output_bound(&mut self, output: OutputId) {
        let affected: Vec<ToplevelId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.toplevels.get(id).is_some_and(|r| r.outputs.contains(output)))
            .collect();
        for toplevel in affected {
            self.schedule_flush(toplevel);
        }
    }

    // =========================================================================
    // Multicast
    // =========================================================================

    /// Snapshot of the toplevel's live bindings; dead ones are dropped.
    pub(super) fn live_bindings(&mut self, toplevel: ToplevelId) -> Vec<BindingId> {
        let Some(record) = self.toplevels.get_mut(&toplevel) else {
            return Vec::new();
        };
        let bindings = &mut self.bindings;
        record.bindings.retain(|id| {
            if bindings.is_live(*id) {
                true
            } else {
                bindings.remove(*id);
                false
            }
        });
        record.bindings.clone()
    }

    /// Send to every binding present when the broadcast starts.
    pub(super) fn broadcast(&mut self, toplevel: ToplevelId, mut send: impl FnMut(&G::Toplevel)) {
        for binding in self.live_bindings(toplevel) {
            if let Some(entry) = self.bindings.get(binding) {
                send(&entry.resource);
            }
        }
    }

    /// Clones of the toplevel's live binding resources.
    pub(super) fn resources_of(&mut self, toplevel: ToplevelId) -> Vec<G::Toplevel> {
        self.live_bindings(toplevel)
            .into_iter()
            .filter_map(|b| self.bindings.get(b).map(|e| e.resource.clone()))
            .collect()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Live toplevels in creation order.
    pub fn toplevels(&self) -> impl Iterator<Item = ToplevelId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, toplevel: ToplevelId) -> bool {
        self.toplevels.contains_key(&toplevel)
    }

    pub(super) fn check_owner(&self, handle: &ToplevelHandle) {
        assert_eq!(
            handle.manager_serial(),
            self.serial,
            "{} belongs to a different toplevel manager",
            handle.id()
        );
    }
}

impl<G: GlobalBinding> Default for Manager<G> {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl<G: GlobalBinding> Drop for Manager<G> {
    fn drop(&mut self) {
        self.teardown();
    }
}
