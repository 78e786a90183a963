//! Per-toplevel state and the compositor-facing mutators.

use super::binding::{GlobalBinding, ToplevelBinding};
use super::manager::Manager;
use super::output::OutputMembership;
use super::request::{
    ActivateEvent, CloseEvent, FullscreenEvent, MaximizeEvent, MinimizeEvent, MoveEvent,
    RectangleEvent, ToplevelListeners,
};
use super::state::{BindingId, OutputId, ToplevelId, ToplevelState};
use crate::util::logging::TOPLEVEL;

/// The compositor's token for one managed toplevel.
///
/// Not `Clone`: [`Manager::destroy_handle`] consumes it, so a destroyed
/// toplevel cannot be mutated again through the same token. Using a token
/// with a different manager, or after the manager itself was destroyed,
/// panics.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping the handle leaks the toplevel until the manager is destroyed"]
pub struct ToplevelHandle {
    id: ToplevelId,
    manager: u32,
}

impl ToplevelHandle {
    pub(super) fn new(id: ToplevelId, manager: u32) -> Self {
        Self { id, manager }
    }

    pub fn id(&self) -> ToplevelId {
        self.id
    }

    pub(super) fn manager_serial(&self) -> u32 {
        self.manager
    }
}

/// Manager-side record of a toplevel.
pub(crate) struct Toplevel<G: GlobalBinding> {
    pub title: Option<String>,
    pub app_id: Option<String>,
    pub state: ToplevelState,
    /// Non-owning; always a live toplevel of the same manager.
    pub parent: Option<ToplevelId>,
    pub outputs: OutputMembership,
    /// An attribute changed since the last flush.
    pub dirty: bool,
    pub bindings: Vec<BindingId>,
    pub listeners: ToplevelListeners<G::Seat, G::Surface>,
}

impl<G: GlobalBinding> Toplevel<G> {
    pub fn new() -> Self {
        Self {
            title: None,
            app_id: None,
            state: ToplevelState::empty(),
            parent: None,
            outputs: OutputMembership::new(),
            dirty: false,
            bindings: Vec::new(),
            listeners: ToplevelListeners::default(),
        }
    }
}

impl<G: GlobalBinding> Manager<G> {
    fn record_mut(&mut self, handle: &ToplevelHandle) -> &mut Toplevel<G> {
        self.check_owner(handle);
        match self.toplevels.get_mut(&handle.id) {
            Some(record) => record,
            None => panic!("{} used after it was destroyed", handle.id),
        }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    pub fn set_title(&mut self, handle: &ToplevelHandle, title: impl Into<String>) {
        let title = title.into();
        let suppress = self.config.suppress_redundant;
        let record = self.record_mut(handle);
        if suppress && record.title.as_deref() == Some(title.as_str()) {
            return;
        }
        record.title = Some(title.clone());
        tracing::debug!("{} title: {:?}", handle.id, title);

        self.broadcast(handle.id, |b| b.send_title(&title));
        self.mark_changed(handle.id);
    }

    pub fn set_app_id(&mut self, handle: &ToplevelHandle, app_id: impl Into<String>) {
        let app_id = app_id.into();
        let suppress = self.config.suppress_redundant;
        let record = self.record_mut(handle);
        if suppress && record.app_id.as_deref() == Some(app_id.as_str()) {
            return;
        }
        record.app_id = Some(app_id.clone());
        tracing::debug!("{} app_id: {:?}", handle.id, app_id);

        self.broadcast(handle.id, |b| b.send_app_id(&app_id));
        self.mark_changed(handle.id);
    }

    pub fn set_maximized(&mut self, handle: &ToplevelHandle, maximized: bool) {
        self.set_state_flag(handle, ToplevelState::MAXIMIZED, maximized);
    }

    pub fn set_minimized(&mut self, handle: &ToplevelHandle, minimized: bool) {
        self.set_state_flag(handle, ToplevelState::MINIMIZED, minimized);
    }

    pub fn set_activated(&mut self, handle: &ToplevelHandle, activated: bool) {
        self.set_state_flag(handle, ToplevelState::ACTIVATED, activated);
    }

    pub fn set_fullscreen(&mut self, handle: &ToplevelHandle, fullscreen: bool) {
        self.set_state_flag(handle, ToplevelState::FULLSCREEN, fullscreen);
    }

    fn set_state_flag(&mut self, handle: &ToplevelHandle, flag: ToplevelState, on: bool) {
        let mut state = self.record_mut(handle).state;
        state.set(flag, on);
        self.set_state(handle, state);
    }

    /// Replace the whole flag set. Clients always receive the full set.
    pub fn set_state(&mut self, handle: &ToplevelHandle, state: ToplevelState) {
        let suppress = self.config.suppress_redundant;
        let record = self.record_mut(handle);
        if suppress && record.state == state {
            return;
        }
        record.state = state;
        tracing::debug!("{} state: {:?}", handle.id, state);

        self.broadcast(handle.id, |b| b.send_state(state));
        self.mark_changed(handle.id);
    }

    // =========================================================================
    // Outputs
    // =========================================================================

    /// Mark the toplevel as shown on `output`. Clients learn about it on the
    /// next idle flush.
    pub fn output_enter(&mut self, handle: &ToplevelHandle, output: OutputId) {
        if self.record_mut(handle).outputs.enter(output) {
            self.schedule_flush(handle.id);
        }
    }

    pub fn output_leave(&mut self, handle: &ToplevelHandle, output: OutputId) {
        if self.record_mut(handle).outputs.leave(output) {
            self.schedule_flush(handle.id);
        }
    }

    // =========================================================================
    // Parent
    // =========================================================================

    /// Set or clear the parent toplevel.
    ///
    /// Only clients holding bindings to both the child and the parent (the
    /// previous parent, when clearing) are told.
    ///
    /// # Panics
    ///
    /// If `parent` is the toplevel itself or comes from another manager.
    pub fn set_parent(&mut self, handle: &ToplevelHandle, parent: Option<&ToplevelHandle>) {
        let parent_id = parent.map(|p| {
            self.check_owner(p);
            assert!(self.toplevels.contains_key(&p.id), "{} used after it was destroyed", p.id);
            p.id
        });
        assert_ne!(Some(handle.id), parent_id, "{} cannot be its own parent", handle.id);

        let record = self.record_mut(handle);
        if record.parent == parent_id {
            return;
        }
        let previous = std::mem::replace(&mut record.parent, parent_id);
        tracing::debug!("{} parent: {:?} -> {:?}", handle.id, previous, parent_id);

        let witnesses = match parent_id.or(previous) {
            Some(known) => self.resources_of(known),
            None => Vec::new(),
        };
        self.send_parent_filtered(handle.id, parent_id.is_some(), &witnesses);
        self.mark_changed(handle.id);
    }

    /// Send `parent` to each binding of `child` whose client also appears in
    /// `witnesses`. With `to_parent` the witness itself is the new parent
    /// reference; otherwise the event carries no parent.
    fn send_parent_filtered(&mut self, child: ToplevelId, to_parent: bool, witnesses: &[G::Toplevel]) {
        self.broadcast(child, |binding| {
            let Some(witness) = witnesses.iter().find(|w| w.is_alive() && w.same_client(binding)) else {
                return;
            };
            binding.send_parent(if to_parent { Some(witness) } else { None });
        });
    }

    // =========================================================================
    // Destruction
    // =========================================================================

    /// Destroy the toplevel: notify listeners, send `closed` to every
    /// binding, cancel the pending flush and detach children.
    pub fn destroy_handle(&mut self, handle: ToplevelHandle) {
        self.check_owner(&handle);
        assert!(self.toplevels.contains_key(&handle.id), "{} destroyed twice", handle.id);
        self.destroy_toplevel(handle.id);
    }

    pub(super) fn destroy_toplevel(&mut self, id: ToplevelId) {
        self.order.retain(|t| *t != id);
        let Some(listener) = self.toplevels.get_mut(&id).map(|r| r.listeners.destroy.take()) else {
            return;
        };
        if let Some(listener) = listener {
            listener(id);
        }

        // Keep the closed resources around: they decide who hears about
        // orphaned children below.
        let mut former = Vec::new();
        for binding in self.live_bindings(id) {
            if let Some(entry) = self.bindings.remove(binding) {
                entry.resource.send_closed();
                former.push(entry.resource);
            }
        }

        self.idle.cancel(id);
        self.toplevels.remove(&id);

        let children: Vec<ToplevelId> = self
            .order
            .iter()
            .copied()
            .filter(|c| self.toplevels.get(c).is_some_and(|r| r.parent == Some(id)))
            .collect();
        for child in &children {
            if let Some(record) = self.toplevels.get_mut(child) {
                record.parent = None;
            }
            self.send_parent_filtered(*child, false, &former);
            self.mark_changed(*child);
        }

        crate::wlog!(TOPLEVEL, "Destroyed {} ({} bindings, {} children)", id, former.len(), children.len());
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    pub fn on_request_maximize(&mut self, handle: &ToplevelHandle, f: impl FnMut(&MaximizeEvent) + 'static) {
        self.record_mut(handle).listeners.maximize = Some(Box::new(f));
    }

    pub fn on_request_minimize(&mut self, handle: &ToplevelHandle, f: impl FnMut(&MinimizeEvent) + 'static) {
        self.record_mut(handle).listeners.minimize = Some(Box::new(f));
    }

    pub fn on_request_fullscreen(&mut self, handle: &ToplevelHandle, f: impl FnMut(&FullscreenEvent) + 'static) {
        self.record_mut(handle).listeners.fullscreen = Some(Box::new(f));
    }

    pub fn on_request_activate(
        &mut self,
        handle: &ToplevelHandle,
        f: impl FnMut(&ActivateEvent<G::Seat>) + 'static,
    ) {
        self.record_mut(handle).listeners.activate = Some(Box::new(f));
    }

    pub fn on_request_close(&mut self, handle: &ToplevelHandle, f: impl FnMut(&CloseEvent) + 'static) {
        self.record_mut(handle).listeners.close = Some(Box::new(f));
    }

    pub fn on_request_move(&mut self, handle: &ToplevelHandle, f: impl FnMut(&MoveEvent) + 'static) {
        self.record_mut(handle).listeners.move_to = Some(Box::new(f));
    }

    pub fn on_set_rectangle(
        &mut self,
        handle: &ToplevelHandle,
        f: impl FnMut(&RectangleEvent<G::Surface>) + 'static,
    ) {
        self.record_mut(handle).listeners.rectangle = Some(Box::new(f));
    }

    /// Called once, at the start of [`destroy_handle`](Self::destroy_handle).
    pub fn on_handle_destroy(&mut self, handle: &ToplevelHandle, f: impl FnOnce(ToplevelId) + 'static) {
        self.record_mut(handle).listeners.destroy = Some(Box::new(f));
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn title(&self, toplevel: ToplevelId) -> Option<&str> {
        self.toplevels.get(&toplevel)?.title.as_deref()
    }

    pub fn app_id(&self, toplevel: ToplevelId) -> Option<&str> {
        self.toplevels.get(&toplevel)?.app_id.as_deref()
    }

    pub fn state(&self, toplevel: ToplevelId) -> Option<ToplevelState> {
        self.toplevels.get(&toplevel).map(|r| r.state)
    }

    pub fn parent(&self, toplevel: ToplevelId) -> Option<ToplevelId> {
        self.toplevels.get(&toplevel)?.parent
    }

    pub fn outputs(&self, toplevel: ToplevelId) -> Vec<OutputId> {
        self.toplevels
            .get(&toplevel)
            .map(|r| r.outputs.iter().collect())
            .unwrap_or_default()
    }

    pub fn binding_count(&self, toplevel: ToplevelId) -> usize {
        self.toplevels.get(&toplevel).map_or(0, |r| r.bindings.len())
    }
}
