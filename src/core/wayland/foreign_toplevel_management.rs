//! box_foreign_toplevel_manager_v1 / box_foreign_toplevel_handle_v1
//!
//! Wayland glue for [`Manager`]: protocol resources implement the binding
//! traits, and client requests are decoded into [`ToplevelRequest`]s.
//!
//! A compositor embeds [`ForeignToplevelManagerState`] in its state type,
//! implements [`ForeignToplevelHandler`] and calls
//! [`delegate_foreign_toplevel!`](crate::delegate_foreign_toplevel).

use std::marker::PhantomData;
use std::sync::OnceLock;

use wayland_server::backend::{ClientId, GlobalId as WlGlobalId};
use wayland_server::protocol::wl_output::WlOutput;
use wayland_server::protocol::wl_seat::WlSeat;
use wayland_server::protocol::wl_surface::WlSurface;
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource};

use crate::config::ManagerConfig;
use crate::core::errors::{CoreError, Result};
use crate::core::toplevel::{
    BindingId, GlobalBinding, GlobalId, Manager, OutputId, ToplevelBinding, ToplevelId,
    ToplevelRequest, ToplevelState,
};
use crate::core::wayland::output::OutputResources;
use crate::core::wayland::protocol::box_foreign_toplevel_handle_v1::{
    self, BoxForeignToplevelHandleV1,
};
use crate::core::wayland::protocol::box_foreign_toplevel_manager_v1::{
    self, BoxForeignToplevelManagerV1,
};
use crate::util::logging::WAYLAND;
use crate::wlog;

// ============================================================================
// Resource Data
// ============================================================================

/// Global data: decides which clients may see the global.
pub struct ToplevelGlobalData {
    filter: Box<dyn Fn(&Client) -> bool + Send + Sync>,
}

/// User data of a manager resource.
#[derive(Debug, Default)]
pub struct ManagerResourceData {
    global: OnceLock<GlobalId>,
}

/// User data of a handle resource.
#[derive(Debug, Clone, Copy)]
pub struct ToplevelHandleData {
    pub toplevel: ToplevelId,
    pub binding: BindingId,
}

// ============================================================================
// Bindings
// ============================================================================

/// A client's `box_foreign_toplevel_handle_v1` object.
#[derive(Debug, Clone)]
pub struct WlToplevel {
    resource: BoxForeignToplevelHandleV1,
    outputs: OutputResources,
}

impl WlToplevel {
    pub fn new(resource: BoxForeignToplevelHandleV1, outputs: OutputResources) -> Self {
        Self { resource, outputs }
    }

    pub fn resource(&self) -> &BoxForeignToplevelHandleV1 {
        &self.resource
    }

    fn client_outputs(&self, output: OutputId) -> Vec<WlOutput> {
        self.outputs.for_client(output, &self.resource.id())
    }
}

impl ToplevelBinding for WlToplevel {
    fn is_alive(&self) -> bool {
        self.resource.is_alive()
    }

    fn same_client(&self, other: &Self) -> bool {
        self.resource.id().same_client_as(&other.resource.id())
    }

    fn send_title(&self, title: &str) {
        self.resource.title(title.to_owned());
    }

    fn send_app_id(&self, app_id: &str) {
        self.resource.app_id(app_id.to_owned());
    }

    fn send_state(&self, state: ToplevelState) {
        self.resource.state(encode_state(state, self.resource.version()));
    }

    fn send_output_enter(&self, output: OutputId) -> bool {
        let objects = self.client_outputs(output);
        for object in &objects {
            self.resource.output_enter(object);
        }
        !objects.is_empty()
    }

    fn send_output_leave(&self, output: OutputId) -> bool {
        let objects = self.client_outputs(output);
        for object in &objects {
            self.resource.output_leave(object);
        }
        !objects.is_empty()
    }

    fn send_parent(&self, parent: Option<&Self>) {
        if self.resource.version() >= 3 {
            self.resource.parent(parent.map(|p| &p.resource));
        }
    }

    fn send_done(&self) {
        self.resource.done();
    }

    fn send_closed(&self) {
        self.resource.closed();
    }
}

/// Encode the flag set as the protocol's array of native-endian u32 values.
/// `fullscreen` only exists from version 2 on.
pub fn encode_state(state: ToplevelState, version: u32) -> Vec<u8> {
    use box_foreign_toplevel_handle_v1::State;

    let mut values = Vec::new();
    if state.is_maximized() {
        values.push(State::Maximized as u32);
    }
    if state.is_minimized() {
        values.push(State::Minimized as u32);
    }
    if state.is_activated() {
        values.push(State::Activated as u32);
    }
    if state.is_fullscreen() && version >= 2 {
        values.push(State::Fullscreen as u32);
    }
    values.into_iter().flat_map(u32::to_ne_bytes).collect()
}

/// `set_rectangle` sizes must not be negative. A zero size clears the hint.
pub fn valid_rectangle(width: i32, height: i32) -> bool {
    width >= 0 && height >= 0
}

/// A client's `box_foreign_toplevel_manager_v1` object.
pub struct WlManager<D> {
    resource: BoxForeignToplevelManagerV1,
    display: DisplayHandle,
    outputs: OutputResources,
    _state: PhantomData<fn() -> D>,
}

impl<D> WlManager<D> {
    pub fn new(resource: BoxForeignToplevelManagerV1, display: DisplayHandle, outputs: OutputResources) -> Self {
        Self {
            resource,
            display,
            outputs,
            _state: PhantomData,
        }
    }
}

impl<D> GlobalBinding for WlManager<D>
where
    D: Dispatch<BoxForeignToplevelHandleV1, ToplevelHandleData> + 'static,
{
    type Toplevel = WlToplevel;
    type Seat = WlSeat;
    type Surface = WlSurface;

    fn is_alive(&self) -> bool {
        self.resource.is_alive()
    }

    fn advertise(&self, toplevel: ToplevelId, binding: BindingId) -> Result<WlToplevel> {
        let client = self
            .resource
            .client()
            .ok_or_else(|| CoreError::binding_failed(toplevel, "client is gone"))?;
        let handle = client
            .create_resource::<BoxForeignToplevelHandleV1, ToplevelHandleData, D>(
                &self.display,
                self.resource.version(),
                ToplevelHandleData { toplevel, binding },
            )
            .map_err(|e| CoreError::binding_failed(toplevel, e.to_string()))?;
        self.resource.toplevel(&handle);
        Ok(WlToplevel::new(handle, self.outputs.clone()))
    }

    fn send_finished(&self) {
        self.resource.finished();
    }
}

// ============================================================================
// Compositor State
// ============================================================================

/// Compositor hook giving the dispatch code access to the manager.
pub trait ForeignToplevelHandler: Dispatch<BoxForeignToplevelHandleV1, ToplevelHandleData> + Sized + 'static {
    fn foreign_toplevel_state(&mut self) -> &mut ForeignToplevelManagerState<Self>;
}

/// The manager global plus the output lookup its bindings share.
pub struct ForeignToplevelManagerState<D>
where
    D: Dispatch<BoxForeignToplevelHandleV1, ToplevelHandleData> + 'static,
{
    manager: Manager<WlManager<D>>,
    outputs: OutputResources,
    global: WlGlobalId,
}

impl<D> ForeignToplevelManagerState<D>
where
    D: GlobalDispatch<BoxForeignToplevelManagerV1, ToplevelGlobalData>
        + Dispatch<BoxForeignToplevelHandleV1, ToplevelHandleData>
        + 'static,
{
    /// Create the global, visible to every client.
    pub fn new(display: &DisplayHandle, config: ManagerConfig) -> Self {
        Self::new_with_filter(display, config, |_| true)
    }

    /// Create the global, visible only to clients accepted by `filter`.
    pub fn new_with_filter<F>(display: &DisplayHandle, config: ManagerConfig, filter: F) -> Self
    where
        F: Fn(&Client) -> bool + Send + Sync + 'static,
    {
        let manager = Manager::new(config);
        let version = manager.config().version;
        let global = display.create_global::<D, BoxForeignToplevelManagerV1, _>(
            version,
            ToplevelGlobalData {
                filter: Box::new(filter),
            },
        );
        wlog!(WAYLAND, "Registered box_foreign_toplevel_manager_v1 (version {})", version);
        Self {
            manager,
            outputs: OutputResources::new(),
            global,
        }
    }
}

impl<D> ForeignToplevelManagerState<D>
where
    D: Dispatch<BoxForeignToplevelHandleV1, ToplevelHandleData> + 'static,
{
    pub fn manager(&mut self) -> &mut Manager<WlManager<D>> {
        &mut self.manager
    }

    pub fn manager_ref(&self) -> &Manager<WlManager<D>> {
        &self.manager
    }

    pub fn outputs(&self) -> &OutputResources {
        &self.outputs
    }

    pub fn global(&self) -> WlGlobalId {
        self.global.clone()
    }

    /// Call from the compositor's `wl_output` bind. Output events that
    /// could not reach this client before are retried.
    pub fn track_output(&mut self, output: OutputId, resource: &WlOutput) {
        self.outputs.track(output, resource);
        self.manager.output_bound(output);
    }

    /// Call when a client releases a `wl_output` object.
    pub fn forget_output_resource(&mut self, resource: &WlOutput) {
        self.outputs.forget(resource);
    }

    /// Call when an output is removed. Toplevels on it leave it; the leave
    /// events go out before the `wl_output` objects are forgotten.
    pub fn remove_output(&mut self, output: OutputId) {
        self.manager.output_destroyed(output);
        self.manager.dispatch_idle();
        self.outputs.remove_output(output);
    }

    /// Call once per event-loop iteration, before flushing clients.
    pub fn dispatch_idle(&mut self) -> usize {
        self.manager.dispatch_idle()
    }

    /// Remove the global and tear the manager down.
    pub fn destroy(self, display: &DisplayHandle) {
        display.remove_global::<D>(self.global);
        self.manager.destroy();
    }
}

// ============================================================================
// Dispatch
// ============================================================================

impl<D> GlobalDispatch<BoxForeignToplevelManagerV1, ToplevelGlobalData, D> for ForeignToplevelManagerState<D>
where
    D: GlobalDispatch<BoxForeignToplevelManagerV1, ToplevelGlobalData>
        + Dispatch<BoxForeignToplevelManagerV1, ManagerResourceData>
        + Dispatch<BoxForeignToplevelHandleV1, ToplevelHandleData>
        + ForeignToplevelHandler,
{
    fn bind(
        state: &mut D,
        handle: &DisplayHandle,
        client: &Client,
        resource: New<BoxForeignToplevelManagerV1>,
        _global_data: &ToplevelGlobalData,
        data_init: &mut DataInit<'_, D>,
    ) {
        let resource = data_init.init(resource, ManagerResourceData::default());
        wlog!(WAYLAND, "Bound box_foreign_toplevel_manager_v1 version {} for client {:?}", resource.version(), client.id());

        let toplevels = state.foreign_toplevel_state();
        let binding = WlManager::new(resource.clone(), handle.clone(), toplevels.outputs.clone());
        let id = toplevels.manager.bind_global(binding);
        if let Some(data) = resource.data::<ManagerResourceData>() {
            let _ = data.global.set(id);
        }
    }

    fn can_view(client: Client, global_data: &ToplevelGlobalData) -> bool {
        (global_data.filter)(&client)
    }
}

impl<D> Dispatch<BoxForeignToplevelManagerV1, ManagerResourceData, D> for ForeignToplevelManagerState<D>
where
    D: Dispatch<BoxForeignToplevelManagerV1, ManagerResourceData>
        + Dispatch<BoxForeignToplevelHandleV1, ToplevelHandleData>
        + ForeignToplevelHandler,
{
    fn request(
        state: &mut D,
        _client: &Client,
        _resource: &BoxForeignToplevelManagerV1,
        request: box_foreign_toplevel_manager_v1::Request,
        data: &ManagerResourceData,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
        match request {
            box_foreign_toplevel_manager_v1::Request::Stop => {
                if let Some(id) = data.global.get() {
                    state.foreign_toplevel_state().manager.stop(*id);
                }
            }
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }

    fn destroyed(state: &mut D, _client: ClientId, _resource: &BoxForeignToplevelManagerV1, data: &ManagerResourceData) {
        if let Some(id) = data.global.get() {
            state.foreign_toplevel_state().manager.unbind_global(*id);
        }
    }
}

impl<D> Dispatch<BoxForeignToplevelHandleV1, ToplevelHandleData, D> for ForeignToplevelManagerState<D>
where
    D: Dispatch<BoxForeignToplevelHandleV1, ToplevelHandleData> + ForeignToplevelHandler,
{
    fn request(
        state: &mut D,
        _client: &Client,
        resource: &BoxForeignToplevelHandleV1,
        request: box_foreign_toplevel_handle_v1::Request,
        data: &ToplevelHandleData,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
        use box_foreign_toplevel_handle_v1::Request;

        let toplevels = state.foreign_toplevel_state();
        let request = match request {
            Request::SetMaximized => ToplevelRequest::Maximize { maximized: true },
            Request::UnsetMaximized => ToplevelRequest::Maximize { maximized: false },
            Request::SetMinimized => ToplevelRequest::Minimize { minimized: true },
            Request::UnsetMinimized => ToplevelRequest::Minimize { minimized: false },
            Request::Activate { seat } => ToplevelRequest::Activate { seat },
            Request::Close => ToplevelRequest::Close,
            Request::SetRectangle { surface, x, y, width, height } => {
                if !valid_rectangle(width, height) {
                    resource.post_error(
                        box_foreign_toplevel_handle_v1::Error::InvalidRectangle,
                        "invalid rectangle passed to set_rectangle: width or height < 0",
                    );
                    return;
                }
                ToplevelRequest::SetRectangle { surface, x, y, width, height }
            }
            Request::SetFullscreen { output } => ToplevelRequest::Fullscreen {
                fullscreen: true,
                output: output.and_then(|o| toplevels.outputs.output_of(&o)),
            },
            Request::UnsetFullscreen => ToplevelRequest::Fullscreen {
                fullscreen: false,
                output: None,
            },
            Request::Move { x, y } => ToplevelRequest::Move { x, y },
            // Handled in `destroyed`.
            Request::Destroy => return,
            #[allow(unreachable_patterns)]
            _ => return,
        };

        if let Err(err) = toplevels.manager.handle_request(data.toplevel, request) {
            tracing::debug!("Ignoring request on inert handle: {}", err);
        }
    }

    fn destroyed(state: &mut D, _client: ClientId, _resource: &BoxForeignToplevelHandleV1, data: &ToplevelHandleData) {
        state.foreign_toplevel_state().manager.unbind(data.binding);
    }
}

/// Implement the protocol dispatch traits on a compositor state type that
/// implements [`ForeignToplevelHandler`].
#[macro_export]
macro_rules! delegate_foreign_toplevel {
    ($ty: ty) => {
        $crate::reexports::wayland_server::delegate_global_dispatch!($ty: [
            $crate::core::wayland::protocol::box_foreign_toplevel_manager_v1::BoxForeignToplevelManagerV1:
                $crate::core::wayland::foreign_toplevel_management::ToplevelGlobalData
        ] => $crate::core::wayland::foreign_toplevel_management::ForeignToplevelManagerState<$ty>);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::core::wayland::protocol::box_foreign_toplevel_manager_v1::BoxForeignToplevelManagerV1:
                $crate::core::wayland::foreign_toplevel_management::ManagerResourceData
        ] => $crate::core::wayland::foreign_toplevel_management::ForeignToplevelManagerState<$ty>);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::core::wayland::protocol::box_foreign_toplevel_handle_v1::BoxForeignToplevelHandleV1:
                $crate::core::wayland::foreign_toplevel_management::ToplevelHandleData
        ] => $crate::core::wayland::foreign_toplevel_management::ForeignToplevelManagerState<$ty>);
    };
}
