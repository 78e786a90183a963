//! Per-client `wl_output` resources.
//!
//! The core names outputs by [`OutputId`]; `output_enter`/`output_leave`
//! need the `wl_output` object the receiving client bound. The compositor
//! reports each `wl_output` bind here and the handle glue looks the
//! resources up per client when it sends output events.

use std::cell::RefCell;
use std::rc::Rc;

use wayland_server::backend::ObjectId;
use wayland_server::protocol::wl_output::WlOutput;
use wayland_server::Resource;

use crate::core::toplevel::OutputId;

#[derive(Debug, Clone, Default)]
pub struct OutputResources {
    inner: Rc<RefCell<Vec<(OutputId, WlOutput)>>>,
}

impl OutputResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a client's `wl_output` object for `output`.
    pub fn track(&self, output: OutputId, resource: &WlOutput) {
        let mut inner = self.inner.borrow_mut();
        inner.retain(|(_, r)| r.is_alive());
        if !inner.iter().any(|(_, r)| r == resource) {
            inner.push((output, resource.clone()));
        }
    }

    /// Forget one `wl_output` object, e.g. on `release`.
    pub fn forget(&self, resource: &WlOutput) {
        self.inner.borrow_mut().retain(|(_, r)| r != resource);
    }

    /// Forget every object of a removed output.
    pub fn remove_output(&self, output: OutputId) -> usize {
        let mut inner = self.inner.borrow_mut();
        let before = inner.len();
        inner.retain(|(o, _)| *o != output);
        before - inner.len()
    }

    /// The live objects for `output` owned by the client that owns `like`.
    pub fn for_client(&self, output: OutputId, like: &ObjectId) -> Vec<WlOutput> {
        self.inner
            .borrow()
            .iter()
            .filter(|(o, r)| *o == output && r.is_alive() && r.id().same_client_as(like))
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Which output a client's `wl_output` object stands for.
    pub fn output_of(&self, resource: &WlOutput) -> Option<OutputId> {
        self.inner
            .borrow()
            .iter()
            .find(|(_, r)| r == resource)
            .map(|(o, _)| *o)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}
