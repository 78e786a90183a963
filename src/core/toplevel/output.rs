//! Output membership tracking.

use super::state::OutputId;

/// The set of outputs a toplevel is currently shown on.
///
/// Entering an output twice or leaving one that was never entered is a
/// no-op; both report whether anything changed so the caller only schedules
/// a flush for effective transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputMembership {
    outputs: Vec<OutputId>,
}

impl OutputMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, output: OutputId) -> bool {
        if self.contains(output) {
            return false;
        }
        self.outputs.push(output);
        true
    }

    pub fn leave(&mut self, output: OutputId) -> bool {
        let before = self.outputs.len();
        self.outputs.retain(|o| *o != output);
        self.outputs.len() != before
    }

    pub fn contains(&self, output: OutputId) -> bool {
        self.outputs.contains(&output)
    }

    pub fn iter(&self) -> impl Iterator<Item = OutputId> + '_ {
        self.outputs.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Net difference from `announced` to `self`: outputs to leave, then
    /// outputs to enter.
    pub fn diff(&self, announced: &OutputMembership) -> (Vec<OutputId>, Vec<OutputId>) {
        let left = announced.iter().filter(|o| !self.contains(*o)).collect();
        let entered = self.iter().filter(|o| !announced.contains(*o)).collect();
        (left, entered)
    }
}
