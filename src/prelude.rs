//! Common imports and types used throughout box-toplevel.

pub use std::collections::HashMap;

pub use crate::core::toplevel::{
    BindingId, GlobalBinding, GlobalId, Manager, OutputId, ToplevelBinding, ToplevelHandle,
    ToplevelId, ToplevelState,
};

pub type Result<T> = std::result::Result<T, crate::core::errors::CoreError>;
