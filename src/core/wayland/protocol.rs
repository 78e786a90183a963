//! box-foreign-toplevel-management-unstable-v1 protocol
//!
//! Task bars, window lists, window switchers. Extends the wlr protocol of
//! the same name with a `move` request.

#![allow(
    non_upper_case_globals,
    non_camel_case_types,
    unused_imports,
    missing_docs,
    clippy::all
)]

use wayland_server;
use wayland_server::protocol::*;

pub mod __interfaces {
    use wayland_server::backend as wayland_backend;
    use wayland_server::protocol::__interfaces::*;
    wayland_scanner::generate_interfaces!("protocols/box-foreign-toplevel-management-unstable-v1.xml");
}
use self::__interfaces::*;

wayland_scanner::generate_server_code!("protocols/box-foreign-toplevel-management-unstable-v1.xml");
