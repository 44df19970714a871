//! Core components shipped with the host.

pub mod status;

pub use status::{status_spec, StatusComponent};
