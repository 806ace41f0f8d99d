//! Test suites for the bobbin host.

mod session_behaviour;
pub(crate) mod support;
