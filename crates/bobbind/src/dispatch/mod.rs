//! Routing of editor calls to plugins.
//!
//! A call's method string is classified once into an [`InboundCall`]:
//! handshake (`poll`), introspection (`specs`), ignored (`nvim_*`), or a
//! [`CompoundMethod`] naming a plugin file, call type, and procedure. The
//! [`Dispatcher`] resolves plugins through its cache and answers every
//! request with exactly one [`Reply`].

mod binding;
mod call;
mod errors;
mod handler;
mod method;
mod response;

pub use self::call::{HANDSHAKE_METHOD, INTROSPECTION_METHOD, InboundCall, RESERVED_PREFIX};
pub use self::errors::DispatchError;
pub use self::handler::Dispatcher;
pub use self::method::{CompoundMethod, Platform, correct_drive_letter};
pub use self::response::{Reply, ResponseSink};

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
