//! Line-delimited session transport between the editor and the host.
//!
//! Each line carries one JSON array in the editor's RPC shape: requests
//! `[0, msgid, method, params]`, responses `[1, msgid, error, result]`, and
//! notifications `[2, method, params]`. A [`Session`] reads frames until the
//! editor closes its end, handing requests and notifications to a
//! [`SessionHandler`], and correlates responses with calls made through its
//! [`SessionClient`].

mod client;
mod errors;
mod handler;
mod message;
mod session;
#[cfg(test)]
pub(crate) mod test_utils;
mod writer;

pub use self::client::SessionClient;
pub use self::errors::TransportError;
pub use self::handler::SessionHandler;
pub use self::message::{Message, MessageKind};
pub use self::session::{MAX_FRAME_BYTES, Session, UNANSWERED_REQUEST};

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
