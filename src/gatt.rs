//! Generic Attribute Profile client ([Vol 3] Part G).
//!
//! A [`Controller`] owns one session per remote service and connection. Each
//! session moves through the [`State`] lifecycle: detail discovery is
//! requested by [`Service::discover_details`], fed by transport [`Event`]s,
//! and completed by [`Event::EnumerationComplete`]. A disconnect moves every
//! session into [`State::InvalidService`], which is never left.

pub use {
    client::*,
    consts::*,
    event::*,
    service::*,
    session::{ServiceError, ServiceEvent, SessionId, State, UNKNOWN_SERVICE},
    tree::*,
};

use crate::att::Handle;

mod client;
mod consts;
mod discover;
mod event;
mod service;
mod session;
mod tree;
mod write;

#[cfg(test)]
mod tests;

/// Error type returned by the GATT client.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("peripheral is not connected")]
    NotConnected,
    #[error("event loop is already running")]
    EventLoopRunning,
    #[error("event loop was aborted")]
    EventLoopAborted,
}

/// Common GATT client result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Writable attribute of a service session.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Attr {
    /// Characteristic value.
    Char(Handle),
    /// Descriptor `.1` of characteristic `.0`.
    Desc(Handle, Handle),
}

impl Attr {
    /// Returns the attribute handle.
    #[inline]
    #[must_use]
    pub const fn handle(self) -> Handle {
        match self {
            Self::Char(hdl) | Self::Desc(_, hdl) => hdl,
        }
    }
}
