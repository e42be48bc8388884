//! Transport adapter interface.
//!
//! A transport is the OS-specific layer beneath the GATT client core (BlueZ
//! over D-Bus, WinRT, Android JNI, Core Bluetooth). It performs the actual
//! radio I/O and reports results back as [`Event`]s through the controller's
//! [`EventSender`]. Requests are fire-and-forget: every request must
//! eventually be answered by a completion event or by
//! [`Event::Disconnected`].
//!
//! [`Event`]: crate::gatt::Event
//! [`EventSender`]: crate::gatt::EventSender
//! [`Event::Disconnected`]: crate::gatt::Event::Disconnected

use std::fmt::Debug;

use crate::gatt::Attr;
use crate::Uuid;

/// GATT client transport.
pub trait Transport: Debug + Send + Sync {
    /// Requests enumeration of all included services, characteristics, and
    /// descriptors of service `svc`. The transport must deliver zero or more
    /// discovery events followed by exactly one
    /// [`Event::EnumerationComplete`](crate::gatt::Event::EnumerationComplete).
    fn enumerate(&self, svc: Uuid);

    /// Requests a write of `val` to attribute `attr` of service `svc`. The
    /// outcome must be delivered as [`Event::WriteConfirmed`](crate::gatt::Event::WriteConfirmed)
    /// or [`Event::WriteFailed`](crate::gatt::Event::WriteFailed) for the same attribute.
    fn write(&self, svc: Uuid, attr: Attr, val: &[u8]);
}
