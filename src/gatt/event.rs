use tokio::sync::mpsc;
use tracing::trace;

use crate::att::Handle;
use crate::Uuid;

use super::{Attr, Prop};

/// Transport callback. Every callback that a transport delivers to the GATT
/// client core is represented by one event and applied through
/// [`Controller::handle_event`](super::Controller::handle_event), either
/// directly or via the controller's mailbox.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Event {
    /// The connection to the peripheral was established.
    Connected,
    /// The connection to the peripheral was lost. All services become invalid.
    Disconnected,
    /// Service `svc` includes service `uuid`.
    Included { svc: Uuid, uuid: Uuid },
    /// Characteristic discovered in service `svc`.
    Characteristic {
        svc: Uuid,
        hdl: Handle,
        uuid: Uuid,
        props: Prop,
    },
    /// Descriptor of characteristic `char_hdl` discovered in service `svc`.
    Descriptor {
        svc: Uuid,
        char_hdl: Handle,
        hdl: Handle,
        uuid: Uuid,
    },
    /// All attributes of service `svc` were delivered.
    EnumerationComplete { svc: Uuid },
    /// Write of `val` to `attr` was acknowledged by the peripheral.
    WriteConfirmed { svc: Uuid, attr: Attr, val: Vec<u8> },
    /// Write to `attr` failed.
    WriteFailed { svc: Uuid, attr: Attr },
    /// Characteristic value notified or indicated by the peripheral.
    ValueChanged { svc: Uuid, hdl: Handle, val: Vec<u8> },
}

impl Event {
    /// Returns the service that the event refers to, if any.
    #[must_use]
    pub fn service(&self) -> Option<Uuid> {
        use Event::*;
        match *self {
            Connected | Disconnected => None,
            Included { svc, .. }
            | Characteristic { svc, .. }
            | Descriptor { svc, .. }
            | EnumerationComplete { svc }
            | WriteConfirmed { svc, .. }
            | WriteFailed { svc, .. }
            | ValueChanged { svc, .. } => Some(svc),
        }
    }
}

/// Sending half of a controller mailbox. Transports use this to marshal
/// callbacks from OS threads onto the controller's serialized event
/// processing.
#[derive(Clone, Debug)]
pub struct EventSender(pub(super) mpsc::UnboundedSender<Event>);

impl EventSender {
    /// Queues an event for the controller. Returns `false` if the controller
    /// was dropped.
    #[inline]
    pub fn send(&self, e: Event) -> bool {
        trace!("Queued {e:?}");
        self.0.send(e).is_ok()
    }
}
