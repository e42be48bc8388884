use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use smallvec::SmallVec;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::att::Handle;
use crate::util::name_of;
use crate::Uuid;

use super::{AttrTree, ServiceType};

/// Service name returned when the UUID is not a well-known service.
pub const UNKNOWN_SERVICE: &str = "Unknown Service";

/// Service discovery state. Variants are ordered by lifecycle.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
pub enum State {
    /// Service details are not yet known. Only the UUID and name are
    /// available.
    #[default]
    DiscoveryRequired,
    /// Included services, characteristics, and descriptors are being
    /// enumerated.
    DiscoveringServices,
    /// All service details are known and attributes may be written.
    ServiceDiscovered,
    /// The connection to the peripheral was lost. The service retains the
    /// details discovered up to that point but can never become valid again.
    InvalidService,
}

/// Service errors reported through [`ServiceEvent::Error`] and the last
/// error of a session.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("service is no longer valid")]
    ServiceNotValid,
    #[error("operation is not permitted in the current service state")]
    Operation,
    #[error("characteristic write failed")]
    CharacteristicWrite,
    #[error("descriptor write failed")]
    DescriptorWrite,
}

/// Notification broadcast to every subscriber of a service session.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ServiceEvent {
    /// The service entered a new state.
    StateChanged(State),
    /// An error was recorded as the last error of the service.
    Error(ServiceError),
    /// A characteristic value changed, either by a confirmed write or by a
    /// peripheral notification.
    CharacteristicChanged { hdl: Handle, val: Vec<u8> },
    /// A descriptor value changed by a confirmed write.
    DescriptorChanged {
        char_hdl: Handle,
        hdl: Handle,
        val: Vec<u8>,
    },
}

/// Session identifier. Identifiers are never reused by a controller.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct SessionId(pub(super) u64);

impl Debug for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", name_of!(SessionId), self.0)
    }
}

impl Display for SessionId {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

/// Shared state of one remote service. Every [`Service`](super::Service)
/// obtained for the same service on the same connection refers to one
/// session.
#[derive(Debug)]
pub(super) struct Session {
    pub id: SessionId,
    pub uuid: Uuid,
    pub typ: ServiceType,
    pub includes: SmallVec<[Uuid; 2]>,
    pub state: State,
    pub tree: AttrTree,
    pub err: Option<ServiceError>,
    /// Reference held by every [`Service`](super::Service) of the session.
    pub refs: Arc<()>,
    tx: broadcast::Sender<ServiceEvent>,
}

impl Session {
    /// Creates a new session in the [`State::DiscoveryRequired`] state.
    #[must_use]
    pub fn new(id: SessionId, uuid: Uuid, typ: ServiceType, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            id,
            uuid,
            typ,
            includes: SmallVec::new(),
            state: State::default(),
            tree: AttrTree::new(),
            err: None,
            refs: Arc::new(()),
            tx,
        }
    }

    /// Returns the service name from the well-known UUID table.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self.uuid.typ() {
            crate::UuidType::Service(s) => s.name(),
            _ => UNKNOWN_SERVICE,
        }
    }

    /// Returns a new event receiver.
    #[inline]
    pub fn subscribe(&self) -> broadcast::Receiver<ServiceEvent> {
        self.tx.subscribe()
    }

    /// Returns whether the session still belongs to a live connection.
    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        self.state != State::InvalidService
    }

    /// Returns whether the session is invalid and no longer referenced by any
    /// [`Service`](super::Service).
    #[inline]
    pub fn is_unused(&self) -> bool {
        !self.is_valid() && Arc::strong_count(&self.refs) == 1
    }

    /// Changes the session state and notifies subscribers.
    pub fn set_state(&mut self, s: State) {
        if self.state == s {
            return;
        }
        debug!("{} <{}>: {:?} -> {s:?}", self.id, self.uuid, self.state);
        self.state = s;
        self.notify(ServiceEvent::StateChanged(s));
    }

    /// Records the last error and notifies subscribers.
    pub fn set_error(&mut self, e: ServiceError) {
        warn!("{} <{}>: {e}", self.id, self.uuid);
        self.err = Some(e);
        self.notify(ServiceEvent::Error(e));
    }

    /// Broadcasts an event to all current subscribers.
    #[inline]
    pub fn notify(&self, e: ServiceEvent) {
        // An error only means that there are no subscribers
        let _ = self.tx.send(e);
    }
}
