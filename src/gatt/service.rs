use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::att::Handle;
use crate::{Uuid, UuidType};

use super::session::Session;
use super::*;

/// Handle to a remote service session.
///
/// Handles are cheap to clone. All handles obtained for the same service on
/// the same connection observe the same state, attribute tree, and last
/// error. A session stays in the controller while any handle or view refers
/// to it.
#[derive(Clone)]
pub struct Service {
    ctlr: Controller,
    id: SessionId,
    uuid: Uuid,
    _ref: Arc<()>,
}

impl Service {
    #[inline]
    pub(super) fn new(ctlr: Controller, s: &Session) -> Self {
        Self {
            ctlr,
            id: s.id,
            uuid: s.uuid,
            _ref: Arc::clone(&s.refs),
        }
    }

    /// Returns the session identifier.
    #[inline(always)]
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the controller that owns the session.
    #[inline(always)]
    #[must_use]
    pub const fn controller(&self) -> &Controller {
        &self.ctlr
    }

    /// Returns the service UUID.
    #[inline(always)]
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the assigned service name or [`UNKNOWN_SERVICE`].
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.with(Session::name)
    }

    /// Returns the service type flags.
    #[must_use]
    pub fn typ(&self) -> ServiceType {
        self.with(|s| s.typ)
    }

    /// Returns the UUIDs of included services in discovery order. The list is
    /// empty until discovery reaches the included service declarations.
    #[must_use]
    pub fn included_services(&self) -> Vec<Uuid> {
        self.with(|s| s.includes.to_vec())
    }

    /// Returns the current discovery state.
    #[must_use]
    pub fn state(&self) -> State {
        self.with(|s| s.state)
    }

    /// Returns the last recorded error, if any.
    #[must_use]
    pub fn error(&self) -> Option<ServiceError> {
        self.with(|s| s.err)
    }

    /// Returns whether the service belongs to the current connection.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.with(Session::is_valid)
    }

    /// Returns all discovered characteristics in ascending handle order.
    #[must_use]
    pub fn characteristics(&self) -> Vec<Characteristic> {
        self.with(|s| {
            (s.tree.characteristics())
                .map(|(hdl, c)| Characteristic::new(self.clone(), hdl, c.uuid()))
                .collect()
        })
    }

    /// Returns the lowest-handle characteristic with the specified UUID.
    #[must_use]
    pub fn characteristic(&self, uuid: Uuid) -> Option<Characteristic> {
        (self.with(|s| s.tree.characteristic_by_uuid(uuid)))
            .map(|hdl| Characteristic::new(self.clone(), hdl, uuid))
    }

    /// Returns the characteristic with handle `hdl`.
    #[must_use]
    pub fn characteristic_at(&self, hdl: Handle) -> Option<Characteristic> {
        (self.with(|s| s.tree.characteristic(hdl).map(CharRecord::uuid)))
            .map(|uuid| Characteristic::new(self.clone(), hdl, uuid))
    }

    /// Returns whether characteristic `c` belongs to this session.
    #[must_use]
    pub fn contains_characteristic(&self, c: &Characteristic) -> bool {
        self == &c.svc && self.with(|s| s.tree.characteristic(c.hdl).is_some())
    }

    /// Returns whether descriptor `d` belongs to this session.
    #[must_use]
    pub fn contains_descriptor(&self, d: &Descriptor) -> bool {
        self == &d.svc && self.with(|s| s.tree.descriptor(d.char_hdl, d.hdl).is_some())
    }

    /// Requests discovery of included services, characteristics, and
    /// descriptors. Only the first request of a session in the
    /// [`State::DiscoveryRequired`] state reaches the transport. A request on
    /// an invalid service records [`ServiceError::ServiceNotValid`].
    #[inline]
    pub fn discover_details(&self) {
        self.ctlr.discover(self.id);
    }

    /// Writes the value of characteristic `c`. Writes to characteristics of
    /// other sessions and writes of the cached value are ignored. The cached
    /// value is updated when the transport confirms the write.
    pub fn write_characteristic(&self, c: &Characteristic, val: impl AsRef<[u8]>) {
        if !self.contains_characteristic(c) {
            debug!("{} <{}>: ignoring write to foreign {c:?}", self.id, self.uuid);
            return;
        }
        self.ctlr.write(self.id, Attr::Char(c.hdl), val.as_ref());
    }

    /// Writes the value of descriptor `d`. Same rules as
    /// [`Self::write_characteristic`] apply.
    pub fn write_descriptor(&self, d: &Descriptor, val: impl AsRef<[u8]>) {
        if !self.contains_descriptor(d) {
            debug!("{} <{}>: ignoring write to foreign {d:?}", self.id, self.uuid);
            return;
        }
        self.ctlr.write(self.id, Attr::Desc(d.char_hdl, d.hdl), val.as_ref());
    }

    /// Returns a receiver of all subsequent session events.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<ServiceEvent> {
        self.with(Session::subscribe)
    }

    /// Logs the service attribute tree.
    pub fn dump(&self) {
        macro_rules! log {
            ($hdl:expr, $fmt:expr$(, $($args:tt)*)?) => {
                info!("[{:#06X}] {}", u16::from($hdl), format_args!($fmt$(, $($args)*)?))
            };
        }
        self.with(|s| {
            info!("GATT service {} <{}> [{:?}]:", s.name(), s.uuid, s.state);
            for inc in &s.includes {
                info!("         |__ [Include <{inc}>]");
            }
            let last = s.tree.handles().last();
            for (hdl, c) in s.tree.characteristics() {
                let cont = if Some(hdl) < last { '|' } else { ' ' };
                log!(hdl, "|__ {} {:?} = {:02X?}", c.uuid(), c.properties(), c.value());
                for (dhdl, d) in c.descriptors() {
                    log!(dhdl, "{cont}   |__ {} = {:02X?}", d.uuid(), d.value());
                }
            }
        });
    }

    #[inline]
    fn with<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        self.ctlr.with_session(self.id, f)
    }
}

impl Debug for Service {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        (f.debug_struct("Service"))
            .field("id", &self.id)
            .field("uuid", &self.uuid)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Service {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.ctlr.ptr_eq(&other.ctlr)
    }
}

impl Eq for Service {}

/// Characteristic of a service session. Properties and value are read from
/// the session on each access.
#[derive(Clone)]
pub struct Characteristic {
    svc: Service,
    hdl: Handle,
    uuid: Uuid,
}

impl Characteristic {
    #[inline]
    const fn new(svc: Service, hdl: Handle, uuid: Uuid) -> Self {
        Self { svc, hdl, uuid }
    }

    /// Returns the owning service.
    #[inline(always)]
    #[must_use]
    pub const fn service(&self) -> &Service {
        &self.svc
    }

    /// Returns the characteristic value handle.
    #[inline(always)]
    #[must_use]
    pub const fn handle(&self) -> Handle {
        self.hdl
    }

    /// Returns the characteristic UUID.
    #[inline(always)]
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the assigned characteristic name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&'static str> {
        match self.uuid.typ() {
            UuidType::Characteristic(c) => Some(c.name()),
            _ => None,
        }
    }

    /// Returns the characteristic properties.
    #[must_use]
    pub fn properties(&self) -> Prop {
        self.with(CharRecord::properties).unwrap_or_default()
    }

    /// Returns the cached value.
    #[must_use]
    pub fn value(&self) -> Vec<u8> {
        self.with(|c| c.value().to_vec()).unwrap_or_default()
    }

    /// Returns all descriptors in ascending handle order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<Descriptor> {
        (self.with(|c| {
            (c.descriptors())
                .map(|(hdl, d)| Descriptor::new(self.svc.clone(), self.hdl, hdl, d.uuid()))
                .collect()
        }))
        .unwrap_or_default()
    }

    /// Returns the lowest-handle descriptor with the specified UUID.
    #[must_use]
    pub fn descriptor(&self, uuid: Uuid) -> Option<Descriptor> {
        (self.with(|c| c.descriptors().find_map(|(hdl, d)| (d.uuid() == uuid).then_some(hdl))))
            .flatten()
            .map(|hdl| Descriptor::new(self.svc.clone(), self.hdl, hdl, uuid))
    }

    /// Returns the descriptor with handle `hdl`.
    #[must_use]
    pub fn descriptor_at(&self, hdl: Handle) -> Option<Descriptor> {
        (self.with(|c| c.descriptors().find_map(|(h, d)| (h == hdl).then_some(d.uuid()))))
            .flatten()
            .map(|uuid| Descriptor::new(self.svc.clone(), self.hdl, hdl, uuid))
    }

    fn with<R>(&self, f: impl FnOnce(&CharRecord) -> R) -> Option<R> {
        self.svc.with(|s| s.tree.characteristic(self.hdl).map(f))
    }
}

impl Debug for Characteristic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        (f.debug_struct("Characteristic"))
            .field("svc", &self.svc.id)
            .field("hdl", &self.hdl)
            .field("uuid", &self.uuid)
            .finish()
    }
}

impl PartialEq for Characteristic {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.hdl == other.hdl && self.svc == other.svc
    }
}

impl Eq for Characteristic {}

/// Descriptor of a characteristic.
#[derive(Clone)]
pub struct Descriptor {
    svc: Service,
    char_hdl: Handle,
    hdl: Handle,
    uuid: Uuid,
}

impl Descriptor {
    #[inline]
    const fn new(svc: Service, char_hdl: Handle, hdl: Handle, uuid: Uuid) -> Self {
        Self {
            svc,
            char_hdl,
            hdl,
            uuid,
        }
    }

    /// Returns the owning service.
    #[inline(always)]
    #[must_use]
    pub const fn service(&self) -> &Service {
        &self.svc
    }

    /// Returns the descriptor handle.
    #[inline(always)]
    #[must_use]
    pub const fn handle(&self) -> Handle {
        self.hdl
    }

    /// Returns the value handle of the owning characteristic.
    #[inline(always)]
    #[must_use]
    pub const fn characteristic_handle(&self) -> Handle {
        self.char_hdl
    }

    /// Returns the descriptor UUID.
    #[inline(always)]
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the assigned descriptor name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&'static str> {
        match self.uuid.typ() {
            UuidType::Descriptor(d) => Some(d.name()),
            _ => None,
        }
    }

    /// Returns the cached value.
    #[must_use]
    pub fn value(&self) -> Vec<u8> {
        (self.svc.with(|s| s.tree.descriptor(self.char_hdl, self.hdl).map(|d| d.value().to_vec())))
            .unwrap_or_default()
    }
}

impl Debug for Descriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        (f.debug_struct("Descriptor"))
            .field("svc", &self.svc.id)
            .field("char_hdl", &self.char_hdl)
            .field("hdl", &self.hdl)
            .field("uuid", &self.uuid)
            .finish()
    }
}

impl PartialEq for Descriptor {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.hdl == other.hdl && self.char_hdl == other.char_hdl && self.svc == other.svc
    }
}

impl Eq for Descriptor {}
