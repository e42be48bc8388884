//! Service detail discovery.

use tracing::{debug, trace, warn};

use crate::att::Handle;
use crate::Uuid;

use super::session::Session;
use super::{Prop, ServiceError, State};

impl Session {
    /// Starts detail discovery. Returns whether the transport must be asked to
    /// enumerate the service attributes. Only the first request in the
    /// [`State::DiscoveryRequired`] state has any effect.
    pub fn begin_discovery(&mut self) -> bool {
        match self.state {
            State::DiscoveryRequired => {
                self.set_state(State::DiscoveringServices);
                true
            }
            State::InvalidService => {
                self.set_error(ServiceError::ServiceNotValid);
                false
            }
            s => {
                trace!("{} <{}>: discovery ignored in {s:?}", self.id, self.uuid);
                false
            }
        }
    }

    /// Records an included service. Returns whether `uuid` is an included
    /// service of this session.
    pub fn on_included(&mut self, uuid: Uuid) -> bool {
        if !self.accepts_discovery("include") || uuid == self.uuid {
            return false;
        }
        if !self.includes.contains(&uuid) {
            trace!("{} <{}>: includes <{uuid}>", self.id, self.uuid);
            self.includes.push(uuid);
        }
        true
    }

    /// Buffers a discovered characteristic.
    pub fn on_characteristic(&mut self, hdl: Handle, uuid: Uuid, props: Prop) {
        if self.accepts_discovery("characteristic") {
            self.tree.insert_characteristic(hdl, uuid, props);
        }
    }

    /// Buffers a discovered descriptor.
    pub fn on_descriptor(&mut self, char_hdl: Handle, hdl: Handle, uuid: Uuid) {
        if self.accepts_discovery("descriptor") {
            self.tree.insert_descriptor(char_hdl, hdl, uuid);
        }
    }

    /// Completes discovery. This is the only way to reach
    /// [`State::ServiceDiscovered`].
    pub fn on_enumeration_complete(&mut self) {
        if self.accepts_discovery("enumeration completion") {
            debug!(
                "{} <{}>: {} characteristic(s) discovered",
                self.id,
                self.uuid,
                self.tree.len()
            );
            self.set_state(State::ServiceDiscovered);
        }
    }

    /// Moves the session into the absorbing [`State::InvalidService`] state.
    /// The attribute tree is kept as a read-only snapshot.
    #[inline]
    pub fn invalidate(&mut self) {
        self.set_state(State::InvalidService);
    }

    /// Returns whether discovery results may be applied to the session.
    fn accepts_discovery(&self, what: &str) -> bool {
        let ok = self.state == State::DiscoveringServices;
        if !ok {
            warn!(
                "{} <{}>: unexpected {what} in {:?}",
                self.id, self.uuid, self.state
            );
        }
        ok
    }
}
