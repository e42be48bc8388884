//! Characteristic and descriptor writes.

use tracing::{debug, trace, warn};

use crate::att::Handle;

use super::session::Session;
use super::{Attr, Prop, ServiceError, ServiceEvent, State};

impl Session {
    /// Validates a write request. Returns whether it must be submitted to the
    /// transport. Attribute ownership by the caller is checked before this is
    /// called.
    pub fn prepare_write(&mut self, attr: Attr, val: &[u8]) -> bool {
        let (cur, props) = match attr {
            Attr::Char(hdl) => match self.tree.characteristic(hdl) {
                Some(c) => (c.value(), Some(c.properties())),
                None => return false,
            },
            Attr::Desc(char_hdl, hdl) => match self.tree.descriptor(char_hdl, hdl) {
                Some(d) => (d.value(), None),
                None => return false,
            },
        };
        if cur == val {
            trace!("{} <{}>: {attr:?} already has the value", self.id, self.uuid);
            return false;
        }
        // Descriptors have no capability bits; the transport reports failures
        if self.state != State::ServiceDiscovered
            || props.map_or(false, |p| !p.contains(Prop::WRITE))
        {
            debug!(
                "{} <{}>: write to {attr:?} denied in {:?} with {props:?}",
                self.id, self.uuid, self.state
            );
            self.set_error(ServiceError::Operation);
            return false;
        }
        debug!("{} <{}>: writing {attr:?} = {val:02X?}", self.id, self.uuid);
        true
    }

    /// Applies a transport-confirmed write.
    pub fn on_write_confirmed(&mut self, attr: Attr, val: &[u8]) {
        let ok = match attr {
            Attr::Char(hdl) => self.tree.set_characteristic_value(hdl, val),
            Attr::Desc(char_hdl, hdl) => self.tree.set_descriptor_value(char_hdl, hdl, val),
        };
        if !ok {
            warn!("{} <{}>: write confirmed for unknown {attr:?}", self.id, self.uuid);
            return;
        }
        self.notify(changed(attr, val));
    }

    /// Records a transport-reported write failure. The cached value is not
    /// modified.
    pub fn on_write_failed(&mut self, attr: Attr) {
        self.set_error(match attr {
            Attr::Char(_) => ServiceError::CharacteristicWrite,
            Attr::Desc(..) => ServiceError::DescriptorWrite,
        });
    }

    /// Applies a characteristic value pushed by the peripheral.
    pub fn on_value_changed(&mut self, hdl: Handle, val: &[u8]) {
        if !self.tree.set_characteristic_value(hdl, val) {
            debug!("{} <{}>: value for unknown {hdl}", self.id, self.uuid);
            return;
        }
        trace!("{} <{}>: {hdl} = {val:02X?}", self.id, self.uuid);
        self.notify(changed(Attr::Char(hdl), val));
    }
}

/// Returns the change notification for an attribute.
#[inline]
fn changed(attr: Attr, val: &[u8]) -> ServiceEvent {
    match attr {
        Attr::Char(hdl) => ServiceEvent::CharacteristicChanged {
            hdl,
            val: val.to_vec(),
        },
        Attr::Desc(char_hdl, hdl) => ServiceEvent::DescriptorChanged {
            char_hdl,
            hdl,
            val: val.to_vec(),
        },
    }
}
