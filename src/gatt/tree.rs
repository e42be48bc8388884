use std::collections::BTreeMap;

use tracing::{trace, warn};

use crate::att::Handle;
use crate::Uuid;

use super::Prop;

/// Attribute tree of one service session.
///
/// Characteristics are keyed by handle and each owns its descriptors, also
/// keyed by handle. Entries are never removed; the tree mirrors the
/// peripheral's attribute table for the lifetime of one connection.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AttrTree {
    chars: BTreeMap<Handle, CharRecord>,
}

impl AttrTree {
    /// Creates an empty tree.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chars: BTreeMap::new(),
        }
    }

    /// Inserts a characteristic. An existing entry with the same handle is
    /// updated in place and keeps its cached value and descriptors.
    pub fn insert_characteristic(&mut self, hdl: Handle, uuid: Uuid, props: Prop) {
        trace!("Characteristic {hdl} <{uuid}> {props:?}");
        (self.chars.entry(hdl))
            .and_modify(|c| {
                c.uuid = uuid;
                c.props = props;
            })
            .or_insert_with(|| CharRecord::new(uuid, props));
    }

    /// Inserts a descriptor of characteristic `char_hdl`. Returns `false` if
    /// the characteristic is unknown.
    pub fn insert_descriptor(&mut self, char_hdl: Handle, hdl: Handle, uuid: Uuid) -> bool {
        let Some(c) = self.chars.get_mut(&char_hdl) else {
            warn!("Descriptor {hdl} <{uuid}> for unknown characteristic {char_hdl}");
            return false;
        };
        trace!("Descriptor {hdl} <{uuid}> of {char_hdl}");
        (c.descs.entry(hdl))
            .and_modify(|d| d.uuid = uuid)
            .or_insert_with(|| DescRecord::new(uuid));
        true
    }

    /// Sets the cached characteristic value. Returns `false` if the
    /// characteristic is unknown.
    pub fn set_characteristic_value(&mut self, hdl: Handle, val: &[u8]) -> bool {
        self.chars.get_mut(&hdl).map_or(false, |c| {
            set(&mut c.val, val);
            true
        })
    }

    /// Sets the cached descriptor value. Returns `false` if the descriptor is
    /// unknown.
    pub fn set_descriptor_value(&mut self, char_hdl: Handle, hdl: Handle, val: &[u8]) -> bool {
        (self.chars.get_mut(&char_hdl))
            .and_then(|c| c.descs.get_mut(&hdl))
            .map_or(false, |d| {
                set(&mut d.val, val);
                true
            })
    }

    /// Returns the handle of the first characteristic with the specified UUID
    /// in handle order.
    #[must_use]
    pub fn characteristic_by_uuid(&self, uuid: Uuid) -> Option<Handle> {
        (self.chars.iter()).find_map(|(&hdl, c)| (c.uuid == uuid).then_some(hdl))
    }

    /// Returns all characteristic handles in ascending order.
    #[inline]
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.chars.keys().copied()
    }

    /// Returns all characteristics in ascending handle order.
    #[inline]
    pub fn characteristics(&self) -> impl Iterator<Item = (Handle, &CharRecord)> {
        self.chars.iter().map(|(&hdl, c)| (hdl, c))
    }

    /// Returns the characteristic with the specified handle.
    #[inline]
    #[must_use]
    pub fn characteristic(&self, hdl: Handle) -> Option<&CharRecord> {
        self.chars.get(&hdl)
    }

    /// Returns descriptor `hdl` of characteristic `char_hdl`.
    #[inline]
    #[must_use]
    pub fn descriptor(&self, char_hdl: Handle, hdl: Handle) -> Option<&DescRecord> {
        (self.chars.get(&char_hdl)).and_then(|c| c.descs.get(&hdl))
    }

    /// Returns the number of characteristics.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Returns whether the tree has no characteristics.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// Discovered characteristic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CharRecord {
    uuid: Uuid,
    props: Prop,
    val: Vec<u8>,
    descs: BTreeMap<Handle, DescRecord>,
}

impl CharRecord {
    #[inline]
    const fn new(uuid: Uuid, props: Prop) -> Self {
        Self {
            uuid,
            props,
            val: Vec::new(),
            descs: BTreeMap::new(),
        }
    }

    /// Returns the characteristic UUID.
    #[inline(always)]
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the characteristic properties.
    #[inline(always)]
    #[must_use]
    pub const fn properties(&self) -> Prop {
        self.props
    }

    /// Returns the cached value.
    #[inline(always)]
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.val
    }

    /// Returns all descriptors in ascending handle order.
    #[inline]
    pub fn descriptors(&self) -> impl Iterator<Item = (Handle, &DescRecord)> {
        self.descs.iter().map(|(&hdl, d)| (hdl, d))
    }
}

/// Discovered characteristic descriptor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DescRecord {
    uuid: Uuid,
    val: Vec<u8>,
}

impl DescRecord {
    #[inline]
    const fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            val: Vec::new(),
        }
    }

    /// Returns the descriptor UUID.
    #[inline(always)]
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the cached value.
    #[inline(always)]
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.val
    }
}

/// Replaces a cached value, reusing its allocation.
#[inline]
fn set(dst: &mut Vec<u8>, src: &[u8]) {
    dst.clear();
    dst.extend_from_slice(src);
}
