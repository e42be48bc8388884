//! Attribute Protocol ([Vol 3] Part F) types shared by GATT clients and
//! transports.

pub use handle::*;

mod handle;
