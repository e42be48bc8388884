//! Transport-independent Bluetooth LE GATT client core.
//!
//! Models the service tree of one remote peripheral, drives per-service
//! attribute discovery, and validates characteristic and descriptor writes.
//! OS-specific adapters (BlueZ, WinRT, Android, Core Bluetooth) implement
//! [`host::Transport`] and deliver their callbacks as [`gatt::Event`]s.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use gattc::{gatt, host, Uuid};
//! # fn run(t: Arc<dyn host::Transport>) -> gatt::Result<()> {
//! let ctlr = gatt::Controller::new(t);
//! ctlr.handle_event(gatt::Event::Connected);
//! let svc = ctlr.service(Uuid::from_u16(0x180F).unwrap())?;
//! svc.discover_details();
//! # Ok(())
//! # }
//! ```

#![warn(missing_debug_implementations)]
#![warn(non_ascii_idents)]
#![warn(single_use_lifetimes)]
#![warn(unused_crate_dependencies)]
#![warn(unused_extern_crates)]
#![warn(unused_import_braces)]
#![warn(unused_lifetimes)]
#![warn(unused_qualifications)]
#![warn(variant_size_differences)]
#![warn(clippy::cargo)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![allow(clippy::enum_glob_use)]
#![allow(clippy::inline_always)]
#![allow(clippy::module_name_repetitions)]
// #![warn(clippy::restriction)]
#![warn(clippy::assertions_on_result_states)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::decimal_literal_representation)]
#![warn(clippy::default_union_representation)]
#![warn(clippy::deref_by_slicing)]
#![warn(clippy::empty_drop)]
#![warn(clippy::empty_structs_with_brackets)]
#![warn(clippy::exhaustive_enums)]
#![warn(clippy::exit)]
#![warn(clippy::fn_to_numeric_cast_any)]
#![warn(clippy::format_push_string)]
#![warn(clippy::get_unwrap)]
#![warn(clippy::if_then_some_else_none)]
#![warn(clippy::lossy_float_literal)]
#![warn(clippy::missing_enforced_import_renames)]
#![warn(clippy::mixed_read_write_in_expression)]
#![warn(clippy::mod_module_files)]
#![warn(clippy::mutex_atomic)]
#![warn(clippy::pattern_type_mismatch)]
#![warn(clippy::print_stdout)]
#![warn(clippy::rc_buffer)]
#![warn(clippy::rc_mutex)]
#![warn(clippy::rest_pat_in_fully_bound_structs)]
//#![warn(clippy::semicolon_outside_block)]
#![warn(clippy::str_to_string)]
#![warn(clippy::string_add)]
#![warn(clippy::string_to_string)]
#![warn(clippy::suspicious_xor_used_as_pow)]
#![warn(clippy::todo)]
#![warn(clippy::try_err)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::unnecessary_safety_comment)]
#![warn(clippy::unnecessary_safety_doc)]
#![warn(clippy::unnecessary_self_imports)]
#![warn(clippy::unneeded_field_pattern)]
#![warn(clippy::unseparated_literal_suffix)]

pub use gattc_const::{Uuid, Uuid16, UuidType};

pub mod att;
pub mod gatt;
pub mod host;

#[path = "util/util.rs"]
mod util;

/// Mutex that serializes all session mutations of one controller.
pub(crate) type SyncMutex<T> = parking_lot::Mutex<T>;
