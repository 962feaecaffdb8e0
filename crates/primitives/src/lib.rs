//! Shared data model for nihao.
//!
//! Everything here is plain data: peer addresses, purpose tags, account keys,
//! protocol events and the capability records produced by probing a relay.
//! No I/O happens in this crate.

pub mod account;
pub mod address;
pub mod capability;
pub mod event;
pub mod purpose;
