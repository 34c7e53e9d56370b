//! # thingsync Wire Protocol
//!
//! CBOR wire codec for property synchronization.
//!
//! Outbound, [`encode`] walks a
//! [`PropertyContainer`](thingsync_core::PropertyContainer), selects the
//! properties whose publish policy makes them due, and serializes them
//! into an array of flat maps. Inbound, [`decode`] runs an explicit
//! state machine over such an array, groups attribute updates per
//! property, and applies them to the container — either directly (live
//! messages) or through each property's conflict-resolution policy
//! (full-state sync messages after reconnection).
//!
//! Both calls complete in one pass with bounded memory and report errors
//! as return values; neither panics across the codec boundary.
//!
//! ## Usage
//!
//! ```
//! use thingsync_core::{Permission, PropertyContainer};
//! use thingsync_wire::{decode, encode, EncodeOptions};
//!
//! let mut container = PropertyContainer::new();
//! container.add("temperature", 21.5f32, Permission::ReadWrite);
//!
//! let mut buf = [0u8; 128];
//! let len = encode(&mut container, &mut buf, EncodeOptions::default(), 0).unwrap();
//! assert!(len > 0);
//!
//! // A transport would carry the bytes to the peer; here we loop back.
//! decode(&mut container, &buf[..len], false).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decode;
mod encode;
mod handle;
mod keys;
mod record;

pub use decode::{decode, DecodeError};
pub use encode::{encode, EncodeError, EncodeOptions};
pub use handle::SyncHandle;
pub use keys::{MapKey, ProtocolVersion};
pub use record::MapRecord;
