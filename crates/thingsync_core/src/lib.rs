//! # thingsync Core
//!
//! Property model for device↔cloud state synchronization.
//!
//! This crate provides:
//! - [`PropertyValue`], a closed tagged union of the wire-representable
//!   value types with IEEE-754-aware difference detection
//! - [`Property`], a named value with local and cloud-shadow copies,
//!   permissions, publish/write policies and change timestamps
//! - [`PropertyContainer`], an ordered append-only registry with
//!   name and compact-identifier lookup
//! - [`SyncPolicy`], the pluggable conflict-resolution policies applied
//!   when a full-state sync message arrives after (re)connection
//!
//! Application code mutates property values through [`Property::set`];
//! the wire layer (`thingsync_wire`) reads due properties for encoding
//! and applies decoded updates to the cloud-shadow side.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod container;
mod policy;
mod property;
mod value;

pub use container::PropertyContainer;
pub use policy::{Permission, SyncPolicy, UpdatePolicy, WritePolicy};
pub use property::{Property, TimeSource, UpdateCallback};
pub use value::{PropertyValue, TypeTag};
