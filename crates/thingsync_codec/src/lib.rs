//! # thingsync Codec
//!
//! Streaming CBOR encoding/decoding for the thingsync wire format.
//!
//! This crate provides the byte-level layer under the property wire
//! protocol:
//! - a pull-based [`Reader`] that walks one data item at a time, tolerates
//!   both definite and indefinite-length containers, and normalizes every
//!   numeric wire representation (integer, half, single, double) to `f64`
//! - a [`Writer`] that encodes into a caller-provided fixed-size buffer
//!   with shortest-form integer encoding and no allocation
//!
//! It is not a general-purpose CBOR library. Byte strings, tags and deep
//! nesting are only ever skipped, never materialized; recursion while
//! skipping is bounded.
//!
//! ## Usage
//!
//! ```
//! use thingsync_codec::{Reader, Writer};
//!
//! let mut buf = [0u8; 16];
//! let mut writer = Writer::new(&mut buf);
//! writer.map_header(1).unwrap();
//! writer.integer(0).unwrap();
//! writer.text("on").unwrap();
//! let len = writer.position();
//!
//! let mut reader = Reader::new(&buf[..len]);
//! assert_eq!(reader.map_header().unwrap(), Some(1));
//! assert_eq!(reader.read_integer().unwrap(), 0);
//! assert_eq!(reader.read_text().unwrap(), "on");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod reader;
mod writer;

pub use error::{CodecError, CodecResult};
pub use reader::{half_to_f64, ItemKind, Reader};
pub use writer::Writer;
