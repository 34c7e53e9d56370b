//! Outbound wire encoder.

use thingsync_codec::{CodecError, Writer};
use thingsync_core::{Property, PropertyContainer, PropertyValue};
use thiserror::Error;
use tracing::debug;

use crate::keys::{MapKey, ProtocolVersion};

/// Errors that can occur while encoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The destination buffer cannot hold the encoded payload.
    #[error("destination buffer too small")]
    BufferTooSmall,

    /// Unexpected low-level codec failure.
    #[error("codec failure: {0}")]
    Codec(CodecError),
}

impl From<CodecError> for EncodeError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::BufferTooSmall => EncodeError::BufferTooSmall,
            other => EncodeError::Codec(other),
        }
    }
}

/// Options controlling the outbound representation.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeOptions {
    /// Encode packed `(property, attribute)` identifiers in place of
    /// property names to shrink the payload.
    pub light_payload: bool,
    /// Map-key scheme to emit.
    pub protocol: ProtocolVersion,
}

/// Encode every due, cloud-readable property into `buf`.
///
/// Walks the container in registration order and appends one map per
/// property whose publish policy fires at `now_ms`. Returns the number
/// of bytes written, or `Ok(0)` when no property is due — an empty pass
/// is not an error. On success every included property is marked
/// encoded; on failure none is, so the next pass retries the same set.
pub fn encode(
    container: &mut PropertyContainer,
    buf: &mut [u8],
    opts: EncodeOptions,
    now_ms: u64,
) -> Result<usize, EncodeError> {
    let is_due = |p: &Property| p.permission().cloud_readable() && p.should_be_encoded(now_ms);

    let due = container.iter().filter(|p| is_due(p)).count();
    if due == 0 {
        return Ok(0);
    }

    let mut writer = Writer::new(buf);
    writer.begin_indefinite_array()?;
    for property in container.iter().filter(|p| is_due(p)) {
        append_property(&mut writer, property, opts)?;
    }
    writer.break_marker()?;
    let bytes = writer.position();

    for property in container.iter_mut() {
        if is_due(property) {
            property.mark_encoded(now_ms);
        }
    }

    debug!(properties = due, bytes, "encoded property updates");
    Ok(bytes)
}

fn append_property(
    writer: &mut Writer<'_>,
    property: &Property,
    opts: EncodeOptions,
) -> Result<(), EncodeError> {
    let entries = if property.timestamp_enabled() { 3 } else { 2 };
    writer.map_header(entries)?;

    write_key(writer, MapKey::Name, opts.protocol)?;
    if opts.light_payload {
        writer.integer(i64::from(property.packed_identifier()))?;
    } else {
        writer.text(property.name())?;
    }

    match property.value() {
        PropertyValue::Bool(b) => {
            write_key(writer, MapKey::BooleanValue, opts.protocol)?;
            writer.boolean(*b)?;
        }
        PropertyValue::Int(n) => {
            write_key(writer, MapKey::Value, opts.protocol)?;
            writer.integer(i64::from(*n))?;
        }
        PropertyValue::Float(v) => {
            write_key(writer, MapKey::Value, opts.protocol)?;
            writer.float32(*v)?;
        }
        PropertyValue::Str(s) => {
            write_key(writer, MapKey::StringValue, opts.protocol)?;
            writer.text(s)?;
        }
    }

    if property.timestamp_enabled() {
        write_key(writer, MapKey::Time, opts.protocol)?;
        writer.unsigned(property.timestamp())?;
    }
    Ok(())
}

fn write_key(
    writer: &mut Writer<'_>,
    key: MapKey,
    protocol: ProtocolVersion,
) -> Result<(), EncodeError> {
    match protocol {
        ProtocolVersion::V1 => writer.text(key.text_label())?,
        ProtocolVersion::V2 => writer.integer(key.integer_code())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use thingsync_core::Permission;

    fn encode_to_vec(container: &mut PropertyContainer, opts: EncodeOptions, now: u64) -> Vec<u8> {
        let mut buf = [0u8; 256];
        let len = encode(container, &mut buf, opts, now).unwrap();
        buf[..len].to_vec()
    }

    #[test]
    fn encode_bool_property() {
        let mut container = PropertyContainer::new();
        container.add("test", true, Permission::ReadWrite);

        // [{0: "test", 4: true}]
        assert_eq!(
            encode_to_vec(&mut container, EncodeOptions::default(), 0),
            vec![0x9f, 0xa2, 0x00, 0x64, b't', b'e', b's', b't', 0x04, 0xf5, 0xff]
        );
    }

    #[test]
    fn encode_int_property() {
        let mut container = PropertyContainer::new();
        container.add("test", 7, Permission::ReadWrite);

        // [{0: "test", 2: 7}]
        assert_eq!(
            encode_to_vec(&mut container, EncodeOptions::default(), 0),
            vec![0x9f, 0xa2, 0x00, 0x64, b't', b'e', b's', b't', 0x02, 0x07, 0xff]
        );
    }

    #[test]
    fn encode_float_property() {
        let mut container = PropertyContainer::new();
        container.add("test", 2.0f32, Permission::ReadWrite);

        // [{0: "test", 2: 2.0_f32}]
        assert_eq!(
            encode_to_vec(&mut container, EncodeOptions::default(), 0),
            vec![
                0x9f, 0xa2, 0x00, 0x64, b't', b'e', b's', b't', 0x02, 0xfa, 0x40, 0x00, 0x00,
                0x00, 0xff
            ]
        );
    }

    #[test]
    fn encode_string_property() {
        let mut container = PropertyContainer::new();
        container.add("test", "abc", Permission::ReadWrite);

        // [{0: "test", 3: "abc"}]
        assert_eq!(
            encode_to_vec(&mut container, EncodeOptions::default(), 0),
            vec![
                0x9f, 0xa2, 0x00, 0x64, b't', b'e', b's', b't', 0x03, 0x63, b'a', b'b', b'c',
                0xff
            ]
        );
    }

    #[test]
    fn encode_light_payload_uses_packed_identifier() {
        let mut container = PropertyContainer::new();
        container.add_with_identifier("test", true, Permission::ReadWrite, 1);

        let opts = EncodeOptions {
            light_payload: true,
            ..EncodeOptions::default()
        };
        // [{0: 1, 4: true}]
        assert_eq!(
            encode_to_vec(&mut container, opts, 0),
            vec![0x9f, 0xa2, 0x00, 0x01, 0x04, 0xf5, 0xff]
        );
    }

    #[test]
    fn encode_legacy_text_keys() {
        let mut container = PropertyContainer::new();
        container.add("test", true, Permission::ReadWrite);

        let opts = EncodeOptions {
            protocol: ProtocolVersion::V1,
            ..EncodeOptions::default()
        };
        // [{"n": "test", "vb": true}]
        assert_eq!(
            encode_to_vec(&mut container, opts, 0),
            vec![
                0x9f, 0xa2, 0x61, b'n', 0x64, b't', b'e', b's', b't', 0x62, b'v', b'b', 0xf5,
                0xff
            ]
        );
    }

    #[test]
    fn encode_timestamp_field() {
        let mut container = PropertyContainer::new();
        let p = container.add("test", 7, Permission::ReadWrite);
        p.encode_timestamp();
        p.set_timestamp(1234);

        // [{0: "test", 2: 7, 6: 1234}]
        assert_eq!(
            encode_to_vec(&mut container, EncodeOptions::default(), 0),
            vec![
                0x9f, 0xa3, 0x00, 0x64, b't', b'e', b's', b't', 0x02, 0x07, 0x06, 0x19, 0x04,
                0xd2, 0xff
            ]
        );
    }

    #[test]
    fn write_only_property_is_never_encoded() {
        let mut container = PropertyContainer::new();
        container.add("test", 7, Permission::Write);

        let mut buf = [0u8; 64];
        assert_eq!(encode(&mut container, &mut buf, EncodeOptions::default(), 0), Ok(0));
    }

    #[test]
    fn nothing_due_is_not_an_error() {
        let mut container = PropertyContainer::new();
        container.add("test", 7, Permission::ReadWrite);

        let mut buf = [0u8; 64];
        assert!(encode(&mut container, &mut buf, EncodeOptions::default(), 0).unwrap() > 0);
        // Unchanged property: second pass has nothing to send
        assert_eq!(encode(&mut container, &mut buf, EncodeOptions::default(), 1), Ok(0));
    }

    #[test]
    fn buffer_too_small_reports_and_leaves_properties_due() {
        let mut container = PropertyContainer::new();
        container.add("a_rather_long_property_name", 7, Permission::ReadWrite);

        let mut small = [0u8; 8];
        assert_eq!(
            encode(&mut container, &mut small, EncodeOptions::default(), 0),
            Err(EncodeError::BufferTooSmall)
        );

        // Not marked encoded: a big enough buffer still sees it due
        let mut big = [0u8; 128];
        assert!(encode(&mut container, &mut big, EncodeOptions::default(), 0).unwrap() > 0);
    }

    #[test]
    fn multiple_properties_keep_container_order() {
        let mut container = PropertyContainer::new();
        container.add("b", 1, Permission::ReadWrite);
        container.add("a", 2, Permission::ReadWrite);

        let bytes = encode_to_vec(&mut container, EncodeOptions::default(), 0);
        // [{0:"b",2:1},{0:"a",2:2}] — registration order, not sorted
        assert_eq!(
            bytes,
            vec![
                0x9f, 0xa2, 0x00, 0x61, b'b', 0x02, 0x01, 0xa2, 0x00, 0x61, b'a', 0x02, 0x02,
                0xff
            ]
        );
    }

    #[test]
    fn composite_sub_properties_encode_as_separate_maps() {
        let mut container = PropertyContainer::new();
        container.add_with_identifier("color:hue", 2.0f32, Permission::ReadWrite, 1);
        container.add("color:sat", 2.0f32, Permission::ReadWrite);

        let opts = EncodeOptions {
            light_payload: true,
            ..EncodeOptions::default()
        };
        // [{0: 257, 2: 2.0}, {0: 513, 2: 2.0}]
        assert_eq!(
            encode_to_vec(&mut container, opts, 0),
            vec![
                0x9f, 0xa2, 0x00, 0x19, 0x01, 0x01, 0x02, 0xfa, 0x40, 0x00, 0x00, 0x00, 0xa2,
                0x00, 0x19, 0x02, 0x01, 0x02, 0xfa, 0x40, 0x00, 0x00, 0x00, 0xff
            ]
        );
    }
}
