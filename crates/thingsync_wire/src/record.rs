//! Transient per-map decode record.

/// Fields decoded from a single property-update map.
///
/// One record is filled while the decoder walks one CBOR map and is
/// consumed when the map's property group is flushed; records never
/// outlive a decode call. Every field is optional — the group-flush
/// logic keys off which fields were actually present.
#[derive(Debug, Clone, Default)]
pub struct MapRecord {
    /// Protocol base version, informational.
    pub base_version: Option<i32>,
    /// Shared name prefix (legacy payloads), informational.
    pub base_name: Option<String>,
    /// Shared base timestamp (epoch seconds).
    pub base_time: Option<f64>,
    /// Per-record timestamp delta.
    pub time: Option<f64>,
    /// Full property name, possibly composite (`base:attribute`).
    pub name: Option<String>,
    /// Attribute portion of the name, when composite.
    pub attribute_name: Option<String>,
    /// Numeric value, normalized to double.
    pub value: Option<f64>,
    /// String value.
    pub string_value: Option<String>,
    /// Boolean value.
    pub boolean_value: Option<bool>,
    /// Property identifier from a packed light-payload name.
    pub name_identifier: Option<u8>,
    /// Attribute identifier from a packed light-payload name.
    pub attribute_identifier: Option<u8>,
    /// Whether this record used the packed-identifier name form.
    pub light_payload: bool,
}

impl MapRecord {
    /// Base portion of the record's name (up to the `:` separator).
    pub fn base_name_part(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(|name| name.split_once(':').map_or(name, |(base, _)| base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_part_splits_composites() {
        let mut record = MapRecord::default();
        assert_eq!(record.base_name_part(), None);

        record.name = Some("test".into());
        assert_eq!(record.base_name_part(), Some("test"));

        record.name = Some("test:lat".into());
        assert_eq!(record.base_name_part(), Some("test"));
    }
}
