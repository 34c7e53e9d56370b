//! Inbound wire decoder state machine.

use thingsync_codec::{CodecError, ItemKind, Reader};
use thingsync_core::{PropertyContainer, PropertyValue, TypeTag};
use thiserror::Error;
use tracing::{trace, warn};

use crate::keys::MapKey;
use crate::record::MapRecord;

/// Errors that can occur while decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Low-level codec failure (truncated buffer, wrong major type, ...).
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The payload does not start with an array of maps.
    #[error("expected a top-level array of maps")]
    ExpectedArray,

    /// An element of the top-level array is not a map.
    #[error("expected a map inside the top-level array")]
    ExpectedMap,

    /// A map key is neither a text string nor an integer.
    #[error("map key is neither text nor integer")]
    MalformedKey,
}

/// Parser states of the decoder.
///
/// Each map of the inbound array is walked key by key; the key decides
/// which value state runs next, and `LeaveMap` accumulates the finished
/// record into the current property group. Errors are terminal: the
/// decode call returns immediately and groups flushed before the error
/// remain applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    EnterMap,
    MapKey,
    UndefinedKey,
    BaseVersion,
    BaseName,
    BaseTime,
    Name,
    Value,
    StringValue,
    BooleanValue,
    Time,
    LeaveMap,
    Complete,
}

/// Decode an inbound property-update message and apply it.
///
/// `is_sync_message` marks the full-state message sent once after
/// (re)connection: its values go through each property's registered
/// [`SyncPolicy`](thingsync_core::SyncPolicy) instead of being applied
/// unconditionally.
///
/// Updates are applied group by group as the parser advances. A
/// malformed tail therefore leaves earlier groups applied: partial
/// application is observable behavior, not rolled back.
pub fn decode(
    container: &mut PropertyContainer,
    payload: &[u8],
    is_sync_message: bool,
) -> Result<(), DecodeError> {
    let mut reader = Reader::new(payload);
    match reader.peek_kind() {
        Ok(ItemKind::Array) => {}
        Ok(_) => return Err(DecodeError::ExpectedArray),
        Err(err) => return Err(DecodeError::Codec(err)),
    }
    let outer_len = reader.array_header()?;

    let mut decoder = Decoder {
        reader,
        container,
        is_sync: is_sync_message,
        outer_len,
        maps_seen: 0,
        map_entries_left: None,
        record: MapRecord::default(),
        group: Vec::new(),
        group_name: String::new(),
        group_base_time: 0.0,
        group_time: 0.0,
    };
    decoder.run()
}

struct Decoder<'a, 'c> {
    reader: Reader<'a>,
    container: &'c mut PropertyContainer,
    is_sync: bool,
    outer_len: Option<u64>,
    maps_seen: u64,
    map_entries_left: Option<u64>,
    record: MapRecord,
    group: Vec<MapRecord>,
    group_name: String,
    group_base_time: f64,
    group_time: f64,
}

impl Decoder<'_, '_> {
    fn run(&mut self) -> Result<(), DecodeError> {
        let mut state = self.next_map_state()?;
        while state != State::Complete {
            state = self.step(state)?;
        }
        Ok(())
    }

    fn step(&mut self, state: State) -> Result<State, DecodeError> {
        match state {
            State::EnterMap => self.enter_map(),
            State::MapKey => self.map_key(),
            State::UndefinedKey => self.undefined_key(),
            State::BaseVersion => self.base_version(),
            State::BaseName => self.base_name(),
            State::BaseTime => self.base_time(),
            State::Name => self.name(),
            State::Value => self.value(),
            State::StringValue => self.string_value(),
            State::BooleanValue => self.boolean_value(),
            State::Time => self.time(),
            State::LeaveMap => self.leave_map(),
            State::Complete => Ok(State::Complete),
        }
    }

    /// Decide whether another map follows or the array is exhausted.
    /// At exhaustion the last accumulated group is flushed.
    fn next_map_state(&mut self) -> Result<State, DecodeError> {
        let exhausted = match self.outer_len {
            Some(len) => self.maps_seen >= len,
            None => {
                if self.reader.at_break() {
                    self.reader.read_break()?;
                    true
                } else {
                    false
                }
            }
        };
        if exhausted {
            self.flush_group();
            Ok(State::Complete)
        } else {
            Ok(State::EnterMap)
        }
    }

    fn enter_map(&mut self) -> Result<State, DecodeError> {
        match self.reader.peek_kind() {
            Ok(ItemKind::Map) => {}
            Ok(_) => return Err(DecodeError::ExpectedMap),
            Err(err) => return Err(DecodeError::Codec(err)),
        }
        self.map_entries_left = self.reader.map_header()?;
        self.record = MapRecord::default();
        Ok(State::MapKey)
    }

    fn map_key(&mut self) -> Result<State, DecodeError> {
        match &mut self.map_entries_left {
            Some(remaining) => {
                if *remaining == 0 {
                    return Ok(State::LeaveMap);
                }
                *remaining -= 1;
            }
            None => {
                if self.reader.at_break() {
                    self.reader.read_break()?;
                    return Ok(State::LeaveMap);
                }
            }
        }

        let key = match self.reader.peek_kind()? {
            ItemKind::Integer => MapKey::from_code(self.reader.read_integer()?),
            ItemKind::Text => MapKey::from_text(&self.reader.read_text()?),
            _ => return Err(DecodeError::MalformedKey),
        };
        Ok(match key {
            Some(MapKey::Name) => State::Name,
            Some(MapKey::BaseVersion) => State::BaseVersion,
            Some(MapKey::BaseName) => State::BaseName,
            Some(MapKey::BaseTime) => State::BaseTime,
            Some(MapKey::Value) => State::Value,
            Some(MapKey::StringValue) => State::StringValue,
            Some(MapKey::BooleanValue) => State::BooleanValue,
            Some(MapKey::Time) => State::Time,
            None => State::UndefinedKey,
        })
    }

    fn undefined_key(&mut self) -> Result<State, DecodeError> {
        trace!("skipping value under unknown map key");
        self.reader.skip_value()?;
        Ok(State::MapKey)
    }

    fn base_version(&mut self) -> Result<State, DecodeError> {
        let version = self.reader.read_integer()?;
        self.record.base_version =
            Some(version.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32);
        Ok(State::MapKey)
    }

    fn base_name(&mut self) -> Result<State, DecodeError> {
        self.record.base_name = Some(self.reader.read_text()?);
        Ok(State::MapKey)
    }

    fn base_time(&mut self) -> Result<State, DecodeError> {
        self.record.base_time = Some(self.reader.read_numeric()?);
        Ok(State::MapKey)
    }

    fn time(&mut self) -> Result<State, DecodeError> {
        self.record.time = Some(self.reader.read_numeric()?);
        Ok(State::MapKey)
    }

    fn value(&mut self) -> Result<State, DecodeError> {
        self.record.value = Some(self.reader.read_numeric()?);
        Ok(State::MapKey)
    }

    fn string_value(&mut self) -> Result<State, DecodeError> {
        self.record.string_value = Some(self.reader.read_text()?);
        Ok(State::MapKey)
    }

    fn boolean_value(&mut self) -> Result<State, DecodeError> {
        self.record.boolean_value = Some(self.reader.read_bool()?);
        Ok(State::MapKey)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn name(&mut self) -> Result<State, DecodeError> {
        match self.reader.peek_kind()? {
            ItemKind::Text => {
                let name = self.reader.read_text()?;
                let attribute = name
                    .split_once(':')
                    .map(|(_, attribute)| attribute.to_owned())
                    .unwrap_or_default();
                self.record.attribute_name = Some(attribute);
                self.observe_name(name);
            }
            ItemKind::Integer => {
                // Light payload: the name was replaced by a packed
                // identifier, low byte = property, high byte = attribute
                let packed = self.reader.read_integer()?;
                self.record.light_payload = true;
                self.record.name_identifier = Some((packed & 0xff) as u8);
                self.record.attribute_identifier = Some(((packed >> 8) & 0xff) as u8);

                let resolved = u16::try_from(packed)
                    .ok()
                    .and_then(|p| self.container.get_by_packed_identifier(p))
                    .map(|p| (p.name().to_owned(), p.attribute_name().to_owned()));
                match resolved {
                    Some((name, attribute)) => {
                        self.record.attribute_name = Some(attribute);
                        self.observe_name(name);
                    }
                    None => {
                        warn!(packed, "packed identifier matches no registered property");
                    }
                }
            }
            _ => return Err(DecodeError::Codec(CodecError::type_mismatch("name"))),
        }
        Ok(State::MapKey)
    }

    fn leave_map(&mut self) -> Result<State, DecodeError> {
        if self.record.name.is_some() {
            if let Some(base_time) = self.record.base_time {
                self.group_base_time = base_time;
            }
            if let Some(time) = self.record.time {
                if time > self.group_time {
                    self.group_time = time;
                }
            }
            let base = self.record.base_name_part().unwrap_or_default().to_owned();
            self.group.push(std::mem::take(&mut self.record));
            self.group_name = base;
        }
        self.maps_seen += 1;
        self.next_map_state()
    }

    /// Record the property name of the current map. A name belonging to
    /// a different property than the accumulated group flushes the group
    /// right away, so updates completed so far survive any error later
    /// in the message.
    fn observe_name(&mut self, name: String) {
        let base = name.split_once(':').map_or(name.as_str(), |(base, _)| base);
        if !self.group.is_empty() && base != self.group_name {
            self.flush_group();
        }
        self.record.name = Some(name);
    }

    /// Apply the accumulated group to its properties: cloud-shadow
    /// assignment, cloud timestamp `base_time + max(time)`, then sync
    /// resolution or live apply.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn flush_group(&mut self) {
        let cloud_time = (self.group_base_time + self.group_time) as u64;

        // Take the group out so its records can borrow beside the
        // container, then hand the emptied allocation back for the next
        // group to refill
        let mut group = std::mem::take(&mut self.group);
        for record in group.drain(..) {
            let Some(name) = record.name.as_deref() else {
                continue;
            };
            let Some(property) = self.container.get_mut(name) else {
                warn!(name, "update for unregistered property ignored");
                continue;
            };
            if !property.permission().cloud_writable() {
                trace!(name, "inbound write filtered by permission");
                continue;
            }
            if self.is_sync && property.sync_policy().is_none() {
                trace!(name, "sync value discarded: no sync policy registered");
                continue;
            }

            if let Some(value) = coerce_record_value(property.value().type_tag(), &record) {
                property.set_cloud_value(value);
            }
            property.set_last_cloud_change(cloud_time);
            if self.is_sync {
                property.resolve_sync();
            } else {
                property.apply_live_update();
            }
        }
        self.group = group;

        self.group_name.clear();
        self.group_base_time = 0.0;
        self.group_time = 0.0;
    }
}

/// Build the shadow value a record carries for a property of the given
/// type, or `None` if the record has no usable value for it.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn coerce_record_value(tag: TypeTag, record: &MapRecord) -> Option<PropertyValue> {
    match tag {
        TypeTag::Bool => record.boolean_value.map(PropertyValue::Bool).or_else(|| {
            // Booleans tolerated as numeric 0/1; anything else keeps the
            // previous shadow value
            match record.value {
                Some(v) if v == 0.0 => Some(PropertyValue::Bool(false)),
                Some(v) if v == 1.0 => Some(PropertyValue::Bool(true)),
                _ => None,
            }
        }),
        TypeTag::Int => record.value.map(|v| PropertyValue::Int(v as i32)),
        TypeTag::Float => record.value.map(|v| PropertyValue::Float(v as f32)),
        TypeTag::Str => record.string_value.clone().map(PropertyValue::Str),
    }
}
