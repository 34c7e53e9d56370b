//! Wire key tables for the two protocol generations.
//!
//! The map-key constants differ between the protocol's historical
//! generations: V1 keyed fields by short text labels, V2 by small
//! integer codes derived from SenML (RFC 8428 §6). Both directions of
//! the mapping live here as data so neither codec hard-codes them.

use serde::{Deserialize, Serialize};

/// Wire protocol generation, selecting the map-key scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// Legacy scheme: text-string map keys (`"n"`, `"v"`, ...).
    V1,
    /// Compact scheme: integer map keys (`0`, `2`, ...).
    #[default]
    V2,
}

/// A field of a property-update map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKey {
    /// Property name (or packed identifier in light payloads).
    Name,
    /// Protocol base version, informational.
    BaseVersion,
    /// Shared name prefix for subsequent maps (legacy payloads only).
    BaseName,
    /// Shared base timestamp for subsequent maps.
    BaseTime,
    /// Numeric value.
    Value,
    /// String value.
    StringValue,
    /// Boolean value.
    BooleanValue,
    /// Per-record timestamp delta on top of the base timestamp.
    Time,
}

impl MapKey {
    /// The V1 text label of this field.
    pub fn text_label(self) -> &'static str {
        match self {
            MapKey::Name => "n",
            MapKey::BaseVersion => "bver",
            MapKey::BaseName => "bn",
            MapKey::BaseTime => "bt",
            MapKey::Value => "v",
            MapKey::StringValue => "vs",
            MapKey::BooleanValue => "vb",
            MapKey::Time => "t",
        }
    }

    /// The V2 integer code of this field.
    pub fn integer_code(self) -> i64 {
        match self {
            MapKey::Name => 0,
            MapKey::BaseVersion => -1,
            MapKey::BaseName => -2,
            MapKey::BaseTime => -3,
            MapKey::Value => 2,
            MapKey::StringValue => 3,
            MapKey::BooleanValue => 4,
            MapKey::Time => 6,
        }
    }

    /// Classify a V1 text key. Unknown labels yield `None`.
    pub fn from_text(label: &str) -> Option<Self> {
        match label {
            "n" => Some(MapKey::Name),
            "bver" => Some(MapKey::BaseVersion),
            "bn" => Some(MapKey::BaseName),
            "bt" => Some(MapKey::BaseTime),
            "v" => Some(MapKey::Value),
            "vs" => Some(MapKey::StringValue),
            "vb" => Some(MapKey::BooleanValue),
            "t" => Some(MapKey::Time),
            _ => None,
        }
    }

    /// Classify a V2 integer code. Unknown codes yield `None`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(MapKey::Name),
            -1 => Some(MapKey::BaseVersion),
            -2 => Some(MapKey::BaseName),
            -3 => Some(MapKey::BaseTime),
            2 => Some(MapKey::Value),
            3 => Some(MapKey::StringValue),
            4 => Some(MapKey::BooleanValue),
            6 => Some(MapKey::Time),
            _ => None,
        }
    }
}
