//! Permission and policy enumerations.

use serde::{Deserialize, Serialize};

/// Access permission of a property as seen from the cloud side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    /// The cloud may only read the value; inbound writes are ignored.
    Read,
    /// The cloud may only write the value; it is never encoded outbound.
    Write,
    /// The cloud may both read and write the value.
    ReadWrite,
}

impl Permission {
    /// Whether the cloud may read this property (it is encoded outbound).
    pub fn cloud_readable(self) -> bool {
        matches!(self, Permission::Read | Permission::ReadWrite)
    }

    /// Whether the cloud may write this property (inbound updates apply).
    pub fn cloud_writable(self) -> bool {
        matches!(self, Permission::Write | Permission::ReadWrite)
    }
}

/// Publish policy: when a property is due for outbound encoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UpdatePolicy {
    /// Encode when the local value moved at least `min_delta` away from
    /// the last encoded value, and at least `min_interval_ms` passed
    /// since the last encode.
    OnChange {
        /// Minimum numeric change required to re-publish.
        min_delta: f64,
        /// Minimum milliseconds between publishes (rate limit).
        min_interval_ms: u64,
    },
    /// Encode once per interval regardless of change.
    Periodic {
        /// Publish interval in milliseconds.
        interval_ms: u64,
    },
    /// Never auto-encode; only when an update was explicitly requested.
    OnDemand,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        UpdatePolicy::OnChange {
            min_delta: 0.0,
            min_interval_ms: 0,
        }
    }
}

/// Write policy: how an inbound (non-sync) value reaches the local copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WritePolicy {
    /// The decoded value is copied into the local value immediately.
    #[default]
    OnChange,
    /// The decoded value is buffered in the cloud shadow; the local value
    /// is only updated by an explicit [`apply_cloud_value`] call.
    ///
    /// [`apply_cloud_value`]: crate::Property::apply_cloud_value
    OnDemand,
}

/// Conflict-resolution policy applied per property when a full-state
/// sync message arrives after (re)connection.
///
/// Each policy is a pure function of the local value, the cloud-shadow
/// value and their change timestamps. A property without a registered
/// policy discards inbound sync values entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncPolicy {
    /// The value with the greater change timestamp wins; ties favor the
    /// local value.
    MostRecentWins,
    /// The cloud-shadow value is always copied into the local value.
    CloudWins,
    /// The local value is never overwritten. The shadow keeps the cloud
    /// value, so the publish policy re-encodes the local value and the
    /// remote side converges.
    DeviceWins,
}

impl SyncPolicy {
    /// Converts to a wire/config code.
    pub fn to_code(self) -> u8 {
        match self {
            SyncPolicy::MostRecentWins => 1,
            SyncPolicy::CloudWins => 2,
            SyncPolicy::DeviceWins => 3,
        }
    }

    /// Converts from a wire/config code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(SyncPolicy::MostRecentWins),
            2 => Some(SyncPolicy::CloudWins),
            3 => Some(SyncPolicy::DeviceWins),
            _ => None,
        }
    }
}
