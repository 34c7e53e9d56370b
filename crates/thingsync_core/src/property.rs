//! A single synchronized property.

use std::fmt;
use std::sync::Arc;

use crate::policy::{Permission, SyncPolicy, UpdatePolicy, WritePolicy};
use crate::value::PropertyValue;

/// Callback invoked after the local value changed from cloud input.
///
/// The callback receives the freshly applied local value and may mutate
/// it; a value pushed away from the applied one is flagged for re-encode
/// so the correction propagates back to the remote side.
pub type UpdateCallback = Box<dyn FnMut(&mut PropertyValue) + Send>;

/// Source of epoch-seconds timestamps used to stamp local changes.
pub type TimeSource = Arc<dyn Fn() -> u64 + Send + Sync>;

/// A named, typed value kept in sync with a remote service.
///
/// A property holds two copies of the same semantic value: the `local`
/// copy owned by the application and the `cloud` shadow owned by the
/// decoder. The publish policy decides when the local copy is due for
/// outbound encoding; the write policy decides how inbound values reach
/// the local copy; the sync policy resolves conflicts after
/// (re)connection.
pub struct Property {
    name: String,
    identifier: u8,
    attribute_identifier: u8,
    permission: Permission,
    local: PropertyValue,
    cloud: PropertyValue,

    update_policy: UpdatePolicy,
    write_policy: WritePolicy,
    sync_policy: Option<SyncPolicy>,
    on_update: Option<UpdateCallback>,
    time_source: Option<TimeSource>,

    encoded_once: bool,
    modified_in_callback: bool,
    update_requested: bool,
    last_encoded_ms: u64,

    last_local_change: u64,
    last_cloud_change: u64,

    with_timestamp: bool,
    timestamp: u64,
}

impl Property {
    /// Create a new property.
    ///
    /// Properties are normally created through
    /// [`PropertyContainer::add`](crate::PropertyContainer::add), which
    /// also assigns wire identifiers and the container's time source.
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>, permission: Permission) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            identifier: 0,
            attribute_identifier: 0,
            permission,
            cloud: value.clone(),
            local: value,
            update_policy: UpdatePolicy::default(),
            write_policy: WritePolicy::default(),
            sync_policy: None,
            on_update: None,
            time_source: None,
            encoded_once: false,
            modified_in_callback: false,
            update_requested: false,
            last_encoded_ms: 0,
            last_local_change: 0,
            last_cloud_change: 0,
            with_timestamp: false,
            timestamp: 0,
        }
    }

    /* Composable configuration, applied during setup. */

    /// Register a callback invoked after the local value changes from
    /// cloud input.
    pub fn on_update(
        &mut self,
        callback: impl FnMut(&mut PropertyValue) + Send + 'static,
    ) -> &mut Self {
        self.on_update = Some(Box::new(callback));
        self
    }

    /// Register the conflict-resolution policy for sync messages.
    pub fn on_sync(&mut self, policy: SyncPolicy) -> &mut Self {
        self.sync_policy = Some(policy);
        self
    }

    /// Publish when the value changed by at least `min_delta`, rate
    /// limited to one publish per `min_interval_ms`.
    pub fn publish_on_change(&mut self, min_delta: f64, min_interval_ms: u64) -> &mut Self {
        self.update_policy = UpdatePolicy::OnChange {
            min_delta,
            min_interval_ms,
        };
        self
    }

    /// Publish once per `interval_ms` regardless of change.
    pub fn publish_every(&mut self, interval_ms: u64) -> &mut Self {
        self.update_policy = UpdatePolicy::Periodic { interval_ms };
        self
    }

    /// Never publish automatically; only after [`request_update`].
    ///
    /// [`request_update`]: Property::request_update
    pub fn publish_on_demand(&mut self) -> &mut Self {
        self.update_policy = UpdatePolicy::OnDemand;
        self
    }

    /// Apply inbound values to the local copy immediately (default).
    pub fn write_on_change(&mut self) -> &mut Self {
        self.write_policy = WritePolicy::OnChange;
        self
    }

    /// Buffer inbound values in the cloud shadow; the local copy only
    /// changes on an explicit [`apply_cloud_value`] call.
    ///
    /// [`apply_cloud_value`]: Property::apply_cloud_value
    pub fn write_on_demand(&mut self) -> &mut Self {
        self.write_policy = WritePolicy::OnDemand;
        self
    }

    /// Include a timestamp field in this property's outbound maps.
    pub fn encode_timestamp(&mut self) -> &mut Self {
        self.with_timestamp = true;
        self
    }

    /* Accessors. */

    /// Full property name, possibly composite (`base:attribute`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base portion of the name (up to the `:` separator).
    pub fn base_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((base, _)) => base,
            None => &self.name,
        }
    }

    /// Attribute portion of the name (after the `:` separator), empty
    /// for plain properties.
    pub fn attribute_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, attribute)) => attribute,
            None => "",
        }
    }

    /// Compact wire identifier of the property (shared by all
    /// `base:attribute` siblings).
    pub fn identifier(&self) -> u8 {
        self.identifier
    }

    /// Attribute ordinal within the property (0 for plain properties,
    /// 1-based for named attributes).
    pub fn attribute_identifier(&self) -> u8 {
        self.attribute_identifier
    }

    /// Packed identifier used by the light-payload wire variant:
    /// low byte = property identifier, high byte = attribute identifier.
    pub fn packed_identifier(&self) -> u16 {
        u16::from(self.identifier) | (u16::from(self.attribute_identifier) << 8)
    }

    /// Access permission.
    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// The local (application-side) value.
    pub fn value(&self) -> &PropertyValue {
        &self.local
    }

    /// The cloud-shadow (decoder-side) value.
    pub fn cloud_value(&self) -> &PropertyValue {
        &self.cloud
    }

    /// The configured write policy.
    pub fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }

    /// The registered sync policy, if any.
    pub fn sync_policy(&self) -> Option<SyncPolicy> {
        self.sync_policy
    }

    /// Timestamp of the last local change (epoch seconds).
    pub fn last_local_change(&self) -> u64 {
        self.last_local_change
    }

    /// Timestamp of the last cloud change (epoch seconds, carried by the
    /// wire message).
    pub fn last_cloud_change(&self) -> u64 {
        self.last_cloud_change
    }

    /// Whether outbound maps for this property carry a timestamp field.
    pub fn timestamp_enabled(&self) -> bool {
        self.with_timestamp
    }

    /// The value encoded into the outbound timestamp field.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /* Application-side mutation. */

    /// Set the local value.
    ///
    /// Stamps the last-local-change timestamp when a time source is
    /// registered on the owning container. This is the application's
    /// single mutation path; the decoder never touches the local copy
    /// directly.
    pub fn set(&mut self, value: impl Into<PropertyValue>) {
        self.local = value.into();
        self.update_local_timestamp();
    }

    /// Request an encode for an [`UpdatePolicy::OnDemand`] property.
    pub fn request_update(&mut self) {
        self.update_requested = true;
    }

    /// Set the value carried in the outbound timestamp field.
    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    /// Overwrite the last-local-change timestamp.
    pub fn set_last_local_change(&mut self, timestamp: u64) {
        self.last_local_change = timestamp;
    }

    /// Overwrite the last-cloud-change timestamp.
    pub fn set_last_cloud_change(&mut self, timestamp: u64) {
        self.last_cloud_change = timestamp;
    }

    /// Copy the buffered cloud-shadow value into the local value.
    ///
    /// This is the explicit apply half of
    /// [`write_on_demand`](Property::write_on_demand).
    pub fn apply_cloud_value(&mut self) {
        self.local = self.cloud.clone();
    }

    /* Encode-side bookkeeping. */

    /// Whether the publish policy makes this property due for encoding.
    ///
    /// `now_ms` is the host's monotonic millisecond clock; elapsed-time
    /// comparisons are wraparound safe.
    pub fn should_be_encoded(&self, now_ms: u64) -> bool {
        if !self.encoded_once {
            return true;
        }
        if self.modified_in_callback {
            return true;
        }

        match self.update_policy {
            UpdatePolicy::OnChange {
                min_interval_ms, ..
            } => {
                self.is_different_from_cloud()
                    && now_ms.wrapping_sub(self.last_encoded_ms) >= min_interval_ms
            }
            UpdatePolicy::Periodic { interval_ms } => {
                now_ms.wrapping_sub(self.last_encoded_ms) >= interval_ms
            }
            UpdatePolicy::OnDemand => self.update_requested,
        }
    }

    /// Record a successful encode of the current local value.
    ///
    /// The shadow takes the transmitted value so future delta checks are
    /// relative to what the remote side last saw.
    pub fn mark_encoded(&mut self, now_ms: u64) {
        self.cloud = self.local.clone();
        self.encoded_once = true;
        self.modified_in_callback = false;
        self.update_requested = false;
        self.last_encoded_ms = now_ms;
    }

    /// Whether the local value differs from the cloud shadow under the
    /// publish policy's delta threshold.
    pub fn is_different_from_cloud(&self) -> bool {
        self.local.differs_from(&self.cloud, self.min_delta())
    }

    /* Decode-side application. */

    /// Overwrite the cloud-shadow value (decoder side).
    pub fn set_cloud_value(&mut self, value: PropertyValue) {
        self.cloud = value;
    }

    /// Apply a decoded live (non-sync) update.
    ///
    /// Under the default write policy the shadow is copied into the
    /// local value and the update callback runs; under
    /// [`WritePolicy::OnDemand`] the value stays buffered in the shadow.
    pub fn apply_live_update(&mut self) {
        match self.write_policy {
            WritePolicy::OnChange => {
                self.local = self.cloud.clone();
                self.exec_on_update();
            }
            WritePolicy::OnDemand => {}
        }
    }

    /// Resolve a sync-message conflict according to the registered
    /// policy. The update callback fires only if the policy actually
    /// changed the local value.
    pub fn resolve_sync(&mut self) {
        let Some(policy) = self.sync_policy else {
            return;
        };
        match policy {
            SyncPolicy::MostRecentWins => {
                if self.last_cloud_change > self.last_local_change {
                    self.adopt_cloud_value();
                }
            }
            SyncPolicy::CloudWins => self.adopt_cloud_value(),
            SyncPolicy::DeviceWins => {
                // Local stays authoritative; the divergent shadow makes
                // the publish policy re-encode so the remote converges.
            }
        }
    }

    pub(crate) fn set_identifier(&mut self, identifier: u8, attribute_identifier: u8) {
        self.identifier = identifier;
        self.attribute_identifier = attribute_identifier;
    }

    pub(crate) fn set_time_source(&mut self, source: TimeSource) {
        self.time_source = Some(source);
    }

    fn adopt_cloud_value(&mut self) {
        let changed = self.local.differs_from(&self.cloud, 0.0);
        self.local = self.cloud.clone();
        if changed {
            self.exec_on_update();
        }
    }

    fn exec_on_update(&mut self) {
        if let Some(callback) = self.on_update.as_mut() {
            callback(&mut self.local);
        }
        // The callback may have pushed the local value away from what
        // was just applied; flag it so the next encode pass picks the
        // property up and propagates the change back out.
        if self.is_different_from_cloud() {
            self.modified_in_callback = true;
        }
    }

    fn update_local_timestamp(&mut self) {
        if self.permission.cloud_readable() {
            if let Some(source) = &self.time_source {
                self.last_local_change = source();
            }
        }
    }

    fn min_delta(&self) -> f64 {
        match self.update_policy {
            UpdatePolicy::OnChange { min_delta, .. } => min_delta,
            _ => 0.0,
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("identifier", &self.identifier)
            .field("attribute_identifier", &self.attribute_identifier)
            .field("permission", &self.permission)
            .field("local", &self.local)
            .field("cloud", &self.cloud)
            .field("update_policy", &self.update_policy)
            .field("write_policy", &self.write_policy)
            .field("sync_policy", &self.sync_policy)
            .finish_non_exhaustive()
    }
}
