//! Ordered, append-only property registry.

use tracing::{debug, warn};

use crate::policy::Permission;
use crate::property::{Property, TimeSource};
use crate::value::PropertyValue;

/// An ordered collection of [`Property`] values, indexed by name and by
/// compact wire identifier.
///
/// The container is append-only: properties are registered during
/// initialization and never removed. Registration is idempotent by name.
/// Lookups are linear scans — containers hold tens of properties, and on
/// constrained targets that beats hashing overhead.
pub struct PropertyContainer {
    properties: Vec<Property>,
    time_source: Option<TimeSource>,
    next_identifier: u8,
}

impl PropertyContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self {
            properties: Vec::new(),
            time_source: None,
            next_identifier: 1,
        }
    }

    /// Register the epoch-seconds time source used to stamp local
    /// changes, on already-registered and future properties alike.
    pub fn register_time_source(&mut self, source: impl Fn() -> u64 + Send + Sync + 'static) {
        let source: TimeSource = std::sync::Arc::new(source);
        for property in &mut self.properties {
            property.set_time_source(source.clone());
        }
        self.time_source = Some(source);
    }

    /// Register a property, deriving its wire identifier automatically.
    ///
    /// Registration is idempotent: adding a name twice returns the
    /// existing property untouched. A composite `base:attribute` name
    /// shares the wire identifier of its `base` siblings and receives
    /// the next attribute ordinal.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
        permission: Permission,
    ) -> &mut Property {
        self.add_inner(name.into(), value.into(), permission, None)
    }

    /// Register a property under an explicit wire identifier.
    pub fn add_with_identifier(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
        permission: Permission,
        identifier: u8,
    ) -> &mut Property {
        self.add_inner(name.into(), value.into(), permission, Some(identifier))
    }

    /// Look up a property by its full name.
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Look up a property by its full name, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name() == name)
    }

    /// Look up a property by wire identifier and attribute ordinal.
    pub fn get_by_identifier(&self, identifier: u8, attribute: u8) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.identifier() == identifier && p.attribute_identifier() == attribute)
    }

    /// Resolve a packed light-payload identifier
    /// (low byte = property, high byte = attribute).
    #[allow(clippy::cast_possible_truncation)]
    pub fn get_by_packed_identifier(&self, packed: u16) -> Option<&Property> {
        self.get_by_identifier((packed & 0xff) as u8, (packed >> 8) as u8)
    }

    /// Iterate properties in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    /// Iterate properties in registration order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Property> {
        self.properties.iter_mut()
    }

    /// Number of registered properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the container is empty.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Request an encode for every property, for hosts that want a full
    /// state push (e.g. right after connecting).
    pub fn request_update_for_all(&mut self) {
        for property in &mut self.properties {
            property.request_update();
        }
    }

    fn add_inner(
        &mut self,
        name: String,
        value: PropertyValue,
        permission: Permission,
        identifier: Option<u8>,
    ) -> &mut Property {
        debug_assert!(!name.is_empty(), "property name must be non-empty");

        if let Some(idx) = self.properties.iter().position(|p| p.name() == name) {
            debug!(%name, "property already registered");
            return &mut self.properties[idx];
        }

        let mut property = Property::new(name, value, permission);

        let base = property.base_name();
        let sibling = self
            .properties
            .iter()
            .find(|p| p.base_name() == base)
            .map(|p| p.identifier());

        let (id, attribute) = match sibling {
            // base:attribute sibling joins the existing group with the
            // next attribute ordinal
            Some(id) => (id, self.next_attribute_ordinal(base, &property)),
            None => {
                let id = identifier.unwrap_or_else(|| self.allocate_identifier());
                (id, if property.attribute_name().is_empty() { 0 } else { 1 })
            }
        };
        property.set_identifier(id, attribute);

        if let Some(source) = &self.time_source {
            property.set_time_source(source.clone());
        }

        debug!(
            name = property.name(),
            identifier = id,
            attribute,
            "registered property"
        );
        self.properties.push(property);
        let last = self.properties.len() - 1;
        &mut self.properties[last]
    }

    fn next_attribute_ordinal(&self, base: &str, property: &Property) -> u8 {
        if property.attribute_name().is_empty() {
            return 0;
        }
        let count = self
            .properties
            .iter()
            .filter(|p| p.base_name() == base && !p.attribute_name().is_empty())
            .count();
        match u8::try_from(count + 1) {
            Ok(ordinal) => ordinal,
            Err(_) => {
                warn!(base, "attribute ordinal overflow");
                u8::MAX
            }
        }
    }

    fn allocate_identifier(&mut self) -> u8 {
        let id = self.next_identifier;
        self.next_identifier = self.next_identifier.wrapping_add(1);
        id
    }
}

impl Default for PropertyContainer {
    fn default() -> Self {
        Self::new()
    }
}
