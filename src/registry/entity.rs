//! Registry entity records.
//!
//! Markers come from independently versioned producers, so there is no single
//! schema: the same information can live at the top level or under `data`,
//! under different names. A [`RegistryEntity`] keeps the raw JSON and reads it
//! through priority-ordered field probes. A missing field is always a normal
//! outcome.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields that may carry an identifier or a full registry key, highest
/// priority first.
pub const IDENTIFIER_FIELDS: &[&str] = &["/id", "/data/id", "/markerId", "/data/markerId"];

/// Fields that carry a bare identifier, possibly dashed.
pub const IDENTIFIER_ALIAS_FIELDS: &[&str] =
    &["/playerUuid", "/uuid", "/data/playerUuid", "/data/uuid"];

/// Fields that carry the human-readable alias.
pub const ALIAS_FIELDS: &[&str] = &["/name", "/playerName", "/label", "/data/name"];

/// One entity of the live registry.
///
/// # Examples
///
/// ```
/// use follow_resolver::RegistryEntity;
/// use serde_json::json;
///
/// let marker = RegistryEntity::new(json!({ "data": { "name": "Rin" } }));
/// assert_eq!(marker.alias(), Some("Rin"));
/// assert_eq!(marker.identifier_alias(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryEntity(Value);

impl RegistryEntity {
    /// Wraps a raw record.
    #[must_use]
    pub const fn new(record: Value) -> Self {
        Self(record)
    }

    /// Raw record.
    #[must_use]
    pub const fn as_json(&self) -> &Value {
        &self.0
    }

    /// Consumes the entity, returning the raw record.
    #[must_use]
    pub fn into_json(self) -> Value {
        self.0
    }

    /// Non-empty string at a JSON pointer.
    #[must_use]
    pub fn field(&self, pointer: &str) -> Option<&str> {
        self.0
            .pointer(pointer)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Identifier-bearing field values, in probe order.
    pub fn identifier_fields(&self) -> impl Iterator<Item = &str> + '_ {
        IDENTIFIER_FIELDS.iter().filter_map(|p| self.field(p))
    }

    /// First dedicated identifier field.
    #[must_use]
    pub fn identifier_alias(&self) -> Option<&str> {
        first_field(self, IDENTIFIER_ALIAS_FIELDS)
    }

    /// Current alias.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        first_field(self, ALIAS_FIELDS)
    }
}

impl From<Value> for RegistryEntity {
    fn from(record: Value) -> Self {
        Self(record)
    }
}

fn first_field<'a>(entity: &'a RegistryEntity, pointers: &[&str]) -> Option<&'a str> {
    pointers.iter().find_map(|p| entity.field(p))
}
