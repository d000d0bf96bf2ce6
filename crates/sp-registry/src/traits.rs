//! Registry client trait definitions.
//!
//! The community registry is the external system of record for contacts,
//! businesses, properties, and events. This module defines the interface
//! the portal core consumes, so the HTTP implementation and the in-memory
//! mock are interchangeable behind one seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when talking to the registry.
#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The deployment's registry does not support this query shape
    /// (e.g. batch filtering by contact ids). Callers may fall back to
    /// a broader query.
    #[error("Unsupported query: {0}")]
    Unsupported(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// The entity kinds the registry stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Contact,
    Business,
    Property,
    Event,
}

impl EntityKind {
    /// The plural path segment used on the wire.
    pub fn segment(&self) -> &'static str {
        match self {
            EntityKind::Contact => "contacts",
            EntityKind::Business => "businesses",
            EntityKind::Property => "properties",
            EntityKind::Event => "events",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.segment())
    }
}

/// A raw registry record: an opaque JSON object.
///
/// The registry owns the schema; the core deserializes records into typed
/// views where it needs them and otherwise passes them through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub serde_json::Map<String, Value>);

impl Record {
    /// The registry-assigned id, string-coerced. Some registry tables
    /// return numeric ids; the portal treats all ids as opaque strings.
    pub fn id(&self) -> Option<String> {
        coerce_id(self.0.get("id"))
    }

    /// A string field by name, if present and a JSON string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Deserializes this record into a typed view.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }
}

impl From<serde_json::Map<String, Value>> for Record {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self(map)
    }
}

/// String-coerces a JSON id value (string or number).
pub fn coerce_id(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Field set for create/update calls.
///
/// Only the fields present in the map are sent; the registry applies them
/// last-write-wins per field and leaves omitted fields untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Fields(serde_json::Map<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field.
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Sets a field only when a value is supplied.
    pub fn set_opt(self, key: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_map(self) -> serde_json::Map<String, Value> {
        self.0
    }

    /// Builds a field set from a raw JSON object.
    pub fn from_map(map: serde_json::Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A portal audit event pushed to the registry's events table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFields {
    pub name: String,
    pub category: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub status: String,
    pub tags: Vec<String>,
}

impl EventFields {
    /// Builds a portal-sourced event with the standard category, status,
    /// and tag set. `payload` is JSON-encoded into the description.
    pub fn portal(name: impl Into<String>, payload: &Value) -> Self {
        Self {
            name: name.into(),
            category: "Portal".to_string(),
            description: payload.to_string(),
            starts_at: Utc::now(),
            status: "logged".to_string(),
            tags: vec!["source:portal".to_string(), "channel:web_event".to_string()],
        }
    }
}

/// The registry surface consumed by the portal core.
///
/// All calls are single request/response exchanges. An empty search result
/// is `Ok(vec![])`, never an error.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Free-text search within one entity kind.
    async fn search(&self, kind: EntityKind, query: &str) -> RegistryResult<Vec<Record>>;

    /// Structured batch query: records linked to any of the given contact
    /// ids. Deployments may not support this shape; implementations map
    /// such rejections to `RegistryError::Unsupported`.
    async fn search_by_contact_ids(
        &self,
        kind: EntityKind,
        contact_ids: &[String],
    ) -> RegistryResult<Vec<Record>>;

    /// Fetches a single record by id.
    async fn get(&self, kind: EntityKind, id: &str) -> RegistryResult<Record>;

    /// Creates a record and returns it (with its assigned id).
    async fn create(&self, kind: EntityKind, fields: Fields) -> RegistryResult<Record>;

    /// Applies a partial update to a record and returns the result.
    async fn update(&self, kind: EntityKind, id: &str, fields: Fields) -> RegistryResult<Record>;

    /// Appends a portal audit event.
    async fn log_event(&self, event: EventFields) -> RegistryResult<Record>;
}

#[async_trait]
impl<T: Registry + ?Sized> Registry for std::sync::Arc<T> {
    async fn search(&self, kind: EntityKind, query: &str) -> RegistryResult<Vec<Record>> {
        (**self).search(kind, query).await
    }

    async fn search_by_contact_ids(
        &self,
        kind: EntityKind,
        contact_ids: &[String],
    ) -> RegistryResult<Vec<Record>> {
        (**self).search_by_contact_ids(kind, contact_ids).await
    }

    async fn get(&self, kind: EntityKind, id: &str) -> RegistryResult<Record> {
        (**self).get(kind, id).await
    }

    async fn create(&self, kind: EntityKind, fields: Fields) -> RegistryResult<Record> {
        (**self).create(kind, fields).await
    }

    async fn update(&self, kind: EntityKind, id: &str, fields: Fields) -> RegistryResult<Record> {
        (**self).update(kind, id, fields).await
    }

    async fn log_event(&self, event: EventFields) -> RegistryResult<Record> {
        (**self).log_event(event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => Record(map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn record_id_coerces_strings_and_numbers() {
        assert_eq!(record(json!({"id": "c-17"})).id(), Some("c-17".to_string()));
        assert_eq!(record(json!({"id": 42})).id(), Some("42".to_string()));
        assert_eq!(record(json!({"id": ""})).id(), None);
        assert_eq!(record(json!({"name": "x"})).id(), None);
    }

    #[test]
    fn fields_builder_skips_absent_values() {
        let fields = Fields::new()
            .set("email", "a@x.com")
            .set_opt("phone", None::<&str>)
            .set_opt("name", Some("Ana"));
        assert_eq!(fields.get("email"), Some(&json!("a@x.com")));
        assert_eq!(fields.get("phone"), None);
        assert_eq!(fields.get("name"), Some(&json!("Ana")));
    }

    #[test]
    fn entity_kind_segments() {
        assert_eq!(EntityKind::Contact.segment(), "contacts");
        assert_eq!(EntityKind::Business.segment(), "businesses");
        assert_eq!(EntityKind::Property.segment(), "properties");
        assert_eq!(EntityKind::Event.segment(), "events");
    }

    #[test]
    fn portal_event_carries_standard_tags() {
        let ev = EventFields::portal("contact.updated", &json!({"id": "c-1"}));
        assert_eq!(ev.category, "Portal");
        assert_eq!(ev.status, "logged");
        assert!(ev.tags.contains(&"source:portal".to_string()));
        assert!(ev.description.contains("c-1"));
    }
}
