//! In-memory mock registry for tests and local development.

use crate::traits::{
    coerce_id, EntityKind, EventFields, Fields, Record, Registry, RegistryError, RegistryResult,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// A mock registry backed by in-memory record tables.
///
/// Search behaves like the real registry's one-box query: a case-insensitive
/// substring match over name-like fields, an exact (case-insensitive) match
/// on email, and a digit-suffix match on phone numbers. Toggles and counters
/// expose enough internals to assert fallback paths and fan-out bounds.
pub struct MockRegistry {
    records: RwLock<HashMap<EntityKind, Vec<Record>>>,
    queries: RwLock<Vec<(EntityKind, String)>>,
    next_id: AtomicU64,
    fail_batch: AtomicBool,
    gets_in_flight: AtomicUsize,
    max_gets_in_flight: AtomicUsize,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            queries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            fail_batch: AtomicBool::new(false),
            gets_in_flight: AtomicUsize::new(0),
            max_gets_in_flight: AtomicUsize::new(0),
        }
    }

    /// Inserts a record, assigning an id when the value has none.
    /// Returns the record's id.
    pub async fn seed(&self, kind: EntityKind, value: Value) -> String {
        let mut map = match value {
            Value::Object(map) => map,
            _ => panic!("seed expects a JSON object"),
        };
        let id = match coerce_id(map.get("id")) {
            Some(id) => id,
            None => {
                let id = self.assign_id(kind);
                map.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };
        self.records
            .write()
            .await
            .entry(kind)
            .or_default()
            .push(Record(map));
        id
    }

    /// All records of a kind, in insertion order.
    pub async fn records(&self, kind: EntityKind) -> Vec<Record> {
        self.records
            .read()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Every search query issued so far, in order.
    pub async fn search_queries(&self) -> Vec<(EntityKind, String)> {
        self.queries.read().await.clone()
    }

    /// Makes `search_by_contact_ids` fail with `Unsupported`.
    pub fn fail_batch_by_ids(&self, fail: bool) {
        self.fail_batch.store(fail, Ordering::SeqCst);
    }

    /// The largest number of `get` calls that were in flight at once.
    pub fn max_concurrent_gets(&self) -> usize {
        self.max_gets_in_flight.load(Ordering::SeqCst)
    }

    fn assign_id(&self, kind: EntityKind) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let prefix = match kind {
            EntityKind::Contact => "c",
            EntityKind::Business => "b",
            EntityKind::Property => "p",
            EntityKind::Event => "e",
        };
        format!("{}-{}", prefix, n)
    }
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn matches_query(record: &Record, query: &str) -> bool {
    let q = query.trim();
    if q.is_empty() {
        return false;
    }
    let q_lower = q.to_lowercase();

    if let Some(email) = record.str_field("email") {
        if email.eq_ignore_ascii_case(q) {
            return true;
        }
    }

    for key in ["name", "first_name", "last_name", "address"] {
        if let Some(v) = record.str_field(key) {
            if v.to_lowercase().contains(&q_lower) {
                return true;
            }
        }
    }

    if let Some(phone) = record.str_field("phone") {
        if phone == q {
            return true;
        }
        let qd = digits(q);
        if !qd.is_empty() && digits(phone).ends_with(&qd) {
            return true;
        }
    }

    false
}

fn contact_id_list(record: &Record) -> Vec<String> {
    record
        .0
        .get("contact_ids")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(|v| coerce_id(Some(v))).collect())
        .unwrap_or_default()
}

#[async_trait]
impl Registry for MockRegistry {
    async fn search(&self, kind: EntityKind, query: &str) -> RegistryResult<Vec<Record>> {
        self.queries
            .write()
            .await
            .push((kind, query.to_string()));
        let records = self.records.read().await;
        Ok(records
            .get(&kind)
            .map(|list| {
                list.iter()
                    .filter(|r| matches_query(r, query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn search_by_contact_ids(
        &self,
        kind: EntityKind,
        contact_ids: &[String],
    ) -> RegistryResult<Vec<Record>> {
        if self.fail_batch.load(Ordering::SeqCst) {
            return Err(RegistryError::Unsupported(
                "contact_ids filter not supported".to_string(),
            ));
        }
        let records = self.records.read().await;
        Ok(records
            .get(&kind)
            .map(|list| {
                list.iter()
                    .filter(|r| {
                        contact_id_list(r)
                            .iter()
                            .any(|id| contact_ids.contains(id))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, kind: EntityKind, id: &str) -> RegistryResult<Record> {
        let in_flight = self.gets_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_gets_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);
        // Hold the slot long enough for overlapping calls to observe each other.
        tokio::time::sleep(Duration::from_millis(5)).await;

        let result = {
            let records = self.records.read().await;
            records
                .get(&kind)
                .and_then(|list| list.iter().find(|r| r.id().as_deref() == Some(id)))
                .cloned()
        };
        self.gets_in_flight.fetch_sub(1, Ordering::SeqCst);

        result.ok_or_else(|| RegistryError::NotFound(format!("{} {}", kind, id)))
    }

    async fn create(&self, kind: EntityKind, fields: Fields) -> RegistryResult<Record> {
        let mut map = fields.into_map();
        let id = self.assign_id(kind);
        map.insert("id".to_string(), Value::String(id));
        let record = Record(map);
        self.records
            .write()
            .await
            .entry(kind)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, kind: EntityKind, id: &str, fields: Fields) -> RegistryResult<Record> {
        let mut records = self.records.write().await;
        let list = records.entry(kind).or_default();
        let record = list
            .iter_mut()
            .find(|r| r.id().as_deref() == Some(id))
            .ok_or_else(|| RegistryError::NotFound(format!("{} {}", kind, id)))?;
        for (key, value) in fields.into_map() {
            record.0.insert(key, value);
        }
        Ok(record.clone())
    }

    async fn log_event(&self, event: EventFields) -> RegistryResult<Record> {
        let value = serde_json::to_value(&event)
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;
        self.create(
            EntityKind::Event,
            match value {
                Value::Object(map) => Fields::from_map(map),
                _ => Fields::new(),
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn search_matches_email_exactly() {
        let registry = MockRegistry::new();
        registry
            .seed(EntityKind::Contact, json!({"email": "ana@x.com", "name": "Ana"}))
            .await;

        let hits = registry.search(EntityKind::Contact, "ANA@x.com").await.unwrap();
        assert_eq!(hits.len(), 1);

        let misses = registry.search(EntityKind::Contact, "ana@y.com").await.unwrap();
        assert!(misses.is_empty());
    }

    #[tokio::test]
    async fn search_matches_phone_digit_suffix() {
        let registry = MockRegistry::new();
        registry
            .seed(EntityKind::Contact, json!({"phone": "+1 (718) 555-1212"}))
            .await;

        for query in ["17185551212", "7185551212", "5551212"] {
            let hits = registry.search(EntityKind::Contact, query).await.unwrap();
            assert_eq!(hits.len(), 1, "query {} should match", query);
        }

        // A different suffix does not match even though it shares digits.
        let misses = registry.search(EntityKind::Contact, "5551213").await.unwrap();
        assert!(misses.is_empty());
    }

    #[tokio::test]
    async fn batch_by_ids_filters_on_intersection() {
        let registry = MockRegistry::new();
        registry
            .seed(
                EntityKind::Business,
                json!({"name": "Cafe", "contact_ids": ["c-1", "c-2"]}),
            )
            .await;
        registry
            .seed(EntityKind::Business, json!({"name": "Bakery", "contact_ids": ["c-3"]}))
            .await;

        let hits = registry
            .search_by_contact_ids(EntityKind::Business, &["c-2".to_string()])
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].str_field("name"), Some("Cafe"));
    }

    #[tokio::test]
    async fn batch_by_ids_can_be_forced_unsupported() {
        let registry = MockRegistry::new();
        registry.fail_batch_by_ids(true);
        let err = registry
            .search_by_contact_ids(EntityKind::Business, &["c-1".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unsupported(_)));
    }

    #[tokio::test]
    async fn update_merges_supplied_fields_only() {
        let registry = MockRegistry::new();
        let id = registry
            .seed(EntityKind::Contact, json!({"email": "a@x.com", "name": "Ana"}))
            .await;

        registry
            .update(EntityKind::Contact, &id, Fields::new().set("phone", "555"))
            .await
            .unwrap();

        let record = registry.get(EntityKind::Contact, &id).await.unwrap();
        assert_eq!(record.str_field("email"), Some("a@x.com"));
        assert_eq!(record.str_field("phone"), Some("555"));
    }

    #[tokio::test]
    async fn get_missing_record_is_not_found() {
        let registry = MockRegistry::new();
        let err = registry.get(EntityKind::Property, "p-404").await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn log_event_lands_in_events_table() {
        let registry = MockRegistry::new();
        registry
            .log_event(EventFields::portal("contact.created", &json!({"id": "c-1"})))
            .await
            .unwrap();

        let events = registry.records(EntityKind::Event).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].str_field("name"), Some("contact.created"));
        assert_eq!(events[0].str_field("category"), Some("Portal"));
    }
}
