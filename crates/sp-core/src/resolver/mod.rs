//! Contact Resolver.
//!
//! Turns raw identity fields submitted through the portal into one
//! canonical registry contact id, deduplicating against the registry.
//! Resolution tries an ordered chain of search keys (email, then phone,
//! then full name), one registry query per key, stopping at the first
//! non-empty result; an email match always wins over a looser name match.

use crate::identity::{match_keys, split_full_name, MatchKey};
use serde_json::json;
use sp_registry::{
    EntityKind, EventFields, Fields, Record, Registry, RegistryError, RegistryResult,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Appended to the notes field on every portal-originated create/update
/// so registry consumers can audit portal edits.
pub const PROVENANCE_MARKER: &str = "[via stakeholder portal]";

/// Errors surfaced by contact resolution.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// Nothing to resolve by: no existing id and no identity field.
    #[error("Resolve request carries no identity fields")]
    EmptyRequest,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result type for resolver operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// The identity fields submitted for resolution.
///
/// `existing_id` asserts the caller already knows the canonical id and
/// skips the search chain entirely.
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    pub existing_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub contact_type: Option<String>,
    pub notes: Option<String>,
}

/// The outcome of a resolution: the canonical contact id, and whether a
/// new contact had to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContact {
    pub id: String,
    pub created: bool,
}

/// Resolves submitted identity fields to canonical registry contacts.
pub struct ContactResolver<R: Registry> {
    registry: R,
}

impl<R: Registry> ContactResolver<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Resolves the request to exactly one canonical contact id.
    ///
    /// A matched contact is updated with the newly supplied fields
    /// (last-write-wins per field, omitted fields untouched); otherwise a
    /// new contact is created. Either way the provenance marker lands in
    /// the notes field. Given no two resolutions run concurrently for the
    /// same identity, the same email/phone/name observed twice never
    /// creates a second contact.
    pub async fn resolve(&self, request: &ResolveRequest) -> ResolveResult<ResolvedContact> {
        if let Some(id) = &request.existing_id {
            debug!(contact_id = %id, "caller supplied canonical id, skipping search");
            self.update_contact(id, request).await?;
            return Ok(ResolvedContact {
                id: id.clone(),
                created: false,
            });
        }

        let chain = match_keys(
            request.email.as_deref(),
            request.phone.as_deref(),
            request.name.as_deref(),
        );
        if chain.is_empty() {
            return Err(ResolveError::EmptyRequest);
        }

        if let Some(existing) = self.find_match(&chain).await? {
            let id = record_id(&existing)?;
            self.update_contact(&id, request).await?;
            return Ok(ResolvedContact { id, created: false });
        }

        let id = self.create_contact(request).await?;
        Ok(ResolvedContact { id, created: true })
    }

    /// Evaluates the matcher chain short-circuit: one registry search per
    /// key, first non-empty result wins.
    async fn find_match(&self, chain: &[MatchKey]) -> RegistryResult<Option<Record>> {
        for key in chain {
            let hits = self
                .registry
                .search(EntityKind::Contact, key.query())
                .await?;
            if let Some(hit) = hits.into_iter().next() {
                debug!(key = key.label(), "resolved contact via search");
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }

    async fn update_contact(&self, id: &str, request: &ResolveRequest) -> ResolveResult<()> {
        let fields = contact_fields(request);
        self.registry
            .update(EntityKind::Contact, id, fields)
            .await?;
        self.log_audit("contact.updated", id).await;
        Ok(())
    }

    async fn create_contact(&self, request: &ResolveRequest) -> ResolveResult<String> {
        let fields = contact_fields(request);
        let record = self.registry.create(EntityKind::Contact, fields).await?;
        let id = record_id(&record)?;
        info!(contact_id = %id, "created contact");
        self.log_audit("contact.created", &id).await;
        Ok(id)
    }

    /// Audit events are best-effort: a failed event write never fails the
    /// resolution that triggered it.
    async fn log_audit(&self, name: &str, contact_id: &str) {
        let event = EventFields::portal(name, &json!({ "contact_id": contact_id }));
        if let Err(e) = self.registry.log_event(event).await {
            warn!(error = %e, contact_id, "failed to log portal audit event");
        }
    }
}

fn record_id(record: &Record) -> Result<String, RegistryError> {
    record
        .id()
        .ok_or_else(|| RegistryError::InvalidResponse("registry record without id".to_string()))
}

/// Builds the create/update field set from a request. Only supplied
/// fields are present; the notes field always ends with the provenance
/// marker.
fn contact_fields(request: &ResolveRequest) -> Fields {
    let parts = request
        .name
        .as_deref()
        .map(split_full_name)
        .unwrap_or_default();

    Fields::new()
        .set_opt("first_name", parts.first_name)
        .set_opt("last_name", parts.last_name)
        .set_opt("name", parts.name)
        .set_opt("email", request.email.as_deref().map(str::trim))
        .set_opt("phone", request.phone.as_deref().map(str::trim))
        .set_opt("contact_type", request.contact_type.clone())
        .set("notes", stamped_notes(request.notes.as_deref()))
}

fn stamped_notes(notes: Option<&str>) -> String {
    match notes.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => format!("{}\n{}", n, PROVENANCE_MARKER),
        None => PROVENANCE_MARKER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sp_registry::MockRegistry;

    fn resolver() -> ContactResolver<MockRegistry> {
        ContactResolver::new(MockRegistry::new())
    }

    #[tokio::test]
    async fn creates_contact_when_nothing_matches() {
        let resolver = resolver();
        let resolved = resolver
            .resolve(&ResolveRequest {
                name: Some("Ana Maria Perez".to_string()),
                email: Some("ana@x.com".to_string()),
                ..ResolveRequest::default()
            })
            .await
            .unwrap();
        assert!(resolved.created);

        let record = resolver
            .registry()
            .get(EntityKind::Contact, &resolved.id)
            .await
            .unwrap();
        assert_eq!(record.str_field("first_name"), Some("Ana"));
        assert_eq!(record.str_field("last_name"), Some("Maria Perez"));
        assert_eq!(record.str_field("name"), Some("Ana Maria Perez"));
        assert_eq!(record.str_field("email"), Some("ana@x.com"));
        assert_eq!(record.str_field("notes"), Some(PROVENANCE_MARKER));
    }

    #[tokio::test]
    async fn single_token_name_is_stored_unsplit() {
        let resolver = resolver();
        let resolved = resolver
            .resolve(&ResolveRequest {
                name: Some("Ana".to_string()),
                ..ResolveRequest::default()
            })
            .await
            .unwrap();

        let record = resolver
            .registry()
            .get(EntityKind::Contact, &resolved.id)
            .await
            .unwrap();
        assert_eq!(record.str_field("name"), Some("Ana"));
        assert_eq!(record.str_field("first_name"), None);
        assert_eq!(record.str_field("last_name"), None);
    }

    #[tokio::test]
    async fn same_email_twice_updates_instead_of_duplicating() {
        let resolver = resolver();
        let first = resolver
            .resolve(&ResolveRequest {
                email: Some("ana@x.com".to_string()),
                ..ResolveRequest::default()
            })
            .await
            .unwrap();
        assert!(first.created);

        let second = resolver
            .resolve(&ResolveRequest {
                email: Some("ana@x.com".to_string()),
                phone: Some("718-555-1212".to_string()),
                ..ResolveRequest::default()
            })
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(first.id, second.id);

        let contacts = resolver.registry().records(EntityKind::Contact).await;
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].str_field("phone"), Some("718-555-1212"));
    }

    #[tokio::test]
    async fn email_match_wins_over_phone_and_name() {
        let resolver = resolver();
        let by_email = resolver
            .registry()
            .seed(EntityKind::Contact, json!({"email": "ana@x.com"}))
            .await;
        resolver
            .registry()
            .seed(
                EntityKind::Contact,
                json!({"phone": "718-555-1212", "name": "Ana Perez"}),
            )
            .await;

        let resolved = resolver
            .resolve(&ResolveRequest {
                email: Some("ana@x.com".to_string()),
                phone: Some("718-555-1212".to_string()),
                name: Some("Ana Perez".to_string()),
                ..ResolveRequest::default()
            })
            .await
            .unwrap();
        assert_eq!(resolved.id, by_email);

        // Short-circuit: the email hit means phone and name never ran.
        let queries = resolver.registry().search_queries().await;
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].1, "ana@x.com");
    }

    #[tokio::test]
    async fn phone_is_tried_when_email_misses() {
        let resolver = resolver();
        let by_phone = resolver
            .registry()
            .seed(EntityKind::Contact, json!({"phone": "718-555-1212"}))
            .await;

        let resolved = resolver
            .resolve(&ResolveRequest {
                email: Some("new@x.com".to_string()),
                phone: Some("718-555-1212".to_string()),
                ..ResolveRequest::default()
            })
            .await
            .unwrap();
        assert!(!resolved.created);
        assert_eq!(resolved.id, by_phone);

        let queries = resolver.registry().search_queries().await;
        assert_eq!(queries.len(), 2);
    }

    #[tokio::test]
    async fn existing_id_skips_the_search_chain() {
        let resolver = resolver();
        let id = resolver
            .registry()
            .seed(EntityKind::Contact, json!({"email": "ana@x.com"}))
            .await;

        let resolved = resolver
            .resolve(&ResolveRequest {
                existing_id: Some(id.clone()),
                contact_type: Some("owner".to_string()),
                ..ResolveRequest::default()
            })
            .await
            .unwrap();
        assert_eq!(resolved.id, id);
        assert!(!resolved.created);
        assert!(resolver.registry().search_queries().await.is_empty());

        let record = resolver.registry().get(EntityKind::Contact, &id).await.unwrap();
        assert_eq!(record.str_field("contact_type"), Some("owner"));
        // Fields the caller did not supply stay untouched.
        assert_eq!(record.str_field("email"), Some("ana@x.com"));
    }

    #[tokio::test]
    async fn caller_notes_keep_the_marker_appended() {
        let resolver = resolver();
        let resolved = resolver
            .resolve(&ResolveRequest {
                email: Some("ana@x.com".to_string()),
                notes: Some("prefers morning calls".to_string()),
                ..ResolveRequest::default()
            })
            .await
            .unwrap();

        let record = resolver
            .registry()
            .get(EntityKind::Contact, &resolved.id)
            .await
            .unwrap();
        assert_eq!(
            record.str_field("notes"),
            Some("prefers morning calls\n[via stakeholder portal]")
        );
    }

    #[tokio::test]
    async fn empty_request_is_rejected() {
        let resolver = resolver();
        let err = resolver
            .resolve(&ResolveRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::EmptyRequest));
        assert!(resolver.registry().records(EntityKind::Contact).await.is_empty());
    }

    #[tokio::test]
    async fn resolution_logs_portal_audit_events() {
        let resolver = resolver();
        resolver
            .resolve(&ResolveRequest {
                email: Some("ana@x.com".to_string()),
                ..ResolveRequest::default()
            })
            .await
            .unwrap();
        resolver
            .resolve(&ResolveRequest {
                email: Some("ana@x.com".to_string()),
                ..ResolveRequest::default()
            })
            .await
            .unwrap();

        let events = resolver.registry().records(EntityKind::Event).await;
        let names: Vec<_> = events.iter().filter_map(|e| e.str_field("name")).collect();
        assert_eq!(names, vec!["contact.created", "contact.updated"]);
    }
}
