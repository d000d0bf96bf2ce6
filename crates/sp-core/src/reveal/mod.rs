//! Reveal Authorizer.
//!
//! Decides whether a caller who claims an email or phone number may see
//! the full details behind a record's linked contacts, using the same
//! multi-key identity matching as resolution. The claim is ephemeral: it
//! is matched against the registry and discarded, never stored.
//!
//! Disclosure is bounded by construction: the only PII this path exposes
//! is filtered to contacts the target record already links to. Anything
//! richer is gated by authentication outside this subsystem.

use crate::assoc::ContactLinks;
use crate::identity::phone_candidate_keys;
use crate::models::{Business, Contact, Property, SafeBusiness, SafeContact, SafeProperty};
use futures::future::join_all;
use sp_registry::{EntityKind, Record, Registry, RegistryError};
use thiserror::Error;
use tracing::{debug, warn};

/// Maximum concurrent by-id fetches per batch. Batches run sequentially
/// to bound registry load.
pub const FETCH_BATCH_SIZE: usize = 10;

/// Errors surfaced by reveal operations.
#[derive(Error, Debug, Clone)]
pub enum RevealError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result type for reveal operations.
pub type RevealResult<T> = Result<T, RevealError>;

/// A caller-supplied identity claim: proof of knowledge of an email or
/// phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityClaim {
    Email(String),
    Phone(String),
}

impl IdentityClaim {
    /// The registry search keys this claim expands to. An email claim is
    /// a single trimmed key; a phone claim becomes the candidate key set
    /// (raw, all digits, last-10, last-7) so formatted, partial, and
    /// country-coded inputs all land on a genuine digit-suffix match.
    pub fn search_keys(&self) -> Vec<String> {
        match self {
            IdentityClaim::Email(email) => {
                let trimmed = email.trim();
                if trimmed.is_empty() {
                    Vec::new()
                } else {
                    vec![trimmed.to_string()]
                }
            }
            IdentityClaim::Phone(phone) => phone_candidate_keys(phone),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            IdentityClaim::Email(_) => "email",
            IdentityClaim::Phone(_) => "phone",
        }
    }
}

/// The outcome of an authorization check: which of the target's linked
/// contacts the claim proved knowledge of. Empty means nothing may be
/// disclosed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authorization {
    pub matched_contact_ids: Vec<String>,
}

impl Authorization {
    pub fn is_authorized(&self) -> bool {
        !self.matched_contact_ids.is_empty()
    }
}

/// Everything linked to the contacts an identity claim resolves to,
/// projected down to safe public views.
#[derive(Debug, Clone, Default)]
pub struct AssociatedRecords {
    pub contacts: Vec<SafeContact>,
    pub businesses: Vec<SafeBusiness>,
    pub properties: Vec<SafeProperty>,
}

/// Authorizes privacy-preserving reveals against the registry.
pub struct RevealAuthorizer<R: Registry> {
    registry: R,
}

impl<R: Registry> RevealAuthorizer<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Resolves a claim to the registry contacts it matches: one search
    /// per key, results unioned, deduplicated by contact id with first
    /// occurrence kept.
    pub async fn resolve_claim(&self, claim: &IdentityClaim) -> RevealResult<Vec<Contact>> {
        let mut contacts: Vec<Contact> = Vec::new();
        for key in claim.search_keys() {
            let hits = self.registry.search(EntityKind::Contact, &key).await?;
            for record in hits {
                match record.parse::<Contact>() {
                    Ok(contact) => {
                        if !contacts.iter().any(|c| c.id == contact.id) {
                            contacts.push(contact);
                        }
                    }
                    Err(e) => warn!(error = %e, "skipping malformed contact record"),
                }
            }
        }
        debug!(kind = claim.kind(), matched = contacts.len(), "claim resolved");
        Ok(contacts)
    }

    /// Checks a claim against a record's linked contacts.
    ///
    /// The claim is authorized iff the contacts it resolves to intersect
    /// `target_contact_ids`; the intersection is exactly what may be
    /// disclosed. All-or-nothing per contact, no partial-confidence
    /// scores, and never an id outside the target set.
    pub async fn authorize(
        &self,
        claim: &IdentityClaim,
        target_contact_ids: &[String],
    ) -> RevealResult<Authorization> {
        let resolved = self.resolve_claim(claim).await?;
        let matched_contact_ids = resolved
            .iter()
            .filter(|c| target_contact_ids.contains(&c.id))
            .map(|c| c.id.clone())
            .collect();
        Ok(Authorization {
            matched_contact_ids,
        })
    }

    /// The full reveal flow: resolve the claim, then gather the
    /// businesses and properties linked to the matched contacts, all
    /// projected to safe views whose contact id lists are filtered to
    /// the resolved set.
    pub async fn associated_records(
        &self,
        claim: &IdentityClaim,
    ) -> RevealResult<AssociatedRecords> {
        let contacts = self.resolve_claim(claim).await?;
        if contacts.is_empty() {
            return Ok(AssociatedRecords::default());
        }
        let contact_ids: Vec<String> = contacts.iter().map(|c| c.id.clone()).collect();
        let representative = &contacts[0];

        let businesses = self
            .linked_records(EntityKind::Business, &contact_ids, representative)
            .await?;
        let properties = self
            .linked_records(EntityKind::Property, &contact_ids, representative)
            .await?;

        Ok(AssociatedRecords {
            contacts: contacts.iter().map(SafeContact::from).collect(),
            businesses: businesses
                .iter()
                .filter_map(|r| r.parse::<Business>().ok())
                .filter(|b| b.links_any(&contact_ids))
                .map(|b| SafeBusiness::redacted(&b, &contact_ids))
                .collect(),
            properties: properties
                .iter()
                .filter_map(|r| r.parse::<Property>().ok())
                .filter(|p| p.links_any(&contact_ids))
                .map(|p| SafeProperty::redacted(&p, &contact_ids))
                .collect(),
        })
    }

    /// The one seam where a structured batch query may fall back to a
    /// broad free-text search.
    ///
    /// The batch path is tried once; any rejection switches to a single
    /// broad query keyed by the representative contact's email (or name),
    /// filtered client-side to records actually linked to the resolved
    /// set. One extra round trip buys resilience against registries that
    /// cannot filter by contact ids.
    async fn linked_records(
        &self,
        kind: EntityKind,
        contact_ids: &[String],
        representative: &Contact,
    ) -> RevealResult<Vec<Record>> {
        match self
            .registry
            .search_by_contact_ids(kind, contact_ids)
            .await
        {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(kind = %kind, error = %e, "batch query failed, falling back to broad search");
                let query = representative
                    .email
                    .as_deref()
                    .or(representative.name.as_deref())
                    .unwrap_or_default()
                    .to_string();
                let broad = self.registry.search(kind, &query).await?;
                Ok(broad
                    .into_iter()
                    .filter(|record| {
                        record
                            .0
                            .get("contact_ids")
                            .and_then(serde_json::Value::as_array)
                            .map(|ids| {
                                ids.iter()
                                    .filter_map(|v| sp_registry::coerce_id(Some(v)))
                                    .any(|id| contact_ids.contains(&id))
                            })
                            .unwrap_or(false)
                    })
                    .collect())
            }
        }
    }

    /// Fetches records by id in sequential batches of
    /// [`FETCH_BATCH_SIZE`] concurrent requests, bounding registry load.
    /// Results are concatenated across batches in input order; callers
    /// work from already-deduplicated id sets.
    pub async fn fetch_by_ids(
        &self,
        kind: EntityKind,
        ids: &[String],
    ) -> RevealResult<Vec<Record>> {
        let mut records = Vec::with_capacity(ids.len());
        for batch in ids.chunks(FETCH_BATCH_SIZE) {
            let fetches: Vec<_> = batch.iter().map(|id| self.registry.get(kind, id)).collect();
            for result in join_all(fetches).await {
                records.push(result?);
            }
        }
        Ok(records)
    }

    /// Hydrates an association-index document into full registry records.
    pub async fn hydrate_links(
        &self,
        links: &ContactLinks,
    ) -> RevealResult<(Vec<Business>, Vec<Property>)> {
        let businesses = self
            .fetch_by_ids(EntityKind::Business, &links.businesses)
            .await?
            .iter()
            .filter_map(|r| r.parse::<Business>().ok())
            .collect();
        let properties = self
            .fetch_by_ids(EntityKind::Property, &links.properties)
            .await?
            .iter()
            .filter_map(|r| r.parse::<Property>().ok())
            .collect();
        Ok((businesses, properties))
    }
}
