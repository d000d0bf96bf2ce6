//! Association Index Manager.
//!
//! A derived, eventually-consistent index mapping contacts to the
//! businesses and properties they are linked to, and the reverse. It is
//! kept in the injected [`AssociationStore`] so "everything linked to this
//! person" never requires scanning the registry. The registry remains the
//! system of record; this index can always be rebuilt by re-linking.
//!
//! The three documents touched by a `link` are written independently and
//! are not atomic as a group: a crash between writes leaves a transient
//! one-sided link, and concurrent `link` calls for the same id can lose an
//! update (unguarded read-modify-write). Both are accepted trade-offs at
//! current write volumes; the narrow `get`/`set` seam is where per-key
//! versioning would land if contention grows.

mod error;
mod types;

pub use error::{AssocError, AssocResult};
pub use types::{ContactLinks, EntityContacts, LinkTargets};

use crate::store::AssociationStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

const CONTACT_KEY_PREFIX: &str = "assoc:contact:";
const BUSINESS_KEY_PREFIX: &str = "assoc:business:";
const PROPERTY_KEY_PREFIX: &str = "assoc:property:";

fn contact_key(id: &str) -> String {
    format!("{}{}", CONTACT_KEY_PREFIX, id)
}

fn business_key(id: &str) -> String {
    format!("{}{}", BUSINESS_KEY_PREFIX, id)
}

fn property_key(id: &str) -> String {
    format!("{}{}", PROPERTY_KEY_PREFIX, id)
}

/// Deduplicates an id list: drops empties, keeps first-occurrence order,
/// collapses exact duplicates. No trimming or case folding; ids are
/// opaque strings.
fn uniq(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !id.is_empty() && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Maintains contact↔business and contact↔property link sets.
///
/// Holds an optional store: when the deployment supplies none, `link`
/// becomes a no-op and reads return empty defaults, so the primary
/// operation never fails for lack of an index.
pub struct AssociationIndex {
    store: Option<Arc<dyn AssociationStore>>,
}

impl AssociationIndex {
    pub fn new(store: Option<Arc<dyn AssociationStore>>) -> Self {
        Self { store }
    }

    /// An index with no backing store; every operation degrades.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Records that a contact is linked to a business and/or property.
    ///
    /// Performs up to three independent read-modify-write cycles: the
    /// contact document always, the business and property documents only
    /// when the corresponding id was supplied. Returns `Ok(())` without
    /// touching anything when no store is configured.
    pub async fn link(&self, contact_id: &str, targets: &LinkTargets) -> AssocResult<()> {
        let Some(store) = &self.store else {
            debug!(contact_id, "association store absent, skipping link");
            return Ok(());
        };

        let cid = contact_id.to_string();
        let ckey = contact_key(&cid);
        let mut links: ContactLinks = read_doc(store.as_ref(), &ckey).await?;
        if let Some(business_id) = &targets.business_id {
            links.businesses = uniq(
                links
                    .businesses
                    .into_iter()
                    .chain(std::iter::once(business_id.clone()))
                    .collect(),
            );
        }
        if let Some(property_id) = &targets.property_id {
            links.properties = uniq(
                links
                    .properties
                    .into_iter()
                    .chain(std::iter::once(property_id.clone()))
                    .collect(),
            );
        }
        write_doc(store.as_ref(), &ckey, &links).await?;

        if let Some(business_id) = &targets.business_id {
            let bkey = business_key(business_id);
            let mut doc: EntityContacts = read_doc(store.as_ref(), &bkey).await?;
            doc.contacts = uniq(
                doc.contacts
                    .into_iter()
                    .chain(std::iter::once(cid.clone()))
                    .collect(),
            );
            write_doc(store.as_ref(), &bkey, &doc).await?;
        }

        if let Some(property_id) = &targets.property_id {
            let pkey = property_key(property_id);
            let mut doc: EntityContacts = read_doc(store.as_ref(), &pkey).await?;
            doc.contacts = uniq(
                doc.contacts
                    .into_iter()
                    .chain(std::iter::once(cid.clone()))
                    .collect(),
            );
            write_doc(store.as_ref(), &pkey, &doc).await?;
        }

        debug!(
            contact_id,
            business_id = targets.business_id.as_deref(),
            property_id = targets.property_id.as_deref(),
            "association recorded"
        );
        Ok(())
    }

    /// The stored links for a contact, verbatim; the empty default when
    /// the key is missing or no store is configured. Never queries the
    /// registry.
    pub async fn links_for(&self, contact_id: &str) -> AssocResult<ContactLinks> {
        let Some(store) = &self.store else {
            return Ok(ContactLinks::default());
        };
        read_doc(store.as_ref(), &contact_key(contact_id)).await
    }

    /// The contacts recorded against a business.
    pub async fn contacts_for_business(&self, business_id: &str) -> AssocResult<Vec<String>> {
        let Some(store) = &self.store else {
            return Ok(Vec::new());
        };
        let doc: EntityContacts = read_doc(store.as_ref(), &business_key(business_id)).await?;
        Ok(doc.contacts)
    }

    /// The contacts recorded against a property.
    pub async fn contacts_for_property(&self, property_id: &str) -> AssocResult<Vec<String>> {
        let Some(store) = &self.store else {
            return Ok(Vec::new());
        };
        let doc: EntityContacts = read_doc(store.as_ref(), &property_key(property_id)).await?;
        Ok(doc.contacts)
    }
}

async fn read_doc<T: DeserializeOwned + Default>(
    store: &dyn AssociationStore,
    key: &str,
) -> AssocResult<T> {
    match store.get(key).await? {
        None => Ok(T::default()),
        Some(raw) => serde_json::from_str(&raw).map_err(|e| AssocError::Corrupt {
            key: key.to_string(),
            detail: e.to_string(),
        }),
    }
}

async fn write_doc<T: Serialize>(
    store: &dyn AssociationStore,
    key: &str,
    doc: &T,
) -> AssocResult<()> {
    let raw = serde_json::to_string(doc).map_err(|e| AssocError::Corrupt {
        key: key.to_string(),
        detail: e.to_string(),
    })?;
    store.set(key, &raw).await?;
    Ok(())
}
