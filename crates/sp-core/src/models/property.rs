//! Property record view.

use super::{string_id, string_id_list};
use serde::{Deserialize, Serialize};

/// A property as stored in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    #[serde(default)]
    pub address: Option<String>,
    /// Borough-block-lot parcel identifier, where the community uses one.
    #[serde(default)]
    pub bbl: Option<String>,
    #[serde(default, deserialize_with = "string_id_list")]
    pub contact_ids: Vec<String>,
}

impl Property {
    /// True when any of this record's linked contacts is in `ids`.
    pub fn links_any(&self, ids: &[String]) -> bool {
        self.contact_ids.iter().any(|id| ids.contains(id))
    }
}

/// Public projection of a property with `contact_ids` filtered to an
/// allowed set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafeProperty {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbl: Option<String>,
    pub contact_ids: Vec<String>,
}

impl SafeProperty {
    pub fn redacted(property: &Property, allowed_contact_ids: &[String]) -> Self {
        Self {
            id: property.id.clone(),
            address: property.address.clone(),
            bbl: property.bbl.clone(),
            contact_ids: property
                .contact_ids
                .iter()
                .filter(|id| allowed_contact_ids.contains(id))
                .cloned()
                .collect(),
        }
    }
}
