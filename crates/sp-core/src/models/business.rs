//! Business record view.

use super::{string_id, string_id_list};
use serde::{Deserialize, Serialize};

/// A business as stored in the registry. The registry owns the record;
/// this subsystem reads it and pushes updates to `contact_ids` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "string_id_list")]
    pub contact_ids: Vec<String>,
}

impl Business {
    /// True when any of this record's linked contacts is in `ids`.
    pub fn links_any(&self, ids: &[String]) -> bool {
        self.contact_ids.iter().any(|id| ids.contains(id))
    }
}

/// Public projection of a business: record basics with `contact_ids`
/// filtered to an allowed set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafeBusiness {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub contact_ids: Vec<String>,
}

impl SafeBusiness {
    pub fn redacted(business: &Business, allowed_contact_ids: &[String]) -> Self {
        Self {
            id: business.id.clone(),
            name: business.name.clone(),
            address: business.address.clone(),
            url: business.url.clone(),
            email: business.email.clone(),
            phone: business.phone.clone(),
            contact_ids: business
                .contact_ids
                .iter()
                .filter(|id| allowed_contact_ids.contains(id))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn contact_ids_are_string_coerced() {
        let business: Business = serde_json::from_value(json!({
            "id": "b-1",
            "name": "Cafe",
            "contact_ids": ["c-1", 7, null]
        }))
        .unwrap();
        assert_eq!(business.contact_ids, vec!["c-1", "7"]);
    }

    #[test]
    fn missing_contact_ids_default_empty() {
        let business: Business =
            serde_json::from_value(json!({"id": "b-1", "name": "Cafe"})).unwrap();
        assert!(business.contact_ids.is_empty());
    }

    #[test]
    fn redacted_filters_foreign_contacts() {
        let business: Business = serde_json::from_value(json!({
            "id": "b-1",
            "name": "Cafe",
            "contact_ids": ["c-1", "c-2", "c-3"]
        }))
        .unwrap();
        let safe = SafeBusiness::redacted(&business, &["c-2".to_string()]);
        assert_eq!(safe.contact_ids, vec!["c-2"]);
    }
}
