//! Contact record view.

use super::string_id;
use serde::{Deserialize, Serialize};

/// A contact as stored in the registry.
///
/// Identity is the registry-assigned id. `name` is the free-text fallback
/// when structured name parts are unavailable. Contacts are created by the
/// resolver and mutated through registry updates; this subsystem never
/// deletes one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub contact_type: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Contact {
    /// Best available display name: structured parts, then the free-text
    /// name, then the email.
    pub fn display_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            _ => self
                .name
                .clone()
                .or_else(|| self.email.clone()),
        }
    }
}

/// The public projection of a contact disclosed through the reveal path:
/// identity fields only, never notes or type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafeContact {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl From<&Contact> for SafeContact {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id.clone(),
            name: contact.name.clone(),
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
        }
    }
}
