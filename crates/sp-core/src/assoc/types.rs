//! Association index document types.

use serde::{Deserialize, Serialize};

/// The links recorded for one contact: the businesses and properties it
/// has been associated with. Sets are stored as deduplicated,
/// insertion-ordered id lists; order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactLinks {
    #[serde(default)]
    pub businesses: Vec<String>,
    #[serde(default)]
    pub properties: Vec<String>,
}

impl ContactLinks {
    pub fn is_empty(&self) -> bool {
        self.businesses.is_empty() && self.properties.is_empty()
    }
}

/// The reverse side: the contacts linked to one business or property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityContacts {
    #[serde(default)]
    pub contacts: Vec<String>,
}

/// The targets of a `link` call. Either, both, or neither side may be
/// supplied; only supplied sides get their reverse documents touched.
#[derive(Debug, Clone, Default)]
pub struct LinkTargets {
    pub business_id: Option<String>,
    pub property_id: Option<String>,
}

impl LinkTargets {
    pub fn business(id: impl Into<String>) -> Self {
        Self {
            business_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn property(id: impl Into<String>) -> Self {
        Self {
            property_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_property(mut self, id: impl Into<String>) -> Self {
        self.property_id = Some(id.into());
        self
    }
}
