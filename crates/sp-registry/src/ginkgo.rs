//! Ginkgo community registry client.
//!
//! Ginkgo scopes every table under a community: requests go to
//! `{base_url}/community/{community_id}/{segment}`. Search endpoints take
//! a POST body with either a free-text `q` or a structured `contact_ids`
//! filter; not every deployment supports the latter, in which case the
//! server answers 400/422 and callers fall back to a broad query.

use crate::http::HttpClient;
use crate::secret::Secret;
use crate::traits::{
    EntityKind, EventFields, Fields, Record, Registry, RegistryResult,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Configuration for one community's registry access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GinkgoConfig {
    /// Community identifier scoping all requests.
    pub community_id: String,
    /// Registry API base URL.
    pub base_url: String,
    /// Community API key.
    pub api_key: Secret,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// HTTP implementation of the [`Registry`] trait against Ginkgo.
pub struct GinkgoRegistry {
    http: HttpClient,
    community_id: String,
}

impl GinkgoRegistry {
    pub fn new(config: GinkgoConfig) -> RegistryResult<Self> {
        let http = HttpClient::new(&config.base_url, config.api_key, config.timeout_secs)?;
        Ok(Self {
            http,
            community_id: config.community_id,
        })
    }

    fn path(&self, kind: EntityKind) -> String {
        format!("community/{}/{}", self.community_id, kind.segment())
    }

    fn path_with_id(&self, kind: EntityKind, id: &str) -> String {
        format!("{}/{}", self.path(kind), id)
    }
}

#[async_trait]
impl Registry for GinkgoRegistry {
    async fn search(&self, kind: EntityKind, query: &str) -> RegistryResult<Vec<Record>> {
        self.http
            .post_json(&self.path(kind), &json!({ "q": query }))
            .await
    }

    async fn search_by_contact_ids(
        &self,
        kind: EntityKind,
        contact_ids: &[String],
    ) -> RegistryResult<Vec<Record>> {
        self.http
            .post_json(&self.path(kind), &json!({ "contact_ids": contact_ids }))
            .await
    }

    async fn get(&self, kind: EntityKind, id: &str) -> RegistryResult<Record> {
        self.http.get_json(&self.path_with_id(kind, id)).await
    }

    async fn create(&self, kind: EntityKind, fields: Fields) -> RegistryResult<Record> {
        self.http.post_json(&self.path(kind), &fields).await
    }

    async fn update(&self, kind: EntityKind, id: &str, fields: Fields) -> RegistryResult<Record> {
        self.http
            .patch_json(&self.path_with_id(kind, id), &fields)
            .await
    }

    async fn log_event(&self, event: EventFields) -> RegistryResult<Record> {
        self.http.post_json(&self.path(EntityKind::Event), &event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> GinkgoRegistry {
        GinkgoRegistry::new(GinkgoConfig {
            community_id: "riverdale".to_string(),
            base_url: "https://registry.example.com".to_string(),
            api_key: Secret::new("gk_test"),
            timeout_secs: 30,
        })
        .unwrap()
    }

    #[test]
    fn paths_are_community_scoped() {
        let reg = registry();
        assert_eq!(reg.path(EntityKind::Contact), "community/riverdale/contacts");
        assert_eq!(
            reg.path_with_id(EntityKind::Business, "b-9"),
            "community/riverdale/businesses/b-9"
        );
    }

    #[test]
    fn config_defaults_timeout() {
        let config: GinkgoConfig = serde_json::from_value(json!({
            "community_id": "riverdale",
            "base_url": "https://registry.example.com",
            "api_key": "gk_test"
        }))
        .unwrap();
        assert_eq!(config.timeout_secs, 30);
    }
}
