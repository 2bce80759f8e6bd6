use crate::http::build_client;
use crate::marketplace::config::MarketplaceConfig;
use crate::marketplace::models::{
    CategoryNode, ItemDescription, RawItem, RawSearchResult, path_names,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;
use urlencoding::encode;

#[derive(Debug, Error)]
pub enum MarketplaceError {
    #[error("{resource} request failed: {message}")]
    Request {
        resource: &'static str,
        message: String,
    },
    #[error("{resource} returned HTTP {status}")]
    Status {
        resource: &'static str,
        status: StatusCode,
    },
    #[error("{resource} payload invalid: {message}")]
    Deserialize {
        resource: &'static str,
        message: String,
    },
    #[error("{resource} payload has no `{field}`")]
    MissingField {
        resource: &'static str,
        field: &'static str,
    },
}

/// Thin client over the marketplace search, item, description and category
/// endpoints. Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct MarketplaceClient {
    http: Client,
    config: MarketplaceConfig,
}

impl MarketplaceClient {
    pub fn new(config: MarketplaceConfig) -> Self {
        Self {
            http: build_client(&config.http),
            config,
        }
    }

    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    /// `q` and `limit` are forwarded untouched; absent ones are left out of
    /// the upstream query string.
    pub async fn search(
        &self,
        query: Option<&str>,
        limit: Option<&str>,
    ) -> Result<RawSearchResult, MarketplaceError> {
        let url = format!(
            "{}/sites/{}/search",
            self.config.base_url,
            encode(&self.config.site_id)
        );
        let mut params: Vec<(&str, &str)> = Vec::with_capacity(2);
        if let Some(q) = query {
            params.push(("q", q));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit));
        }
        self.get_json("search", &url, &params).await
    }

    pub async fn item(&self, id: &str) -> Result<RawItem, MarketplaceError> {
        let url = format!("{}/items/{}", self.config.base_url, encode(id));
        self.get_json("item", &url, &[]).await
    }

    pub async fn description(&self, item_id: &str) -> Result<String, MarketplaceError> {
        let url = format!(
            "{}/items/{}/description",
            self.config.base_url,
            encode(item_id)
        );
        let payload: ItemDescription = self.get_json("description", &url, &[]).await?;
        payload.plain_text.ok_or(MarketplaceError::MissingField {
            resource: "description",
            field: "plain_text",
        })
    }

    /// Category names from the taxonomy root down to `category_id`, inclusive.
    pub async fn category_path(&self, category_id: &str) -> Result<Vec<String>, MarketplaceError> {
        let url = format!(
            "{}/categories/{}",
            self.config.base_url,
            encode(category_id)
        );
        let node: CategoryNode = self.get_json("categories", &url, &[]).await?;
        let path = node.path_from_root.ok_or(MarketplaceError::MissingField {
            resource: "categories",
            field: "path_from_root",
        })?;
        debug!(
            target = "items.upstream",
            category_id = %node.id,
            depth = path.len(),
            "category_path_resolved"
        );
        Ok(path_names(&path))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T, MarketplaceError> {
        let started = Instant::now();
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|err| MarketplaceError::Request {
                resource,
                message: err.to_string(),
            })?;

        let status = response.status();
        crate::metrics::upstream_elapsed(resource, started.elapsed().as_millis());
        if !status.is_success() {
            return Err(MarketplaceError::Status { resource, status });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| MarketplaceError::Deserialize {
                resource,
                message: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeMarketplace;
    use serde_json::json;

    #[tokio::test]
    async fn description_returns_plain_text() {
        let upstream = FakeMarketplace::new()
            .with_description("MCO1", "Brand new, sealed box.")
            .spawn()
            .await;
        let client = MarketplaceClient::new(upstream.config());
        let text = client.description("MCO1").await.expect("description");
        assert_eq!(text, "Brand new, sealed box.");
    }

    #[tokio::test]
    async fn category_path_flattens_names() {
        let upstream = FakeMarketplace::new()
            .with_category("MCO1055", &["Electronics", "Phones", "Smartphones"])
            .spawn()
            .await;
        let client = MarketplaceClient::new(upstream.config());
        let path = client.category_path("MCO1055").await.expect("path");
        assert_eq!(path, vec!["Electronics", "Phones", "Smartphones"]);
    }

    #[tokio::test]
    async fn category_without_path_is_missing_field() {
        let upstream = FakeMarketplace::new()
            .with_raw_category("MCO9", json!({"id": "MCO9", "name": "Orphan"}))
            .spawn()
            .await;
        let client = MarketplaceClient::new(upstream.config());
        let err = client.category_path("MCO9").await.expect_err("should fail");
        assert!(matches!(
            err,
            MarketplaceError::MissingField {
                resource: "categories",
                field: "path_from_root",
            }
        ));
    }

    #[tokio::test]
    async fn unknown_item_surfaces_status() {
        let upstream = FakeMarketplace::new().spawn().await;
        let client = MarketplaceClient::new(upstream.config());
        let err = client.item("MCO404").await.expect_err("should fail");
        match err {
            MarketplaceError::Status { resource, status } => {
                assert_eq!(resource, "item");
                assert_eq!(status, StatusCode::NOT_FOUND);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn search_forwards_query_and_limit() {
        let upstream = FakeMarketplace::new()
            .with_search(json!({"results": [], "filters": [], "available_filters": []}))
            .spawn()
            .await;
        let client = MarketplaceClient::new(upstream.config());
        client
            .search(Some("phone"), Some("2"))
            .await
            .expect("search");
        let seen = upstream.last_search_query().await.expect("query recorded");
        assert_eq!(seen.get("q").map(String::as_str), Some("phone"));
        assert_eq!(seen.get("limit").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_request_error() {
        let config = MarketplaceConfig::default().with_base_url("http://127.0.0.1:9");
        let client = MarketplaceClient::new(config);
        let err = client.search(Some("x"), None).await.expect_err("should fail");
        assert!(matches!(err, MarketplaceError::Request { resource: "search", .. }));
    }
}
