use crate::http::HttpSettings;
use std::env;

pub const DEFAULT_BASE_URL: &str = "https://api.mercadolibre.com";
pub const DEFAULT_SITE_ID: &str = "MCO";
pub const DEFAULT_CATEGORY_FACET: &str = "category";
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Upstream marketplace settings, read once at startup.
#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    pub base_url: String,
    pub site_id: String,
    /// Facet id that carries category information in search filters.
    pub category_facet: String,
    /// Upper bound on item assemblies in flight for one search response.
    pub concurrency: usize,
    pub http: HttpSettings,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            site_id: DEFAULT_SITE_ID.to_string(),
            category_facet: DEFAULT_CATEGORY_FACET.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            http: HttpSettings::default(),
        }
    }
}

impl MarketplaceConfig {
    pub fn from_env() -> Self {
        let base_url = env::var("MARKETPLACE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let concurrency = env::var("ASSEMBLY_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_CONCURRENCY);
        Self {
            base_url: normalize_base_url(&base_url),
            site_id: env::var("MARKETPLACE_SITE_ID")
                .unwrap_or_else(|_| DEFAULT_SITE_ID.to_string()),
            category_facet: env::var("MARKETPLACE_CATEGORY_FACET")
                .unwrap_or_else(|_| DEFAULT_CATEGORY_FACET.to_string()),
            concurrency,
            http: HttpSettings::from_env(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slashes() {
        let config = MarketplaceConfig::default().with_base_url("https://api.example.com//");
        assert_eq!(config.base_url, "https://api.example.com");
    }

    #[test]
    fn defaults_target_colombian_site() {
        let config = MarketplaceConfig::default();
        assert_eq!(config.site_id, "MCO");
        assert_eq!(config.category_facet, "category");
        assert!(config.concurrency > 0);
    }
}
