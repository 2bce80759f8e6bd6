use crate::marketplace::models::{RawFilter, RawItem, RawSearchResult, path_names};
use crate::marketplace::{MarketplaceClient, MarketplaceError};
use crate::models::{ItemDetail, Price, ResponseEnvelope, SearchParams, SimplifiedItem};
use futures::{StreamExt, TryStreamExt, stream};
use std::{future::Future, time::Instant};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Clone)]
pub struct Assembler {
    client: MarketplaceClient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemMode {
    Summary,
    Detail,
}

impl Assembler {
    pub fn new(client: MarketplaceClient) -> Self {
        Self { client }
    }

    /// Upstream search followed by search-mode assembly.
    pub async fn search(&self, params: &SearchParams) -> Result<ResponseEnvelope, AssemblyError> {
        let started = Instant::now();
        let raw = self
            .client
            .search(params.q.as_deref(), params.limit.as_deref())
            .await?;
        let envelope = self.assemble_search(raw).await?;
        info!(
            target = "items.api",
            query = params.q.as_deref().unwrap_or(""),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search_assembled"
        );
        Ok(envelope)
    }

    /// Upstream item lookup followed by detail-mode assembly.
    pub async fn detail(&self, item_id: &str) -> Result<ResponseEnvelope, AssemblyError> {
        let started = Instant::now();
        let raw = self.client.item(item_id).await?;
        let envelope = self.assemble_detail(raw).await?;
        info!(
            target = "items.api",
            item_id = item_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "detail_assembled"
        );
        Ok(envelope)
    }

    pub async fn assemble_search(
        &self,
        raw: RawSearchResult,
    ) -> Result<ResponseEnvelope, AssemblyError> {
        let RawSearchResult {
            results,
            filters,
            available_filters,
        } = raw;
        let concurrency = self.client.config().concurrency.max(1);

        let items = map_in_order(results, concurrency, |item| {
            self.assemble_item(item, ItemMode::Summary)
        });
        let categories = self.select_categories(&filters, &available_filters);
        let (items, categories) = tokio::try_join!(items, categories)?;

        Ok(ResponseEnvelope::search(categories, items))
    }

    pub async fn assemble_detail(&self, raw: RawItem) -> Result<ResponseEnvelope, AssemblyError> {
        let category_id = raw
            .category_id
            .clone()
            .ok_or_else(|| AssemblyError::missing_field("categories", "category_id"))?;

        let item = self.assemble_item(raw, ItemMode::Detail);
        let categories = async {
            self.client
                .category_path(&category_id)
                .await
                .map_err(AssemblyError::from)
        };
        let (item, categories) = tokio::try_join!(item, categories)?;

        Ok(ResponseEnvelope::detail(categories, item))
    }

    pub async fn assemble_item(
        &self,
        raw: RawItem,
        mode: ItemMode,
    ) -> Result<SimplifiedItem, AssemblyError> {
        let mut item = summarize(&raw);
        if mode == ItemMode::Detail {
            let description = self.client.description(&raw.id).await?;
            item.detail = Some(ItemDetail {
                sold_quantity: raw.sold_quantity.unwrap_or(0),
                description,
            });
        }
        Ok(item)
    }

    /// Exact path when upstream already resolved a category filter, otherwise
    /// the path of the most populated category facet value.
    pub async fn select_categories(
        &self,
        filters: &[RawFilter],
        available_filters: &[RawFilter],
    ) -> Result<Vec<String>, AssemblyError> {
        let facet = self.client.config().category_facet.as_str();
        if !filters.is_empty() {
            return Ok(exact_category_path(filters, facet));
        }

        let Some(category_id) = most_popular_category(available_filters, facet) else {
            debug!(target = "items.api", facet = facet, "no_category_facet");
            return Ok(Vec::new());
        };
        debug!(
            target = "items.api",
            category_id = category_id,
            "best_effort_category"
        );
        Ok(self.client.category_path(category_id).await?)
    }
}

/// Runs `f` over `inputs` with at most `limit` futures in flight. Output order
/// follows `inputs`, not completion order; the first error aborts the rest.
pub async fn map_in_order<T, R, F, Fut>(
    inputs: Vec<T>,
    limit: usize,
    f: F,
) -> Result<Vec<R>, AssemblyError>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R, AssemblyError>>,
{
    stream::iter(inputs)
        .map(f)
        .buffered(limit.max(1))
        .try_collect()
        .await
}

/// Base fields shared by both modes; `decimals` is fixed at 0.
pub fn summarize(raw: &RawItem) -> SimplifiedItem {
    SimplifiedItem {
        id: raw.id.clone(),
        title: raw.title.clone(),
        price: Price {
            currency: raw.currency_id.clone(),
            amount: raw.price.clone(),
            decimals: 0,
        },
        location: raw.state_name().map(str::to_string),
        picture: raw.thumbnail.clone(),
        condition: raw.condition.clone(),
        free_shipping: raw.free_shipping(),
        detail: None,
    }
}

pub fn exact_category_path(filters: &[RawFilter], facet: &str) -> Vec<String> {
    filters
        .iter()
        .find(|filter| filter.id == facet)
        .and_then(|filter| filter.values.first())
        .and_then(|value| value.path_from_root.as_deref())
        .map(path_names)
        .unwrap_or_default()
}

/// Id of the facet value with the highest `results` count. Ties go to the
/// value listed first upstream.
pub fn most_popular_category<'a>(available_filters: &'a [RawFilter], facet: &str) -> Option<&'a str> {
    let filter = available_filters.iter().find(|filter| filter.id == facet)?;
    let mut best: Option<(&str, u64)> = None;
    for value in &filter.values {
        let Some(id) = value.id.as_deref() else {
            continue;
        };
        let count = value.results.unwrap_or(0);
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((id, count));
        }
    }
    best.map(|(id, _)| id)
}

#[derive(Debug, Error)]
#[error("stage `{stage}` failed: {message}")]
pub struct AssemblyError {
    stage: &'static str,
    message: String,
    kind: AssemblyErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyErrorKind {
    Upstream,
    MissingField,
}

impl AssemblyError {
    pub fn upstream(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: AssemblyErrorKind::Upstream,
        }
    }

    pub fn missing_field(stage: &'static str, field: &str) -> Self {
        Self {
            stage,
            message: format!("missing field `{field}`"),
            kind: AssemblyErrorKind::MissingField,
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn kind(&self) -> AssemblyErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.message
    }
}

impl From<MarketplaceError> for AssemblyError {
    fn from(err: MarketplaceError) -> Self {
        match err {
            MarketplaceError::MissingField { resource, field } => {
                Self::missing_field(resource, field)
            }
            MarketplaceError::Request { resource, .. }
            | MarketplaceError::Status { resource, .. }
            | MarketplaceError::Deserialize { resource, .. } => {
                let message = err.to_string();
                Self::upstream(resource, message)
            }
        }
    }
}
