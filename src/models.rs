use serde::{Deserialize, Serialize};
use serde_json::Number;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Author {
    pub name: &'static str,
    pub lastname: &'static str,
}

pub const AUTHOR: Author = Author {
    name: "Sebastián",
    lastname: "Moreno",
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Price {
    pub currency: String,
    pub amount: Option<Number>,
    /// Always 0; upstream prices are not split into units and cents.
    pub decimals: u8,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SimplifiedItem {
    pub id: String,
    pub title: String,
    pub price: Price,
    pub location: Option<String>,
    pub picture: String,
    pub condition: String,
    pub free_shipping: bool,
    #[serde(flatten)]
    pub detail: Option<ItemDetail>,
}

/// Fields only present on single-item lookups.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemDetail {
    pub sold_quantity: u64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResponseEnvelope {
    pub author: Author,
    pub categories: Vec<String>,
    #[serde(flatten)]
    pub body: EnvelopeBody,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum EnvelopeBody {
    #[serde(rename = "items")]
    Items(Vec<SimplifiedItem>),
    #[serde(rename = "item")]
    Item(Box<SimplifiedItem>),
}

impl ResponseEnvelope {
    pub fn search(categories: Vec<String>, items: Vec<SimplifiedItem>) -> Self {
        Self {
            author: AUTHOR,
            categories,
            body: EnvelopeBody::Items(items),
        }
    }

    pub fn detail(categories: Vec<String>, item: SimplifiedItem) -> Self {
        Self {
            author: AUTHOR,
            categories,
            body: EnvelopeBody::Item(Box::new(item)),
        }
    }
}
