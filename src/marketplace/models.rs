use serde::Deserialize;
use serde_json::Number;

#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchResult {
    #[serde(default)]
    pub results: Vec<RawItem>,
    #[serde(default)]
    pub filters: Vec<RawFilter>,
    #[serde(default)]
    pub available_filters: Vec<RawFilter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    pub id: String,
    pub title: String,
    pub currency_id: String,
    /// Kept as a JSON number so integral prices serialize back unchanged.
    #[serde(default)]
    pub price: Option<Number>,
    #[serde(default)]
    pub seller_address: Option<SellerAddress>,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub shipping: Option<Shipping>,
    #[serde(default)]
    pub sold_quantity: Option<u64>,
    #[serde(default)]
    pub category_id: Option<String>,
}

impl RawItem {
    pub fn state_name(&self) -> Option<&str> {
        self.seller_address
            .as_ref()
            .and_then(|address| address.state.as_ref())
            .map(|state| state.name.as_str())
    }

    pub fn free_shipping(&self) -> bool {
        self.shipping
            .as_ref()
            .map(|shipping| shipping.free_shipping)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SellerAddress {
    #[serde(default)]
    pub state: Option<NamedRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Shipping {
    #[serde(default)]
    pub free_shipping: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFilter {
    pub id: String,
    #[serde(default)]
    pub values: Vec<RawFilterValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFilterValue {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub results: Option<u64>,
    #[serde(default)]
    pub path_from_root: Option<Vec<NamedRef>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub path_from_root: Option<Vec<NamedRef>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemDescription {
    #[serde(default)]
    pub plain_text: Option<String>,
}

/// Names of a root-to-leaf path, in order.
pub fn path_names(path: &[NamedRef]) -> Vec<String> {
    path.iter().map(|node| node.name.clone()).collect()
}
