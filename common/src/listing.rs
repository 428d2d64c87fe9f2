use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::filter_translator::QueryParams;
use crate::listing_const::PAGE_SIZE;


/// One car listing as returned by the cars endpoint. Only `price` and `year`
/// are interpreted, every other field passes through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ListingRecord {
    fields: Map<String, Value>,
}

impl ListingRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn price(&self) -> Option<&Value> {
        self.get("price")
    }

    pub fn year(&self) -> Option<&Value> {
        self.get("year")
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Objects become records, anything else is not a listing.
    pub fn from_json(value: &Value) -> Option<Self> {
        value.as_object().map(|fields| Self::new(fields.clone()))
    }
}

impl From<Map<String, Value>> for ListingRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_pages: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { total_pages: 1 }
    }
}

/// Envelope of the cars endpoint: `{ data, pagination: { totalPages } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ListingPage {
    pub data: Vec<ListingRecord>,
    pub pagination: Pagination,
}


/// One page request against the cars endpoint. Pages start at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRequest {
    pub params: QueryParams,
    pub page: u64,
    pub limit: u64,
}

impl ListingRequest {
    pub fn new(params: QueryParams) -> Self {
        Self { params, page: 1, limit: PAGE_SIZE }
    }

    pub fn with_page(self, page: u64) -> Self {
        Self { page: page.max(1), ..self }
    }

    pub fn with_limit(self, limit: u64) -> Self {
        Self { limit: limit.max(1), ..self }
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.params.query_pairs();
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs.push(("limit".to_string(), self.limit.to_string()));
        pairs
    }
}
