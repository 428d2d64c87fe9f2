//! Translation of a facet selection into cars endpoint query parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::facet::{Cardinality, FacetField, FacetSelection, FacetValue};
use crate::listing_const::{PRICE_MAX, PRICE_MIN};


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Int(i64),
    Text(String),
}

impl std::fmt::Display for QueryValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&FacetValue> for QueryValue {
    fn from(value: &FacetValue) -> Self {
        match value {
            FacetValue::Int(i) => Self::Int(*i),
            FacetValue::Text(s) => Self::Text(s.clone()),
        }
    }
}


/// Backend-ready parameters. A missing key means "no constraint".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct QueryParams {
    params: BTreeMap<String, QueryValue>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.params.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parameters as string pairs, ready for a URL query string.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.params.iter().map(|(k, v)| (k.clone(), v.to_string())).collect()
    }

    fn insert(&mut self, key: &str, value: QueryValue) {
        self.params.insert(key.to_string(), value);
    }
}


/// The listing pages that share the translator. They differ only in which
/// facets they expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingPageKind {
    Public,
    Approved,
    Waitlist,
}

const PUBLIC_FIELDS: &[FacetField] = &[
    FacetField::Year,
    FacetField::Brand,
    FacetField::Model,
    FacetField::BodyType,
    FacetField::Transmission,
    FacetField::FuelType,
    FacetField::Drivetrain,
    FacetField::Color,
    FacetField::City,
    FacetField::Seats,
];


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTranslator {
    fields: Vec<FacetField>,
}

impl Default for FilterTranslator {
    fn default() -> Self {
        Self::all()
    }
}

impl FilterTranslator {
    pub fn new(fields: impl IntoIterator<Item = FacetField>) -> Self {
        let mut unique = Vec::new();
        for field in fields {
            if !unique.contains(&field) {
                unique.push(field);
            }
        }
        Self { fields: unique }
    }

    pub fn all() -> Self {
        Self::new(FacetField::ALL)
    }

    pub fn for_page(kind: ListingPageKind) -> Self {
        match kind {
            // status is a moderation facet, buyers never filter on it
            ListingPageKind::Public => Self::new(PUBLIC_FIELDS.iter().copied()),
            ListingPageKind::Approved | ListingPageKind::Waitlist => Self::all(),
        }
    }

    pub fn fields(&self) -> &[FacetField] {
        &self.fields
    }

    pub fn translate(&self, selection: &FacetSelection) -> QueryParams {
        let mut params = QueryParams::new();

        for field in &self.fields {
            let values = selection.values(*field).iter().collect::<Vec<_>>();
            match field.cardinality() {
                Cardinality::Single => {
                    // zero or several values mean "match all" for exact-equality fields
                    if let [only] = values.as_slice() {
                        if !only.is_blank() {
                            params.insert(field.param_name(), QueryValue::from(*only));
                        }
                    }
                }
                Cardinality::AnyOf => {
                    if values.iter().any(|v| !v.is_blank()) {
                        let joined = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("|");
                        params.insert(field.param_name(), QueryValue::Text(joined));
                    }
                }
            }
        }

        let range = selection.price_range.clamped();
        if range.min > PRICE_MIN {
            params.insert("minPrice", QueryValue::Int(range.min));
        }
        if range.max < PRICE_MAX {
            params.insert("maxPrice", QueryValue::Int(range.max));
        }

        params
    }
}

/// Translate over every facet. A missing selection yields no parameters.
pub fn translate(selection: Option<&FacetSelection>) -> QueryParams {
    match selection {
        Some(selection) => FilterTranslator::all().translate(selection),
        None => QueryParams::new(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet::PriceRange;

    fn selection_with(field: FacetField, values: &[&str]) -> FacetSelection {
        let mut selection = FacetSelection::new();
        for v in values {
            selection.insert(field, *v);
        }
        selection
    }

    #[test]
    fn missing_selection_translates_to_nothing() {
        assert!(translate(None).is_empty());
        assert!(translate(Some(&FacetSelection::new())).is_empty());
    }

    #[test]
    fn single_value_fields_need_exactly_one_value() {
        let one = selection_with(FacetField::Year, &["2022"]);
        assert_eq!(translate(Some(&one)).get("year"), Some(&QueryValue::Text("2022".into())));

        let two = selection_with(FacetField::Year, &["2022", "2023"]);
        assert!(!translate(Some(&two)).contains_key("year"));

        let statuses = selection_with(FacetField::Status, &["approved", "pending"]);
        assert!(translate(Some(&statuses)).is_empty());
    }

    #[test]
    fn single_value_passes_numbers_through() {
        let mut selection = FacetSelection::new();
        selection.insert(FacetField::Seats, 7_i64);
        selection.insert(FacetField::Status, "approved");
        let params = translate(Some(&selection));

        assert_eq!(params.get("seats"), Some(&QueryValue::Int(7)));
        assert_eq!(params.get("status"), Some(&QueryValue::Text("approved".into())));
    }

    #[test]
    fn multi_value_fields_join_in_insertion_order() {
        let selection = selection_with(FacetField::Brand, &["Tesla", "BMW"]);
        assert_eq!(translate(Some(&selection)).get("make"), Some(&QueryValue::Text("Tesla|BMW".into())));

        let mut selection = FacetSelection::new();
        selection.insert(FacetField::Color, "Red");
        selection.insert(FacetField::City, "Hà Nội");
        selection.insert(FacetField::City, "Đà Nẵng");
        selection.insert(FacetField::Drivetrain, "AWD");
        let params = translate(Some(&selection));
        assert_eq!(params.get("exterior_color"), Some(&QueryValue::Text("Red".into())));
        assert_eq!(params.get("city"), Some(&QueryValue::Text("Hà Nội|Đà Nẵng".into())));
        assert_eq!(params.get("drivetrain"), Some(&QueryValue::Text("AWD".into())));
    }

    #[test]
    fn blank_tokens_are_never_sent() {
        let selection = selection_with(FacetField::Model, &["", "  "]);
        assert!(translate(Some(&selection)).is_empty());

        let selection = selection_with(FacetField::Year, &[""]);
        assert!(!translate(Some(&selection)).contains_key("year"));
    }

    #[test]
    fn blank_tokens_still_count_as_selections() {
        let selection = selection_with(FacetField::Year, &["", "2020"]);
        assert!(!translate(Some(&selection)).contains_key("year"));

        let selection = selection_with(FacetField::Brand, &["", "BMW"]);
        assert_eq!(translate(Some(&selection)).get("make"), Some(&QueryValue::Text("|BMW".into())));
    }

    #[test]
    fn full_price_range_is_omitted() {
        let mut selection = FacetSelection::new();
        selection.set_price_range(0, 20_000_000_000);
        assert!(translate(Some(&selection)).is_empty());

        selection.set_price_range(100, 20_000_000_000);
        let params = translate(Some(&selection));
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("minPrice"), Some(&QueryValue::Int(100)));

        selection.set_price_range(0, 900_000_000);
        let params = translate(Some(&selection));
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("maxPrice"), Some(&QueryValue::Int(900_000_000)));
    }

    #[test]
    fn out_of_bounds_prices_are_clamped_before_comparison() {
        let mut selection = FacetSelection::new();
        selection.price_range = PriceRange::new(-10, PRICE_MAX * 3);
        assert!(translate(Some(&selection)).is_empty());
    }

    #[test]
    fn fractional_minimum_above_zero_is_sent() {
        let selection = FacetSelection::from_json(&serde_json::json!({"priceRange": {"min": 0.5}}));
        let params = translate(Some(&selection));
        assert_eq!(params.get("minPrice"), Some(&QueryValue::Int(1)));
        assert!(!params.contains_key("maxPrice"));
    }

    #[test]
    fn translation_is_idempotent() {
        let mut selection = selection_with(FacetField::Brand, &["Kia", "Mazda"]);
        selection.insert(FacetField::Year, "2019");
        selection.set_price_range(50_000_000, 800_000_000);

        let first = translate(Some(&selection));
        let second = translate(Some(&selection));
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn brand_with_multi_year_and_full_range_only_sends_make() {
        let mut selection = selection_with(FacetField::Brand, &["Toyota"]);
        selection.insert(FacetField::Year, "2021");
        selection.insert(FacetField::Year, "2022");
        selection.set_price_range(0, 20_000_000_000);

        let params = translate(Some(&selection));
        assert_eq!(params.query_pairs(), vec![("make".to_string(), "Toyota".to_string())]);
    }

    #[test]
    fn public_page_ignores_the_status_facet() {
        let mut selection = selection_with(FacetField::Status, &["approved"]);
        selection.insert(FacetField::BodyType, "Sedan");

        let public = FilterTranslator::for_page(ListingPageKind::Public).translate(&selection);
        assert!(!public.contains_key("status"));
        assert!(public.contains_key("body_type"));

        let waitlist = FilterTranslator::for_page(ListingPageKind::Waitlist).translate(&selection);
        assert!(waitlist.contains_key("status"));
    }

    #[test]
    fn params_serialize_as_a_flat_object() {
        let mut selection = selection_with(FacetField::FuelType, &["Diesel", "Hybrid"]);
        selection.insert(FacetField::Seats, 5_i64);
        let encoded = serde_json::to_value(translate(Some(&selection))).unwrap();
        assert_eq!(encoded, serde_json::json!({"fuel_type": "Diesel|Hybrid", "seats": 5}));
    }
}
