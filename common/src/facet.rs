//! Facet selection model: the filter values a listing page currently has checked.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::listing_const::{PRICE_MAX, PRICE_MIN};


/// A single selected token. Years and seat counts keep the form the UI supplied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum FacetValue {
    Int(i64),
    Text(String),
}

impl FacetValue {
    /// Accepts JSON strings and numbers, anything else is not a facet token.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Some(Self::Int(i));
                }
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 => Some(Self::Int(f as i64)),
                    _ => Some(Self::Text(n.to_string())),
                }
            }
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Int(_) => false,
        }
    }
}

impl std::fmt::Display for FacetValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Int(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for FacetValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FacetValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FacetValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}


/// How the backend matches a facet parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exact equality: only sent when exactly one value is selected.
    Single,
    /// Case-insensitive alternation regex: all values joined with `|`.
    AnyOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FacetField {
    Status,
    Year,
    Brand,
    Model,
    BodyType,
    Transmission,
    FuelType,
    Drivetrain,
    Color,
    City,
    Seats,
}

impl FacetField {
    pub const ALL: [FacetField; 11] = [
        FacetField::Status,
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

    /// Query parameter name understood by the cars endpoint.
    pub fn param_name(self) -> &'static str {
        match self {
            FacetField::Status => "status",
            FacetField::Year => "year",
            FacetField::Brand => "make",
            FacetField::Model => "model",
            FacetField::BodyType => "body_type",
            FacetField::Transmission => "transmission",
            FacetField::FuelType => "fuel_type",
            FacetField::Drivetrain => "drivetrain",
            FacetField::Color => "exterior_color",
            FacetField::City => "city",
            FacetField::Seats => "seats",
        }
    }

    /// Key of this facet in a serialized [`FacetSelection`].
    pub fn selection_key(self) -> &'static str {
        match self {
            FacetField::Status => "statuses",
            FacetField::Year => "years",
            FacetField::Brand => "brands",
            FacetField::Model => "models",
            FacetField::BodyType => "bodyTypes",
            FacetField::Transmission => "transmissions",
            FacetField::FuelType => "fuelTypes",
            FacetField::Drivetrain => "drivetrains",
            FacetField::Color => "colors",
            FacetField::City => "cities",
            FacetField::Seats => "seats",
        }
    }

    pub fn cardinality(self) -> Cardinality {
        match self {
            FacetField::Status | FacetField::Year | FacetField::Seats => Cardinality::Single,
            _ => Cardinality::AnyOf,
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self { min: PRICE_MIN, max: PRICE_MAX }
    }
}

impl PriceRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn clamped(self) -> Self {
        Self {
            min: self.min.clamp(PRICE_MIN, PRICE_MAX),
            max: self.max.clamp(PRICE_MIN, PRICE_MAX),
        }
    }

    pub fn is_full_range(&self) -> bool {
        let clamped = self.clamped();
        clamped.min <= PRICE_MIN && clamped.max >= PRICE_MAX
    }
}


/// The checked filter values of one listing page.
///
/// Each facet is an insertion-ordered set; the order is kept because the
/// translator joins multi-value facets in the order the user picked them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct FacetSelection {
    pub statuses: IndexSet<FacetValue>,
    pub years: IndexSet<FacetValue>,
    pub brands: IndexSet<FacetValue>,
    pub models: IndexSet<FacetValue>,
    pub body_types: IndexSet<FacetValue>,
    pub transmissions: IndexSet<FacetValue>,
    pub fuel_types: IndexSet<FacetValue>,
    pub drivetrains: IndexSet<FacetValue>,
    pub colors: IndexSet<FacetValue>,
    pub cities: IndexSet<FacetValue>,
    pub seats: IndexSet<FacetValue>,
    pub price_range: PriceRange,
}

impl FacetSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lenient decoding of a UI payload. Wrong-typed fields and members are
    /// dropped instead of failing the whole selection.
    pub fn from_json(value: &Value) -> Self {
        let mut selection = Self::default();
        let Some(object) = value.as_object() else {
            return selection;
        };

        for field in FacetField::ALL {
            let Some(Value::Array(items)) = object.get(field.selection_key()) else {
                continue;
            };
            let values = selection.values_mut(field);
            for item in items {
                if let Some(v) = FacetValue::from_json(item) {
                    values.insert(v);
                }
            }
        }

        if let Some(range) = object.get("priceRange").and_then(Value::as_object) {
            if let Some(min) = range.get("min").and_then(|v| json_price(v, f64::ceil)) {
                selection.price_range.min = min;
            }
            if let Some(max) = range.get("max").and_then(|v| json_price(v, f64::floor)) {
                selection.price_range.max = max;
            }
        }
        selection
    }

    pub fn values(&self, field: FacetField) -> &IndexSet<FacetValue> {
        match field {
            FacetField::Status => &self.statuses,
            FacetField::Year => &self.years,
            FacetField::Brand => &self.brands,
            FacetField::Model => &self.models,
            FacetField::BodyType => &self.body_types,
            FacetField::Transmission => &self.transmissions,
            FacetField::FuelType => &self.fuel_types,
            FacetField::Drivetrain => &self.drivetrains,
            FacetField::Color => &self.colors,
            FacetField::City => &self.cities,
            FacetField::Seats => &self.seats,
        }
    }

    pub fn values_mut(&mut self, field: FacetField) -> &mut IndexSet<FacetValue> {
        match field {
            FacetField::Status => &mut self.statuses,
            FacetField::Year => &mut self.years,
            FacetField::Brand => &mut self.brands,
            FacetField::Model => &mut self.models,
            FacetField::BodyType => &mut self.body_types,
            FacetField::Transmission => &mut self.transmissions,
            FacetField::FuelType => &mut self.fuel_types,
            FacetField::Drivetrain => &mut self.drivetrains,
            FacetField::Color => &mut self.colors,
            FacetField::City => &mut self.cities,
            FacetField::Seats => &mut self.seats,
        }
    }

    pub fn insert(&mut self, field: FacetField, value: impl Into<FacetValue>) -> bool {
        self.values_mut(field).insert(value.into())
    }

    /// Removal keeps the order of the remaining values.
    pub fn remove(&mut self, field: FacetField, value: &FacetValue) -> bool {
        self.values_mut(field).shift_remove(value)
    }

    /// Checkbox semantics. Returns whether the value is selected afterwards.
    pub fn toggle(&mut self, field: FacetField, value: impl Into<FacetValue>) -> bool {
        let value = value.into();
        if self.remove(field, &value) {
            false
        } else {
            self.values_mut(field).insert(value);
            true
        }
    }

    pub fn clear_field(&mut self, field: FacetField) {
        self.values_mut(field).clear();
    }

    pub fn set_price_range(&mut self, min: i64, max: i64) {
        self.price_range = PriceRange::new(min, max);
    }

    pub fn is_empty(&self) -> bool {
        FacetField::ALL.iter().all(|field| self.values(*field).is_empty()) && self.price_range.is_full_range()
    }
}

/// Whole prices pass through; fractional ones are rounded inward with `round`
/// so the range never grows.
fn json_price(value: &Value, round: fn(f64) -> f64) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    value.as_f64().filter(|f| f.is_finite()).map(|f| round(f) as i64)
}
