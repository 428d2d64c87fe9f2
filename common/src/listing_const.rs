//! Listing-wide constants shared by the translator, the sorter and the client.

/// Lower bound of the price slider. A `min` at this value is not sent.
pub const PRICE_MIN: i64 = 0;

/// Upper bound of the price slider. A `max` at this value is not sent.
pub const PRICE_MAX: i64 = 20_000_000_000;

/// Default `limit` for one page of listings.
pub const PAGE_SIZE: u64 = 12;

pub const DEBOUNCE_MS: u64 = 300;
