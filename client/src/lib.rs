//! Listing client: fetches car listings for a facet selection and keeps the
//! newest result set for a listing page.

pub mod config;
pub mod cars_api;
pub mod debounce;
pub mod listing_view;
