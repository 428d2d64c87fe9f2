//! Common library exports shared by the listing pages and the listing client.

extern crate serde;


pub mod listing_const;
pub mod facet;
pub mod filter_translator;
pub mod listing;
pub mod listing_sorter;
pub mod url_param;
pub mod listing_view_state;
