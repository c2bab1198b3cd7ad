pub mod common;
pub mod u601_extract_listings;
