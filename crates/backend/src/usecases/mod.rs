pub mod u601_extract_listings;
