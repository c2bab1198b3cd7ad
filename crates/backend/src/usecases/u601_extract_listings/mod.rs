pub mod browser_fetcher;
pub mod content_fetcher;
pub mod content_processor;
pub mod context;
pub mod estate_repository;
pub mod excel_recorder;
pub mod executor;
pub mod html_markdown;
pub mod progress_tracker;
pub mod reader_api_client;
pub mod task_resolver;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use executor::RunExecutor;
