pub mod fetch_strategy;
pub mod input_mode;

pub use fetch_strategy::FetchStrategy;
pub use input_mode::InputMode;
