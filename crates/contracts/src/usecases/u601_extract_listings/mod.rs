pub mod events;
pub mod progress;
pub mod request;

pub use events::{TextChannel, UiEvent};
pub use progress::{RunProgress, RunState};
pub use request::{ProcessingOptions, RunRequest};

use super::common::UseCaseMetadata;

/// UseCase извлечения данных из объявлений (reader API / браузер → LLM → Excel)
pub struct ExtractListings;

impl UseCaseMetadata for ExtractListings {
    fn usecase_index() -> &'static str {
        "u601"
    }

    fn usecase_name() -> &'static str {
        "extract_listings"
    }

    fn display_name() -> &'static str {
        "Извлечение данных из объявлений"
    }
}
