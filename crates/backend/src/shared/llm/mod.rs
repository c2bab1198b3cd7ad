pub mod gemini_provider;
pub mod openai_provider;
pub mod types;

pub use gemini_provider::GeminiProvider;
pub use openai_provider::OpenAiProvider;
pub use types::*;
