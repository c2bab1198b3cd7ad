use std::sync::Arc;
use tokio::runtime::Handle;

use crate::shared::llm::{ChatMessage, LlmProvider};
use crate::shared::prompts::render_user_prompt;

/// Модели с этим префиксом идут в нативный протокол Gemini
pub const NATIVE_MODEL_PREFIX: &str = "gemini";

/// Какой backend обслуживает модель
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// generateContent: system instruction + один ход пользователя
    Native,
    /// OpenAI-совместимый chat completion: [system, user]
    Chat,
}

impl Backend {
    pub fn for_model(model: &str) -> Self {
        if model.starts_with(NATIVE_MODEL_PREFIX) {
            Backend::Native
        } else {
            Backend::Chat
        }
    }
}

/// Отправляет Markdown в LLM и возвращает извлеченный текст.
///
/// Ошибки не пробрасываются: вместо результата возвращается текст ошибки,
/// который дальше идет в вывод и в Excel как обычный результат.
pub struct ContentProcessor {
    native: Option<Arc<dyn LlmProvider>>,
    chat: Option<Arc<dyn LlmProvider>>,
    runtime: Handle,
}

impl ContentProcessor {
    /// `None` у провайдера означает, что для него не задан ключ
    pub fn new(
        native: Option<Arc<dyn LlmProvider>>,
        chat: Option<Arc<dyn LlmProvider>>,
        runtime: Handle,
    ) -> Self {
        Self {
            native,
            chat,
            runtime,
        }
    }

    /// Вызывается из рабочих OS потоков, не из async контекста
    pub fn process(
        &self,
        markdown: &str,
        user_prompt_template: &str,
        system_prompt: &str,
        model: &str,
    ) -> String {
        let messages = vec![
            ChatMessage::system(system_prompt.trim()),
            ChatMessage::user(render_user_prompt(user_prompt_template, markdown)),
        ];

        let backend = Backend::for_model(model);
        let (provider, missing_key, backend_label) = match backend {
            Backend::Native => (
                self.native.as_ref(),
                "Error: GOOGLE_API_KEY environment variable not set. Please configure it to use Gemini.",
                "the Gemini API",
            ),
            Backend::Chat => (
                self.chat.as_ref(),
                "Error: OPENAI_API_KEY environment variable not set. Please configure it to use chat models.",
                "the chat completion backend",
            ),
        };

        let Some(provider) = provider else {
            tracing::warn!("No {:?} provider configured for model {}", backend, model);
            return missing_key.to_string();
        };

        tracing::info!(
            "Sending {} chars to {} (model {})",
            markdown.len(),
            provider.provider_name(),
            model
        );

        match self.runtime.block_on(provider.chat_completion(model, messages)) {
            Ok(response) => {
                tracing::info!(
                    "{} answered with {} chars, tokens: {:?}",
                    provider.provider_name(),
                    response.content.len(),
                    response.tokens_used
                );
                response.content
            }
            Err(e) => {
                tracing::error!("{} call failed: {}", provider.provider_name(), e);
                format!("An error occurred with {}: {}", backend_label, e)
            }
        }
    }
}
