use serde::{Deserialize, Serialize};

use crate::enums::{FetchStrategy, InputMode};

/// Параметры обработки, общие для всех задач одного запуска
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingOptions {
    pub use_proxy: bool,
    pub proxy_url: Option<String>,
    pub save_results: bool,
    pub strategy: FetchStrategy,
    /// Идентификатор модели LLM, например "gpt-4o-mini" или "gemini-1.5-flash"
    pub model: String,
    /// CSS-селекторы шаблонных блоков, которые надо выкинуть со страницы
    pub exclude_selectors: Vec<String>,
}

impl ProcessingOptions {
    /// Прокси, если он включен и задан
    pub fn effective_proxy(&self) -> Option<&str> {
        if !self.use_proxy {
            return None;
        }
        self.proxy_url
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Команда "начать обработку" от слоя представления
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    /// Строки ввода как есть (URL или SE номера)
    pub inputs: Vec<String>,
    pub mode: InputMode,
    pub options: ProcessingOptions,
    pub system_prompt: String,
    /// Шаблон пользовательского сообщения с плейсхолдером {content}
    pub user_prompt_template: String,
}

impl RunRequest {
    /// Обрезанные непустые строки ввода
    pub fn cleaned_inputs(&self) -> Vec<String> {
        self.inputs
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
