use serde::Deserialize;
use std::path::Path;

/// Плейсхолдер, в который подставляется Markdown страницы
pub const CONTENT_PLACEHOLDER: &str = "{content}";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional data extractor.
Analyze the provided markdown content and extract all important fields in a structured way.
Include all relevant details like product name, specifications, features, price, etc.";

pub const DEFAULT_USER_PROMPT_TEMPLATE: &str = "Please analyze this content:\n{content}";

/// Пара промптов для LLM
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prompts {
    pub system: String,
    pub user_template: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_template: DEFAULT_USER_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl Prompts {
    /// Загрузить промпты из TOML; при отсутствии или ошибке - встроенные
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::warn!("Prompts file not found at {}, using built-in prompts", path.display());
            return Self::default();
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|contents| Self::parse(&contents));

        match parsed {
            Ok(prompts) => {
                tracing::info!("Loaded prompts from {}", path.display());
                prompts
            }
            Err(e) => {
                tracing::warn!("Malformed prompts file {}: {}. Using built-in prompts", path.display(), e);
                Self::default()
            }
        }
    }

    /// Разобрать и проверить: шаблон обязан содержать {content}
    pub fn parse(contents: &str) -> Result<Self, String> {
        let prompts: Prompts = toml::from_str(contents).map_err(|e| e.to_string())?;
        if !prompts.user_template.contains(CONTENT_PLACEHOLDER) {
            return Err(format!("user_template has no {} placeholder", CONTENT_PLACEHOLDER));
        }
        if prompts.system.trim().is_empty() {
            return Err("system prompt is empty".to_string());
        }
        Ok(prompts)
    }
}

/// Подставить Markdown в шаблон
pub fn render_user_prompt(template: &str, content: &str) -> String {
    template.replacen(CONTENT_PLACEHOLDER, content, 1)
}
