use serde::{Deserialize, Serialize};

/// Как интерпретировать строки ввода
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Каждая строка - URL страницы
    #[default]
    RawUrl,
    /// Каждая строка - SE номер, URL берется из базы
    SeNumber,
}

impl InputMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            InputMode::RawUrl => "URL",
            InputMode::SeNumber => "SE number",
        }
    }
}
