use serde::{Deserialize, Serialize};

/// Способ получения содержимого страницы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Hosted reader API (параллельно, поток на задачу)
    #[default]
    Api,
    /// Автоматизация браузера (последовательно, один поток)
    Browser,
}

impl FetchStrategy {
    pub fn display_name(&self) -> &'static str {
        match self {
            FetchStrategy::Api => "Reader API",
            FetchStrategy::Browser => "Browser automation",
        }
    }

    /// Задачи обрабатываются строго по очереди в одном потоке
    pub fn is_sequential(&self) -> bool {
        matches!(self, FetchStrategy::Browser)
    }
}
