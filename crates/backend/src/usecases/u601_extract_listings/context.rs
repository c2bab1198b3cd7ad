use chrono::{DateTime, Local};
use contracts::usecases::u601_extract_listings::{ProcessingOptions, UiEvent};
use std::sync::mpsc::Sender;

/// Идентификация запуска: нужна для имени файла результатов
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub run_id: String,
    pub started_at: DateTime<Local>,
}

impl RunInfo {
    pub fn new(started_at: DateTime<Local>) -> Self {
        Self {
            run_id: started_at.format("%Y%m%d_%H%M%S").to_string(),
            started_at,
        }
    }
}

/// Контекст одного запуска. Создается на команду "старт", рабочие потоки
/// только читают его (через Arc), события отправляют в общий канал.
pub struct ProcessingContext {
    pub run: RunInfo,
    pub api_key: String,
    pub options: ProcessingOptions,
    pub system_prompt: String,
    pub user_prompt_template: String,
    events: Sender<UiEvent>,
}

impl ProcessingContext {
    pub fn new(
        run: RunInfo,
        api_key: String,
        options: ProcessingOptions,
        system_prompt: String,
        user_prompt_template: String,
        events: Sender<UiEvent>,
    ) -> Self {
        Self {
            run,
            api_key,
            options,
            system_prompt,
            user_prompt_template,
            events,
        }
    }

    /// Положить событие в очередь UI. Если получатель уже закрыт, событие теряется.
    pub fn emit(&self, event: UiEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("UI channel closed, event dropped");
        }
    }
}
