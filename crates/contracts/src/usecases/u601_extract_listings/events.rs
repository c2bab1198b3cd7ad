use serde::{Deserialize, Serialize};

/// Окно вывода, в которое пишет событие UpdateText
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextChannel {
    /// Исходный Markdown (или текст ошибки загрузки)
    Raw,
    /// Результат обработки LLM
    Processed,
}

/// Сообщение от рабочего потока к циклу опроса UI.
///
/// Рабочие потоки никогда не трогают представление напрямую,
/// только кладут события в канал.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiEvent {
    UpdateText { channel: TextChannel, content: String },
    UpdateStatus { message: String },
    Error { message: String },
}

impl UiEvent {
    pub fn raw(content: impl Into<String>) -> Self {
        UiEvent::UpdateText {
            channel: TextChannel::Raw,
            content: content.into(),
        }
    }

    pub fn processed(content: impl Into<String>) -> Self {
        UiEvent::UpdateText {
            channel: TextChannel::Processed,
            content: content.into(),
        }
    }

    pub fn status(message: impl Into<String>) -> Self {
        UiEvent::UpdateStatus {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        UiEvent::Error {
            message: message.into(),
        }
    }
}
