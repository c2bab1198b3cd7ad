use thiserror::Error;

/// Ошибки конвейера обработки.
///
/// Display каждого варианта - это ровно тот текст, который видит пользователь
/// в окне исходного Markdown и в строке статуса.
#[derive(Debug, Error)]
pub enum AppError {
    /// Не хватает обязательной настройки (ключ API, параметры БД)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Сбой транспорта: таймаут, DNS, отказ в соединении
    #[error("Request failed: {0}")]
    Network(String),

    /// Reader API ответил не 200
    #[error("API Error {status}: {body}")]
    Api { status: u16, body: String },

    /// Любой сбой автоматизации браузера
    #[error("Browser automation failed: {0}")]
    Automation(String),

    /// Сбой записи результатов
    #[error("Failed to save to Excel: {0}")]
    Persistence(String),

    #[error("Database error: {0}")]
    Database(String),

    /// Некорректный ввод, отклоняется до любого I/O
    #[error("{0}")]
    Input(String),

    #[error("A run is already in progress")]
    Busy,
}

impl AppError {
    pub fn configuration(message: impl Into<String>) -> Self {
        AppError::Configuration(message.into())
    }

    pub fn input(message: impl Into<String>) -> Self {
        AppError::Input(message.into())
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}
