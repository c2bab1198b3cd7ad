use super::context::ProcessingContext;
use crate::shared::error::AppError;

/// Стратегия получения Markdown для одной страницы.
///
/// Реализации не шлют события сами: Ok - Markdown, Err - текст ошибки,
/// который рабочий поток покажет в окне исходника.
pub trait ContentFetcher: Send + Sync {
    fn fetch(&self, url: &str, ctx: &ProcessingContext) -> Result<String, AppError>;

    /// Статус после успешной обработки задачи
    fn success_message(&self) -> &'static str;
}
