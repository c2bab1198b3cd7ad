use contracts::domain::a001_fetch_task::Task;
use contracts::enums::InputMode;
use std::sync::Arc;

use super::estate_repository::EstateLookup;
use crate::shared::error::AppError;

/// Превращает строки ввода в список задач
pub struct TaskResolver {
    lookup: Arc<dyn EstateLookup>,
}

impl TaskResolver {
    pub fn new(lookup: Arc<dyn EstateLookup>) -> Self {
        Self { lookup }
    }

    /// URL режим: задача на строку. SE режим: один запрос в базу на весь ввод.
    pub async fn resolve(&self, inputs: &[String], mode: InputMode) -> Result<Vec<Task>, AppError> {
        match mode {
            InputMode::RawUrl => Ok(inputs.iter().map(|url| Task::from_url(url.as_str())).collect()),
            InputMode::SeNumber => {
                let ids = parse_se_numbers(inputs);
                if ids.is_empty() {
                    return Ok(Vec::new());
                }

                let records = self.lookup.find_by_ids(&ids).await?;
                if records.len() < ids.len() {
                    tracing::info!(
                        "{} of {} SE numbers not found in database",
                        ids.len() - records.len(),
                        ids.len()
                    );
                }
                Ok(records.into_iter().map(Task::from_estate).collect())
            }
        }
    }
}

/// Обрезать, выбросить пустые и нечисловые (с предупреждением)
pub fn parse_se_numbers(inputs: &[String]) -> Vec<i64> {
    inputs
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!("Skipping non-numeric SE number: {}", s);
                None
            }
        })
        .collect()
}
