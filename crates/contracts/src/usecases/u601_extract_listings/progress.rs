use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Состояние оркестратора запуска
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Ждем команды, ввод разрешен
    Idle,
    /// Резолвим ввод и запускаем потоки
    Dispatching,
    /// Потоки работают
    Running { active: usize },
    /// Все потоки завершились, выбираем остаток событий
    Draining,
}

impl RunState {
    pub fn is_idle(&self) -> bool {
        matches!(self, RunState::Idle)
    }
}

/// Прогресс одного запуска
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunProgress {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunProgress {
    pub fn new(run_id: String, total: usize) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            completed_at: None,
            total,
            succeeded: 0,
            failed: 0,
        }
    }

    pub fn finished(&self) -> usize {
        self.succeeded + self.failed
    }
}
