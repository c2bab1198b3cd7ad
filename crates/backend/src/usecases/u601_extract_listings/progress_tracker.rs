use contracts::usecases::u601_extract_listings::RunProgress;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Итог обработки одной задачи
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Default)]
struct TrackerState {
    active: usize,
    busy: bool,
    progress: Option<RunProgress>,
}

/// Счетчик активных рабочих потоков и прогресс запуска (in-memory).
///
/// Единственное разделяемое изменяемое состояние между потоками:
/// читается и меняется только под мьютексом.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    state: Arc<Mutex<TrackerState>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        // Паника в рабочем потоке не должна заклинить переход в Idle
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn begin_run(&self, run_id: String, total: usize) {
        let mut state = self.lock();
        state.active = total;
        state.busy = true;
        state.progress = Some(RunProgress::new(run_id, total));
    }

    pub fn active(&self) -> usize {
        self.lock().active
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    /// Все потоки завершились, а запуск еще помечен занятым
    pub fn is_drained(&self) -> bool {
        let state = self.lock();
        state.busy && state.active == 0
    }

    pub fn record_outcome(&self, outcome: TaskOutcome) {
        let mut state = self.lock();
        if let Some(p) = state.progress.as_mut() {
            match outcome {
                TaskOutcome::Succeeded => p.succeeded += 1,
                TaskOutcome::Failed => p.failed += 1,
            }
        }
    }

    /// Поток параллельного режима завершился
    fn finish_worker(&self) {
        let mut state = self.lock();
        state.active = state.active.saturating_sub(1);
    }

    /// Последовательный поток завершил всю пачку
    fn finish_batch(&self) {
        self.lock().active = 0;
    }

    /// Переход в Idle ровно один раз: возвращает прогресс только первому вызывающему
    pub fn take_completion(&self) -> Option<RunProgress> {
        let mut state = self.lock();
        if !state.busy || state.active != 0 {
            return None;
        }
        state.busy = false;
        state.progress.take().map(|mut p| {
            p.completed_at = Some(chrono::Utc::now());
            p
        })
    }

    /// Guard потока параллельного режима: минус один при любом выходе, включая панику
    pub fn worker_guard(&self) -> WorkerGuard {
        WorkerGuard {
            tracker: self.clone(),
            release: Release::One,
        }
    }

    /// Guard последовательного потока: обнуляет счетчик один раз в конце пачки
    pub fn batch_guard(&self) -> WorkerGuard {
        WorkerGuard {
            tracker: self.clone(),
            release: Release::All,
        }
    }
}

enum Release {
    One,
    All,
}

pub struct WorkerGuard {
    tracker: ProgressTracker,
    release: Release,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        match self.release {
            Release::One => self.tracker.finish_worker(),
            Release::All => self.tracker.finish_batch(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_guards_count_down_to_zero() {
        let tracker = ProgressTracker::new();
        tracker.begin_run("r".into(), 2);

        let a = tracker.worker_guard();
        let b = tracker.worker_guard();
        drop(a);
        assert_eq!(tracker.active(), 1);
        assert!(!tracker.is_drained());
        drop(b);
        assert_eq!(tracker.active(), 0);
        assert!(tracker.is_drained());
    }

    #[test]
    fn test_batch_guard_resets_once() {
        let tracker = ProgressTracker::new();
        tracker.begin_run("r".into(), 3);
        {
            let _guard = tracker.batch_guard();
            tracker.record_outcome(TaskOutcome::Succeeded);
            assert_eq!(tracker.active(), 3);
        }
        assert_eq!(tracker.active(), 0);
    }

    #[test]
    fn test_completion_is_taken_exactly_once() {
        let tracker = ProgressTracker::new();
        tracker.begin_run("r".into(), 1);
        assert!(tracker.take_completion().is_none());

        tracker.record_outcome(TaskOutcome::Failed);
        drop(tracker.worker_guard());

        let progress = tracker.take_completion().unwrap();
        assert_eq!(progress.failed, 1);
        assert_eq!(progress.finished(), 1);
        assert!(progress.completed_at.is_some());
        assert!(tracker.take_completion().is_none());
        assert!(!tracker.is_busy());
    }

    #[test]
    fn test_guard_releases_on_panic() {
        let tracker = ProgressTracker::new();
        tracker.begin_run("r".into(), 1);
        let worker_tracker = tracker.clone();

        let result = std::thread::spawn(move || {
            let _guard = worker_tracker.worker_guard();
            panic!("worker blew up");
        })
        .join();

        assert!(result.is_err());
        assert_eq!(tracker.active(), 0);
    }
}
