use chrono::Local;
use contracts::domain::a001_fetch_task::Task;
use contracts::enums::FetchStrategy;
use contracts::usecases::common::UseCaseMetadata;
use contracts::usecases::u601_extract_listings::{ExtractListings, RunRequest, RunState, UiEvent};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::runtime::Handle;

use super::content_fetcher::ContentFetcher;
use super::content_processor::ContentProcessor;
use super::context::{ProcessingContext, RunInfo};
use super::excel_recorder::ExcelRecorder;
use super::progress_tracker::ProgressTracker;
use super::task_resolver::TaskResolver;
use super::worker::Pipeline;
use crate::presentation::Presenter;
use crate::shared::error::AppError;

/// Executor для UseCase извлечения данных: запускает потоки и
/// переносит их события в слой представления.
pub struct RunExecutor {
    resolver: TaskResolver,
    api_fetcher: Arc<dyn ContentFetcher>,
    browser_fetcher: Arc<dyn ContentFetcher>,
    processor: Arc<ContentProcessor>,
    recorder: Arc<ExcelRecorder>,
    runtime: Handle,
    api_key: String,
    pub progress_tracker: ProgressTracker,
    events_tx: Sender<UiEvent>,
    events_rx: Receiver<UiEvent>,
    state: RunState,
}

impl RunExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resolver: TaskResolver,
        api_fetcher: Arc<dyn ContentFetcher>,
        browser_fetcher: Arc<dyn ContentFetcher>,
        processor: Arc<ContentProcessor>,
        recorder: Arc<ExcelRecorder>,
        runtime: Handle,
        api_key: String,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            resolver,
            api_fetcher,
            browser_fetcher,
            processor,
            recorder,
            runtime,
            api_key,
            progress_tracker: ProgressTracker::new(),
            events_tx,
            events_rx,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Команда "старт". Возвращает число запущенных задач.
    ///
    /// Ошибки ввода и резолва показываются в статусе и возвращаются,
    /// executor при этом остается в Idle.
    pub fn start(&mut self, request: RunRequest, presenter: &mut dyn Presenter) -> Result<usize, AppError> {
        if !self.state.is_idle() {
            return Err(AppError::Busy);
        }

        let inputs = request.cleaned_inputs();
        if inputs.is_empty() {
            let err = AppError::input(format!(
                "Error: Please enter at least one {}",
                request.mode.display_name()
            ));
            presenter.set_status(&err.to_string(), true);
            return Err(err);
        }

        self.state = RunState::Dispatching;
        presenter.set_input_enabled(false);
        presenter.set_status("Processing...", false);

        let resolved = self.runtime.block_on(self.resolver.resolve(&inputs, request.mode));
        let tasks = match resolved {
            Ok(tasks) if !tasks.is_empty() => tasks,
            Ok(_) => {
                return Err(self.abort_dispatch(AppError::input("No tasks to process"), presenter));
            }
            Err(e) => return Err(self.abort_dispatch(e, presenter)),
        };

        let run = RunInfo::new(Local::now());
        let total = tasks.len();
        let strategy = request.options.strategy;
        tracing::info!(
            "{} ({}): run {} with {} task(s), strategy {}, model {}",
            ExtractListings::full_name(),
            ExtractListings::display_name(),
            run.run_id,
            total,
            strategy.display_name(),
            request.options.model
        );

        let ctx = Arc::new(ProcessingContext::new(
            run.clone(),
            self.api_key.clone(),
            request.options,
            request.system_prompt,
            request.user_prompt_template,
            self.events_tx.clone(),
        ));
        let pipeline = Pipeline {
            fetcher: match strategy {
                FetchStrategy::Api => self.api_fetcher.clone(),
                FetchStrategy::Browser => self.browser_fetcher.clone(),
            },
            processor: self.processor.clone(),
            recorder: self.recorder.clone(),
        };

        self.progress_tracker.begin_run(run.run_id, total);
        if strategy.is_sequential() {
            self.spawn_sequential(pipeline, tasks, ctx);
        } else {
            self.spawn_parallel(pipeline, tasks, ctx);
        }

        self.state = RunState::Running { active: total };
        Ok(total)
    }

    fn abort_dispatch(&mut self, err: AppError, presenter: &mut dyn Presenter) -> AppError {
        tracing::error!("Run not started: {}", err);
        self.state = RunState::Idle;
        presenter.set_status(&err.to_string(), true);
        presenter.set_input_enabled(true);
        err
    }

    /// Браузерный режим: один поток, задачи по порядку, счетчик обнуляется в конце
    fn spawn_sequential(&self, pipeline: Pipeline, tasks: Vec<Task>, ctx: Arc<ProcessingContext>) {
        let tracker = self.progress_tracker.clone();
        let guard = tracker.batch_guard();
        let total = tasks.len();

        let spawned = thread::Builder::new()
            .name("browser-worker".to_string())
            .spawn(move || {
                let _guard = guard;
                for (idx, task) in tasks.iter().enumerate() {
                    ctx.emit(UiEvent::status(format!(
                        "Processing {}/{}: {}",
                        idx + 1,
                        total,
                        task.label()
                    )));
                    let outcome = pipeline.run_task(task, &ctx);
                    tracker.record_outcome(outcome);
                }
            });

        // При ошибке spawn замыкание с guard уничтожается, счетчик обнуляется
        if let Err(e) = spawned {
            tracing::error!("Failed to spawn browser worker: {}", e);
            let _ = self
                .events_tx
                .send(UiEvent::error(format!("Failed to start worker: {}", e)));
        }
    }

    /// API режим: поток на задачу без ограничения параллелизма
    fn spawn_parallel(&self, pipeline: Pipeline, tasks: Vec<Task>, ctx: Arc<ProcessingContext>) {
        for (idx, task) in tasks.into_iter().enumerate() {
            let tracker = self.progress_tracker.clone();
            let guard = tracker.worker_guard();
            let pipeline = pipeline.clone();
            let ctx = ctx.clone();

            let spawned = thread::Builder::new()
                .name(format!("api-worker-{}", idx + 1))
                .spawn(move || {
                    let _guard = guard;
                    let outcome = pipeline.run_task(&task, &ctx);
                    tracker.record_outcome(outcome);
                });

            if let Err(e) = spawned {
                tracing::error!("Failed to spawn worker {}: {}", idx + 1, e);
                let _ = self
                    .events_tx
                    .send(UiEvent::error(format!("Failed to start worker: {}", e)));
            }
        }
    }

    /// Один тик цикла опроса. Возвращает true, если на этом тике запуск завершился.
    pub fn poll(&mut self, presenter: &mut dyn Presenter) -> bool {
        // Счетчик читаем до выборки: события, отправленные до обнуления, попадут в этот же тик
        let drained = self.progress_tracker.is_drained();
        if drained {
            self.state = RunState::Draining;
        } else if let RunState::Running { .. } = self.state {
            self.state = RunState::Running {
                active: self.progress_tracker.active(),
            };
        }

        while let Ok(event) = self.events_rx.try_recv() {
            presenter.apply(event);
        }

        if !drained {
            return false;
        }

        match self.progress_tracker.take_completion() {
            Some(progress) => {
                tracing::info!(
                    "Run {} finished: {} succeeded, {} failed of {}",
                    progress.run_id,
                    progress.succeeded,
                    progress.failed,
                    progress.total
                );
                self.state = RunState::Idle;
                presenter.set_input_enabled(true);
                presenter.set_status("Ready", false);
                true
            }
            None => false,
        }
    }

    /// Крутить цикл опроса с фиксированным интервалом до возврата в Idle
    pub fn run_until_idle(&mut self, presenter: &mut dyn Presenter, interval: Duration) {
        while !self.state.is_idle() {
            if self.poll(presenter) {
                break;
            }
            thread::sleep(interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::{FileGrouping, ResultsConfig};
    use crate::shared::llm::LlmProvider;
    use crate::usecases::u601_extract_listings::testing::{
        estate, request, FakeFetcher, FakeLookup, FakeProvider, RecordingPresenter, Shown,
    };
    use contracts::enums::InputMode;
    use contracts::usecases::u601_extract_listings::TextChannel;

    struct Harness {
        executor: RunExecutor,
        api: Arc<FakeFetcher>,
        browser: Arc<FakeFetcher>,
        _runtime: tokio::runtime::Runtime,
        _dir: tempfile::TempDir,
    }

    fn harness(lookup: FakeLookup, api: FakeFetcher, browser: FakeFetcher) -> Harness {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(api);
        let browser = Arc::new(browser);
        let chat: Arc<dyn LlmProvider> = Arc::new(FakeProvider::answering("extracted"));
        let processor = Arc::new(ContentProcessor::new(None, Some(chat), runtime.handle().clone()));
        let recorder = Arc::new(ExcelRecorder::new(&ResultsConfig {
            dir: dir.path().to_string_lossy().into_owned(),
            file_grouping: FileGrouping::Run,
            include_raw_markdown: false,
        }));

        let executor = RunExecutor::new(
            TaskResolver::new(Arc::new(lookup)),
            api.clone(),
            browser.clone(),
            processor,
            recorder,
            runtime.handle().clone(),
            "test-key".to_string(),
        );

        Harness {
            executor,
            api,
            browser,
            _runtime: runtime,
            _dir: dir,
        }
    }

    fn drive(executor: &mut RunExecutor, presenter: &mut RecordingPresenter) {
        executor.run_until_idle(presenter, Duration::from_millis(5));
    }

    #[test]
    fn test_scenario_success_emits_raw_processed_and_status() {
        let mut h = harness(FakeLookup::with_rows(vec![]), FakeFetcher::ok("# Title"), FakeFetcher::ok("x"));
        let mut presenter = RecordingPresenter::default();

        let started = h
            .executor
            .start(request(&["example.com/a"], InputMode::RawUrl, FetchStrategy::Api), &mut presenter)
            .unwrap();
        assert_eq!(started, 1);
        drive(&mut h.executor, &mut presenter);

        assert_eq!(presenter.texts(TextChannel::Raw), vec!["# Title".to_string()]);
        assert_eq!(presenter.texts(TextChannel::Processed), vec!["extracted".to_string()]);
        let completed: Vec<_> = presenter
            .statuses()
            .into_iter()
            .filter(|s| s.contains("Completed successfully"))
            .collect();
        assert_eq!(completed.len(), 1);
        assert!(presenter.errors().is_empty());
        assert_eq!(h.browser.calls().len(), 0);
    }

    #[test]
    fn test_scenario_transport_failure_has_no_processed_text() {
        let mut h = harness(
            FakeLookup::with_rows(vec![]),
            FakeFetcher::failing(|| AppError::Network("connection refused".into())),
            FakeFetcher::ok("x"),
        );
        let mut presenter = RecordingPresenter::default();

        h.executor
            .start(request(&["example.com/a"], InputMode::RawUrl, FetchStrategy::Api), &mut presenter)
            .unwrap();
        drive(&mut h.executor, &mut presenter);

        let errors = presenter.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Request failed"));
        assert_eq!(presenter.texts(TextChannel::Raw), vec![errors[0].clone()]);
        assert!(presenter.texts(TextChannel::Processed).is_empty());
    }

    #[test]
    fn test_scenario_two_parallel_tasks_reach_idle_once() {
        let mut h = harness(FakeLookup::with_rows(vec![]), FakeFetcher::ok("# Page"), FakeFetcher::ok("x"));
        let mut presenter = RecordingPresenter::default();

        h.executor
            .start(
                request(&["example.com/a", "example.com/b"], InputMode::RawUrl, FetchStrategy::Api),
                &mut presenter,
            )
            .unwrap();
        drive(&mut h.executor, &mut presenter);

        assert_eq!(h.executor.progress_tracker.active(), 0);
        assert!(h.executor.state().is_idle());
        assert_eq!(presenter.statuses().iter().filter(|s| *s == "Ready").count(), 1);
        assert_eq!(h.api.calls().len(), 2);

        // Лишние тики после завершения не дают второго перехода
        assert!(!h.executor.poll(&mut presenter));
        assert_eq!(presenter.statuses().iter().filter(|s| *s == "Ready").count(), 1);
        assert_eq!(presenter.input_enabled_history(), vec![false, true]);
    }

    #[test]
    fn test_browser_strategy_runs_sequentially_in_input_order() {
        let mut h = harness(FakeLookup::with_rows(vec![]), FakeFetcher::ok("x"), FakeFetcher::ok("# Rendered"));
        let mut presenter = RecordingPresenter::default();

        h.executor
            .start(
                request(&["a.example", "", "b.example", "c.example"], InputMode::RawUrl, FetchStrategy::Browser),
                &mut presenter,
            )
            .unwrap();
        drive(&mut h.executor, &mut presenter);

        assert_eq!(h.browser.calls(), vec!["a.example", "b.example", "c.example"]);
        assert_eq!(h.api.calls().len(), 0);

        let progress: Vec<String> = presenter
            .statuses()
            .into_iter()
            .filter(|s| s.starts_with("Processing "))
            .collect();
        assert_eq!(
            progress,
            vec![
                "Processing 1/3: a.example".to_string(),
                "Processing 2/3: b.example".to_string(),
                "Processing 3/3: c.example".to_string(),
            ]
        );

        // Статус задачи i приходит раньше начала задачи i+1
        let shown = presenter.shown();
        let pos = |needle: &str| {
            shown
                .iter()
                .position(|s| matches!(s, Shown::Status(m) if m == needle))
                .unwrap()
        };
        let first_done = shown
            .iter()
            .position(|s| matches!(s, Shown::Status(m) if m.starts_with("Completed")))
            .unwrap();
        assert!(pos("Processing 1/3: a.example") < first_done);
        assert!(first_done < pos("Processing 2/3: b.example"));
    }

    #[test]
    fn test_failed_browser_task_does_not_stop_batch() {
        let mut h = harness(
            FakeLookup::with_rows(vec![]),
            FakeFetcher::ok("x"),
            FakeFetcher::failing_on("bad.example", || AppError::Automation("driver crashed".into()), "# ok"),
        );
        let mut presenter = RecordingPresenter::default();

        h.executor
            .start(
                request(&["bad.example", "good.example"], InputMode::RawUrl, FetchStrategy::Browser),
                &mut presenter,
            )
            .unwrap();
        drive(&mut h.executor, &mut presenter);

        assert_eq!(h.browser.calls(), vec!["bad.example", "good.example"]);
        assert_eq!(presenter.errors(), vec!["Browser automation failed: driver crashed".to_string()]);
        assert_eq!(presenter.texts(TextChannel::Processed), vec!["extracted".to_string()]);
    }

    #[test]
    fn test_empty_input_is_rejected_and_stays_idle() {
        let mut h = harness(FakeLookup::with_rows(vec![]), FakeFetcher::ok("x"), FakeFetcher::ok("x"));
        let mut presenter = RecordingPresenter::default();

        let err = h
            .executor
            .start(request(&["", "  "], InputMode::RawUrl, FetchStrategy::Api), &mut presenter)
            .unwrap_err();

        assert!(matches!(err, AppError::Input(_)));
        assert!(h.executor.state().is_idle());
        assert_eq!(presenter.errors().len(), 1);
        assert_eq!(h.api.calls().len(), 0);
    }

    #[test]
    fn test_unresolved_se_numbers_report_no_tasks() {
        let mut h = harness(
            FakeLookup::with_rows(vec![estate(1, "https://example.com/1")]),
            FakeFetcher::ok("x"),
            FakeFetcher::ok("x"),
        );
        let mut presenter = RecordingPresenter::default();

        let err = h
            .executor
            .start(request(&["999"], InputMode::SeNumber, FetchStrategy::Api), &mut presenter)
            .unwrap_err();

        assert_eq!(err.to_string(), "No tasks to process");
        assert!(h.executor.state().is_idle());
        assert_eq!(presenter.input_enabled_history(), vec![false, true]);
    }

    #[test]
    fn test_database_failure_blocks_fetching() {
        let mut h = harness(FakeLookup::failing("access denied"), FakeFetcher::ok("x"), FakeFetcher::ok("x"));
        let mut presenter = RecordingPresenter::default();

        let err = h
            .executor
            .start(request(&["123"], InputMode::SeNumber, FetchStrategy::Api), &mut presenter)
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(h.api.calls().len(), 0);
        assert!(h.executor.state().is_idle());
    }

    #[test]
    fn test_se_numbers_fetch_resolved_urls() {
        let mut h = harness(
            FakeLookup::with_rows(vec![estate(123, "https://example.com/123")]),
            FakeFetcher::ok("# Estate"),
            FakeFetcher::ok("x"),
        );
        let mut presenter = RecordingPresenter::default();

        let started = h
            .executor
            .start(request(&["123", "456"], InputMode::SeNumber, FetchStrategy::Api), &mut presenter)
            .unwrap();
        drive(&mut h.executor, &mut presenter);

        assert_eq!(started, 1);
        assert_eq!(h.api.calls(), vec!["https://example.com/123"]);
    }

    #[test]
    fn test_second_start_while_running_is_busy() {
        let mut h = harness(FakeLookup::with_rows(vec![]), FakeFetcher::ok("x"), FakeFetcher::ok("x"));
        let mut presenter = RecordingPresenter::default();

        h.executor
            .start(request(&["a"], InputMode::RawUrl, FetchStrategy::Api), &mut presenter)
            .unwrap();
        let err = h
            .executor
            .start(request(&["b"], InputMode::RawUrl, FetchStrategy::Api), &mut presenter)
            .unwrap_err();
        assert!(matches!(err, AppError::Busy));

        drive(&mut h.executor, &mut presenter);
        assert!(h.executor.state().is_idle());
    }
}
