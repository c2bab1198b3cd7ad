use contracts::domain::a001_fetch_task::Task;
use contracts::usecases::u601_extract_listings::UiEvent;
use std::sync::Arc;

use super::content_fetcher::ContentFetcher;
use super::content_processor::ContentProcessor;
use super::context::ProcessingContext;
use super::excel_recorder::ExcelRecorder;
use super::progress_tracker::TaskOutcome;

/// Конвейер одной задачи: fetch -> LLM -> (Excel). Одна стратегия на запуск.
#[derive(Clone)]
pub struct Pipeline {
    pub fetcher: Arc<dyn ContentFetcher>,
    pub processor: Arc<ContentProcessor>,
    pub recorder: Arc<ExcelRecorder>,
}

impl Pipeline {
    /// Обработать задачу. Все ошибки превращаются в события, наружу ничего не летит.
    pub fn run_task(&self, task: &Task, ctx: &ProcessingContext) -> TaskOutcome {
        if !task.has_url() {
            ctx.emit(UiEvent::error("Encountered a task with no URL."));
            return TaskOutcome::Failed;
        }

        let markdown = match self.fetcher.fetch(task.url(), ctx) {
            Ok(md) => md,
            Err(e) => {
                let message = e.to_string();
                ctx.emit(UiEvent::error(message.clone()));
                ctx.emit(UiEvent::raw(message));
                return TaskOutcome::Failed;
            }
        };
        ctx.emit(UiEvent::raw(markdown.clone()));

        let processed = self.processor.process(
            &markdown,
            &ctx.user_prompt_template,
            &ctx.system_prompt,
            &ctx.options.model,
        );
        ctx.emit(UiEvent::processed(processed.clone()));

        let mut status = self.fetcher.success_message().to_string();
        if ctx.options.save_results {
            let outcome = self.recorder.save(task, &markdown, &processed, &ctx.run);
            status.push_str(" | ");
            status.push_str(&outcome.message);
            if !outcome.success {
                ctx.emit(UiEvent::error(outcome.message));
            }
        }
        ctx.emit(UiEvent::status(status));

        TaskOutcome::Succeeded
    }
}
