//! Подставные реализации внешних зависимостей для тестов UseCase

use async_trait::async_trait;
use contracts::domain::a001_fetch_task::EstateRecord;
use contracts::enums::{FetchStrategy, InputMode};
use contracts::usecases::u601_extract_listings::{ProcessingOptions, RunRequest, TextChannel, UiEvent};
use chrono::Local;
use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;

use super::content_fetcher::ContentFetcher;
use super::context::{ProcessingContext, RunInfo};
use super::estate_repository::EstateLookup;
use super::reader_api_client::{ReaderRequest, ReaderResponse, ReaderTransport};
use crate::presentation::Presenter;
use crate::shared::error::AppError;
use crate::shared::llm::{ChatMessage, LlmError, LlmProvider, LlmResponse};
use crate::shared::prompts::{DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT_TEMPLATE};

pub fn options(strategy: FetchStrategy) -> ProcessingOptions {
    ProcessingOptions {
        use_proxy: false,
        proxy_url: None,
        save_results: false,
        strategy,
        model: "gpt-4o-mini".to_string(),
        exclude_selectors: vec!["nav".to_string(), ".ads".to_string()],
    }
}

pub fn test_context() -> (ProcessingContext, Receiver<UiEvent>) {
    let (tx, rx) = mpsc::channel();
    let ctx = ProcessingContext::new(
        RunInfo::new(Local::now()),
        "test-key".to_string(),
        options(FetchStrategy::Api),
        DEFAULT_SYSTEM_PROMPT.to_string(),
        DEFAULT_USER_PROMPT_TEMPLATE.to_string(),
        tx,
    );
    (ctx, rx)
}

pub fn request(inputs: &[&str], mode: InputMode, strategy: FetchStrategy) -> RunRequest {
    RunRequest {
        inputs: inputs.iter().map(|s| s.to_string()).collect(),
        mode,
        options: options(strategy),
        system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        user_prompt_template: DEFAULT_USER_PROMPT_TEMPLATE.to_string(),
    }
}

pub fn estate(id: i64, url: &str) -> EstateRecord {
    EstateRecord {
        source_estate_id: id,
        source_id: Some(1),
        url: url.to_string(),
        status: Some("active".to_string()),
        rent_status: Some("free".to_string()),
        subtype: Some("office".to_string()),
        kind: Some("commercial".to_string()),
        domain: Some("example.com".to_string()),
    }
}

// ============================================================================
// Reader transport
// ============================================================================

pub struct FakeTransport {
    result: Result<ReaderResponse, String>,
    calls: Mutex<usize>,
}

impl FakeTransport {
    pub fn ok(body: &str) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            result: Ok(ReaderResponse {
                status,
                body: body.to_string(),
            }),
            calls: Mutex::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl ReaderTransport for FakeTransport {
    fn get(&self, _request: &ReaderRequest) -> Result<ReaderResponse, String> {
        *self.calls.lock().unwrap() += 1;
        self.result.clone()
    }
}

// ============================================================================
// Content fetcher
// ============================================================================

/// Fetcher, который возвращает заранее заданный Markdown
/// или ошибку, созданную фабрикой (AppError не Clone).
pub struct FakeFetcher {
    markdown: String,
    failure: Option<Box<dyn Fn() -> AppError + Send + Sync>>,
    fail_only_on: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn ok(markdown: &str) -> Self {
        Self {
            markdown: markdown.to_string(),
            failure: None,
            fail_only_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(make_error: impl Fn() -> AppError + Send + Sync + 'static) -> Self {
        Self {
            failure: Some(Box::new(make_error)),
            ..Self::ok("")
        }
    }

    /// Падает только на одном URL, остальные отдают `markdown`
    pub fn failing_on(
        url: &str,
        make_error: impl Fn() -> AppError + Send + Sync + 'static,
        markdown: &str,
    ) -> Self {
        Self {
            failure: Some(Box::new(make_error)),
            fail_only_on: Some(url.to_string()),
            ..Self::ok(markdown)
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ContentFetcher for FakeFetcher {
    fn fetch(&self, url: &str, _ctx: &ProcessingContext) -> Result<String, AppError> {
        self.calls.lock().unwrap().push(url.to_string());
        let applies = match &self.fail_only_on {
            Some(only) => only == url,
            None => true,
        };
        match &self.failure {
            Some(make_error) if applies => Err(make_error()),
            _ => Ok(self.markdown.clone()),
        }
    }

    fn success_message(&self) -> &'static str {
        "Completed successfully"
    }
}

// ============================================================================
// LLM provider
// ============================================================================

pub struct FakeProvider {
    answer: Result<String, String>,
    calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl FakeProvider {
    pub fn answering(text: &str) -> Self {
        Self {
            answer: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            answer: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn chat_completion(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<LlmResponse, LlmError> {
        self.calls.lock().unwrap().push((model.to_string(), messages));
        match &self.answer {
            Ok(text) => Ok(LlmResponse {
                content: text.clone(),
                tokens_used: Some(10),
                model: model.to_string(),
                finish_reason: Some("stop".to_string()),
            }),
            Err(message) => Err(LlmError::NetworkError(message.clone())),
        }
    }

    fn provider_name(&self) -> &str {
        "Fake"
    }
}

// ============================================================================
// Estate lookup
// ============================================================================

pub struct FakeLookup {
    rows: Vec<EstateRecord>,
    failure: Option<String>,
    requested: Mutex<Vec<Vec<i64>>>,
}

impl FakeLookup {
    pub fn with_rows(rows: Vec<EstateRecord>) -> Self {
        Self {
            rows,
            failure: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::with_rows(vec![])
        }
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    /// Номера последнего запроса
    pub fn requested(&self) -> Vec<i64> {
        self.requested.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl EstateLookup for FakeLookup {
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<EstateRecord>, AppError> {
        self.requested.lock().unwrap().push(ids.to_vec());
        if let Some(message) = &self.failure {
            return Err(AppError::Database(message.clone()));
        }
        Ok(self
            .rows
            .iter()
            .filter(|r| ids.contains(&r.source_estate_id))
            .cloned()
            .collect())
    }
}

// ============================================================================
// Presenter
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Text(TextChannel, String),
    Status(String),
    Error(String),
    Input(bool),
}

/// Presenter, который запоминает все вызовы в порядке поступления
#[derive(Default)]
pub struct RecordingPresenter {
    shown: Vec<Shown>,
}

impl RecordingPresenter {
    pub fn shown(&self) -> Vec<Shown> {
        self.shown.clone()
    }

    pub fn texts(&self, channel: TextChannel) -> Vec<String> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Text(c, text) if *c == channel => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Status(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Error(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn input_enabled_history(&self) -> Vec<bool> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Input(enabled) => Some(*enabled),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn set_text(&mut self, channel: TextChannel, content: &str) {
        self.shown.push(Shown::Text(channel, content.to_string()));
    }

    fn set_status(&mut self, message: &str, is_error: bool) {
        if is_error {
            self.shown.push(Shown::Error(message.to_string()));
        } else {
            self.shown.push(Shown::Status(message.to_string()));
        }
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.shown.push(Shown::Input(enabled));
    }
}
