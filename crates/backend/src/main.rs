#![allow(
    clippy::useless_format,
    clippy::type_complexity,
    clippy::too_many_arguments,
    clippy::derivable_impls
)]

pub mod cli;
pub mod presentation;
pub mod shared;
pub mod usecases;

use clap::Parser;
use contracts::usecases::u601_extract_listings::{ProcessingOptions, RunRequest};
use std::sync::Arc;
use std::time::Duration;

use crate::cli::Cli;
use crate::presentation::ConsolePresenter;
use crate::shared::config::{self, Config, Secrets};
use crate::shared::llm::{GeminiProvider, LlmProvider, OpenAiProvider};
use crate::shared::prompts::{Prompts, DEFAULT_SYSTEM_PROMPT};
use crate::usecases::u601_extract_listings::browser_fetcher::BrowserFetcher;
use crate::usecases::u601_extract_listings::content_processor::ContentProcessor;
use crate::usecases::u601_extract_listings::estate_repository::MySqlEstateRepository;
use crate::usecases::u601_extract_listings::excel_recorder::ExcelRecorder;
use crate::usecases::u601_extract_listings::reader_api_client::{ReaderApiClient, ReqwestTransport};
use crate::usecases::u601_extract_listings::task_resolver::TaskResolver;
use crate::usecases::u601_extract_listings::RunExecutor;

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    // .env до всего остального: в нем ключи и параметры базы
    let _ = dotenvy::dotenv();

    // Создаем директорию для логов
    let log_dir = std::path::Path::new("target").join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file_path = log_dir.join("listing-extractor.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                // Шумные зависимости только на warn
                "info,sea_orm=warn,sqlx=warn,headless_chrome=warn".into()
            }),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .init();

    let cli = Cli::parse();

    let secrets = Secrets::from_env().map_err(|e| {
        tracing::error!("{}", e);
        anyhow::anyhow!("{e}")
    })?;
    tracing::info!("Secrets loaded: {:?}", secrets);

    let config = config::load_config(cli.config.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("llm-runtime")
        .build()?;

    let mut executor = build_executor(&config, &secrets, runtime.handle().clone())?;
    let request = build_request(&cli, &config, &secrets)?;

    let mut presenter = ConsolePresenter::new(cli.show_raw);
    if let Err(e) = executor.start(request, &mut presenter) {
        tracing::error!("Run was not started: {}", e);
        std::process::exit(1);
    }

    executor.run_until_idle(&mut presenter, Duration::from_millis(config.ui.poll_interval_ms));
    Ok(())
}

/// Собрать все зависимости UseCase
fn build_executor(
    config: &Config,
    secrets: &Secrets,
    runtime: tokio::runtime::Handle,
) -> anyhow::Result<RunExecutor> {
    let native: Option<Arc<dyn LlmProvider>> = secrets.google_api_key.clone().map(|key| {
        let provider = match &config.llm.gemini_api_base {
            Some(base) => GeminiProvider::new_with_endpoint(base.clone(), key),
            None => GeminiProvider::new(key),
        };
        Arc::new(provider) as Arc<dyn LlmProvider>
    });

    // Совместимые endpoint'ы (локальные модели) допускают пустой ключ
    let chat_base = secrets
        .openai_api_base
        .clone()
        .or_else(|| config.llm.chat_api_base.clone());
    let chat: Option<Arc<dyn LlmProvider>> = match (secrets.openai_api_key.clone(), chat_base) {
        (Some(key), Some(base)) => Some(Arc::new(OpenAiProvider::new_with_endpoint(base, key))),
        (Some(key), None) => Some(Arc::new(OpenAiProvider::new(key))),
        (None, Some(base)) => Some(Arc::new(OpenAiProvider::new_with_endpoint(base, String::new()))),
        (None, None) => None,
    };
    if native.is_none() {
        tracing::warn!("GOOGLE_API_KEY is not set, gemini models are unavailable");
    }
    if chat.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set, chat models are unavailable");
    }

    let transport = ReqwestTransport::new(Duration::from_secs(config.reader.timeout_secs))?;
    let api_fetcher = Arc::new(ReaderApiClient::new(Arc::new(transport), &config.reader));
    let browser_fetcher = Arc::new(BrowserFetcher::new(&config.browser));

    let processor = Arc::new(ContentProcessor::new(native, chat, runtime.clone()));
    let recorder = Arc::new(ExcelRecorder::new(&config.results));

    let repository = MySqlEstateRepository::new(config.database.clone().with_env_overrides());
    let resolver = TaskResolver::new(Arc::new(repository));

    Ok(RunExecutor::new(
        resolver,
        api_fetcher,
        browser_fetcher,
        processor,
        recorder,
        runtime,
        secrets.reader_api_key.clone(),
    ))
}

/// Команда "старт" из аргументов командной строки и файлов промптов
fn build_request(cli: &Cli, config: &Config, secrets: &Secrets) -> anyhow::Result<RunRequest> {
    let prompts = Prompts::load_or_default(&config::resolve_path(&config.prompts.path));

    let system_prompt = if cli.default_system_prompt {
        DEFAULT_SYSTEM_PROMPT.to_string()
    } else if let Some(path) = &cli.system_prompt_file {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        if text.trim().is_empty() {
            anyhow::bail!("system prompt file {} is empty", path.display());
        }
        text
    } else {
        prompts.system
    };

    let (use_proxy, proxy_url) = cli.proxy_settings(secrets.proxy_url.as_deref());

    Ok(RunRequest {
        inputs: cli.collect_inputs()?,
        mode: cli.mode(),
        options: ProcessingOptions {
            use_proxy,
            proxy_url,
            save_results: cli.save,
            strategy: cli.strategy(),
            model: cli
                .model
                .clone()
                .unwrap_or_else(|| config.llm.default_model.clone()),
            exclude_selectors: config.reader.exclude_selectors.clone(),
        },
        system_prompt,
        user_prompt_template: prompts.user_template,
    })
}
