use headless_chrome::{Browser, LaunchOptions};
use std::ffi::{OsStr, OsString};
use std::time::Duration;

use super::content_fetcher::ContentFetcher;
use super::context::ProcessingContext;
use super::html_markdown::html_to_markdown;
use crate::shared::config::BrowserConfig;
use crate::shared::error::AppError;

/// Загрузка страницы через управляемый Chrome.
///
/// Каждая задача получает свой экземпляр браузера; он закрывается при выходе
/// из `fetch` по любому пути (Browser убивает процесс в Drop).
pub struct BrowserFetcher {
    headless: bool,
    settle: Duration,
}

impl BrowserFetcher {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            headless: config.headless,
            settle: Duration::from_secs(config.settle_secs),
        }
    }

    /// Аргументы запуска: без GPU и без флага автоматизации, прокси если включен
    pub fn launch_args(ctx: &ProcessingContext) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--disable-gpu".into(),
            "--disable-blink-features=AutomationControlled".into(),
        ];
        if let Some(proxy) = ctx.options.effective_proxy() {
            args.push(format!("--proxy-server={}", proxy).into());
        }
        args
    }

    fn load_page(&self, url: &str, ctx: &ProcessingContext) -> anyhow::Result<String> {
        let args = Self::launch_args(ctx);
        let arg_refs: Vec<&OsStr> = args.iter().map(OsString::as_os_str).collect();

        let options = LaunchOptions::default_builder()
            .headless(self.headless)
            .args(arg_refs)
            .idle_browser_timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| anyhow::anyhow!("invalid launch options: {}", e))?;

        let browser = Browser::new(options)?;
        let tab = browser.new_tab()?;

        tab.navigate_to(url)?;
        tab.wait_until_navigated()?;
        std::thread::sleep(self.settle);

        if !ctx.options.exclude_selectors.is_empty() {
            let removed = tab.evaluate(&cleanup_script(&ctx.options.exclude_selectors), false)?;
            tracing::debug!("DOM cleanup for {}: {:?} elements removed", url, removed.value);
        }

        let html = tab.get_content()?;
        Ok(html)
    }
}

impl ContentFetcher for BrowserFetcher {
    fn fetch(&self, url: &str, ctx: &ProcessingContext) -> Result<String, AppError> {
        tracing::info!("Browser fetch {} (headless: {})", url, self.headless);

        let html = self.load_page(url, ctx).map_err(|e| {
            tracing::error!("Browser automation failed for {}: {:#}", url, e);
            AppError::Automation(e.to_string())
        })?;

        Ok(html_to_markdown(&html))
    }

    fn success_message(&self) -> &'static str {
        "Completed successfully via browser"
    }
}

/// JS, удаляющий элементы по списку селекторов. Невалидные селекторы пропускаются.
pub fn cleanup_script(selectors: &[String]) -> String {
    let list = serde_json::to_string(selectors).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(() => {{
    const selectors = {};
    let removed = 0;
    for (const selector of selectors) {{
        try {{
            document.querySelectorAll(selector.trim()).forEach(el => {{ el.remove(); removed++; }});
        }} catch (e) {{}}
    }}
    return removed;
}})()"#,
        list
    )
}
