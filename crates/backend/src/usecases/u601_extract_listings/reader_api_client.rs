use std::sync::Arc;
use std::time::Duration;

use super::content_fetcher::ContentFetcher;
use super::context::ProcessingContext;
use crate::shared::config::ReaderConfig;
use crate::shared::error::AppError;

/// Готовый к отправке GET запрос к reader API
#[derive(Debug, Clone)]
pub struct ReaderRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl ReaderRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ReaderResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP транспорт. Err - только сбой транспорта (таймаут, DNS, отказ соединения),
/// любой HTTP статус возвращается как Ok.
pub trait ReaderTransport: Send + Sync {
    fn get(&self, request: &ReaderRequest) -> Result<ReaderResponse, String>;
}

/// Транспорт на блокирующем reqwest: рабочие потоки - обычные OS потоки
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl ReaderTransport for ReqwestTransport {
    fn get(&self, request: &ReaderRequest) -> Result<ReaderResponse, String> {
        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| e.to_string())?;
        Ok(ReaderResponse { status, body })
    }
}

/// HTTP-клиент reader API (r.jina.ai): URL страницы в пути, Markdown в ответе
pub struct ReaderApiClient {
    transport: Arc<dyn ReaderTransport>,
    base_url: String,
    timeout: Duration,
}

impl ReaderApiClient {
    pub fn new(transport: Arc<dyn ReaderTransport>, config: &ReaderConfig) -> Self {
        Self {
            transport,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Сформировать запрос: bearer токен, селекторы исключения, прокси если включен
    pub fn build_request(&self, url: &str, ctx: &ProcessingContext) -> ReaderRequest {
        let mut headers = vec![
            ("Authorization".to_string(), format!("Bearer {}", ctx.api_key)),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];

        if !ctx.options.exclude_selectors.is_empty() {
            headers.push((
                "X-Exclude-Selector".to_string(),
                ctx.options.exclude_selectors.join(","),
            ));
        }

        if let Some(proxy) = ctx.options.effective_proxy() {
            headers.push(("X-Proxy-Url".to_string(), proxy.to_string()));
        }

        ReaderRequest {
            url: format!("{}/{}", self.base_url, url),
            headers,
            timeout: self.timeout,
        }
    }
}

impl ContentFetcher for ReaderApiClient {
    fn fetch(&self, url: &str, ctx: &ProcessingContext) -> Result<String, AppError> {
        let request = self.build_request(url, ctx);
        tracing::info!(
            "GET {} (proxy: {})",
            request.url,
            request.header("X-Proxy-Url").is_some()
        );

        let response = self.transport.get(&request).map_err(|e| {
            tracing::error!("Reader API transport failure for {}: {}", url, e);
            AppError::Network(e)
        })?;

        if response.status != 200 {
            tracing::error!("Reader API returned {} for {}", response.status, url);
            return Err(AppError::Api {
                status: response.status,
                body: response.body,
            });
        }

        tracing::debug!("Reader API returned {} chars for {}", response.body.len(), url);
        Ok(response.body)
    }

    fn success_message(&self) -> &'static str {
        "Completed successfully"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u601_extract_listings::testing::{test_context, FakeTransport};

    fn client(transport: Arc<FakeTransport>) -> ReaderApiClient {
        ReaderApiClient::new(transport, &ReaderConfig::default())
    }

    #[test]
    fn test_request_headers_without_proxy() {
        let (mut ctx, _rx) = test_context();
        ctx.options.use_proxy = false;
        ctx.options.proxy_url = Some("http://proxy:8080".into());
        let request = client(Arc::new(FakeTransport::ok("x"))).build_request("example.com/a", &ctx);

        assert_eq!(request.url, "https://r.jina.ai/example.com/a");
        assert_eq!(request.header("Authorization"), Some("Bearer test-key"));
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.header("X-Exclude-Selector"), Some("nav,.ads"));
        assert_eq!(request.header("X-Proxy-Url"), None);
        assert_eq!(request.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_request_carries_proxy_when_enabled() {
        let (mut ctx, _rx) = test_context();
        ctx.options.use_proxy = true;
        ctx.options.proxy_url = Some("http://proxy:8080".into());
        let request = client(Arc::new(FakeTransport::ok("x"))).build_request("example.com/a", &ctx);
        assert_eq!(request.header("X-Proxy-Url"), Some("http://proxy:8080"));
    }

    #[test]
    fn test_ok_response_is_markdown() {
        let (ctx, _rx) = test_context();
        let transport = Arc::new(FakeTransport::ok("# Title"));
        let md = client(transport.clone()).fetch("example.com/a", &ctx).unwrap();
        assert_eq!(md, "# Title");
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_non_200_is_api_error_with_body() {
        let (ctx, _rx) = test_context();
        let transport = Arc::new(FakeTransport::status(402, "quota exceeded"));
        let err = client(transport).fetch("example.com/a", &ctx).unwrap_err();
        assert_eq!(err.to_string(), "API Error 402: quota exceeded");
    }

    #[test]
    fn test_transport_failure_is_network_error() {
        let (ctx, _rx) = test_context();
        let transport = Arc::new(FakeTransport::failing("connection refused"));
        let err = client(transport).fetch("example.com/a", &ctx).unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert_eq!(err.to_string(), "Request failed: connection refused");
    }
}
