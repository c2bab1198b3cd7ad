use clap::Parser;
use contracts::enums::{FetchStrategy, InputMode};
use std::io::{BufRead, Read};
use std::path::PathBuf;

use crate::shared::error::AppError;

/// Аргументы командной строки
#[derive(Parser, Debug)]
#[command(
    name = "listing-extractor",
    about = "Fetch listing pages as Markdown, extract data with an LLM and save results to Excel",
    long_about = None,
    version
)]
pub struct Cli {
    /// URLs (or SE numbers with --se-numbers), one per argument
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// Read inputs from a file, one per line ("-" for stdin)
    #[arg(short = 'i', long, value_name = "PATH")]
    pub input_file: Option<PathBuf>,

    /// Treat inputs as SE numbers and look up their URLs in the database
    #[arg(long)]
    pub se_numbers: bool,

    /// Render pages in a local browser instead of the reader API (sequential)
    #[arg(short = 'b', long)]
    pub browser: bool,

    /// LLM model identifier; "gemini*" models use the Gemini API
    #[arg(short = 'm', long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Route fetching through a proxy (defaults to PROXY_URL from the environment)
    #[arg(long, value_name = "URL", num_args = 0..=1, default_missing_value = "")]
    pub proxy: Option<String>,

    /// Do not use a proxy even if PROXY_URL is set
    #[arg(long, conflicts_with = "proxy")]
    pub no_proxy: bool,

    /// Append each result to the Excel file of the run
    #[arg(short = 's', long)]
    pub save: bool,

    /// Read the system prompt from a plain text file
    #[arg(long, value_name = "PATH", conflicts_with = "default_system_prompt")]
    pub system_prompt_file: Option<PathBuf>,

    /// Use the built-in system prompt, ignoring prompts.toml
    #[arg(long)]
    pub default_system_prompt: bool,

    /// Path to config.toml
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Also print the raw Markdown of every page
    #[arg(long)]
    pub show_raw: bool,
}

impl Cli {
    pub fn mode(&self) -> InputMode {
        if self.se_numbers {
            InputMode::SeNumber
        } else {
            InputMode::RawUrl
        }
    }

    pub fn strategy(&self) -> FetchStrategy {
        if self.browser {
            FetchStrategy::Browser
        } else {
            FetchStrategy::Api
        }
    }

    /// Прокси: флаг --proxy с адресом, --proxy без адреса (берем PROXY_URL),
    /// без флагов - включен, если PROXY_URL задан
    pub fn proxy_settings(&self, env_proxy: Option<&str>) -> (bool, Option<String>) {
        if self.no_proxy {
            return (false, env_proxy.map(str::to_string));
        }
        match self.proxy.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => (true, Some(url.to_string())),
            Some(_) => (true, env_proxy.map(str::to_string)),
            None => (env_proxy.is_some(), env_proxy.map(str::to_string)),
        }
    }

    /// Аргументы плюс строки из --input-file
    pub fn collect_inputs(&self) -> Result<Vec<String>, AppError> {
        let mut inputs = self.inputs.clone();
        if let Some(path) = &self.input_file {
            let contents = if path.as_os_str() == "-" {
                let mut buf = String::new();
                std::io::stdin()
                    .lock()
                    .read_to_string(&mut buf)
                    .map_err(|e| AppError::input(format!("Failed to read stdin: {}", e)))?;
                buf
            } else {
                std::fs::read_to_string(path)
                    .map_err(|e| AppError::input(format!("Failed to read {}: {}", path.display(), e)))?
            };
            inputs.extend(split_lines(contents.as_bytes()));
        }
        Ok(inputs)
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    bytes.lines().map_while(Result::ok).collect()
}
