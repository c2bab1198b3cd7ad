use chrono::Local;
use contracts::usecases::u601_extract_listings::TextChannel;
use std::io::Write;

use super::Presenter;

const SEPARATOR: &str = "────────────────────────────────────────────────────────────";

/// Консольное представление: два "окна" вывода и строка статуса.
///
/// Окна хранят только последнее содержимое (замена, не дописывание),
/// но каждое обновление печатается, чтобы в терминале была видна история.
pub struct ConsolePresenter {
    out: Box<dyn Write + Send>,
    show_raw: bool,
    raw: String,
    processed: String,
    status: String,
    status_is_error: bool,
    input_enabled: bool,
}

impl ConsolePresenter {
    pub fn new(show_raw: bool) -> Self {
        Self::with_writer(Box::new(std::io::stdout()), show_raw)
    }

    pub fn with_writer(out: Box<dyn Write + Send>, show_raw: bool) -> Self {
        Self {
            out,
            show_raw,
            raw: String::new(),
            processed: String::new(),
            status: "Ready".to_string(),
            status_is_error: false,
            input_enabled: true,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn processed(&self) -> &str {
        &self.processed
    }

    pub fn status(&self) -> (&str, bool) {
        (&self.status, self.status_is_error)
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    fn print_block(&mut self, title: &str, content: &str) {
        let _ = writeln!(self.out, "{}\n{}\n{}", title, SEPARATOR, content.trim_end());
        let _ = writeln!(self.out, "{}", SEPARATOR);
        let _ = self.out.flush();
    }
}

impl Presenter for ConsolePresenter {
    fn set_text(&mut self, channel: TextChannel, content: &str) {
        match channel {
            TextChannel::Raw => {
                self.raw = content.to_string();
                if self.show_raw {
                    self.print_block("Raw Markdown", content);
                }
            }
            TextChannel::Processed => {
                self.processed = content.to_string();
                self.print_block("Processed Content", content);
            }
        }
    }

    fn set_status(&mut self, message: &str, is_error: bool) {
        self.status = message.to_string();
        self.status_is_error = is_error;

        // Голубой для обычного статуса, коричневый для ошибок
        let color_code = if is_error { "33" } else { "36" };
        let _ = writeln!(
            self.out,
            "\x1b[{}m{}\x1b[0m | {}",
            color_code,
            Local::now().format("%H:%M:%S"),
            message
        );
        let _ = self.out.flush();
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }
}
