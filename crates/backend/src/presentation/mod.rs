pub mod console;

use contracts::usecases::u601_extract_listings::{TextChannel, UiEvent};

pub use console::ConsolePresenter;

/// Слой представления. Вызывается только из потока цикла опроса.
pub trait Presenter {
    /// Заменить содержимое окна вывода
    fn set_text(&mut self, channel: TextChannel, content: &str);

    fn set_status(&mut self, message: &str, is_error: bool);

    /// Разрешить/запретить ввод новой команды (кнопка "Process")
    fn set_input_enabled(&mut self, enabled: bool);

    fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::UpdateText { channel, content } => self.set_text(channel, &content),
            UiEvent::UpdateStatus { message } => self.set_status(&message, false),
            UiEvent::Error { message } => self.set_status(&message, true),
        }
    }
}
