use std::collections::HashSet;

/// Теги, которые снимаются, а текст внутри остается
const UNWRAPPED_TAGS: [&str; 2] = ["a", "img"];

/// Теги, которые удаляются вместе с содержимым
const DROPPED_TAGS: [&str; 5] = ["script", "style", "svg", "button", "noscript"];

/// Отрендеренный HTML страницы -> Markdown без ссылок, картинок и пустых строк
pub fn html_to_markdown(html: &str) -> String {
    let sanitized = ammonia::Builder::default()
        .rm_tags(UNWRAPPED_TAGS.iter())
        .clean_content_tags(DROPPED_TAGS.iter().copied().collect::<HashSet<_>>())
        .clean(html)
        .to_string();

    let markdown = html2md::parse_html(&sanitized);
    collapse_blank_lines(&markdown)
}

/// Обрезать строки и выбросить пустые
pub fn collapse_blank_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
