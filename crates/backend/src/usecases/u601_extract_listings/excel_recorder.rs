use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::Local;
use contracts::domain::a001_fetch_task::Task;
use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::context::RunInfo;
use crate::shared::config::{FileGrouping, ResultsConfig};
use crate::shared::error::AppError;

pub const SHEET_NAME: &str = "Processed Data";

/// Предел длины текста в ячейке Excel
const MAX_CELL_CHARS: usize = 32_767;

const BASE_HEADER: [&str; 8] = [
    "Domain",
    "Source Estate ID",
    "Source ID",
    "URL",
    "Status",
    "Rent Status",
    "Subtype",
    "Type",
];
const RAW_HEADER: &str = "Raw Markdown";
const PROCESSED_HEADER: &str = "Processed Content";

/// Результат записи: флаг и сообщение для строки статуса
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn text(value: Option<&str>) -> Self {
        match value {
            Some(v) => Cell::Text(v.to_string()),
            None => Cell::Empty,
        }
    }

    fn number(value: Option<i64>) -> Self {
        match value {
            Some(v) => Cell::Number(v as f64),
            None => Cell::Empty,
        }
    }

    fn display_len(&self) -> usize {
        match self {
            Cell::Text(s) => s.chars().count(),
            Cell::Number(n) => n.to_string().len(),
            Cell::Empty => 0,
        }
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::Text(unescape_xstring(s)),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// Раскодировать `_xHHHH_` последовательности OOXML.
///
/// rust_xlsxwriter кодирует так `\r`, управляющие символы и литеральный `_x`,
/// а calamine отдает строку как есть. Без обратного преобразования каждая
/// перезапись файла кодировала бы прежние строки повторно.
fn unescape_xstring(text: &str) -> String {
    if !text.contains("_x") {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &candidate[7..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Дописывает строки результатов в xlsx файл запуска/дня.
///
/// Файл перечитывается и сохраняется целиком на каждую строку, поэтому
/// запись сериализована мьютексом: параллельные потоки не теряют строки.
pub struct ExcelRecorder {
    dir: PathBuf,
    grouping: FileGrouping,
    include_raw_markdown: bool,
    lock: Mutex<()>,
}

impl ExcelRecorder {
    pub fn new(config: &ResultsConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            grouping: config.file_grouping,
            include_raw_markdown: config.include_raw_markdown,
            lock: Mutex::new(()),
        }
    }

    pub fn header(&self) -> Vec<&'static str> {
        let mut header = BASE_HEADER.to_vec();
        if self.include_raw_markdown {
            header.push(RAW_HEADER);
        }
        header.push(PROCESSED_HEADER);
        header
    }

    pub fn file_name(&self, run: &RunInfo) -> String {
        let key = match self.grouping {
            FileGrouping::Run => run.run_id.clone(),
            FileGrouping::Day => Local::now().format("%Y-%m-%d").to_string(),
            FileGrouping::Minute => run.started_at.format("%Y-%m-%d_%H-%M").to_string(),
        };
        format!("results_{}.xlsx", key)
    }

    pub fn file_path(&self, run: &RunInfo) -> PathBuf {
        self.dir.join(self.file_name(run))
    }

    /// Дописать строку. Никогда не паникует и не возвращает Err:
    /// любая ошибка превращается в `success = false`.
    pub fn save(&self, task: &Task, raw_markdown: &str, processed: &str, run: &RunInfo) -> SaveOutcome {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let path = self.file_path(run);

        match self.append_row(&path, task, raw_markdown, processed) {
            Ok(()) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                tracing::info!("Saved row for {} to {}", task.url(), path.display());
                SaveOutcome {
                    success: true,
                    message: format!("Saved to {}", name),
                }
            }
            Err(e) => {
                tracing::error!("Excel save failed for {}: {}", task.url(), e);
                SaveOutcome {
                    success: false,
                    message: e.to_string(),
                }
            }
        }
    }

    fn append_row(&self, path: &Path, task: &Task, raw_markdown: &str, processed: &str) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::Persistence(format!("cannot create {}: {}", self.dir.display(), e))
        })?;

        let header = self.header();
        let mut rows = if path.exists() {
            read_rows(path, &header)?
        } else {
            Vec::new()
        };
        rows.push(self.task_row(task, raw_markdown, processed));

        write_workbook(path, &header, &rows)
    }

    fn task_row(&self, task: &Task, raw_markdown: &str, processed: &str) -> Vec<Cell> {
        let mut row = vec![
            Cell::text(task.domain()),
            Cell::number(task.source_estate_id()),
            Cell::number(task.source_id()),
            Cell::Text(task.url().to_string()),
            Cell::text(task.status()),
            Cell::text(task.rent_status()),
            Cell::text(task.subtype()),
            Cell::text(task.kind()),
        ];
        if self.include_raw_markdown {
            row.push(Cell::Text(raw_markdown.to_string()));
        }
        row.push(Cell::Text(processed.to_string()));
        row
    }
}

/// Прочитать данные существующего файла (без заголовка), сверив заголовок
fn read_rows(path: &Path, expected_header: &[&str]) -> Result<Vec<Vec<Cell>>, AppError> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| AppError::Persistence(format!("cannot open {}: {}", path.display(), e)))?;
    let range = workbook
        .worksheet_range(SHEET_NAME)
        .map_err(|e| AppError::Persistence(format!("cannot read sheet '{}': {}", SHEET_NAME, e)))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();

    if header != expected_header {
        return Err(AppError::Persistence(format!(
            "{} has columns {:?}, expected {:?}",
            path.display(),
            header,
            expected_header
        )));
    }

    Ok(rows
        .map(|r| {
            let mut cells: Vec<Cell> = r.iter().map(Cell::from).collect();
            cells.resize(expected_header.len(), Cell::Empty);
            cells
        })
        .collect())
}

fn write_workbook(path: &Path, header: &[&str], rows: &[Vec<Cell>]) -> Result<(), AppError> {
    let persist = |e: rust_xlsxwriter::XlsxError| AppError::Persistence(e.to_string());

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME).map_err(persist)?;

    let bold = Format::new().set_bold();
    let wrapped = Format::new().set_text_wrap().set_align(FormatAlign::Top);

    for (col, title) in header.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *title, &bold)
            .map_err(persist)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let row_num = (idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            let is_long_text = matches!(header.get(col as usize), Some(&PROCESSED_HEADER) | Some(&RAW_HEADER));
            match cell {
                Cell::Text(text) => {
                    let text = fit_cell_text(text);
                    if is_long_text {
                        worksheet.write_string_with_format(row_num, col, text, &wrapped)
                    } else {
                        worksheet.write_string(row_num, col, text)
                    }
                    .map_err(persist)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(row_num, col, *n).map_err(persist)?;
                }
                Cell::Empty => {}
            }
        }
    }

    for (col, title) in header.iter().enumerate() {
        let width = match *title {
            PROCESSED_HEADER | RAW_HEADER => 80.0,
            "URL" => 60.0,
            _ => {
                let longest = rows
                    .iter()
                    .filter_map(|r| r.get(col))
                    .map(Cell::display_len)
                    .max()
                    .unwrap_or(0);
                ((longest + 2).max(15)) as f64
            }
        };
        worksheet.set_column_width(col as u16, width).map_err(persist)?;
    }

    workbook.save(path).map_err(persist)
}

fn fit_cell_text(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => {
            tracing::warn!("Cell text truncated to {} chars for Excel", MAX_CELL_CHARS);
            &text[..cut]
        }
        None => text,
    }
}
