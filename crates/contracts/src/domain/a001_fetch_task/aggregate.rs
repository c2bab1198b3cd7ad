use serde::{Deserialize, Serialize};

// ============================================================================
// Database row
// ============================================================================

/// Строка из таблицы объявлений (source_estates) с расшифровкой справочников
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstateRecord {
    pub source_estate_id: i64,
    pub source_id: Option<i64>,
    pub url: String,
    pub status: Option<String>,
    pub rent_status: Option<String>,
    pub subtype: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub domain: Option<String>,
}

// ============================================================================
// Aggregate
// ============================================================================

/// Единица работы: одна страница для загрузки и обработки.
///
/// Создается резолвером и после этого не меняется, поэтому поля закрыты
/// и доступны только на чтение.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    url: String,
    source_id: Option<i64>,
    source_estate_id: Option<i64>,
    domain: Option<String>,
    status: Option<String>,
    rent_status: Option<String>,
    subtype: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl Task {
    /// Задача из "сырого" URL, все дополнительные поля пустые
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source_id: None,
            source_estate_id: None,
            domain: None,
            status: None,
            rent_status: None,
            subtype: None,
            kind: None,
        }
    }

    /// Задача из строки базы данных
    pub fn from_estate(record: EstateRecord) -> Self {
        Self {
            url: record.url,
            source_id: record.source_id,
            source_estate_id: Some(record.source_estate_id),
            domain: record.domain,
            status: record.status,
            rent_status: record.rent_status,
            subtype: record.subtype,
            kind: record.kind,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }

    pub fn source_id(&self) -> Option<i64> {
        self.source_id
    }

    pub fn source_estate_id(&self) -> Option<i64> {
        self.source_estate_id
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn rent_status(&self) -> Option<&str> {
        self.rent_status.as_deref()
    }

    pub fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Метка для статусов и логов
    pub fn label(&self) -> String {
        match self.source_estate_id {
            Some(id) => format!("SE {} ({})", id, self.url),
            None => self.url.clone(),
        }
    }
}
