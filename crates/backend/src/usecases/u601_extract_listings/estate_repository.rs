use async_trait::async_trait;
use contracts::domain::a001_fetch_task::EstateRecord;
use sea_orm::{ConnectionTrait, DatabaseBackend, QueryResult, Statement, Value};

use crate::shared::config::DatabaseConfig;
use crate::shared::data::db;
use crate::shared::error::AppError;

/// Поиск объявлений по внутренним номерам (SE)
#[async_trait]
pub trait EstateLookup: Send + Sync {
    /// Строки в порядке, в котором их вернула база. Ненайденные номера просто отсутствуют.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<EstateRecord>, AppError>;
}

/// Репозиторий source_estates в MySQL
pub struct MySqlEstateRepository {
    config: DatabaseConfig,
}

impl MySqlEstateRepository {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

/// SELECT с одним плейсхолдером на номер. Идентификаторы приводятся к SIGNED,
/// справочные поля к CHAR, чтобы тип колонки в базе не ломал чтение.
pub fn build_lookup_query(count: usize) -> String {
    let placeholders = vec!["?"; count].join(", ");
    format!(
        r#"
        SELECT
            CAST(se.id AS SIGNED) AS source_estate_id,
            CAST(se.source_id AS SIGNED) AS source_id,
            se.url AS url,
            CAST(se.status AS CHAR) AS status,
            CAST(se.rent_status AS CHAR) AS rent_status,
            CAST(se.subtype AS CHAR) AS subtype,
            CAST(se.type AS CHAR) AS type,
            s.name AS domain
        FROM source_estates se
        LEFT JOIN sources s ON se.source_id = s.id
        WHERE se.id IN ({})
        "#,
        placeholders
    )
}

fn map_row(row: &QueryResult) -> Result<EstateRecord, AppError> {
    Ok(EstateRecord {
        source_estate_id: row.try_get("", "source_estate_id")?,
        source_id: row.try_get("", "source_id")?,
        url: row
            .try_get::<Option<String>>("", "url")?
            .unwrap_or_default(),
        status: row.try_get("", "status")?,
        rent_status: row.try_get("", "rent_status")?,
        subtype: row.try_get("", "subtype")?,
        kind: row.try_get("", "type")?,
        domain: row.try_get("", "domain")?,
    })
}

#[async_trait]
impl EstateLookup for MySqlEstateRepository {
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<EstateRecord>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = db::connect(&self.config).await?;

        let statement = Statement::from_sql_and_values(
            DatabaseBackend::MySql,
            build_lookup_query(ids.len()),
            ids.iter().map(|id| Value::from(*id)),
        );

        let rows = conn.query_all(statement).await.map_err(|e| {
            tracing::error!("Estate lookup query failed: {}", e);
            AppError::Database(format!("query failed: {}", e))
        })?;

        let records = rows.iter().map(map_row).collect::<Result<Vec<_>, _>>()?;

        tracing::info!("Estate lookup: {} ids requested, {} rows found", ids.len(), records.len());
        Ok(records)
    }
}
