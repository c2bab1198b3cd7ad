use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

use crate::shared::config::DatabaseConfig;
use crate::shared::error::AppError;

/// Подключиться к MySQL с объявлениями.
///
/// Глобального пула нет: соединение открывается на время одного резолва
/// SE номеров и закрывается вместе с DatabaseConnection.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, AppError> {
    let url = config.connection_url()?;

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    tracing::info!(
        "Connecting to estates database at {}:{}",
        config.host.as_deref().unwrap_or_default(),
        config.port.unwrap_or(3306)
    );

    Database::connect(options)
        .await
        .map_err(|e| AppError::Database(format!("connection failed: {}", e)))
}
