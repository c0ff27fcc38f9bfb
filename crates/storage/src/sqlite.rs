//! SQLite Feature Store

use crate::{FeatureRecord, FeatureSink, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feature_engine::{FeatureName, FeatureVector, FEATURE_DIMENSION};
use signal_model::DataSource;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info, warn};

const METADATA_COLUMNS: [&str; 5] = ["source", "filename", "channel", "file_idx", "bearing_name"];

/// Feature records in a SQLite `features` table
#[derive(Debug, Clone)]
pub struct SqliteFeatureStore {
    pool: SqlitePool,
    insert_sql: String,
}

impl SqliteFeatureStore {
    /// Open (or create) the database at `url` and ensure the schema exists.
    ///
    /// In-memory URLs are limited to a single pooled connection, since every
    /// SQLite connection would otherwise see its own empty database.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let in_memory = url.contains(":memory:");

        let mut pool_options = SqlitePoolOptions::new();
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(max_connections.max(1))
        };
        let pool = pool_options.connect_with(options).await?;

        let store = Self {
            pool,
            insert_sql: insert_statement(),
        };
        store.migrate().await?;

        info!("SQLite feature store ready at {}", url);
        Ok(store)
    }

    /// In-memory database, mainly for tests
    pub async fn in_memory() -> Result<Self, StorageError> {
        Self::connect("sqlite::memory:", 1).await
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        let feature_columns: Vec<String> = FeatureName::ALL
            .iter()
            .map(|name| format!("{} REAL NOT NULL", name.column()))
            .collect();

        let create = format!(
            "CREATE TABLE IF NOT EXISTS features (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source INTEGER NOT NULL,
                filename TEXT NOT NULL,
                channel TEXT NOT NULL,
                file_idx INTEGER,
                bearing_name TEXT,
                {},
                computed_at TEXT NOT NULL
            )",
            feature_columns.join(",\n                ")
        );
        sqlx::query(&create).execute(&self.pool).await?;

        for column in ["filename", "channel", "file_idx", "bearing_name"] {
            let index = format!(
                "CREATE INDEX IF NOT EXISTS idx_features_{column} ON features ({column})"
            );
            sqlx::query(&index).execute(&self.pool).await?;
        }

        debug!("Feature schema migrated");
        Ok(())
    }

    /// Insert one record
    pub async fn insert(&self, record: &FeatureRecord) -> Result<(), StorageError> {
        self.bind_insert(record).execute(&self.pool).await?;
        Ok(())
    }

    fn bind_insert<'q>(
        &'q self,
        record: &FeatureRecord,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        let mut query = sqlx::query(&self.insert_sql)
            .bind(record.source.code())
            .bind(record.filename.clone())
            .bind(record.channel.clone())
            .bind(record.file_idx.map(i64::from))
            .bind(record.bearing_name.clone());
        for value in record.features.values() {
            query = query.bind(value);
        }
        query.bind(record.computed_at.to_rfc3339())
    }

    /// One series per requested feature for a bearing channel, ordered by
    /// run-to-failure index
    pub async fn list_features(
        &self,
        bearing_name: &str,
        channel: &str,
        features: &[FeatureName],
    ) -> Result<Vec<Vec<f64>>, StorageError> {
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let columns: Vec<&str> = features.iter().map(|f| f.column()).collect();
        let sql = format!(
            "SELECT {} FROM features WHERE bearing_name = ? AND channel = ? ORDER BY file_idx, id",
            columns.join(", ")
        );
        let rows = sqlx::query(&sql)
            .bind(bearing_name)
            .bind(channel)
            .fetch_all(&self.pool)
            .await?;

        let mut series = vec![Vec::with_capacity(rows.len()); features.len()];
        for row in &rows {
            for (i, column) in columns.iter().enumerate() {
                series[i].push(row.try_get::<f64, _>(*column)?);
            }
        }
        Ok(series)
    }

    /// Full records of a bearing channel, ordered by run-to-failure index
    pub async fn list_records(
        &self,
        bearing_name: &str,
        channel: &str,
    ) -> Result<Vec<FeatureRecord>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM features WHERE bearing_name = ? AND channel = ? ORDER BY file_idx, id",
        )
        .bind(bearing_name)
        .bind(channel)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_record).collect()
    }

    /// Number of stored records
    pub async fn count(&self) -> Result<i64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM features")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Remove every record; returns the number deleted
    pub async fn delete_all_features(&self) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM features").execute(&self.pool).await?;
        info!("Deleted {} feature records", result.rows_affected());
        Ok(result.rows_affected())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl FeatureSink for SqliteFeatureStore {
    async fn store(&self, batch: Vec<FeatureRecord>) -> Vec<Result<(), StorageError>> {
        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                let msg = e.to_string();
                return batch
                    .iter()
                    .map(|_| Err(StorageError::DatabaseError(msg.clone())))
                    .collect();
            }
        };

        let mut results = Vec::with_capacity(batch.len());
        for record in &batch {
            let result = self
                .bind_insert(record)
                .execute(&mut *tx)
                .await
                .map(|_| ())
                .map_err(StorageError::from);
            if let Err(e) = &result {
                warn!("Failed to store features of {}/{}: {}", record.filename, record.channel, e);
            }
            results.push(result);
        }

        if let Err(e) = tx.commit().await {
            let msg = e.to_string();
            return results
                .into_iter()
                .map(|r| r.and(Err(StorageError::DatabaseError(msg.clone()))))
                .collect();
        }

        debug!("Stored {} feature records in SQLite", batch.len());
        results
    }
}

fn insert_statement() -> String {
    let columns: Vec<&str> = METADATA_COLUMNS
        .into_iter()
        .chain(FeatureName::ALL.iter().map(|f| f.column()))
        .chain(std::iter::once("computed_at"))
        .collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO features ({}) VALUES ({})",
        columns.join(", "),
        placeholders
    )
}

fn decode_record(row: &SqliteRow) -> Result<FeatureRecord, StorageError> {
    let code: i64 = row.try_get("source")?;
    let source = DataSource::from_code(code)
        .ok_or_else(|| StorageError::SerializationError(format!("unknown source code {code}")))?;

    let file_idx = row
        .try_get::<Option<i64>, _>("file_idx")?
        .map(u32::try_from)
        .transpose()
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;

    let filename: String = row.try_get("filename")?;
    let channel: String = row.try_get("channel")?;

    let mut values = [0.0; FEATURE_DIMENSION];
    for (value, name) in values.iter_mut().zip(FeatureName::ALL) {
        *value = row.try_get::<f64, _>(name.column())?;
    }
    let features = FeatureVector::from_values(values, filename.clone(), channel.clone());

    let stamp: String = row.try_get("computed_at")?;
    let computed_at = DateTime::parse_from_rfc3339(&stamp)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?
        .with_timezone(&Utc);

    Ok(FeatureRecord {
        source,
        filename,
        channel,
        bearing_name: row.try_get("bearing_name")?,
        file_idx,
        features,
        computed_at,
    })
}
