//! SQLite-backed stock store.
//!
//! One `inventory` table, one row per (part_number, location). The uniqueness
//! of that pair is enforced by the schema; writes go through
//! `INSERT .. ON CONFLICT DO UPDATE` so there is no lookup-before-insert.
//!
//! Timestamps are stored as RFC 3339 text, ids as hyphenated UUID text.
//!
//! An existing `inventory` table with another layout (integer ids, no unique
//! (part_number, location) index) is refused at open time with
//! `StoreError::Schema`; it is never migrated in place.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use stockroom_core::StockRecordId;
use stockroom_inventory::{Location, PartNumber, StockKey, StockRecord, StockStatus};

use super::{StockStore, StoreError};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS inventory (
        id           TEXT PRIMARY KEY,
        part_number  TEXT NOT NULL,
        location     TEXT NOT NULL,
        quantity     INTEGER NOT NULL CHECK (quantity >= 0),
        date_in      TEXT NOT NULL,
        last_updated TEXT NOT NULL,
        status       TEXT NOT NULL DEFAULT 'Available',
        UNIQUE (part_number, location)
    )
"#;

#[derive(Debug, Clone)]
pub struct SqliteStockStore {
    pool: SqlitePool,
}

impl SqliteStockStore {
    /// Connect (creating the database file and its directory if needed) and
    /// ensure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| map_sqlx_error("parse_database_url", e))?
            .create_if_missing(true);

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Storage(format!("failed to create database directory {parent:?}: {e}"))
                })?;
            }
        }

        // In-memory databases live and die with their connection; keep exactly
        // one open for the life of the pool.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, ensure the schema exists and check that an
    /// already present table has the expected layout.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(|e| map_sqlx_error("create_table", e))?;
        verify_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl StockStore for SqliteStockStore {
    #[instrument(skip(self), err)]
    async fn load_all(&self) -> Result<Vec<StockRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, part_number, location, quantity, date_in, last_updated, status
            FROM inventory
            ORDER BY part_number, location
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_all", e))?;

        rows.iter().map(record_from_row).collect()
    }

    #[instrument(skip(self, record), fields(part_number = %record.part_number(), location = %record.location()), err)]
    async fn upsert(&self, record: &StockRecord) -> Result<(), StoreError> {
        let quantity = i64::try_from(record.quantity())
            .map_err(|_| StoreError::Storage(format!("quantity {} exceeds column range", record.quantity())))?;

        sqlx::query(
            r#"
            INSERT INTO inventory (id, part_number, location, quantity, date_in, last_updated, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (part_number, location)
            DO UPDATE SET
                quantity = excluded.quantity,
                last_updated = excluded.last_updated,
                status = excluded.status
            "#,
        )
        .bind(record.id().to_string())
        .bind(record.part_number().as_str())
        .bind(record.location().as_str())
        .bind(quantity)
        .bind(record.date_in().to_rfc3339())
        .bind(record.last_updated().to_rfc3339())
        .bind(record.status().as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert", e))?;

        Ok(())
    }
}

async fn verify_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    let id_type: Option<String> =
        sqlx::query_scalar("SELECT type FROM pragma_table_info('inventory') WHERE name = 'id'")
            .fetch_optional(pool)
            .await
            .map_err(|e| map_sqlx_error("verify_schema", e))?;
    match id_type {
        Some(t) if t.eq_ignore_ascii_case("TEXT") => {}
        other => {
            return Err(StoreError::Schema(format!(
                "inventory.id must be TEXT (found {}); point STOCKROOM_DATABASE_URL at a new database",
                other.as_deref().unwrap_or("no id column")
            )));
        }
    }

    let unique_pair_indexes: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM pragma_index_list('inventory') AS il
        WHERE il."unique" = 1
          AND (SELECT COUNT(*) FROM pragma_index_info(il.name)) = 2
          AND (SELECT COUNT(*) FROM pragma_index_info(il.name)
               WHERE name IN ('part_number', 'location')) = 2
        "#,
    )
    .fetch_one(pool)
    .await
    .map_err(|e| map_sqlx_error("verify_schema", e))?;
    if unique_pair_indexes == 0 {
        return Err(StoreError::Schema(
            "inventory has no unique (part_number, location) index".to_string(),
        ));
    }

    Ok(())
}

fn record_from_row(row: &SqliteRow) -> Result<StockRecord, StoreError> {
    let column = |name: &str| -> Result<String, StoreError> {
        row.try_get::<String, _>(name)
            .map_err(|e| StoreError::Corrupt(format!("column {name}: {e}")))
    };

    let id: StockRecordId = column("id")?
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("id: {e}")))?;
    let part_number =
        PartNumber::parse(&column("part_number")?).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let location =
        Location::parse(&column("location")?).map_err(|e| StoreError::Corrupt(e.to_string()))?;

    let quantity: i64 = row
        .try_get("quantity")
        .map_err(|e| StoreError::Corrupt(format!("column quantity: {e}")))?;
    let quantity = u64::try_from(quantity)
        .map_err(|_| StoreError::Corrupt(format!("negative quantity {quantity} for {part_number} at {location}")))?;

    let status: Option<String> = row
        .try_get("status")
        .map_err(|e| StoreError::Corrupt(format!("column status: {e}")))?;
    let status =
        StockStatus::from_stored(status.as_deref()).map_err(|e| StoreError::Corrupt(e.to_string()))?;

    Ok(StockRecord::restore(
        id,
        StockKey::new(part_number, location),
        quantity,
        parse_timestamp("date_in", &column("date_in")?)?,
        parse_timestamp("last_updated", &column("last_updated")?)?,
        status,
    ))
}

fn parse_timestamp(name: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("column {name}: {e}")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Storage(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::Storage(format!("pool closed during {operation}")),
        other => StoreError::Storage(format!("{operation} failed: {other}")),
    }
}
