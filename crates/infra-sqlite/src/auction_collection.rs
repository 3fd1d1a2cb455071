// SQLite AuctionCollection Implementation

use async_trait::async_trait;
use gavel_core::domain::AuctionId;
use gavel_core::error::{AppError, Result};
use gavel_core::port::{
    AuctionCollection, AuctionDocument, AuctionFilter, AuctionUpdate, IdProvider,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;

// Helper to convert sqlx::Error to AppError with structured information
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => AppError::Database(format!(
                        "Unique constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "275" => AppError::Database(format!(
                        "Check constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "5" => AppError::Database(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => AppError::Database(format!("Database full: {}", db_err.message())),
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {}", col))
        }
        _ => AppError::Database(err.to_string()),
    }
}

/// SQLite-backed auction collection
///
/// Identifiers come from the injected `IdProvider`. Concurrent writers are
/// serialized by SQLite itself (WAL + busy timeout).
pub struct SqliteAuctionCollection {
    pool: SqlitePool,
    id_provider: Arc<dyn IdProvider>,
}

impl SqliteAuctionCollection {
    pub fn new(pool: SqlitePool, id_provider: Arc<dyn IdProvider>) -> Self {
        Self { pool, id_provider }
    }
}

/// Append `WHERE ...` clauses for every set filter field
fn push_filter<'a>(builder: &mut QueryBuilder<'a, Sqlite>, filter: &'a AuctionFilter) {
    builder.push(" WHERE 1 = 1");

    if let Some(id) = &filter.id {
        builder.push(" AND id = ").push_bind(id.as_str());
    }
    if let Some(status) = &filter.status {
        builder.push(" AND status = ").push_bind(status.to_string());
    }
    if let Some(category) = &filter.category {
        builder.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(name) = &filter.product_name {
        builder
            .push(" AND instr(product_name, ")
            .push_bind(name.as_str())
            .push(") > 0");
    }
}

#[async_trait]
impl AuctionCollection for SqliteAuctionCollection {
    async fn insert_one(&self, doc: &AuctionDocument) -> Result<AuctionId> {
        let id = self.id_provider.generate_id();

        sqlx::query(
            r#"
            INSERT INTO auctions (
                id, product_name, category, description, condition, status, timestamp
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&doc.product_name)
        .bind(&doc.category)
        .bind(&doc.description)
        .bind(&doc.condition)
        .bind(&doc.status)
        .bind(doc.timestamp)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(id)
    }

    async fn update_one(&self, id: &AuctionId, update: &AuctionUpdate) -> Result<u64> {
        // Partial update: unset fields keep their stored value
        let result = sqlx::query(
            r#"
            UPDATE auctions
            SET status = COALESCE(?, status),
                timestamp = COALESCE(?, timestamp)
            WHERE id = ?
            "#,
        )
        .bind(update.status.map(|s| s.to_string()))
        .bind(update.timestamp)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn find_one(&self, filter: &AuctionFilter) -> Result<Option<AuctionDocument>> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM auctions");
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY rowid ASC LIMIT 1");

        let row = builder
            .build_query_as::<AuctionRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(|r| r.into_document()))
    }

    async fn find(&self, filter: &AuctionFilter) -> Result<Vec<AuctionDocument>> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM auctions");
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY rowid ASC");

        let rows = builder
            .build_query_as::<AuctionRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|row| row.into_document()).collect())
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct AuctionRow {
    id: String,
    product_name: String,
    category: String,
    description: String,
    condition: String,
    status: String,
    timestamp: i64,
}

impl AuctionRow {
    fn into_document(self) -> AuctionDocument {
        AuctionDocument {
            id: self.id,
            product_name: self.product_name,
            category: self.category,
            description: self.description,
            condition: self.condition,
            status: self.status,
            timestamp: self.timestamp,
        }
    }
}
