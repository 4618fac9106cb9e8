use eventreg_core::data_store::{
    DataStore, Filter, Increment, Item, PutCondition, StoreError, StoreFuture, Table, TableNames,
};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

const UNIQUE_VIOLATION: &str = "23505";
const INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// `PostgreSQL`-backed [`DataStore`].
///
/// Items are stored as JSONB documents keyed by `(table_name, item_key)`,
/// where `table_name` is the physical name from [`TableNames`]. Unique
/// attribute tuples are claimed in `store_unique_keys` inside the same
/// transaction as the item insert.
///
/// # Example
///
/// ```no_run
/// use eventreg_core::TableNames;
/// use eventreg_postgres::PostgresDataStore;
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgresDataStore::from_pool(pool, TableNames::default());
/// store.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PostgresDataStore {
    pool: PgPool,
    tables: TableNames,
}

impl PostgresDataStore {
    /// Connect to `database_url` with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the connection fails.
    pub async fn new(database_url: &str, tables: TableNames) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await.map_err(map_sqlx_error)?;
        Ok(Self::from_pool(pool, tables))
    }

    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool, tables: TableNames) -> Self {
        Self { pool, tables }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        tracing::info!("Data store migrations applied");
        Ok(())
    }

    async fn put_item(&self, table: Table, item: Item, condition: PutCondition) -> Result<(), StoreError> {
        let key = table.key_of(&item)?;
        let name = self.tables.name(table);

        match condition {
            PutCondition::Always => {
                sqlx::query(
                    r"
                    INSERT INTO store_items (table_name, item_key, data)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (table_name, item_key) DO UPDATE SET data = EXCLUDED.data
                    ",
                )
                .bind(name)
                .bind(&key)
                .bind(Json(Value::Object(item)))
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
            }
            PutCondition::KeyNotExists => {
                let inserted = sqlx::query(
                    r"
                    INSERT INTO store_items (table_name, item_key, data)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (table_name, item_key) DO NOTHING
                    ",
                )
                .bind(name)
                .bind(&key)
                .bind(Json(Value::Object(item)))
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?
                .rows_affected();

                if inserted == 0 {
                    return Err(condition_failed(table, format!("{table} key {key} exists")));
                }
            }
            PutCondition::UniqueAttributes(attributes) => {
                let unique_key = unique_key(&item, &attributes);
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                let inserted = sqlx::query(
                    r"
                    INSERT INTO store_items (table_name, item_key, data)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (table_name, item_key) DO NOTHING
                    ",
                )
                .bind(name)
                .bind(&key)
                .bind(Json(Value::Object(item)))
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?
                .rows_affected();

                if inserted == 0 {
                    return Err(condition_failed(table, format!("{table} key {key} exists")));
                }

                sqlx::query(
                    r"
                    INSERT INTO store_unique_keys (table_name, unique_key, item_key)
                    VALUES ($1, $2, $3)
                    ",
                )
                .bind(name)
                .bind(&unique_key)
                .bind(&key)
                .execute(&mut *tx)
                .await
                .map_err(|e| match map_sqlx_error(e) {
                    StoreError::ConditionFailed(_) => condition_failed(
                        table,
                        format!("{table} already holds an item with the same {}", attributes.join(", ")),
                    ),
                    other => other,
                })?;

                tx.commit().await.map_err(map_sqlx_error)?;
            }
        }

        tracing::debug!(%table, key = %key, "Item written");
        Ok(())
    }

    async fn get_item(&self, table: Table, key: &str) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query("SELECT data FROM store_items WHERE table_name = $1 AND item_key = $2")
            .bind(self.tables.name(table))
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(|row| decode_item(&row)).transpose()
    }

    async fn update_item(&self, table: Table, key: &str, increment: Increment) -> Result<i64, StoreError> {
        let name = self.tables.name(table);

        // The row lock taken by UPDATE makes the add and the ceiling check atomic.
        let updated: Option<i64> = sqlx::query_scalar(
            r"
            UPDATE store_items
            SET data = jsonb_set(
                data,
                ARRAY[$3::text],
                to_jsonb(COALESCE((data->>$3)::bigint, 0) + $4)
            )
            WHERE table_name = $1
              AND item_key = $2
              AND (
                $5::text IS NULL
                OR COALESCE((data->>$3)::bigint, 0) + $4 <= (data->>$5)::bigint
              )
            RETURNING (data->>$3)::bigint
            ",
        )
        .bind(name)
        .bind(key)
        .bind(&increment.attribute)
        .bind(increment.delta)
        .bind(increment.ceiling_attribute.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if let Some(value) = updated {
            return Ok(value);
        }

        let exists: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM store_items WHERE table_name = $1 AND item_key = $2")
                .bind(name)
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        if exists.is_some() {
            Err(condition_failed(
                table,
                format!(
                    "{} would exceed {}",
                    increment.attribute,
                    increment.ceiling_attribute.as_deref().unwrap_or("its ceiling")
                ),
            ))
        } else {
            Err(StoreError::ItemNotFound {
                table,
                key: key.to_string(),
            })
        }
    }

    async fn scan_items(&self, table: Table, filter: Filter) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query("SELECT data FROM store_items WHERE table_name = $1 AND data @> $2")
            .bind(self.tables.name(table))
            .bind(Json(Value::Object(filter.to_object())))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(decode_item).collect()
    }

    async fn delete_item(&self, table: Table, key: &str) -> Result<bool, StoreError> {
        let deleted = sqlx::query("DELETE FROM store_items WHERE table_name = $1 AND item_key = $2")
            .bind(self.tables.name(table))
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        Ok(deleted > 0)
    }
}

impl DataStore for PostgresDataStore {
    fn put(&self, table: Table, item: Item, condition: PutCondition) -> StoreFuture<'_, ()> {
        Box::pin(self.put_item(table, item, condition))
    }

    fn get<'a>(&'a self, table: Table, key: &'a str) -> StoreFuture<'a, Option<Item>> {
        Box::pin(self.get_item(table, key))
    }

    fn update<'a>(&'a self, table: Table, key: &'a str, increment: Increment) -> StoreFuture<'a, i64> {
        Box::pin(self.update_item(table, key, increment))
    }

    fn scan(&self, table: Table, filter: Filter) -> StoreFuture<'_, Vec<Item>> {
        Box::pin(self.scan_items(table, filter))
    }

    fn delete<'a>(&'a self, table: Table, key: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(self.delete_item(table, key))
    }
}

/// Canonical text for an attribute tuple, e.g. `EventID,AttendeeID=["e1","u1"]`.
fn unique_key(item: &Item, attributes: &[String]) -> String {
    let values: Vec<&Value> = attributes
        .iter()
        .map(|attribute| item.get(attribute).unwrap_or(&Value::Null))
        .collect();
    format!(
        "{}={}",
        attributes.join(","),
        Value::Array(values.into_iter().cloned().collect())
    )
}

fn decode_item(row: &sqlx::postgres::PgRow) -> Result<Item, StoreError> {
    let Json(value): Json<Value> = row
        .try_get("data")
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    match value {
        Value::Object(item) => Ok(item),
        other => Err(StoreError::Serialization(format!("stored item is not an object: {other}"))),
    }
}

fn condition_failed(table: Table, reason: String) -> StoreError {
    metrics::counter!("eventreg_store_condition_failures_total", "table" => table.to_string()).increment(1);
    StoreError::ConditionFailed(reason)
}

fn map_sqlx_error(error: sqlx::Error) -> StoreError {
    match &error {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::ConditionFailed(db.message().to_string())
        }
        // A counter attribute that does not cast to bigint
        sqlx::Error::Database(db) if db.code().as_deref() == Some(INVALID_TEXT_REPRESENTATION) => {
            StoreError::Serialization(db.message().to_string())
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(error.to_string()),
        _ => StoreError::Backend(error.to_string()),
    }
}
