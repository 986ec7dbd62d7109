//! SQLite-backed order store implementation.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    Order, OrderError, OrderId, OrderMeta, OrderNote, OrderStatus, OrderStore, UpsertOrderRequest,
};

/// SQLite-backed order store.
pub struct SqliteOrderStore {
    conn: Mutex<Connection>,
}

impl SqliteOrderStore {
    /// Create a new SQLite order store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, OrderError> {
        let conn = Connection::open(path).map_err(|e| OrderError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite order store (useful for testing).
    pub fn in_memory() -> Result<Self, OrderError> {
        let conn = Connection::open_in_memory().map_err(|e| OrderError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), OrderError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY,
                number TEXT NOT NULL,
                status TEXT NOT NULL,
                fields TEXT NOT NULL DEFAULT '{}',
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS order_meta (
                order_id INTEGER NOT NULL,
                meta_key TEXT NOT NULL,
                meta_value INTEGER NOT NULL,
                PRIMARY KEY (order_id, meta_key)
            );

            CREATE TABLE IF NOT EXISTS order_notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id INTEGER NOT NULL,
                content TEXT NOT NULL,
                customer_note INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_order_notes_order_id ON order_notes(order_id);
            "#,
        )
        .map_err(|e| OrderError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, OrderError> {
        self.conn
            .lock()
            .map_err(|_| OrderError::Database("order store lock poisoned".to_string()))
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn exists(conn: &Connection, id: OrderId) -> Result<bool, OrderError> {
        conn.query_row(
            "SELECT 1 FROM orders WHERE id = ?",
            params![id.0 as i64],
            |_| Ok(()),
        )
        .optional()
        .map(|row| row.is_some())
        .map_err(|e| OrderError::Database(e.to_string()))
    }

    fn load(conn: &Connection, id: OrderId) -> Result<Option<Order>, OrderError> {
        let row = conn
            .query_row(
                "SELECT number, status, fields, updated_at FROM orders WHERE id = ?",
                params![id.0 as i64],
                |row| {
                    let number: String = row.get(0)?;
                    let status: String = row.get(1)?;
                    let fields_json: String = row.get(2)?;
                    let updated_at: String = row.get(3)?;
                    Ok((number, status, fields_json, updated_at))
                },
            )
            .optional()
            .map_err(|e| OrderError::Database(e.to_string()))?;

        let Some((number, status, fields_json, updated_at)) = row else {
            return Ok(None);
        };

        let fields: BTreeMap<String, String> =
            serde_json::from_str(&fields_json).unwrap_or_default();

        let mut meta = OrderMeta::new();
        let mut stmt = conn
            .prepare("SELECT meta_key, meta_value FROM order_meta WHERE order_id = ?")
            .map_err(|e| OrderError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![id.0 as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
            })
            .map_err(|e| OrderError::Database(e.to_string()))?;
        for row in rows {
            let (key, value) = row.map_err(|e| OrderError::Database(e.to_string()))?;
            meta.set_flag(key, value);
        }

        let mut stmt = conn
            .prepare(
                "SELECT content, customer_note, created_at FROM order_notes WHERE order_id = ? ORDER BY id ASC",
            )
            .map_err(|e| OrderError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![id.0 as i64], |row| {
                let content: String = row.get(0)?;
                let customer_note: bool = row.get(1)?;
                let created_at: String = row.get(2)?;
                Ok((content, customer_note, created_at))
            })
            .map_err(|e| OrderError::Database(e.to_string()))?;

        let mut notes = Vec::new();
        for row in rows {
            let (content, customer_note, created_at) =
                row.map_err(|e| OrderError::Database(e.to_string()))?;
            notes.push(OrderNote {
                content,
                customer_note,
                created_at: Self::parse_timestamp(&created_at),
            });
        }

        Ok(Some(Order {
            id,
            number,
            status: OrderStatus::new(status),
            meta,
            fields,
            notes,
            updated_at: Self::parse_timestamp(&updated_at),
        }))
    }
}

impl OrderStore for SqliteOrderStore {
    fn get(&self, id: OrderId) -> Result<Option<Order>, OrderError> {
        let conn = self.lock()?;
        Self::load(&conn, id)
    }

    fn upsert(&self, request: UpsertOrderRequest) -> Result<Order, OrderError> {
        let conn = self.lock()?;

        let fields_json = serde_json::to_string(&request.fields)
            .map_err(|e| OrderError::Database(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO orders (id, number, status, fields, updated_at) VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                number = excluded.number,
                status = excluded.status,
                fields = excluded.fields,
                updated_at = excluded.updated_at
            "#,
            params![
                request.id.0 as i64,
                request.number,
                request.status.as_str(),
                fields_json,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| OrderError::Database(e.to_string()))?;

        Self::load(&conn, request.id)?.ok_or(OrderError::NotFound(request.id))
    }

    fn set_status(&self, id: OrderId, status: &OrderStatus) -> Result<Order, OrderError> {
        let conn = self.lock()?;

        let updated = conn
            .execute(
                "UPDATE orders SET status = ?, updated_at = ? WHERE id = ?",
                params![status.as_str(), Utc::now().to_rfc3339(), id.0 as i64],
            )
            .map_err(|e| OrderError::Database(e.to_string()))?;

        if updated == 0 {
            return Err(OrderError::NotFound(id));
        }

        Self::load(&conn, id)?.ok_or(OrderError::NotFound(id))
    }

    fn set_meta_flag(&self, id: OrderId, key: &str, value: bool) -> Result<(), OrderError> {
        let conn = self.lock()?;

        if !Self::exists(&conn, id)? {
            return Err(OrderError::NotFound(id));
        }

        conn.execute(
            "INSERT OR REPLACE INTO order_meta (order_id, meta_key, meta_value) VALUES (?, ?, ?)",
            params![id.0 as i64, key, value],
        )
        .map_err(|e| OrderError::Database(e.to_string()))?;

        Ok(())
    }

    fn add_note(
        &self,
        id: OrderId,
        content: &str,
        customer_note: bool,
    ) -> Result<OrderNote, OrderError> {
        let conn = self.lock()?;

        if !Self::exists(&conn, id)? {
            return Err(OrderError::NotFound(id));
        }

        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO order_notes (order_id, content, customer_note, created_at) VALUES (?, ?, ?, ?)",
            params![id.0 as i64, content, customer_note, created_at.to_rfc3339()],
        )
        .map_err(|e| OrderError::Database(e.to_string()))?;

        Ok(OrderNote {
            content: content.to_string(),
            customer_note,
            created_at,
        })
    }
}
