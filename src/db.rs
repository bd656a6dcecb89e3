use std::error::Error;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName};
use tracing::debug;

use crate::domain::record::FieldRecord;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS field_records (
    date TEXT NOT NULL,
    worker TEXT NOT NULL,
    crop TEXT NOT NULL,
    labor TEXT NOT NULL,
    pest TEXT NOT NULL,
    product TEXT NOT NULL,
    quantity REAL NOT NULL,
    notes TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_field_records_date ON field_records(date);
"#;

/// Column names in persisted order. Also the export header.
pub const COLUMNS: [&str; 8] = [
    "date", "worker", "crop", "labor", "pest", "product", "quantity", "notes",
];

/// Append-only storage for field records.
pub trait RecordStore {
    fn append(&self, record: &FieldRecord) -> Result<(), StoreError>;

    /// All records, newest date first. Records sharing a date keep the order
    /// in which they were appended.
    fn list_all(&self) -> Result<Vec<FieldRecord>, StoreError>;
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Db(rusqlite::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "I/O error: {}", err),
            StoreError::Db(err) => write!(f, "database error: {}", err),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Db(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        StoreError::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        StoreError::Db(value)
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        ensure_parent_dir(path)?;
        let conn = open_connection(path)?;
        debug!(db_path = %path, "opened record store");
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }
}

impl RecordStore for SqliteStore {
    fn append(&self, record: &FieldRecord) -> Result<(), StoreError> {
        insert_record(&self.conn, record)?;
        debug!(
            date = %record.date,
            crop = %record.crop,
            labor = %record.labor,
            "appended record"
        );
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<FieldRecord>, StoreError> {
        let records = list_records(&self.conn)?;
        debug!(count = records.len(), "listed records");
        Ok(records)
    }
}

pub fn open_connection(path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn ensure_parent_dir(path: &str) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn insert_record(conn: &Connection, record: &FieldRecord) -> rusqlite::Result<()> {
    conn.execute(
        r#"
INSERT INTO field_records (date, worker, crop, labor, pest, product, quantity, notes)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#,
        params![
            record.date,
            record.worker,
            record.crop,
            record.labor,
            record.pest,
            record.product,
            record.quantity,
            record.notes
        ],
    )?;
    Ok(())
}

pub fn list_records(conn: &Connection) -> rusqlite::Result<Vec<FieldRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT date, worker, crop, labor, pest, product, quantity, notes
FROM field_records
ORDER BY date DESC, rowid ASC
"#,
    )?;

    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(FieldRecord {
            date: row.get(0)?,
            worker: row.get(1)?,
            crop: row.get(2)?,
            labor: row.get(3)?,
            pest: row.get(4)?,
            product: row.get(5)?,
            quantity: row.get(6)?,
            notes: row.get(7)?,
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests;
