use super::{open_connection, RecordStore, SqliteStore, COLUMNS};
use crate::domain::labor::Labor;
use crate::domain::quantity::Quantity;
use crate::domain::record::{FieldRecord, RecordDate};
use crate::domain::worker::Worker;
use rusqlite::params;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_db_path() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX_EPOCH")
        .as_nanos();
    std::env::temp_dir()
        .join(format!("chosetas-db-{}", nanos))
        .join("registros.sqlite")
        .display()
        .to_string()
}

fn cleanup_db_files(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::remove_dir_all(parent);
    }
}

fn record(date: &str, notes: &str) -> FieldRecord {
    FieldRecord {
        date: RecordDate::from_str(date).expect("date should parse"),
        worker: Worker::Owner,
        crop: "Naranjos".to_string(),
        labor: Labor::Irrigation,
        pest: "Ninguna".to_string(),
        product: String::new(),
        quantity: Quantity::new(1.0).expect("quantity should be valid"),
        notes: notes.to_string(),
    }
}

#[test]
fn configures_connection_pragmas() {
    let path = unique_db_path();
    let store = SqliteStore::open(&path).expect("store should open and create parent dir");
    drop(store);
    let conn = open_connection(&path).expect("connection should reopen");

    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .expect("journal_mode pragma should be readable");
    assert_eq!(journal_mode.to_uppercase(), "WAL");

    let synchronous: i64 = conn
        .query_row("PRAGMA synchronous;", [], |row| row.get(0))
        .expect("synchronous pragma should be readable");
    assert_eq!(synchronous, 1);

    let busy_timeout: i64 = conn
        .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
        .expect("busy_timeout pragma should be readable");
    assert_eq!(busy_timeout, 5000);

    cleanup_db_files(&path);
}

#[test]
fn creates_single_table_with_fixed_column_order() {
    let path = unique_db_path();
    std::fs::create_dir_all(std::path::Path::new(&path).parent().expect("parent"))
        .expect("dir should be creatable");
    let conn = open_connection(&path).expect("connection should open");

    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info('field_records') ORDER BY cid")
        .expect("table info should be queryable");
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .expect("table info rows should be readable")
        .collect::<Result<Vec<_>, _>>()
        .expect("column names should decode");
    assert_eq!(names, COLUMNS.to_vec());

    drop(stmt);
    drop(conn);
    cleanup_db_files(&path);
}

#[test]
fn reopening_keeps_existing_rows() {
    let path = unique_db_path();
    let first = SqliteStore::open(&path).expect("first open should create schema");
    first
        .append(&record("2024-03-01", "primero"))
        .expect("append should succeed");
    drop(first);

    let second = SqliteStore::open(&path).expect("second open should be idempotent");
    let listed = second.list_all().expect("list should succeed");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].notes, "primero");

    drop(second);
    cleanup_db_files(&path);
}

#[test]
fn appended_record_lists_back_verbatim() {
    let store = SqliteStore::open_in_memory().expect("in-memory store should open");
    let original = FieldRecord {
        date: RecordDate::from_str("2024-03-01").unwrap(),
        worker: Worker::Owner,
        crop: "Naranjos".to_string(),
        labor: Labor::Monitoring,
        pest: "Mosca de la fruta".to_string(),
        product: "Trampa X".to_string(),
        quantity: Quantity::new(2.5).unwrap(),
        notes: "Sector 3".to_string(),
    };
    store.append(&original).expect("append should succeed");

    let listed = store.list_all().expect("list should succeed");
    assert_eq!(listed, vec![original]);
}

#[test]
fn lists_newest_date_first_and_keeps_insertion_order_on_ties() {
    let store = SqliteStore::open_in_memory().expect("in-memory store should open");
    for (date, notes) in [
        ("2024-03-01", "a"),
        ("2024-03-02", "b"),
        ("2024-03-01", "c"),
        ("2024-03-02", "d"),
    ] {
        store
            .append(&record(date, notes))
            .expect("append should succeed");
    }

    let listed = store.list_all().expect("list should succeed");
    let order = listed
        .iter()
        .map(|row| (row.date.to_string(), row.notes.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        order,
        vec![
            ("2024-03-02".to_string(), "b"),
            ("2024-03-02".to_string(), "d"),
            ("2024-03-01".to_string(), "a"),
            ("2024-03-01".to_string(), "c"),
        ]
    );
}

#[test]
fn empty_store_lists_nothing() {
    let store = SqliteStore::open_in_memory().expect("in-memory store should open");
    assert!(store.list_all().expect("list should succeed").is_empty());
}

#[test]
fn store_keeps_duplicate_rows() {
    let store = SqliteStore::open_in_memory().expect("in-memory store should open");
    let row = record("2024-03-01", "igual");
    store.append(&row).expect("first append should succeed");
    store.append(&row).expect("duplicate append should succeed");
    assert_eq!(store.list_all().expect("list should succeed").len(), 2);
}

#[test]
fn unreadable_worker_surfaces_as_database_error() {
    let path = unique_db_path();
    std::fs::create_dir_all(std::path::Path::new(&path).parent().expect("parent"))
        .expect("dir should be creatable");
    let conn = open_connection(&path).expect("connection should open");
    conn.execute(
        "INSERT INTO field_records VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            "2024-03-01",
            "Capataz",
            "Naranjos",
            "Riego",
            "Ninguna",
            "",
            1.0,
            ""
        ],
    )
    .expect("raw insert should succeed");
    drop(conn);

    let store = SqliteStore::open(&path).expect("store should open");
    let err = store
        .list_all()
        .expect_err("unknown worker should not decode");
    assert!(err.to_string().starts_with("database error:"));

    drop(store);
    cleanup_db_files(&path);
}
