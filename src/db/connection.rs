use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

use crate::error::{self, StoreContext};

/// Every table and index the registry needs, paired with the message used when
/// creating it fails. All statements are idempotent so the list doubles as a
/// lazy migration on every start.
const SCHEMA: &[(&str, &str)] = &[
    (
        "CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            date_of_birth TEXT,
            phone TEXT NOT NULL DEFAULT '',
            school TEXT NOT NULL DEFAULT '',
            grade TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            parent_info TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )",
        "failed to create students table",
    ),
    (
        "CREATE TABLE IF NOT EXISTS teachers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            date_of_birth TEXT,
            phone TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            education TEXT NOT NULL DEFAULT ''
        )",
        "failed to create teachers table",
    ),
    (
        "CREATE TABLE IF NOT EXISTS circles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )",
        "failed to create circles table",
    ),
    (
        "CREATE TABLE IF NOT EXISTS specializations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
        "failed to create specializations table",
    ),
    (
        "CREATE TABLE IF NOT EXISTS study_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            circle_id INTEGER,
            teacher_id INTEGER,
            created_at TEXT NOT NULL,
            FOREIGN KEY(circle_id) REFERENCES circles(id) ON DELETE SET NULL,
            FOREIGN KEY(teacher_id) REFERENCES teachers(id) ON DELETE SET NULL
        )",
        "failed to create study_groups table",
    ),
    (
        "CREATE TABLE IF NOT EXISTS teacher_specializations (
            teacher_id INTEGER NOT NULL,
            specialization_id INTEGER NOT NULL,
            PRIMARY KEY (teacher_id, specialization_id),
            FOREIGN KEY(teacher_id) REFERENCES teachers(id) ON DELETE CASCADE,
            FOREIGN KEY(specialization_id) REFERENCES specializations(id) ON DELETE CASCADE
        )",
        "failed to create teacher_specializations table",
    ),
    (
        "CREATE TABLE IF NOT EXISTS enrollments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            group_id INTEGER NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT,
            FOREIGN KEY(student_id) REFERENCES students(id) ON DELETE CASCADE,
            FOREIGN KEY(group_id) REFERENCES study_groups(id) ON DELETE CASCADE
        )",
        "failed to create enrollments table",
    ),
    (
        "CREATE UNIQUE INDEX IF NOT EXISTS enrollments_one_active
            ON enrollments (student_id, group_id)
            WHERE end_date IS NULL",
        "failed to create active enrollment index",
    ),
    (
        "CREATE INDEX IF NOT EXISTS enrollments_by_group ON enrollments (group_id)",
        "failed to create enrollment group index",
    ),
];

/// Open (or create) the database at `path`, make sure its parent directory
/// exists, and bring the schema up to date.
pub fn ensure_schema(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    debug!(path = %path.display(), "opening registry database");
    let conn = Connection::open(path).context("failed to open SQLite database")?;
    apply_schema(&conn)?;

    Ok(conn)
}

/// Fresh in-memory database with the full schema. Used by tests and dry runs.
pub fn open_in_memory() -> error::Result<Connection> {
    let conn = Connection::open_in_memory().store_context("failed to open in-memory database")?;
    apply_schema(&conn)?;
    Ok(conn)
}

/// Turn on `PRAGMA foreign_keys` so cascades behave, then run every schema
/// statement.
pub fn apply_schema(conn: &Connection) -> error::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .store_context("failed to enable foreign keys")?;

    for &(statement, context) in SCHEMA {
        conn.execute(statement, []).store_context(context)?;
    }

    Ok(())
}
