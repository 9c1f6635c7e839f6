use rusqlite::{params, Connection, Error as SqlError, ErrorCode};

use crate::error::{require, RegistryError, Result, StoreContext};
use crate::models::Specialization;

/// Fetch all specializations ordered by name.
pub fn fetch_specializations(conn: &Connection) -> Result<Vec<Specialization>> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM specializations ORDER BY name COLLATE NOCASE, id")
        .store_context("failed to prepare specialization query")?;

    let specs = stmt
        .query_map([], |row| {
            Ok(Specialization {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .store_context("failed to load specializations")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .store_context("failed to collect specializations")?;

    Ok(specs)
}

/// Insert a new specialization. Names are unique; a clash surfaces as a store
/// error carrying SQLite's constraint message.
pub fn create_specialization(conn: &Connection, name: &str) -> Result<Specialization> {
    require("name", name)?;
    let name = name.trim();

    conn.execute(
        "INSERT INTO specializations (name) VALUES (?1)",
        params![name],
    )
    .map_err(map_unique_name)?;

    Ok(Specialization {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

/// Rename a specialization. Names stay unique.
pub fn update_specialization(conn: &Connection, id: i64, name: &str) -> Result<()> {
    require("name", name)?;

    let updated = conn
        .execute(
            "UPDATE specializations SET name = ?1 WHERE id = ?2",
            params![name.trim(), id],
        )
        .map_err(map_unique_name)?;

    if updated == 0 {
        Err(RegistryError::not_found("specialization", id))
    } else {
        Ok(())
    }
}

/// Delete a specialization. The join table cascades, so every teacher simply
/// loses that one link.
pub fn delete_specialization(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM specializations WHERE id = ?1", params![id])
        .store_context("failed to delete specialization")?;

    if deleted == 0 {
        Err(RegistryError::not_found("specialization", id))
    } else {
        Ok(())
    }
}

fn map_unique_name(err: SqlError) -> RegistryError {
    let context = if matches!(err.sqlite_error_code(), Some(ErrorCode::ConstraintViolation)) {
        "specialization name already exists"
    } else {
        "failed to save specialization"
    };
    RegistryError::Store {
        context,
        source: err,
    }
}
