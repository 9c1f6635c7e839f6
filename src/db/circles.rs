use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{require, RegistryError, Result, StoreContext};
use crate::models::Circle;

/// Fetch all circles ordered by name.
pub fn fetch_circles(conn: &Connection) -> Result<Vec<Circle>> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM circles ORDER BY name COLLATE NOCASE, id")
        .store_context("failed to prepare circle query")?;

    let circles = stmt
        .query_map([], |row| {
            Ok(Circle {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .store_context("failed to load circles")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .store_context("failed to collect circles")?;

    Ok(circles)
}

/// Fetch a single circle by id.
pub fn fetch_circle(conn: &Connection, id: i64) -> Result<Circle> {
    conn.query_row("SELECT id, name FROM circles WHERE id = ?1", [id], |row| {
        Ok(Circle {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })
    .optional()
    .store_context("failed to load circle")?
    .ok_or_else(|| RegistryError::not_found("circle", id))
}

/// Insert a new circle and return it.
pub fn create_circle(conn: &Connection, name: &str) -> Result<Circle> {
    require("name", name)?;
    let name = name.trim();

    conn.execute("INSERT INTO circles (name) VALUES (?1)", params![name])
        .store_context("failed to insert circle")?;

    Ok(Circle {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

/// Rename an existing circle.
pub fn update_circle(conn: &Connection, id: i64, name: &str) -> Result<()> {
    require("name", name)?;

    let updated = conn
        .execute(
            "UPDATE circles SET name = ?1 WHERE id = ?2",
            params![name.trim(), id],
        )
        .store_context("failed to update circle")?;

    if updated == 0 {
        Err(RegistryError::not_found("circle", id))
    } else {
        Ok(())
    }
}

/// Delete a circle. Its groups survive with `circle_id` cleared.
pub fn delete_circle(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM circles WHERE id = ?1", params![id])
        .store_context("failed to delete circle")?;

    if deleted == 0 {
        Err(RegistryError::not_found("circle", id))
    } else {
        Ok(())
    }
}
