use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{require, RegistryError, Result, StoreContext};
use crate::models::{Student, StudentDraft};

/// Student columns under the `s` alias, in `student_from_row` order.
pub(crate) const STUDENT_COLUMNS: &str = "s.id, s.full_name, s.date_of_birth, s.phone, s.school, \
     s.grade, s.address, s.parent_info, s.created_at";

/// Map a row selected with `STUDENT_COLUMNS` starting at column `offset`.
pub(crate) fn student_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(offset)?,
        full_name: row.get(offset + 1)?,
        date_of_birth: row.get(offset + 2)?,
        phone: row.get(offset + 3)?,
        school: row.get(offset + 4)?,
        grade: row.get(offset + 5)?,
        address: row.get(offset + 6)?,
        parent_info: row.get(offset + 7)?,
        created_at: row.get(offset + 8)?,
    })
}

/// Every student ordered by name, which is also the order of every picker.
pub fn fetch_students(conn: &Connection) -> Result<Vec<Student>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students s ORDER BY s.full_name COLLATE NOCASE, s.id"
        ))
        .store_context("failed to prepare student query")?;

    let students = stmt
        .query_map([], |row| student_from_row(row, 0))
        .store_context("failed to load students")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .store_context("failed to collect students")?;

    Ok(students)
}

/// Fetch a single student by id.
pub fn fetch_student(conn: &Connection, id: i64) -> Result<Student> {
    conn.query_row(
        &format!("SELECT {STUDENT_COLUMNS} FROM students s WHERE s.id = ?1"),
        [id],
        |row| student_from_row(row, 0),
    )
    .optional()
    .store_context("failed to load student")?
    .ok_or_else(|| RegistryError::not_found("student", id))
}

/// Insert a new student and echo the stored row back.
pub fn create_student(conn: &Connection, draft: &StudentDraft) -> Result<Student> {
    require("full_name", &draft.full_name)?;
    let created_at = Utc::now();

    conn.execute(
        "INSERT INTO students
            (full_name, date_of_birth, phone, school, grade, address, parent_info, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            draft.full_name.trim(),
            draft.date_of_birth,
            draft.phone,
            draft.school,
            draft.grade,
            draft.address,
            draft.parent_info,
            created_at,
        ],
    )
    .store_context("failed to insert student")?;

    let id = conn.last_insert_rowid();
    fetch_student(conn, id)
}

/// Overwrite a student's fields and return the stored row.
pub fn update_student(conn: &Connection, id: i64, draft: &StudentDraft) -> Result<Student> {
    require("full_name", &draft.full_name)?;

    let updated = conn
        .execute(
            "UPDATE students
             SET full_name = ?1, date_of_birth = ?2, phone = ?3, school = ?4,
                 grade = ?5, address = ?6, parent_info = ?7
             WHERE id = ?8",
            params![
                draft.full_name.trim(),
                draft.date_of_birth,
                draft.phone,
                draft.school,
                draft.grade,
                draft.address,
                draft.parent_info,
                id,
            ],
        )
        .store_context("failed to update student")?;

    if updated == 0 {
        return Err(RegistryError::not_found("student", id));
    }
    fetch_student(conn, id)
}

/// Remove a student. Foreign keys cascade the delete to every enrollment the
/// student ever had, active or past.
pub fn delete_student(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM students WHERE id = ?1", params![id])
        .store_context("failed to delete student")?;

    if deleted == 0 {
        Err(RegistryError::not_found("student", id))
    } else {
        Ok(())
    }
}
