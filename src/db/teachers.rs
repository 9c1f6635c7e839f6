use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{require, RegistryError, Result, StoreContext};
use crate::models::{
    LedGroup, Specialization, Teacher, TeacherDetails, TeacherDraft, TeacherProfile,
};

const TEACHER_COLUMNS: &str = "t.id, t.full_name, t.date_of_birth, t.phone, t.address, t.education";

fn teacher_from_row(row: &Row<'_>) -> rusqlite::Result<Teacher> {
    Ok(Teacher {
        id: row.get(0)?,
        full_name: row.get(1)?,
        date_of_birth: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
        education: row.get(5)?,
    })
}

/// Fetch all teachers ordered by name.
pub fn fetch_teachers(conn: &Connection) -> Result<Vec<Teacher>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TEACHER_COLUMNS} FROM teachers t ORDER BY t.full_name COLLATE NOCASE, t.id"
        ))
        .store_context("failed to prepare teacher query")?;

    let teachers = stmt
        .query_map([], teacher_from_row)
        .store_context("failed to load teachers")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .store_context("failed to collect teachers")?;

    Ok(teachers)
}

/// Fetch a single teacher by id.
pub fn fetch_teacher(conn: &Connection, id: i64) -> Result<Teacher> {
    conn.query_row(
        &format!("SELECT {TEACHER_COLUMNS} FROM teachers t WHERE t.id = ?1"),
        [id],
        teacher_from_row,
    )
    .optional()
    .store_context("failed to load teacher")?
    .ok_or_else(|| RegistryError::not_found("teacher", id))
}

/// Every teacher with the list of linked specialization names, the listing
/// shown on the teachers page. Links are read with a single join and grouped
/// in memory.
pub fn fetch_teacher_details(conn: &Connection) -> Result<Vec<TeacherDetails>> {
    let teachers = fetch_teachers(conn)?;

    let mut stmt = conn
        .prepare(
            "SELECT ts.teacher_id, sp.id, sp.name
             FROM teacher_specializations ts
             INNER JOIN specializations sp ON sp.id = ts.specialization_id
             ORDER BY sp.name COLLATE NOCASE, sp.id",
        )
        .store_context("failed to prepare teacher specialization query")?;

    let mut links: BTreeMap<i64, Vec<Specialization>> = BTreeMap::new();
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Specialization {
                    id: row.get(1)?,
                    name: row.get(2)?,
                },
            ))
        })
        .store_context("failed to load teacher specializations")?;
    for row in rows {
        let (teacher_id, spec) = row.store_context("failed to read teacher specialization")?;
        links.entry(teacher_id).or_default().push(spec);
    }

    Ok(teachers
        .into_iter()
        .map(|teacher| {
            let specializations = links.remove(&teacher.id).unwrap_or_default();
            TeacherDetails {
                teacher,
                specializations,
            }
        })
        .collect())
}

/// Teacher page data: the teacher, their specializations, and the groups they
/// lead with each group's circle.
pub fn fetch_teacher_profile(conn: &Connection, id: i64) -> Result<TeacherProfile> {
    let teacher = fetch_teacher(conn, id)?;
    let specializations = fetch_linked_specializations(conn, id)?;

    let mut stmt = conn
        .prepare(
            "SELECT g.id, g.name, c.name
             FROM study_groups g
             LEFT JOIN circles c ON c.id = g.circle_id
             WHERE g.teacher_id = ?1
             ORDER BY g.name COLLATE NOCASE, g.id",
        )
        .store_context("failed to prepare led groups query")?;

    let groups = stmt
        .query_map([id], |row| {
            Ok(LedGroup {
                id: row.get(0)?,
                name: row.get(1)?,
                circle_name: row.get(2)?,
            })
        })
        .store_context("failed to load led groups")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .store_context("failed to collect led groups")?;

    Ok(TeacherProfile {
        teacher,
        specializations,
        groups,
    })
}

/// Specializations currently linked to a teacher, ordered by name.
pub fn fetch_linked_specializations(
    conn: &Connection,
    teacher_id: i64,
) -> Result<Vec<Specialization>> {
    let mut stmt = conn
        .prepare(
            "SELECT sp.id, sp.name
             FROM specializations sp
             INNER JOIN teacher_specializations ts ON ts.specialization_id = sp.id
             WHERE ts.teacher_id = ?1
             ORDER BY sp.name COLLATE NOCASE, sp.id",
        )
        .store_context("failed to prepare linked specializations query")?;

    let specs = stmt
        .query_map([teacher_id], |row| {
            Ok(Specialization {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .store_context("failed to load linked specializations")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .store_context("failed to collect linked specializations")?;

    Ok(specs)
}

/// Insert the teacher's scalar fields only. Links are handled by
/// `links::save_teacher`.
pub fn create_teacher(conn: &Connection, draft: &TeacherDraft) -> Result<Teacher> {
    require("full_name", &draft.full_name)?;

    conn.execute(
        "INSERT INTO teachers (full_name, date_of_birth, phone, address, education)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            draft.full_name.trim(),
            draft.date_of_birth,
            draft.phone,
            draft.address,
            draft.education,
        ],
    )
    .store_context("failed to insert teacher")?;

    let id = conn.last_insert_rowid();
    fetch_teacher(conn, id)
}

/// Overwrite a teacher's fields. Specialization links are left alone.
pub fn update_teacher(conn: &Connection, id: i64, draft: &TeacherDraft) -> Result<Teacher> {
    require("full_name", &draft.full_name)?;

    let updated = conn
        .execute(
            "UPDATE teachers
             SET full_name = ?1, date_of_birth = ?2, phone = ?3, address = ?4, education = ?5
             WHERE id = ?6",
            params![
                draft.full_name.trim(),
                draft.date_of_birth,
                draft.phone,
                draft.address,
                draft.education,
                id,
            ],
        )
        .store_context("failed to update teacher")?;

    if updated == 0 {
        return Err(RegistryError::not_found("teacher", id));
    }
    fetch_teacher(conn, id)
}

/// Remove a teacher. Their specialization links cascade away and the groups
/// they led stay behind without a lead teacher.
pub fn delete_teacher(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM teachers WHERE id = ?1", params![id])
        .store_context("failed to delete teacher")?;

    if deleted == 0 {
        Err(RegistryError::not_found("teacher", id))
    } else {
        Ok(())
    }
}
