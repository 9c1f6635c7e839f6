use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{require, RegistryError, Result, StoreContext};
use crate::models::{Group, GroupDetails, GroupDraft};

const GROUP_COLUMNS: &str = "g.id, g.name, g.circle_id, g.teacher_id, g.created_at";

/// Group columns joined with circle and teacher names and the live roster
/// size, which is counted from active enrollments instead of being stored.
const DETAILS_QUERY: &str = "SELECT g.id, g.name, g.circle_id, g.teacher_id, g.created_at,
            c.name, t.full_name,
            (SELECT COUNT(*) FROM enrollments e WHERE e.group_id = g.id AND e.end_date IS NULL)
     FROM study_groups g
     LEFT JOIN circles c ON c.id = g.circle_id
     LEFT JOIN teachers t ON t.id = g.teacher_id";

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        name: row.get(1)?,
        circle_id: row.get(2)?,
        teacher_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Map a row selected with `DETAILS_QUERY`.
pub(crate) fn details_from_row(row: &Row<'_>) -> rusqlite::Result<GroupDetails> {
    Ok(GroupDetails {
        group: group_from_row(row)?,
        circle_name: row.get(5)?,
        teacher_name: row.get(6)?,
        student_count: row.get(7)?,
    })
}

/// Fetch all groups ordered by name.
pub fn fetch_groups(conn: &Connection) -> Result<Vec<Group>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {GROUP_COLUMNS} FROM study_groups g ORDER BY g.name COLLATE NOCASE, g.id"
        ))
        .store_context("failed to prepare group query")?;

    let groups = stmt
        .query_map([], group_from_row)
        .store_context("failed to load groups")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .store_context("failed to collect groups")?;

    Ok(groups)
}

/// Fetch a single group by id.
pub fn fetch_group(conn: &Connection, id: i64) -> Result<Group> {
    conn.query_row(
        &format!("SELECT {GROUP_COLUMNS} FROM study_groups g WHERE g.id = ?1"),
        [id],
        group_from_row,
    )
    .optional()
    .store_context("failed to load group")?
    .ok_or_else(|| RegistryError::not_found("group", id))
}

/// Every group with circle, teacher and current roster size, ordered by name.
pub fn fetch_group_details(conn: &Connection) -> Result<Vec<GroupDetails>> {
    let mut stmt = conn
        .prepare(&format!("{DETAILS_QUERY} ORDER BY g.name COLLATE NOCASE, g.id"))
        .store_context("failed to prepare group details query")?;

    let groups = stmt
        .query_map([], details_from_row)
        .store_context("failed to load group details")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .store_context("failed to collect group details")?;

    Ok(groups)
}

/// Details of one group, with its live roster size.
pub fn fetch_group_detail(conn: &Connection, id: i64) -> Result<GroupDetails> {
    conn.query_row(
        &format!("{DETAILS_QUERY} WHERE g.id = ?1"),
        [id],
        details_from_row,
    )
    .optional()
    .store_context("failed to load group details")?
    .ok_or_else(|| RegistryError::not_found("group", id))
}

/// Insert a new group. Circle and teacher are optional.
pub fn create_group(conn: &Connection, draft: &GroupDraft) -> Result<Group> {
    require("name", &draft.name)?;

    conn.execute(
        "INSERT INTO study_groups (name, circle_id, teacher_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![draft.name.trim(), draft.circle_id, draft.teacher_id, Utc::now()],
    )
    .store_context("failed to insert group")?;

    let id = conn.last_insert_rowid();
    fetch_group(conn, id)
}

/// Overwrite a group's name, circle and lead teacher.
pub fn update_group(conn: &Connection, id: i64, draft: &GroupDraft) -> Result<Group> {
    require("name", &draft.name)?;

    let updated = conn
        .execute(
            "UPDATE study_groups SET name = ?1, circle_id = ?2, teacher_id = ?3 WHERE id = ?4",
            params![draft.name.trim(), draft.circle_id, draft.teacher_id, id],
        )
        .store_context("failed to update group")?;

    if updated == 0 {
        return Err(RegistryError::not_found("group", id));
    }
    fetch_group(conn, id)
}

/// Delete a group together with its whole enrollment history. This cannot be
/// undone; callers confirm with the operator first.
pub fn delete_group(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM study_groups WHERE id = ?1", params![id])
        .store_context("failed to delete group")?;

    if deleted == 0 {
        Err(RegistryError::not_found("group", id))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_circle, create_student, create_teacher, open_in_memory};
    use crate::models::{StudentDraft, TeacherDraft};

    #[test]
    fn details_join_parent_names_and_count_active_seats() {
        let conn = open_in_memory().unwrap();
        let circle = create_circle(&conn, "Music").unwrap();
        let teacher = create_teacher(
            &conn,
            &TeacherDraft {
                full_name: "Mykola".into(),
                ..TeacherDraft::default()
            },
        )
        .unwrap();
        let group = create_group(
            &conn,
            &GroupDraft {
                name: "Choir".into(),
                circle_id: Some(circle.id),
                teacher_id: Some(teacher.id),
            },
        )
        .unwrap();
        let student = create_student(
            &conn,
            &StudentDraft {
                full_name: "Oksana".into(),
                ..StudentDraft::default()
            },
        )
        .unwrap();
        conn.execute(
            "INSERT INTO enrollments (student_id, group_id, start_date, end_date)
             VALUES (?1, ?2, ?3, ?3)",
            params![student.id, group.id, Utc::now()],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO enrollments (student_id, group_id, start_date) VALUES (?1, ?2, ?3)",
            params![student.id, group.id, Utc::now()],
        )
        .unwrap();

        let details = fetch_group_detail(&conn, group.id).unwrap();
        assert_eq!(details.circle_name.as_deref(), Some("Music"));
        assert_eq!(details.teacher_name.as_deref(), Some("Mykola"));
        assert_eq!(details.student_count, 1);
    }

    #[test]
    fn unknown_circle_is_a_store_failure() {
        let conn = open_in_memory().unwrap();
        let err = create_group(
            &conn,
            &GroupDraft {
                name: "Orphans".into(),
                circle_id: Some(404),
                teacher_id: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::Store { .. }));
        assert!(fetch_groups(&conn).unwrap().is_empty());
    }
}
