//! Raw enrollment rows. Nothing here decides whether an operation is allowed;
//! the ledger and the roster synchronizer own those rules and call into these
//! helpers.

use chrono::{DateTime, Utc};
use rusqlite::{ffi, params, Connection, Error as SqlError, OptionalExtension, Row};

use crate::db::students::{student_from_row, STUDENT_COLUMNS};
use crate::error::{RegistryError, Result, StoreContext};
use crate::models::{Enrollment, EnrollmentRecord, EnrollmentStatus, RosterEntry, Student};

const ENROLLMENT_COLUMNS: &str = "e.id, e.student_id, e.group_id, e.start_date, e.end_date";

fn enrollment_from_row(row: &Row<'_>) -> rusqlite::Result<Enrollment> {
    Ok(Enrollment {
        id: row.get(0)?,
        student_id: row.get(1)?,
        group_id: row.get(2)?,
        start_date: row.get(3)?,
        status: EnrollmentStatus::from_end_date(row.get(4)?),
    })
}

/// Load one enrollment row, active or closed.
pub(crate) fn fetch_enrollment(conn: &Connection, id: i64) -> Result<Option<Enrollment>> {
    conn.query_row(
        &format!("SELECT {ENROLLMENT_COLUMNS} FROM enrollments e WHERE e.id = ?1"),
        [id],
        enrollment_from_row,
    )
    .optional()
    .store_context("failed to load enrollment")
}

/// Active rows for one (student, group) pair. More than one row means the
/// ledger is corrupt.
pub(crate) fn fetch_active_for_pair(
    conn: &Connection,
    student_id: i64,
    group_id: i64,
) -> Result<Vec<Enrollment>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e
             WHERE e.student_id = ?1 AND e.group_id = ?2 AND e.end_date IS NULL
             ORDER BY e.id"
        ))
        .store_context("failed to prepare active enrollment query")?;

    let rows = stmt
        .query_map([student_id, group_id], enrollment_from_row)
        .store_context("failed to load active enrollments")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .store_context("failed to collect active enrollments")?;

    Ok(rows)
}

/// Open a new enrollment. A hit on the partial unique index means the pair
/// already has an active row.
pub(crate) fn insert_enrollment(
    conn: &Connection,
    student_id: i64,
    group_id: i64,
    start_date: DateTime<Utc>,
) -> Result<Enrollment> {
    conn.execute(
        "INSERT INTO enrollments (student_id, group_id, start_date) VALUES (?1, ?2, ?3)",
        params![student_id, group_id, start_date],
    )
    .map_err(|err| map_active_conflict(err, student_id, group_id))?;

    Ok(Enrollment {
        id: conn.last_insert_rowid(),
        student_id,
        group_id,
        start_date,
        status: EnrollmentStatus::Active,
    })
}

/// Stamp `end_date` on an active row. Returns the number of rows touched, zero
/// when the row is missing or already closed.
pub(crate) fn close_enrollment(
    conn: &Connection,
    id: i64,
    end_date: DateTime<Utc>,
) -> Result<usize> {
    conn.execute(
        "UPDATE enrollments SET end_date = ?1 WHERE id = ?2 AND end_date IS NULL",
        params![end_date, id],
    )
    .store_context("failed to close enrollment")
}

/// Every enrollment of a student with the group and its circle embedded.
pub(crate) fn fetch_records_for_student(
    conn: &Connection,
    student_id: i64,
) -> Result<Vec<EnrollmentRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ENROLLMENT_COLUMNS}, g.name, c.name
             FROM enrollments e
             INNER JOIN study_groups g ON g.id = e.group_id
             LEFT JOIN circles c ON c.id = g.circle_id
             WHERE e.student_id = ?1
             ORDER BY e.id"
        ))
        .store_context("failed to prepare enrollment history query")?;

    let records = stmt
        .query_map([student_id], |row| {
            Ok(EnrollmentRecord {
                enrollment: enrollment_from_row(row)?,
                group_name: row.get(5)?,
                circle_name: row.get(6)?,
            })
        })
        .store_context("failed to load enrollment history")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .store_context("failed to collect enrollment history")?;

    Ok(records)
}

/// Active enrollments of a group projected to their students, by name.
pub(crate) fn fetch_active_roster(conn: &Connection, group_id: i64) -> Result<Vec<RosterEntry>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT e.id, e.start_date, {STUDENT_COLUMNS}
             FROM enrollments e
             INNER JOIN students s ON s.id = e.student_id
             WHERE e.group_id = ?1 AND e.end_date IS NULL
             ORDER BY s.full_name COLLATE NOCASE, s.id, e.id"
        ))
        .store_context("failed to prepare roster query")?;

    let roster = stmt
        .query_map([group_id], |row| {
            Ok(RosterEntry {
                enrollment_id: row.get(0)?,
                start_date: row.get(1)?,
                student: student_from_row(row, 2)?,
            })
        })
        .store_context("failed to load roster")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .store_context("failed to collect roster")?;

    Ok(roster)
}

/// Students without an active enrollment in the group.
pub(crate) fn fetch_students_outside(conn: &Connection, group_id: i64) -> Result<Vec<Student>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {STUDENT_COLUMNS}
             FROM students s
             WHERE NOT EXISTS (
                 SELECT 1 FROM enrollments e
                 WHERE e.student_id = s.id AND e.group_id = ?1 AND e.end_date IS NULL
             )
             ORDER BY s.full_name COLLATE NOCASE, s.id"
        ))
        .store_context("failed to prepare available students query")?;

    let students = stmt
        .query_map([group_id], |row| student_from_row(row, 0))
        .store_context("failed to load available students")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .store_context("failed to collect available students")?;

    Ok(students)
}

fn map_active_conflict(err: SqlError, student_id: i64, group_id: i64) -> RegistryError {
    let unique_hit = matches!(
        &err,
        SqlError::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    );

    if unique_hit {
        RegistryError::DuplicateEnrollment {
            student_id,
            group_id,
        }
    } else {
        RegistryError::Store {
            context: "failed to insert enrollment",
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::db::{create_group, create_student, open_in_memory};
    use crate::models::{GroupDraft, StudentDraft};

    fn pair(conn: &Connection) -> (i64, i64) {
        let student = create_student(
            conn,
            &StudentDraft {
                full_name: "Anna".into(),
                ..StudentDraft::default()
            },
        )
        .unwrap();
        let group = create_group(
            conn,
            &GroupDraft {
                name: "Choir".into(),
                ..GroupDraft::default()
            },
        )
        .unwrap();
        (student.id, group.id)
    }

    #[test]
    fn second_active_row_hits_the_unique_index() {
        let conn = open_in_memory().unwrap();
        let (student_id, group_id) = pair(&conn);
        let start = Utc.with_ymd_and_hms(2024, 9, 1, 9, 0, 0).unwrap();

        insert_enrollment(&conn, student_id, group_id, start).unwrap();
        let second = insert_enrollment(&conn, student_id, group_id, start);

        assert!(matches!(
            second,
            Err(RegistryError::DuplicateEnrollment { student_id: s, group_id: g })
                if s == student_id && g == group_id
        ));
        assert_eq!(fetch_active_for_pair(&conn, student_id, group_id).unwrap().len(), 1);
    }

    #[test]
    fn closed_rows_free_the_pair_and_stay_closed() {
        let conn = open_in_memory().unwrap();
        let (student_id, group_id) = pair(&conn);
        let start = Utc.with_ymd_and_hms(2024, 9, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0).unwrap();

        let first = insert_enrollment(&conn, student_id, group_id, start).unwrap();
        assert_eq!(close_enrollment(&conn, first.id, end).unwrap(), 1);
        assert_eq!(close_enrollment(&conn, first.id, start).unwrap(), 0);
        insert_enrollment(&conn, student_id, group_id, end).unwrap();

        let stored = fetch_enrollment(&conn, first.id).unwrap().unwrap();
        assert_eq!(stored.status.end_date(), Some(end));
        assert_eq!(fetch_records_for_student(&conn, student_id).unwrap().len(), 2);
    }

    #[test]
    fn unrelated_insert_failures_stay_store_errors() {
        let conn = open_in_memory().unwrap();
        let start = Utc.with_ymd_and_hms(2024, 9, 1, 9, 0, 0).unwrap();

        let orphan = insert_enrollment(&conn, 7, 8, start);
        assert!(matches!(orphan, Err(RegistryError::Store { .. })));
    }
}
