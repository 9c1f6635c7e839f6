//! Opening and closing roster seats.
//!
//! A seat is opened by inserting a fresh enrollment and closed by stamping its
//! end date. Rows are never deleted here, so a student's history stays
//! complete, and re-adding a student always opens a new row.

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::{self, enrollments, in_transaction};
use crate::error::{RegistryError, Result};
use crate::ledger;
use crate::models::{Enrollment, EnrollmentStatus};

/// Put a student on a group's roster, starting now.
pub fn add_student(conn: &mut Connection, group_id: i64, student_id: i64) -> Result<Enrollment> {
    add_student_at(conn, group_id, student_id, Utc::now())
}

/// Put a student on a group's roster starting at `now`.
///
/// Fails with `DuplicateEnrollment` if the student already holds an active
/// seat in this group. Seats in other groups do not matter.
pub fn add_student_at(
    conn: &mut Connection,
    group_id: i64,
    student_id: i64,
    now: DateTime<Utc>,
) -> Result<Enrollment> {
    in_transaction(conn, |tx| {
        db::fetch_group(tx, group_id)?;
        db::fetch_student(tx, student_id)?;

        if ledger::active_enrollment(tx, student_id, group_id)?.is_some() {
            return Err(RegistryError::DuplicateEnrollment {
                student_id,
                group_id,
            });
        }

        enrollments::insert_enrollment(tx, student_id, group_id, now)
    })
}

/// Close a seat now.
pub fn remove_student(conn: &mut Connection, enrollment_id: i64) -> Result<Enrollment> {
    remove_student_at(conn, enrollment_id, Utc::now())
}

/// Close a seat at `now`. The end date never precedes the start date.
///
/// Closing a missing or already closed enrollment fails with `NotActive`, so a
/// repeated request cannot move an existing end date.
pub fn remove_student_at(
    conn: &mut Connection,
    enrollment_id: i64,
    now: DateTime<Utc>,
) -> Result<Enrollment> {
    in_transaction(conn, |tx| {
        let enrollment = match enrollments::fetch_enrollment(tx, enrollment_id)? {
            Some(enrollment) if enrollment.is_active() => enrollment,
            _ => return Err(RegistryError::NotActive(enrollment_id)),
        };

        let end_date = now.max(enrollment.start_date);
        if enrollments::close_enrollment(tx, enrollment_id, end_date)? == 0 {
            return Err(RegistryError::NotActive(enrollment_id));
        }

        Ok(Enrollment {
            status: EnrollmentStatus::Closed { end_date },
            ..enrollment
        })
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::db::{create_group, create_student, open_in_memory};
    use crate::models::{GroupDraft, StudentDraft};

    struct Fixture {
        conn: Connection,
        anna: i64,
        choir: i64,
        chess: i64,
    }

    fn fixture() -> Fixture {
        let conn = open_in_memory().unwrap();
        let anna = create_student(
            &conn,
            &StudentDraft {
                full_name: "Anna".into(),
                ..StudentDraft::default()
            },
        )
        .unwrap()
        .id;
        let group = |name: &str| {
            create_group(
                &conn,
                &GroupDraft {
                    name: name.into(),
                    ..GroupDraft::default()
                },
            )
            .unwrap()
            .id
        };
        let choir = group("Choir");
        let chess = group("Chess");
        Fixture {
            conn,
            anna,
            choir,
            chess,
        }
    }

    fn row_count(conn: &Connection, student_id: i64, group_id: i64) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM enrollments WHERE student_id = ?1 AND group_id = ?2",
            [student_id, group_id],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn second_add_is_rejected_as_duplicate() {
        let mut f = fixture();
        let enrollment = add_student(&mut f.conn, f.choir, f.anna).unwrap();
        assert!(enrollment.is_active());

        let err = add_student(&mut f.conn, f.choir, f.anna).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateEnrollment { student_id, group_id }
                if student_id == f.anna && group_id == f.choir
        ));
        assert_eq!(row_count(&f.conn, f.anna, f.choir), 1);
    }

    #[test]
    fn student_may_hold_seats_in_several_groups() {
        let mut f = fixture();
        add_student(&mut f.conn, f.choir, f.anna).unwrap();
        add_student(&mut f.conn, f.chess, f.anna).unwrap();

        let history = ledger::history_for(&f.conn, f.anna).unwrap();
        assert_eq!(history.active.len(), 2);
    }

    #[test]
    fn remove_closes_once_and_keeps_the_row() {
        let mut f = fixture();
        let start = Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap();
        let end = start + Duration::days(90);
        let enrollment = add_student_at(&mut f.conn, f.choir, f.anna, start).unwrap();

        let closed = remove_student_at(&mut f.conn, enrollment.id, end).unwrap();
        assert_eq!(closed.status, EnrollmentStatus::Closed { end_date: end });
        assert_eq!(row_count(&f.conn, f.anna, f.choir), 1);

        let again = remove_student_at(&mut f.conn, enrollment.id, end + Duration::days(1));
        assert!(matches!(again, Err(RegistryError::NotActive(id)) if id == enrollment.id));

        let history = ledger::history_for(&f.conn, f.anna).unwrap();
        assert_eq!(history.past[0].enrollment.status.end_date(), Some(end));
    }

    #[test]
    fn end_date_is_clamped_to_start() {
        let mut f = fixture();
        let start = Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap();
        let enrollment = add_student_at(&mut f.conn, f.choir, f.anna, start).unwrap();

        let closed =
            remove_student_at(&mut f.conn, enrollment.id, start - Duration::hours(1)).unwrap();
        assert_eq!(closed.status.end_date(), Some(start));
    }

    #[test]
    fn unknown_enrollment_is_not_active() {
        let mut f = fixture();
        assert!(matches!(
            remove_student(&mut f.conn, 404),
            Err(RegistryError::NotActive(404))
        ));
    }

    #[test]
    fn unknown_group_or_student_is_not_found() {
        let mut f = fixture();
        assert!(matches!(
            add_student(&mut f.conn, 404, f.anna),
            Err(RegistryError::NotFound { entity: "group", id: 404 })
        ));
        assert!(matches!(
            add_student(&mut f.conn, f.choir, 404),
            Err(RegistryError::NotFound { entity: "student", id: 404 })
        ));
    }

    #[test]
    fn alternating_adds_and_removes_keep_one_active_row() {
        let mut f = fixture();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        for round in 0..4 {
            let at = start + Duration::days(round * 10);
            let enrollment = add_student_at(&mut f.conn, f.choir, f.anna, at).unwrap();
            assert!(add_student_at(&mut f.conn, f.choir, f.anna, at).is_err());

            let active: i64 = f
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM enrollments
                     WHERE student_id = ?1 AND group_id = ?2 AND end_date IS NULL",
                    [f.anna, f.choir],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(active, 1);

            remove_student_at(&mut f.conn, enrollment.id, at + Duration::days(5)).unwrap();
        }

        assert_eq!(row_count(&f.conn, f.anna, f.choir), 4);
        assert!(ledger::active_for(&f.conn, f.choir).unwrap().is_empty());
    }
}
