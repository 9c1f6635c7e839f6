//! Read side of the student/group relationship.
//!
//! Enrollment rows are the only record of who sits in which group: rosters,
//! roster sizes, the available-student picker and every student's history are
//! derived here on each call and never cached. Every read also checks that no
//! (student, group) pair has more than one active row.

use std::collections::BTreeSet;

use rusqlite::Connection;

use crate::db::{self, enrollments};
use crate::error::{RegistryError, Result};
use crate::models::{
    Enrollment, EnrollmentHistory, EnrollmentRecord, GroupProfile, RosterEntry, Student,
    StudentProfile,
};

/// Current roster of a group, ordered by student name. Each entry carries the
/// enrollment id needed to close the seat.
pub fn active_for(conn: &Connection, group_id: i64) -> Result<Vec<RosterEntry>> {
    db::fetch_group(conn, group_id)?;
    let roster = enrollments::fetch_active_roster(conn, group_id)?;

    let mut seen = BTreeSet::new();
    for entry in &roster {
        if !seen.insert(entry.student.id) {
            return Err(RegistryError::CorruptLedger {
                student_id: entry.student.id,
                group_id,
            });
        }
    }

    Ok(roster)
}

/// Students who could be added to the group: everyone without an active seat.
/// The roster is read first so a corrupt ledger fails here too.
pub fn available_for(conn: &Connection, group_id: i64) -> Result<Vec<Student>> {
    active_for(conn, group_id)?;
    enrollments::fetch_students_outside(conn, group_id)
}

/// Number of students currently on the group's roster.
pub fn roster_size(conn: &Connection, group_id: i64) -> Result<usize> {
    Ok(active_for(conn, group_id)?.len())
}

/// The active row for a pair, if any.
pub fn active_enrollment(
    conn: &Connection,
    student_id: i64,
    group_id: i64,
) -> Result<Option<Enrollment>> {
    let mut rows = enrollments::fetch_active_for_pair(conn, student_id, group_id)?;
    if rows.len() > 1 {
        return Err(RegistryError::CorruptLedger {
            student_id,
            group_id,
        });
    }
    Ok(rows.pop())
}

/// Split every enrollment of a student into active and past.
///
/// Active records are ordered by group name, past records by start date with
/// the newest first.
pub fn history_for(conn: &Connection, student_id: i64) -> Result<EnrollmentHistory> {
    db::fetch_student(conn, student_id)?;
    let records = enrollments::fetch_records_for_student(conn, student_id)?;
    partition(student_id, records)
}

fn partition(student_id: i64, records: Vec<EnrollmentRecord>) -> Result<EnrollmentHistory> {
    let (mut active, mut past): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|record| record.enrollment.is_active());

    let mut active_groups = BTreeSet::new();
    for record in &active {
        if !active_groups.insert(record.enrollment.group_id) {
            return Err(RegistryError::CorruptLedger {
                student_id,
                group_id: record.enrollment.group_id,
            });
        }
    }

    active.sort_by(|a, b| {
        a.group_name
            .to_lowercase()
            .cmp(&b.group_name.to_lowercase())
            .then(a.enrollment.group_id.cmp(&b.enrollment.group_id))
    });
    past.sort_by(|a, b| {
        b.enrollment
            .start_date
            .cmp(&a.enrollment.start_date)
            .then(b.enrollment.id.cmp(&a.enrollment.id))
    });

    Ok(EnrollmentHistory { active, past })
}

/// A student together with their split enrollment history.
pub fn student_profile(conn: &Connection, student_id: i64) -> Result<StudentProfile> {
    let student = db::fetch_student(conn, student_id)?;
    let records = enrollments::fetch_records_for_student(conn, student_id)?;
    Ok(StudentProfile {
        student,
        history: partition(student_id, records)?,
    })
}

/// Group details plus the current roster.
pub fn group_profile(conn: &Connection, group_id: i64) -> Result<GroupProfile> {
    let details = db::fetch_group_detail(conn, group_id)?;
    let roster = active_for(conn, group_id)?;
    Ok(GroupProfile { details, roster })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rusqlite::params;

    use super::*;
    use crate::db::{create_circle, create_group, create_student, open_in_memory};
    use crate::models::{GroupDraft, StudentDraft};

    fn student(conn: &Connection, name: &str) -> i64 {
        create_student(
            conn,
            &StudentDraft {
                full_name: name.into(),
                ..StudentDraft::default()
            },
        )
        .unwrap()
        .id
    }

    fn group(conn: &Connection, name: &str, circle_id: Option<i64>) -> i64 {
        create_group(
            conn,
            &GroupDraft {
                name: name.into(),
                circle_id,
                teacher_id: None,
            },
        )
        .unwrap()
        .id
    }

    fn enroll(conn: &Connection, student_id: i64, group_id: i64, day: u32, closed: bool) -> i64 {
        let start = Utc.with_ymd_and_hms(2024, 9, day, 9, 0, 0).unwrap();
        let end = closed.then(|| start + Duration::days(30));
        conn.execute(
            "INSERT INTO enrollments (student_id, group_id, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4)",
            params![student_id, group_id, start, end],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    #[test]
    fn history_partitions_and_orders_records() {
        let conn = open_in_memory().unwrap();
        let circle = create_circle(&conn, "Art").unwrap();
        let anna = student(&conn, "Anna");
        let pottery = group(&conn, "Pottery", Some(circle.id));
        let batik = group(&conn, "Batik", None);
        let drawing = group(&conn, "Drawing", Some(circle.id));

        let first = enroll(&conn, anna, drawing, 1, true);
        let second = enroll(&conn, anna, drawing, 10, true);
        enroll(&conn, anna, pottery, 3, false);
        enroll(&conn, anna, batik, 4, false);

        let history = history_for(&conn, anna).unwrap();
        let active: Vec<_> = history.active.iter().map(|r| r.group_name.as_str()).collect();
        assert_eq!(active, ["Batik", "Pottery"]);
        let past: Vec<_> = history.past.iter().map(|r| r.enrollment.id).collect();
        assert_eq!(past, [second, first]);
        assert_eq!(history.past[0].circle_name.as_deref(), Some("Art"));
        assert_eq!(history.active[0].circle_name, None);
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn roster_and_available_students_are_complements() {
        let conn = open_in_memory().unwrap();
        let anna = student(&conn, "Anna");
        let bohdan = student(&conn, "Bohdan");
        let cyril = student(&conn, "Cyril");
        let choir = group(&conn, "Choir", None);
        enroll(&conn, bohdan, choir, 1, false);
        enroll(&conn, anna, choir, 1, false);
        enroll(&conn, cyril, choir, 1, true);

        let roster: Vec<_> = active_for(&conn, choir)
            .unwrap()
            .into_iter()
            .map(|entry| entry.student.id)
            .collect();
        assert_eq!(roster, [anna, bohdan]);

        let available: Vec<_> = available_for(&conn, choir)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(available, [cyril]);
        assert_eq!(roster_size(&conn, choir).unwrap(), 2);
    }

    #[test]
    fn reads_fail_on_duplicate_active_rows() {
        let conn = open_in_memory().unwrap();
        conn.execute("DROP INDEX enrollments_one_active", []).unwrap();
        let anna = student(&conn, "Anna");
        let choir = group(&conn, "Choir", None);
        enroll(&conn, anna, choir, 1, false);
        enroll(&conn, anna, choir, 2, false);

        let expected = |result: Result<()>| {
            matches!(
                result,
                Err(RegistryError::CorruptLedger { student_id, group_id })
                    if student_id == anna && group_id == choir
            )
        };
        assert!(expected(active_for(&conn, choir).map(|_| ())));
        assert!(expected(history_for(&conn, anna).map(|_| ())));
        assert!(expected(active_enrollment(&conn, anna, choir).map(|_| ())));
        assert!(expected(available_for(&conn, choir).map(|_| ())));
    }

    #[test]
    fn unknown_ids_report_not_found() {
        let conn = open_in_memory().unwrap();
        assert!(matches!(
            active_for(&conn, 1),
            Err(RegistryError::NotFound { entity: "group", .. })
        ));
        assert!(matches!(
            history_for(&conn, 1),
            Err(RegistryError::NotFound { entity: "student", .. })
        ));
    }
}
