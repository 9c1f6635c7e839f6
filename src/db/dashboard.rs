use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};

use crate::db::circles::fetch_circles;
use crate::db::groups::details_from_row;
use crate::db::students::{student_from_row, STUDENT_COLUMNS};
use crate::error::{Result, StoreContext};
use crate::models::Dashboard;

/// How many rows the "recent students" and "largest groups" lists show.
const TOP_LIMIT: i64 = 5;

/// Collect the landing summary as of `now`. "New this week" means created
/// strictly after `now - 7 days`.
pub fn fetch_dashboard(conn: &Connection, now: DateTime<Utc>) -> Result<Dashboard> {
    let week_ago = now - Duration::days(7);

    let count = |sql: &str, context: &'static str| -> Result<i64> {
        conn.query_row(sql, [], |row| row.get(0)).store_context(context)
    };
    let count_since = |sql: &str, context: &'static str| -> Result<i64> {
        conn.query_row(sql, params![week_ago], |row| row.get(0))
            .store_context(context)
    };

    let students = count("SELECT COUNT(*) FROM students", "failed to count students")?;
    let groups = count("SELECT COUNT(*) FROM study_groups", "failed to count groups")?;
    let teachers = count("SELECT COUNT(*) FROM teachers", "failed to count teachers")?;
    let new_students_week = count_since(
        "SELECT COUNT(*) FROM students WHERE created_at > ?1",
        "failed to count new students",
    )?;
    let new_groups_week = count_since(
        "SELECT COUNT(*) FROM study_groups WHERE created_at > ?1",
        "failed to count new groups",
    )?;

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students s
             ORDER BY s.created_at DESC, s.id DESC LIMIT ?1"
        ))
        .store_context("failed to prepare recent students query")?;
    let recent_students = stmt
        .query_map([TOP_LIMIT], |row| student_from_row(row, 0))
        .store_context("failed to load recent students")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .store_context("failed to collect recent students")?;

    let mut stmt = conn
        .prepare(
            "SELECT g.id, g.name, g.circle_id, g.teacher_id, g.created_at,
                    c.name, t.full_name,
                    (SELECT COUNT(*) FROM enrollments e
                     WHERE e.group_id = g.id AND e.end_date IS NULL) AS student_count
             FROM study_groups g
             LEFT JOIN circles c ON c.id = g.circle_id
             LEFT JOIN teachers t ON t.id = g.teacher_id
             ORDER BY student_count DESC, g.name COLLATE NOCASE, g.id
             LIMIT ?1",
        )
        .store_context("failed to prepare top groups query")?;
    let top_groups = stmt
        .query_map([TOP_LIMIT], details_from_row)
        .store_context("failed to load top groups")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .store_context("failed to collect top groups")?;

    Ok(Dashboard {
        students,
        groups,
        teachers,
        new_students_week,
        new_groups_week,
        recent_students,
        top_groups,
        circles: fetch_circles(conn)?,
    })
}
