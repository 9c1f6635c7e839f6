//! Teacher to specialization links.
//!
//! The link set of a teacher is always replaced as a whole: callers pass the
//! complete desired set and anything not in it is unlinked. Delete and insert
//! run in one transaction so a failed insert leaves the previous set intact.

use std::collections::BTreeSet;

use rusqlite::{params, Connection, Transaction};

use crate::db::{self, in_transaction};
use crate::error::{Result, StoreContext};
use crate::models::{Specialization, Teacher, TeacherDraft};

/// Make the teacher's links match `target` exactly. An empty set unlinks
/// every specialization.
pub fn replace_links(
    conn: &mut Connection,
    teacher_id: i64,
    target: &BTreeSet<i64>,
) -> Result<()> {
    in_transaction(conn, |tx| {
        db::fetch_teacher(tx, teacher_id)?;
        write_links(tx, teacher_id, target)
    })
}

/// Insert or update a teacher's own fields and replace the link set, as one
/// unit. `id = None` creates a new teacher.
pub fn save_teacher(
    conn: &mut Connection,
    id: Option<i64>,
    draft: &TeacherDraft,
    target: &BTreeSet<i64>,
) -> Result<Teacher> {
    in_transaction(conn, |tx| {
        let teacher = match id {
            Some(id) => db::update_teacher(tx, id, draft)?,
            None => db::create_teacher(tx, draft)?,
        };
        write_links(tx, teacher.id, target)?;
        Ok(teacher)
    })
}

/// The teacher's current specializations, by name.
pub fn linked_specializations(conn: &Connection, teacher_id: i64) -> Result<Vec<Specialization>> {
    db::fetch_teacher(conn, teacher_id)?;
    db::fetch_linked_specializations(conn, teacher_id)
}

/// Ids of the teacher's current specializations.
pub fn linked_ids(conn: &Connection, teacher_id: i64) -> Result<BTreeSet<i64>> {
    Ok(linked_specializations(conn, teacher_id)?
        .into_iter()
        .map(|spec| spec.id)
        .collect())
}

fn write_links(tx: &Transaction<'_>, teacher_id: i64, target: &BTreeSet<i64>) -> Result<()> {
    tx.execute(
        "DELETE FROM teacher_specializations WHERE teacher_id = ?1",
        params![teacher_id],
    )
    .store_context("failed to clear teacher specializations")?;

    let mut insert = tx
        .prepare(
            "INSERT INTO teacher_specializations (teacher_id, specialization_id) VALUES (?1, ?2)",
        )
        .store_context("failed to prepare specialization link insert")?;
    for specialization_id in target {
        insert
            .execute(params![teacher_id, specialization_id])
            .store_context("failed to link specialization")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_specialization, create_teacher, delete_specialization, open_in_memory};
    use crate::error::RegistryError;

    fn draft(name: &str) -> TeacherDraft {
        TeacherDraft {
            full_name: name.into(),
            ..TeacherDraft::default()
        }
    }

    fn ids(values: &[i64]) -> BTreeSet<i64> {
        values.iter().copied().collect()
    }

    #[test]
    fn replacement_is_whole_set_not_merge() {
        let mut conn = open_in_memory().unwrap();
        let teacher = create_teacher(&conn, &draft("Olha")).unwrap();
        let x = create_specialization(&conn, "X").unwrap().id;
        let y = create_specialization(&conn, "Y").unwrap().id;
        let z = create_specialization(&conn, "Z").unwrap().id;

        replace_links(&mut conn, teacher.id, &ids(&[x, y])).unwrap();
        assert_eq!(linked_ids(&conn, teacher.id).unwrap(), ids(&[x, y]));

        replace_links(&mut conn, teacher.id, &ids(&[y, z])).unwrap();
        assert_eq!(linked_ids(&conn, teacher.id).unwrap(), ids(&[y, z]));

        replace_links(&mut conn, teacher.id, &BTreeSet::new()).unwrap();
        assert!(linked_ids(&conn, teacher.id).unwrap().is_empty());
    }

    #[test]
    fn failed_insert_keeps_previous_links() {
        let mut conn = open_in_memory().unwrap();
        let teacher = create_teacher(&conn, &draft("Olha")).unwrap();
        let x = create_specialization(&conn, "X").unwrap().id;
        let gone = create_specialization(&conn, "Gone").unwrap().id;
        replace_links(&mut conn, teacher.id, &ids(&[x])).unwrap();
        delete_specialization(&conn, gone).unwrap();

        let err = replace_links(&mut conn, teacher.id, &ids(&[gone])).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Store { context: "failed to link specialization", .. }
        ));
        assert_eq!(linked_ids(&conn, teacher.id).unwrap(), ids(&[x]));
    }

    #[test]
    fn links_of_other_teachers_are_untouched() {
        let mut conn = open_in_memory().unwrap();
        let a = create_teacher(&conn, &draft("A")).unwrap();
        let b = create_teacher(&conn, &draft("B")).unwrap();
        let x = create_specialization(&conn, "X").unwrap().id;

        replace_links(&mut conn, a.id, &ids(&[x])).unwrap();
        replace_links(&mut conn, b.id, &ids(&[x])).unwrap();
        replace_links(&mut conn, a.id, &BTreeSet::new()).unwrap();

        assert_eq!(linked_ids(&conn, b.id).unwrap(), ids(&[x]));
    }

    #[test]
    fn save_teacher_rolls_back_fields_with_links() {
        let mut conn = open_in_memory().unwrap();
        let x = create_specialization(&conn, "X").unwrap().id;
        let saved = save_teacher(&mut conn, None, &draft("Roman"), &ids(&[x])).unwrap();
        assert_eq!(linked_ids(&conn, saved.id).unwrap(), ids(&[x]));

        let err = save_teacher(&mut conn, Some(saved.id), &draft("Renamed"), &ids(&[404]));
        assert!(err.is_err());

        let teacher = db::fetch_teacher(&conn, saved.id).unwrap();
        assert_eq!(teacher.full_name, "Roman");
        assert_eq!(linked_ids(&conn, saved.id).unwrap(), ids(&[x]));
    }

    #[test]
    fn unknown_teacher_is_not_found() {
        let mut conn = open_in_memory().unwrap();
        assert!(matches!(
            replace_links(&mut conn, 9, &BTreeSet::new()),
            Err(RegistryError::NotFound { entity: "teacher", id: 9 })
        ));
    }
}
