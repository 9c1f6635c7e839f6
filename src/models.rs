//! Domain models that mirror the SQLite schema. These stay plain data holders
//! so the ledger and the synchronizers can focus on the enrollment rules while
//! the `db` module owns the row mapping.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, PartialEq)]
/// A child registered with the program. Enrollments reference students, but a
/// student does not own them.
pub struct Student {
    /// Primary key from the database.
    pub id: i64,
    /// Display name and the only required field.
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: String,
    /// School the student attends outside the program.
    pub school: String,
    /// Grade (class) at that school, kept as free text ("7-B").
    pub grade: String,
    pub address: String,
    /// Parent or guardian contact notes.
    pub parent_info: String,
    /// Set by the store on insert; drives the "new this week" dashboard count.
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)
    }
}

/// Editable student fields, used for both inserts and updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentDraft {
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: String,
    pub school: String,
    pub grade: String,
    pub address: String,
    pub parent_info: String,
}

impl From<&Student> for StudentDraft {
    fn from(student: &Student) -> Self {
        StudentDraft {
            full_name: student.full_name.clone(),
            date_of_birth: student.date_of_birth,
            phone: student.phone.clone(),
            school: student.school.clone(),
            grade: student.grade.clone(),
            address: student.address.clone(),
            parent_info: student.parent_info.clone(),
        }
    }
}

/// A teacher who can lead groups and carries a set of specializations.
#[derive(Debug, Clone, PartialEq)]
pub struct Teacher {
    /// Primary key from the database.
    pub id: i64,
    /// Display name and the only required field.
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: String,
    pub address: String,
    /// Free-text description of the teacher's formal education.
    pub education: String,
}

impl fmt::Display for Teacher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)
    }
}

/// Scalar teacher fields. Specialization links travel separately because they
/// are replaced as a whole set on every save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeacherDraft {
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: String,
    pub address: String,
    pub education: String,
}

impl From<&Teacher> for TeacherDraft {
    fn from(teacher: &Teacher) -> Self {
        TeacherDraft {
            full_name: teacher.full_name.clone(),
            date_of_birth: teacher.date_of_birth,
            phone: teacher.phone.clone(),
            address: teacher.address.clone(),
            education: teacher.education.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A subject area ("Robotics", "Folk dance") that owns groups.
pub struct Circle {
    pub id: i64,
    /// Display name shown on group listings.
    pub name: String,
}

impl fmt::Display for Circle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A concrete class inside a circle. Both parents are optional so a group
/// survives the deletion of its circle or its lead teacher.
pub struct Group {
    pub id: i64,
    pub name: String,
    pub circle_id: Option<i64>,
    /// Teacher leading the group, if any.
    pub teacher_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Editable group fields. `None` parents leave the group detached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupDraft {
    pub name: String,
    pub circle_id: Option<i64>,
    pub teacher_id: Option<i64>,
}

impl From<&Group> for GroupDraft {
    fn from(group: &Group) -> Self {
        GroupDraft {
            name: group.name.clone(),
            circle_id: group.circle_id,
            teacher_id: group.teacher_id,
        }
    }
}

/// A group joined with the display names of its parents and the size of its
/// current roster. `student_count` is computed from active enrollments on
/// every read.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDetails {
    pub group: Group,
    pub circle_name: Option<String>,
    pub teacher_name: Option<String>,
    pub student_count: i64,
}

impl GroupDetails {
    /// Case-insensitive match against the group, circle, or teacher name.
    pub fn matches(&self, filter: &str) -> bool {
        let needle = filter.to_lowercase();
        contains_folded(&self.group.name, &needle)
            || self
                .circle_name
                .as_deref()
                .is_some_and(|name| contains_folded(name, &needle))
            || self
                .teacher_name
                .as_deref()
                .is_some_and(|name| contains_folded(name, &needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
/// A label a teacher can be qualified in.
pub struct Specialization {
    pub id: i64,
    pub name: String,
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A teacher together with the names of every linked specialization.
#[derive(Debug, Clone, PartialEq)]
pub struct TeacherDetails {
    pub teacher: Teacher,
    pub specializations: Vec<Specialization>,
}

impl TeacherDetails {
    /// Comma separated specialization names, in name order.
    pub fn specialization_list(&self) -> String {
        self.specializations
            .iter()
            .map(|spec| spec.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Case-insensitive match against the teacher name or any specialization.
    pub fn matches(&self, filter: &str) -> bool {
        let needle = filter.to_lowercase();
        contains_folded(&self.teacher.full_name, &needle)
            || self
                .specializations
                .iter()
                .any(|spec| contains_folded(&spec.name, &needle))
    }
}

/// Short description of a group the teacher leads.
#[derive(Debug, Clone, PartialEq)]
pub struct LedGroup {
    pub id: i64,
    pub name: String,
    pub circle_name: Option<String>,
}

/// Everything shown on a teacher's page.
#[derive(Debug, Clone, PartialEq)]
pub struct TeacherProfile {
    pub teacher: Teacher,
    pub specializations: Vec<Specialization>,
    pub groups: Vec<LedGroup>,
}

/// Lifecycle tag for an enrollment. `Closed` is terminal: once an enrollment
/// carries an end date it is never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentStatus {
    Active,
    Closed { end_date: DateTime<Utc> },
}

impl EnrollmentStatus {
    pub(crate) fn from_end_date(end_date: Option<DateTime<Utc>>) -> Self {
        match end_date {
            None => EnrollmentStatus::Active,
            Some(end_date) => EnrollmentStatus::Closed { end_date },
        }
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        match self {
            EnrollmentStatus::Active => None,
            EnrollmentStatus::Closed { end_date } => Some(*end_date),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One period of a student occupying a seat in a group.
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub group_id: i64,
    pub start_date: DateTime<Utc>,
    pub status: EnrollmentStatus,
}

impl Enrollment {
    pub fn is_active(&self) -> bool {
        matches!(self.status, EnrollmentStatus::Active)
    }
}

/// An enrollment with its group and the group's circle embedded, as shown in
/// a student's history.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentRecord {
    pub enrollment: Enrollment,
    pub group_name: String,
    pub circle_name: Option<String>,
}

/// A student's enrollments partitioned by status. Always derived, never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrollmentHistory {
    /// Ordered by group name, then group id.
    pub active: Vec<EnrollmentRecord>,
    /// Ordered by start date, newest first.
    pub past: Vec<EnrollmentRecord>,
}

impl EnrollmentHistory {
    pub fn len(&self) -> usize {
        self.active.len() + self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.past.is_empty()
    }
}

/// A current roster seat: the student plus the enrollment that holds it, so
/// the caller can close the seat later.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub enrollment_id: i64,
    pub start_date: DateTime<Utc>,
    pub student: Student,
}

/// A student with their enrollment history already partitioned.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentProfile {
    pub student: Student,
    pub history: EnrollmentHistory,
}

/// A group's details and its current roster.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupProfile {
    pub details: GroupDetails,
    /// Active enrollments ordered by student name.
    pub roster: Vec<RosterEntry>,
}

/// Snapshot for the landing summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub students: i64,
    pub groups: i64,
    pub teachers: i64,
    pub new_students_week: i64,
    pub new_groups_week: i64,
    pub recent_students: Vec<Student>,
    pub top_groups: Vec<GroupDetails>,
    pub circles: Vec<Circle>,
}

/// Case-insensitive match on a student's name, or a plain substring match on
/// their phone number.
pub fn student_matches(student: &Student, filter: &str) -> bool {
    contains_folded(&student.full_name, &filter.to_lowercase()) || student.phone.contains(filter)
}

/// Case-insensitive match on a circle or specialization name.
pub fn name_matches(name: &str, filter: &str) -> bool {
    contains_folded(name, &filter.to_lowercase())
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teacher(name: &str) -> Teacher {
        Teacher {
            id: 1,
            full_name: name.to_string(),
            date_of_birth: None,
            phone: String::new(),
            address: String::new(),
            education: String::new(),
        }
    }

    #[test]
    fn teacher_details_match_specialization_names() {
        let details = TeacherDetails {
            teacher: teacher("Olena Koval"),
            specializations: vec![
                Specialization { id: 1, name: "Ceramics".into() },
                Specialization { id: 2, name: "Painting".into() },
            ],
        };

        assert!(details.matches("koval"));
        assert!(details.matches("PAINT"));
        assert!(!details.matches("robotics"));
        assert_eq!(details.specialization_list(), "Ceramics, Painting");
    }

    #[test]
    fn group_details_match_any_parent_name() {
        let details = GroupDetails {
            group: Group {
                id: 3,
                name: "Juniors".into(),
                circle_id: Some(1),
                teacher_id: None,
                created_at: Utc::now(),
            },
            circle_name: Some("Robotics".into()),
            teacher_name: None,
            student_count: 0,
        };

        assert!(details.matches("robo"));
        assert!(details.matches("jun"));
        assert!(!details.matches("dance"));
    }

    #[test]
    fn students_match_name_or_phone() {
        let student = Student {
            id: 1,
            full_name: "Anna Shevchenko".into(),
            date_of_birth: None,
            phone: "0501234567".into(),
            school: String::new(),
            grade: String::new(),
            address: String::new(),
            parent_info: String::new(),
            created_at: Utc::now(),
        };

        assert!(student_matches(&student, "SHEV"));
        assert!(student_matches(&student, "050123"));
        assert!(!student_matches(&student, "067"));
    }

    #[test]
    fn names_match_case_insensitively() {
        assert!(name_matches("Vocal Studio", "voc"));
        assert!(name_matches("Art", "ART"));
        assert!(!name_matches("Chess", "art"));
    }

    #[test]
    fn status_round_trips_end_date() {
        let now = Utc::now();
        assert_eq!(EnrollmentStatus::from_end_date(None), EnrollmentStatus::Active);
        assert_eq!(
            EnrollmentStatus::from_end_date(Some(now)).end_date(),
            Some(now)
        );
    }
}
