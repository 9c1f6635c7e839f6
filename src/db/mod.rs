//! Record store: SQLite persistence split into one submodule per table.

mod circles;
mod connection;
mod dashboard;
pub(crate) mod enrollments;
mod groups;
mod specializations;
mod students;
mod teachers;
mod transaction;

pub use circles::{create_circle, delete_circle, fetch_circle, fetch_circles, update_circle};
pub use connection::{apply_schema, ensure_schema, open_in_memory};
pub use dashboard::fetch_dashboard;
pub use groups::{
    create_group, delete_group, fetch_group, fetch_group_detail, fetch_group_details, fetch_groups,
    update_group,
};
pub use specializations::{
    create_specialization, delete_specialization, fetch_specializations, update_specialization,
};
pub use students::{create_student, delete_student, fetch_student, fetch_students, update_student};
pub use teachers::{
    create_teacher, delete_teacher, fetch_linked_specializations, fetch_teacher,
    fetch_teacher_details, fetch_teacher_profile, fetch_teachers, update_teacher,
};
pub use transaction::in_transaction;
