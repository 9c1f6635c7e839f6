//! Error taxonomy shared by the record store and the enrollment core.
//!
//! Every store failure keeps the original `rusqlite::Error` as its source so
//! callers can surface the real cause instead of a generic message.

use rusqlite::Error as SqlError;
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The student already holds an active seat in the group.
    #[error("student {student_id} is already enrolled in group {group_id}")]
    DuplicateEnrollment { student_id: i64, group_id: i64 },

    /// The enrollment is closed or does not exist.
    #[error("enrollment {0} is not active")]
    NotActive(i64),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A required text field was blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A read observed two active enrollments for one (student, group) pair.
    #[error("more than one active enrollment for student {student_id} in group {group_id}")]
    CorruptLedger { student_id: i64, group_id: i64 },

    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: SqlError,
    },
}

impl RegistryError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        RegistryError::NotFound { entity, id }
    }
}

impl From<SqlError> for RegistryError {
    fn from(source: SqlError) -> Self {
        RegistryError::Store {
            context: "record store call failed",
            source,
        }
    }
}

/// Attach a short description of the failed store call, in the spirit of
/// `anyhow::Context`, while keeping the typed error.
pub(crate) trait StoreContext<T> {
    fn store_context(self, context: &'static str) -> Result<T>;
}

impl<T> StoreContext<T> for std::result::Result<T, SqlError> {
    fn store_context(self, context: &'static str) -> Result<T> {
        self.map_err(|source| RegistryError::Store { context, source })
    }
}

/// Require a non-blank value for `field`.
pub(crate) fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(RegistryError::MissingField(field))
    } else {
        Ok(())
    }
}
