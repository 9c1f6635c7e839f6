//! Core library for the circle registry: students, teachers, circles, groups
//! and the enrollments that tie students to groups over time.
//!
//! `ledger`, `roster` and `links` hold the rules around enrollments and
//! teacher specializations; `db` is the SQLite record store they read and
//! write through. The `cli` module is a thin front end for the binary.
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod links;
pub mod logging;
pub mod models;
pub mod roster;

/// Bootstrap helpers used by `main.rs`.
pub use config::Config;
pub use db::{ensure_schema, open_in_memory};
pub use logging::init_logging;

pub use error::{RegistryError, Result};

/// Domain types other layers pass around.
pub use models::{
    Circle, Enrollment, EnrollmentHistory, EnrollmentRecord, EnrollmentStatus, Group,
    RosterEntry, Specialization, Student, Teacher,
};

/// The command-line entry point.
pub use cli::{run, CommandLine};
