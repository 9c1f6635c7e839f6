//! Command-line front end. Argument definitions live here, the handlers in
//! `commands` and the plain-text output in `print`.

mod commands;
mod print;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::config::DB_ENV_VAR;
use crate::models::{GroupDraft, StudentDraft, TeacherDraft};

pub use commands::run;

#[derive(Parser)]
#[command(name = "circle-registry")]
#[command(about = "Keep track of students, teachers and study groups.")]
pub struct CommandLine {
    /// SQLite database to use instead of the default in the home directory
    #[arg(long, global = true, env = DB_ENV_VAR, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage students
    #[command(subcommand)]
    Student(StudentCommand),
    /// Manage teachers and their specializations
    #[command(subcommand)]
    Teacher(TeacherCommand),
    /// Manage circles (subject areas)
    #[command(subcommand)]
    Circle(CircleCommand),
    /// Manage groups
    #[command(subcommand)]
    Group(GroupCommand),
    /// Manage specializations
    #[command(subcommand)]
    Spec(SpecCommand),
    /// Add students to or remove them from a group
    #[command(subcommand)]
    Roster(RosterCommand),
    /// Show registry totals and highlights
    Stats,
}

#[derive(Subcommand)]
pub enum StudentCommand {
    /// List students, optionally filtered by name
    List {
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show a student with their enrollment history
    Show { id: i64 },
    /// Register a new student
    Add(StudentFields),
    /// Change fields of a student; omitted fields keep their value
    Edit {
        id: i64,
        #[command(flatten)]
        fields: StudentFields,
    },
    /// Delete a student and all of their enrollments
    Delete {
        id: i64,
        /// Confirm the irreversible delete
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Default)]
pub struct StudentFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub born: Option<NaiveDate>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub school: Option<String>,
    #[arg(long)]
    pub grade: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    /// Parent or guardian contact notes
    #[arg(long)]
    pub parents: Option<String>,
}

impl StudentFields {
    pub(crate) fn apply(self, draft: &mut StudentDraft) {
        set(&mut draft.full_name, self.name);
        if self.born.is_some() {
            draft.date_of_birth = self.born;
        }
        set(&mut draft.phone, self.phone);
        set(&mut draft.school, self.school);
        set(&mut draft.grade, self.grade);
        set(&mut draft.address, self.address);
        set(&mut draft.parent_info, self.parents);
    }
}

#[derive(Subcommand)]
pub enum TeacherCommand {
    /// List teachers, optionally filtered by name or specialization
    List {
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show a teacher with specializations and led groups
    Show { id: i64 },
    /// Register a new teacher
    Add(TeacherFields),
    /// Change fields of a teacher; `--spec` replaces the whole specialization set
    Edit {
        id: i64,
        #[command(flatten)]
        fields: TeacherFields,
    },
    /// Delete a teacher; their groups stay without a lead teacher
    Delete { id: i64 },
}

#[derive(Args, Default)]
pub struct TeacherFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub born: Option<NaiveDate>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub education: Option<String>,
    /// Specialization id; repeat for several
    #[arg(long = "spec", value_name = "ID")]
    pub specs: Vec<i64>,
    /// Remove every specialization
    #[arg(long, conflicts_with = "specs")]
    pub clear_specs: bool,
}

impl TeacherFields {
    pub(crate) fn apply(&mut self, draft: &mut TeacherDraft) {
        set(&mut draft.full_name, self.name.take());
        if self.born.is_some() {
            draft.date_of_birth = self.born;
        }
        set(&mut draft.phone, self.phone.take());
        set(&mut draft.address, self.address.take());
        set(&mut draft.education, self.education.take());
    }

    /// Whether the caller asked for a new specialization set.
    pub(crate) fn replaces_specs(&self) -> bool {
        self.clear_specs || !self.specs.is_empty()
    }
}

#[derive(Subcommand)]
pub enum CircleCommand {
    /// List circles, optionally filtered by name
    List {
        #[arg(long)]
        filter: Option<String>,
    },
    Add { name: String },
    /// Rename a circle
    Edit { id: i64, name: String },
    /// Delete a circle; its groups are kept
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum GroupCommand {
    /// List groups, optionally filtered by group, circle or teacher name
    List {
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show a group with its current roster
    Show { id: i64 },
    Add(GroupFields),
    Edit {
        id: i64,
        #[command(flatten)]
        fields: GroupFields,
    },
    /// Delete a group together with its whole enrollment history
    Delete {
        id: i64,
        /// Confirm the irreversible delete
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Default)]
pub struct GroupFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, value_name = "ID")]
    pub circle: Option<i64>,
    #[arg(long, value_name = "ID")]
    pub teacher: Option<i64>,
    /// Detach the group from its circle
    #[arg(long, conflicts_with = "circle")]
    pub no_circle: bool,
    /// Detach the group from its lead teacher
    #[arg(long, conflicts_with = "teacher")]
    pub no_teacher: bool,
}

impl GroupFields {
    pub(crate) fn apply(self, draft: &mut GroupDraft) {
        set(&mut draft.name, self.name);
        if self.no_circle {
            draft.circle_id = None;
        } else if self.circle.is_some() {
            draft.circle_id = self.circle;
        }
        if self.no_teacher {
            draft.teacher_id = None;
        } else if self.teacher.is_some() {
            draft.teacher_id = self.teacher;
        }
    }
}

#[derive(Subcommand)]
pub enum SpecCommand {
    /// List specializations, optionally filtered by name
    List {
        #[arg(long)]
        filter: Option<String>,
    },
    Add { name: String },
    Edit { id: i64, name: String },
    /// Delete a specialization; teachers lose that one link
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum RosterCommand {
    /// Current students of a group
    List { group: i64 },
    /// Students that can still be added to a group
    Available { group: i64 },
    /// Enroll a student in a group
    Add { group: i64, student: i64 },
    /// End an enrollment (the history row is kept)
    Remove { enrollment: i64 },
}

fn set(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}
