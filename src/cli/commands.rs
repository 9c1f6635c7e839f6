use std::collections::BTreeSet;

use anyhow::{bail, Result};
use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use super::print;
use super::{
    CircleCommand, Commands, GroupCommand, RosterCommand, SpecCommand, StudentCommand,
    TeacherCommand, TeacherFields,
};
use crate::models::{name_matches, student_matches, GroupDraft, StudentDraft, TeacherDraft};
use crate::{db, ledger, links, roster};

/// Execute one parsed command against an open registry.
pub fn run(conn: &mut Connection, command: Commands) -> Result<()> {
    match command {
        Commands::Student(command) => student(conn, command),
        Commands::Teacher(command) => teacher(conn, command),
        Commands::Circle(command) => circle(conn, command),
        Commands::Group(command) => group(conn, command),
        Commands::Spec(command) => spec(conn, command),
        Commands::Roster(command) => roster_command(conn, command),
        Commands::Stats => {
            print::dashboard(&db::fetch_dashboard(conn, Utc::now())?);
            Ok(())
        }
    }
}

fn student(conn: &mut Connection, command: StudentCommand) -> Result<()> {
    match command {
        StudentCommand::List { filter } => {
            let mut students = db::fetch_students(conn)?;
            if let Some(filter) = filter {
                students.retain(|student| student_matches(student, &filter));
            }
            print::students(&students);
        }
        StudentCommand::Show { id } => print::student_profile(&ledger::student_profile(conn, id)?),
        StudentCommand::Add(fields) => {
            let mut draft = StudentDraft::default();
            fields.apply(&mut draft);
            let student = db::create_student(conn, &draft)?;
            info!(id = student.id, "student created");
            println!("Added student #{} {}", student.id, student.full_name);
        }
        StudentCommand::Edit { id, fields } => {
            let mut draft = StudentDraft::from(&db::fetch_student(conn, id)?);
            fields.apply(&mut draft);
            let student = db::update_student(conn, id, &draft)?;
            info!(id, "student updated");
            println!("Saved student #{} {}", student.id, student.full_name);
        }
        StudentCommand::Delete { id, yes } => {
            let history = ledger::history_for(conn, id)?;
            if !yes {
                bail!(
                    "deleting student {id} also erases {} enrollment record(s); \
                     rerun with --yes to confirm",
                    history.len()
                );
            }
            db::delete_student(conn, id)?;
            info!(id, enrollments = history.len(), "student deleted");
            println!("Deleted student #{id}");
        }
    }
    Ok(())
}

fn teacher(conn: &mut Connection, command: TeacherCommand) -> Result<()> {
    match command {
        TeacherCommand::List { filter } => {
            let mut teachers = db::fetch_teacher_details(conn)?;
            if let Some(filter) = filter {
                teachers.retain(|details| details.matches(&filter));
            }
            print::teachers(&teachers);
        }
        TeacherCommand::Show { id } => {
            print::teacher_profile(&db::fetch_teacher_profile(conn, id)?)
        }
        TeacherCommand::Add(mut fields) => {
            let mut draft = TeacherDraft::default();
            fields.apply(&mut draft);
            let target = target_specs(&fields);
            let teacher = links::save_teacher(conn, None, &draft, &target)?;
            info!(id = teacher.id, specializations = target.len(), "teacher created");
            println!("Added teacher #{} {}", teacher.id, teacher.full_name);
        }
        TeacherCommand::Edit { id, mut fields } => {
            let mut draft = TeacherDraft::from(&db::fetch_teacher(conn, id)?);
            fields.apply(&mut draft);
            let target = if fields.replaces_specs() {
                target_specs(&fields)
            } else {
                links::linked_ids(conn, id)?
            };
            let teacher = links::save_teacher(conn, Some(id), &draft, &target)?;
            info!(id, specializations = target.len(), "teacher updated");
            println!("Saved teacher #{} {}", teacher.id, teacher.full_name);
        }
        TeacherCommand::Delete { id } => {
            db::delete_teacher(conn, id)?;
            info!(id, "teacher deleted");
            println!("Deleted teacher #{id}");
        }
    }
    Ok(())
}

fn target_specs(fields: &TeacherFields) -> BTreeSet<i64> {
    if fields.clear_specs {
        BTreeSet::new()
    } else {
        fields.specs.iter().copied().collect()
    }
}

fn circle(conn: &mut Connection, command: CircleCommand) -> Result<()> {
    match command {
        CircleCommand::List { filter } => {
            let mut circles = db::fetch_circles(conn)?;
            if let Some(filter) = filter {
                circles.retain(|circle| name_matches(&circle.name, &filter));
            }
            print::circles(&circles);
        }
        CircleCommand::Add { name } => {
            let circle = db::create_circle(conn, &name)?;
            info!(id = circle.id, "circle created");
            println!("Added circle #{} {}", circle.id, circle.name);
        }
        CircleCommand::Edit { id, name } => {
            db::update_circle(conn, id, &name)?;
            println!("Renamed circle #{id}");
        }
        CircleCommand::Delete { id } => {
            db::delete_circle(conn, id)?;
            info!(id, "circle deleted");
            println!("Deleted circle #{id}");
        }
    }
    Ok(())
}

fn group(conn: &mut Connection, command: GroupCommand) -> Result<()> {
    match command {
        GroupCommand::List { filter } => {
            let mut groups = db::fetch_group_details(conn)?;
            if let Some(filter) = filter {
                groups.retain(|details| details.matches(&filter));
            }
            print::groups(&groups);
        }
        GroupCommand::Show { id } => print::group_profile(&ledger::group_profile(conn, id)?),
        GroupCommand::Add(fields) => {
            let mut draft = GroupDraft::default();
            fields.apply(&mut draft);
            let group = db::create_group(conn, &draft)?;
            info!(id = group.id, "group created");
            println!("Added group #{} {}", group.id, group.name);
        }
        GroupCommand::Edit { id, fields } => {
            let mut draft = GroupDraft::from(&db::fetch_group(conn, id)?);
            fields.apply(&mut draft);
            let group = db::update_group(conn, id, &draft)?;
            info!(id, "group updated");
            println!("Saved group #{} {}", group.id, group.name);
        }
        GroupCommand::Delete { id, yes } => {
            let details = db::fetch_group_detail(conn, id)?;
            if !yes {
                bail!(
                    "deleting group {id} ({}) erases its whole enrollment history, \
                     including {} current student(s); rerun with --yes to confirm",
                    details.group.name,
                    details.student_count
                );
            }
            db::delete_group(conn, id)?;
            info!(id, "group deleted");
            println!("Deleted group #{id}");
        }
    }
    Ok(())
}

fn spec(conn: &mut Connection, command: SpecCommand) -> Result<()> {
    match command {
        SpecCommand::List { filter } => {
            let mut specs = db::fetch_specializations(conn)?;
            if let Some(filter) = filter {
                specs.retain(|spec| name_matches(&spec.name, &filter));
            }
            print::specializations(&specs);
        }
        SpecCommand::Add { name } => {
            let spec = db::create_specialization(conn, &name)?;
            info!(id = spec.id, "specialization created");
            println!("Added specialization #{} {}", spec.id, spec.name);
        }
        SpecCommand::Edit { id, name } => {
            db::update_specialization(conn, id, &name)?;
            println!("Renamed specialization #{id}");
        }
        SpecCommand::Delete { id } => {
            db::delete_specialization(conn, id)?;
            info!(id, "specialization deleted");
            println!("Deleted specialization #{id}");
        }
    }
    Ok(())
}

fn roster_command(conn: &mut Connection, command: RosterCommand) -> Result<()> {
    match command {
        RosterCommand::List { group } => print::roster(&ledger::active_for(conn, group)?),
        RosterCommand::Available { group } => print::students(&ledger::available_for(conn, group)?),
        RosterCommand::Add { group, student } => {
            let enrollment = roster::add_student(conn, group, student)?;
            info!(enrollment = enrollment.id, group, student, "student enrolled");
            println!(
                "Enrolled student #{student} in group #{group} (enrollment {})",
                enrollment.id
            );
        }
        RosterCommand::Remove { enrollment } => {
            let closed = roster::remove_student(conn, enrollment)?;
            info!(enrollment, group = closed.group_id, "enrollment closed");
            println!(
                "Removed student #{} from group #{}",
                closed.student_id, closed.group_id
            );
        }
    }
    Ok(())
}
