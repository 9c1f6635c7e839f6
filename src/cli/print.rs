use chrono::{DateTime, Utc};

use crate::models::{
    Circle, Dashboard, EnrollmentRecord, GroupDetails, GroupProfile, RosterEntry, Specialization,
    Student, StudentProfile, TeacherDetails, TeacherProfile,
};

const DASH: &str = "-";

pub(super) fn students(students: &[Student]) {
    if students.is_empty() {
        println!("No students.");
        return;
    }
    for student in students {
        println!("{:>5}  {}", student.id, student.full_name);
    }
}

pub(super) fn student_profile(profile: &StudentProfile) {
    let student = &profile.student;
    println!("#{} {}", student.id, student.full_name);
    field("Born", &student.date_of_birth.map(|d| d.to_string()).unwrap_or_default());
    field("Phone", &student.phone);
    field("Address", &student.address);
    field("School", &format!("{}, grade {}", or_dash(&student.school), or_dash(&student.grade)));
    field("Parents", &student.parent_info);

    println!();
    println!("Active enrollments:");
    if profile.history.active.is_empty() {
        println!("  none");
    }
    for record in &profile.history.active {
        println!(
            "  [{}] {} ({}) since {}",
            record.enrollment.id,
            record.group_name,
            circle_label(record),
            day(record.enrollment.start_date)
        );
    }

    println!("Past enrollments:");
    if profile.history.past.is_empty() {
        println!("  none");
    }
    for record in &profile.history.past {
        let end = record
            .enrollment
            .status
            .end_date()
            .map(day)
            .unwrap_or_else(|| DASH.to_string());
        println!(
            "  [{}] {} ({}) {} - {}",
            record.enrollment.id,
            record.group_name,
            circle_label(record),
            day(record.enrollment.start_date),
            end
        );
    }
}

pub(super) fn teachers(teachers: &[TeacherDetails]) {
    if teachers.is_empty() {
        println!("No teachers.");
        return;
    }
    for details in teachers {
        println!(
            "{:>5}  {}  [{}]",
            details.teacher.id,
            details.teacher.full_name,
            details.specialization_list()
        );
    }
}

pub(super) fn teacher_profile(profile: &TeacherProfile) {
    let teacher = &profile.teacher;
    println!("#{} {}", teacher.id, teacher.full_name);
    field("Born", &teacher.date_of_birth.map(|d| d.to_string()).unwrap_or_default());
    field("Phone", &teacher.phone);
    field("Address", &teacher.address);
    field("Education", &teacher.education);
    let specs: Vec<_> = profile.specializations.iter().map(|s| s.name.as_str()).collect();
    field("Specializations", &specs.join(", "));

    println!();
    println!("Leads groups:");
    if profile.groups.is_empty() {
        println!("  none");
    }
    for group in &profile.groups {
        println!(
            "  [{}] {} ({})",
            group.id,
            group.name,
            group.circle_name.as_deref().unwrap_or(DASH)
        );
    }
}

pub(super) fn circles(circles: &[Circle]) {
    if circles.is_empty() {
        println!("No circles.");
        return;
    }
    for circle in circles {
        println!("{:>5}  {}", circle.id, circle.name);
    }
}

pub(super) fn specializations(specs: &[Specialization]) {
    if specs.is_empty() {
        println!("No specializations.");
        return;
    }
    for spec in specs {
        println!("{:>5}  {}", spec.id, spec.name);
    }
}

pub(super) fn groups(groups: &[GroupDetails]) {
    if groups.is_empty() {
        println!("No groups.");
        return;
    }
    for details in groups {
        println!(
            "{:>5}  {}  circle: {}  teacher: {}  students: {}",
            details.group.id,
            details.group.name,
            details.circle_name.as_deref().unwrap_or(DASH),
            details.teacher_name.as_deref().unwrap_or(DASH),
            details.student_count
        );
    }
}

pub(super) fn group_profile(profile: &GroupProfile) {
    let details = &profile.details;
    println!("#{} {}", details.group.id, details.group.name);
    field("Circle", details.circle_name.as_deref().unwrap_or(""));
    field("Teacher", details.teacher_name.as_deref().unwrap_or(""));
    println!();
    roster(&profile.roster);
}

pub(super) fn roster(entries: &[RosterEntry]) {
    if entries.is_empty() {
        println!("The group has no students.");
        return;
    }
    println!("{:>10}  {:<30}  since", "enrollment", "student");
    for entry in entries {
        println!(
            "{:>10}  {:<30}  {}",
            entry.enrollment_id,
            entry.student.full_name,
            day(entry.start_date)
        );
    }
}

pub(super) fn dashboard(dashboard: &Dashboard) {
    println!(
        "Students: {} (+{} this week)",
        dashboard.students, dashboard.new_students_week
    );
    println!(
        "Groups:   {} (+{} this week)",
        dashboard.groups, dashboard.new_groups_week
    );
    println!("Teachers: {}", dashboard.teachers);

    println!();
    println!("Recently added students:");
    for student in &dashboard.recent_students {
        println!("  {}  ({})", student.full_name, day(student.created_at));
    }

    println!("Largest groups:");
    for details in &dashboard.top_groups {
        println!("  {}  {} students", details.group.name, details.student_count);
    }

    let circles: Vec<_> = dashboard.circles.iter().map(|c| c.name.as_str()).collect();
    println!("Circles: {}", if circles.is_empty() { DASH.to_string() } else { circles.join(", ") });
}

fn field(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{label}:"), or_dash(value));
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        DASH
    } else {
        value
    }
}

fn circle_label(record: &EnrollmentRecord) -> &str {
    record.circle_name.as_deref().unwrap_or(DASH)
}

fn day(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}
