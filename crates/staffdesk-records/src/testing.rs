//! Fixture builders shared by unit tests, integration tests and benches

use chrono::NaiveDate;
use staffdesk_core::{
    Employee, EmployeeStatus, RecordId, Task, TaskPriority, TaskStatus, WorkLog, WorkLogStatus,
};

/// Fixed day every fixture is dated on: 2024-03-15
pub fn fixture_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap_or_default()
}

/// A task assigned to a single employee, due on [`fixture_date`]
pub fn task(id: &str, status: TaskStatus) -> Task {
    Task {
        id: RecordId::new(id),
        title: format!("Task {id}"),
        description: None,
        assigned_to: vec!["emp-1".to_string()],
        due_date: fixture_date(),
        priority: TaskPriority::Medium,
        status,
        completed_at: None,
        created_at: None,
        updated_at: None,
    }
}

/// A work log for [`fixture_date`] with one first-half entry
pub fn worklog(id: &str, status: WorkLogStatus) -> WorkLog {
    WorkLog {
        id: RecordId::new(id),
        employee: "emp-1".to_string(),
        employee_name: None,
        date: fixture_date(),
        project: "General".to_string(),
        first_half: vec!["Standup".to_string()],
        second_half: Vec::new(),
        todo_list: Vec::new(),
        status,
        reviewed_at: None,
        created_at: None,
        updated_at: None,
    }
}

/// An employee with a derived email address
pub fn employee(id: &str, status: EmployeeStatus) -> Employee {
    Employee {
        id: RecordId::new(id),
        name: format!("Employee {id}"),
        email: format!("{id}@example.com"),
        department: None,
        designation: None,
        status,
        created_at: None,
        updated_at: None,
    }
}
