//! Plain-text tables for the command line

use staffdesk_core::{Employee, Task, WorkLog};
use staffdesk_records::Page;
use std::fmt::Write as _;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn footer<R>(page: &Page<R>) -> String {
    if page.total_count == 0 {
        return "No matching records".to_string();
    }
    format!(
        "Page {} of {} ({} records)",
        page.page, page.total_pages, page.total_count
    )
}

/// Work log table
pub fn worklogs(page: &Page<WorkLog>) -> String {
    let mut out = format!(
        "{:<26} {:<10} {:<20} {:<24} {:<9}\n",
        "ID", "DATE", "EMPLOYEE", "PROJECT", "STATUS"
    );
    for log in &page.items {
        let employee = log.employee_name.as_deref().unwrap_or(&log.employee);
        let _ = writeln!(
            out,
            "{:<26} {:<10} {:<20} {:<24} {:<9}",
            truncate(log.id.as_str(), 26),
            log.date.format(DATE_FORMAT),
            truncate(employee, 20),
            truncate(&log.project, 24),
            log.status,
        );
    }
    out.push_str(&footer(page));
    out
}

/// Task table
pub fn tasks(page: &Page<Task>) -> String {
    let mut out = format!(
        "{:<26} {:<32} {:<10} {:<8} {:<11}\n",
        "ID", "TITLE", "DUE", "PRIORITY", "STATUS"
    );
    for task in &page.items {
        let _ = writeln!(
            out,
            "{:<26} {:<32} {:<10} {:<8} {:<11}",
            truncate(task.id.as_str(), 26),
            truncate(&task.title, 32),
            task.due_date.format(DATE_FORMAT),
            task.priority,
            task.status,
        );
    }
    out.push_str(&footer(page));
    out
}

/// Employee table
pub fn employees(page: &Page<Employee>) -> String {
    let mut out = format!(
        "{:<26} {:<24} {:<30} {:<16} {:<8}\n",
        "ID", "NAME", "EMAIL", "DEPARTMENT", "STATUS"
    );
    for employee in &page.items {
        let _ = writeln!(
            out,
            "{:<26} {:<24} {:<30} {:<16} {:<8}",
            truncate(employee.id.as_str(), 26),
            truncate(&employee.name, 24),
            truncate(&employee.email, 30),
            truncate(employee.department.as_deref().unwrap_or("-"), 16),
            employee.status,
        );
    }
    out.push_str(&footer(page));
    out
}
