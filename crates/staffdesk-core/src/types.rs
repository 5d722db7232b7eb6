//! Core data types for staffdesk records
//!
//! Every entity the dashboard tracks (tasks, work logs, employees) implements
//! [`Record`], which is what the store, the view pipeline and the transition
//! engine are generic over. Status enums implement [`StatusMachine`].

use crate::utils::{self, flexible_date};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use uuid::Uuid;

/// Prefix of locally generated placeholder ids
pub const TEMPORARY_ID_PREFIX: &str = "tmp-";

/// Record identifier
///
/// Server ids are opaque strings. Placeholders created before the server has
/// confirmed a create carry a `tmp-` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap a server-assigned id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a placeholder id for an optimistic create
    pub fn temporary() -> Self {
        Self(format!("{TEMPORARY_ID_PREFIX}{}", Uuid::new_v4()))
    }

    /// Whether this id is a local placeholder
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_ID_PREFIX)
    }

    /// Borrow as `&str`
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&RecordId> for RecordId {
    fn from(value: &RecordId) -> Self {
        value.clone()
    }
}

/// Typed key used by the view pipeline to order records
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    /// Numeric rank (priority, status order)
    Number(i64),
    /// Calendar date
    Date(NaiveDate),
    /// Point in time
    Timestamp(DateTime<Utc>),
    /// Lowercased text
    Text(String),
}

impl SortValue {
    /// Text key compared case-insensitively
    pub fn text(value: &str) -> Self {
        Self::Text(value.to_lowercase())
    }
}

/// Status enumeration with a fixed set of values and UI-offered transitions
///
/// The offered transitions describe what the dashboard presents as actions.
/// They are advisory: the transition engine logs but does not block a change
/// outside this set.
pub trait StatusMachine:
    Copy + Eq + Hash + fmt::Debug + fmt::Display + FromStr<Err = Error> + Send + Sync + 'static
{
    /// Every declared value, in display order
    const ALL: &'static [Self];

    /// Status assigned at creation
    fn initial() -> Self;

    /// Wire representation
    fn as_str(self) -> &'static str;

    /// Targets the dashboard offers from this status
    fn offered_targets(self) -> &'static [Self];

    /// Whether moving to `target` is an offered action
    fn is_offered(self, target: Self) -> bool {
        self.offered_targets().contains(&target)
    }

    /// No offered transitions lead out of this status
    fn is_terminal(self) -> bool {
        self.offered_targets().is_empty()
    }

    /// Position in [`Self::ALL`], used for sorting
    fn rank(self) -> i64 {
        Self::ALL
            .iter()
            .position(|s| *s == self)
            .and_then(|p| i64::try_from(p).ok())
            .unwrap_or(i64::MAX)
    }
}

fn parse_status<S: StatusMachine>(kind: &str, raw: &str) -> Result<S> {
    let token = utils::normalize_token(raw);
    S::ALL
        .iter()
        .copied()
        .find(|s| s.as_str() == token || s.as_str().replace('-', "") == token)
        .ok_or_else(|| {
            Error::validation(
                "status",
                format!("'{raw}' is not a valid {kind} status"),
            )
        })
}

macro_rules! status_string_impls {
    ($ty:ty, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                parse_status($kind, s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                value.parse()
            }
        }

        impl From<$ty> for &'static str {
            fn from(value: $ty) -> Self {
                value.as_str()
            }
        }
    };
}

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum TaskStatus {
    /// Not started
    Pending,
    /// Being worked on
    InProgress,
    /// Paused
    OnHold,
    /// Done
    Completed,
}

impl StatusMachine for TaskStatus {
    const ALL: &'static [Self] = &[Self::Pending, Self::InProgress, Self::OnHold, Self::Completed];

    fn initial() -> Self {
        Self::Pending
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::OnHold => "on-hold",
            Self::Completed => "completed",
        }
    }

    fn offered_targets(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::InProgress, Self::OnHold, Self::Completed],
            Self::InProgress => &[Self::Pending, Self::OnHold, Self::Completed],
            Self::OnHold => &[Self::Pending, Self::InProgress, Self::Completed],
            Self::Completed => &[],
        }
    }
}

status_string_impls!(TaskStatus, "task");

/// Work log review status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum WorkLogStatus {
    /// Awaiting review
    Pending,
    /// Accepted by a reviewer
    Approved,
    /// Declined by a reviewer
    Rejected,
}

impl StatusMachine for WorkLogStatus {
    const ALL: &'static [Self] = &[Self::Pending, Self::Approved, Self::Rejected];

    fn initial() -> Self {
        Self::Pending
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    // A review can be reversed, but nothing offers a return to pending.
    fn offered_targets(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Approved, Self::Rejected],
            Self::Approved => &[Self::Rejected],
            Self::Rejected => &[Self::Approved],
        }
    }
}

status_string_impls!(WorkLogStatus, "worklog");

/// Employee account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum EmployeeStatus {
    /// Can sign in
    Active,
    /// Deactivated
    Inactive,
}

impl StatusMachine for EmployeeStatus {
    const ALL: &'static [Self] = &[Self::Active, Self::Inactive];

    fn initial() -> Self {
        Self::Active
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    fn offered_targets(self) -> &'static [Self] {
        match self {
            Self::Active => &[Self::Inactive],
            Self::Inactive => &[Self::Active],
        }
    }
}

status_string_impls!(EmployeeStatus, "employee");

/// An entity tracked by a record store
pub trait Record: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Status enumeration
    type Status: StatusMachine;

    /// Field edits merged by `update_by_id`
    type Patch: fmt::Debug + Clone + Serialize + Send + Sync;

    /// Input for a create
    type Draft: fmt::Debug + Clone + Serialize + Send + Sync;

    /// Entity kind used in messages and logs
    const KIND: &'static str;

    /// Unique id
    fn id(&self) -> &RecordId;

    /// Current status
    fn status(&self) -> Self::Status;

    /// Overwrite the status
    fn set_status(&mut self, status: Self::Status);

    /// Merge a field patch
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Entity-specific invariants
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the offending field.
    fn check_invariants(&self) -> Result<()> {
        Ok(())
    }

    /// Synthesize a record from a draft before the server has seen it
    fn from_draft(id: RecordId, draft: &Self::Draft, now: DateTime<Utc>) -> Self;

    /// Named text field for search and equality filters
    fn text_field(&self, field: &str) -> Option<Cow<'_, str>>;

    /// Named list field for membership filters
    fn list_field(&self, _field: &str) -> Option<&[String]> {
        None
    }

    /// Named date field for range filters
    fn date_field(&self, field: &str) -> Option<NaiveDate>;

    /// Named sort key
    fn sort_value(&self, field: &str) -> Option<SortValue>;
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low
    Low,
    /// Medium
    #[default]
    Medium,
    /// High
    High,
}

impl TaskPriority {
    /// Wire representation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match utils::normalize_token(s).as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(Error::validation(
                "priority",
                format!("'{s}' is not a valid priority"),
            )),
        }
    }
}

/// A task assigned to one or more employees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier
    #[serde(alias = "_id")]
    pub id: RecordId,

    /// Short title
    pub title: String,

    /// Longer description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Assigned employee ids (never empty)
    #[serde(default)]
    pub assigned_to: Vec<String>,

    /// Due date
    #[serde(with = "flexible_date")]
    pub due_date: NaiveDate,

    /// Priority
    #[serde(default)]
    pub priority: TaskPriority,

    /// Current status
    pub status: TaskStatus,

    /// Set by the server when the task is completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Field edits for a task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// New title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New assignee set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Vec<String>>,
    /// New due date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// New priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
}

/// Input for creating a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    /// Title
    pub title: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Assignees
    pub assigned_to: Vec<String>,
    /// Due date
    #[serde(with = "flexible_date")]
    pub due_date: NaiveDate,
    /// Priority
    pub priority: TaskPriority,
}

impl Record for Task {
    type Status = TaskStatus;
    type Patch = TaskPatch;
    type Draft = TaskDraft;

    const KIND: &'static str = "task";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(assigned_to) = &patch.assigned_to {
            self.assigned_to.clone_from(assigned_to);
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
    }

    fn check_invariants(&self) -> Result<()> {
        if self.assigned_to.is_empty() {
            return Err(Error::validation(
                "assigned_to",
                format!("Task {} must be assigned to at least one employee", self.id),
            ));
        }
        Ok(())
    }

    fn from_draft(id: RecordId, draft: &TaskDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            assigned_to: draft.assigned_to.clone(),
            due_date: draft.due_date,
            priority: draft.priority,
            status: TaskStatus::initial(),
            completed_at: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    fn text_field(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "id" => Some(Cow::Borrowed(self.id.as_str())),
            "title" => Some(Cow::Borrowed(&self.title)),
            "description" => self.description.as_deref().map(Cow::Borrowed),
            "priority" => Some(Cow::Borrowed(self.priority.as_str())),
            "status" => Some(Cow::Borrowed(self.status.as_str())),
            "assigned_to" => Some(Cow::Owned(self.assigned_to.join(" "))),
            _ => None,
        }
    }

    fn list_field(&self, field: &str) -> Option<&[String]> {
        match field {
            "assigned_to" => Some(&self.assigned_to),
            _ => None,
        }
    }

    fn date_field(&self, field: &str) -> Option<NaiveDate> {
        match field {
            "due_date" => Some(self.due_date),
            "created_at" => self.created_at.map(|t| t.date_naive()),
            "completed_at" => self.completed_at.map(|t| t.date_naive()),
            _ => None,
        }
    }

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "title" => Some(SortValue::text(&self.title)),
            "due_date" => Some(SortValue::Date(self.due_date)),
            "priority" => Some(SortValue::Number(self.priority as i64)),
            "status" => Some(SortValue::Number(self.status.rank())),
            "created_at" => self.created_at.map(SortValue::Timestamp),
            "updated_at" => self.updated_at.map(SortValue::Timestamp),
            "completed_at" => self.completed_at.map(SortValue::Timestamp),
            _ => None,
        }
    }
}

/// A daily work log submitted by an employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLog {
    /// Unique identifier
    #[serde(alias = "_id")]
    pub id: RecordId,

    /// Submitting employee id
    #[serde(default)]
    pub employee: String,

    /// Submitting employee display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,

    /// Day the log covers (immutable after creation)
    #[serde(with = "flexible_date")]
    pub date: NaiveDate,

    /// Project worked on
    pub project: String,

    /// Morning entries
    #[serde(default)]
    pub first_half: Vec<String>,

    /// Afternoon entries
    #[serde(default)]
    pub second_half: Vec<String>,

    /// Follow-ups for the next day
    #[serde(default)]
    pub todo_list: Vec<String>,

    /// Review status
    pub status: WorkLogStatus,

    /// Set by the server when a reviewer acts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,

    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Field edits for a work log; the date cannot change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLogPatch {
    /// New project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// New morning entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_half: Option<Vec<String>>,
    /// New afternoon entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_half: Option<Vec<String>>,
    /// New follow-ups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo_list: Option<Vec<String>>,
}

/// Input for submitting a work log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLogDraft {
    /// Day the log covers
    #[serde(with = "flexible_date")]
    pub date: NaiveDate,
    /// Project
    pub project: String,
    /// Morning entries
    pub first_half: Vec<String>,
    /// Afternoon entries
    pub second_half: Vec<String>,
    /// Follow-ups
    pub todo_list: Vec<String>,
}

impl Record for WorkLog {
    type Status = WorkLogStatus;
    type Patch = WorkLogPatch;
    type Draft = WorkLogDraft;

    const KIND: &'static str = "worklog";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn status(&self) -> WorkLogStatus {
        self.status
    }

    fn set_status(&mut self, status: WorkLogStatus) {
        self.status = status;
    }

    fn apply_patch(&mut self, patch: &WorkLogPatch) {
        if let Some(project) = &patch.project {
            self.project.clone_from(project);
        }
        if let Some(first_half) = &patch.first_half {
            self.first_half.clone_from(first_half);
        }
        if let Some(second_half) = &patch.second_half {
            self.second_half.clone_from(second_half);
        }
        if let Some(todo_list) = &patch.todo_list {
            self.todo_list.clone_from(todo_list);
        }
    }

    fn from_draft(id: RecordId, draft: &WorkLogDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            employee: String::new(),
            employee_name: None,
            date: draft.date,
            project: draft.project.clone(),
            first_half: draft.first_half.clone(),
            second_half: draft.second_half.clone(),
            todo_list: draft.todo_list.clone(),
            status: WorkLogStatus::initial(),
            reviewed_at: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    fn text_field(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "id" => Some(Cow::Borrowed(self.id.as_str())),
            "employee" => Some(Cow::Borrowed(&self.employee)),
            "employee_name" => self.employee_name.as_deref().map(Cow::Borrowed),
            "project" => Some(Cow::Borrowed(&self.project)),
            "status" => Some(Cow::Borrowed(self.status.as_str())),
            "first_half" => Some(Cow::Owned(self.first_half.join("\n"))),
            "second_half" => Some(Cow::Owned(self.second_half.join("\n"))),
            "todo_list" => Some(Cow::Owned(self.todo_list.join("\n"))),
            _ => None,
        }
    }

    fn list_field(&self, field: &str) -> Option<&[String]> {
        match field {
            "first_half" => Some(&self.first_half),
            "second_half" => Some(&self.second_half),
            "todo_list" => Some(&self.todo_list),
            _ => None,
        }
    }

    fn date_field(&self, field: &str) -> Option<NaiveDate> {
        match field {
            "date" => Some(self.date),
            "created_at" => self.created_at.map(|t| t.date_naive()),
            "reviewed_at" => self.reviewed_at.map(|t| t.date_naive()),
            _ => None,
        }
    }

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "date" => Some(SortValue::Date(self.date)),
            "project" => Some(SortValue::text(&self.project)),
            "employee" => Some(SortValue::text(&self.employee)),
            "employee_name" => self.employee_name.as_deref().map(SortValue::text),
            "status" => Some(SortValue::Number(self.status.rank())),
            "created_at" => self.created_at.map(SortValue::Timestamp),
            "updated_at" => self.updated_at.map(SortValue::Timestamp),
            "reviewed_at" => self.reviewed_at.map(SortValue::Timestamp),
            _ => None,
        }
    }
}

/// An employee account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Unique identifier
    #[serde(alias = "_id")]
    pub id: RecordId,
    /// Full name
    pub name: String,
    /// Sign-in email
    pub email: String,
    /// Department
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Job title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    /// Account status
    #[serde(default = "EmployeeStatus::initial")]
    pub status: EmployeeStatus,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Field edits for an employee
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePatch {
    /// New name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New department
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// New job title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
}

/// Input for creating an employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDraft {
    /// Full name
    pub name: String,
    /// Sign-in email
    pub email: String,
    /// Department
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Job title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
}

impl Record for Employee {
    type Status = EmployeeStatus;
    type Patch = EmployeePatch;
    type Draft = EmployeeDraft;

    const KIND: &'static str = "employee";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn status(&self) -> EmployeeStatus {
        self.status
    }

    fn set_status(&mut self, status: EmployeeStatus) {
        self.status = status;
    }

    fn apply_patch(&mut self, patch: &EmployeePatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(email) = &patch.email {
            self.email.clone_from(email);
        }
        // An empty string clears the field.
        if let Some(department) = &patch.department {
            self.department = (!department.is_empty()).then(|| department.clone());
        }
        if let Some(designation) = &patch.designation {
            self.designation = (!designation.is_empty()).then(|| designation.clone());
        }
    }

    fn from_draft(id: RecordId, draft: &EmployeeDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            email: draft.email.clone(),
            department: draft.department.clone(),
            designation: draft.designation.clone(),
            status: EmployeeStatus::initial(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    fn text_field(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "id" => Some(Cow::Borrowed(self.id.as_str())),
            "name" => Some(Cow::Borrowed(&self.name)),
            "email" => Some(Cow::Borrowed(&self.email)),
            "department" => self.department.as_deref().map(Cow::Borrowed),
            "designation" => self.designation.as_deref().map(Cow::Borrowed),
            "status" => Some(Cow::Borrowed(self.status.as_str())),
            _ => None,
        }
    }

    fn date_field(&self, field: &str) -> Option<NaiveDate> {
        match field {
            "created_at" => self.created_at.map(|t| t.date_naive()),
            _ => None,
        }
    }

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "name" => Some(SortValue::text(&self.name)),
            "email" => Some(SortValue::text(&self.email)),
            "department" => self.department.as_deref().map(SortValue::text),
            "status" => Some(SortValue::Number(self.status.rank())),
            "created_at" => self.created_at.map(SortValue::Timestamp),
            _ => None,
        }
    }
}
