//! Create/edit forms and their submission flow
//!
//! Form values are plain strings and lists as typed by the user. Each form
//! validates with `validator`, reports the first failing field in display
//! order, and converts into the entity's draft or patch only once valid.

use crate::gateway::RecordEndpoint;
use crate::store::StoreHandle;
use chrono::{NaiveDate, Utc};
use staffdesk_core::utils::{is_blank, looks_like_email, parse_date};
use staffdesk_core::{
    Employee, EmployeeDraft, EmployeePatch, Error, Record, RecordId, Result, Task, TaskDraft,
    TaskPatch, TaskPriority, WorkLog, WorkLogDraft, WorkLogPatch,
};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

/// Form values for one entity kind
pub trait FormModel: Validate + Default + Clone + fmt::Debug + Send + Sync {
    /// Entity the form creates and edits
    type Record: Record;

    /// Fields in display order; the first failing one is reported
    const FIELD_ORDER: &'static [&'static str];

    /// Pre-fill from an existing record
    fn from_record(record: &Self::Record) -> Self;

    /// Build the create payload from valid values
    fn to_draft(&self) -> Result<<Self::Record as Record>::Draft>;

    /// Build the edit payload from valid values
    fn to_patch(&self) -> Result<<Self::Record as Record>::Patch>;

    /// Validate, reducing any failure to the first field in display order
    fn check(&self) -> Result<()> {
        first_error(self.validate(), Self::FIELD_ORDER)
    }
}

fn first_error(
    outcome: std::result::Result<(), ValidationErrors>,
    order: &[&str],
) -> Result<()> {
    let Err(errors) = outcome else {
        return Ok(());
    };

    let fields = errors.field_errors();
    for field in order {
        if let Some(first) = fields.get(*field).and_then(|errs| errs.first()) {
            let message = first
                .message
                .as_ref()
                .map_or_else(|| format!("{field} is invalid"), ToString::to_string);
            return Err(Error::validation(*field, message));
        }
    }
    Err(Error::validation("form", errors.to_string()))
}

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

fn optional_text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn entries(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn required_date(field: &'static str, value: &str) -> Result<NaiveDate> {
    parse_date(value).ok_or_else(|| Error::validation(field, format!("{field} is not a valid date")))
}

fn title_present(value: &str) -> std::result::Result<(), ValidationError> {
    if is_blank(value) {
        return Err(rule("required", "Title is required"));
    }
    Ok(())
}

fn due_date_valid(value: &str) -> std::result::Result<(), ValidationError> {
    if is_blank(value) {
        return Err(rule("required", "Due date is required"));
    }
    if parse_date(value).is_none() {
        return Err(rule("date", "Due date is not a valid date"));
    }
    Ok(())
}

fn log_date_valid(value: &str) -> std::result::Result<(), ValidationError> {
    if is_blank(value) {
        return Err(rule("required", "Date is required"));
    }
    if parse_date(value).is_none() {
        return Err(rule("date", "Date is not a valid date"));
    }
    Ok(())
}

fn project_present(value: &str) -> std::result::Result<(), ValidationError> {
    if is_blank(value) {
        return Err(rule("required", "Project is required"));
    }
    Ok(())
}

fn assignee_selected(values: &[String]) -> std::result::Result<(), ValidationError> {
    if values.iter().all(|v| is_blank(v)) {
        return Err(rule("required", "Select at least one assignee"));
    }
    Ok(())
}

fn has_entry(values: &[String]) -> std::result::Result<(), ValidationError> {
    if values.iter().all(|v| is_blank(v)) {
        return Err(rule("required", "Add at least one first-half entry"));
    }
    Ok(())
}

fn name_present(value: &str) -> std::result::Result<(), ValidationError> {
    if is_blank(value) {
        return Err(rule("required", "Name is required"));
    }
    Ok(())
}

fn email_valid(value: &str) -> std::result::Result<(), ValidationError> {
    if is_blank(value) {
        return Err(rule("required", "Email is required"));
    }
    if !looks_like_email(value) {
        return Err(rule("email", "Enter a valid email address"));
    }
    Ok(())
}

/// Task create/edit form
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct TaskForm {
    /// Title
    #[validate(custom(function = "title_present"))]
    pub title: String,

    /// Description
    pub description: String,

    /// Selected assignee ids
    #[validate(custom(function = "assignee_selected"))]
    pub assigned_to: Vec<String>,

    /// Due date as typed
    #[validate(custom(function = "due_date_valid"))]
    pub due_date: String,

    /// Priority
    pub priority: TaskPriority,
}

impl FormModel for TaskForm {
    type Record = Task;

    const FIELD_ORDER: &'static [&'static str] = &["title", "assigned_to", "due_date"];

    fn from_record(record: &Task) -> Self {
        Self {
            title: record.title.clone(),
            description: record.description.clone().unwrap_or_default(),
            assigned_to: record.assigned_to.clone(),
            due_date: record.due_date.format("%Y-%m-%d").to_string(),
            priority: record.priority,
        }
    }

    fn to_draft(&self) -> Result<TaskDraft> {
        Ok(TaskDraft {
            title: self.title.trim().to_string(),
            description: optional_text(&self.description),
            assigned_to: entries(&self.assigned_to),
            due_date: required_date("due_date", &self.due_date)?,
            priority: self.priority,
        })
    }

    fn to_patch(&self) -> Result<TaskPatch> {
        let draft = self.to_draft()?;
        Ok(TaskPatch {
            title: Some(draft.title),
            description: Some(draft.description.unwrap_or_default()),
            assigned_to: Some(draft.assigned_to),
            due_date: Some(draft.due_date),
            priority: Some(draft.priority),
        })
    }
}

/// Work log create/edit form
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct WorkLogForm {
    /// Day covered, as typed; ignored when editing
    #[validate(custom(function = "log_date_valid"))]
    pub date: String,

    /// Project
    #[validate(custom(function = "project_present"))]
    pub project: String,

    /// Morning entries
    #[validate(custom(function = "has_entry"))]
    pub first_half: Vec<String>,

    /// Afternoon entries
    pub second_half: Vec<String>,

    /// Planned follow-ups
    pub todo_list: Vec<String>,
}

impl FormModel for WorkLogForm {
    type Record = WorkLog;

    const FIELD_ORDER: &'static [&'static str] = &["date", "project", "first_half"];

    fn from_record(record: &WorkLog) -> Self {
        Self {
            date: record.date.format("%Y-%m-%d").to_string(),
            project: record.project.clone(),
            first_half: record.first_half.clone(),
            second_half: record.second_half.clone(),
            todo_list: record.todo_list.clone(),
        }
    }

    fn to_draft(&self) -> Result<WorkLogDraft> {
        Ok(WorkLogDraft {
            date: required_date("date", &self.date)?,
            project: self.project.trim().to_string(),
            first_half: entries(&self.first_half),
            second_half: entries(&self.second_half),
            todo_list: entries(&self.todo_list),
        })
    }

    // The date is fixed once a log exists.
    fn to_patch(&self) -> Result<WorkLogPatch> {
        Ok(WorkLogPatch {
            project: Some(self.project.trim().to_string()),
            first_half: Some(entries(&self.first_half)),
            second_half: Some(entries(&self.second_half)),
            todo_list: Some(entries(&self.todo_list)),
        })
    }
}

/// Employee create/edit form
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct EmployeeForm {
    /// Full name
    #[validate(custom(function = "name_present"))]
    pub name: String,

    /// Sign-in email
    #[validate(custom(function = "email_valid"))]
    pub email: String,

    /// Department
    pub department: String,

    /// Job title
    pub designation: String,
}

impl FormModel for EmployeeForm {
    type Record = Employee;

    const FIELD_ORDER: &'static [&'static str] = &["name", "email"];

    fn from_record(record: &Employee) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            department: record.department.clone().unwrap_or_default(),
            designation: record.designation.clone().unwrap_or_default(),
        }
    }

    fn to_draft(&self) -> Result<EmployeeDraft> {
        Ok(EmployeeDraft {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            department: optional_text(&self.department),
            designation: optional_text(&self.designation),
        })
    }

    fn to_patch(&self) -> Result<EmployeePatch> {
        Ok(EmployeePatch {
            name: Some(self.name.trim().to_string()),
            email: Some(self.email.trim().to_string()),
            department: Some(self.department.trim().to_string()),
            designation: Some(self.designation.trim().to_string()),
        })
    }
}

/// Whether the form creates a record or edits an existing one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormMode {
    /// New record
    #[default]
    Create,
    /// Existing record
    Edit(RecordId),
}

/// Modal form state and submission
///
/// Validation failures and remote failures both leave the form open with the
/// message in [`FormController::error`]. A successful submit closes and
/// resets it.
#[derive(Debug)]
pub struct FormController<F: FormModel, G> {
    store: StoreHandle<F::Record>,
    gateway: Arc<G>,
    values: F,
    mode: FormMode,
    open: bool,
    error: Option<String>,
    submitting: bool,
}

impl<F: FormModel, G> FormController<F, G> {
    /// Closed form over a shared store
    pub fn new(store: StoreHandle<F::Record>, gateway: Arc<G>) -> Self {
        Self {
            store,
            gateway,
            values: F::default(),
            mode: FormMode::Create,
            open: false,
            error: None,
            submitting: false,
        }
    }

    /// Open with empty values for a new record
    pub fn open_create(&mut self) {
        self.reset();
        self.open = true;
    }

    /// Open pre-filled from an existing record
    pub fn open_edit(&mut self, id: &RecordId) -> Result<()> {
        let record = self
            .store
            .get(id)
            .ok_or_else(|| Error::not_found(<F::Record as Record>::KIND, id))?;
        self.reset();
        self.values = F::from_record(&record);
        self.mode = FormMode::Edit(id.clone());
        self.open = true;
        Ok(())
    }

    /// Close and discard values
    pub fn close(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.values = F::default();
        self.mode = FormMode::Create;
        self.open = false;
        self.error = None;
        self.submitting = false;
    }

    /// Current values
    pub fn values(&self) -> &F {
        &self.values
    }

    /// Values for editing
    pub fn values_mut(&mut self) -> &mut F {
        &mut self.values
    }

    /// Create or edit
    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    /// Whether the modal is shown
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Inline error from the last submit
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a submit is awaiting the server
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    // Validate, then build a payload; any failure is shown inline.
    fn prepare<T>(&mut self, build: impl FnOnce(&F) -> Result<T>) -> Result<T> {
        let prepared = self.values.check().and_then(|()| build(&self.values));
        if let Err(err) = &prepared {
            debug!(kind = <F::Record as Record>::KIND, error = %err, "Form rejected");
            self.error = Some(err.user_message());
        }
        prepared
    }

    fn finish(&mut self, outcome: Result<F::Record>) -> Result<F::Record> {
        self.submitting = false;
        match &outcome {
            Ok(record) => {
                info!(kind = <F::Record as Record>::KIND, id = %record.id(), "Form submitted");
                self.reset();
            }
            Err(err) => {
                warn!(kind = <F::Record as Record>::KIND, error = %err, "Form submission failed");
                self.error = Some(err.user_message());
            }
        }
        outcome
    }

    /// Validate and send to the server, then update the store
    ///
    /// Create prepends the server's record. Edit merges the patch and then
    /// takes the server's copy.
    pub async fn submit(&mut self) -> Result<F::Record>
    where
        G: RecordEndpoint<F::Record>,
    {
        let outcome = match self.mode.clone() {
            FormMode::Create => {
                let draft = self.prepare(F::to_draft)?;
                self.submitting = true;
                self.error = None;
                self.gateway.create(&draft).await.and_then(|created| {
                    let mut store = self.store.write();
                    if store.contains(created.id()) {
                        store.reconcile(created.clone());
                    } else {
                        store.insert_front(created.clone())?;
                    }
                    Ok(created)
                })
            }
            FormMode::Edit(id) => {
                let patch = self.prepare(F::to_patch)?;
                self.submitting = true;
                self.error = None;
                self.gateway.update(&id, &patch).await.and_then(|confirmed| {
                    let mut store = self.store.write();
                    match store.update_by_id(&id, &patch) {
                        Ok(_) => {
                            store.reconcile(confirmed.clone());
                        }
                        Err(Error::NotFound { .. }) => {
                            debug!(kind = <F::Record as Record>::KIND, %id, "Edited record no longer present");
                        }
                        Err(err) => return Err(err),
                    }
                    Ok(confirmed)
                })
            }
        };
        self.finish(outcome)
    }

    /// Create with a temporary placeholder shown until the server answers
    ///
    /// The placeholder is swapped for the server's record in place, or
    /// removed on failure. Edit mode falls back to [`FormController::submit`].
    pub async fn submit_optimistic(&mut self) -> Result<F::Record>
    where
        G: RecordEndpoint<F::Record>,
    {
        if matches!(self.mode, FormMode::Edit(_)) {
            return self.submit().await;
        }

        let draft = self.prepare(F::to_draft)?;
        let placeholder = <F::Record as Record>::from_draft(RecordId::temporary(), &draft, Utc::now());
        let temp_id = placeholder.id().clone();
        let inserted = self.store.write().insert_front(placeholder);
        if let Err(err) = inserted {
            self.error = Some(err.user_message());
            return Err(err);
        }
        debug!(kind = <F::Record as Record>::KIND, id = %temp_id, "Placeholder inserted");

        self.submitting = true;
        self.error = None;
        let outcome = match self.gateway.create(&draft).await {
            Ok(confirmed) => {
                let mut store = self.store.write();
                match store.rekey(&temp_id, confirmed.clone()) {
                    Ok(()) => {}
                    Err(Error::DuplicateId { .. }) => {
                        store.remove_by_id(&temp_id).ok();
                        store.reconcile(confirmed.clone());
                    }
                    Err(_) => {
                        debug!(kind = <F::Record as Record>::KIND, id = %temp_id, "Placeholder removed before confirmation");
                    }
                }
                Ok(confirmed)
            }
            Err(err) => {
                if self.store.write().remove_by_id(&temp_id).is_err() {
                    debug!(kind = <F::Record as Record>::KIND, id = %temp_id, "Placeholder already gone");
                }
                Err(err)
            }
        };
        self.finish(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock::MockGateway;
    use crate::testing::{task, worklog};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use staffdesk_core::{TaskStatus, WorkLogStatus};

    fn valid_task_form() -> TaskForm {
        TaskForm {
            title: "Prepare onboarding pack".to_string(),
            description: String::new(),
            assigned_to: vec!["emp-1".to_string()],
            due_date: "2024-04-01".to_string(),
            priority: TaskPriority::High,
        }
    }

    fn field_of(err: &Error) -> &str {
        match err {
            Error::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_task_form_passes() {
        assert!(valid_task_form().check().is_ok());
    }

    #[test]
    fn test_first_failing_field_wins() {
        let form = TaskForm::default();
        let err = form.check().unwrap_err();
        assert_eq!(field_of(&err), "title");
        assert_eq!(err.user_message(), "Title is required");

        let form = TaskForm {
            title: "Has a title".to_string(),
            ..TaskForm::default()
        };
        let err = form.check().unwrap_err();
        assert_eq!(field_of(&err), "assigned_to");
        assert_eq!(err.user_message(), "Select at least one assignee");
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec!["  ".to_string()])]
    #[case(vec![String::new(), "\t".to_string()])]
    fn test_blank_assignees_are_rejected(#[case] assigned_to: Vec<String>) {
        let form = TaskForm {
            assigned_to,
            ..valid_task_form()
        };
        let err = form.check().unwrap_err();
        assert_eq!(field_of(&err), "assigned_to");
        assert_eq!(err.user_message(), "Select at least one assignee");
    }

    #[tokio::test]
    async fn test_blank_assignee_never_reaches_the_gateway() {
        let store = StoreHandle::<Task>::default();
        let gateway = Arc::new(MockGateway::new());
        let mut form = FormController::<TaskForm, _>::new(store.clone(), Arc::clone(&gateway));
        form.open_create();
        *form.values_mut() = TaskForm {
            assigned_to: vec!["   ".to_string()],
            ..valid_task_form()
        };

        let err = form.submit().await.unwrap_err();

        assert_eq!(field_of(&err), "assigned_to");
        assert!(gateway.calls().is_empty());
        assert!(store.is_empty());
        assert!(form.is_open());
    }

    #[test]
    fn test_employee_patch_can_clear_department() {
        let form = EmployeeForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            department: "   ".to_string(),
            designation: "Engineer".to_string(),
        };
        let patch = form.to_patch().unwrap();

        assert_eq!(patch.department.as_deref(), Some(""));
        assert_eq!(patch.designation.as_deref(), Some("Engineer"));
    }

    #[rstest]
    #[case("", "Due date is required")]
    #[case("   ", "Due date is required")]
    #[case("31/31/2024", "Due date is not a valid date")]
    #[case("next tuesday", "Due date is not a valid date")]
    fn test_due_date_rules(#[case] due_date: &str, #[case] message: &str) {
        let form = TaskForm {
            due_date: due_date.to_string(),
            ..valid_task_form()
        };
        let err = form.check().unwrap_err();
        assert_eq!(field_of(&err), "due_date");
        assert_eq!(err.user_message(), message);
    }

    #[test]
    fn test_task_draft_trims_and_parses() {
        let form = TaskForm {
            title: "  Audit  ".to_string(),
            description: "   ".to_string(),
            due_date: "04/01/2024".to_string(),
            ..valid_task_form()
        };
        let draft = form.to_draft().unwrap();

        assert_eq!(draft.title, "Audit");
        assert_eq!(draft.description, None);
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    }

    #[test]
    fn test_worklog_form_rules_in_order() {
        let err = WorkLogForm::default().check().unwrap_err();
        assert_eq!(field_of(&err), "date");

        let form = WorkLogForm {
            date: "2024-03-15".to_string(),
            project: "Payroll".to_string(),
            first_half: vec!["  ".to_string()],
            ..WorkLogForm::default()
        };
        let err = form.check().unwrap_err();
        assert_eq!(field_of(&err), "first_half");
    }

    #[test]
    fn test_employee_email_rules() {
        let form = EmployeeForm {
            name: "Ada".to_string(),
            email: "ada.example.com".to_string(),
            ..EmployeeForm::default()
        };
        let err = form.check().unwrap_err();
        assert_eq!(field_of(&err), "email");
        assert_eq!(err.user_message(), "Enter a valid email address");
    }

    #[tokio::test]
    async fn test_invalid_submit_keeps_form_open_and_store_untouched() {
        let store = StoreHandle::<Task>::default();
        let gateway = Arc::new(MockGateway::new());
        let mut form = FormController::<TaskForm, _>::new(store.clone(), Arc::clone(&gateway));
        form.open_create();
        form.values_mut().title = "No assignee".to_string();

        let result = form.submit().await;

        assert!(result.is_err());
        assert!(form.is_open());
        assert_eq!(form.error(), Some("Select at least one assignee"));
        assert!(store.is_empty());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_prepends_and_resets() {
        let store = StoreHandle::with_records(vec![task("t0", TaskStatus::Pending)]);
        let gateway = Arc::new(MockGateway::new());
        let mut form = FormController::<TaskForm, _>::new(store.clone(), gateway);
        form.open_create();
        *form.values_mut() = valid_task_form();

        let created = form.submit().await.unwrap();

        assert_eq!(store.read().ids().first(), Some(&created.id));
        assert_eq!(store.len(), 2);
        assert!(!form.is_open());
        assert_eq!(form.values(), &TaskForm::default());
    }

    #[tokio::test]
    async fn test_edit_submit_reconciles() {
        let original = worklog("w1", WorkLogStatus::Pending);
        let store = StoreHandle::with_records(vec![original.clone()]);
        let gateway = Arc::new(MockGateway::new());
        gateway.seed(vec![original]);
        let mut form = FormController::<WorkLogForm, _>::new(store.clone(), gateway);

        form.open_edit(&"w1".into()).unwrap();
        assert_eq!(form.mode(), &FormMode::Edit("w1".into()));
        form.values_mut().project = "Billing".to_string();

        let confirmed = form.submit().await.unwrap();

        assert_eq!(confirmed.project, "Billing");
        assert_eq!(store.get(&"w1".into()), Some(confirmed));
    }

    #[tokio::test]
    async fn test_remote_failure_shows_inline_error() {
        let store = StoreHandle::<Task>::default();
        let gateway = Arc::new(MockGateway::new());
        gateway.fail_with(Some(500), "Server unavailable");
        let mut form = FormController::<TaskForm, _>::new(store.clone(), gateway);
        form.open_create();
        *form.values_mut() = valid_task_form();

        let result = form.submit().await;

        assert!(result.is_err());
        assert!(form.is_open());
        assert!(!form.is_submitting());
        assert_eq!(form.error(), Some("Server unavailable"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_optimistic_create_failure_removes_placeholder() {
        let store = StoreHandle::with_records(vec![task("t0", TaskStatus::Pending)]);
        let gateway = Arc::new(MockGateway::new());
        gateway.fail_with(Some(503), "Try again later");
        let mut form = FormController::<TaskForm, _>::new(store.clone(), gateway);
        form.open_create();
        *form.values_mut() = valid_task_form();

        assert!(form.submit_optimistic().await.is_err());
        assert_eq!(store.read().ids(), vec![RecordId::from("t0")]);
    }

    #[tokio::test]
    async fn test_optimistic_create_swaps_placeholder() {
        let store = StoreHandle::with_records(vec![task("t0", TaskStatus::Pending)]);
        let gateway = Arc::new(MockGateway::new());
        let mut form = FormController::<TaskForm, _>::new(store.clone(), gateway);
        form.open_create();
        *form.values_mut() = valid_task_form();

        let created = form.submit_optimistic().await.unwrap();

        let ids = store.read().ids();
        assert_eq!(ids, vec![created.id.clone(), RecordId::from("t0")]);
        assert!(ids.iter().all(|id| !id.is_temporary()));
    }
}
