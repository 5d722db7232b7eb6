//! In-memory gateway for tests and offline demos
//!
//! [`MockGateway`] behaves like the REST backend: it assigns ids on create,
//! stamps server-computed fields on status changes and applies bulk changes
//! all-or-nothing. Failures, latency and a pause gate can be injected to
//! exercise rollback and in-flight behavior.

use crate::gateway::{BulkOutcome, BulkStatusEndpoint, RecordEndpoint, StatusEndpoint};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use staffdesk_core::{
    Employee, Error, Record, RecordId, Result, Task, TaskStatus, WorkLog, WorkLogStatus,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// A request the mock received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// List fetch
    FetchAll {
        /// Entity kind
        kind: &'static str,
    },
    /// Create
    Create {
        /// Entity kind
        kind: &'static str,
    },
    /// Field update
    Update {
        /// Entity kind
        kind: &'static str,
        /// Target id
        id: RecordId,
    },
    /// Delete
    Delete {
        /// Entity kind
        kind: &'static str,
        /// Target id
        id: RecordId,
    },
    /// Single status change
    UpdateStatus {
        /// Entity kind
        kind: &'static str,
        /// Target id
        id: RecordId,
        /// Requested status
        status: String,
    },
    /// Bulk status change
    UpdateStatusBulk {
        /// Entity kind
        kind: &'static str,
        /// Target ids
        ids: Vec<RecordId>,
        /// Requested status
        status: String,
    },
}

#[derive(Debug, Clone)]
enum MockFailure {
    Network {
        status: Option<u16>,
        message: String,
    },
    Unauthorized,
}

impl MockFailure {
    fn to_error(&self) -> Error {
        match self {
            Self::Network { status, message } => Error::network(*status, message.clone()),
            Self::Unauthorized => Error::Unauthorized,
        }
    }
}

/// Mock REST backend for every entity kind
#[derive(Debug)]
pub struct MockGateway {
    tasks: Mutex<Vec<Task>>,
    worklogs: Mutex<Vec<WorkLog>>,
    employees: Mutex<Vec<Employee>>,
    failure: Mutex<Option<MockFailure>>,
    latency: Mutex<Duration>,
    gate: watch::Sender<bool>,
    calls: Mutex<Vec<MockCall>>,
    next_id: AtomicU64,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// Create an empty, healthy mock with no latency
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            tasks: Mutex::new(Vec::new()),
            worklogs: Mutex::new(Vec::new()),
            employees: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            latency: Mutex::new(Duration::ZERO),
            gate,
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Delay every response
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.lock() = latency;
        self
    }

    /// Add records to the server side
    pub fn seed<R: MockRecord>(&self, records: impl IntoIterator<Item = R>) {
        R::table(self).lock().extend(records);
    }

    /// Server-side copy of every record of one kind
    pub fn records<R: MockRecord>(&self) -> Vec<R> {
        R::table(self).lock().clone()
    }

    /// Fail every following call with a network error
    pub fn fail_with(&self, status: Option<u16>, message: impl Into<String>) {
        *self.failure.lock() = Some(MockFailure::Network {
            status,
            message: message.into(),
        });
    }

    /// Fail every following call as if the session token were rejected
    pub fn fail_unauthorized(&self) {
        *self.failure.lock() = Some(MockFailure::Unauthorized);
    }

    /// Stop injecting failures
    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    /// Hold every call until [`MockGateway::resume`]
    pub fn pause(&self) {
        self.gate.send_replace(false);
    }

    /// Release held calls
    pub fn resume(&self) {
        self.gate.send_replace(true);
    }

    /// Requests received so far, in arrival order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Forget recorded requests
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    async fn enter(&self, call: MockCall) -> Result<()> {
        debug!(?call, "Mock gateway request");
        self.calls.lock().push(call);

        let mut gate = self.gate.subscribe();
        gate.wait_for(|open| *open)
            .await
            .map(|_| ())
            .map_err(|_| Error::network(None, "Mock gateway closed"))?;

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let failure = self.failure.lock().clone();
        failure.map_or(Ok(()), |failure| Err(failure.to_error()))
    }

    fn next_id(&self, kind: &str) -> RecordId {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        RecordId::new(format!("{kind}-{n}"))
    }
}

fn missing(kind: &str, id: &RecordId) -> Error {
    Error::network(Some(404), format!("{kind} {id} not found"))
}

fn rejected(err: &Error) -> Error {
    Error::network(Some(400), err.user_message())
}

/// Records the mock can serve
pub trait MockRecord: Record {
    /// Server-side table for this kind
    fn table(gateway: &MockGateway) -> &Mutex<Vec<Self>>;

    /// Update server-computed fields after a status change
    fn stamp_status(&mut self, now: DateTime<Utc>);

    /// Update the modification time
    fn touch(&mut self, now: DateTime<Utc>);
}

impl MockRecord for Task {
    fn table(gateway: &MockGateway) -> &Mutex<Vec<Self>> {
        &gateway.tasks
    }

    fn stamp_status(&mut self, now: DateTime<Utc>) {
        self.completed_at = (self.status == TaskStatus::Completed).then_some(now);
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

impl MockRecord for WorkLog {
    fn table(gateway: &MockGateway) -> &Mutex<Vec<Self>> {
        &gateway.worklogs
    }

    fn stamp_status(&mut self, now: DateTime<Utc>) {
        self.reviewed_at = (self.status != WorkLogStatus::Pending).then_some(now);
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

impl MockRecord for Employee {
    fn table(gateway: &MockGateway) -> &Mutex<Vec<Self>> {
        &gateway.employees
    }

    fn stamp_status(&mut self, now: DateTime<Utc>) {
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

#[async_trait]
impl<R: MockRecord> RecordEndpoint<R> for MockGateway {
    async fn fetch_all(&self) -> Result<Vec<R>> {
        self.enter(MockCall::FetchAll { kind: R::KIND }).await?;
        Ok(self.records())
    }

    async fn create(&self, draft: &R::Draft) -> Result<R> {
        self.enter(MockCall::Create { kind: R::KIND }).await?;

        let record = R::from_draft(self.next_id(R::KIND), draft, Utc::now());
        record.check_invariants().map_err(|e| rejected(&e))?;
        R::table(self).lock().insert(0, record.clone());
        Ok(record)
    }

    async fn update(&self, id: &RecordId, patch: &R::Patch) -> Result<R> {
        self.enter(MockCall::Update {
            kind: R::KIND,
            id: id.clone(),
        })
        .await?;

        let mut table = R::table(self).lock();
        let record = table
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| missing(R::KIND, id))?;

        let mut patched = record.clone();
        patched.apply_patch(patch);
        patched.check_invariants().map_err(|e| rejected(&e))?;
        patched.touch(Utc::now());
        *record = patched.clone();
        Ok(patched)
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        self.enter(MockCall::Delete {
            kind: R::KIND,
            id: id.clone(),
        })
        .await?;

        let mut table = R::table(self).lock();
        let position = table
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| missing(R::KIND, id))?;
        table.remove(position);
        Ok(())
    }
}

#[async_trait]
impl<R: MockRecord> StatusEndpoint<R> for MockGateway {
    async fn update_status(&self, id: &RecordId, status: R::Status) -> Result<R> {
        self.enter(MockCall::UpdateStatus {
            kind: R::KIND,
            id: id.clone(),
            status: status.to_string(),
        })
        .await?;

        let mut table = R::table(self).lock();
        let record = table
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| missing(R::KIND, id))?;
        record.set_status(status);
        record.stamp_status(Utc::now());
        Ok(record.clone())
    }
}

#[async_trait]
impl<R: MockRecord> BulkStatusEndpoint<R> for MockGateway {
    async fn update_status_bulk(
        &self,
        ids: &[RecordId],
        status: R::Status,
    ) -> Result<BulkOutcome<R>> {
        self.enter(MockCall::UpdateStatusBulk {
            kind: R::KIND,
            ids: ids.to_vec(),
            status: status.to_string(),
        })
        .await?;

        let mut table = R::table(self).lock();
        if let Some(absent) = ids.iter().find(|id| !table.iter().any(|r| r.id() == *id)) {
            return Err(missing(R::KIND, absent));
        }

        let now = Utc::now();
        let mut updated = Vec::with_capacity(ids.len());
        let mut modified = 0;
        for record in table.iter_mut().filter(|r| ids.contains(r.id())) {
            if record.status() != status {
                modified += 1;
            }
            record.set_status(status);
            record.stamp_status(now);
            updated.push(record.clone());
        }

        Ok(BulkOutcome {
            matched_count: Some(updated.len() as u64),
            modified_count: Some(modified),
            records: updated,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::testing::{task, worklog};
    use pretty_assertions::assert_eq;
    use staffdesk_core::{TaskDraft, TaskPriority};

    #[tokio::test]
    async fn test_create_assigns_server_id_and_prepends() {
        let gateway = MockGateway::new();
        gateway.seed(vec![task("t0", TaskStatus::Pending)]);

        let draft = TaskDraft {
            title: "Quarterly report".to_string(),
            description: None,
            assigned_to: vec!["emp-2".to_string()],
            due_date: crate::testing::fixture_date(),
            priority: TaskPriority::High,
        };
        let created: Task = gateway.create(&draft).await.unwrap();

        assert_eq!(created.id.as_str(), "task-1");
        assert_eq!(created.status, TaskStatus::Pending);
        let ids: Vec<String> = gateway
            .records::<Task>()
            .iter()
            .map(|t| t.id.to_string())
            .collect();
        assert_eq!(ids, vec!["task-1", "t0"]);
    }

    #[tokio::test]
    async fn test_completed_task_gets_completion_time() {
        let gateway = MockGateway::new();
        gateway.seed(vec![task("t1", TaskStatus::InProgress)]);

        let done: Task = gateway
            .update_status(&"t1".into(), TaskStatus::Completed)
            .await
            .unwrap();
        assert!(done.completed_at.is_some());

        let reopened: Task = gateway
            .update_status(&"t1".into(), TaskStatus::Pending)
            .await
            .unwrap();
        assert!(reopened.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_bulk_is_all_or_nothing() {
        let gateway = MockGateway::new();
        gateway.seed(vec![worklog("1", WorkLogStatus::Pending)]);

        let result: Result<BulkOutcome<WorkLog>> = gateway
            .update_status_bulk(&["1".into(), "2".into()], WorkLogStatus::Approved)
            .await;

        assert!(matches!(result, Err(Error::Network { status: Some(404), .. })));
        assert_eq!(
            gateway.records::<WorkLog>()[0].status,
            WorkLogStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_bulk_counts_matched_and_modified() {
        let gateway = MockGateway::new();
        gateway.seed(vec![
            worklog("1", WorkLogStatus::Pending),
            worklog("2", WorkLogStatus::Approved),
        ]);

        let outcome: BulkOutcome<WorkLog> = gateway
            .update_status_bulk(&["1".into(), "2".into()], WorkLogStatus::Approved)
            .await
            .unwrap();

        assert_eq!(outcome.matched_count, Some(2));
        assert_eq!(outcome.modified_count, Some(1));
        assert!(outcome.records.iter().all(|w| w.reviewed_at.is_some()));
    }

    #[tokio::test]
    async fn test_injected_failures_and_recovery() {
        let gateway = MockGateway::new();
        gateway.seed(vec![worklog("1", WorkLogStatus::Pending)]);

        gateway.fail_unauthorized();
        let result: Result<Vec<WorkLog>> = gateway.fetch_all().await;
        assert!(matches!(result, Err(Error::Unauthorized)));

        gateway.recover();
        let logs: Vec<WorkLog> = gateway.fetch_all().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(gateway.calls().len(), 2);
    }
}
