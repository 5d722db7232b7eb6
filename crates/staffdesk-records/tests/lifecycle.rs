//! End-to-end record lifecycle against the mock gateway

#![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

mod common;

use common::{init_test_logging, wait_for_calls};
use pretty_assertions::assert_eq;
use staffdesk_core::{Error, RecordId, Task, TaskStatus, WorkLog, WorkLogStatus};
use staffdesk_records::testing::{task, worklog};
use staffdesk_records::{Collection, MockCall, MockGateway, Predicate, ViewQuery, WorkLogForm};
use std::sync::Arc;

fn worklogs(records: Vec<WorkLog>) -> (Collection<WorkLog, MockGateway>, Arc<MockGateway>) {
    let gateway = Arc::new(MockGateway::new());
    gateway.seed(records.clone());
    let collection = Collection::new(Arc::clone(&gateway));
    collection.store().write().replace_all(records);
    (collection, gateway)
}

fn statuses(collection: &Collection<WorkLog, MockGateway>) -> Vec<(String, WorkLogStatus)> {
    collection
        .store()
        .snapshot()
        .into_iter()
        .map(|w| (w.id.to_string(), w.status))
        .collect()
}

#[tokio::test]
async fn test_approve_succeeds_remotely() {
    init_test_logging();
    let (logs, _gateway) = worklogs(vec![
        worklog("1", WorkLogStatus::Pending),
        worklog("2", WorkLogStatus::Approved),
    ]);

    logs.transition(&"1".into(), WorkLogStatus::Approved)
        .await
        .unwrap();

    assert_eq!(
        statuses(&logs),
        vec![
            ("1".to_string(), WorkLogStatus::Approved),
            ("2".to_string(), WorkLogStatus::Approved),
        ]
    );
}

#[tokio::test]
async fn test_approve_fails_remotely_and_rolls_back() {
    init_test_logging();
    let (logs, gateway) = worklogs(vec![
        worklog("1", WorkLogStatus::Pending),
        worklog("2", WorkLogStatus::Approved),
    ]);
    let before = logs.store().snapshot();
    gateway.fail_with(Some(500), "Internal server error");

    let err = logs
        .transition(&"1".into(), WorkLogStatus::Approved)
        .await
        .unwrap_err();

    match &err {
        Error::TransitionFailed { id, .. } => assert_eq!(id.as_str(), "1"),
        other => panic!("expected TransitionFailed, got {other:?}"),
    }
    assert_eq!(logs.store().snapshot(), before);
    assert!(err.user_message().contains("Internal server error"));
}

#[tokio::test]
async fn test_filter_twelve_records_three_match() {
    let records: Vec<WorkLog> = (1..=12)
        .map(|i| {
            let mut log = worklog(&i.to_string(), WorkLogStatus::Pending);
            match i {
                1..=3 => log.project = format!("Invoice reconciliation {i}"),
                4 | 5 => {
                    log.project = "Invoice archive".to_string();
                    log.status = WorkLogStatus::Approved;
                }
                6 => log.status = WorkLogStatus::Rejected,
                _ => log.project = "Payroll".to_string(),
            }
            log
        })
        .collect();
    let (logs, _gateway) = worklogs(records);

    let page = logs
        .view(
            &ViewQuery::new(10)
                .filter(Predicate::Status(WorkLogStatus::Pending))
                .filter(Predicate::search("invoice", &["project", "first_half"])),
        )
        .unwrap();

    assert_eq!(page.total_count, 3);
    assert_eq!(page.total_pages, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_optimistic_value_visible_while_pending_and_second_request_conflicts() {
    init_test_logging();
    let gateway = Arc::new(MockGateway::new());
    gateway.seed(vec![task("t1", TaskStatus::Pending)]);
    let tasks: Collection<Task, MockGateway> = Collection::new(Arc::clone(&gateway));
    tasks.load().await.unwrap();
    gateway.clear_calls();
    gateway.pause();

    let pending = {
        let tasks = tasks.clone();
        tokio::spawn(async move {
            tasks
                .transition(&RecordId::from("t1"), TaskStatus::InProgress)
                .await
        })
    };
    wait_for_calls(&gateway, 1).await;

    assert_eq!(
        tasks.get(&"t1".into()).unwrap().status,
        TaskStatus::InProgress
    );
    assert!(tasks.engine().is_in_flight(&"t1".into()));

    let err = tasks
        .transition(&"t1".into(), TaskStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));
    assert_eq!(
        tasks.get(&"t1".into()).unwrap().status,
        TaskStatus::InProgress
    );
    assert_eq!(gateway.calls().len(), 1);

    gateway.resume();
    let confirmed = pending.await.unwrap().unwrap();

    assert_eq!(confirmed.status, TaskStatus::InProgress);
    assert_eq!(tasks.get(&"t1".into()).unwrap(), confirmed);
    assert!(!tasks.engine().is_in_flight(&"t1".into()));
}

#[tokio::test]
async fn test_bulk_approve_all_or_nothing() {
    init_test_logging();
    let ids: Vec<RecordId> = ["1", "2", "3"].into_iter().map(RecordId::from).collect();

    let (logs, _gateway) = worklogs(vec![
        worklog("1", WorkLogStatus::Pending),
        worklog("2", WorkLogStatus::Rejected),
        worklog("3", WorkLogStatus::Pending),
        worklog("4", WorkLogStatus::Pending),
    ]);
    let updated = logs
        .bulk_transition(&ids, WorkLogStatus::Approved)
        .await
        .unwrap();
    assert_eq!(updated.len(), 3);
    assert!(updated.iter().all(|w| w.status == WorkLogStatus::Approved));
    assert!(updated.iter().all(|w| w.reviewed_at.is_some()));
    assert_eq!(
        logs.get(&"4".into()).unwrap().status,
        WorkLogStatus::Pending
    );

    let (logs, gateway) = worklogs(vec![
        worklog("1", WorkLogStatus::Pending),
        worklog("2", WorkLogStatus::Rejected),
        worklog("3", WorkLogStatus::Pending),
    ]);
    let before = logs.store().snapshot();
    gateway.fail_with(Some(502), "Bad gateway");

    let err = logs
        .bulk_transition(&ids, WorkLogStatus::Approved)
        .await
        .unwrap_err();

    match &err {
        Error::BulkTransitionFailed { ids: failed, .. } => assert_eq!(failed, &ids),
        other => panic!("expected BulkTransitionFailed, got {other:?}"),
    }
    assert_eq!(logs.store().snapshot(), before);
    assert_eq!(
        err.user_message(),
        "Could not update 3 selected records: Bad gateway"
    );
}

#[tokio::test]
async fn test_bulk_sends_deduplicated_ids_in_one_call() {
    let (logs, gateway) = worklogs(vec![
        worklog("1", WorkLogStatus::Pending),
        worklog("2", WorkLogStatus::Pending),
    ]);

    logs.bulk_transition(
        &["2".into(), "1".into(), "2".into()],
        WorkLogStatus::Rejected,
    )
    .await
    .unwrap();

    assert_eq!(
        gateway.calls(),
        vec![MockCall::UpdateStatusBulk {
            kind: "worklog",
            ids: vec!["2".into(), "1".into()],
            status: "rejected".to_string(),
        }]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bulk_conflicts_with_pending_single_transition() {
    let (logs, gateway) = worklogs(vec![
        worklog("1", WorkLogStatus::Pending),
        worklog("2", WorkLogStatus::Pending),
    ]);
    gateway.pause();

    let pending = {
        let logs = logs.clone();
        tokio::spawn(async move {
            logs.transition(&RecordId::from("2"), WorkLogStatus::Rejected)
                .await
        })
    };
    wait_for_calls(&gateway, 1).await;

    let err = logs
        .bulk_transition(&["1".into(), "2".into()], WorkLogStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { ref id } if id.as_str() == "2"));
    assert_eq!(
        logs.get(&"1".into()).unwrap().status,
        WorkLogStatus::Pending
    );
    assert!(!logs.engine().is_in_flight(&"1".into()));

    gateway.resume();
    pending.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bulk_optimistic_values_visible_then_restored_on_failure() {
    init_test_logging();
    let (logs, gateway) = worklogs(vec![
        worklog("1", WorkLogStatus::Pending),
        worklog("2", WorkLogStatus::Rejected),
        worklog("3", WorkLogStatus::Pending),
        worklog("4", WorkLogStatus::Pending),
    ]);
    let before = logs.store().snapshot();
    let ids: Vec<RecordId> = ["1", "2", "3"].into_iter().map(RecordId::from).collect();
    gateway.pause();

    let pending = {
        let logs = logs.clone();
        let ids = ids.clone();
        tokio::spawn(async move { logs.bulk_transition(&ids, WorkLogStatus::Approved).await })
    };
    wait_for_calls(&gateway, 1).await;

    for id in &ids {
        assert_eq!(logs.get(id).unwrap().status, WorkLogStatus::Approved);
        assert!(logs.engine().is_in_flight(id));
    }
    assert_eq!(
        logs.get(&"4".into()).unwrap().status,
        WorkLogStatus::Pending
    );
    assert!(!logs.engine().is_in_flight(&"4".into()));

    gateway.fail_with(Some(500), "Internal server error");
    gateway.resume();
    let err = pending.await.unwrap().unwrap_err();

    assert!(matches!(err, Error::BulkTransitionFailed { .. }));
    assert_eq!(logs.store().snapshot(), before);
    assert!(ids.iter().all(|id| !logs.engine().is_in_flight(id)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_response_for_deleted_record_is_ignored() {
    let (logs, gateway) = worklogs(vec![worklog("1", WorkLogStatus::Pending)]);
    gateway.pause();

    let pending = {
        let logs = logs.clone();
        tokio::spawn(async move {
            logs.transition(&RecordId::from("1"), WorkLogStatus::Approved)
                .await
        })
    };
    wait_for_calls(&gateway, 1).await;

    logs.store().write().remove_by_id(&"1".into()).unwrap();
    gateway.resume();
    pending.await.unwrap().unwrap();

    assert!(logs.store().is_empty());
}

#[tokio::test]
async fn test_unauthorized_rolls_back_like_any_failure() {
    let (logs, gateway) = worklogs(vec![worklog("1", WorkLogStatus::Pending)]);
    gateway.fail_unauthorized();

    let err = logs
        .transition(&"1".into(), WorkLogStatus::Rejected)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::TransitionFailed { ref source, .. } if matches!(**source, Error::Unauthorized)
    ));
    assert_eq!(
        logs.get(&"1".into()).unwrap().status,
        WorkLogStatus::Pending
    );
}

#[tokio::test]
async fn test_worklog_form_create_then_review() {
    init_test_logging();
    let (logs, _gateway) = worklogs(vec![worklog("1", WorkLogStatus::Approved)]);

    let mut form = logs.form::<WorkLogForm>();
    form.open_create();
    {
        let values = form.values_mut();
        values.date = "2024-03-18".to_string();
        values.project = "Invoice automation".to_string();
        values.first_half = vec!["Parser fixes".to_string(), String::new()];
    }
    let created = form.submit().await.unwrap();
    assert_eq!(created.first_half, vec!["Parser fixes".to_string()]);
    assert_eq!(created.status, WorkLogStatus::Pending);
    assert!(!form.is_open());

    let reviewed = logs
        .transition(&created.id, WorkLogStatus::Approved)
        .await
        .unwrap();
    assert!(reviewed.reviewed_at.is_some());

    let ids: Vec<String> = logs
        .store()
        .read()
        .ids()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(ids, vec![created.id.to_string(), "1".to_string()]);
}
