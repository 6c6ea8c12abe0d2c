mod common;

use std::sync::atomic::{AtomicBool, Ordering};

use common::{harness, task, FakeBackend};
use taskline::backend::{
    BackendError, CompletionContent, CreateCompletionArgs, CreateTaskArgs, FileReference, Organization, TaskFilter,
    TaskStatus, UpdateTaskArgs,
};
use taskline::constants::{CACHE_KEY_ORGANIZATIONS, CACHE_KEY_TASKS, STATUS_USING_CACHED_DATA};
use taskline::offline::{read_through, AccessError, DataSource, WriteOutcome};
use taskline::queue::{ActionPayload, PendingAction};
use taskline::storage::{write_snapshot, CacheStore};
use taskline::sync::DrainOutcome;

#[tokio::test]
async fn test_offline_write_is_queued_without_remote_call() {
    let h = harness(FakeBackend::new(), false);

    let outcome = h
        .data
        .create_task(CreateTaskArgs {
            title: "Replace filter".to_string(),
            description: Some("Unit 4".to_string()),
            organization_id: Some(2),
            due_date: None,
        })
        .await
        .unwrap();

    let queued = match outcome {
        WriteOutcome::Queued(action) => action,
        WriteOutcome::Applied(_) => panic!("write should have been queued"),
    };

    assert!(h.backend.calls().is_empty());
    let pending = h.queue.list_pending().await;
    assert_eq!(pending.len(), 1);
    match &pending[0] {
        PendingAction::Ready(action) => {
            assert_eq!(action.id, queued.id);
            assert!(matches!(&action.payload, ActionPayload::CreateTask(args) if args.title == "Replace filter"));
        }
        other => panic!("unexpected entry {other:?}"),
    }
}

#[tokio::test]
async fn test_every_write_operation_queues_when_offline() {
    let h = harness(FakeBackend::new(), false);

    h.data
        .update_task(
            5,
            UpdateTaskArgs {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    h.data.submit_task(5).await.unwrap();
    h.data.set_requirement_completion(11, false).await.unwrap();
    h.data
        .create_completion(CreateCompletionArgs {
            task_id: 5,
            requirement_id: Some(11),
            content: CompletionContent::File {
                file: FileReference {
                    path: "/tmp/photo.jpg".into(),
                    file_name: "photo.jpg".to_string(),
                    mime_type: Some("image/jpeg".to_string()),
                },
            },
        })
        .await
        .unwrap();

    assert!(h.backend.calls().is_empty());
    assert_eq!(h.queue.pending_count().await, 4);

    // Replayed in the order they were made once the device reconnects
    h.monitor.set_online(true).unwrap().await.unwrap();
    assert_eq!(
        h.backend.calls(),
        vec![
            "update_task(5)",
            "submit_task(5)",
            "set_requirement_completion(11, false)",
            "create_completion(5)",
        ]
    );
}

#[tokio::test]
async fn test_online_write_goes_straight_to_backend() {
    let h = harness(FakeBackend::new(), true);

    let outcome = h.data.submit_task(3).await.unwrap();
    match outcome {
        WriteOutcome::Applied(task) => assert_eq!(task.status, TaskStatus::Submitted),
        WriteOutcome::Queued(_) => panic!("online write should not be queued"),
    }
    assert_eq!(h.backend.calls(), vec!["submit_task(3)"]);
    assert_eq!(h.queue.pending_count().await, 0);
}

#[tokio::test]
async fn test_online_write_error_is_returned_not_queued() {
    let h = harness(FakeBackend::new(), true);
    h.backend.fail("submit_task(3)");

    let result = h.data.submit_task(3).await;
    assert!(matches!(result, Err(AccessError::Backend(_))));
    assert_eq!(h.queue.pending_count().await, 0);
}

#[tokio::test]
async fn test_online_read_refreshes_cache_for_offline_use() {
    let h = harness(FakeBackend::with_tasks(vec![task(1, Some(1)), task(2, Some(2))]), true);

    let live = h.data.tasks(TaskFilter::default()).await;
    assert_eq!(live.source, DataSource::Live);
    assert!(live.notice().is_none());
    assert_eq!(live.data.len(), 2);
    assert!(h.store.get(CACHE_KEY_TASKS).await.is_some());

    h.monitor.set_online(false);
    let cached = h.data.tasks(TaskFilter::default()).await;
    assert_eq!(cached.source, DataSource::Cached { stale: false });
    assert_eq!(cached.notice(), Some(STATUS_USING_CACHED_DATA));
    assert_eq!(cached.data, live.data);
    assert_eq!(h.backend.calls(), vec!["fetch_tasks"]);
}

#[tokio::test]
async fn test_failed_online_read_falls_back_to_stale_cache() {
    let h = harness(FakeBackend::new(), true);
    write_snapshot(&*h.store, CACHE_KEY_TASKS, vec![task(7, None)]).await;
    h.backend.fail("fetch_tasks");

    let fetched = h.data.tasks(TaskFilter::default()).await;

    assert_eq!(fetched.source, DataSource::Cached { stale: true });
    assert_eq!(fetched.data.iter().map(|t| t.id).collect::<Vec<_>>(), vec![7]);
}

#[tokio::test]
async fn test_filter_is_applied_to_cached_tasks() {
    let h = harness(FakeBackend::new(), false);
    let mut submitted = task(3, Some(1));
    submitted.status = TaskStatus::Submitted;
    write_snapshot(
        &*h.store,
        CACHE_KEY_TASKS,
        vec![task(1, Some(1)), task(2, Some(2)), submitted],
    )
    .await;

    let by_org = h
        .data
        .tasks(TaskFilter {
            organization_id: Some(1),
            status: None,
        })
        .await;
    assert_eq!(by_org.data.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);

    let by_status = h
        .data
        .tasks(TaskFilter {
            organization_id: Some(1),
            status: Some(TaskStatus::Submitted),
        })
        .await;
    assert_eq!(by_status.data.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3]);
}

#[tokio::test]
async fn test_filtered_online_read_keeps_full_snapshot() {
    let h = harness(FakeBackend::with_tasks(vec![task(1, Some(1)), task(2, Some(2))]), true);
    h.data.tasks(TaskFilter::default()).await;

    let filtered = h
        .data
        .tasks(TaskFilter {
            organization_id: Some(2),
            status: None,
        })
        .await;
    assert_eq!(filtered.data.len(), 1);

    h.monitor.set_online(false);
    let cached = h.data.tasks(TaskFilter::default()).await;
    assert_eq!(cached.data.len(), 2);
}

#[tokio::test]
async fn test_single_task_lookup_offline() {
    let h = harness(FakeBackend::new(), false);
    write_snapshot(&*h.store, CACHE_KEY_TASKS, vec![task(1, None), task(2, None)]).await;

    assert_eq!(h.data.task(2).await.data.map(|t| t.id), Some(2));
    assert!(h.data.task(9).await.data.is_none());
}

#[tokio::test]
async fn test_organizations_round_trip_through_cache() {
    let backend = FakeBackend::new();
    backend.set_organizations(vec![Organization {
        id: 1,
        name: "North depot".to_string(),
    }]);
    let h = harness(backend, true);

    assert_eq!(h.data.organizations().await.source, DataSource::Live);
    assert!(h.store.get(CACHE_KEY_ORGANIZATIONS).await.is_some());

    h.monitor.set_online(false);
    let cached = h.data.organizations().await;
    assert!(cached.is_cached());
    assert_eq!(cached.data[0].name, "North depot");
}

#[tokio::test]
async fn test_read_through_never_calls_remote_offline() {
    let remote_called = AtomicBool::new(false);
    let written_back = AtomicBool::new(false);

    let fetched = read_through(
        false,
        || async {
            remote_called.store(true, Ordering::SeqCst);
            Ok::<_, BackendError>(vec![9])
        },
        || async { vec![1, 2] },
        |_| async {
            written_back.store(true, Ordering::SeqCst);
        },
    )
    .await;

    assert_eq!(fetched.data, vec![1, 2]);
    assert_eq!(fetched.source, DataSource::Cached { stale: false });
    assert!(!remote_called.load(Ordering::SeqCst));
    assert!(!written_back.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_status_and_manual_sync() {
    let h = harness(FakeBackend::new(), false);
    h.data.submit_task(1).await.unwrap();

    let status = h.data.status().await;
    assert!(!status.online);
    assert_eq!(status.pending_actions, 1);
    assert!(status.last_sync.is_none());
    assert!(matches!(h.data.sync_now().await, DrainOutcome::Offline));

    // Reconnect without an automatic drain, then sync manually
    h.monitor.detach_reconnect_handler();
    h.monitor.set_online(true);
    assert!(matches!(h.data.sync_now().await, DrainOutcome::Completed(_)));

    let status = h.data.status().await;
    assert!(status.online);
    assert_eq!(status.pending_actions, 0);
    assert!(status.last_sync.is_some());
}
