use jobsift_core::run::{FetchParams, NewFetchRun, Page, Portal, RunCompletion, RunFilter, RunStatus};
use jobsift_core::traits::RunStore;
use jobsift_db::FetchRunRepository;
use uuid::Uuid;

use crate::integration::common::setup_test_db;

fn new_run(owner_id: Uuid, portal: Portal) -> NewFetchRun {
    NewFetchRun {
        owner_id,
        portal,
        params: serde_json::to_value(FetchParams::default()).unwrap(),
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn create_and_get_run() {
    let (pool, _container) = setup_test_db().await;
    let repo = FetchRunRepository::new(pool);
    let owner = Uuid::new_v4();

    let run = repo.create_run(new_run(owner, Portal::Linkedin)).await.unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert_eq!(run.portal, Portal::Linkedin);
    assert!(run.finished_at.is_none());
    assert_eq!(run.jobs_found, 0);

    let fetched = repo.get_run(owner, run.id).await.unwrap().expect("run exists");
    assert_eq!(fetched.id, run.id);
    assert_eq!(fetched.params["rows"], 50);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn get_run_is_owner_scoped() {
    let (pool, _container) = setup_test_db().await;
    let repo = FetchRunRepository::new(pool);

    let run = repo
        .create_run(new_run(Uuid::new_v4(), Portal::Linkedin))
        .await
        .unwrap();

    let other_owner = Uuid::new_v4();
    assert!(repo.get_run(other_owner, run.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn finalize_sets_terminal_fields() {
    let (pool, _container) = setup_test_db().await;
    let repo = FetchRunRepository::new(pool);
    let owner = Uuid::new_v4();

    let run = repo.create_run(new_run(owner, Portal::Linkedin)).await.unwrap();
    repo.finalize_run(run.id, &RunCompletion::completed(12, 5))
        .await
        .unwrap();

    let finalized = repo.get_run(owner, run.id).await.unwrap().unwrap();
    assert_eq!(finalized.status, RunStatus::Completed);
    assert_eq!(finalized.jobs_found, 12);
    assert_eq!(finalized.new_jobs_added, 5);
    assert!(finalized.finished_at.is_some());
    assert!(finalized.error.is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn finalize_is_idempotent() {
    let (pool, _container) = setup_test_db().await;
    let repo = FetchRunRepository::new(pool);
    let owner = Uuid::new_v4();

    let run = repo.create_run(new_run(owner, Portal::Linkedin)).await.unwrap();
    repo.finalize_run(run.id, &RunCompletion::completed(3, 1))
        .await
        .unwrap();

    // A second finalization must leave the first outcome in place.
    let late_failure =
        RunCompletion::failed(serde_json::json!({"kind": "provider_timeout", "error": "late"}));
    repo.finalize_run(run.id, &late_failure).await.unwrap();

    let finalized = repo.get_run(owner, run.id).await.unwrap().unwrap();
    assert_eq!(finalized.status, RunStatus::Completed);
    assert_eq!(finalized.jobs_found, 3);
    assert!(finalized.error.is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn failed_run_carries_error_payload() {
    let (pool, _container) = setup_test_db().await;
    let repo = FetchRunRepository::new(pool);
    let owner = Uuid::new_v4();

    let run = repo.create_run(new_run(owner, Portal::Indeed)).await.unwrap();
    let payload = serde_json::json!({"kind": "provider_run_failed", "error": "state ABORTED"});
    repo.finalize_run(run.id, &RunCompletion::failed(payload.clone()))
        .await
        .unwrap();

    let finalized = repo.get_run(owner, run.id).await.unwrap().unwrap();
    assert_eq!(finalized.status, RunStatus::Failed);
    assert_eq!(finalized.error, Some(payload));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn list_runs_filters_and_paginates() {
    let (pool, _container) = setup_test_db().await;
    let repo = FetchRunRepository::new(pool);
    let owner = Uuid::new_v4();

    for _ in 0..3 {
        repo.create_run(new_run(owner, Portal::Linkedin)).await.unwrap();
    }
    let naukri = repo.create_run(new_run(owner, Portal::Naukri)).await.unwrap();
    repo.finalize_run(naukri.id, &RunCompletion::completed(1, 1))
        .await
        .unwrap();
    // Other owner's runs must not leak in.
    repo.create_run(new_run(Uuid::new_v4(), Portal::Linkedin))
        .await
        .unwrap();

    let (all, total) = repo
        .list_runs(owner, &RunFilter::default(), &Page::default())
        .await
        .unwrap();
    assert_eq!(total, 4);
    assert_eq!(all.len(), 4);

    let filter = RunFilter {
        portal: Some(Portal::Naukri),
        status: Some(RunStatus::Completed),
    };
    let (matched, total) = repo
        .list_runs(owner, &filter, &Page::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(matched[0].id, naukri.id);

    let page = Page {
        page: 2,
        page_size: 3,
    };
    let (second_page, total) = repo
        .list_runs(owner, &RunFilter::default(), &page)
        .await
        .unwrap();
    assert_eq!(total, 4);
    assert_eq!(second_page.len(), 1);
}
