use jobsift_core::job::{JobFilter, JobRecord, JobSort, ReviewStatus};
use jobsift_core::provider::RawJobItem;
use jobsift_core::run::{NewFetchRun, Page, Portal};
use jobsift_core::traits::{JobStore, RunStore};
use jobsift_db::{FetchRunRepository, FetchedJobRepository};
use sqlx::PgPool;
use uuid::Uuid;

use crate::integration::common::setup_test_db;

/// Create a parent run row so job inserts satisfy the FK.
async fn seed_run(pool: &PgPool, owner_id: Uuid) -> Uuid {
    let repo = FetchRunRepository::new(pool.clone());
    repo.create_run(NewFetchRun {
        owner_id,
        portal: Portal::Linkedin,
        params: serde_json::json!({}),
    })
    .await
    .unwrap()
    .id
}

fn record(owner_id: Uuid, run_id: Uuid, external_id: &str, title: &str) -> JobRecord {
    let raw = RawJobItem {
        title: title.into(),
        job_url: format!("https://www.linkedin.com/jobs/view/{title}-{external_id}"),
        company_name: "Acme".into(),
        location: Some("Berlin, Germany".into()),
        salary: Some("$69,000.00/yr - $96,500.00/yr".into()),
        published_at: Some("2025-11-03".into()),
        ..RawJobItem::default()
    };
    JobRecord::from_raw(owner_id, run_id, Portal::Linkedin, &raw)
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn upsert_creates_then_merges() {
    let (pool, _container) = setup_test_db().await;
    let owner = Uuid::new_v4();
    let run_id = seed_run(&pool, owner).await;
    let repo = FetchedJobRepository::new(pool.clone());

    let (job, created) = repo
        .upsert_job(&record(owner, run_id, "111", "engineer"))
        .await
        .unwrap();
    assert!(created);
    assert_eq!(job.status, ReviewStatus::New);
    assert_eq!(job.external_job_id, "111");
    assert_eq!(job.salary_min, Some(0.69));
    assert_eq!(job.salary_max, Some(0.965));

    // Caller takes ownership of the status before the next fetch.
    repo.update_job_status(owner, job.id, ReviewStatus::Reviewed)
        .await
        .unwrap()
        .unwrap();

    let second_run = seed_run(&pool, owner).await;
    let mut refreshed = record(owner, second_run, "111", "engineer");
    refreshed.title = "Senior Engineer".into();
    let (merged, created) = repo.upsert_job(&refreshed).await.unwrap();

    assert!(!created);
    assert_eq!(merged.id, job.id);
    assert_eq!(merged.title, "Senior Engineer");
    assert_eq!(merged.fetch_run_id, second_run);
    // Status and created_at survive re-ingestion.
    assert_eq!(merged.status, ReviewStatus::Reviewed);
    assert_eq!(merged.created_at, job.created_at);
    assert!(merged.fetched_at > job.fetched_at);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn same_external_id_different_owner_is_separate() {
    let (pool, _container) = setup_test_db().await;
    let repo = FetchedJobRepository::new(pool.clone());

    let owner_a = Uuid::new_v4();
    let owner_b = Uuid::new_v4();
    let run_a = seed_run(&pool, owner_a).await;
    let run_b = seed_run(&pool, owner_b).await;

    let (_, created_a) = repo
        .upsert_job(&record(owner_a, run_a, "222", "analyst"))
        .await
        .unwrap();
    let (_, created_b) = repo
        .upsert_job(&record(owner_b, run_b, "222", "analyst"))
        .await
        .unwrap();

    assert!(created_a);
    assert!(created_b);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn concurrent_upserts_never_duplicate() {
    let (pool, _container) = setup_test_db().await;
    let owner = Uuid::new_v4();
    let run_id = seed_run(&pool, owner).await;
    let repo = FetchedJobRepository::new(pool.clone());

    let rec = record(owner, run_id, "333", "developer");
    let (a, b, c, d) = tokio::join!(
        repo.upsert_job(&rec),
        repo.upsert_job(&rec),
        repo.upsert_job(&rec),
        repo.upsert_job(&rec),
    );

    let created: usize = [a.unwrap(), b.unwrap(), c.unwrap(), d.unwrap()]
        .iter()
        .filter(|(_, created)| *created)
        .count();
    assert_eq!(created, 1);

    let (jobs, total) = repo
        .list_jobs(owner, &JobFilter::default(), &Page::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(jobs.len(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn update_status_is_owner_scoped() {
    let (pool, _container) = setup_test_db().await;
    let owner = Uuid::new_v4();
    let run_id = seed_run(&pool, owner).await;
    let repo = FetchedJobRepository::new(pool.clone());

    let (job, _) = repo
        .upsert_job(&record(owner, run_id, "444", "writer"))
        .await
        .unwrap();

    let other = repo
        .update_job_status(Uuid::new_v4(), job.id, ReviewStatus::Skipped)
        .await
        .unwrap();
    assert!(other.is_none());

    let updated = repo
        .update_job_status(owner, job.id, ReviewStatus::Queued)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, ReviewStatus::Queued);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn list_jobs_filters_and_sorts() {
    let (pool, _container) = setup_test_db().await;
    let owner = Uuid::new_v4();
    let run_id = seed_run(&pool, owner).await;
    let repo = FetchedJobRepository::new(pool.clone());

    let (alpha, _) = repo
        .upsert_job(&record(owner, run_id, "910", "alpha-engineer"))
        .await
        .unwrap();
    repo.upsert_job(&record(owner, run_id, "911", "beta-engineer"))
        .await
        .unwrap();
    let mut cheap = record(owner, run_id, "912", "gamma-analyst");
    cheap.salary_min = Some(0.1);
    cheap.salary_max = Some(0.2);
    repo.upsert_job(&cheap).await.unwrap();

    repo.update_job_status(owner, alpha.id, ReviewStatus::Reviewed)
        .await
        .unwrap()
        .unwrap();

    let by_status = JobFilter {
        statuses: Some(vec![ReviewStatus::Reviewed]),
        ..Default::default()
    };
    let (jobs, total) = repo.list_jobs(owner, &by_status, &Page::default()).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(jobs[0].id, alpha.id);

    let by_salary = JobFilter {
        min_salary: Some(0.5),
        ..Default::default()
    };
    let (_, total) = repo.list_jobs(owner, &by_salary, &Page::default()).await.unwrap();
    assert_eq!(total, 2);

    let by_query = JobFilter {
        query: Some("gamma".into()),
        ..Default::default()
    };
    let (jobs, _) = repo.list_jobs(owner, &by_query, &Page::default()).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].external_job_id, "912");

    let sorted = JobFilter {
        sort: JobSort::Title,
        sort_desc: false,
        ..Default::default()
    };
    let (jobs, _) = repo.list_jobs(owner, &sorted, &Page::default()).await.unwrap();
    let titles: Vec<&str> = jobs.iter().map(|j| j.title.as_str()).collect();
    assert_eq!(titles, vec!["alpha-engineer", "beta-engineer", "gamma-analyst"]);
}
