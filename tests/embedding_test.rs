//! End-to-end embedding test: the flow a host application drives.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::Validate;

use conveyor::{
    CronStore, JobDefinition, JobRegistry, JobStatus, JobStore, MemoryCronStore, MemoryJobStore,
    NewCronJob, NewJob, next_fire_after,
};

#[derive(Debug, Serialize, Deserialize, Validate)]
struct DoubleParams {
    n: i64,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
struct DoubleResult {
    n: i64,
}

/// A cron fire as the host's timer loop performs it: read due rows,
/// enqueue the job with the schedule's default params, update the
/// bookkeeping, then let the generic worker dispatch by name.
#[tokio::test]
async fn test_cron_fire_through_registry() {
    let jobs = Arc::new(MemoryJobStore::new());
    let crons = MemoryCronStore::new();

    let double = JobDefinition::new("double", |params: DoubleParams, _ctx| async move {
        Ok(DoubleResult { n: params.n * 2 })
    })
    .unwrap()
    .bind(jobs.clone() as Arc<dyn JobStore>);

    let mut registry = JobRegistry::new();
    registry.register(Arc::new(double)).unwrap();

    let schedule = crons
        .insert(&NewCronJob {
            job_name: "double".to_string(),
            cron_expression: "*/5 * * * *".to_string(),
            params: serde_json::json!({"n": 21}),
            enabled: true,
        })
        .await
        .unwrap();
    let first_fire = schedule.next_run_at.unwrap();

    // Timer tick at the scheduled instant.
    let due = crons.find_due(first_fire).await.unwrap();
    assert_eq!(due.len(), 1);
    let due = &due[0];

    let spawned = jobs
        .insert(&NewJob {
            job_name: due.job_name.clone(),
            params: due.params.clone(),
            max_attempts: 3,
            scheduled_for: None,
            correlation_id: None,
        })
        .await
        .unwrap();
    let next = next_fire_after(&due.cron_expression, first_fire).unwrap();
    crons
        .mark_fired(due.id, spawned.id, first_fire, next)
        .await
        .unwrap();

    // Generic worker dispatch by job name.
    let job = registry.get(&spawned.job_name).unwrap();
    let metadata = job.run_from_database(spawned.id).await.unwrap();
    assert_eq!(metadata.status, JobStatus::Completed);

    let record = jobs.find_by_id(spawned.id).await.unwrap().unwrap();
    assert_eq!(record.result, Some(serde_json::json!({"n": 42})));

    // Bookkeeping advanced: last run stamped, back-reference set, next
    // fire strictly later.
    let schedule = crons.find_by_id(schedule.id).await.unwrap().unwrap();
    assert_eq!(schedule.last_run_at, Some(first_fire));
    assert_eq!(schedule.last_job_id, Some(spawned.id));
    assert!(schedule.next_run_at.unwrap() > first_fire);

    // A second tick at the same instant finds nothing due.
    assert!(crons.find_due(first_fire).await.unwrap().is_empty());
}
