//! Scheduler tick behaviour over a real queue with mock upstreams

use chrono::{Duration, Utc};
use libautopress::cms::mock::MockCms;
use libautopress::generator::mock::{MockGenerator, MockGeneratorConfig};
use libautopress::scheduler::TickOutcome;
use libautopress::{Database, Decision, NewPlan, Publisher, ScheduleSettings, Scheduler};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;

async fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("storage.db");
    let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
    (db, temp_dir)
}

fn settings() -> ScheduleSettings {
    ScheduleSettings {
        interval: Duration::hours(6),
        cooldown: Duration::minutes(60),
        poll_interval: std::time::Duration::from_secs(1),
    }
}

fn scheduler(db: &Database, generator: MockGeneratorConfig) -> Scheduler {
    let publisher = Publisher::new(
        db.clone(),
        Box::new(MockGenerator::new(generator)),
        Box::new(MockCms::success()),
    );
    Scheduler::new(publisher, settings())
}

#[tokio::test]
async fn test_interval_gates_second_publish() {
    let (db, _temp) = setup_db().await;
    db.add_plan(&NewPlan::new("One")).await.unwrap();
    db.add_plan(&NewPlan::new("Two")).await.unwrap();

    let mut scheduler = scheduler(&db, MockGeneratorConfig::default());
    let now = Utc::now();

    assert!(matches!(scheduler.tick(now).await, TickOutcome::Published(_)));

    let early = scheduler.tick(now + Duration::hours(5)).await;
    assert!(matches!(
        early,
        TickOutcome::Skipped(Decision::Wait { .. })
    ));
    assert_eq!(db.queue_status().await.unwrap().pending, 1);

    let due = scheduler
        .tick(now + Duration::hours(6) + Duration::minutes(1))
        .await;
    assert!(matches!(due, TickOutcome::Published(_)));
    assert_eq!(db.queue_status().await.unwrap().pending, 0);
}

#[tokio::test]
async fn test_failure_starts_cooldown() {
    let (db, _temp) = setup_db().await;
    db.add_plan(&NewPlan::new("Seed")).await.unwrap();

    let generator = MockGeneratorConfig {
        article_reply: None,
        ..Default::default()
    };
    let mut scheduler = scheduler(&db, generator.clone());
    let now = Utc::now();

    match scheduler.tick(now).await {
        TickOutcome::Failed(e) => assert!(e.is_upstream()),
        other => panic!("expected a failed tick, got {:?}", other),
    }
    assert_eq!(scheduler.last_failure(), Some(now));

    let during = scheduler.tick(now + Duration::minutes(30)).await;
    assert!(matches!(
        during,
        TickOutcome::Skipped(Decision::CoolingDown { .. })
    ));
    assert_eq!(generator.article_calls.lock().unwrap().len(), 1);

    // Still failing after the cooldown, so a new attempt is made and the cooldown restarts
    let after = now + Duration::minutes(61);
    assert!(matches!(scheduler.tick(after).await, TickOutcome::Failed(_)));
    assert_eq!(generator.article_calls.lock().unwrap().len(), 2);
    assert_eq!(scheduler.last_failure(), Some(after));
}

#[tokio::test]
async fn test_empty_queue_does_not_cool_down() {
    let (db, _temp) = setup_db().await;
    let mut scheduler = scheduler(&db, MockGeneratorConfig::default());

    assert!(matches!(
        scheduler.tick(Utc::now()).await,
        TickOutcome::QueueEmpty
    ));
    assert!(scheduler.last_failure().is_none());
}

#[tokio::test]
async fn test_run_stops_when_shutdown_is_set() {
    let (db, _temp) = setup_db().await;
    let mut scheduler = scheduler(&db, MockGeneratorConfig::default());

    let shutdown = Arc::new(AtomicBool::new(true));
    scheduler.run(shutdown).await.unwrap();
}
