//! Publish pipeline tests against the mock generator, CMS and social platforms

use libautopress::cms::mock::MockCms;
use libautopress::generator::mock::{sample_article_json, MockGenerator, MockGeneratorConfig};
use libautopress::platforms::mock::MockPlatform;
use libautopress::service::MirrorCoordinator;
use libautopress::{Database, NewPlan, PlanStatus, Publisher};
use std::time::Duration;
use tempfile::TempDir;

async fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("storage.db");
    let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
    (db, temp_dir)
}

async fn assert_still_pending(db: &Database, plan_id: i64) {
    let plan = db.get_plan(plan_id).await.unwrap().unwrap();
    assert_eq!(plan.status, PlanStatus::Pending);
    assert!(plan.last_published_at.is_none());
    assert!(db.list_posts(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_queue_returns_none() {
    let (db, _temp) = setup_db().await;
    let generator = MockGeneratorConfig::default();
    let publisher = Publisher::new(
        db,
        Box::new(MockGenerator::new(generator.clone())),
        Box::new(MockCms::success()),
    );

    assert!(publisher.publish_next().await.unwrap().is_none());
    assert!(generator.article_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_oldest_pending_plan_is_published_first() {
    let (db, _temp) = setup_db().await;
    let first = db.add_plan(&NewPlan::new("First seed")).await.unwrap();
    let second = db.add_plan(&NewPlan::new("Second seed")).await.unwrap();

    let generator = MockGeneratorConfig::default();
    let publisher = Publisher::new(
        db.clone(),
        Box::new(MockGenerator::new(generator.clone())),
        Box::new(MockCms::success()),
    );

    let outcome = publisher.publish_next().await.unwrap().unwrap();
    assert_eq!(outcome.plan_id, first);
    assert_eq!(*generator.article_calls.lock().unwrap(), vec!["First seed"]);

    let next = db.next_pending_plan().await.unwrap().unwrap();
    assert_eq!(next.id, second);
}

#[tokio::test]
async fn test_post_carries_media_taxonomy_and_excerpt() {
    let (db, _temp) = setup_db().await;
    db.add_plan(&NewPlan::new("Taxonomy seed").with_category("AI & Culture"))
        .await
        .unwrap();

    let cms = MockCms::success();
    let publisher = Publisher::new(
        db.clone(),
        Box::new(MockGenerator::success()),
        Box::new(cms.clone()),
    )
    .with_post_status("draft");

    let outcome = publisher.publish_next().await.unwrap().unwrap();

    assert_eq!(
        cms.uploads(),
        vec!["a-practical-guide-to-autonomous-publishing.png"]
    );
    let posts = cms.created_posts();
    assert_eq!(posts.len(), 1);
    let (post_id, post) = &posts[0];
    assert_eq!(*post_id, outcome.cms_post_id);
    assert_eq!(post.status, "draft");
    assert_eq!(
        post.excerpt.as_deref(),
        Some("A Practical Guide to Autonomous Publishing explained.")
    );
    assert!(post.featured_media.is_some());
    assert_eq!(post.tags.len(), 3);
    assert_eq!(post.categories.len(), 1);

    let record = db
        .get_post_by_cms_id(outcome.cms_post_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.keywords, vec!["automation", "publishing", "AI"]);
    assert_eq!(
        record.link.as_deref(),
        Some("https://blog.example.com/a-practical-guide-to-autonomous-publishing")
    );
}

#[tokio::test]
async fn test_taxonomy_failures_do_not_abort() {
    let (db, _temp) = setup_db().await;
    let plan_id = db
        .add_plan(&NewPlan::new("Seed").with_category("News"))
        .await
        .unwrap();

    let cms = MockCms::term_failure();
    let publisher = Publisher::new(
        db.clone(),
        Box::new(MockGenerator::success()),
        Box::new(cms.clone()),
    );

    publisher.publish_next().await.unwrap().unwrap();

    let (_, post) = &cms.created_posts()[0];
    assert!(post.tags.is_empty());
    assert!(post.categories.is_empty());
    let plan = db.get_plan(plan_id).await.unwrap().unwrap();
    assert_eq!(plan.status, PlanStatus::Published);
}

#[tokio::test]
async fn test_generation_failure_keeps_plan_pending() {
    let (db, _temp) = setup_db().await;
    let plan_id = db.add_plan(&NewPlan::new("Seed")).await.unwrap();

    let publisher = Publisher::new(
        db.clone(),
        Box::new(MockGenerator::article_failure()),
        Box::new(MockCms::success()),
    );

    let err = publisher.publish_next().await.unwrap_err();
    assert!(err.is_upstream());
    assert_still_pending(&db, plan_id).await;
}

#[tokio::test]
async fn test_invalid_article_keeps_plan_pending() {
    let (db, _temp) = setup_db().await;
    let plan_id = db.add_plan(&NewPlan::new("Seed")).await.unwrap();

    let reply = sample_article_json("{Broken} title with braces");
    let cms = MockCms::success();
    let publisher = Publisher::new(
        db.clone(),
        Box::new(MockGenerator::with_article_reply(&reply)),
        Box::new(cms.clone()),
    );

    let err = publisher.publish_next().await.unwrap_err();
    assert!(err.to_string().contains("validation"));
    assert!(cms.uploads().is_empty());
    assert_still_pending(&db, plan_id).await;
}

#[tokio::test]
async fn test_image_failure_keeps_plan_pending() {
    let (db, _temp) = setup_db().await;
    let plan_id = db.add_plan(&NewPlan::new("Seed")).await.unwrap();

    let cms = MockCms::success();
    let publisher = Publisher::new(
        db.clone(),
        Box::new(MockGenerator::image_failure()),
        Box::new(cms.clone()),
    );

    assert!(publisher.publish_next().await.is_err());
    assert!(cms.uploads().is_empty());
    assert_still_pending(&db, plan_id).await;
}

#[tokio::test]
async fn test_upload_failure_keeps_plan_pending() {
    let (db, _temp) = setup_db().await;
    let plan_id = db.add_plan(&NewPlan::new("Seed")).await.unwrap();

    let cms = MockCms::upload_failure();
    let publisher = Publisher::new(
        db.clone(),
        Box::new(MockGenerator::success()),
        Box::new(cms.clone()),
    );

    assert!(publisher.publish_next().await.is_err());
    assert!(cms.created_posts().is_empty());
    assert_still_pending(&db, plan_id).await;
}

#[tokio::test]
async fn test_create_failure_keeps_plan_pending() {
    let (db, _temp) = setup_db().await;
    let plan_id = db.add_plan(&NewPlan::new("Seed")).await.unwrap();

    let publisher = Publisher::new(
        db.clone(),
        Box::new(MockGenerator::success()),
        Box::new(MockCms::create_failure()),
    );

    let err = publisher.publish_next().await.unwrap_err();
    assert!(err.is_upstream());
    assert_still_pending(&db, plan_id).await;
}

#[tokio::test]
async fn test_social_failure_leaves_plan_published() {
    let (db, _temp) = setup_db().await;
    let plan_id = db.add_plan(&NewPlan::new("Seed")).await.unwrap();

    let telegram = MockPlatform::success("telegram");
    let telegram_handle = telegram.config();
    let mirror = MirrorCoordinator::new(
        vec![
            Box::new(MockPlatform::post_failure("facebook", "token expired")),
            Box::new(telegram),
            Box::new(MockPlatform::not_configured("vk")),
        ],
        Duration::ZERO,
    );

    // Social generation fails, so every network falls back to its template
    let generator = MockGeneratorConfig::default();
    let publisher = Publisher::new(
        db.clone(),
        Box::new(MockGenerator::new(generator.clone())),
        Box::new(MockCms::success()),
    )
    .with_mirror(mirror);

    let outcome = publisher.publish_next().await.unwrap().unwrap();

    assert_eq!(*generator.social_calls.lock().unwrap(), 1);
    assert_eq!(outcome.mirror.len(), 3);
    assert!(!outcome.mirror[0].success);
    assert!(outcome.mirror[1].success);
    assert_eq!(outcome.mirror[2].error.as_deref(), Some("not_configured"));

    let posted = telegram_handle.posted.lock().unwrap();
    assert!(posted[0]
        .text
        .ends_with("https://blog.example.com/a-practical-guide-to-autonomous-publishing"));
    assert_eq!(
        posted[0].image_url.as_deref(),
        Some("https://blog.example.com/wp-content/uploads/a-practical-guide-to-autonomous-publishing.png")
    );

    let plan = db.get_plan(plan_id).await.unwrap().unwrap();
    assert_eq!(plan.status, PlanStatus::Published);
    assert_eq!(db.list_posts(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_generated_social_summaries_are_used() {
    let (db, _temp) = setup_db().await;
    db.add_plan(&NewPlan::new("Seed")).await.unwrap();

    let twitter = MockPlatform::success("twitter");
    let handle = twitter.config();
    let mirror = MirrorCoordinator::new(vec![Box::new(twitter)], Duration::ZERO);

    let generator = MockGeneratorConfig {
        social_reply: Some(
            r#"```json
{"twitter": {"text": "Robots now run the editorial desk", "hashtags": ["AI", "Publishing"]}}
```"#
                .to_string(),
        ),
        ..Default::default()
    };
    let publisher = Publisher::new(
        db,
        Box::new(MockGenerator::new(generator)),
        Box::new(MockCms::success()),
    )
    .with_mirror(mirror);

    publisher.publish_next().await.unwrap().unwrap();

    let posted = handle.posted.lock().unwrap();
    assert_eq!(
        posted[0].text,
        "Robots now run the editorial desk\n\n#AI #Publishing\nhttps://blog.example.com/a-practical-guide-to-autonomous-publishing"
    );
}
