//! Queue store: plans awaiting publication and the posts they produced

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;

use crate::error::{AutopressError, DbError, Result};
use crate::types::{from_unix, NewPlan, PlanItem, PlanStatus, PostRecord, QueueStatus};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database and apply migrations
    pub async fn new(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
            }
        }

        // mode=rwc creates the file on first use
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a pending plan and return its id
    pub async fn add_plan(&self, plan: &NewPlan) -> Result<i64> {
        let seed = plan.seed.trim();
        if seed.is_empty() {
            return Err(AutopressError::InvalidInput(
                "Plan seed cannot be empty".to_string(),
            ));
        }

        let category = plan
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let result = sqlx::query(
            r#"
            INSERT INTO plans (seed, seo_focus, created_at, status, category)
            VALUES (?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(seed)
        .bind(plan.seo_focus.trim())
        .bind(Utc::now().timestamp())
        .bind(category)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.last_insert_rowid())
    }

    /// Whether a plan with exactly this seed is already queued or published
    pub async fn plan_exists_by_seed(&self, seed: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plans WHERE seed = ?")
            .bind(seed.trim())
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(count > 0)
    }

    /// The oldest pending plan, if any
    pub async fn next_pending_plan(&self) -> Result<Option<PlanItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, seed, seo_focus, created_at, last_published_at, status, category
            FROM plans
            WHERE status = 'pending'
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.map(|r| plan_from_row(&r)).transpose()
    }

    pub async fn get_plan(&self, id: i64) -> Result<Option<PlanItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, seed, seo_focus, created_at, last_published_at, status, category
            FROM plans WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.map(|r| plan_from_row(&r)).transpose()
    }

    /// List plans in queue order, optionally filtered by status
    pub async fn list_plans(
        &self,
        status: Option<PlanStatus>,
        limit: usize,
    ) -> Result<Vec<PlanItem>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    r#"
                    SELECT id, seed, seo_focus, created_at, last_published_at, status, category
                    FROM plans
                    WHERE status = ?
                    ORDER BY created_at ASC, id ASC
                    LIMIT ?
                    "#,
                )
                .bind(status.as_str())
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, seed, seo_focus, created_at, last_published_at, status, category
                    FROM plans
                    ORDER BY created_at ASC, id ASC
                    LIMIT ?
                    "#,
                )
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(DbError::SqlxError)?;

        rows.iter().map(plan_from_row).collect()
    }

    /// Store the post record and flip the plan to published, atomically
    ///
    /// Fails with [`DbError::PlanNotPending`] (and stores nothing) when the
    /// plan was already published or does not exist.
    pub async fn record_publication(&self, plan_id: i64, record: &PostRecord) -> Result<i64> {
        let keywords =
            serde_json::to_string(&record.keywords).unwrap_or_else(|_| "[]".to_string());

        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        let updated = sqlx::query(
            r#"
            UPDATE plans
            SET status = 'published', last_published_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(record.published_at)
        .bind(plan_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        if updated.rows_affected() != 1 {
            tx.rollback().await.map_err(DbError::SqlxError)?;
            return Err(DbError::PlanNotPending(plan_id).into());
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO posts (plan_id, title, slug, cms_post_id, link, published_at, keywords)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(plan_id)
        .bind(&record.title)
        .bind(&record.slug)
        .bind(record.cms_post_id)
        .bind(&record.link)
        .bind(record.published_at)
        .bind(keywords)
        .execute(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        tx.commit().await.map_err(DbError::SqlxError)?;

        Ok(inserted.last_insert_rowid())
    }

    /// Most recent publications first
    pub async fn list_posts(&self, limit: usize) -> Result<Vec<PostRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, plan_id, title, slug, cms_post_id, link, published_at, keywords
            FROM posts
            ORDER BY published_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    pub async fn get_post_by_cms_id(&self, cms_post_id: i64) -> Result<Option<PostRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, plan_id, title, slug, cms_post_id, link, published_at, keywords
            FROM posts WHERE cms_post_id = ?
            ORDER BY id DESC LIMIT 1
            "#,
        )
        .bind(cms_post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(post_from_row))
    }

    /// Newest `published_at` across all posts
    pub async fn last_publish_time(&self) -> Result<Option<DateTime<Utc>>> {
        let latest: Option<i64> = sqlx::query_scalar("SELECT MAX(published_at) FROM posts")
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(latest.and_then(from_unix))
    }

    /// Plan counts per status, the published post count and the last publish time
    pub async fn queue_status(&self) -> Result<QueueStatus> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending,
                COALESCE(SUM(CASE WHEN status = 'published' THEN 1 ELSE 0 END), 0) AS published,
                COUNT(*) AS total,
                (SELECT COUNT(*) FROM posts) AS posts
            FROM plans
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(QueueStatus {
            pending: row.get("pending"),
            published: row.get("published"),
            total: row.get("total"),
            posts: row.get("posts"),
            last_publish: self.last_publish_time().await?,
        })
    }
}

fn plan_from_row(row: &SqliteRow) -> Result<PlanItem> {
    let status: String = row.get("status");
    let status = status
        .parse::<PlanStatus>()
        .map_err(AutopressError::InvalidInput)?;

    Ok(PlanItem {
        id: row.get("id"),
        seed: row.get("seed"),
        seo_focus: row.get("seo_focus"),
        created_at: row.get("created_at"),
        last_published_at: row.get("last_published_at"),
        status,
        category: row.get("category"),
    })
}

fn post_from_row(row: &SqliteRow) -> PostRecord {
    let keywords: String = row.get("keywords");
    PostRecord {
        id: Some(row.get("id")),
        plan_id: row.get("plan_id"),
        title: row.get("title"),
        slug: row.get("slug"),
        cms_post_id: row.get("cms_post_id"),
        link: row.get("link"),
        published_at: row.get("published_at"),
        keywords: serde_json::from_str(&keywords).unwrap_or_default(),
    }
}
