//! Database repository for all reads feeding the category-list assembly and
//! the small management write surface.

use chrono::{Duration, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    slugify, Category, CreateCategoryRequest, CreateTopicRequest, Draft, FeaturedTopicLink,
    NotificationLevel, Topic, TopicTotals, TopicUser, UpdateTrackingRequest, User,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== CATEGORY LIST READS ====================

    /// Fetch all featured-topic links in rank order.
    pub async fn featured_links(&self) -> Result<Vec<FeaturedTopicLink>, AppError> {
        let rows = sqlx::query(
            "SELECT category_id, topic_id FROM category_featured_topics ORDER BY rank",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| FeaturedTopicLink {
                category_id: row.get("category_id"),
                topic_id: row.get("topic_id"),
            })
            .collect())
    }

    /// Fetch the topics referenced by a set of ids in one query. Ids with no
    /// surviving topic are simply absent from the result.
    pub async fn topics_by_ids(&self, ids: &[String]) -> Result<Vec<Topic>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, title, slug, category_id, created_at, bumped_at, posts_count, visible
             FROM topics WHERE id IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows.iter().map(topic_from_row).collect())
    }

    /// Fetch every category, ordered by the three popularity counters
    /// descending, NULLs counting as zero. Visibility filtering happens in
    /// the assembly layer via the guardian.
    pub async fn categories_ordered(&self) -> Result<Vec<Category>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, slug, color, text_color, topics_week, topics_month, topics_year, read_restricted
             FROM categories
             ORDER BY COALESCE(topics_week, 0) DESC,
                      COALESCE(topics_month, 0) DESC,
                      COALESCE(topics_year, 0) DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(category_from_row).collect())
    }

    /// Fetch visible topics with no category, most recently bumped first.
    pub async fn uncategorized_topics(&self, limit: i64) -> Result<Vec<Topic>, AppError> {
        let rows = sqlx::query(
            "SELECT id, title, slug, category_id, created_at, bumped_at, posts_count, visible
             FROM topics
             WHERE category_id IS NULL AND visible = 1
             ORDER BY bumped_at DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(topic_from_row).collect())
    }

    /// Aggregate topic counts over the whole forum for the trailing week,
    /// month, and year.
    pub async fn topic_totals(&self) -> Result<TopicTotals, AppError> {
        let now = Utc::now();
        let week = (now - Duration::days(7)).to_rfc3339();
        let month = (now - Duration::days(30)).to_rfc3339();
        let year = (now - Duration::days(365)).to_rfc3339();

        let row = sqlx::query(
            "SELECT COUNT(*) FILTER (WHERE created_at >= ?) AS week_count,
                    COUNT(*) FILTER (WHERE created_at >= ?) AS month_count,
                    COUNT(*) FILTER (WHERE created_at >= ?) AS year_count
             FROM topics WHERE visible = 1",
        )
        .bind(&week)
        .bind(&month)
        .bind(&year)
        .fetch_one(&self.pool)
        .await?;

        Ok(TopicTotals {
            week: row.get("week_count"),
            month: row.get("month_count"),
            year: row.get("year_count"),
        })
    }

    /// Fetch a user's tracking state for a set of topics in one query.
    pub async fn topic_user_lookup(
        &self,
        user_id: &str,
        topic_ids: &[String],
    ) -> Result<Vec<TopicUser>, AppError> {
        if topic_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; topic_ids.len()].join(", ");
        let sql = format!(
            "SELECT topic_id, user_id, last_read_post_number, notification_level, posted
             FROM topic_users WHERE user_id = ? AND topic_id IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql).bind(user_id);
        for id in topic_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows.iter().map(topic_user_from_row).collect())
    }

    // ==================== VIEWER / DRAFT READS ====================

    /// Look up a user by API key.
    pub async fn find_user_by_api_key(&self, api_key: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, username, admin, moderator, api_key FROM users WHERE api_key = ?",
        )
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Fetch a user's draft for a given key, if any.
    pub async fn find_draft(
        &self,
        user_id: &str,
        draft_key: &str,
    ) -> Result<Option<Draft>, AppError> {
        let row = sqlx::query(
            "SELECT draft_key, sequence, data FROM drafts
             WHERE user_id = ? AND draft_key = ?",
        )
        .bind(user_id)
        .bind(draft_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Draft {
            draft_key: row.get("draft_key"),
            sequence: row.get("sequence"),
            data: row.get("data"),
        }))
    }

    // ==================== MANAGEMENT WRITES ====================

    /// Create a new category.
    pub async fn create_category(
        &self,
        request: &CreateCategoryRequest,
    ) -> Result<Category, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let slug = slugify(&request.name);
        let color = request.color.clone().unwrap_or_else(|| "0088CC".to_string());
        let text_color = request
            .text_color
            .clone()
            .unwrap_or_else(|| "FFFFFF".to_string());

        sqlx::query(
            "INSERT INTO categories (id, name, slug, color, text_color, read_restricted)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.name)
        .bind(&slug)
        .bind(&color)
        .bind(&text_color)
        .bind(request.read_restricted as i32)
        .execute(&self.pool)
        .await?;

        Ok(Category {
            id,
            name: request.name.clone(),
            slug,
            color,
            text_color,
            topics_week: None,
            topics_month: None,
            topics_year: None,
            read_restricted: request.read_restricted,
        })
    }

    /// Create a new topic, optionally in a category.
    pub async fn create_topic(&self, request: &CreateTopicRequest) -> Result<Topic, AppError> {
        if let Some(category_id) = &request.category_id {
            self.get_category(category_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Category {} not found", category_id)))?;
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO topics (id, title, slug, category_id, created_at, bumped_at, posts_count, visible)
             VALUES (?, ?, ?, ?, ?, ?, 1, 1)",
        )
        .bind(&id)
        .bind(&request.title)
        .bind(slugify(&request.title))
        .bind(&request.category_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Topic {
            id,
            title: request.title.clone(),
            slug: slugify(&request.title),
            category_id: request.category_id.clone(),
            created_at: now.clone(),
            bumped_at: now,
            posts_count: 1,
            visible: true,
        })
    }

    /// Get a category by ID.
    pub async fn get_category(&self, id: &str) -> Result<Option<Category>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, slug, color, text_color, topics_week, topics_month, topics_year, read_restricted
             FROM categories WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(category_from_row))
    }

    /// Get a topic by ID.
    pub async fn get_topic(&self, id: &str) -> Result<Option<Topic>, AppError> {
        let row = sqlx::query(
            "SELECT id, title, slug, category_id, created_at, bumped_at, posts_count, visible
             FROM topics WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(topic_from_row))
    }

    /// Feature a topic in a category at the given rank, replacing any
    /// existing link for the pair.
    pub async fn feature_topic(
        &self,
        category_id: &str,
        topic_id: &str,
        rank: i64,
    ) -> Result<(), AppError> {
        self.get_category(category_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", category_id)))?;
        self.get_topic(topic_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Topic {} not found", topic_id)))?;

        sqlx::query(
            "INSERT INTO category_featured_topics (category_id, topic_id, rank)
             VALUES (?, ?, ?)
             ON CONFLICT (category_id, topic_id) DO UPDATE SET rank = excluded.rank",
        )
        .bind(category_id)
        .bind(topic_id)
        .bind(rank)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upsert a user's tracking state for a topic.
    pub async fn set_topic_user(
        &self,
        user_id: &str,
        topic_id: &str,
        request: &UpdateTrackingRequest,
    ) -> Result<TopicUser, AppError> {
        self.get_topic(topic_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Topic {} not found", topic_id)))?;

        let existing = sqlx::query(
            "SELECT topic_id, user_id, last_read_post_number, notification_level, posted
             FROM topic_users WHERE topic_id = ? AND user_id = ?",
        )
        .bind(topic_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        let existing = existing.as_ref().map(topic_user_from_row);

        let notification_level = request
            .notification_level
            .or(existing.as_ref().map(|tu| tu.notification_level))
            .unwrap_or(NotificationLevel::Regular);
        let last_read_post_number = request
            .last_read_post_number
            .or(existing.as_ref().and_then(|tu| tu.last_read_post_number));
        let posted = existing.as_ref().map(|tu| tu.posted).unwrap_or(false);

        sqlx::query(
            "INSERT INTO topic_users (topic_id, user_id, last_read_post_number, notification_level, posted)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (topic_id, user_id) DO UPDATE SET
                 last_read_post_number = excluded.last_read_post_number,
                 notification_level = excluded.notification_level",
        )
        .bind(topic_id)
        .bind(user_id)
        .bind(last_read_post_number)
        .bind(notification_level.as_i64())
        .bind(posted as i32)
        .execute(&self.pool)
        .await?;

        Ok(TopicUser {
            topic_id: topic_id.to_string(),
            user_id: user_id.to_string(),
            last_read_post_number,
            notification_level,
            posted,
        })
    }
}

// Helper functions for row conversion

fn category_from_row(row: &sqlx::sqlite::SqliteRow) -> Category {
    let read_restricted: i32 = row.get("read_restricted");
    Category {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        color: row.get("color"),
        text_color: row.get("text_color"),
        topics_week: row.get("topics_week"),
        topics_month: row.get("topics_month"),
        topics_year: row.get("topics_year"),
        read_restricted: read_restricted != 0,
    }
}

fn topic_from_row(row: &sqlx::sqlite::SqliteRow) -> Topic {
    let visible: i32 = row.get("visible");
    Topic {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        category_id: row.get("category_id"),
        created_at: row.get("created_at"),
        bumped_at: row.get("bumped_at"),
        posts_count: row.get("posts_count"),
        visible: visible != 0,
    }
}

fn topic_user_from_row(row: &sqlx::sqlite::SqliteRow) -> TopicUser {
    let posted: i32 = row.get("posted");
    let level: i64 = row.get("notification_level");
    TopicUser {
        topic_id: row.get("topic_id"),
        user_id: row.get("user_id"),
        last_read_post_number: row.get("last_read_post_number"),
        notification_level: NotificationLevel::from_i64(level)
            .unwrap_or(NotificationLevel::Regular),
        posted: posted != 0,
    }
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    let admin: i32 = row.get("admin");
    let moderator: i32 = row.get("moderator");
    User {
        id: row.get("id"),
        username: row.get("username"),
        admin: admin != 0,
        moderator: moderator != 0,
        api_key: row.get("api_key"),
    }
}
