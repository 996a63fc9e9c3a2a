//! Integration tests for the forum category-list backend.

use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::config::{Config, SiteSettings};
use crate::db::{init_database, Repository};
use crate::{create_router, AppState};

/// Test fixture: a server on a random port over a temp-dir SQLite database,
/// with direct pool access for seeding rows.
struct TestFixture {
    client: Client,
    base_url: String,
    pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool.clone()));

        // Create config
        let config = Config {
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            site: SiteSettings {
                uncategorized_name: "Uncategorized".to_string(),
                uncategorized_color: "AB9364".to_string(),
                uncategorized_text_color: "FFFFFF".to_string(),
                featured_topics_limit: 6,
            },
        };

        let state = AppState {
            repo,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            pool,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn category_list(&self, api_key: Option<&str>) -> Value {
        let mut req = self.client.get(self.url("/api/categories"));
        if let Some(key) = api_key {
            req = req.header("x-api-key", key);
        }
        let resp = req.send().await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], true);
        body["data"].clone()
    }

    // ==================== SEED HELPERS ====================

    async fn seed_user(&self, id: &str, username: &str, admin: bool, api_key: &str) {
        sqlx::query("INSERT INTO users (id, username, admin, moderator, api_key) VALUES (?, ?, ?, 0, ?)")
            .bind(id)
            .bind(username)
            .bind(admin as i32)
            .bind(api_key)
            .execute(&self.pool)
            .await
            .unwrap();
    }

    async fn seed_category(&self, id: &str, name: &str, weekly: Option<i64>, restricted: bool) {
        sqlx::query(
            "INSERT INTO categories (id, name, slug, color, text_color, topics_week, topics_month, topics_year, read_restricted)
             VALUES (?, ?, ?, '0088CC', 'FFFFFF', ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(name.to_lowercase())
        .bind(weekly)
        .bind(weekly)
        .bind(weekly)
        .bind(restricted as i32)
        .execute(&self.pool)
        .await
        .unwrap();
    }

    async fn seed_topic(&self, id: &str, category_id: Option<&str>, days_old: i64) {
        let stamp = (Utc::now() - Duration::days(days_old)).to_rfc3339();
        sqlx::query(
            "INSERT INTO topics (id, title, slug, category_id, created_at, bumped_at, posts_count, visible)
             VALUES (?, ?, ?, ?, ?, ?, 1, 1)",
        )
        .bind(id)
        .bind(format!("Topic {}", id))
        .bind(format!("topic-{}", id))
        .bind(category_id)
        .bind(&stamp)
        .bind(&stamp)
        .execute(&self.pool)
        .await
        .unwrap();
    }

    async fn seed_featured(&self, category_id: &str, topic_id: &str, rank: i64) {
        sqlx::query(
            "INSERT INTO category_featured_topics (category_id, topic_id, rank) VALUES (?, ?, ?)",
        )
        .bind(category_id)
        .bind(topic_id)
        .bind(rank)
        .execute(&self.pool)
        .await
        .unwrap();
    }

    async fn seed_draft(&self, user_id: &str, draft_key: &str, sequence: i64, data: &str) {
        sqlx::query("INSERT INTO drafts (user_id, draft_key, sequence, data) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(draft_key)
            .bind(sequence)
            .bind(data)
            .execute(&self.pool)
            .await
            .unwrap();
    }
}

fn category_names(data: &Value) -> Vec<String> {
    data["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_empty_forum_yields_empty_list() {
    let fixture = TestFixture::new().await;

    let data = fixture.category_list(None).await;
    assert_eq!(data["categories"].as_array().unwrap().len(), 0);
    assert_eq!(data["topicIds"].as_array().unwrap().len(), 0);
    assert_eq!(data["draftKey"], "new_topic");
}

#[tokio::test]
async fn test_uncategorized_inserted_by_weekly_rank() {
    let fixture = TestFixture::new().await;

    // A(weekly=10) and B(weekly=1), each with a featured topic; two recent
    // uncategorized topics put the aggregate weekly total between the two.
    fixture.seed_category("a", "A", Some(10), false).await;
    fixture.seed_category("b", "B", Some(1), false).await;
    fixture.seed_topic("t-a", Some("a"), 400).await;
    fixture.seed_topic("t-b", Some("b"), 400).await;
    fixture.seed_featured("a", "t-a", 0).await;
    fixture.seed_featured("b", "t-b", 0).await;
    fixture.seed_topic("u1", None, 0).await;
    fixture.seed_topic("u2", None, 1).await;

    let data = fixture.category_list(None).await;
    // Aggregate weekly total is 2 (u1, u2): below A's 10, above B's 1.
    assert_eq!(category_names(&data), ["A", "Uncategorized", "B"]);

    let unc = &data["categories"][1];
    assert_eq!(unc["isUncategorized"], true);
    assert!(unc.get("id").is_none());
    assert_eq!(unc["slug"], "uncategorized");
    assert_eq!(unc["topicsWeek"], 2);
    assert_eq!(unc["topics"].as_array().unwrap().len(), 2);

    // The uncategorized topics join the flat collection.
    let topic_ids: Vec<&str> = data["topicIds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(topic_ids.contains(&"u1"));
    assert!(topic_ids.contains(&"u2"));
    assert_eq!(topic_ids.len(), 4);
}

#[tokio::test]
async fn test_no_uncategorized_entry_without_uncategorized_topics() {
    let fixture = TestFixture::new().await;

    fixture.seed_category("a", "A", Some(1), false).await;
    fixture.seed_topic("t-a", Some("a"), 0).await;
    fixture.seed_featured("a", "t-a", 0).await;

    let data = fixture.category_list(None).await;
    assert_eq!(category_names(&data), ["A"]);
}

#[tokio::test]
async fn test_only_uncategorized_topics() {
    let fixture = TestFixture::new().await;

    fixture.seed_topic("u1", None, 0).await;
    fixture.seed_topic("u2", None, 0).await;

    let data = fixture.category_list(None).await;
    let categories = data["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["isUncategorized"], true);
    assert_eq!(categories[0]["topics"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_categories_pruned_unless_staff() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", "admin", true, "admin-key").await;

    fixture.seed_category("a", "A", Some(5), false).await;
    fixture.seed_category("empty", "Empty", Some(1), false).await;
    fixture.seed_topic("t-a", Some("a"), 400).await;
    fixture.seed_featured("a", "t-a", 0).await;

    // Anonymous viewers never see a category without topics.
    let data = fixture.category_list(None).await;
    assert_eq!(category_names(&data), ["A"]);
    for category in data["categories"].as_array().unwrap() {
        assert!(!category["topics"].as_array().unwrap().is_empty());
    }

    // Staff keep empty categories for the management controls.
    let data = fixture.category_list(Some("admin-key")).await;
    assert_eq!(category_names(&data), ["A", "Empty"]);
}

#[tokio::test]
async fn test_restricted_category_hidden_from_non_staff() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", "admin", true, "admin-key").await;
    fixture.seed_user("user", "user", false, "user-key").await;

    fixture.seed_category("staff", "Staff", Some(9), true).await;
    fixture.seed_category("a", "A", Some(5), false).await;
    fixture.seed_topic("t-s", Some("staff"), 400).await;
    fixture.seed_topic("t-a", Some("a"), 400).await;
    fixture.seed_featured("staff", "t-s", 0).await;
    fixture.seed_featured("a", "t-a", 0).await;

    let data = fixture.category_list(Some("user-key")).await;
    assert_eq!(category_names(&data), ["A"]);

    let data = fixture.category_list(Some("admin-key")).await;
    assert_eq!(category_names(&data), ["Staff", "A"]);
}

#[tokio::test]
async fn test_dangling_featured_links_are_skipped() {
    let fixture = TestFixture::new().await;

    fixture.seed_category("c", "C", Some(5), false).await;
    fixture.seed_topic("t1", Some("c"), 400).await;
    fixture.seed_topic("t2", Some("c"), 400).await;
    fixture.seed_topic("t3", Some("c"), 400).await;
    fixture.seed_featured("c", "t1", 0).await;
    fixture.seed_featured("c", "t2", 1).await;
    fixture.seed_featured("c", "t3", 2).await;

    sqlx::query("DELETE FROM topics WHERE id = 't2'")
        .execute(&fixture.pool)
        .await
        .unwrap();

    let data = fixture.category_list(None).await;
    let topics = data["categories"][0]["topics"].as_array().unwrap();
    assert_eq!(topics.len(), 2);
    assert_eq!(topics[0]["id"], "t1");
    assert_eq!(topics[1]["id"], "t3");
    assert_eq!(topics[0]["categoryId"], "c");
}

#[tokio::test]
async fn test_user_data_attached_for_authenticated_viewer() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("u1", "eviltrout", false, "u1-key").await;

    fixture.seed_category("a", "A", Some(5), false).await;
    fixture.seed_topic("t1", Some("a"), 400).await;
    fixture.seed_topic("t2", Some("a"), 400).await;
    fixture.seed_featured("a", "t1", 0).await;
    fixture.seed_featured("a", "t2", 1).await;

    // Track t1 through the API.
    let resp = fixture
        .client
        .put(fixture.url("/api/topics/t1/tracking"))
        .header("x-api-key", "u1-key")
        .json(&json!({ "notificationLevel": "tracking", "lastReadPostNumber": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let data = fixture.category_list(Some("u1-key")).await;
    let topics = data["categories"][0]["topics"].as_array().unwrap();
    assert_eq!(topics[0]["userData"]["notificationLevel"], "tracking");
    assert_eq!(topics[0]["userData"]["lastReadPostNumber"], 4);
    assert!(topics[1].get("userData").is_none());

    // Anonymous viewers get no user data at all.
    let data = fixture.category_list(None).await;
    let topics = data["categories"][0]["topics"].as_array().unwrap();
    for topic in topics {
        assert!(topic.get("userData").is_none());
    }
}

#[tokio::test]
async fn test_draft_metadata_passthrough() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("u1", "eviltrout", false, "u1-key").await;
    fixture
        .seed_draft("u1", "new_topic", 3, "{\"title\":\"wip\"}")
        .await;

    let data = fixture.category_list(Some("u1-key")).await;
    assert_eq!(data["draftKey"], "new_topic");
    assert_eq!(data["draftSequence"], 3);
    assert_eq!(data["draft"], "{\"title\":\"wip\"}");

    let data = fixture.category_list(None).await;
    assert_eq!(data["draftKey"], "new_topic");
    assert!(data.get("draftSequence").is_none());
    assert!(data.get("draft").is_none());
}

#[tokio::test]
async fn test_invalid_api_key_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/categories"))
        .header("x-api-key", "no-such-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_category_creation_requires_staff() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", "admin", true, "admin-key").await;
    fixture.seed_user("user", "user", false, "user-key").await;

    let resp = fixture
        .client
        .post(fixture.url("/api/categories"))
        .header("x-api-key", "user-key")
        .json(&json!({ "name": "Lounge" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = fixture
        .client
        .post(fixture.url("/api/categories"))
        .header("x-api-key", "admin-key")
        .json(&json!({ "name": "Site Feedback" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["slug"], "site-feedback");
}

#[tokio::test]
async fn test_tracking_requires_authentication() {
    let fixture = TestFixture::new().await;
    fixture.seed_topic("t1", None, 0).await;

    let resp = fixture
        .client
        .put(fixture.url("/api/topics/t1/tracking"))
        .json(&json!({ "notificationLevel": "watching" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_create_and_feature_topic_via_api() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", "admin", true, "admin-key").await;

    let resp = fixture
        .client
        .post(fixture.url("/api/categories"))
        .header("x-api-key", "admin-key")
        .json(&json!({ "name": "General" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let category_id = body["data"]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .client
        .post(fixture.url("/api/topics"))
        .header("x-api-key", "admin-key")
        .json(&json!({ "title": "Welcome", "categoryId": category_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let topic_id = body["data"]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/categories/{}/featured", category_id)))
        .header("x-api-key", "admin-key")
        .json(&json!({ "topicId": topic_id, "rank": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let data = fixture.category_list(None).await;
    assert_eq!(category_names(&data), ["General"]);
    let topics = data["categories"][0]["topics"].as_array().unwrap();
    assert_eq!(topics[0]["id"].as_str().unwrap(), topic_id);

    // Featuring an unknown topic is a 404.
    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/categories/{}/featured", category_id)))
        .header("x-api-key", "admin-key")
        .json(&json!({ "topicId": "missing", "rank": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
