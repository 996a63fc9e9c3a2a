//! Category-list assembly.
//!
//! Builds the home-page view-model in a fixed five-step pipeline, run once
//! per request: load featured topics, load visible categories, splice in the
//! synthetic uncategorized entry, prune empty categories, attach the viewer's
//! tracking state. All state is request-local.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::SiteSettings;
use crate::db::Repository;
use crate::errors::AppError;
use crate::guardian::Guardian;
use crate::models::{CategoryView, Topic, TopicUserView, TopicView};

/// The assembled category list.
///
/// `topic_ids` is the flat collection of every topic in the list, in display
/// order, for bulk user-data serialization. The draft fields are pass-through
/// metadata for the UI shell, populated by the handler rather than the
/// assembly itself.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryList {
    pub categories: Vec<CategoryView>,
    pub topic_ids: Vec<String>,
    pub draft_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_sequence: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
}

impl CategoryList {
    /// Assemble the category list for the given viewer.
    pub async fn build(
        repo: &Repository,
        guardian: &Guardian,
        settings: &SiteSettings,
    ) -> Result<Self, AppError> {
        // Step 1: all featured topics, batched into one lookup.
        let links = repo.featured_links().await?;
        let mut topics_by_category: HashMap<String, Vec<String>> = HashMap::new();
        let mut link_topic_ids = Vec::with_capacity(links.len());
        for link in &links {
            topics_by_category
                .entry(link.category_id.clone())
                .or_default()
                .push(link.topic_id.clone());
            link_topic_ids.push(link.topic_id.clone());
        }

        let topics_by_id: HashMap<String, Topic> = repo
            .topics_by_ids(&link_topic_ids)
            .await?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        // Step 2: visible categories in popularity order, featured topics
        // attached in link-rank order.
        let mut categories: Vec<CategoryView> = repo
            .categories_ordered()
            .await?
            .iter()
            .filter(|c| guardian.can_see_category(c))
            .map(CategoryView::from_category)
            .collect();
        attach_featured_topics(&mut categories, &topics_by_category, &topics_by_id);

        // Step 3: the uncategorized entry, spliced in by weekly rank. The
        // totals query is only issued when uncategorized topics exist.
        let uncategorized = repo
            .uncategorized_topics(settings.featured_topics_limit)
            .await?;
        if !uncategorized.is_empty() {
            let totals = repo.topic_totals().await?;
            let topics = uncategorized.iter().map(TopicView::from_topic).collect();
            let entry = CategoryView::uncategorized(settings, totals, topics);
            let at = uncategorized_insert_index(&categories, entry.topics_week_or_zero());
            categories.insert(at, entry);
        }

        // Step 4: drop empty categories unless the viewer can create them
        // (kept so the UI can show management controls).
        prune_empty(&mut categories, guardian.can_create_category());

        // Step 5: the viewer's tracking state, one batched lookup over every
        // topic collected so far.
        let topic_ids: Vec<String> = categories
            .iter()
            .filter_map(|c| c.topics.as_ref())
            .flatten()
            .map(|t| t.id.clone())
            .collect();

        if let Some(user) = guardian.current_user() {
            if !topic_ids.is_empty() {
                let lookup: HashMap<String, TopicUserView> = repo
                    .topic_user_lookup(&user.id, &topic_ids)
                    .await?
                    .iter()
                    .map(|tu| (tu.topic_id.clone(), TopicUserView::from_topic_user(tu)))
                    .collect();
                attach_user_data(&mut categories, &lookup);
            }
        }

        Ok(Self {
            categories,
            topic_ids,
            draft_key: crate::models::NEW_TOPIC_DRAFT_KEY.to_string(),
            draft_sequence: None,
            draft: None,
        })
    }
}

/// Attach each category's featured topics in link-rank order, setting the
/// topic's category reference. Topic ids whose topic no longer exists are
/// skipped. Categories with no link rows keep `topics: None`.
fn attach_featured_topics(
    categories: &mut [CategoryView],
    topics_by_category: &HashMap<String, Vec<String>>,
    topics_by_id: &HashMap<String, Topic>,
) {
    for category in categories.iter_mut() {
        let Some(id) = &category.id else { continue };
        let Some(topic_ids) = topics_by_category.get(id) else {
            continue;
        };
        let mut topics = Vec::with_capacity(topic_ids.len());
        for topic_id in topic_ids {
            if let Some(topic) = topics_by_id.get(topic_id) {
                let mut view = TopicView::from_topic(topic);
                view.category_id = Some(id.clone());
                topics.push(view);
            }
        }
        category.topics = Some(topics);
    }
}

/// Find where the uncategorized entry ranks: immediately before the first
/// category whose weekly count is strictly below `weekly`, or at the end.
/// Only the weekly counter is compared, even though the list is sorted by
/// three keys; placement matches the original behavior, which callers may
/// depend on.
fn uncategorized_insert_index(categories: &[CategoryView], weekly: i64) -> usize {
    categories
        .iter()
        .position(|c| weekly > c.topics_week_or_zero())
        .unwrap_or(categories.len())
}

/// Remove categories with nothing to display, unless the viewer may create
/// categories.
fn prune_empty(categories: &mut Vec<CategoryView>, can_create_category: bool) {
    if !can_create_category {
        categories.retain(CategoryView::has_displayable_topics);
    }
}

/// Attach the viewer's tracking state to every topic that has one.
fn attach_user_data(categories: &mut [CategoryView], lookup: &HashMap<String, TopicUserView>) {
    for category in categories.iter_mut() {
        let Some(topics) = category.topics.as_mut() else {
            continue;
        };
        for topic in topics.iter_mut() {
            topic.user_data = lookup.get(&topic.id).cloned();
        }
    }
}
