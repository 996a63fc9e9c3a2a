//! Category row and view-model, plus the featured-topic join rows.

use serde::{Deserialize, Serialize};

use super::TopicView;
use crate::config::SiteSettings;

/// A persisted category row. The three popularity counters are maintained by
/// background jobs outside this service and may be NULL for fresh categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub color: String,
    pub text_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics_week: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics_month: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics_year: Option<i64>,
    pub read_restricted: bool,
}

/// A featured-topic link: which topics represent a category on listing pages.
/// Fetched in rank order, so only the pairing is carried.
#[derive(Debug, Clone)]
pub struct FeaturedTopicLink {
    pub category_id: String,
    pub topic_id: String,
}

/// Request body for creating a new category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub read_restricted: bool,
}

/// Request body for featuring a topic in a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureTopicRequest {
    pub topic_id: String,
    pub rank: i64,
}

/// Request-scoped category view-model.
///
/// `topics: None` means no featured-topic links exist for the category, which
/// is distinct from `Some(vec![])` (links existed but every referenced topic
/// is gone). The synthetic uncategorized entry has no persisted id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub slug: String,
    pub color: String,
    pub text_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics_week: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics_month: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics_year: Option<i64>,
    pub is_uncategorized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<TopicView>>,
}

impl CategoryView {
    pub fn from_category(category: &Category) -> Self {
        Self {
            id: Some(category.id.clone()),
            name: category.name.clone(),
            slug: category.slug.clone(),
            color: category.color.clone(),
            text_color: category.text_color.clone(),
            topics_week: category.topics_week,
            topics_month: category.topics_month,
            topics_year: category.topics_year,
            is_uncategorized: false,
            topics: None,
        }
    }

    /// Build the synthetic uncategorized entry. Identity comes from site
    /// settings; the popularity counters are aggregate totals over all topics.
    pub fn uncategorized(
        settings: &SiteSettings,
        totals: TopicTotals,
        topics: Vec<TopicView>,
    ) -> Self {
        Self {
            id: None,
            name: settings.uncategorized_name.clone(),
            slug: slugify(&settings.uncategorized_name),
            color: settings.uncategorized_color.clone(),
            text_color: settings.uncategorized_text_color.clone(),
            topics_week: Some(totals.week),
            topics_month: Some(totals.month),
            topics_year: Some(totals.year),
            is_uncategorized: true,
            topics: Some(topics),
        }
    }

    /// Weekly counter with NULL treated as zero, the key used for both the
    /// category ordering and the uncategorized insertion scan.
    pub fn topics_week_or_zero(&self) -> i64 {
        self.topics_week.unwrap_or(0)
    }

    pub fn has_displayable_topics(&self) -> bool {
        self.topics.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// Aggregate topic counts over the whole forum, substituted for the
/// uncategorized entry's popularity counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopicTotals {
    pub week: i64,
    pub month: i64,
    pub year: i64,
}

/// Derive a URL slug from a display name: lowercase, alphanumeric runs joined
/// by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
