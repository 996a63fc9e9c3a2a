//! Viewer/permission context.
//!
//! Every request carries a `Guardian` describing who is looking at the forum.
//! API keys are verified with a constant-time comparison to mitigate timing
//! attacks.

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{Category, User};

/// Header name for the viewer's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Permission context for the current viewer. Anonymous when no user is
/// attached.
#[derive(Debug, Clone)]
pub struct Guardian {
    current_user: Option<User>,
}

impl Guardian {
    pub fn new(user: Option<User>) -> Self {
        Self { current_user: user }
    }

    pub fn anonymous() -> Self {
        Self { current_user: None }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn is_staff(&self) -> bool {
        self.current_user.as_ref().is_some_and(|u| u.is_staff())
    }

    /// Restricted categories are visible to staff only.
    pub fn can_see_category(&self, category: &Category) -> bool {
        !category.read_restricted || self.is_staff()
    }

    /// Category creation is a staff affordance; it also keeps empty
    /// categories visible in the category list.
    pub fn can_create_category(&self) -> bool {
        self.is_staff()
    }
}

/// Resolve the viewer from the request headers.
///
/// No key means an anonymous viewer; a key that matches no user is rejected
/// rather than silently downgraded.
pub async fn resolve(repo: &Repository, headers: &HeaderMap) -> Result<Guardian, AppError> {
    let Some(provided) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) else {
        return Ok(Guardian::anonymous());
    };

    let user = repo.find_user_by_api_key(provided).await?;
    match user {
        Some(user) if constant_time_compare(&user.api_key, provided) => {
            Ok(Guardian::new(Some(user)))
        }
        _ => Err(AppError::Unauthorized("Invalid API key".to_string())),
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
