//! Data models: persisted rows and the request-scoped view-models built from
//! them by the category-list assembly.

mod category;
mod draft;
mod topic;
mod topic_user;
mod user;

pub use category::*;
pub use draft::*;
pub use topic::*;
pub use topic_user::*;
pub use user::*;
