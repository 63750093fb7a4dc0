//! One file per purchasable check module.
//!
//! Page-only modules are plain functions over the snapshot; the two modules
//! that make their own requests (`crawl_health`, `competitors`) are async
//! and take the whole [`CheckContext`](crate::CheckContext).

pub mod accessibility;
pub mod competitors;
pub mod crawl_health;
pub mod local_seo;
pub mod mobile;
pub mod onpage_seo;
pub mod performance;
pub mod schema_markup;
pub mod security;
pub mod social;
