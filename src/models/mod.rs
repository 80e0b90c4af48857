//! Data models
//!
//! Destination entities the WordPress importer writes:
//! - Users (resolved authors)
//! - Pages (the blog root)
//! - Articles (imported entries)
//! - Categories and tags
//! - Images (rehosted media)

mod article;
mod category;
mod image;
mod page;
mod tag;
mod user;

pub use article::{Article, ArticleStatus};
pub use category::Category;
pub use image::Image;
pub use page::{Page, PageStatus};
pub use tag::Tag;
pub use user::{User, UserRole};
