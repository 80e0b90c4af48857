//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the operations the importer needs for one entity.

pub mod article;
pub mod category;
pub mod image;
pub mod page;
pub mod tag;
pub mod user;

pub use article::{ArticleRepository, SqlxArticleRepository};
pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use image::{ImageRepository, SqlxImageRepository};
pub use page::{PageRepository, SqlxPageRepository};
pub use tag::{SqlxTagRepository, TagRepository};
pub use user::{SqlxUserRepository, UserRepository, UserRepositoryError};
