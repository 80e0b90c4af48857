//! Services layer
//!
//! Helpers shared by the migration engine:
//! - Password hashing for created users
//! - Text processing (tag stripping, excerpts, slugs)
//! - Remote fetching and local storage of images

pub mod http;
pub mod media;
pub mod password;
pub mod text;

pub use http::{FetchError, HttpClient, HttpResponse, ReqwestHttpClient};
pub use media::{ImageStore, LocalImageStore, MediaError};
pub use password::{hash_password, random_password};
pub use text::{slugify, strip_tags, truncate_chars, truncate_words, MAX_FIELD_LENGTH};
