//! Noteva Import - WordPress to Noteva migration
//!
//! This library reads a WordPress eXtended RSS export and writes its authors,
//! categories, tags, entries and images into a Noteva database.

pub mod config;
pub mod db;
pub mod import;
pub mod models;
pub mod services;
pub mod wxr;
