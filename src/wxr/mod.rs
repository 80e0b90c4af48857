//! WordPress eXtended RSS (WXR) reader
//!
//! Loads an export into an owned element tree, resolves which `wp` namespace
//! version it was written with, and exposes typed accessors over the items
//! and categories of the channel.

mod document;
mod error;
#[cfg(test)]
pub(crate) mod fixtures;

pub use document::{CategoryNode, ExportDocument, Item, Namespaces, Term, WxrVersion, XmlElement};
pub use error::WxrError;
