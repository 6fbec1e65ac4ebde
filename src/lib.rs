//! VOD catalog organizer
//!
//! Client-side core for administering a VOD catalog: the category tree,
//! paged content listing with bulk delete and move, and per-entry file
//! ordering. All I/O goes through [`api::CatalogApi`].

pub mod api;
pub mod category;
pub mod config;
pub mod content;
pub mod error;
pub mod fence;
pub mod files;
pub mod models;
pub mod mover;
pub mod ordering;
pub mod organizer;
pub mod pagination;
pub mod prefs;
pub mod tree;

#[cfg(test)]
mod test_support;

pub use api::{CatalogApi, HttpCatalogClient};
pub use config::AppConfig;
pub use error::{ApiError, CatalogError};
pub use organizer::{CatalogOrganizer, Fetch, FetchResult, Mutation};
