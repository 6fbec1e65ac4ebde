//! Error types for the catalog organizer

use thiserror::Error;

use crate::models::CategoryId;

/// Failure talking to the catalog API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The category data is corrupt: following `parentId` from this id loops.
    #[error("cyclic category graph at category {0}")]
    CyclicCategoryGraph(CategoryId),
    #[error("invalid order {value:?} for file {file_name}")]
    InvalidOrder { file_name: String, value: String },
    #[error("duplicate order {value} ({first}, {second})")]
    DuplicateOrder {
        value: i64,
        first: String,
        second: String,
    },
    #[error("select at least one content entry")]
    NothingSelected,
    #[error("choose a destination category")]
    NoDestination,
    #[error("content is already in that category")]
    SameCategory,
    #[error("category {0} is not loaded")]
    UnknownCategory(CategoryId),
    #[error("full-edit mode is not active")]
    NotEditing,
    #[error("{0}")]
    Invalid(String),
}

impl CatalogError {
    /// True for failures detected locally, before any request was sent.
    pub fn is_validation(&self) -> bool {
        !matches!(self, CatalogError::Api(_) | CatalogError::CyclicCategoryGraph(_))
    }
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
