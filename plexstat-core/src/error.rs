use std::time::Duration;

use thiserror::Error;

use crate::catalog::CatalogError;

/// Reasons a refresh cycle is aborted. A failed cycle never commits.
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("catalog request failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("unknown catalog node type '{node_type}' (rating key {rating_key})")]
    UnknownNodeType {
        node_type: String,
        rating_key: String,
    },

    #[error("refresh cycle exceeded its {0:?} deadline")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, RefreshError>;
