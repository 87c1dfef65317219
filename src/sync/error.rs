use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum SyncError {
    /// A collection page could not be listed, so the walk cannot continue.
    #[error("Unable to list page {page} of collection '{collection}': {source}")]
    Listing {
        collection: String,
        page: u32,
        source: ApiError,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Disk error: {0}")]
    Disk(#[from] std::io::Error),
}
