//! Remote content fetching from the secure data store
//!
//! The processor only depends on [`ContentFetcher`]; [`SecureDataStoreClient`]
//! is the HTTP implementation used in production.

use crate::error::FetchError;

mod client;

pub use client::SecureDataStoreClient;

/// A document as supplied by the secure data store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Remote file name, used in the output file name
    pub file_name: String,
    /// Transport-encoded (base64) content
    pub content: String,
}

/// Abstraction over remote document fetching, enabling testability.
#[async_trait::async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the document stored under `datastore_identifier`
    async fn fetch_file(&self, datastore_identifier: &str) -> Result<StoredFile, FetchError>;
}
