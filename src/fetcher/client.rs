//! HTTP client for the secure data store API.

use super::{ContentFetcher, StoredFile};
use crate::config::DatastoreConfig;
use crate::error::{Error, FetchError};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

/// Wire shape of `GET /api/files/{id}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResponse {
    #[serde(alias = "FileName")]
    file_name: String,
    #[serde(default, alias = "Content")]
    content: Option<String>,
}

/// Production [`ContentFetcher`] backed by the secure data store REST API.
#[derive(Clone, Debug)]
pub struct SecureDataStoreClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl SecureDataStoreClient {
    /// Build a client from the datastore settings
    pub fn new(config: &DatastoreConfig) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(auth) = &config.auth_header {
            let value = HeaderValue::from_str(auth)
                .map_err(|e| Error::config("auth_header", format!("invalid header value: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("datastore-export/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.api_server.trim_end_matches('/').to_string(),
        })
    }

    fn file_url(&self, datastore_identifier: &str) -> String {
        format!(
            "{}/api/files/{}",
            self.base_url,
            urlencoding::encode(datastore_identifier)
        )
    }
}

#[async_trait::async_trait]
impl ContentFetcher for SecureDataStoreClient {
    async fn fetch_file(&self, datastore_identifier: &str) -> Result<StoredFile, FetchError> {
        if datastore_identifier.trim().is_empty() {
            return Err(FetchError::InvalidIdentifier {
                identifier: datastore_identifier.to_string(),
            });
        }

        let url = self.file_url(datastore_identifier);
        tracing::debug!(%url, "fetching document from secure data store");

        let transport = |e: reqwest::Error| {
            let reason = if e.is_timeout() {
                format!("request timed out: {e}")
            } else if e.is_connect() {
                format!("connection failed: {e}")
            } else {
                e.to_string()
            };
            FetchError::Transport {
                identifier: datastore_identifier.to_string(),
                reason,
            }
        };

        let response = self.http_client.get(&url).send().await.map_err(transport)?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(FetchError::NotFound {
                    identifier: datastore_identifier.to_string(),
                });
            }
            status => {
                return Err(FetchError::Status {
                    identifier: datastore_identifier.to_string(),
                    status: status.as_u16(),
                });
            }
        }

        let body = response.bytes().await.map_err(transport)?;
        let file: FileResponse =
            serde_json::from_slice(&body).map_err(|e| FetchError::MalformedResponse {
                identifier: datastore_identifier.to_string(),
                reason: e.to_string(),
            })?;

        let content = file.content.ok_or_else(|| FetchError::EmptyContent {
            identifier: datastore_identifier.to_string(),
        })?;

        Ok(StoredFile {
            file_name: file.file_name,
            content,
        })
    }
}
