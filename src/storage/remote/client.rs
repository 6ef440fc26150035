//! PostgREST client over reqwest

use super::translate::{SelectRequest, parse_content_range};
use super::{RemoteStore, SelectResponse};
use crate::core::error::RemoteQueryError;
use crate::core::record::SalesRow;
use async_trait::async_trait;
use reqwest::header::CONTENT_RANGE;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// HTTP client for a PostgREST (Supabase) endpoint
///
/// Every request carries the `apikey` header and the same key as a bearer
/// token, and is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    http: reqwest::Client,
    rest_url: String,
    api_key: String,
}

impl PostgrestClient {
    /// Create a client for a project URL (`https://<ref>.supabase.co`)
    /// or a bare REST root ending in `/rest/v1`
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self, RemoteQueryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteQueryError::transport("connect", e))?;

        Ok(Self {
            http,
            rest_url: rest_root(url),
            api_key: api_key.to_string(),
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn failure(operation: &str, response: Response) -> RemoteQueryError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        RemoteQueryError::Status {
            operation: operation.to_string(),
            status,
            body,
        }
    }
}

#[async_trait]
impl RemoteStore for PostgrestClient {
    fn endpoint(&self) -> String {
        self.rest_url.clone()
    }

    async fn select(&self, request: &SelectRequest) -> Result<SelectResponse, RemoteQueryError> {
        let mut builder = self
            .authorized(self.http.get(format!("{}/{}", self.rest_url, request.table)))
            .query(&request.params);
        if let Some(count) = request.count {
            builder = builder.header("Prefer", format!("count={}", count));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RemoteQueryError::transport("select", e))?;

        let status = response.status();
        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range);

        // Offset past the last row: empty page, total still reported
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(SelectResponse {
                rows: Vec::new(),
                total,
            });
        }
        if !status.is_success() {
            return Err(Self::failure("select", response).await);
        }

        let rows: Vec<SalesRow> = response
            .json()
            .await
            .map_err(|e| RemoteQueryError::malformed("select", e))?;

        tracing::debug!(table = %request.table, rows = rows.len(), ?total, "remote select answered");
        Ok(SelectResponse { rows, total })
    }

    async fn rpc(&self, function: &str) -> Result<Value, RemoteQueryError> {
        let response = self
            .authorized(self.http.post(format!("{}/rpc/{}", self.rest_url, function)))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| RemoteQueryError::transport("rpc", e))?;

        if !response.status().is_success() {
            return Err(Self::failure("rpc", response).await);
        }

        response
            .json()
            .await
            .map_err(|e| RemoteQueryError::malformed("rpc", e))
    }
}

fn rest_root(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.ends_with("/rest/v1") {
        trimmed.to_string()
    } else {
        format!("{}/rest/v1", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_root() {
        assert_eq!(rest_root("https://abc.supabase.co"), "https://abc.supabase.co/rest/v1");
        assert_eq!(rest_root("https://abc.supabase.co/"), "https://abc.supabase.co/rest/v1");
        assert_eq!(rest_root("http://localhost:3000/rest/v1/"), "http://localhost:3000/rest/v1");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client =
            PostgrestClient::new("http://127.0.0.1:9", "key", Duration::from_millis(500)).unwrap();
        let err = client
            .select(&SelectRequest::sample("sales", "gender", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteQueryError::Transport { .. }));
        assert_eq!(client.endpoint(), "http://127.0.0.1:9/rest/v1");
    }
}
