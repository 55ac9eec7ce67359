//! HTTP-backed node state synchronizer.
//!
//! Talks to the coordination service's node metadata endpoint:
//! `GET /v1/nodes/{id}/metadata` returns the current mapping and
//! `PATCH` merges a partial one. A 409 means the coordinator rejected a
//! concurrent modification; obtaining the credential itself is the
//! deployment's concern, this client only attaches it.

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::error::SyncError;
use crate::node::{NodeState, NodeStateSync};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Synchronizes one node's metadata over HTTP.
#[derive(Debug)]
pub struct HttpNodeState {
    client: Client,
    metadata_url: String,
    token: Option<String>,
}

impl HttpNodeState {
    /// Builds the synchronizer for `node_name` against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns a `SyncError` if the HTTP client cannot be constructed.
    pub fn new(
        base_url: &str,
        node_name: &str,
        token: Option<String>,
    ) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            metadata_url: format!(
                "{}/v1/nodes/{}/metadata",
                base_url.trim_end_matches('/'),
                node_name
            ),
            token,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl NodeStateSync for HttpNodeState {
    async fn get(&self) -> Result<NodeState, SyncError> {
        let response = self
            .authorized(self.client.get(&self.metadata_url))
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        match response.status() {
            // A node the controller has not touched yet has no metadata.
            StatusCode::NOT_FOUND => Ok(NodeState::new()),
            status if status.is_success() => response
                .json::<NodeState>()
                .await
                .map_err(|e| SyncError::Transport(e.to_string())),
            status => Err(SyncError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn set(&self, patch: NodeState) -> Result<(), SyncError> {
        let response = self
            .authorized(self.client.patch(&self.metadata_url))
            .json(&patch)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::CONFLICT => Err(SyncError::Conflict),
            status if status.is_success() => Ok(()),
            status => Err(SyncError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_url_normalizes_trailing_slash() {
        let a = HttpNodeState::new("http://coordinator:8080/", "node-1", None).expect("build");
        let b = HttpNodeState::new("http://coordinator:8080", "node-1", None).expect("build");
        assert_eq!(a.metadata_url, "http://coordinator:8080/v1/nodes/node-1/metadata");
        assert_eq!(a.metadata_url, b.metadata_url);
    }
}
