//! HTTP client for the BigSolo API.

use anyhow::Result;
use reqwest::{Client, Response};
use serde_json::Value;
use shared::api::{
    AdminMessage, BatchDeleteResponse, CleanupStatusResponse, ClearLogsResponse, CommentRef,
    DeleteKeyPayload, KvViewerResponse, LoginPayload, LoginResponse, ModeratedComment, Namespace,
};

pub struct Api {
    pub http: Client,
    pub base_url: String,
}

impl Api {
    pub fn new(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Exchanges admin credentials for the admin token.
    pub async fn login(&self, payload: LoginPayload) -> Result<LoginResponse> {
        let response = Self::check_response(
            self.http
                .post(format!("{}/api/admin/login", self.base_url))
                .json(&payload)
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    /// Runs log aggregation now and returns the server's summary line.
    pub async fn process_logs(&self, token: String) -> Result<String> {
        let response = Self::check_response(
            self.http
                .post(format!("{}/api/process-log", self.base_url))
                .bearer_auth(token)
                .send()
                .await?,
        )
        .await?;

        Ok(response.text().await?)
    }

    /// Deletes every pending log entry, lock and cleanup marker.
    pub async fn clear_logs(&self, token: String) -> Result<ClearLogsResponse> {
        let response = Self::check_response(
            self.http
                .post(format!("{}/api/admin/clear-logs", self.base_url))
                .bearer_auth(token)
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    /// Lists one page of a KV namespace.
    pub async fn kv_list(
        &self,
        token: String,
        namespace: Namespace,
        cursor: Option<&str>,
    ) -> Result<KvViewerResponse> {
        let mut query = vec![("namespace", namespace.as_str())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let response = Self::check_response(
            self.http
                .get(format!("{}/api/admin/kv-viewer", self.base_url))
                .bearer_auth(token)
                .query(&query)
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    pub async fn kv_delete(&self, token: String, payload: DeleteKeyPayload) -> Result<AdminMessage> {
        let response = Self::check_response(
            self.http
                .post(format!("{}/api/admin/delete-kv-key", self.base_url))
                .bearer_auth(token)
                .json(&payload)
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    /// Every cached comment, newest first.
    pub async fn comments(&self, token: String) -> Result<Vec<ModeratedComment>> {
        let response = Self::check_response(
            self.http
                .get(format!("{}/api/admin/comments", self.base_url))
                .bearer_auth(token)
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    pub async fn delete_comments(
        &self,
        token: String,
        refs: Vec<CommentRef>,
    ) -> Result<BatchDeleteResponse> {
        let response = Self::check_response(
            self.http
                .post(format!("{}/api/admin/batch-delete", self.base_url))
                .bearer_auth(token)
                .json(&refs)
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    /// Aggregated interactions of a series (public).
    pub async fn series_stats(&self, slug: &str) -> Result<Value> {
        let response = Self::check_response(
            self.http
                .get(format!("{}/api/series-stats", self.base_url))
                .query(&[("slug", slug)])
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    /// Consumes a session's cleanup marker (public).
    pub async fn cleanup_status(&self, session_id: &str) -> Result<CleanupStatusResponse> {
        let response = Self::check_response(
            self.http
                .get(format!("{}/api/check-cleanup-status", self.base_url))
                .query(&[("sessionId", session_id)])
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    async fn check_response(response: Response) -> Result<Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            // Try to extract error message from JSON response
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|json| {
                    json.get("error")
                        .or_else(|| json.get("message"))
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string())
                })
                .unwrap_or_else(|| {
                    if body.is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("Request failed")
                            .to_string()
                    } else {
                        body
                    }
                });

            anyhow::bail!("{}", message);
        }

        Ok(response)
    }
}
