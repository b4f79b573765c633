// src/stats.rs
use reqwest::Client;

use crate::errors::{Result, ServerError};
use crate::models::{AllStatsResult, ProjectStats};

pub const COMPILER_PROJECT: &str = "qat";
pub const WEBSITE_PROJECT: &str = "qatdev";
pub const SERVER_PROJECT: &str = "QatDevServer";
pub const VSCODE_PROJECT: &str = "qat_vscode";
pub const DOCS_PROJECT: &str = "QatDocs";

/// Client for WakaTime's per-project time statistics.
#[derive(Clone)]
pub struct StatsClient {
    client: Client,
    api_base: String,
}

impl StatsClient {
    pub fn new(client: Client, api_base: impl Into<String>) -> Self {
        Self { client, api_base: api_base.into() }
    }

    pub fn project_url(&self, project: &str) -> String {
        format!(
            "{}/api/v1/users/current/all_time_since_today?project={}",
            self.api_base.trim_end_matches('/'),
            project
        )
    }

    pub async fn project_stats(&self, access_token: &str, project: &str) -> Result<ProjectStats> {
        let url = self.project_url(project);
        log::debug!("Fetching WakaTime stats for {}", project);

        let resp = self.client.get(&url).bearer_auth(access_token).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error body".to_string());
            return Err(ServerError::ApiError { status: status.as_u16(), body });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            ServerError::UnexpectedResponse(format!("stats for {}: {}", project, e))
        })
    }

    /// Stats for every tracked project, fetched concurrently. Fails as a whole
    /// if any single project fails.
    pub async fn all_stats(&self, access_token: &str) -> Result<AllStatsResult> {
        let (compiler, website, server, vscode, docs) = futures::try_join!(
            self.project_stats(access_token, COMPILER_PROJECT),
            self.project_stats(access_token, WEBSITE_PROJECT),
            self.project_stats(access_token, SERVER_PROJECT),
            self.project_stats(access_token, VSCODE_PROJECT),
            self.project_stats(access_token, DOCS_PROJECT),
        )?;

        Ok(AllStatsResult { compiler, website, server, vscode, docs })
    }
}
