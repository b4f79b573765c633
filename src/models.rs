// src/models.rs
use serde::{Deserialize, Serialize};

/// Body of every non-payload response, success or failure.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResponseStatus {
    pub status: String,
}

impl ResponseStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self { status: status.into() }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReleaseVersion {
    pub value: String,
    #[serde(rename = "isPrerelease")]
    pub is_prerelease: bool,
    #[serde(default)]
    pub prerelease: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReleaseFile {
    pub id: String,
    pub platform: String,
    pub target: String,
    pub downloads: i64,
    pub path: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LanguageRelease {
    #[serde(rename = "releaseID")]
    pub release_id: String,
    pub version: ReleaseVersion,
    pub title: String,
    pub content: String,
    pub files: Vec<ReleaseFile>,
    pub index: i64,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReleasesResponse {
    pub releases: Vec<LanguageRelease>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DownloadedReleaseDetails {
    #[serde(rename = "confirmationKey", default)]
    pub confirmation_key: Option<String>,
    #[serde(rename = "releaseID")]
    pub release_id: String,
    #[serde(rename = "platformID")]
    pub platform_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CommitAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NewCommit {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(alias = "Author")]
    pub author: CommitAuthor,
    pub repository: String,
    pub site: String,
    pub timestamp: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PushedCommits {
    #[serde(rename = "confirmationKey", default)]
    pub confirmation_key: Option<String>,
    pub commits: Vec<NewCommit>,
}

/// OAuth credentials for the WakaTime API, kept in the server-config record.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct WakatimeConfig {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: String,
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    #[serde(rename = "refreshURL")]
    pub refresh_url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ServerConfig {
    pub wakatime: WakatimeConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct StatsRange {
    pub end: Option<String>,
    pub end_date: Option<String>,
    pub end_text: Option<String>,
    pub start: Option<String>,
    pub start_date: Option<String>,
    pub start_text: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ProjectStatsData {
    pub decimal: String,
    pub digital: String,
    pub is_up_to_date: bool,
    pub percent_calculated: f64,
    pub project: String,
    pub range: StatsRange,
    pub text: String,
    pub timeout: i64,
    pub total_seconds: f64,
}

/// Payload of WakaTime's `all_time_since_today` endpoint.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProjectStats {
    pub data: ProjectStatsData,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AllStatsResult {
    pub compiler: ProjectStats,
    pub website: ProjectStats,
    pub server: ProjectStats,
    pub vscode: ProjectStats,
    pub docs: ProjectStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pushed_commits_accepts_capitalised_author() {
        let body = json!({
            "confirmationKey": "key",
            "commits": [{
                "id": "abc123",
                "title": "Fix parser",
                "message": "Fix parser\n\nDetails",
                "Author": { "name": "Dev" },
                "repository": "qat",
                "site": "github",
                "timestamp": "2024-01-01T00:00:00Z",
                "ref": "refs/heads/main"
            }]
        });

        let pushed: PushedCommits = serde_json::from_value(body).unwrap();
        assert_eq!(pushed.confirmation_key.as_deref(), Some("key"));
        assert_eq!(pushed.commits[0].author.name, "Dev");
        assert_eq!(pushed.commits[0].author.email, None);
        assert_eq!(pushed.commits[0].git_ref, "refs/heads/main");
    }

    #[test]
    fn test_release_serialises_with_wire_names() {
        let release = LanguageRelease {
            release_id: "r1".to_string(),
            version: ReleaseVersion {
                value: "0.1.0".to_string(),
                is_prerelease: true,
                prerelease: "alpha".to_string(),
            },
            title: "First".to_string(),
            content: "notes".to_string(),
            files: vec![],
            index: 0,
            created_at: "2024-01-01".to_string(),
        };

        let value = serde_json::to_value(&release).unwrap();
        assert_eq!(value["releaseID"], "r1");
        assert_eq!(value["version"]["isPrerelease"], true);
        assert_eq!(value["createdAt"], "2024-01-01");
    }

    #[test]
    fn test_project_stats_tolerates_missing_fields() {
        let stats: ProjectStats = serde_json::from_value(json!({
            "data": { "project": "qat", "total_seconds": 3600.5 }
        }))
        .unwrap();
        assert_eq!(stats.data.project, "qat");
        assert_eq!(stats.data.total_seconds, 3600.5);
        assert!(stats.data.range.timezone.is_none());
    }
}
