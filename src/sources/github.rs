// src/sources/github.rs — GitHub REST commit history with per-file diffs

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::infra::config::GithubConfig;
use crate::infra::errors::NotebookError;

const COLLABORATOR: &str = "github";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDiff {
    pub filename: String,
    pub additions: u64,
    pub deletions: u64,
    pub patch: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub message: String,
    pub committed_date: DateTime<Utc>,
    pub sha: String,
    pub author_name: String,
    pub author_email: String,
    pub url: String,
    pub diffs: Vec<FileDiff>,
}

impl fmt::Display for CommitRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.sha.chars().take(7).collect();
        writeln!(f, "Commit({}): {}", short, self.message)?;
        writeln!(f, "Author: {} <{}>", self.author_name, self.author_email)?;
        writeln!(f, "Date: {}", self.committed_date.format("%Y-%m-%dT%H:%M:%SZ"))?;
        writeln!(f, "URL: {}", self.url)?;
        writeln!(f, "Diffs:")?;
        let diffs: Vec<String> = self
            .diffs
            .iter()
            .map(|d| {
                format!(
                    "File: {} - Additions: {}, Deletions: {}\nPatch:\n{}",
                    d.filename, d.additions, d.deletions, d.patch
                )
            })
            .collect();
        writeln!(f, "{}", diffs.join("\n\n"))
    }
}

/// Which commits of a branch to fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitSelection {
    /// The N most recent commits.
    Latest(u32),
    /// Every commit whose committer date falls in `[start, end]`.
    Range { start: NaiveDate, end: NaiveDate },
    /// Sunday through Saturday of the week containing today.
    CurrentWeek,
}

impl CommitSelection {
    /// Build from optional CLI-style inputs: a count wins over a range, and
    /// neither means the current week.
    pub fn from_parts(
        max_count: Option<u32>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, NotebookError> {
        match (max_count, start, end) {
            (Some(n), _, _) => Ok(CommitSelection::Latest(n)),
            (None, Some(start), Some(end)) => {
                if start > end {
                    return Err(NotebookError::Config(format!(
                        "date range start {} is after end {}",
                        start, end
                    )));
                }
                Ok(CommitSelection::Range { start, end })
            }
            (None, None, None) => Ok(CommitSelection::CurrentWeek),
            (None, _, _) => Err(NotebookError::Config(
                "date start and date end must be given together".into(),
            )),
        }
    }

    /// Resolve to a concrete inclusive date window, if any.
    pub fn window(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            CommitSelection::Latest(_) => None,
            CommitSelection::Range { start, end } => Some((*start, *end)),
            CommitSelection::CurrentWeek => Some(week_containing(today)),
        }
    }
}

/// The Sunday-to-Saturday week that contains `day`.
pub fn week_containing(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = day.weekday().num_days_from_sunday() as i64;
    let start = day - Duration::days(offset);
    (start, start + Duration::days(6))
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, NotebookError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| NotebookError::Config(format!("invalid date '{}': {}", s, e)))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitQuery {
    pub repo_url: String,
    pub branch: String,
    pub selection: CommitSelection,
}

/// Anything that can produce commit history for a branch.
#[async_trait]
pub trait CommitSource: Send + Sync {
    async fn fetch_commits(&self, query: &CommitQuery) -> Result<Vec<CommitRecord>, NotebookError>;
}

/// Split `https://github.com/<owner>/<repo>` into its parts.
pub fn parse_repo_url(repo_url: &str) -> Result<(String, String), NotebookError> {
    let invalid = || NotebookError::fetch(COLLABORATOR, format!("Invalid GitHub repository URL: {}", repo_url));

    let parsed = url::Url::parse(repo_url.trim()).map_err(|_| invalid())?;
    if parsed.host_str() != Some("github.com") {
        return Err(invalid());
    }
    let mut segments = parsed
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|s| !s.is_empty());
    let owner = segments.next().ok_or_else(invalid)?;
    let repo = segments.next().ok_or_else(invalid)?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    Ok((owner.to_string(), repo.to_string()))
}

pub struct GithubClient {
    client: reqwest::Client,
    token: String,
    api_url: String,
    per_page: u32,
}

impl GithubClient {
    pub fn new(token: impl Into<String>, config: &GithubConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            per_page: config.per_page.clamp(1, 100),
        }
    }

    async fn get_json(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, NotebookError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", concat!("research-notebook/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .map_err(|e| NotebookError::fetch(COLLABORATOR, e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(NotebookError::fetch(
                COLLABORATOR,
                format!("Request failed, status code {}\n{}", status.as_u16(), body),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| NotebookError::fetch(COLLABORATOR, format!("Invalid JSON: {}", e)))
    }

    async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        selection: &CommitSelection,
    ) -> Result<Vec<serde_json::Value>, NotebookError> {
        let url = format!("{}/repos/{}/{}/commits", self.api_url, owner, repo);

        if let CommitSelection::Latest(n) = selection {
            let params = [
                ("sha", branch.to_string()),
                ("per_page", (*n).clamp(1, 100).to_string()),
            ];
            let page = self.get_json(&url, &params).await?;
            let mut commits = page.as_array().cloned().unwrap_or_default();
            commits.truncate(*n as usize);
            return Ok(commits);
        }

        let (start, end) = selection
            .window(Utc::now().date_naive())
            .ok_or_else(|| NotebookError::Config("commit selection has no date window".into()))?;

        let mut all = Vec::new();
        let mut page_no = 1u32;
        loop {
            let params = [
                ("sha", branch.to_string()),
                ("per_page", self.per_page.to_string()),
                ("page", page_no.to_string()),
                ("since", format!("{}T00:00:00Z", start)),
                ("until", format!("{}T23:59:59Z", end)),
            ];
            let page = self.get_json(&url, &params).await?;
            let items = page.as_array().cloned().unwrap_or_default();
            let count = items.len();
            all.extend(items);
            if count < self.per_page as usize {
                break;
            }
            page_no += 1;
        }

        all.retain(|c| {
            commit_date(c)
                .map(|d| in_window(d.date_naive(), start, end))
                .unwrap_or(false)
        });
        Ok(all)
    }

    async fn commit_diffs(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<Vec<FileDiff>, NotebookError> {
        let url = format!("{}/repos/{}/{}/commits/{}", self.api_url, owner, repo, sha);
        let detail = self.get_json(&url, &[]).await?;
        Ok(parse_file_diffs(&detail))
    }
}

#[async_trait]
impl CommitSource for GithubClient {
    async fn fetch_commits(&self, query: &CommitQuery) -> Result<Vec<CommitRecord>, NotebookError> {
        let (owner, repo) = parse_repo_url(&query.repo_url)?;
        let listed = self
            .list_commits(&owner, &repo, &query.branch, &query.selection)
            .await?;

        tracing::info!(
            repo = %format!("{}/{}", owner, repo),
            branch = %query.branch,
            commits = listed.len(),
            "Fetched commit list",
        );

        let mut records = Vec::with_capacity(listed.len());
        for item in &listed {
            let sha = item["sha"].as_str().unwrap_or_default();
            let diffs = self.commit_diffs(&owner, &repo, sha).await?;
            records.push(parse_commit(item, diffs)?);
        }
        Ok(records)
    }
}

fn in_window(day: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    start <= day && day <= end
}

fn commit_date(item: &serde_json::Value) -> Option<DateTime<Utc>> {
    item["commit"]["committer"]["date"]
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

/// Convert one entry of the commit list into a record.
pub fn parse_commit(item: &serde_json::Value, diffs: Vec<FileDiff>) -> Result<CommitRecord, NotebookError> {
    let text = |v: &serde_json::Value| v.as_str().unwrap_or_default().to_string();
    let committed_date = commit_date(item).ok_or_else(|| {
        NotebookError::fetch(COLLABORATOR, "Commit is missing a committer date")
    })?;

    Ok(CommitRecord {
        message: text(&item["commit"]["message"]),
        committed_date,
        sha: text(&item["sha"]),
        author_name: text(&item["commit"]["author"]["name"]),
        author_email: text(&item["commit"]["author"]["email"]),
        url: text(&item["html_url"]),
        diffs,
    })
}

/// Extract the `files` array of a single-commit response.
pub fn parse_file_diffs(detail: &serde_json::Value) -> Vec<FileDiff> {
    detail["files"]
        .as_array()
        .map(|files| {
            files
                .iter()
                .map(|f| FileDiff {
                    filename: f["filename"].as_str().unwrap_or_default().to_string(),
                    additions: f["additions"].as_u64().unwrap_or(0),
                    deletions: f["deletions"].as_u64().unwrap_or(0),
                    patch: f["patch"]
                        .as_str()
                        .unwrap_or("No patch available")
                        .to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}
