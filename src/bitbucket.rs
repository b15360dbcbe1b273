use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{BbError, Result};
use crate::provider::DataProvider;
use crate::types::{
    Branch, Commit, CommitChange, Pipeline, PipelineResult, PipelineState, PipelineStep, PrState,
    PullRequest, Repository,
};

pub const DEFAULT_BASE_URL: &str = "https://api.bitbucket.org/2.0";

/// Pipelines are only fetched one page deep, newest first.
const PIPELINE_PAGE_LEN: u32 = 50;

#[derive(Clone)]
pub struct Bitbucket {
    client: Client,
    base_url: String,
    workspace: String,
    token: String,
}

impl std::fmt::Debug for Bitbucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitbucket")
            .field("base_url", &self.base_url)
            .field("workspace", &self.workspace)
            .finish_non_exhaustive()
    }
}

impl Bitbucket {
    pub fn new(workspace: String, token: String, timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), workspace, token, timeout)
    }

    pub fn with_base_url(
        base_url: String,
        workspace: String,
        token: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bbtui/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            workspace,
            token,
        })
    }

    /// `{base}/repositories/{workspace}/{repo}{path}`
    fn repo_url(&self, repo: &str, path: &str) -> String {
        format!(
            "{}/repositories/{}/{}{}",
            self.base_url,
            urlencoding::encode(&self.workspace),
            urlencoding::encode(repo),
            path
        )
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("Basic {}", self.token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(BbError::Transport(format!(
                "Bitbucket API {}: {}",
                status,
                text.trim()
            )));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.send(url).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.send(url).await?;
        Ok(response.text().await?)
    }

    /// Collect every page by following `next` links.
    async fn get_all<T: DeserializeOwned>(&self, url: String) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next.take() {
            let page: Page<T> = self.get_json(&url).await?;
            items.extend(page.values);
            next = page.next.filter(|n| !n.is_empty() && *n != url);
        }
        Ok(items)
    }
}

// Bitbucket Cloud response types

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    values: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Named {
    name: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiRepository {
    name: String,
    slug: String,
    uuid: String,
    updated_on: Option<String>,
    mainbranch: Option<Named>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiBranch {
    name: String,
    target: ApiBranchTarget,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiBranchTarget {
    hash: String,
    date: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiPullRequest {
    id: u64,
    title: String,
    description: Option<String>,
    state: String,
    draft: bool,
    author: ApiAccount,
    source: ApiEndpoint,
    destination: ApiEndpoint,
    created_on: Option<String>,
    updated_on: Option<String>,
    links: ApiLinks,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiAccount {
    display_name: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiEndpoint {
    branch: Named,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiLinks {
    html: ApiHref,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiHref {
    href: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiState {
    name: String,
    result: Option<Named>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiPipeline {
    uuid: String,
    build_number: u64,
    state: ApiState,
    target: ApiPipelineTarget,
    created_on: Option<String>,
    started_on: Option<String>,
    completed_on: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiPipelineTarget {
    ref_name: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiStep {
    uuid: String,
    name: String,
    state: ApiState,
    started_on: Option<String>,
    completed_on: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiCommit {
    hash: String,
    message: String,
    author: ApiCommitAuthor,
    date: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiCommitAuthor {
    raw: String,
    user: Option<ApiAccount>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiDiffStat {
    status: String,
    lines_added: u64,
    lines_removed: u64,
    old: Option<ApiPath>,
    new: Option<ApiPath>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiPath {
    path: String,
}

fn parse_datetime(s: Option<&str>) -> Option<DateTime<Utc>> {
    let s = s?.trim();
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

impl From<ApiRepository> for Repository {
    fn from(r: ApiRepository) -> Self {
        Repository {
            name: r.name,
            slug: r.slug,
            uuid: r.uuid,
            main_branch: r.mainbranch.map(|b| b.name).unwrap_or_default(),
            updated_on: parse_datetime(r.updated_on.as_deref()),
        }
    }
}

impl From<ApiBranch> for Branch {
    fn from(b: ApiBranch) -> Self {
        Branch {
            name: b.name,
            target_hash: b.target.hash,
            target_date: parse_datetime(b.target.date.as_deref()),
        }
    }
}

impl From<ApiPullRequest> for PullRequest {
    fn from(pr: ApiPullRequest) -> Self {
        PullRequest {
            id: pr.id,
            title: pr.title,
            description: pr.description.unwrap_or_default(),
            state: PrState::from_api(&pr.state),
            draft: pr.draft,
            author: pr.author.display_name,
            source_branch: pr.source.branch.name,
            destination_branch: pr.destination.branch.name,
            created_on: parse_datetime(pr.created_on.as_deref()),
            updated_on: parse_datetime(pr.updated_on.as_deref()),
            url: pr.links.html.href,
        }
    }
}

impl From<ApiPipeline> for Pipeline {
    fn from(p: ApiPipeline) -> Self {
        Pipeline {
            uuid: p.uuid,
            build_number: p.build_number,
            state: PipelineState::from_api(&p.state.name),
            result: PipelineResult::from_api(p.state.result.as_ref().map(|r| r.name.as_str())),
            branch: p.target.ref_name,
            created_on: parse_datetime(p.created_on.as_deref()),
            started_on: parse_datetime(p.started_on.as_deref()),
            completed_on: parse_datetime(p.completed_on.as_deref()),
        }
    }
}

impl From<ApiStep> for PipelineStep {
    fn from(s: ApiStep) -> Self {
        PipelineStep {
            uuid: s.uuid,
            name: s.name,
            state: PipelineState::from_api(&s.state.name),
            result: PipelineResult::from_api(s.state.result.as_ref().map(|r| r.name.as_str())),
            started_on: parse_datetime(s.started_on.as_deref()),
            completed_on: parse_datetime(s.completed_on.as_deref()),
        }
    }
}

impl From<ApiCommit> for Commit {
    fn from(c: ApiCommit) -> Self {
        let author = match c.author.user {
            Some(user) if !user.display_name.is_empty() => user.display_name,
            _ => author_name(&c.author.raw).to_string(),
        };
        Commit {
            hash: c.hash,
            message: c.message,
            author,
            date: parse_datetime(c.date.as_deref()),
        }
    }
}

impl From<ApiDiffStat> for CommitChange {
    fn from(d: ApiDiffStat) -> Self {
        let old = d.old.map(|p| p.path).filter(|p| !p.is_empty());
        let new = d.new.map(|p| p.path).filter(|p| !p.is_empty());
        let (path, old_path) = match (new, old) {
            (Some(new), Some(old)) if new != old => (new, Some(old)),
            (Some(new), _) => (new, None),
            (None, Some(old)) => (old, None),
            (None, None) => (String::new(), None),
        };
        CommitChange {
            status: d.status,
            path,
            old_path,
            lines_added: d.lines_added,
            lines_removed: d.lines_removed,
        }
    }
}

/// `Jane Doe <jane@example.com>` -> `Jane Doe`
fn author_name(raw: &str) -> &str {
    raw.split('<').next().unwrap_or(raw).trim()
}

#[async_trait]
impl DataProvider for Bitbucket {
    async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
        let url = format!(
            "{}/repositories/{}?pagelen=100",
            self.base_url,
            urlencoding::encode(&self.workspace)
        );
        let api: Vec<ApiRepository> = self.get_all(url).await?;
        let mut repos: Vec<Repository> = api.into_iter().map(Repository::from).collect();
        // None sorts last.
        repos.sort_by(|a, b| b.updated_on.cmp(&a.updated_on));
        Ok(repos)
    }

    async fn fetch_branches(&self, repo: &str) -> Result<Vec<Branch>> {
        let url = self.repo_url(repo, "/refs/branches?pagelen=100");
        let api: Vec<ApiBranch> = self.get_all(url).await?;
        Ok(api.into_iter().map(Branch::from).collect())
    }

    async fn fetch_pull_requests(&self, repo: &str) -> Result<Vec<PullRequest>> {
        let url = self.repo_url(repo, "/pullrequests?pagelen=50");
        let api: Vec<ApiPullRequest> = self.get_all(url).await?;
        Ok(api.into_iter().map(PullRequest::from).collect())
    }

    async fn fetch_pipelines(&self, repo: &str) -> Result<Vec<Pipeline>> {
        let url = self.repo_url(
            repo,
            &format!("/pipelines/?sort=-created_on&pagelen={}", PIPELINE_PAGE_LEN),
        );
        let page: Page<ApiPipeline> = self.get_json(&url).await?;
        Ok(page.values.into_iter().map(Pipeline::from).collect())
    }

    async fn fetch_pipeline(&self, repo: &str, pipeline: &str) -> Result<Pipeline> {
        let url = self.repo_url(
            repo,
            &format!("/pipelines/{}", urlencoding::encode(pipeline)),
        );
        let api: ApiPipeline = self.get_json(&url).await?;
        Ok(api.into())
    }

    async fn fetch_pipeline_steps(&self, repo: &str, pipeline: &str) -> Result<Vec<PipelineStep>> {
        let url = self.repo_url(
            repo,
            &format!("/pipelines/{}/steps/?pagelen=100", urlencoding::encode(pipeline)),
        );
        let api: Vec<ApiStep> = self.get_all(url).await?;
        Ok(api.into_iter().map(PipelineStep::from).collect())
    }

    async fn fetch_pipeline_step_log(
        &self,
        repo: &str,
        pipeline: &str,
        step: &str,
    ) -> Result<String> {
        let url = self.repo_url(
            repo,
            &format!(
                "/pipelines/{}/steps/{}/log",
                urlencoding::encode(pipeline),
                urlencoding::encode(step)
            ),
        );
        self.get_text(&url).await
    }

    async fn fetch_pull_request_commits(&self, repo: &str, pr: u64) -> Result<Vec<Commit>> {
        let url = self.repo_url(repo, &format!("/pullrequests/{}/commits?pagelen=50", pr));
        let api: Vec<ApiCommit> = self.get_all(url).await?;
        Ok(api.into_iter().map(Commit::from).collect())
    }

    async fn fetch_commit_changes(&self, repo: &str, hash: &str) -> Result<Vec<CommitChange>> {
        let url = self.repo_url(
            repo,
            &format!("/diffstat/{}?pagelen=100", urlencoding::encode(hash)),
        );
        let api: Vec<ApiDiffStat> = self.get_all(url).await?;
        Ok(api.into_iter().map(CommitChange::from).collect())
    }

    async fn fetch_commit_diff(&self, repo: &str, hash: &str) -> Result<String> {
        let url = self.repo_url(repo, &format!("/diff/{}", urlencoding::encode(hash)));
        self.get_text(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> Bitbucket {
        Bitbucket::with_base_url(
            server.uri(),
            "acme".to_string(),
            "dG9rZW4=".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn author_name_strips_email() {
        assert_eq!(author_name("Jane Doe <jane@example.com>"), "Jane Doe");
        assert_eq!(author_name("bot"), "bot");
    }

    #[test]
    fn renamed_file_keeps_old_path() {
        let change = CommitChange::from(ApiDiffStat {
            status: "renamed".to_string(),
            lines_added: 1,
            lines_removed: 2,
            old: Some(ApiPath {
                path: "a.rs".to_string(),
            }),
            new: Some(ApiPath {
                path: "b.rs".to_string(),
            }),
        });
        assert_eq!(change.path, "b.rs");
        assert_eq!(change.old_path.as_deref(), Some("a.rs"));

        let removed = CommitChange::from(ApiDiffStat {
            status: "removed".to_string(),
            old: Some(ApiPath {
                path: "gone.rs".to_string(),
            }),
            ..ApiDiffStat::default()
        });
        assert_eq!(removed.path, "gone.rs");
        assert_eq!(removed.old_path, None);
    }

    #[tokio::test]
    async fn repositories_follow_pages_and_sort_by_update() {
        let server = MockServer::start().await;
        let next = format!("{}/repositories/acme?pagelen=100&page=2", server.uri());

        Mock::given(method("GET"))
            .and(path("/repositories/acme"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [
                    {"name": "New", "slug": "new", "uuid": "{n}", "updated_on": "2024-05-02T10:00:00.000000+00:00"}
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repositories/acme"))
            .and(header("Authorization", "Basic dG9rZW4="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [
                    {"name": "Old", "slug": "old", "uuid": "{o}", "updated_on": "2023-01-01T00:00:00+00:00",
                     "mainbranch": {"name": "main"}}
                ],
                "next": next
            })))
            .mount(&server)
            .await;

        let repos = client(&server).await.fetch_repositories().await.unwrap();
        let slugs: Vec<&str> = repos.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(slugs, vec!["new", "old"]);
        assert_eq!(repos[1].main_branch, "main");
    }

    #[tokio::test]
    async fn pipelines_are_requested_newest_first() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repositories/acme/svc-a/pipelines/"))
            .and(query_param("sort", "-created_on"))
            .and(query_param("pagelen", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [
                    {
                        "uuid": "{p2}",
                        "build_number": 2,
                        "state": {"name": "IN_PROGRESS", "stage": {"name": "RUNNING"}},
                        "target": {"ref_name": "main"},
                        "created_on": "2024-05-02T10:00:00Z"
                    },
                    {
                        "uuid": "{p1}",
                        "build_number": 1,
                        "state": {"name": "COMPLETED", "result": {"name": "FAILED"}},
                        "target": {"ref_name": "develop"},
                        "created_on": "2024-05-01T10:00:00Z",
                        "completed_on": "2024-05-01T10:05:00Z"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let pipelines = client(&server).await.fetch_pipelines("svc-a").await.unwrap();
        assert_eq!(pipelines.len(), 2);
        assert!(pipelines[0].state.is_running());
        assert_eq!(pipelines[0].result, PipelineResult::None);
        assert_eq!(pipelines[1].result, PipelineResult::Failed);
        assert_eq!(pipelines[1].branch, "develop");
        assert!(pipelines[1].completed_on.is_some());
    }

    #[tokio::test]
    async fn pipeline_uuid_is_percent_encoded() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repositories/acme/svc-a/pipelines/%7Bp1%7D"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "uuid": "{p1}",
                "build_number": 7,
                "state": {"name": "COMPLETED", "result": {"name": "SUCCESSFUL"}},
                "target": {"ref_name": "main"}
            })))
            .mount(&server)
            .await;

        let pipeline = client(&server)
            .await
            .fetch_pipeline("svc-a", "{p1}")
            .await
            .unwrap();
        assert_eq!(pipeline.build_number, 7);
        assert_eq!(pipeline.result, PipelineResult::Successful);
    }

    #[tokio::test]
    async fn step_log_is_returned_verbatim() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repositories/acme/svc-a/pipelines/%7Bp%7D/steps/%7Bs%7D/log"))
            .respond_with(ResponseTemplate::new(200).set_body_string("+ cargo test\nok\n"))
            .mount(&server)
            .await;

        let log = client(&server)
            .await
            .fetch_pipeline_step_log("svc-a", "{p}", "{s}")
            .await
            .unwrap();
        assert_eq!(log, "+ cargo test\nok\n");
    }

    #[tokio::test]
    async fn pull_request_commits_prefer_display_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repositories/acme/svc-a/pullrequests/12/commits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [
                    {"hash": "abc", "message": "Fix\n", "author": {"raw": "J <j@x>", "user": {"display_name": "Jane"}}},
                    {"hash": "def", "message": "Bump", "author": {"raw": "ci-bot <ci@x>"}}
                ]
            })))
            .mount(&server)
            .await;

        let commits = client(&server)
            .await
            .fetch_pull_request_commits("svc-a", 12)
            .await
            .unwrap();
        assert_eq!(commits[0].author, "Jane");
        assert_eq!(commits[1].author, "ci-bot");
    }

    #[tokio::test]
    async fn error_status_is_a_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repositories/acme/svc-a/refs/branches"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Repository not found"))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .fetch_branches("svc-a")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("Repository not found"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repositories/acme/svc-a/pullrequests"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .fetch_pull_requests("svc-a")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
