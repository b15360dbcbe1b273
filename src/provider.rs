use async_trait::async_trait;

use crate::action::{Payload, Request};
use crate::error::Result;
use crate::types::{
    Branch, Commit, CommitChange, Pipeline, PipelineStep, PullRequest, Repository,
};

/// Read-only access to one workspace's repositories and CI data.
#[async_trait]
pub trait DataProvider: Send + Sync + std::fmt::Debug {
    async fn fetch_repositories(&self) -> Result<Vec<Repository>>;
    async fn fetch_branches(&self, repo: &str) -> Result<Vec<Branch>>;
    async fn fetch_pull_requests(&self, repo: &str) -> Result<Vec<PullRequest>>;
    /// Newest first.
    async fn fetch_pipelines(&self, repo: &str) -> Result<Vec<Pipeline>>;
    async fn fetch_pipeline(&self, repo: &str, pipeline: &str) -> Result<Pipeline>;
    async fn fetch_pipeline_steps(&self, repo: &str, pipeline: &str) -> Result<Vec<PipelineStep>>;
    /// Raw log text.
    async fn fetch_pipeline_step_log(&self, repo: &str, pipeline: &str, step: &str)
        -> Result<String>;
    async fn fetch_pull_request_commits(&self, repo: &str, pr: u64) -> Result<Vec<Commit>>;
    async fn fetch_commit_changes(&self, repo: &str, hash: &str) -> Result<Vec<CommitChange>>;
    /// Raw unified diff.
    async fn fetch_commit_diff(&self, repo: &str, hash: &str) -> Result<String>;
}

/// Run `request` against `provider`, wrapping the response in its payload variant.
pub async fn execute(provider: &dyn DataProvider, request: &Request) -> Result<Payload> {
    let payload = match request {
        Request::Repositories => Payload::Repositories(provider.fetch_repositories().await?),
        Request::Branches { repo } => Payload::Branches(provider.fetch_branches(repo).await?),
        Request::PullRequests { repo } => {
            Payload::PullRequests(provider.fetch_pull_requests(repo).await?)
        }
        Request::Pipelines { repo } => Payload::Pipelines(provider.fetch_pipelines(repo).await?),
        Request::Pipeline { repo, pipeline } => {
            Payload::Pipeline(Box::new(provider.fetch_pipeline(repo, pipeline).await?))
        }
        Request::PipelineSteps { repo, pipeline } => {
            Payload::PipelineSteps(provider.fetch_pipeline_steps(repo, pipeline).await?)
        }
        Request::PipelineStepLog {
            repo,
            pipeline,
            step,
        } => Payload::PipelineStepLog(
            provider
                .fetch_pipeline_step_log(repo, pipeline, step)
                .await?,
        ),
        Request::PullRequestCommits { repo, pr } => {
            Payload::PullRequestCommits(provider.fetch_pull_request_commits(repo, *pr).await?)
        }
        Request::CommitChanges { repo, hash } => {
            Payload::CommitChanges(provider.fetch_commit_changes(repo, hash).await?)
        }
        Request::CommitDiff { repo, hash } => {
            Payload::CommitDiff(provider.fetch_commit_diff(repo, hash).await?)
        }
    };
    Ok(payload)
}
