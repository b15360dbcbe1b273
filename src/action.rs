use std::time::Duration;

use crossterm::event::KeyEvent;

use crate::error::BbError;
use crate::types::{
    Branch, Commit, CommitChange, Pipeline, PipelineStep, PullRequest, Repository,
};

/// Identifies one issued list fetch. Results carry it back so that only the
/// latest request for a list is ever applied.
pub type Ticket = u64;

/// Identifies one armed poll chain.
pub type PollToken = u64;

/// A single call to the data provider, keyed by the identity it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Repositories,
    Branches {
        repo: String,
    },
    PullRequests {
        repo: String,
    },
    Pipelines {
        repo: String,
    },
    Pipeline {
        repo: String,
        pipeline: String,
    },
    PipelineSteps {
        repo: String,
        pipeline: String,
    },
    PipelineStepLog {
        repo: String,
        pipeline: String,
        step: String,
    },
    PullRequestCommits {
        repo: String,
        pr: u64,
    },
    CommitChanges {
        repo: String,
        hash: String,
    },
    CommitDiff {
        repo: String,
        hash: String,
    },
}

impl Request {
    /// Human label used in status messages.
    pub fn label(&self) -> &'static str {
        match self {
            Request::Repositories => "repos",
            Request::Branches { .. } => "branches",
            Request::PullRequests { .. } => "pull requests",
            Request::Pipelines { .. } => "pipelines",
            Request::Pipeline { .. } => "pipeline",
            Request::PipelineSteps { .. } => "pipeline steps",
            Request::PipelineStepLog { .. } => "pipeline log",
            Request::PullRequestCommits { .. } => "pull request commits",
            Request::CommitChanges { .. } => "commit changes",
            Request::CommitDiff { .. } => "commit diff",
        }
    }

    pub fn repo(&self) -> Option<&str> {
        match self {
            Request::Repositories => None,
            Request::Branches { repo }
            | Request::PullRequests { repo }
            | Request::Pipelines { repo }
            | Request::Pipeline { repo, .. }
            | Request::PipelineSteps { repo, .. }
            | Request::PipelineStepLog { repo, .. }
            | Request::PullRequestCommits { repo, .. }
            | Request::CommitChanges { repo, .. }
            | Request::CommitDiff { repo, .. } => Some(repo),
        }
    }
}

/// Successful provider response, one variant per request kind.
#[derive(Debug, Clone)]
pub enum Payload {
    Repositories(Vec<Repository>),
    Branches(Vec<Branch>),
    PullRequests(Vec<PullRequest>),
    Pipelines(Vec<Pipeline>),
    Pipeline(Box<Pipeline>),
    PipelineSteps(Vec<PipelineStep>),
    PipelineStepLog(String),
    PullRequestCommits(Vec<Commit>),
    CommitChanges(Vec<CommitChange>),
    CommitDiff(String),
}

/// Input to the state machine: a keypress, a resize, or a completed async job.
#[derive(Debug)]
pub enum Action {
    Init,
    Key(KeyEvent),
    Resize {
        width: u16,
        height: u16,
    },
    Fetched {
        ticket: Ticket,
        request: Request,
        result: Result<Payload, BbError>,
    },
    PollDue(PollToken),
    UrlOpened(Result<(), BbError>),
    ViewerClosed(Result<(), BbError>),
}

/// Side effect requested by the state machine. Executed outside of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fetch { ticket: Ticket, request: Request },
    SchedulePoll { token: PollToken, after: Duration },
    OpenUrl(String),
    OpenInViewer { text: String, title: String },
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_repo_identity() {
        assert_eq!(Request::Repositories.repo(), None);
        let req = Request::PipelineStepLog {
            repo: "svc-a".to_string(),
            pipeline: "{p}".to_string(),
            step: "{s}".to_string(),
        };
        assert_eq!(req.repo(), Some("svc-a"));
        assert_eq!(req.label(), "pipeline log");
    }
}
