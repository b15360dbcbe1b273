//! Issues provider requests for forward transitions and applies their results.
//!
//! Every list fetch carries a ticket. A result is applied only when the target
//! list still awaits that ticket and the request's identity matches the current
//! selection, so a fast navigation sequence can never let an older response
//! overwrite a newer view.

use tracing::{debug, warn};

use crate::action::{Command, Payload, Request, Ticket};
use crate::error::BbError;
use crate::filter::clamp_cursor;
use crate::launcher::EMPTY_LOG;
use crate::poll;
use crate::state::{AppState, ListKind, Pane, View};

/// Whether a list fetch starts a new list scope or reloads the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Fresh,
    Refresh,
}

/// Clear the target list, mark it loading and emit exactly one fetch.
pub fn issue(state: &mut AppState, request: Request, scope: Scope) -> Vec<Command> {
    let ticket = state.next_ticket();
    if let Some(kind) = ListKind::for_request(&request) {
        let list = state.list_mut(kind);
        match scope {
            Scope::Fresh => list.begin_load(ticket),
            Scope::Refresh => list.reload(ticket),
        }
        if kind == ListKind::Log {
            state.log_text.clear();
        }
    }
    debug!(ticket, ?request, "issuing fetch");
    vec![Command::Fetch { ticket, request }]
}

/// The request that loads `view` for the current selection, if it has one.
pub fn request_for(state: &AppState, view: View) -> Option<Request> {
    let repo = state.selection.repo_slug()?.to_string();
    match view {
        View::None => None,
        View::Branches => Some(Request::Branches { repo }),
        View::PullRequests => Some(Request::PullRequests { repo }),
        View::Pipelines => Some(Request::Pipelines { repo }),
        View::PipelineSteps => Some(Request::PipelineSteps {
            repo,
            pipeline: state.selection.pipeline_uuid()?.to_string(),
        }),
        View::PipelineStepLog => Some(Request::PipelineStepLog {
            repo,
            pipeline: state.selection.pipeline_uuid()?.to_string(),
            step: state.selection.step_uuid()?.to_string(),
        }),
        View::PullRequestCommits => Some(Request::PullRequestCommits {
            repo,
            pr: state.selection.pull_request_id()?,
        }),
    }
}

/// Does `request` still describe what the user has selected?
fn is_current(state: &AppState, request: &Request) -> bool {
    let sel = &state.selection;
    if request.repo().is_some_and(|repo| sel.repo_slug() != Some(repo)) {
        return false;
    }
    match request {
        Request::Repositories
        | Request::Branches { .. }
        | Request::PullRequests { .. }
        | Request::Pipelines { .. } => true,
        Request::PipelineSteps { pipeline, .. } | Request::Pipeline { pipeline, .. } => {
            sel.pipeline_uuid() == Some(pipeline.as_str())
        }
        Request::PipelineStepLog { pipeline, step, .. } => {
            sel.pipeline_uuid() == Some(pipeline.as_str())
                && sel.step_uuid() == Some(step.as_str())
        }
        Request::PullRequestCommits { pr, .. } => sel.pull_request_id() == Some(*pr),
        Request::CommitChanges { hash, .. } | Request::CommitDiff { hash, .. } => {
            sel.commit.as_deref() == Some(hash.as_str())
        }
    }
}

/// Apply a completed fetch to state.
pub fn apply(
    state: &mut AppState,
    ticket: Ticket,
    request: Request,
    result: Result<Payload, BbError>,
) -> Vec<Command> {
    match request {
        Request::Pipeline { repo, pipeline } => poll::on_polled(state, ticket, repo, pipeline, result),
        Request::CommitChanges { .. } | Request::CommitDiff { .. } => {
            apply_commit_part(state, request, result);
            Vec::new()
        }
        _ => apply_list(state, ticket, request, result),
    }
}

fn apply_list(
    state: &mut AppState,
    ticket: Ticket,
    request: Request,
    result: Result<Payload, BbError>,
) -> Vec<Command> {
    let Some(kind) = ListKind::for_request(&request) else {
        return Vec::new();
    };

    if !state.is_pending(kind, ticket) || !is_current(state, &request) {
        debug!(ticket, ?request, "discarding stale result");
        return Vec::new();
    }
    state.list_mut(kind).finish();

    let payload = match result {
        Ok(payload) => payload,
        Err(err) => {
            warn!(?request, error = %err, "fetch failed");
            state.set_error(err.kind(), format!("Error loading {}: {}", request.label(), err));
            return Vec::new();
        }
    };

    match payload {
        Payload::Repositories(repos) => {
            state.repos.items = repos;
            state.clamp(ListKind::Repos);
        }
        Payload::Branches(branches) => state.branches.fill(branches),
        Payload::PullRequests(prs) => state.pull_requests.fill(prs),
        Payload::Pipelines(pipelines) => {
            let previous = state.pipelines.previous_cursor();
            state.pipelines.items = pipelines;
            let len = state.filtered_pipelines().len();
            state.pipelines.cursor = clamp_cursor(previous, len);
            return poll::arm_if_live(state);
        }
        Payload::PipelineSteps(steps) => state.steps.fill(steps),
        Payload::PipelineStepLog(text) => {
            let lines = if text.trim().is_empty() {
                vec![EMPTY_LOG.to_string()]
            } else {
                text.split('\n').map(str::to_string).collect()
            };
            state.log_text = text;
            state.log_lines.fill(lines);
        }
        Payload::PullRequestCommits(commits) => {
            state.commits.fill(commits);
            return request_commit_details(state);
        }
        other => {
            warn!(?request, payload = ?other, "payload does not match request");
        }
    }
    Vec::new()
}

/// Record a commit change list or diff in the cache. Cache entries are keyed
/// by hash, so they are recorded even when the commit is no longer hovered.
fn apply_commit_part(state: &mut AppState, request: Request, result: Result<Payload, BbError>) {
    let current = is_current(state, &request);
    let (hash, label) = match &request {
        Request::CommitChanges { hash, .. } | Request::CommitDiff { hash, .. } => {
            (hash.as_str(), request.label())
        }
        _ => return,
    };

    match result {
        Ok(Payload::CommitChanges(changes)) => state.cache.record_changes(hash, Some(changes)),
        Ok(Payload::CommitDiff(diff)) => state.cache.record_diff(hash, Some(diff)),
        Ok(other) => warn!(?request, payload = ?other, "payload does not match request"),
        Err(err) => {
            match request {
                Request::CommitChanges { .. } => state.cache.record_changes(hash, None),
                _ => state.cache.record_diff(hash, None),
            }
            warn!(hash, error = %err, "commit detail fetch failed");
            if current {
                state.set_error(err.kind(), format!("Error loading {}: {}", label, err));
            }
        }
    }
}

/// Look up the hovered commit's details, requesting whatever is missing.
pub fn request_commit_details(state: &mut AppState) -> Vec<Command> {
    if state.view != View::PullRequestCommits || state.pane != Pane::DetailPane {
        state.selection.commit = None;
        return Vec::new();
    }

    let hash = state
        .hovered_commit()
        .map(|c| c.hash.trim().to_string())
        .filter(|h| !h.is_empty());
    let (Some(hash), Some(repo)) = (hash, state.selection.repo_slug().map(str::to_string)) else {
        state.selection.commit = None;
        return Vec::new();
    };

    state.selection.commit = Some(hash.clone());
    let ticket = state.next_ticket();
    let (_, commands) = state.cache.get_or_fetch(&repo, &hash, ticket);
    commands
}
