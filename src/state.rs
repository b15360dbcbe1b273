use std::time::Duration;

use crate::action::{Request, Ticket};
use crate::cache::CommitCache;
use crate::error::ErrorKind;
use crate::filter::{clamp_cursor, Searchable};
use crate::poll::PollScheduler;
use crate::types::{Branch, Commit, Pipeline, PipelineStep, PullRequest, Repository};

/// Drill-down level shown in the detail pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    None,
    Branches,
    PullRequests,
    Pipelines,
    PipelineSteps,
    PipelineStepLog,
    PullRequestCommits,
}

impl View {
    /// Views reachable laterally once a repo is selected, in cycle order.
    pub const SIBLINGS: [View; 3] = [View::PullRequests, View::Branches, View::Pipelines];

    /// The sibling `step` positions away in the cycle.
    pub fn cycle(self, step: isize) -> Option<View> {
        let index = View::SIBLINGS.iter().position(|v| *v == self)?;
        let len = View::SIBLINGS.len() as isize;
        let next = (index as isize + step).rem_euclid(len) as usize;
        Some(View::SIBLINGS[next])
    }

    /// The view "escape" returns to, or `None` when it leaves the detail pane.
    pub fn parent(self) -> Option<View> {
        match self {
            View::PipelineStepLog => Some(View::PipelineSteps),
            View::PipelineSteps => Some(View::Pipelines),
            View::PullRequestCommits => Some(View::PullRequests),
            View::None | View::Branches | View::PullRequests | View::Pipelines => None,
        }
    }
}

/// Which list owns keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    RepoList,
    DetailPane,
}

/// Every scrollable list held in state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Repos,
    Branches,
    PullRequests,
    Pipelines,
    Steps,
    Log,
    Commits,
}

impl ListKind {
    /// The list a request's result lands in. Polls and cache parts have none.
    pub fn for_request(request: &Request) -> Option<ListKind> {
        match request {
            Request::Repositories => Some(ListKind::Repos),
            Request::Branches { .. } => Some(ListKind::Branches),
            Request::PullRequests { .. } => Some(ListKind::PullRequests),
            Request::Pipelines { .. } => Some(ListKind::Pipelines),
            Request::PipelineSteps { .. } => Some(ListKind::Steps),
            Request::PipelineStepLog { .. } => Some(ListKind::Log),
            Request::PullRequestCommits { .. } => Some(ListKind::Commits),
            Request::Pipeline { .. } | Request::CommitChanges { .. } | Request::CommitDiff { .. } => {
                None
            }
        }
    }

    pub fn is_filterable(self) -> bool {
        matches!(
            self,
            ListKind::Repos | ListKind::Branches | ListKind::PullRequests | ListKind::Pipelines
        )
    }
}

#[derive(Debug, Clone)]
pub struct ListState<T> {
    pub items: Vec<T>,
    /// Index into the filtered items.
    pub cursor: usize,
    pub query: String,
    pub loading: bool,
    pending: Option<Ticket>,
    /// Cursor before the last reload; 0 after a fresh load.
    previous_cursor: usize,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
            query: String::new(),
            loading: false,
            pending: None,
            previous_cursor: 0,
        }
    }
}

impl<T> ListState<T> {
    /// Replace the items with a freshly loaded set.
    pub fn fill(&mut self, items: Vec<T>) {
        self.items = items;
        self.cursor = 0;
    }

    pub fn previous_cursor(&self) -> usize {
        self.previous_cursor
    }
}

/// Type-erased handle on a [`ListState`] used by the fetch orchestrator.
pub trait ListControl {
    /// Enter a new list scope: drop items, query and cursor, await `ticket`.
    fn begin_load(&mut self, ticket: Ticket);
    /// Reload the same scope: drop items and cursor, keep the query.
    fn reload(&mut self, ticket: Ticket);
    /// Forget everything, including any pending request.
    fn reset(&mut self);
    fn is_pending(&self, ticket: Ticket) -> bool;
    fn finish(&mut self);
    fn cursor_mut(&mut self) -> &mut usize;
    fn query_mut(&mut self) -> &mut String;
}

impl<T> ListControl for ListState<T> {
    fn begin_load(&mut self, ticket: Ticket) {
        self.query.clear();
        self.reload(ticket);
        self.previous_cursor = 0;
    }

    fn reload(&mut self, ticket: Ticket) {
        self.previous_cursor = self.cursor;
        self.items.clear();
        self.cursor = 0;
        self.loading = true;
        self.pending = Some(ticket);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn is_pending(&self, ticket: Ticket) -> bool {
        self.pending == Some(ticket)
    }

    fn finish(&mut self) {
        self.loading = false;
        self.pending = None;
    }

    fn cursor_mut(&mut self) -> &mut usize {
        &mut self.cursor
    }

    fn query_mut(&mut self) -> &mut String {
        &mut self.query
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedRepo {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedPipeline {
    /// Display reference such as `#42`.
    pub reference: String,
    pub uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedStep {
    pub name: String,
    pub uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedPullRequest {
    pub id: u64,
    pub title: String,
}

/// Identities chosen on forward navigation. Backward navigation leaves them
/// in place; the next forward move overwrites them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub repo: Option<SelectedRepo>,
    pub pipeline: Option<SelectedPipeline>,
    pub step: Option<SelectedStep>,
    pub pull_request: Option<SelectedPullRequest>,
    pub commit: Option<String>,
}

impl Selection {
    pub fn repo_slug(&self) -> Option<&str> {
        self.repo.as_ref().map(|r| r.slug.as_str())
    }

    pub fn pipeline_uuid(&self) -> Option<&str> {
        self.pipeline.as_ref().map(|p| p.uuid.as_str())
    }

    pub fn step_uuid(&self) -> Option<&str> {
        self.step.as_ref().map(|s| s.uuid.as_str())
    }

    pub fn pull_request_id(&self) -> Option<u64> {
        self.pull_request.as_ref().map(|p| p.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTag {
    Info,
    Error(ErrorKind),
}

/// Transient message shown until the next keypress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub tag: StatusTag,
    pub text: String,
}

impl Status {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            tag: StatusTag::Info,
            text: text.into(),
        }
    }

    pub fn error(kind: ErrorKind, text: impl Into<String>) -> Self {
        Self {
            tag: StatusTag::Error(kind),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub workspace: String,
    pub poll_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace: String::new(),
            poll_interval: Duration::from_secs(8),
        }
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    pub view: View,
    pub pane: Pane,
    pub filter_mode: bool,
    pub selection: Selection,

    pub repos: ListState<Repository>,
    pub branches: ListState<Branch>,
    pub pull_requests: ListState<PullRequest>,
    pub pipelines: ListState<Pipeline>,
    pub steps: ListState<PipelineStep>,
    pub log_lines: ListState<String>,
    pub log_text: String,
    pub commits: ListState<Commit>,

    pub cache: CommitCache,
    pub poll: PollScheduler,
    pub status: Option<Status>,
    pub viewport: (u16, u16),
    pub settings: Settings,
    pub should_quit: bool,
    next_ticket: Ticket,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn next_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        self.next_ticket
    }

    /// The list that currently owns keyboard focus.
    pub fn active_list(&self) -> Option<ListKind> {
        match self.pane {
            Pane::RepoList => Some(ListKind::Repos),
            Pane::DetailPane => match self.view {
                View::None => None,
                View::Branches => Some(ListKind::Branches),
                View::PullRequests => Some(ListKind::PullRequests),
                View::Pipelines => Some(ListKind::Pipelines),
                View::PipelineSteps => Some(ListKind::Steps),
                View::PipelineStepLog => Some(ListKind::Log),
                View::PullRequestCommits => Some(ListKind::Commits),
            },
        }
    }

    pub fn list_mut(&mut self, kind: ListKind) -> &mut dyn ListControl {
        match kind {
            ListKind::Repos => &mut self.repos,
            ListKind::Branches => &mut self.branches,
            ListKind::PullRequests => &mut self.pull_requests,
            ListKind::Pipelines => &mut self.pipelines,
            ListKind::Steps => &mut self.steps,
            ListKind::Log => &mut self.log_lines,
            ListKind::Commits => &mut self.commits,
        }
    }

    pub fn is_pending(&self, kind: ListKind, ticket: Ticket) -> bool {
        match kind {
            ListKind::Repos => self.repos.is_pending(ticket),
            ListKind::Branches => self.branches.is_pending(ticket),
            ListKind::PullRequests => self.pull_requests.is_pending(ticket),
            ListKind::Pipelines => self.pipelines.is_pending(ticket),
            ListKind::Steps => self.steps.is_pending(ticket),
            ListKind::Log => self.log_lines.is_pending(ticket),
            ListKind::Commits => self.commits.is_pending(ticket),
        }
    }

    pub fn query(&self, kind: ListKind) -> &str {
        match kind {
            ListKind::Repos => &self.repos.query,
            ListKind::Branches => &self.branches.query,
            ListKind::PullRequests => &self.pull_requests.query,
            ListKind::Pipelines => &self.pipelines.query,
            ListKind::Steps => &self.steps.query,
            ListKind::Log => &self.log_lines.query,
            ListKind::Commits => &self.commits.query,
        }
    }

    /// Number of rows the cursor can move over.
    pub fn visible_len(&self, kind: ListKind) -> usize {
        match kind {
            ListKind::Repos => self.filtered_repos().len(),
            ListKind::Branches => self.filtered_branches().len(),
            ListKind::PullRequests => self.filtered_pull_requests().len(),
            ListKind::Pipelines => self.filtered_pipelines().len(),
            ListKind::Steps => self.steps.items.len(),
            ListKind::Log => self.log_lines.items.len(),
            ListKind::Commits => self.commits.items.len(),
        }
    }

    pub fn filtered_repos(&self) -> Vec<&Repository> {
        Repository::filtered(&self.repos.items, &self.repos.query)
    }

    pub fn filtered_branches(&self) -> Vec<&Branch> {
        Branch::filtered(&self.branches.items, &self.branches.query)
    }

    pub fn filtered_pull_requests(&self) -> Vec<&PullRequest> {
        PullRequest::filtered(&self.pull_requests.items, &self.pull_requests.query)
    }

    pub fn filtered_pipelines(&self) -> Vec<&Pipeline> {
        Pipeline::filtered(&self.pipelines.items, &self.pipelines.query)
    }

    pub fn hovered_repo(&self) -> Option<&Repository> {
        self.filtered_repos().get(self.repos.cursor).copied()
    }

    pub fn hovered_pull_request(&self) -> Option<&PullRequest> {
        self.filtered_pull_requests()
            .get(self.pull_requests.cursor)
            .copied()
    }

    pub fn hovered_pipeline(&self) -> Option<&Pipeline> {
        self.filtered_pipelines().get(self.pipelines.cursor).copied()
    }

    pub fn hovered_step(&self) -> Option<&PipelineStep> {
        self.steps.items.get(self.steps.cursor)
    }

    pub fn hovered_commit(&self) -> Option<&Commit> {
        self.commits.items.get(self.commits.cursor)
    }

    /// Re-establish the cursor invariant for `kind` after its contents changed.
    pub fn clamp(&mut self, kind: ListKind) {
        let len = self.visible_len(kind);
        let cursor = self.list_mut(kind).cursor_mut();
        *cursor = clamp_cursor(*cursor, len);
    }

    pub fn set_error(&mut self, kind: ErrorKind, text: impl Into<String>) {
        self.status = Some(Status::error(kind, text));
    }

    pub fn set_info(&mut self, text: impl Into<String>) {
        self.status = Some(Status::info(text));
    }
}
