use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::action::{Action, Command, Request};
use crate::error::BbError;
use crate::fetch::{self, Scope};
use crate::poll;
use crate::state::{
    AppState, ListControl, ListKind, Pane, SelectedPipeline, SelectedPullRequest, SelectedRepo, SelectedStep,
    View,
};

/// Advance the state machine by one input.
pub fn handle(mut state: AppState, action: Action) -> (AppState, Vec<Command>) {
    let commands = update(&mut state, action);
    (state, commands)
}

/// In-place form of [`handle`], used by the event loop.
pub fn update(state: &mut AppState, action: Action) -> Vec<Command> {
    match action {
        Action::Init => fetch::issue(state, Request::Repositories, Scope::Fresh),
        Action::Key(key) => handle_key(state, key),
        Action::Resize { width, height } => {
            state.viewport = (width, height);
            Vec::new()
        }
        Action::Fetched {
            ticket,
            request,
            result,
        } => fetch::apply(state, ticket, request, result),
        Action::PollDue(token) => poll::on_due(state, token),
        Action::UrlOpened(result) => {
            match result {
                Ok(()) => state.set_info("Opened PR in browser"),
                Err(e) => state.set_error(e.kind(), format!("Open URL error: {}", e)),
            }
            Vec::new()
        }
        Action::ViewerClosed(result) => {
            match result {
                Ok(()) => state.set_info("Closed log viewer"),
                Err(e) => state.set_error(e.kind(), format!("Editor error: {}", e)),
            }
            Vec::new()
        }
    }
}

fn handle_key(state: &mut AppState, key: KeyEvent) -> Vec<Command> {
    state.status = None;

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return quit(state);
    }
    if state.filter_mode {
        return handle_filter_key(state, key);
    }

    match key.code {
        KeyCode::Char('q') => quit(state),
        KeyCode::Esc => back(state),
        KeyCode::Char('/') => {
            if state.active_list().is_some_and(ListKind::is_filterable) {
                state.filter_mode = true;
            }
            Vec::new()
        }
        KeyCode::Enter => select(state),
        KeyCode::Char('p') if state.pane == Pane::RepoList => open_repo(state, View::PullRequests),
        KeyCode::Char('b') if state.pane == Pane::RepoList => open_repo(state, View::Branches),
        KeyCode::Char('l') | KeyCode::Tab => lateral(state, 1),
        KeyCode::Char('h') | KeyCode::BackTab => lateral(state, -1),
        KeyCode::Char('j') | KeyCode::Down => move_cursor(state, Motion::Down),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(state, Motion::Up),
        KeyCode::Char('g') | KeyCode::Home => move_cursor(state, Motion::Top),
        KeyCode::Char('G') | KeyCode::End => move_cursor(state, Motion::Bottom),
        KeyCode::Char('r') => refresh(state),
        KeyCode::Char('o') => open_pull_request(state),
        KeyCode::Char('v') => open_viewer(state),
        _ => Vec::new(),
    }
}

/// Report a hovered item that cannot be acted on.
fn reject(state: &mut AppState, message: &str) {
    let err = BbError::EmptyIdentity(message.to_string());
    state.set_error(err.kind(), err.to_string());
}

fn quit(state: &mut AppState) -> Vec<Command> {
    state.should_quit = true;
    vec![Command::Quit]
}

fn handle_filter_key(state: &mut AppState, key: KeyEvent) -> Vec<Command> {
    let Some(kind) = state.active_list() else {
        state.filter_mode = false;
        return Vec::new();
    };

    match key.code {
        KeyCode::Esc => {
            state.list_mut(kind).query_mut().clear();
            state.filter_mode = false;
        }
        KeyCode::Enter => {
            state.filter_mode = false;
            return Vec::new();
        }
        KeyCode::Backspace => {
            state.list_mut(kind).query_mut().pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.list_mut(kind).query_mut().push(c);
        }
        _ => return Vec::new(),
    }

    *state.list_mut(kind).cursor_mut() = 0;
    after_cursor_change(state, kind)
}

/// Pop exactly one level.
fn back(state: &mut AppState) -> Vec<Command> {
    if state.pane != Pane::DetailPane {
        return Vec::new();
    }

    match state.view.parent() {
        Some(parent) => {
            match state.view {
                View::PipelineStepLog => {
                    state.log_lines.reset();
                    state.log_text.clear();
                }
                View::PipelineSteps => state.steps.reset(),
                View::PullRequestCommits => {
                    state.commits.reset();
                    state.selection.commit = None;
                }
                _ => {}
            }
            debug!(from = ?state.view, to = ?parent, "back");
            state.view = parent;
            poll::arm_if_live(state)
        }
        None => {
            debug!(from = ?state.view, "back to repo list");
            state.view = View::None;
            state.pane = Pane::RepoList;
            Vec::new()
        }
    }
}

fn select(state: &mut AppState) -> Vec<Command> {
    if state.pane == Pane::RepoList {
        return open_repo(state, View::PullRequests);
    }

    match state.view {
        View::Pipelines => {
            let Some((reference, uuid)) = state
                .hovered_pipeline()
                .map(|p| (p.reference(), p.uuid.trim().to_string()))
            else {
                return Vec::new();
            };
            if uuid.is_empty() {
                reject(state, "Selected pipeline has no UUID");
                return Vec::new();
            }
            state.selection.pipeline = Some(SelectedPipeline { reference, uuid });
            state.selection.step = None;
            drill(state, View::PipelineSteps)
        }
        View::PipelineSteps => {
            let Some((name, uuid)) = state
                .hovered_step()
                .map(|s| (s.name.trim().to_string(), s.uuid.trim().to_string()))
            else {
                return Vec::new();
            };
            if uuid.is_empty() {
                reject(state, "Selected step has no UUID");
                return Vec::new();
            }
            let name = if name.is_empty() { uuid.clone() } else { name };
            state.selection.step = Some(SelectedStep { name, uuid });
            drill(state, View::PipelineStepLog)
        }
        View::PullRequests => {
            let Some((id, title)) = state
                .hovered_pull_request()
                .map(|pr| (pr.id, pr.title.clone()))
            else {
                return Vec::new();
            };
            if id == 0 {
                reject(state, "Selected pull request has no ID");
                return Vec::new();
            }
            state.selection.pull_request = Some(SelectedPullRequest { id, title });
            state.selection.commit = None;
            drill(state, View::PullRequestCommits)
        }
        View::None | View::Branches | View::PipelineStepLog | View::PullRequestCommits => {
            Vec::new()
        }
    }
}

/// Select the hovered repo and open `view` for it.
fn open_repo(state: &mut AppState, view: View) -> Vec<Command> {
    let Some((name, slug)) = state
        .hovered_repo()
        .map(|r| (r.name.clone(), r.slug.trim().to_string()))
    else {
        return Vec::new();
    };
    if slug.is_empty() {
        reject(state, "Selected repo has no slug");
        return Vec::new();
    }

    state.selection.repo = Some(SelectedRepo { name, slug });
    state.selection.pipeline = None;
    state.selection.step = None;
    state.selection.pull_request = None;
    state.selection.commit = None;
    state.pane = Pane::DetailPane;
    drill(state, view)
}

/// Switch to `view` and load it from scratch.
fn drill(state: &mut AppState, view: View) -> Vec<Command> {
    debug!(from = ?state.view, to = ?view, "forward");
    state.view = view;
    state.filter_mode = false;
    match fetch::request_for(state, view) {
        Some(request) => fetch::issue(state, request, Scope::Fresh),
        None => Vec::new(),
    }
}

fn lateral(state: &mut AppState, step: isize) -> Vec<Command> {
    if state.pane != Pane::DetailPane || state.selection.repo.is_none() {
        return Vec::new();
    }
    match state.view.cycle(step) {
        Some(next) => drill(state, next),
        None => Vec::new(),
    }
}

fn refresh(state: &mut AppState) -> Vec<Command> {
    let request = match state.pane {
        Pane::RepoList => Some(Request::Repositories),
        Pane::DetailPane => match state.view {
            View::Branches | View::PullRequests | View::Pipelines | View::PipelineSteps => {
                fetch::request_for(state, state.view)
            }
            View::None | View::PipelineStepLog | View::PullRequestCommits => None,
        },
    };
    match request {
        Some(request) => fetch::issue(state, request, Scope::Refresh),
        None => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy)]
enum Motion {
    Up,
    Down,
    Top,
    Bottom,
}

fn move_cursor(state: &mut AppState, motion: Motion) -> Vec<Command> {
    let Some(kind) = state.active_list() else {
        return Vec::new();
    };
    let len = state.visible_len(kind);
    let cursor = state.list_mut(kind).cursor_mut();
    let before = *cursor;
    *cursor = match motion {
        Motion::Up => cursor.saturating_sub(1),
        Motion::Down => (*cursor + 1).min(len.saturating_sub(1)),
        Motion::Top => 0,
        Motion::Bottom => len.saturating_sub(1),
    };
    if *cursor == before {
        return Vec::new();
    }
    after_cursor_change(state, kind)
}

/// Follow-up work whenever the hovered item of `kind` may have changed.
fn after_cursor_change(state: &mut AppState, kind: ListKind) -> Vec<Command> {
    match kind {
        ListKind::Pipelines => poll::arm_if_live(state),
        ListKind::Commits => fetch::request_commit_details(state),
        _ => Vec::new(),
    }
}

fn open_pull_request(state: &mut AppState) -> Vec<Command> {
    if state.pane != Pane::DetailPane || state.view != View::PullRequests {
        return Vec::new();
    }
    let Some(pr) = state.hovered_pull_request() else {
        return Vec::new();
    };

    let url = pull_request_url(
        &pr.url,
        &state.settings.workspace,
        state.selection.repo_slug(),
        pr.id,
    );
    match url {
        Some(url) => vec![Command::OpenUrl(url)],
        None => {
            reject(state, "Selected PR has no URL");
            Vec::new()
        }
    }
}

/// The provider URL when it is a web link, otherwise the canonical one.
fn pull_request_url(url: &str, workspace: &str, slug: Option<&str>, id: u64) -> Option<String> {
    let url = url.trim();
    if url.starts_with("https://") || url.starts_with("http://") {
        return Some(url.to_string());
    }
    match slug {
        Some(slug) if !workspace.is_empty() && !slug.is_empty() && id > 0 => Some(format!(
            "https://bitbucket.org/{}/{}/pull-requests/{}",
            workspace, slug, id
        )),
        _ => None,
    }
}

fn open_viewer(state: &mut AppState) -> Vec<Command> {
    if state.pane != Pane::DetailPane {
        return Vec::new();
    }

    match state.view {
        View::PipelineStepLog => {
            if state.log_lines.loading {
                return Vec::new();
            }
            let title = match (&state.selection.pipeline, &state.selection.step) {
                (Some(pipeline), Some(step)) => format!("{} {}", pipeline.reference, step.name),
                (_, Some(step)) => step.name.clone(),
                _ => "pipeline".to_string(),
            };
            vec![Command::OpenInViewer {
                text: state.log_text.clone(),
                title,
            }]
        }
        View::PullRequestCommits => {
            let Some(hash) = state.selection.commit.clone() else {
                return Vec::new();
            };
            match state.cache.get(&hash).and_then(|d| d.diff.clone()) {
                Some(diff) => vec![Command::OpenInViewer {
                    text: diff,
                    title: short_hash(&hash).to_string(),
                }],
                None => {
                    state.set_info("Diff is still loading");
                    Vec::new()
                }
            }
        }
        _ => Vec::new(),
    }
}

fn short_hash(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}
