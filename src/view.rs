//! Structured description of one frame, built from state alone.
//!
//! Nothing here touches the terminal: rows carry semantic [`Tag`]s that the
//! `ui` module maps to colors.

use chrono::{DateTime, Local, Utc};

use crate::filter::{normalize_branch, window, TRACKED_BRANCHES};
use crate::state::{AppState, ListState, Pane, Status, View};
use crate::types::{PipelineResult, PipelineState, PrState};

/// Rows taken by the header and the status line.
const CHROME_ROWS: u16 = 2;
/// Borders around a panel.
const PANEL_BORDER_ROWS: u16 = 2;
/// Height of the sibling tab strip.
const TAB_ROWS: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Plain,
    Muted,
    Id,
    Author,
    Heading,
    Success,
    Failure,
    Warning,
    Running,
    Completed,
    DiffAdded,
    DiffRemoved,
    DiffHunk,
    Branch(BranchTone),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchTone {
    Develop,
    Staging,
    Main,
    Master,
    Missing,
    /// Index into a fixed palette, derived from the branch name.
    Hashed(u8),
}

pub const BRANCH_PALETTE_LEN: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub tag: Tag,
}

impl Span {
    fn new(text: impl Into<String>, tag: Tag) -> Self {
        Self {
            text: text.into(),
            tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub spans: Vec<Span>,
    pub selected: bool,
}

impl Row {
    fn plain(text: impl Into<String>, tag: Tag) -> Self {
        Self {
            spans: vec![Span::new(text, tag)],
            selected: false,
        }
    }

    /// Concatenated text, mostly useful in tests.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub title: String,
    pub focused: bool,
    pub rows: Vec<Row>,
    /// Shown instead of rows when there is nothing to list.
    pub placeholder: Option<String>,
    pub more_above: bool,
    pub more_below: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tabs {
    pub titles: Vec<&'static str>,
    pub active: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detail {
    List(Panel),
    /// Commit list with the hovered commit's changes and diff beside it.
    Split { list: Panel, side: Panel },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Filter(String),
    Message(Status),
    Help(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub header: String,
    pub repos: Option<Panel>,
    pub tabs: Option<Tabs>,
    pub detail: Option<Detail>,
    pub status: StatusLine,
}

pub fn render(state: &AppState) -> Layout {
    render_at(state, Utc::now())
}

pub fn render_at(state: &AppState, now: DateTime<Utc>) -> Layout {
    let show_repos = state.view == View::None || state.pane == Pane::RepoList;
    let body = state.viewport.1.saturating_sub(CHROME_ROWS);

    let repos = show_repos.then(|| repo_panel(state, body.saturating_sub(PANEL_BORDER_ROWS)));
    let detail_rows = body.saturating_sub(TAB_ROWS + PANEL_BORDER_ROWS) as usize;
    let detail = detail_panel(state, detail_rows, show_repos, now);
    let tabs = detail.as_ref().map(|_| Tabs {
        titles: vec!["Pull Requests", "Branches", "Pipelines"],
        active: match state.view {
            View::Branches => 1,
            View::Pipelines | View::PipelineSteps | View::PipelineStepLog => 2,
            _ => 0,
        },
    });

    Layout {
        header: header(state),
        repos,
        tabs,
        detail,
        status: status_line(state),
    }
}

fn header(state: &AppState) -> String {
    let mut header = format!("bbtui - {}", state.settings.workspace);
    if let Some(repo) = &state.selection.repo {
        header.push_str(" / ");
        header.push_str(&repo.name);
    }
    header
}

fn status_line(state: &AppState) -> StatusLine {
    if state.filter_mode {
        let query = state
            .active_list()
            .map(|kind| state.query(kind).to_string())
            .unwrap_or_default();
        return StatusLine::Filter(query);
    }
    if let Some(status) = &state.status {
        return StatusLine::Message(status.clone());
    }
    StatusLine::Help(help_text(state))
}

fn help_text(state: &AppState) -> &'static str {
    if state.pane == Pane::RepoList || state.view == View::None {
        return "j/k: navigate  enter/p: pull requests  b: branches  /: filter  r: refresh  q: quit";
    }
    match state.view {
        View::PullRequests => {
            "h/l: switch tabs  enter: commits  o: open in browser  esc: back  r: refresh  /: filter  q: quit"
        }
        View::Pipelines => {
            "h/l: switch tabs  enter: view steps  esc: back  j/k: navigate  r: refresh  /: filter  q: quit"
        }
        View::PipelineSteps => "enter: view logs  esc: back to pipelines  j/k: navigate  r: refresh  q: quit",
        View::PipelineStepLog => "v: open in viewer  esc: back to steps  j/k: scroll logs  q: quit",
        View::PullRequestCommits => "j/k: select commit  v: open diff  esc: back to pull requests  q: quit",
        View::Branches | View::None => {
            "h/l: switch tabs  esc: back  j/k: navigate  r: refresh  /: filter  q: quit"
        }
    }
}

fn with_query(mut title: String, query: &str) -> String {
    if !query.is_empty() {
        title.push_str(&format!(" [/{}]", query));
    }
    title
}

/// Build the visible slice of `items` around `cursor`.
fn windowed<T>(
    items: &[T],
    cursor: usize,
    height: usize,
    focused: bool,
    row: impl Fn(&T) -> Vec<Span>,
) -> (Vec<Row>, bool, bool) {
    let (start, end) = window(cursor, items.len(), height);
    let rows = items[start..end]
        .iter()
        .enumerate()
        .map(|(offset, item)| Row {
            spans: row(item),
            selected: focused && start + offset == cursor,
        })
        .collect();
    (rows, start > 0, end < items.len())
}

/// Panel over a list, with the usual loading and empty placeholders.
fn list_panel<T, I>(
    title: String,
    list: &ListState<I>,
    visible: &[T],
    height: usize,
    focused: bool,
    (empty, no_match): (&str, &str),
    row: impl Fn(&T) -> Vec<Span>,
) -> Panel {
    let placeholder = if list.loading {
        Some("Loading...".to_string())
    } else if list.items.is_empty() {
        Some(empty.to_string())
    } else if visible.is_empty() {
        Some(no_match.to_string())
    } else {
        None
    };

    let (rows, more_above, more_below) = match placeholder {
        Some(_) => (Vec::new(), false, false),
        None => windowed(visible, list.cursor, height, focused, row),
    };

    Panel {
        title,
        focused,
        rows,
        placeholder,
        more_above,
        more_below,
    }
}

fn repo_panel(state: &AppState, height: u16) -> Panel {
    let repos = state.filtered_repos();
    list_panel(
        with_query("Repositories".to_string(), &state.repos.query),
        &state.repos,
        &repos,
        height as usize,
        state.pane == Pane::RepoList,
        ("No repositories", "No matches"),
        |repo| vec![Span::new(repo.name.clone(), Tag::Plain)],
    )
}

fn detail_panel(
    state: &AppState,
    height: usize,
    show_repos: bool,
    now: DateTime<Utc>,
) -> Option<Detail> {
    let focused = state.pane == Pane::DetailPane;
    let repo = state
        .selection
        .repo
        .as_ref()
        .map(|r| format!(" ({})", r.name))
        .unwrap_or_default();
    let back = if show_repos { "" } else { " (esc: back)" };

    let panel = match state.view {
        View::None => return None,
        View::Branches => {
            let branches = state.filtered_branches();
            list_panel(
                with_query(format!("Branches{}", repo), &state.branches.query) + back,
                &state.branches,
                &branches,
                height,
                focused,
                ("No branches", "No matches"),
                |b| {
                    vec![
                        Span::new(b.name.clone(), Tag::Plain),
                        Span::new(format!("  {}", short(&b.target_hash, 8)), Tag::Id),
                        Span::new(
                            b.target_date
                                .map(|d| format!("  {}", time_ago(d, now)))
                                .unwrap_or_default(),
                            Tag::Muted,
                        ),
                    ]
                },
            )
        }
        View::PullRequests => {
            let prs = state.filtered_pull_requests();
            list_panel(
                with_query(format!("Pull Requests{}", repo), &state.pull_requests.query) + back,
                &state.pull_requests,
                &prs,
                height,
                focused,
                ("No pull requests", "No matches"),
                |pr| {
                    let (badge, tag) = pr_badge(&pr.state, pr.draft);
                    vec![
                        Span::new(format!("#{} ", pr.id), Tag::Id),
                        Span::new(badge, tag),
                        Span::new(format!(" @{} ", pr.author), Tag::Author),
                        Span::new(pr.title.clone(), Tag::Plain),
                    ]
                },
            )
        }
        View::Pipelines => {
            let pipelines = state.filtered_pipelines();
            let title = format!("Pipelines{} [{}]", repo, TRACKED_BRANCHES.join("/"));
            let no_match = if state.pipelines.query.is_empty() {
                "No pipelines for tracked branches"
            } else {
                "No matches"
            };
            list_panel(
                with_query(title, &state.pipelines.query) + back,
                &state.pipelines,
                &pipelines,
                height,
                focused,
                ("No pipelines", no_match),
                |p| {
                    let branch = normalize_branch(&p.branch);
                    let (state_badge, state_tag) = pipeline_state_badge(&p.state);
                    let (result_badge, result_tag) = result_badge(&p.result);
                    let mut spans = vec![
                        Span::new(format!("#{} ", p.build_number), Tag::Id),
                        Span::new(format!("{:<12} ", branch), Tag::Branch(branch_tone(branch))),
                        Span::new(state_badge, state_tag),
                        Span::new(" ", Tag::Plain),
                        Span::new(result_badge, result_tag),
                        Span::new(
                            format!(" created: {}", short_timestamp(p.created_on)),
                            Tag::Muted,
                        ),
                    ];
                    if let Some(d) = duration(p.started_on.or(p.created_on), p.completed_on, now) {
                        spans.push(Span::new(format!(" duration: {}", d), Tag::Muted));
                    }
                    if let Some(done) = p.completed_on {
                        spans.push(Span::new(
                            format!(" completed: {}", time_ago(done, now)),
                            Tag::Muted,
                        ));
                    }
                    spans
                },
            )
        }
        View::PipelineSteps => {
            let reference = pipeline_reference(state);
            list_panel(
                format!("Pipeline Steps{}{}{}", repo, reference, back),
                &state.steps,
                &state.steps.items,
                height,
                focused,
                ("No steps", "No steps"),
                |s| {
                    let (state_badge, state_tag) = pipeline_state_badge(&s.state);
                    let (result_badge, result_tag) = result_badge(&s.result);
                    let mut spans = vec![
                        Span::new(state_badge, state_tag),
                        Span::new(" ", Tag::Plain),
                        Span::new(result_badge, result_tag),
                        Span::new(format!(" {}", s.name), Tag::Plain),
                    ];
                    if let Some(d) = duration(s.started_on, s.completed_on, now) {
                        spans.push(Span::new(format!(" ({})", d), Tag::Muted));
                    }
                    spans
                },
            )
        }
        View::PipelineStepLog => {
            let step = state
                .selection
                .step
                .as_ref()
                .map(|s| format!(" - {}", s.name))
                .unwrap_or_default();
            list_panel(
                format!(
                    "Pipeline Logs{}{}{}{}",
                    repo,
                    pipeline_reference(state),
                    step,
                    back
                ),
                &state.log_lines,
                &state.log_lines.items,
                height,
                focused,
                ("No logs", "No logs"),
                |line| vec![Span::new(line.clone(), Tag::Plain)],
            )
        }
        View::PullRequestCommits => {
            let title = match &state.selection.pull_request {
                Some(pr) if !pr.title.trim().is_empty() => {
                    format!("PR #{} commits ({}){}", pr.id, pr.title, back)
                }
                Some(pr) => format!("PR #{} commits{}", pr.id, back),
                None => format!("Commits{}", back),
            };
            let list = list_panel(
                title,
                &state.commits,
                &state.commits.items,
                height,
                focused,
                ("No commits", "No commits"),
                |c| {
                    let author = if c.author.trim().is_empty() {
                        "unknown"
                    } else {
                        c.author.trim()
                    };
                    vec![
                        Span::new(format!("{} ", short(&c.hash, 8)), Tag::Id),
                        Span::new(format!("@{} ", author), Tag::Author),
                        Span::new(c.summary().to_string(), Tag::Plain),
                    ]
                },
            );
            let side = diff_panel(state, height);
            return Some(Detail::Split { list, side });
        }
    };
    Some(Detail::List(panel))
}

fn pipeline_reference(state: &AppState) -> String {
    state
        .selection
        .pipeline
        .as_ref()
        .map(|p| format!(" {}", p.reference))
        .unwrap_or_default()
}

/// Changes and diff of the hovered commit.
fn diff_panel(state: &AppState, height: usize) -> Panel {
    let mut panel = Panel {
        title: "Diff".to_string(),
        focused: false,
        rows: Vec::new(),
        placeholder: None,
        more_above: false,
        more_below: false,
    };

    let Some(hash) = state.selection.commit.as_deref() else {
        panel.placeholder = Some("Select a commit".to_string());
        return panel;
    };

    let details = state.cache.get(hash);
    let mut rows = vec![Row::plain(format!("commit {}", short(hash, 12)), Tag::Heading)];
    if let Some(changes) = details.and_then(|d| d.changes.as_ref()) {
        rows.push(Row::plain(
            format!("files changed: {}", changes.len()),
            Tag::Muted,
        ));
        for change in changes {
            let path = match &change.old_path {
                Some(old) => format!("{} -> {}", old, change.path),
                None => change.path.clone(),
            };
            rows.push(Row {
                spans: vec![
                    Span::new(format!("  {} ", change_marker(&change.status)), Tag::Muted),
                    Span::new(path, Tag::Plain),
                    Span::new(format!(" +{}", change.lines_added), Tag::DiffAdded),
                    Span::new(format!(" -{}", change.lines_removed), Tag::DiffRemoved),
                ],
                selected: false,
            });
        }
    }
    rows.push(Row::plain("", Tag::Plain));

    match details.and_then(|d| d.diff.as_deref()) {
        None if state.cache.is_in_flight(hash) => {
            rows.push(Row::plain("Loading diff...", Tag::Muted));
        }
        None => rows.push(Row::plain("Diff unavailable", Tag::Muted)),
        Some(diff) if diff.trim().is_empty() => {
            rows.push(Row::plain("No textual diff", Tag::Muted));
        }
        Some(diff) => {
            let budget = height.saturating_sub(rows.len()).max(1);
            let lines: Vec<&str> = diff.lines().collect();
            rows.extend(
                lines
                    .iter()
                    .take(budget)
                    .map(|line| Row::plain(*line, diff_tag(line))),
            );
            if lines.len() > budget {
                panel.more_below = true;
                rows.push(Row::plain(
                    format!("  +{} more diff lines", lines.len() - budget),
                    Tag::Muted,
                ));
            }
        }
    }

    panel.rows = rows;
    panel
}

fn change_marker(status: &str) -> &'static str {
    match status {
        "added" => "A",
        "removed" => "D",
        "renamed" => "R",
        _ => "M",
    }
}

fn diff_tag(line: &str) -> Tag {
    if line.starts_with("+++") || line.starts_with("---") || line.starts_with("diff ") {
        Tag::Heading
    } else if line.starts_with('+') {
        Tag::DiffAdded
    } else if line.starts_with('-') {
        Tag::DiffRemoved
    } else if line.starts_with("@@") {
        Tag::DiffHunk
    } else {
        Tag::Plain
    }
}

fn short(hash: &str, len: usize) -> &str {
    hash.get(..len).unwrap_or(hash)
}

pub fn pr_badge(state: &PrState, draft: bool) -> (String, Tag) {
    match state {
        PrState::Open if draft => ("[DRAFT]".to_string(), Tag::Muted),
        PrState::Open => ("[OPEN]".to_string(), Tag::Success),
        PrState::Merged => ("[MERGED]".to_string(), Tag::Completed),
        PrState::Declined => ("[DECLINED]".to_string(), Tag::Failure),
        PrState::Superseded => ("[SUPERSEDED]".to_string(), Tag::Muted),
        PrState::Other(_) => (format!("[{}]", state), Tag::Plain),
    }
}

pub fn pipeline_state_badge(state: &PipelineState) -> (String, Tag) {
    let tag = match state {
        PipelineState::Completed => Tag::Completed,
        PipelineState::InProgress => Tag::Running,
        PipelineState::Pending | PipelineState::Paused => Tag::Warning,
        PipelineState::Error => Tag::Failure,
        PipelineState::Other(_) => Tag::Plain,
    };
    (format!("[{}]", state), tag)
}

pub fn result_badge(result: &PipelineResult) -> (String, Tag) {
    let tag = match result {
        PipelineResult::Successful => Tag::Success,
        PipelineResult::Failed => Tag::Failure,
        PipelineResult::Stopped => Tag::Warning,
        PipelineResult::Expired | PipelineResult::None => Tag::Muted,
        PipelineResult::Other(_) => Tag::Plain,
    };
    (format!("[{}]", result), tag)
}

/// Fixed tones for tracked branches, a stable hashed tone for the rest.
pub fn branch_tone(branch: &str) -> BranchTone {
    match branch.trim().to_lowercase().as_str() {
        "develop" => BranchTone::Develop,
        "staging" => BranchTone::Staging,
        "main" => BranchTone::Main,
        "master" => BranchTone::Master,
        "-" | "" => BranchTone::Missing,
        _ => BranchTone::Hashed((fnv1a(branch) % BRANCH_PALETTE_LEN) as u8),
    }
}

fn fnv1a(text: &str) -> u32 {
    text.bytes().fold(0x811c_9dc5_u32, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    })
}

/// Local `YYYY-MM-DD HH:MM`, or `-` when unknown.
pub fn short_timestamp(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Elapsed time from `start` to `end` (or `now` while still running).
pub fn duration(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<String> {
    let start = start?;
    let elapsed = end.unwrap_or(now).signed_duration_since(start);
    if elapsed < chrono::Duration::zero() {
        return None;
    }

    let secs = elapsed.num_seconds();
    Some(if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h{}m", secs / 3600, (secs / 60) % 60)
    })
}

pub fn time_ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);
    let plural = |n: i64, one: &str, many: &str| {
        if n == 1 {
            format!("1 {} ago", one)
        } else {
            format!("{} {} ago", n, many)
        }
    };

    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        plural(elapsed.num_minutes(), "min", "mins")
    } else if elapsed.num_days() < 1 {
        plural(elapsed.num_hours(), "hr", "hrs")
    } else {
        plural(elapsed.num_days(), "day", "days")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{SelectedPullRequest, SelectedRepo};
    use crate::types::{Commit, CommitChange, Pipeline, Repository};
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    fn repo(name: &str) -> Repository {
        Repository {
            name: name.to_string(),
            slug: name.to_string(),
            uuid: String::new(),
            main_branch: "main".to_string(),
            updated_on: None,
        }
    }

    fn pipeline(build: u64, branch: &str) -> Pipeline {
        Pipeline {
            uuid: format!("{{{}}}", build),
            build_number: build,
            state: PipelineState::Completed,
            result: PipelineResult::Successful,
            branch: branch.to_string(),
            created_on: Some(at(10, 0, 0)),
            started_on: None,
            completed_on: Some(at(10, 5, 30)),
        }
    }

    fn sized(height: u16) -> AppState {
        let mut state = AppState::default();
        state.viewport = (100, height);
        state
    }

    fn detail_list(layout: &Layout) -> &Panel {
        match layout.detail.as_ref() {
            Some(Detail::List(panel)) => panel,
            other => panic!("expected list detail, got {:?}", other),
        }
    }

    #[test]
    fn repo_pane_scrolls_with_markers() {
        // 10 rows of body, 8 rows inside the borders
        let mut state = sized(12);
        state.repos.items = (0..20).map(|i| repo(&format!("repo-{:02}", i))).collect();
        state.repos.cursor = 10;

        let layout = render(&state);
        let panel = layout.repos.expect("repo pane");
        assert_eq!(panel.rows.len(), 8);
        assert!(panel.more_above);
        assert!(panel.more_below);
        let selected: Vec<String> = panel
            .rows
            .iter()
            .filter(|r| r.selected)
            .map(Row::text)
            .collect();
        assert_eq!(selected, vec!["repo-10".to_string()]);
        assert!(layout.detail.is_none());
    }

    #[test]
    fn loading_and_empty_placeholders() {
        let mut state = sized(20);
        state.repos.loading = true;
        assert_eq!(
            render(&state).repos.unwrap().placeholder.as_deref(),
            Some("Loading...")
        );

        state.repos.loading = false;
        assert_eq!(
            render(&state).repos.unwrap().placeholder.as_deref(),
            Some("No repositories")
        );

        state.repos.items = vec![repo("alpha")];
        state.repos.query = "zzz".to_string();
        let panel = render(&state).repos.unwrap();
        assert_eq!(panel.placeholder.as_deref(), Some("No matches"));
        assert_eq!(panel.title, "Repositories [/zzz]");
    }

    #[test]
    fn pipelines_pane_hides_repo_list_and_names_tracked_branches() {
        let mut state = sized(30);
        state.pane = Pane::DetailPane;
        state.view = View::Pipelines;
        state.selection.repo = Some(SelectedRepo {
            name: "svc-a".into(),
            slug: "svc-a".into(),
        });
        state.pipelines.items = vec![pipeline(7, "feature/x")];

        let layout = render_at(&state, at(11, 0, 0));
        assert!(layout.repos.is_none());
        assert_eq!(layout.tabs.as_ref().unwrap().active, 2);
        let panel = detail_list(&layout);
        assert_eq!(
            panel.title,
            "Pipelines (svc-a) [develop/staging/main/master] (esc: back)"
        );
        assert_eq!(
            panel.placeholder.as_deref(),
            Some("No pipelines for tracked branches")
        );
    }

    #[test]
    fn pipeline_row_has_badges_duration_and_age() {
        let mut state = sized(30);
        state.pane = Pane::DetailPane;
        state.view = View::Pipelines;
        state.pipelines.items = vec![pipeline(7, "refs/heads/main")];

        let layout = render_at(&state, at(12, 5, 30));
        let row = &detail_list(&layout).rows[0];
        let text = row.text();
        assert!(text.starts_with("#7 main"));
        assert!(text.contains("[COMPLETED] [SUCCESS]"));
        assert!(text.contains("duration: 5m"));
        assert!(text.contains("completed: 2 hrs ago"));
        assert!(row.selected);
        assert_eq!(row.spans[1].tag, Tag::Branch(BranchTone::Main));
    }

    #[test]
    fn commits_view_splits_with_cached_diff() {
        let mut state = sized(30);
        state.pane = Pane::DetailPane;
        state.view = View::PullRequestCommits;
        state.selection.pull_request = Some(SelectedPullRequest {
            id: 4,
            title: "Fix login".into(),
        });
        state.commits.items = vec![Commit {
            hash: "0123456789abcdef".into(),
            message: "Fix login\n\nbody".into(),
            author: "Jane".into(),
            date: None,
        }];
        state.selection.commit = Some("0123456789abcdef".into());
        state.cache.get_or_fetch("svc-a", "0123456789abcdef", 1);
        state.cache.record_changes(
            "0123456789abcdef",
            Some(vec![CommitChange {
                status: "modified".into(),
                path: "src/login.rs".into(),
                old_path: None,
                lines_added: 3,
                lines_removed: 1,
            }]),
        );

        let layout = render(&state);
        let Some(Detail::Split { list, side }) = layout.detail else {
            panic!("expected split view");
        };
        assert_eq!(list.title, "PR #4 commits (Fix login) (esc: back)");
        assert_eq!(list.rows[0].text(), "01234567 @Jane Fix login");

        let side_text: Vec<String> = side.rows.iter().map(Row::text).collect();
        assert_eq!(side_text[0], "commit 0123456789ab");
        assert_eq!(side_text[1], "files changed: 1");
        assert_eq!(side_text[2], "  M src/login.rs +3 -1");
        assert_eq!(side_text.last().unwrap(), "Loading diff...");
    }

    #[test]
    fn status_line_precedence() {
        let mut state = sized(20);
        assert!(matches!(render(&state).status, StatusLine::Help(_)));

        state.set_info("Opened PR in browser");
        assert!(matches!(render(&state).status, StatusLine::Message(_)));

        state.filter_mode = true;
        state.repos.query = "ap".into();
        assert_eq!(render(&state).status, StatusLine::Filter("ap".into()));
    }

    #[test]
    fn duration_formats() {
        let start = at(10, 0, 0);
        assert_eq!(duration(Some(start), Some(at(10, 0, 42)), start), Some("42s".into()));
        assert_eq!(duration(Some(start), Some(at(10, 12, 0)), start), Some("12m".into()));
        assert_eq!(duration(Some(start), Some(at(12, 30, 0)), start), Some("2h30m".into()));
        assert_eq!(duration(Some(start), None, at(10, 1, 0)), Some("1m".into()));
        assert_eq!(duration(Some(at(11, 0, 0)), Some(start), start), None);
        assert_eq!(duration(None, Some(start), start), None);
    }

    #[test]
    fn time_ago_formats() {
        let now = at(12, 0, 0);
        assert_eq!(time_ago(at(11, 59, 30), now), "just now");
        assert_eq!(time_ago(at(11, 59, 0), now), "1 min ago");
        assert_eq!(time_ago(at(11, 15, 0), now), "45 mins ago");
        assert_eq!(time_ago(at(9, 0, 0), now), "3 hrs ago");
        assert_eq!(
            time_ago(Utc.with_ymd_and_hms(2024, 4, 29, 12, 0, 0).unwrap(), now),
            "2 days ago"
        );
    }

    #[test]
    fn short_timestamp_has_fixed_shape() {
        assert_eq!(short_timestamp(None), "-");
        assert_eq!(short_timestamp(Some(at(10, 0, 0))).len(), 16);
    }

    #[test]
    fn branch_tones_are_stable() {
        assert_eq!(branch_tone("develop"), BranchTone::Develop);
        assert_eq!(branch_tone("-"), BranchTone::Missing);
        assert_eq!(branch_tone("feature/a"), branch_tone("feature/a"));
        match branch_tone("feature/a") {
            BranchTone::Hashed(i) => assert!(u32::from(i) < BRANCH_PALETTE_LEN),
            other => panic!("unexpected tone {:?}", other),
        }
    }

    #[test]
    fn badges() {
        assert_eq!(pr_badge(&PrState::Open, true).0, "[DRAFT]");
        assert_eq!(pr_badge(&PrState::Declined, false).1, Tag::Failure);
        assert_eq!(
            pipeline_state_badge(&PipelineState::InProgress),
            ("[RUNNING]".to_string(), Tag::Running)
        );
        assert_eq!(result_badge(&PipelineResult::None).0, "[N/A]");
    }
}
