//! Live refresh of the hovered running pipeline.
//!
//! A poll chain is armed for one pipeline identity. Each tick re-checks the
//! predicate and the chain stops on its own as soon as the hovered pipeline
//! changes, leaves the view, or stops running.

use tracing::debug;

use crate::action::{Command, Payload, PollToken, Request};
use crate::error::BbError;
use crate::state::{AppState, ListKind, Pane, View};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Armed {
    token: PollToken,
    repo: String,
    pipeline: String,
}

#[derive(Debug, Default)]
pub struct PollScheduler {
    armed: Option<Armed>,
    next_token: PollToken,
}

impl PollScheduler {
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    fn is_armed_for(&self, repo: &str, pipeline: &str) -> bool {
        self.armed
            .as_ref()
            .is_some_and(|a| a.repo == repo && a.pipeline == pipeline)
    }

    fn arm(&mut self, repo: String, pipeline: String) -> PollToken {
        self.next_token += 1;
        self.armed = Some(Armed {
            token: self.next_token,
            repo,
            pipeline,
        });
        self.next_token
    }

    fn armed_with(&self, token: PollToken) -> Option<&Armed> {
        self.armed.as_ref().filter(|a| a.token == token)
    }

    fn disarm(&mut self) {
        self.armed = None;
    }
}

/// `(repo, pipeline uuid)` of the pipeline that should be kept live right now.
pub fn live_target(state: &AppState) -> Option<(String, String)> {
    if state.pane != Pane::DetailPane || state.view != View::Pipelines {
        return None;
    }
    let repo = state.selection.repo_slug()?;
    let pipeline = state.hovered_pipeline()?;
    if !pipeline.state.is_running() || pipeline.uuid.is_empty() {
        return None;
    }
    Some((repo.to_string(), pipeline.uuid.clone()))
}

fn is_live(state: &AppState, repo: &str, pipeline: &str) -> bool {
    live_target(state).is_some_and(|(r, p)| r == repo && p == pipeline)
}

/// Arm a chain for the live target unless one is already armed for it.
pub fn arm_if_live(state: &mut AppState) -> Vec<Command> {
    let Some((repo, pipeline)) = live_target(state) else {
        return Vec::new();
    };
    if state.poll.is_armed_for(&repo, &pipeline) {
        return Vec::new();
    }

    debug!(%repo, %pipeline, "arming pipeline poll");
    let token = state.poll.arm(repo, pipeline);
    vec![Command::SchedulePoll {
        token,
        after: state.settings.poll_interval,
    }]
}

/// The timer for `token` fired.
pub fn on_due(state: &mut AppState, token: PollToken) -> Vec<Command> {
    let Some(armed) = state.poll.armed_with(token).cloned() else {
        debug!(token, "stale poll tick");
        return Vec::new();
    };

    if !is_live(state, &armed.repo, &armed.pipeline) {
        debug!(pipeline = %armed.pipeline, "pipeline no longer live, stopping poll");
        state.poll.disarm();
        return Vec::new();
    }

    vec![Command::Fetch {
        ticket: token,
        request: Request::Pipeline {
            repo: armed.repo,
            pipeline: armed.pipeline,
        },
    }]
}

/// A polled pipeline arrived (or failed). Replace it by identity, then decide
/// whether the chain continues.
pub fn on_polled(
    state: &mut AppState,
    token: PollToken,
    repo: String,
    pipeline: String,
    result: Result<Payload, BbError>,
) -> Vec<Command> {
    match result {
        Ok(Payload::Pipeline(updated)) => {
            if state.selection.repo_slug() == Some(repo.as_str()) {
                if let Some(slot) = state
                    .pipelines
                    .items
                    .iter_mut()
                    .find(|p| p.uuid == updated.uuid)
                {
                    *slot = *updated;
                }
                // a settled pipeline can drop out of a state or result filter
                state.clamp(ListKind::Pipelines);
            }
        }
        Ok(other) => debug!(payload = ?other, "unexpected poll payload"),
        Err(err) => {
            if state.selection.repo_slug() == Some(repo.as_str()) {
                state.set_error(err.kind(), format!("Error polling pipeline: {}", err));
            }
        }
    }

    if state.poll.armed_with(token).is_none() {
        return Vec::new();
    }
    if is_live(state, &repo, &pipeline) {
        vec![Command::SchedulePoll {
            token,
            after: state.settings.poll_interval,
        }]
    } else {
        debug!(%pipeline, "pipeline settled, stopping poll");
        state.poll.disarm();
        Vec::new()
    }
}
