use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::action::{Action, Command, PollToken, Request, Ticket};
use crate::error::BbError;
use crate::launcher;
use crate::provider::{self, DataProvider};

/// Runs the side effects the state machine asks for. Every spawned job reports
/// back with exactly one [`Action`].
pub struct Executor {
    provider: Arc<dyn DataProvider>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl Executor {
    pub fn new(provider: Arc<dyn DataProvider>, action_tx: mpsc::UnboundedSender<Action>) -> Self {
        Self {
            provider,
            action_tx,
        }
    }

    /// Start `command` in the background. Commands that need the terminal
    /// itself are handed back to the caller.
    pub fn dispatch(&self, command: Command) -> Option<Command> {
        match command {
            Command::Fetch { ticket, request } => {
                self.spawn_fetch(ticket, request);
                None
            }
            Command::SchedulePoll { token, after } => {
                self.spawn_poll_timer(token, after);
                None
            }
            Command::OpenUrl(url) => {
                self.spawn_open_url(url);
                None
            }
            Command::OpenInViewer { .. } | Command::Quit => Some(command),
        }
    }

    fn spawn_fetch(&self, ticket: Ticket, request: Request) {
        let tx = self.action_tx.clone();
        let provider = Arc::clone(&self.provider);
        tokio::spawn(async move {
            let result = provider::execute(provider.as_ref(), &request).await;
            tx.send(Action::Fetched {
                ticket,
                request,
                result,
            })
            .ok();
        });
    }

    fn spawn_poll_timer(&self, token: PollToken, after: Duration) {
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            debug!(token, "poll due");
            tx.send(Action::PollDue(token)).ok();
        });
    }

    fn spawn_open_url(&self, url: String) {
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || launcher::open_url(&url))
                .await
                .unwrap_or_else(|e| Err(BbError::Launcher(e.to_string())));
            tx.send(Action::UrlOpened(result)).ok();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Payload;
    use crate::error::Result;
    use crate::types::{
        Branch, Commit, CommitChange, Pipeline, PipelineStep, PullRequest, Repository,
    };
    use async_trait::async_trait;

    #[derive(Debug)]
    struct StubProvider;

    #[async_trait]
    impl DataProvider for StubProvider {
        async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
            Ok(vec![Repository {
                name: "svc-a".into(),
                slug: "svc-a".into(),
                uuid: "{r}".into(),
                main_branch: "main".into(),
                updated_on: None,
            }])
        }
        async fn fetch_branches(&self, _repo: &str) -> Result<Vec<Branch>> {
            Err(BbError::Transport("offline".into()))
        }
        async fn fetch_pull_requests(&self, _repo: &str) -> Result<Vec<PullRequest>> {
            Ok(Vec::new())
        }
        async fn fetch_pipelines(&self, _repo: &str) -> Result<Vec<Pipeline>> {
            Ok(Vec::new())
        }
        async fn fetch_pipeline(&self, _repo: &str, _pipeline: &str) -> Result<Pipeline> {
            Err(BbError::Transport("offline".into()))
        }
        async fn fetch_pipeline_steps(
            &self,
            _repo: &str,
            _pipeline: &str,
        ) -> Result<Vec<PipelineStep>> {
            Ok(Vec::new())
        }
        async fn fetch_pipeline_step_log(
            &self,
            _repo: &str,
            _pipeline: &str,
            _step: &str,
        ) -> Result<String> {
            Ok(String::new())
        }
        async fn fetch_pull_request_commits(&self, _repo: &str, _pr: u64) -> Result<Vec<Commit>> {
            Ok(Vec::new())
        }
        async fn fetch_commit_changes(
            &self,
            _repo: &str,
            _hash: &str,
        ) -> Result<Vec<CommitChange>> {
            Ok(Vec::new())
        }
        async fn fetch_commit_diff(&self, _repo: &str, _hash: &str) -> Result<String> {
            Ok("diff".into())
        }
    }

    fn executor() -> (Executor, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Executor::new(Arc::new(StubProvider), tx), rx)
    }

    #[tokio::test]
    async fn fetch_reports_back_with_its_ticket() {
        let (executor, mut rx) = executor();
        let handed_back = executor.dispatch(Command::Fetch {
            ticket: 3,
            request: Request::Repositories,
        });
        assert!(handed_back.is_none());

        match rx.recv().await {
            Some(Action::Fetched {
                ticket: 3,
                request: Request::Repositories,
                result: Ok(Payload::Repositories(repos)),
            }) => assert_eq!(repos.len(), 1),
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[tokio::test]
    async fn fetch_failures_travel_in_the_action() {
        let (executor, mut rx) = executor();
        executor.dispatch(Command::Fetch {
            ticket: 1,
            request: Request::Branches {
                repo: "svc-a".into(),
            },
        });
        match rx.recv().await {
            Some(Action::Fetched {
                result: Err(err), ..
            }) => assert_eq!(err.to_string(), "request failed: offline"),
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[tokio::test]
    async fn poll_timer_fires_after_interval() {
        let (executor, mut rx) = executor();
        executor.dispatch(Command::SchedulePoll {
            token: 9,
            after: Duration::from_millis(10),
        });
        match rx.recv().await {
            Some(Action::PollDue(9)) => {}
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[tokio::test]
    async fn terminal_commands_are_handed_back() {
        let (executor, _rx) = executor();
        assert_eq!(executor.dispatch(Command::Quit), Some(Command::Quit));
        let viewer = Command::OpenInViewer {
            text: "log".into(),
            title: "build".into(),
        };
        assert_eq!(executor.dispatch(viewer.clone()), Some(viewer));
    }
}
