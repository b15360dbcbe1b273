use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub slug: String,
    pub uuid: String,
    pub main_branch: String,
    pub updated_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub target_hash: String,
    pub target_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrState {
    Open,
    Merged,
    Declined,
    Superseded,
    Other(String),
}

impl PrState {
    pub fn from_api(state: &str) -> Self {
        match state.trim().to_lowercase().as_str() {
            "open" => PrState::Open,
            "merged" => PrState::Merged,
            "declined" => PrState::Declined,
            "superseded" => PrState::Superseded,
            _ => PrState::Other(state.trim().to_string()),
        }
    }
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrState::Open => write!(f, "OPEN"),
            PrState::Merged => write!(f, "MERGED"),
            PrState::Declined => write!(f, "DECLINED"),
            PrState::Superseded => write!(f, "SUPERSEDED"),
            PrState::Other(s) => write!(f, "{}", s.to_uppercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub state: PrState,
    pub draft: bool,
    pub author: String,
    pub source_branch: String,
    pub destination_branch: String,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub url: String,
}

/// Lifecycle state shared by pipelines and pipeline steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Pending,
    InProgress,
    Paused,
    Completed,
    Error,
    Other(String),
}

impl PipelineState {
    pub fn from_api(state: &str) -> Self {
        match state.trim().to_lowercase().as_str() {
            "pending" => PipelineState::Pending,
            "in_progress" | "running" => PipelineState::InProgress,
            "paused" => PipelineState::Paused,
            "completed" => PipelineState::Completed,
            "error" => PipelineState::Error,
            _ => PipelineState::Other(state.trim().to_string()),
        }
    }

    pub fn as_api_str(&self) -> &str {
        match self {
            PipelineState::Pending => "pending",
            PipelineState::InProgress => "in_progress",
            PipelineState::Paused => "paused",
            PipelineState::Completed => "completed",
            PipelineState::Error => "error",
            PipelineState::Other(s) => s,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, PipelineState::InProgress)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Pending => write!(f, "PENDING"),
            PipelineState::InProgress => write!(f, "RUNNING"),
            PipelineState::Paused => write!(f, "PAUSED"),
            PipelineState::Completed => write!(f, "COMPLETED"),
            PipelineState::Error => write!(f, "ERROR"),
            PipelineState::Other(s) => write!(f, "{}", s.to_uppercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineResult {
    Successful,
    Failed,
    Stopped,
    Expired,
    None,
    Other(String),
}

impl PipelineResult {
    pub fn from_api(result: Option<&str>) -> Self {
        let Some(result) = result else {
            return PipelineResult::None;
        };
        match result.trim().to_lowercase().as_str() {
            "" => PipelineResult::None,
            "successful" | "success" => PipelineResult::Successful,
            "failed" | "error" => PipelineResult::Failed,
            "stopped" => PipelineResult::Stopped,
            "expired" => PipelineResult::Expired,
            _ => PipelineResult::Other(result.trim().to_string()),
        }
    }

    pub fn as_api_str(&self) -> &str {
        match self {
            PipelineResult::Successful => "successful",
            PipelineResult::Failed => "failed",
            PipelineResult::Stopped => "stopped",
            PipelineResult::Expired => "expired",
            PipelineResult::None => "",
            PipelineResult::Other(s) => s,
        }
    }
}

impl fmt::Display for PipelineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineResult::Successful => write!(f, "SUCCESS"),
            PipelineResult::Failed => write!(f, "FAILED"),
            PipelineResult::Stopped => write!(f, "STOPPED"),
            PipelineResult::Expired => write!(f, "EXPIRED"),
            PipelineResult::None => write!(f, "N/A"),
            PipelineResult::Other(s) => write!(f, "{}", s.to_uppercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub uuid: String,
    pub build_number: u64,
    pub state: PipelineState,
    pub result: PipelineResult,
    pub branch: String,
    pub created_on: Option<DateTime<Utc>>,
    pub started_on: Option<DateTime<Utc>>,
    pub completed_on: Option<DateTime<Utc>>,
}

impl Pipeline {
    /// Short human reference, e.g. `#42`.
    pub fn reference(&self) -> String {
        format!("#{}", self.build_number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStep {
    pub uuid: String,
    pub name: String,
    pub state: PipelineState,
    pub result: PipelineResult,
    pub started_on: Option<DateTime<Utc>>,
    pub completed_on: Option<DateTime<Utc>>,
}

/// Commit listed on a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub date: Option<DateTime<Utc>>,
}

impl Commit {
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// One file entry of a commit's diffstat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitChange {
    pub status: String,
    pub path: String,
    pub old_path: Option<String>,
    pub lines_added: u64,
    pub lines_removed: u64,
}
