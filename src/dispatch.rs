//! Runs repository calls off the event loop.
//!
//! Every dispatched operation ends in exactly one [`AppEvent::Completed`] on
//! the app's event channel, whether the call succeeded, failed, or its task
//! died. The dispatcher never de-duplicates or reorders work; that policy
//! belongs to the state machine.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::GitError;
use crate::events::AppEvent;
use crate::git::{RepoSnapshot, StatusCode};
use crate::git_ops::Repository;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Refresh,
    Stage { path: String },
    Unstage { path: String, status: StatusCode },
    Discard { path: String, status: StatusCode },
    StageAll,
    Commit { message: String },
    Push,
    SwitchBranch { name: String },
    Diff { path: String, staged: bool },
    ShowStash { index: usize },
    Stash { message: Option<String> },
    StashPop { index: usize },
    DropStash { index: usize },
}

/// What a mutating operation touches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Path(String),
    Stash(usize),
    Repository,
}

impl Target {
    /// Stash targets all conflict with each other: dropping or popping one
    /// renumbers the rest.
    pub fn conflicts_with(&self, other: &Target) -> bool {
        match (self, other) {
            (Target::Repository, _) | (_, Target::Repository) => true,
            (Target::Path(a), Target::Path(b)) => a == b,
            (Target::Stash(_), Target::Stash(_)) => true,
            _ => false,
        }
    }
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Refresh => "refresh",
            Operation::Stage { .. } => "stage",
            Operation::Unstage { .. } => "unstage",
            Operation::Discard { .. } => "discard",
            Operation::StageAll => "stage all",
            Operation::Commit { .. } => "commit",
            Operation::Push => "push",
            Operation::SwitchBranch { .. } => "switch branch",
            Operation::Diff { .. } => "diff",
            Operation::ShowStash { .. } => "show stash",
            Operation::Stash { .. } => "stash",
            Operation::StashPop { .. } => "stash pop",
            Operation::DropStash { .. } => "drop stash",
        }
    }

    /// Short progress text for the status line.
    pub fn describe(&self) -> String {
        match self {
            Operation::Refresh => "Refreshing".to_string(),
            Operation::Stage { path } => format!("Staging {}", path),
            Operation::Unstage { path, .. } => format!("Unstaging {}", path),
            Operation::Discard { path, .. } => format!("Discarding {}", path),
            Operation::StageAll => "Staging all changes".to_string(),
            Operation::Commit { .. } => "Committing".to_string(),
            Operation::Push => "Pushing".to_string(),
            Operation::SwitchBranch { name } => format!("Switching to {}", name),
            Operation::Diff { path, .. } => format!("Loading diff of {}", path),
            Operation::ShowStash { index } => format!("Loading stash@{{{}}}", index),
            Operation::Stash { .. } => "Stashing changes".to_string(),
            Operation::StashPop { index } => format!("Popping stash@{{{}}}", index),
            Operation::DropStash { index } => format!("Dropping stash@{{{}}}", index),
        }
    }

    /// `None` for reads.
    pub fn target(&self) -> Option<Target> {
        match self {
            Operation::Refresh | Operation::Diff { .. } | Operation::ShowStash { .. } => None,
            Operation::Stage { path }
            | Operation::Unstage { path, .. }
            | Operation::Discard { path, .. } => Some(Target::Path(path.clone())),
            Operation::DropStash { index } => Some(Target::Stash(*index)),
            Operation::StageAll
            | Operation::Commit { .. }
            | Operation::Push
            | Operation::SwitchBranch { .. }
            | Operation::Stash { .. }
            | Operation::StashPop { .. } => Some(Target::Repository),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Done,
    Status(Box<RepoSnapshot>),
    Text(String),
}

#[derive(Debug)]
pub struct Completion {
    pub id: OpId,
    pub op: Operation,
    pub result: Result<Outcome, GitError>,
}

pub fn execute(repo: &dyn Repository, op: &Operation) -> Result<Outcome, GitError> {
    match op {
        Operation::Refresh => repo.fetch_status().map(|s| Outcome::Status(Box::new(s))),
        Operation::Stage { path } => repo.stage_file(path).map(|_| Outcome::Done),
        Operation::Unstage { path, status } => {
            repo.unstage_file(path, *status).map(|_| Outcome::Done)
        }
        Operation::Discard { path, status } => {
            repo.discard_changes(path, *status).map(|_| Outcome::Done)
        }
        Operation::StageAll => repo.stage_all().map(|_| Outcome::Done),
        Operation::Commit { message } => repo.commit(message).map(|_| Outcome::Done),
        Operation::Push => repo.push().map(|_| Outcome::Done),
        Operation::SwitchBranch { name } => repo.switch_branch(name).map(|_| Outcome::Done),
        Operation::Diff { path, staged } => repo.get_diff(path, *staged).map(Outcome::Text),
        Operation::ShowStash { index } => repo.show_stash(*index).map(Outcome::Text),
        Operation::Stash { message } => repo.stash(message.as_deref()).map(|_| Outcome::Done),
        Operation::StashPop { index } => repo.stash_pop(*index).map(|_| Outcome::Done),
        Operation::DropStash { index } => repo.drop_stash(*index).map(|_| Outcome::Done),
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    repo: Arc<dyn Repository>,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl Dispatcher {
    pub fn new(repo: Arc<dyn Repository>, tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { repo, tx }
    }

    /// Schedules `op` and returns immediately.
    pub fn dispatch(&self, id: OpId, op: Operation) {
        tracing::debug!(id = id.0, op = %op.describe(), "dispatch");
        let repo = Arc::clone(&self.repo);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let label = op.label();
            let job_op = op.clone();
            let result =
                match tokio::task::spawn_blocking(move || execute(repo.as_ref(), &job_op)).await {
                    Ok(result) => result,
                    Err(e) => Err(GitError::failed(label, format!("task aborted: {}", e))),
                };

            match &result {
                Ok(_) => tracing::debug!(id = id.0, op = label, "completed"),
                Err(e) => tracing::warn!(id = id.0, op = label, error = %e, "failed"),
            }

            // The receiver only goes away when the app is shutting down.
            let _ = tx.send(AppEvent::Completed(Completion { id, op, result }));
        });
    }
}
