//! The session and its transition function.
//!
//! [`App::update`] applies one event and returns the side effects it wants
//! run. It never blocks and never touches the repository directly; all git
//! work goes out as [`Command::Dispatch`] and comes back as a completion
//! event.

use std::{collections::BTreeSet, time::Duration};

use crossterm::event::KeyEvent;

use crate::branch::BranchEntry;
use crate::commit::CommitBuffer;
use crate::config::Config;
use crate::diff::{DiffSource, DiffView};
use crate::dispatch::{Completion, OpId, Operation, Outcome, Target};
use crate::error::GitError;
use crate::events::{Action, AppEvent, ModeKind, action_for};
use crate::git::{CommitSummary, FileEntry, RepoSnapshot, StashEntry, StatusCode};
use crate::reconcile::FileLists;
use crate::search;
use crate::view;
use crate::viewport::ListCursor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Panel {
    Unstaged,
    Staged,
    Branches,
    Stashes,
}

impl Panel {
    pub const ALL: [Panel; 4] = [
        Panel::Unstaged,
        Panel::Staged,
        Panel::Branches,
        Panel::Stashes,
    ];

    fn index(self) -> usize {
        match self {
            Panel::Unstaged => 0,
            Panel::Staged => 1,
            Panel::Branches => 2,
            Panel::Stashes => 3,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Panel::Unstaged => "Unstaged Changes",
            Panel::Staged => "Staged Changes",
            Panel::Branches => "Branches",
            Panel::Stashes => "Stashes",
        }
    }
}

/// Navigation, selection and search state of one panel.
#[derive(Clone, Debug, Default)]
pub struct PanelState {
    pub view: ListCursor,
    /// Keyed by path, branch name or stash selector.
    pub selection: BTreeSet<String>,
    pub query: String,
    /// Indices into the panel's list that match `query`.
    pub filtered: Vec<usize>,
    /// Cursor over `filtered`.
    pub result: ListCursor,
}

impl PanelState {
    pub fn toggle(&mut self, key: String) {
        if !self.selection.remove(&key) {
            self.selection.insert(key);
        }
    }

    pub fn has_query(&self) -> bool {
        !self.query.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Search,
    Diff(DiffView),
    Commit(CommitBuffer),
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Normal => ModeKind::Normal,
            Mode::Search => ModeKind::Search,
            Mode::Diff(_) => ModeKind::Diff,
            Mode::Commit(_) => ModeKind::Commit,
        }
    }
}

/// An operation between dispatch and completion.
#[derive(Clone, Debug)]
pub struct PendingCommand {
    pub id: OpId,
    pub description: String,
    pub target: Option<Target>,
    is_refresh: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub id: u64,
    pub text: String,
    pub is_error: bool,
}

/// Side effects requested by a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Dispatch { id: OpId, op: Operation },
    ClearStatusAfter { id: u64, after: Duration },
    Quit,
}

pub struct App {
    pub mode: Mode,
    pub panel: Panel,
    pub panels: [PanelState; 4],
    pub files: FileLists,
    pub branches: Vec<BranchEntry>,
    pub stashes: Vec<StashEntry>,
    pub branch: String,
    pub ahead: u32,
    pub behind: u32,
    pub last_commit: Option<CommitSummary>,
    /// False until the first status fetch completes.
    pub loaded: bool,
    pub pending: Vec<PendingCommand>,
    pub status: Option<StatusMessage>,
    pub width: u16,
    pub height: u16,
    pub spinner: usize,
    pub should_quit: bool,
    config: Config,
    next_op: u64,
    next_status: u64,
    refresh_queued: bool,
    outbox: Vec<Command>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            mode: Mode::Normal,
            panel: Panel::Unstaged,
            panels: Default::default(),
            files: FileLists::default(),
            branches: Vec::new(),
            stashes: Vec::new(),
            branch: String::new(),
            ahead: 0,
            behind: 0,
            last_commit: None,
            loaded: false,
            pending: Vec::new(),
            status: None,
            width: 80,
            height: 24,
            spinner: 0,
            should_quit: false,
            config,
            next_op: 0,
            next_status: 0,
            refresh_queued: false,
            outbox: Vec::new(),
        }
    }

    /// Requests the initial status fetch.
    pub fn init(&mut self) -> Vec<Command> {
        self.request_refresh();
        std::mem::take(&mut self.outbox)
    }

    pub fn update(&mut self, event: AppEvent) -> Vec<Command> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Resize { width, height } => self.resize(width, height),
            AppEvent::Tick => {
                if !self.pending.is_empty() {
                    self.spinner = self.spinner.wrapping_add(1);
                }
            }
            AppEvent::ClearStatus(id) => {
                if self.status.as_ref().is_some_and(|s| s.id == id) {
                    self.status = None;
                }
            }
            AppEvent::Completed(c) => self.on_completed(c),
        }
        std::mem::take(&mut self.outbox)
    }

    pub fn panel_state(&self, panel: Panel) -> &PanelState {
        &self.panels[panel.index()]
    }

    fn state_mut(&mut self, panel: Panel) -> &mut PanelState {
        &mut self.panels[panel.index()]
    }

    pub fn len(&self, panel: Panel) -> usize {
        match panel {
            Panel::Unstaged => self.files.unstaged.len(),
            Panel::Staged => self.files.staged.len(),
            Panel::Branches => self.branches.len(),
            Panel::Stashes => self.stashes.len(),
        }
    }

    /// Selection key of item `index` in `panel`.
    pub fn key_of(&self, panel: Panel, index: usize) -> Option<String> {
        match panel {
            Panel::Unstaged => self.files.unstaged.get(index).map(|e| e.path.clone()),
            Panel::Staged => self.files.staged.get(index).map(|e| e.path.clone()),
            Panel::Branches => self.branches.get(index).map(|b| b.name.clone()),
            Panel::Stashes => self.stashes.get(index).map(|s| s.selector()),
        }
    }

    pub fn is_busy_path(&self, path: &str) -> bool {
        self.pending
            .iter()
            .any(|p| matches!(&p.target, Some(Target::Path(t)) if t == path))
    }

    pub fn panel_rows(&self) -> usize {
        view::panel_rows(self.height)
    }

    pub fn search_rows(&self) -> usize {
        view::search_rows(self.height)
    }

    pub fn diff_rows(&self) -> usize {
        view::diff_rows(self.height)
    }

    fn set_mode(&mut self, mode: Mode) {
        tracing::trace!(from = ?self.mode.kind(), to = ?mode.kind(), "mode");
        self.mode = mode;
    }

    fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.next_status += 1;
        let id = self.next_status;
        self.status = Some(StatusMessage {
            id,
            text: text.into(),
            is_error,
        });
        self.outbox.push(Command::ClearStatusAfter {
            id,
            after: self.config.status_ttl(),
        });
    }

    fn info(&mut self, text: impl Into<String>) {
        self.set_status(text, false);
    }

    fn error(&mut self, text: impl Into<String>) {
        self.set_status(text, true);
    }

    /// Dispatches `op` unless it conflicts with something in flight.
    fn request(&mut self, op: Operation) -> Option<OpId> {
        let target = op.target();
        let blocker = target.as_ref().and_then(|target| {
            self.pending
                .iter()
                .find(|p| p.target.as_ref().is_some_and(|t| t.conflicts_with(target)))
                .map(|p| p.description.clone())
        });
        if let Some(blocker) = blocker {
            tracing::debug!(op = op.label(), %blocker, "rejected");
            self.error(format!("busy: {}", blocker));
            return None;
        }

        self.next_op += 1;
        let id = OpId(self.next_op);
        self.pending.push(PendingCommand {
            id,
            description: op.describe(),
            target,
            is_refresh: op == Operation::Refresh,
        });
        self.outbox.push(Command::Dispatch { id, op });
        Some(id)
    }

    /// At most one refresh runs at a time; a request made while one is in
    /// flight runs once it lands.
    fn request_refresh(&mut self) {
        if self.pending.iter().any(|p| p.is_refresh) {
            self.refresh_queued = true;
            return;
        }
        self.request(Operation::Refresh);
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.clamp_all();
        let rows = self.diff_rows();
        if let Mode::Diff(view) = &mut self.mode {
            view.clamp(rows);
        }
    }

    fn clamp_panel(&mut self, panel: Panel) {
        let total = self.len(panel);
        let rows = self.panel_rows();
        let search_rows = self.search_rows();
        let st = self.state_mut(panel);
        st.view.clamp(total, rows);
        let hits = st.filtered.len();
        st.result.clamp(hits, search_rows);
    }

    fn clamp_all(&mut self) {
        for panel in Panel::ALL {
            self.clamp_panel(panel);
        }
    }

    fn refilter(&mut self, panel: Panel) {
        let filtered = {
            let query = &self.panel_state(panel).query;
            match panel {
                Panel::Unstaged => search::filter(&paths(&self.files.unstaged), query),
                Panel::Staged => search::filter(&paths(&self.files.staged), query),
                Panel::Branches => {
                    let names: Vec<&str> = self.branches.iter().map(|b| b.name.as_str()).collect();
                    search::filter(&names, query)
                }
                Panel::Stashes => {
                    let rows: Vec<Vec<&str>> = self
                        .stashes
                        .iter()
                        .map(|s| vec![s.message.as_str(), s.branch.as_str()])
                        .collect();
                    search::filter_any(&rows, query)
                }
            }
        };
        let st = self.state_mut(panel);
        st.filtered = filtered;
        st.result.reset();
    }

    /// Re-derives everything that depends on a panel's list after it changed.
    fn list_changed(&mut self, panel: Panel) {
        let searching = self.mode == Mode::Search && self.panel == panel;
        if searching || self.panel_state(panel).has_query() {
            self.refilter(panel);
        }
        self.clamp_panel(panel);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let kind = self.mode.kind();
        let Some(action) = action_for(kind, key) else {
            return;
        };
        if action == Action::Quit {
            self.should_quit = true;
            self.outbox.push(Command::Quit);
            return;
        }
        match kind {
            ModeKind::Normal => self.normal_action(action),
            ModeKind::Search => self.search_action(action),
            ModeKind::Diff => self.diff_action(action),
            ModeKind::Commit => self.commit_action(action),
        }
    }

    fn normal_action(&mut self, action: Action) {
        let panel = self.panel;
        let total = self.len(panel);
        let rows = self.panel_rows();
        match action {
            Action::PrevPanel | Action::NextPanel => {
                self.panel = if action == Action::NextPanel {
                    panel.next()
                } else {
                    panel.prev()
                };
                let next = self.panel;
                self.state_mut(next).view.reset();
            }
            Action::Up => self.state_mut(panel).view.step(false, total, rows),
            Action::Down => self.state_mut(panel).view.step(true, total, rows),
            Action::PageUp => self.state_mut(panel).view.page(false, total, rows),
            Action::PageDown => self.state_mut(panel).view.page(true, total, rows),
            Action::Top => self.state_mut(panel).view.first(total, rows),
            Action::Bottom => self.state_mut(panel).view.last(total, rows),
            Action::ToggleSelect => {
                let cursor = self.panel_state(panel).view.cursor;
                if let Some(key) = self.key_of(panel, cursor) {
                    self.state_mut(panel).toggle(key);
                }
            }
            Action::StartSearch => {
                self.state_mut(panel).query.clear();
                self.refilter(panel);
                self.set_mode(Mode::Search);
            }
            Action::Stage => {
                if panel == Panel::Unstaged {
                    for path in self.targets(panel) {
                        self.request(Operation::Stage { path });
                    }
                }
            }
            Action::Unstage => {
                if panel == Panel::Staged {
                    for path in self.targets(panel) {
                        self.unstage_path(&path);
                    }
                }
            }
            Action::Discard => self.discard_at_cursor(),
            Action::StageAll => {
                if self.files.unstaged.is_empty() {
                    tracing::debug!("stage all rejected: nothing to stage");
                } else {
                    self.request(Operation::StageAll);
                }
            }
            Action::StartCommit => {
                if !self.files.has_staged_content() {
                    tracing::debug!("commit rejected: nothing staged");
                } else {
                    let buf = CommitBuffer::new(self.config.commit_char_limit);
                    self.set_mode(Mode::Commit(buf));
                }
            }
            Action::Push => {
                self.request(Operation::Push);
            }
            Action::Stash => {
                if self.files.unstaged.is_empty() && self.files.staged.is_empty() {
                    tracing::debug!("stash rejected: no local changes");
                } else {
                    self.request(Operation::Stash { message: None });
                }
            }
            Action::PopStash => {
                if panel == Panel::Stashes {
                    let cursor = self.panel_state(panel).view.cursor;
                    if let Some(index) = self.stashes.get(cursor).map(|s| s.index) {
                        self.request(Operation::StashPop { index });
                    }
                }
            }
            Action::Refresh => self.request_refresh(),
            Action::Confirm => {
                let cursor = self.panel_state(panel).view.cursor;
                self.open_item(panel, cursor);
            }
            Action::Cancel => {
                let st = self.state_mut(panel);
                st.query.clear();
                st.filtered.clear();
                st.result.reset();
            }
            _ => {}
        }
    }

    fn search_action(&mut self, action: Action) {
        let panel = self.panel;
        let rows = self.search_rows();
        let hits = self.panel_state(panel).filtered.len();
        match action {
            Action::Input(ch) => {
                self.state_mut(panel).query.push(ch);
                self.refilter(panel);
            }
            Action::Backspace => {
                if self.state_mut(panel).query.pop().is_some() {
                    self.refilter(panel);
                }
            }
            Action::Up => self.state_mut(panel).result.step(false, hits, rows),
            Action::Down => self.state_mut(panel).result.step(true, hits, rows),
            Action::Confirm => {
                let picked = self.search_pick();
                self.set_mode(Mode::Normal);
                if let Some(index) = picked {
                    self.open_item(panel, index);
                }
            }
            Action::Jump => {
                self.search_pick();
                self.set_mode(Mode::Normal);
            }
            Action::Stage => {
                if panel == Panel::Unstaged
                    && let Some(path) = self.search_result_key()
                {
                    self.request(Operation::Stage { path });
                }
            }
            Action::Unstage => {
                if panel == Panel::Staged
                    && let Some(path) = self.search_result_key()
                {
                    self.unstage_path(&path);
                }
            }
            Action::Cancel => {
                let st = self.state_mut(panel);
                st.query.clear();
                st.filtered.clear();
                st.result.reset();
                self.set_mode(Mode::Normal);
            }
            _ => {}
        }
    }

    fn search_result(&self) -> Option<usize> {
        let st = self.panel_state(self.panel);
        st.filtered.get(st.result.cursor).copied()
    }

    fn search_result_key(&self) -> Option<String> {
        self.search_result()
            .and_then(|index| self.key_of(self.panel, index))
    }

    /// Moves the panel cursor onto the current search result.
    fn search_pick(&mut self) -> Option<usize> {
        let index = self.search_result()?;
        let panel = self.panel;
        let total = self.len(panel);
        let rows = self.panel_rows();
        self.state_mut(panel).view.select(index, total, rows);
        Some(index)
    }

    fn diff_action(&mut self, action: Action) {
        let rows = self.diff_rows();
        let overlap = self.config.diff_page_overlap;
        let Mode::Diff(view) = &mut self.mode else {
            return;
        };
        match action {
            Action::Up => view.scroll_by(-1, rows),
            Action::Down => view.scroll_by(1, rows),
            Action::PageUp => view.page(false, rows, overlap),
            Action::PageDown => view.page(true, rows, overlap),
            Action::Top => view.top(),
            Action::Bottom => view.bottom(rows),
            Action::Cancel => self.set_mode(Mode::Normal),
            _ => {}
        }
    }

    fn commit_action(&mut self, action: Action) {
        let Mode::Commit(buf) = &mut self.mode else {
            return;
        };
        match action {
            Action::Input(ch) => buf.insert_char(ch),
            Action::Backspace => buf.backspace(),
            Action::Delete => buf.delete(),
            Action::Left => buf.move_left(),
            Action::Right => buf.move_right(),
            Action::Home => buf.move_home(),
            Action::End => buf.move_end(),
            Action::Confirm => {
                if buf.busy || buf.is_blank() {
                    tracing::debug!("commit confirm ignored");
                    return;
                }
                let message = buf.message.trim().to_string();
                if self.request(Operation::Commit { message }).is_some()
                    && let Mode::Commit(buf) = &mut self.mode
                {
                    buf.busy = true;
                }
            }
            Action::Cancel => self.set_mode(Mode::Normal),
            _ => {}
        }
    }

    /// Paths an action applies to: the selection when there is one, in list
    /// order, otherwise the cursor item.
    fn targets(&self, panel: Panel) -> Vec<String> {
        let list = match panel {
            Panel::Unstaged => &self.files.unstaged,
            Panel::Staged => &self.files.staged,
            _ => return Vec::new(),
        };
        let st = self.panel_state(panel);
        if st.selection.is_empty() {
            return list
                .get(st.view.cursor)
                .map(|e| vec![e.path.clone()])
                .unwrap_or_default();
        }
        list.iter()
            .filter(|e| st.selection.contains(&e.path))
            .map(|e| e.path.clone())
            .collect()
    }

    fn unstage_path(&mut self, path: &str) {
        if let Some(entry) = self.files.find(path, true) {
            let op = Operation::Unstage {
                path: entry.path.clone(),
                status: entry.status,
            };
            self.request(op);
        }
    }

    fn discard_at_cursor(&mut self) {
        let cursor = self.panel_state(self.panel).view.cursor;
        match self.panel {
            Panel::Unstaged => {
                if let Some(entry) = self.files.unstaged.get(cursor) {
                    let op = Operation::Discard {
                        path: entry.path.clone(),
                        status: entry.status,
                    };
                    self.request(op);
                }
            }
            Panel::Stashes => {
                if let Some(index) = self.stashes.get(cursor).map(|s| s.index) {
                    self.request(Operation::DropStash { index });
                }
            }
            _ => {}
        }
    }

    fn open_item(&mut self, panel: Panel, index: usize) {
        match panel {
            Panel::Unstaged | Panel::Staged => {
                let staged = panel == Panel::Staged;
                let Some(path) = self.key_of(panel, index) else {
                    return;
                };
                let source = DiffSource::File {
                    path: path.clone(),
                    staged,
                };
                if let Some(id) = self.request(Operation::Diff { path, staged }) {
                    self.set_mode(Mode::Diff(DiffView::loading(source, id)));
                }
            }
            Panel::Branches => {
                let Some(branch) = self.branches.get(index) else {
                    return;
                };
                let name = branch.name.clone();
                let (is_current, is_remote) = (branch.is_current, branch.is_remote);
                if is_current {
                    self.info(format!("Already on {}", name));
                } else if is_remote {
                    self.error(format!("Cannot switch to remote branch {}", name));
                } else if self.has_tracked_changes() {
                    self.error("Local changes present: stash or commit first");
                } else {
                    self.request(Operation::SwitchBranch { name });
                }
            }
            Panel::Stashes => {
                let Some(index) = self.stashes.get(index).map(|s| s.index) else {
                    return;
                };
                if let Some(id) = self.request(Operation::ShowStash { index }) {
                    let view = DiffView::loading(DiffSource::Stash { index }, id);
                    self.set_mode(Mode::Diff(view));
                }
            }
        }
    }

    fn has_tracked_changes(&self) -> bool {
        !self.files.staged.is_empty()
            || self
                .files
                .unstaged
                .iter()
                .any(|e| e.status != StatusCode::Untracked)
    }

    fn on_completed(&mut self, c: Completion) {
        let Completion { id, op, result } = c;
        let was_pending = self
            .pending
            .iter()
            .position(|p| p.id == id)
            .map(|i| self.pending.remove(i))
            .is_some();
        if !was_pending {
            tracing::debug!(id = id.0, "completion for unknown operation");
        }

        if let Operation::Diff { .. } | Operation::ShowStash { .. } = op {
            self.on_diff_loaded(id, result);
            return;
        }

        if op == Operation::Refresh && self.refresh_queued {
            self.refresh_queued = false;
            self.request_refresh();
        }

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.error(e.to_string());
                if let Operation::Commit { .. } = op
                    && let Mode::Commit(buf) = &mut self.mode
                {
                    buf.busy = false;
                }
                if op == Operation::Refresh {
                    self.loaded = true;
                } else {
                    self.request_refresh();
                }
                return;
            }
        };

        match op {
            Operation::Refresh => {
                if let Outcome::Status(snapshot) = outcome {
                    self.apply_snapshot(*snapshot);
                }
            }
            Operation::Stage { path } => self.apply_move(&path, true),
            Operation::Unstage { path, .. } => self.apply_move(&path, false),
            Operation::Commit { .. } => {
                if let Mode::Commit(_) = self.mode {
                    self.set_mode(Mode::Normal);
                }
                self.info("Commit successful!");
                self.request_refresh();
            }
            Operation::Push => {
                self.info("Push successful!");
                self.request_refresh();
            }
            other => {
                // Stash selectors renumber after any of these.
                if matches!(
                    other,
                    Operation::Stash { .. } | Operation::StashPop { .. } | Operation::DropStash { .. }
                ) {
                    self.state_mut(Panel::Stashes).selection.clear();
                }
                let msg = match &other {
                    Operation::Discard { path, .. } => format!("Discarded changes in {}", path),
                    Operation::StageAll => "Staged all changes".to_string(),
                    Operation::SwitchBranch { name } => format!("Switched to {}", name),
                    Operation::Stash { .. } => "Changes stashed".to_string(),
                    Operation::StashPop { index } => format!("Popped stash@{{{}}}", index),
                    Operation::DropStash { index } => format!("Dropped stash@{{{}}}", index),
                    _ => format!("{} done", other.label()),
                };
                self.info(msg);
                self.request_refresh();
            }
        }
    }

    fn on_diff_loaded(&mut self, id: OpId, result: Result<Outcome, GitError>) {
        let rows = self.diff_rows();
        let Mode::Diff(view) = &mut self.mode else {
            tracing::trace!(id = id.0, "diff result after leaving diff view");
            return;
        };
        let result = match result {
            Ok(Outcome::Text(text)) => Ok(text),
            Ok(_) => Ok(String::new()),
            Err(e) => Err(e.to_string()),
        };
        if view.receive(id, result) {
            view.clamp(rows);
        } else {
            tracing::trace!(id = id.0, "stale diff result dropped");
        }
    }

    fn apply_move(&mut self, path: &str, to_staged: bool) {
        let (from, to) = if to_staged {
            (Panel::Unstaged, Panel::Staged)
        } else {
            (Panel::Staged, Panel::Unstaged)
        };
        if self.files.move_to(path, to_staged).is_none() {
            tracing::trace!(path, "optimistic move skipped: path not in source list");
            return;
        }
        debug_assert!(self.files.is_consistent(), "{} listed twice", path);
        self.state_mut(from).selection.remove(path);
        self.list_changed(from);
        self.list_changed(to);
    }

    fn apply_snapshot(&mut self, snap: RepoSnapshot) {
        self.branch = snap.branch;
        self.ahead = snap.ahead;
        self.behind = snap.behind;
        self.last_commit = snap.last_commit;
        self.files.replace(snap.unstaged, snap.staged);
        self.branches = snap.branches;
        self.stashes = snap.stashes;
        self.loaded = true;

        for panel in Panel::ALL {
            let keys: BTreeSet<String> = (0..self.len(panel))
                .filter_map(|i| self.key_of(panel, i))
                .collect();
            self.state_mut(panel)
                .selection
                .retain(|k| keys.contains(k));
            self.list_changed(panel);
        }
    }
}

fn paths(entries: &[FileEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.path.as_str()).collect()
}
