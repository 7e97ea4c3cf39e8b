//! Pure projection from session state to what the screen should show.
//!
//! Nothing here paints; `ui` turns a [`Screen`] into widgets. The row
//! helpers at the top are shared with the state machine so both agree on
//! how many list rows fit.

use crate::app::{App, Mode, Panel};
use crate::diff::{DiffContent, LineKind, classify};

pub const HEADER_ROWS: u16 = 2;
pub const FOOTER_ROWS: u16 = 2;

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn body_height(height: u16) -> usize {
    height.saturating_sub(HEADER_ROWS + FOOTER_ROWS) as usize
}

/// Heights of the two grid rows; the lower one takes the odd line.
pub fn grid_heights(height: u16) -> (u16, u16) {
    let body = body_height(height) as u16;
    let top = body / 2;
    (top, body - top)
}

/// List rows inside one bordered grid panel.
pub fn panel_rows(height: u16) -> usize {
    let (top, _) = grid_heights(height);
    (top as usize).saturating_sub(2).max(1)
}

/// Result rows in the search pane: border plus the prompt line.
pub fn search_rows(height: u16) -> usize {
    body_height(height).saturating_sub(3).max(1)
}

pub fn diff_rows(height: u16) -> usize {
    body_height(height).saturating_sub(2).max(1)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Screen {
    pub header: Header,
    pub body: Body,
    pub help: &'static str,
    pub status: StatusLine,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub branch: String,
    pub tracking: Option<String>,
    pub last_commit: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusLine {
    pub busy: Option<String>,
    pub message: Option<Message>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub is_error: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    Loading,
    Grid(Vec<PanelView>),
    Search(SearchView),
    Diff(DiffPane),
    Commit(CommitPane),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    pub text: String,
    pub tag: Option<String>,
    pub cursor: bool,
    pub selected: bool,
    pub matched: bool,
    pub busy: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelView {
    pub title: String,
    pub active: bool,
    pub rows: Vec<Row>,
    /// Shown instead of rows when the list is empty.
    pub empty: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchView {
    pub title: String,
    pub query: String,
    pub placeholder: Option<&'static str>,
    pub rows: Vec<Row>,
    pub notice: Option<&'static str>,
    pub matches: usize,
    pub total: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffBody {
    Loading,
    Empty,
    Error(String),
    Lines(Vec<DiffLine>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffPane {
    pub title: String,
    pub body: DiffBody,
    pub position: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitPane {
    pub before_cursor: String,
    pub after_cursor: String,
    pub count: String,
    pub staged: usize,
    pub busy: bool,
}

pub fn project(app: &App) -> Screen {
    Screen {
        header: header(app),
        body: body(app),
        help: help(&app.mode),
        status: status_line(app),
    }
}

fn header(app: &App) -> Header {
    let tracking = (app.ahead > 0 || app.behind > 0)
        .then(|| format!("↑{} ↓{}", app.ahead, app.behind));
    Header {
        branch: app.branch.clone(),
        tracking,
        last_commit: app
            .last_commit
            .as_ref()
            .map(|c| format!("{} {}", c.hash, c.subject)),
    }
}

fn status_line(app: &App) -> StatusLine {
    let busy = app.pending.first().map(|p| {
        let frame = SPINNER[app.spinner % SPINNER.len()];
        match app.pending.len() {
            1 => format!("{} {}", frame, p.description),
            n => format!("{} {} (+{} more)", frame, p.description, n - 1),
        }
    });
    StatusLine {
        busy,
        message: app.status.as_ref().map(|s| Message {
            text: s.text.clone(),
            is_error: s.is_error,
        }),
    }
}

fn help(mode: &Mode) -> &'static str {
    match mode {
        Mode::Normal => {
            "j/k move • h/l panel • space select • s/u stage/unstage • d discard • a stage all • c commit • p push • S/P stash/pop • / search • enter open • r refresh • q quit"
        }
        Mode::Search => {
            "type to filter • ↑/↓ move • enter open • tab jump • ctrl+s/ctrl+u stage/unstage • esc cancel"
        }
        Mode::Diff(_) => "j/k scroll • pgup/pgdn page • g/G top/bottom • esc close • q quit",
        Mode::Commit(_) => "enter commit • ←/→ move • esc cancel",
    }
}

fn body(app: &App) -> Body {
    if !app.loaded {
        return Body::Loading;
    }
    match &app.mode {
        Mode::Normal => Body::Grid(Panel::ALL.iter().map(|&p| panel_view(app, p)).collect()),
        Mode::Search => Body::Search(search_view(app)),
        Mode::Diff(view) => {
            let rows = diff_rows(app.height);
            let body = match &view.content {
                DiffContent::Loading => DiffBody::Loading,
                DiffContent::Error(msg) => DiffBody::Error(msg.clone()),
                DiffContent::Text(lines) if lines.is_empty() => DiffBody::Empty,
                DiffContent::Text(lines) => DiffBody::Lines(
                    lines
                        .iter()
                        .skip(view.scroll)
                        .take(rows)
                        .map(|l| DiffLine {
                            kind: classify(l),
                            text: l.clone(),
                        })
                        .collect(),
                ),
            };
            let total = view.line_count();
            let position = (total > 0).then(|| {
                let last = (view.scroll + rows).min(total);
                format!("{}-{}/{}", view.scroll + 1, last, total)
            });
            Body::Diff(DiffPane {
                title: view.title.clone(),
                body,
                position,
            })
        }
        Mode::Commit(buf) => {
            let (before, after) = buf.split_at_cursor();
            Body::Commit(CommitPane {
                before_cursor: before.to_string(),
                after_cursor: after.to_string(),
                count: format!("{}/{}", buf.len(), buf.limit),
                staged: app.files.staged_count(),
                busy: buf.busy,
            })
        }
    }
}

fn panel_title(app: &App, panel: Panel) -> String {
    match panel {
        Panel::Branches => {
            let remote = app.branches.iter().filter(|b| b.is_remote).count();
            let local = app.branches.len() - remote;
            if app.branches.is_empty() {
                panel.name().to_string()
            } else {
                format!("{} (L:{} R:{})", panel.name(), local, remote)
            }
        }
        _ => match app.len(panel) {
            0 => panel.name().to_string(),
            n => format!("{} ({})", panel.name(), n),
        },
    }
}

fn empty_text(panel: Panel) -> &'static str {
    match panel {
        Panel::Unstaged => "(no unstaged changes)",
        Panel::Staged => "(no staged changes)",
        Panel::Branches => "(no branches)",
        Panel::Stashes => "(no stashes)",
    }
}

/// Text and tag of item `index`, without any per-view flags.
fn base_row(app: &App, panel: Panel, index: usize) -> Option<Row> {
    let (text, tag, busy) = match panel {
        Panel::Unstaged | Panel::Staged => {
            let list = app.files.list(panel == Panel::Staged);
            let e = list.get(index)?;
            let tag = if e.partial {
                format!("[{}+]", e.status.as_char())
            } else {
                format!("[{}]", e.status.as_char())
            };
            (e.path.clone(), tag, app.is_busy_path(&e.path))
        }
        Panel::Branches => {
            let b = app.branches.get(index)?;
            let text = match &b.tracking {
                Some(t) => format!("{}  {}", b.name, t),
                None => b.name.clone(),
            };
            (text, format!("[{}]", b.kind_char()), false)
        }
        Panel::Stashes => {
            let s = app.stashes.get(index)?;
            (
                format!("{}: {}", s.selector(), s.message),
                format!("({})", s.date),
                false,
            )
        }
    };
    let selected = app
        .key_of(panel, index)
        .is_some_and(|k| app.panel_state(panel).selection.contains(&k));
    Some(Row {
        text,
        tag: Some(tag),
        selected,
        busy,
        ..Row::default()
    })
}

fn panel_view(app: &App, panel: Panel) -> PanelView {
    let st = app.panel_state(panel);
    let active = app.panel == panel;
    let rows = panel_rows(app.height);
    let total = app.len(panel);

    let rows = (st.view.offset..total.min(st.view.offset + rows))
        .filter_map(|i| {
            let mut row = base_row(app, panel, i)?;
            row.cursor = active && i == st.view.cursor;
            row.matched = st.has_query() && st.filtered.binary_search(&i).is_ok();
            Some(row)
        })
        .collect();

    PanelView {
        title: panel_title(app, panel),
        active,
        rows,
        empty: (total == 0).then(|| empty_text(panel)),
    }
}

fn search_view(app: &App) -> SearchView {
    let panel = app.panel;
    let st = app.panel_state(panel);
    let visible = search_rows(app.height);
    let hits = st.filtered.len();

    let rows = (st.result.offset..hits.min(st.result.offset + visible))
        .filter_map(|r| {
            let mut row = base_row(app, panel, st.filtered[r])?;
            row.cursor = r == st.result.cursor;
            row.matched = st.has_query();
            Some(row)
        })
        .collect();

    let notice = if hits > 0 {
        None
    } else if st.has_query() {
        Some("No matches found")
    } else {
        Some(empty_text(panel))
    };

    SearchView {
        title: format!("Search {}", panel.name()),
        query: st.query.clone(),
        placeholder: (!st.has_query()).then_some("Type to search..."),
        rows,
        notice,
        matches: hits,
        total: app.len(panel),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Command;
    use crate::config::Config;
    use crate::dispatch::{Completion, Operation, Outcome};
    use crate::events::AppEvent;
    use crate::git::{CommitSummary, FileEntry, RepoSnapshot, StatusCode};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn press(app: &mut App, code: KeyCode) -> Vec<Command> {
        app.update(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn app_with(files: &[&str]) -> App {
        let mut app = App::new(Config::default());
        app.update(AppEvent::Resize {
            width: 120,
            height: 24,
        });
        let cmds = app.init();
        let Some(Command::Dispatch { id, op }) = cmds.into_iter().next() else {
            panic!("no initial refresh");
        };
        let snap = RepoSnapshot {
            branch: "main".into(),
            ahead: 2,
            last_commit: Some(CommitSummary {
                hash: "abc1234".into(),
                subject: "Initial import".into(),
            }),
            unstaged: files
                .iter()
                .map(|p| FileEntry::new(*p, StatusCode::Modified, false))
                .collect(),
            ..RepoSnapshot::default()
        };
        app.update(AppEvent::Completed(Completion {
            id,
            op,
            result: Ok(Outcome::Status(Box::new(snap))),
        }));
        app
    }

    #[test]
    fn row_budget_follows_terminal_height() {
        assert_eq!(body_height(24), 20);
        assert_eq!(grid_heights(24), (10, 10));
        assert_eq!(grid_heights(25), (10, 11));
        assert_eq!(panel_rows(24), 8);
        assert_eq!(search_rows(24), 17);
        assert_eq!(diff_rows(24), 18);
        assert_eq!(panel_rows(3), 1);
    }

    #[test]
    fn loading_until_first_snapshot() {
        let mut app = App::new(Config::default());
        app.init();
        assert_eq!(project(&app).body, Body::Loading);
    }

    #[test]
    fn header_shows_tracking_and_last_commit() {
        let app = app_with(&[]);
        let h = project(&app).header;
        assert_eq!(h.branch, "main");
        assert_eq!(h.tracking.as_deref(), Some("↑2 ↓0"));
        assert_eq!(h.last_commit.as_deref(), Some("abc1234 Initial import"));
    }

    #[test]
    fn grid_marks_cursor_only_in_active_panel() {
        let app = app_with(&["a.rs", "b.rs"]);
        let Body::Grid(panels) = project(&app).body else {
            panic!("expected grid");
        };
        assert_eq!(panels.len(), 4);
        assert_eq!(panels[0].title, "Unstaged Changes (2)");
        assert!(panels[0].active);
        assert!(panels[0].rows[0].cursor);
        assert_eq!(panels[0].rows[0].tag.as_deref(), Some("[M]"));
        assert_eq!(panels[1].empty, Some("(no staged changes)"));
    }

    #[test]
    fn busy_rows_and_spinner_while_staging() {
        let mut app = app_with(&["a.rs", "b.rs"]);
        press(&mut app, KeyCode::Char('s'));
        let screen = project(&app);
        let Body::Grid(panels) = screen.body else {
            panic!("expected grid");
        };
        assert!(panels[0].rows[0].busy);
        assert!(!panels[0].rows[1].busy);
        assert!(screen.status.busy.unwrap().ends_with("Staging a.rs"));
    }

    #[test]
    fn search_shows_everything_then_explicit_empty_state() {
        let mut app = app_with(&["a.rs", "b.rs"]);
        press(&mut app, KeyCode::Char('/'));
        let Body::Search(view) = project(&app).body else {
            panic!("expected search");
        };
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.placeholder, Some("Type to search..."));
        assert_eq!(view.notice, None);

        press(&mut app, KeyCode::Char('x'));
        let Body::Search(view) = project(&app).body else {
            panic!("expected search");
        };
        assert!(view.rows.is_empty());
        assert_eq!(view.notice, Some("No matches found"));
        assert_eq!((view.matches, view.total), (0, 2));
    }

    #[test]
    fn retained_query_highlights_matches_in_grid() {
        let mut app = app_with(&["src/a.rs", "doc.md"]);
        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Char('r'));
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Tab);
        let Body::Grid(panels) = project(&app).body else {
            panic!("expected grid");
        };
        assert!(panels[0].rows[0].matched);
        assert!(!panels[0].rows[1].matched);
    }

    #[test]
    fn empty_diff_is_a_notice() {
        let mut app = app_with(&["a.rs"]);
        let cmds = press(&mut app, KeyCode::Enter);
        let Some(Command::Dispatch { id, op }) = cmds.into_iter().next() else {
            panic!("no diff dispatched");
        };
        assert!(matches!(op, Operation::Diff { .. }));
        let Body::Diff(pane) = project(&app).body else {
            panic!("expected diff");
        };
        assert_eq!(pane.body, DiffBody::Loading);

        app.update(AppEvent::Completed(Completion {
            id,
            op,
            result: Ok(Outcome::Text(String::new())),
        }));
        let Body::Diff(pane) = project(&app).body else {
            panic!("expected diff");
        };
        assert_eq!(pane.body, DiffBody::Empty);
        assert_eq!(pane.position, None);
    }
}
