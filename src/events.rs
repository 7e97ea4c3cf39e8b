//! Events consumed by the state machine, and the fixed keymap that turns
//! key presses into actions for the active mode.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::dispatch::Completion;

/// Everything that can change the session. Events are applied one at a time,
/// in the order they arrive on the channel.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize { width: u16, height: u16 },
    Tick,
    /// Clears the status message with this id, if it is still shown.
    ClearStatus(u64),
    Completed(Completion),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeKind {
    Normal,
    Search,
    Diff,
    Commit,
}

/// A key press after keymap resolution. The active mode decides what each
/// action means; `Confirm` opens an item in Normal and Search and submits the
/// message in Commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    PrevPanel,
    NextPanel,
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
    ToggleSelect,
    StartSearch,
    Stage,
    Unstage,
    Discard,
    StageAll,
    StartCommit,
    Push,
    Stash,
    PopStash,
    Refresh,
    Confirm,
    Jump,
    Cancel,
    Input(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
}

pub fn action_for(mode: ModeKind, key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    match mode {
        ModeKind::Normal => normal_key(key),
        ModeKind::Search => search_key(key),
        ModeKind::Diff => diff_key(key),
        ModeKind::Commit => commit_key(key),
    }
}

fn normal_key(key: KeyEvent) -> Option<Action> {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }
    let action = match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => Action::PrevPanel,
        KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => Action::NextPanel,
        KeyCode::Char('k') | KeyCode::Up => Action::Up,
        KeyCode::Char('j') | KeyCode::Down => Action::Down,
        KeyCode::Char('g') | KeyCode::Home => Action::Top,
        KeyCode::Char('G') | KeyCode::End => Action::Bottom,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Char(' ') => Action::ToggleSelect,
        KeyCode::Char('/') => Action::StartSearch,
        KeyCode::Char('s') | KeyCode::Char('+') => Action::Stage,
        KeyCode::Char('u') | KeyCode::Char('-') => Action::Unstage,
        KeyCode::Char('d') => Action::Discard,
        KeyCode::Char('a') => Action::StageAll,
        KeyCode::Char('c') => Action::StartCommit,
        KeyCode::Char('p') => Action::Push,
        KeyCode::Char('S') => Action::Stash,
        KeyCode::Char('P') => Action::PopStash,
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Enter => Action::Confirm,
        KeyCode::Esc => Action::Cancel,
        _ => return None,
    };
    Some(action)
}

fn search_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('p') => Some(Action::Up),
            KeyCode::Char('n') => Some(Action::Down),
            KeyCode::Char('s') => Some(Action::Stage),
            KeyCode::Char('u') => Some(Action::Unstage),
            _ => None,
        };
    }
    let action = match key.code {
        KeyCode::Up => Action::Up,
        KeyCode::Down => Action::Down,
        KeyCode::Enter => Action::Confirm,
        KeyCode::Tab => Action::Jump,
        KeyCode::Esc => Action::Cancel,
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::ALT) => Action::Input(ch),
        _ => return None,
    };
    Some(action)
}

fn diff_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('d') => Some(Action::PageDown),
            KeyCode::Char('u') => Some(Action::PageUp),
            _ => None,
        };
    }
    let action = match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('k') | KeyCode::Up => Action::Up,
        KeyCode::Char('j') | KeyCode::Down => Action::Down,
        KeyCode::PageDown | KeyCode::Char(' ') => Action::PageDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::Char('g') | KeyCode::Home => Action::Top,
        KeyCode::Char('G') | KeyCode::End => Action::Bottom,
        KeyCode::Esc | KeyCode::Backspace => Action::Cancel,
        _ => return None,
    };
    Some(action)
}

fn commit_key(key: KeyEvent) -> Option<Action> {
    let action = match key.code {
        KeyCode::Enter => Action::Confirm,
        KeyCode::Esc => Action::Cancel,
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Delete => Action::Delete,
        KeyCode::Left => Action::Left,
        KeyCode::Right => Action::Right,
        KeyCode::Home => Action::Home,
        KeyCode::End => Action::End,
        KeyCode::Char(ch)
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT) =>
        {
            Action::Input(ch)
        }
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        for mode in [
            ModeKind::Normal,
            ModeKind::Search,
            ModeKind::Diff,
            ModeKind::Commit,
        ] {
            assert_eq!(action_for(mode, ctrl('c')), Some(Action::Quit));
        }
    }

    #[test]
    fn letters_are_text_while_typing() {
        let s = key(KeyCode::Char('s'));
        assert_eq!(action_for(ModeKind::Normal, s), Some(Action::Stage));
        assert_eq!(action_for(ModeKind::Search, s), Some(Action::Input('s')));
        assert_eq!(action_for(ModeKind::Commit, s), Some(Action::Input('s')));
        assert_eq!(action_for(ModeKind::Diff, s), None);

        let q = key(KeyCode::Char('q'));
        assert_eq!(action_for(ModeKind::Commit, q), Some(Action::Input('q')));
        assert_eq!(action_for(ModeKind::Diff, q), Some(Action::Quit));
    }

    #[test]
    fn control_chords_in_search() {
        assert_eq!(action_for(ModeKind::Search, ctrl('s')), Some(Action::Stage));
        assert_eq!(action_for(ModeKind::Search, ctrl('u')), Some(Action::Unstage));
        assert_eq!(action_for(ModeKind::Search, ctrl('n')), Some(Action::Down));
        assert_eq!(action_for(ModeKind::Diff, ctrl('u')), Some(Action::PageUp));
        assert_eq!(action_for(ModeKind::Normal, ctrl('s')), None);
    }

    #[test]
    fn panel_keys_cycle_both_ways() {
        assert_eq!(
            action_for(ModeKind::Normal, key(KeyCode::Tab)),
            Some(Action::NextPanel)
        );
        assert_eq!(
            action_for(ModeKind::Normal, key(KeyCode::BackTab)),
            Some(Action::PrevPanel)
        );
        assert_eq!(
            action_for(ModeKind::Search, key(KeyCode::Tab)),
            Some(Action::Jump)
        );
    }
}
