//! The two file lists and the provisional moves applied between full refreshes.
//!
//! A path is in at most one of the lists. Moves are keyed by path, so applying
//! the same move twice, or a move for a path that already left, changes
//! nothing. A full refresh replaces both lists and wins over any earlier move.

use crate::git::FileEntry;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileLists {
    pub unstaged: Vec<FileEntry>,
    pub staged: Vec<FileEntry>,
}

impl FileLists {
    pub fn replace(&mut self, unstaged: Vec<FileEntry>, staged: Vec<FileEntry>) {
        self.unstaged = unstaged;
        self.staged = staged;
    }

    pub fn list(&self, staged: bool) -> &[FileEntry] {
        if staged { &self.staged } else { &self.unstaged }
    }

    pub fn find(&self, path: &str, staged: bool) -> Option<&FileEntry> {
        self.list(staged).iter().find(|e| e.path == path)
    }

    /// Moves `path` into the staged list (`to_staged`) or out of it.
    ///
    /// Returns the index the entry held in its source list, or `None` when
    /// the path was not there.
    pub fn move_to(&mut self, path: &str, to_staged: bool) -> Option<usize> {
        let (from, to) = if to_staged {
            (&mut self.unstaged, &mut self.staged)
        } else {
            (&mut self.staged, &mut self.unstaged)
        };
        let idx = from.iter().position(|e| e.path == path)?;
        let mut entry = from.remove(idx);
        entry.staged = to_staged;
        entry.partial = false;
        // A stale copy in the destination must not survive next to the moved one.
        to.retain(|e| e.path != path);
        to.push(entry);
        Some(idx)
    }

    /// Paths with content in the index, counting partially staged ones
    /// that are listed as unstaged.
    pub fn staged_count(&self) -> usize {
        self.staged.len() + self.unstaged.iter().filter(|e| e.partial).count()
    }

    pub fn has_staged_content(&self) -> bool {
        self.staged_count() > 0
    }

    pub fn is_consistent(&self) -> bool {
        self.unstaged
            .iter()
            .all(|u| self.staged.iter().all(|s| s.path != u.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::StatusCode;

    fn lists() -> FileLists {
        FileLists {
            unstaged: vec![
                FileEntry::new("a.txt", StatusCode::Modified, false),
                FileEntry::new("b.txt", StatusCode::Untracked, false),
            ],
            staged: Vec::new(),
        }
    }

    #[test]
    fn staging_moves_entry_and_flips_flag() {
        let mut l = lists();
        assert_eq!(l.move_to("a.txt", true), Some(0));
        assert_eq!(l.unstaged, vec![FileEntry::new("b.txt", StatusCode::Untracked, false)]);
        assert_eq!(l.staged, vec![FileEntry::new("a.txt", StatusCode::Modified, true)]);
        assert!(l.is_consistent());
    }

    #[test]
    fn round_trip_restores_status_code() {
        let mut l = lists();
        l.move_to("b.txt", true);
        l.move_to("b.txt", false);
        let b = l.find("b.txt", false).unwrap();
        assert_eq!(b.status, StatusCode::Untracked);
        assert!(!b.staged);
        assert!(l.staged.is_empty());
        assert!(l.is_consistent());
    }

    #[test]
    fn repeated_move_is_a_no_op() {
        let mut l = lists();
        l.move_to("a.txt", true);
        let before = l.clone();
        assert_eq!(l.move_to("a.txt", true), None);
        assert_eq!(l, before);
    }

    #[test]
    fn unknown_path_is_ignored() {
        let mut l = lists();
        let before = l.clone();
        assert_eq!(l.move_to("missing.rs", false), None);
        assert_eq!(l, before);
    }

    #[test]
    fn partial_entries_count_as_staged_content() {
        let mut l = FileLists::default();
        assert!(!l.has_staged_content());

        let mut both = FileEntry::new("both.rs", StatusCode::Modified, false);
        both.partial = true;
        l.replace(vec![both, FileEntry::new("new.rs", StatusCode::Untracked, false)], Vec::new());
        assert_eq!(l.staged_count(), 1);
        assert!(l.has_staged_content());

        l.move_to("both.rs", true);
        assert_eq!(l.staged_count(), 1);
        assert!(!l.staged[0].partial);
    }

    #[test]
    fn refresh_overrides_provisional_moves() {
        let mut l = lists();
        l.move_to("a.txt", true);
        l.replace(
            vec![FileEntry::new("a.txt", StatusCode::Modified, false)],
            Vec::new(),
        );
        assert_eq!(l.unstaged.len(), 1);
        assert!(l.staged.is_empty());
    }
}
