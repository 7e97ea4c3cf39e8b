//! Working-tree snapshot types and `git status` parsing.

use crate::branch::BranchEntry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    TypeChanged,
    Unmerged,
    Untracked,
}

impl StatusCode {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            'M' => Some(StatusCode::Modified),
            'A' => Some(StatusCode::Added),
            'D' => Some(StatusCode::Deleted),
            'R' => Some(StatusCode::Renamed),
            'C' => Some(StatusCode::Copied),
            'T' => Some(StatusCode::TypeChanged),
            'U' => Some(StatusCode::Unmerged),
            '?' => Some(StatusCode::Untracked),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            StatusCode::Modified => 'M',
            StatusCode::Added => 'A',
            StatusCode::Deleted => 'D',
            StatusCode::Renamed => 'R',
            StatusCode::Copied => 'C',
            StatusCode::TypeChanged => 'T',
            StatusCode::Unmerged => 'U',
            StatusCode::Untracked => '?',
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub status: StatusCode,
    pub staged: bool,
    /// Set on an unstaged entry whose index copy also differs from HEAD.
    pub partial: bool,
}

impl FileEntry {
    pub fn new<S: Into<String>>(path: S, status: StatusCode, staged: bool) -> Self {
        Self {
            path: path.into(),
            status,
            staged,
            partial: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StashEntry {
    pub index: usize,
    pub message: String,
    pub branch: String,
    pub date: String,
}

impl StashEntry {
    pub fn selector(&self) -> String {
        format!("stash@{{{}}}", self.index)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitSummary {
    pub hash: String,
    pub subject: String,
}

/// Everything one full status fetch returns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepoSnapshot {
    pub branch: String,
    pub ahead: u32,
    pub behind: u32,
    pub unstaged: Vec<FileEntry>,
    pub staged: Vec<FileEntry>,
    pub last_commit: Option<CommitSummary>,
    pub branches: Vec<BranchEntry>,
    pub stashes: Vec<StashEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkingStatus {
    pub branch: String,
    pub ahead: u32,
    pub behind: u32,
    pub unstaged: Vec<FileEntry>,
    pub staged: Vec<FileEntry>,
}

/// Parses `git status --porcelain=v1 -z -b`.
///
/// A path lands in exactly one list. Paths with both index and worktree
/// changes go to the unstaged list flagged `partial`, since staging them is
/// what brings the two sides together.
pub fn parse_status(out: &[u8]) -> WorkingStatus {
    let mut status = WorkingStatus::default();

    let items: Vec<&[u8]> = out
        .split(|b| *b == 0)
        .filter(|s| !s.is_empty())
        .collect();

    let mut i = 0;
    while i < items.len() {
        let s = String::from_utf8_lossy(items[i]).to_string();
        i += 1;

        if let Some(branch_line) = s.strip_prefix("## ") {
            parse_branch_line(branch_line, &mut status);
            continue;
        }

        if s.len() < 4 {
            continue;
        }

        let mut chars = s.chars();
        let x = chars.next().unwrap_or(' ');
        let y = chars.next().unwrap_or(' ');
        let Some(path) = s.get(3..).map(str::to_string) else {
            continue;
        };

        // Renames and copies carry their source path as the next record.
        if x == 'R' || x == 'C' {
            i += 1;
        }

        if x == '?' && y == '?' {
            status
                .unstaged
                .push(FileEntry::new(path, StatusCode::Untracked, false));
            continue;
        }
        if x == '!' {
            continue;
        }

        if is_conflict_status(x, y) {
            status
                .unstaged
                .push(FileEntry::new(path, StatusCode::Unmerged, false));
            continue;
        }

        let index_code = StatusCode::from_char(x);
        let worktree_code = StatusCode::from_char(y);

        match (index_code, worktree_code) {
            (Some(_), Some(work)) => {
                let mut entry = FileEntry::new(path, work, false);
                entry.partial = true;
                status.unstaged.push(entry);
            }
            (None, Some(work)) => status.unstaged.push(FileEntry::new(path, work, false)),
            (Some(index), None) => status.staged.push(FileEntry::new(path, index, true)),
            (None, None) => {}
        }
    }

    status
}

fn parse_branch_line(rest: &str, status: &mut WorkingStatus) {
    let rest = rest.trim();
    status.ahead = 0;
    status.behind = 0;
    if rest.is_empty() {
        status.branch.clear();
        return;
    }

    let (head, ab_part) = if let Some((left, right)) = rest.rsplit_once('[') {
        (left.trim(), Some(right.trim_end_matches(']').trim()))
    } else {
        (rest, None)
    };

    let head = head
        .strip_prefix("No commits yet on ")
        .or_else(|| head.strip_prefix("Initial commit on "))
        .unwrap_or(head);
    status.branch = head.split("...").next().unwrap_or(head).trim().to_string();

    let Some(ab_part) = ab_part else {
        return;
    };
    for item in ab_part.split(',').map(|s| s.trim()) {
        if let Some(v) = item.strip_prefix("ahead ") {
            status.ahead = v.parse::<u32>().unwrap_or(0);
        } else if let Some(v) = item.strip_prefix("behind ") {
            status.behind = v.parse::<u32>().unwrap_or(0);
        }
    }
}

fn is_conflict_status(x: char, y: char) -> bool {
    matches!(
        (x, y),
        ('U', 'U') | ('A', 'A') | ('D', 'D') | ('A', 'U') | ('U', 'A') | ('D', 'U') | ('U', 'D')
    )
}

/// Parses `git stash list --pretty=format:%gd%x09%gs%x09%cr`.
pub fn parse_stash_list(text: &str) -> Vec<StashEntry> {
    let mut entries = Vec::new();
    for line in text.lines() {
        let mut it = line.splitn(3, '\t');
        let selector = it.next().unwrap_or("").trim();
        let subject = it.next().unwrap_or("").trim();
        let date = it.next().unwrap_or("").trim().to_string();

        let Some(index) = selector
            .strip_prefix("stash@{")
            .and_then(|s| s.strip_suffix('}'))
            .and_then(|s| s.parse::<usize>().ok())
        else {
            continue;
        };

        let (branch, message) = split_stash_subject(subject);
        entries.push(StashEntry {
            index,
            message,
            branch,
            date,
        });
    }
    entries
}

// "WIP on main: 1a2b3c4 subject" / "On main: message"
fn split_stash_subject(subject: &str) -> (String, String) {
    let rest = subject
        .strip_prefix("WIP on ")
        .or_else(|| subject.strip_prefix("On "));
    match rest.and_then(|r| r.split_once(": ")) {
        Some((branch, message)) => (branch.trim().to_string(), message.trim().to_string()),
        None => (String::new(), subject.to_string()),
    }
}

/// Parses `git log -1 --pretty=format:%h%x09%s`.
pub fn parse_last_commit(text: &str) -> Option<CommitSummary> {
    let line = text.lines().next()?;
    let (hash, subject) = line.split_once('\t').unwrap_or((line, ""));
    let hash = hash.trim();
    if hash.is_empty() {
        return None;
    }
    Some(CommitSummary {
        hash: hash.to_string(),
        subject: subject.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn z(records: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        for r in records {
            out.extend_from_slice(r.as_bytes());
            out.push(0);
        }
        out
    }

    #[test]
    fn splits_index_and_worktree_changes() {
        let out = z(&[
            "## main...origin/main [ahead 2, behind 1]",
            "M  staged.rs",
            " M edited.rs",
            "?? new.txt",
            "A  added.rs",
            " D gone.rs",
        ]);
        let status = parse_status(&out);

        assert_eq!(status.branch, "main");
        assert_eq!(status.ahead, 2);
        assert_eq!(status.behind, 1);

        let staged: Vec<_> = status.staged.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(staged, vec!["staged.rs", "added.rs"]);
        assert!(status.staged.iter().all(|e| e.staged));

        let unstaged: Vec<_> = status
            .unstaged
            .iter()
            .map(|e| (e.path.as_str(), e.status.as_char()))
            .collect();
        assert_eq!(
            unstaged,
            vec![("edited.rs", 'M'), ("new.txt", '?'), ("gone.rs", 'D')]
        );
    }

    #[test]
    fn rename_consumes_source_record() {
        let out = z(&["## dev", "R  new_name.rs", "old_name.rs", " M other.rs"]);
        let status = parse_status(&out);
        assert_eq!(status.staged.len(), 1);
        assert_eq!(status.staged[0].path, "new_name.rs");
        assert_eq!(status.staged[0].status, StatusCode::Renamed);
        assert_eq!(status.unstaged.len(), 1);
        assert_eq!(status.unstaged[0].path, "other.rs");
    }

    #[test]
    fn partially_staged_path_appears_once() {
        let out = z(&["## main", "MM both.rs"]);
        let status = parse_status(&out);
        assert!(status.staged.is_empty());
        assert_eq!(status.unstaged.len(), 1);
        assert!(status.unstaged[0].partial);
    }

    #[test]
    fn conflicts_are_unmerged_unstaged_entries() {
        let out = z(&["## main", "UU clash.rs"]);
        let status = parse_status(&out);
        assert_eq!(status.unstaged[0].status, StatusCode::Unmerged);
        assert!(status.staged.is_empty());
    }

    #[test]
    fn fresh_repository_branch_line() {
        let out = z(&["## No commits yet on main"]);
        let status = parse_status(&out);
        assert_eq!(status.branch, "main");
    }

    #[test]
    fn stash_list_extracts_branch_and_message() {
        let text = "stash@{0}\tWIP on main: 1a2b3c4 fix parser\t2 minutes ago\n\
                    stash@{1}\tOn feature/x: experiments\t3 days ago\n";
        let stashes = parse_stash_list(text);
        assert_eq!(stashes.len(), 2);
        assert_eq!(stashes[0].index, 0);
        assert_eq!(stashes[0].branch, "main");
        assert_eq!(stashes[0].message, "1a2b3c4 fix parser");
        assert_eq!(stashes[1].branch, "feature/x");
        assert_eq!(stashes[1].date, "3 days ago");
        assert_eq!(stashes[1].selector(), "stash@{1}");
    }

    #[test]
    fn last_commit_absent_on_empty_output() {
        assert_eq!(parse_last_commit(""), None);
        let c = parse_last_commit("abc1234\tInitial import").unwrap();
        assert_eq!(c.hash, "abc1234");
        assert_eq!(c.subject, "Initial import");
    }
}
