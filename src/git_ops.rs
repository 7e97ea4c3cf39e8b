//! Repository gateway: the synchronous calls the dashboard dispatches.

use std::{
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

use crate::branch::{self, FOR_EACH_REF_FORMAT};
use crate::error::GitError;
use crate::git::{self, RepoSnapshot, StatusCode};

/// Every call either succeeds or fails with a descriptive error. Calls block,
/// so they are only ever made from the dispatcher's blocking pool.
pub trait Repository: Send + Sync {
    fn fetch_status(&self) -> Result<RepoSnapshot, GitError>;
    fn stage_file(&self, path: &str) -> Result<(), GitError>;
    /// `status` is the code of the staged entry; untracked-but-staged files
    /// need a different command than tracked ones.
    fn unstage_file(&self, path: &str, status: StatusCode) -> Result<(), GitError>;
    fn discard_changes(&self, path: &str, status: StatusCode) -> Result<(), GitError>;
    fn stage_all(&self) -> Result<(), GitError>;
    fn commit(&self, message: &str) -> Result<(), GitError>;
    fn push(&self) -> Result<(), GitError>;
    fn switch_branch(&self, name: &str) -> Result<(), GitError>;
    fn get_diff(&self, path: &str, staged: bool) -> Result<String, GitError>;
    fn stash(&self, message: Option<&str>) -> Result<(), GitError>;
    fn stash_pop(&self, index: usize) -> Result<(), GitError>;
    fn drop_stash(&self, index: usize) -> Result<(), GitError>;
    fn show_stash(&self, index: usize) -> Result<String, GitError>;
}

/// Gateway backed by the `git` executable.
#[derive(Clone, Debug)]
pub struct GitCli {
    root: PathBuf,
}

fn run_git(cwd: &Path, args: &[&str]) -> io::Result<Output> {
    git_command(cwd, args).output()
}

fn git_command(cwd: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("-C")
        .arg(cwd)
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GCM_INTERACTIVE", "never")
        .env("GIT_PAGER", "cat")
        .env("PAGER", "cat")
        .env("GIT_EDITOR", ":")
        .env("EDITOR", ":")
        .env("GIT_SEQUENCE_EDITOR", ":")
        .env("GIT_MERGE_AUTOEDIT", "no");
    cmd
}

fn stderr_or_stdout(out: &Output) -> String {
    let err = String::from_utf8_lossy(&out.stderr).trim().to_string();
    if err.is_empty() {
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    } else {
        err
    }
}

impl GitCli {
    /// Resolves the top-level directory of the repository containing `path`.
    pub fn discover(path: &Path) -> Result<Self, GitError> {
        if !path.is_dir() {
            return Err(GitError::NotARepository(path.to_path_buf()));
        }
        let out = run_git(path, &["rev-parse", "--show-toplevel"]).map_err(|source| {
            GitError::Spawn {
                op: "locate repository",
                source,
            }
        })?;
        if !out.status.success() {
            return Err(GitError::NotARepository(path.to_path_buf()));
        }
        let root = String::from_utf8_lossy(&out.stdout).trim().to_string();
        if root.is_empty() {
            return Err(GitError::NotARepository(path.to_path_buf()));
        }
        Ok(Self {
            root: PathBuf::from(root),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn output(&self, op: &'static str, args: &[&str]) -> Result<Output, GitError> {
        tracing::trace!(op, ?args, "git");
        run_git(&self.root, args).map_err(|source| GitError::Spawn { op, source })
    }

    fn run(&self, op: &'static str, args: &[&str]) -> Result<(), GitError> {
        let out = self.output(op, args)?;
        if out.status.success() {
            Ok(())
        } else {
            Err(GitError::failed(op, stderr_or_stdout(&out)))
        }
    }

    fn text(&self, op: &'static str, args: &[&str]) -> Result<String, GitError> {
        let out = self.output(op, args)?;
        if !out.status.success() {
            return Err(GitError::failed(op, stderr_or_stdout(&out)));
        }
        Ok(String::from_utf8_lossy(&out.stdout).to_string())
    }

    fn has_upstream(&self) -> bool {
        self.output(
            "push",
            &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
        )
        .map(|o| o.status.success())
        .unwrap_or(false)
    }

    fn porcelain_code(&self, path: &str) -> Option<String> {
        let out = self
            .text("diff", &["status", "--porcelain=v1", "--", path])
            .ok()?;
        out.lines().next().map(|l| l.chars().take(2).collect())
    }

    /// Renders an untracked path as an all-additions diff.
    fn untracked_diff(&self, path: &str) -> String {
        let file_path = self.root.join(path);
        if file_path.is_dir() {
            return match fs::read_dir(&file_path) {
                Ok(entries) => {
                    let mut lines = vec![format!("Untracked directory: {}/", path), String::new()];
                    for entry in entries.filter_map(|e| e.ok()) {
                        let name = entry.file_name().to_string_lossy().to_string();
                        let prefix = if entry.path().is_dir() { "  " } else { "  + " };
                        lines.push(format!("{}{}", prefix, name));
                    }
                    lines.join("\n")
                }
                Err(e) => format!("Cannot read directory: {}", e),
            };
        }

        match fs::read_to_string(&file_path) {
            Ok(content) => {
                let lines: Vec<&str> = content.lines().collect();
                let mut out = vec![
                    format!("diff --git a/{} b/{}", path, path),
                    "new file mode 100644".to_string(),
                    "--- /dev/null".to_string(),
                    format!("+++ b/{}", path),
                    format!("@@ -0,0 +1,{} @@", lines.len()),
                ];
                out.extend(lines.iter().map(|l| format!("+{}", l)));
                out.join("\n")
            }
            Err(e) => format!("Cannot read file: {}", e),
        }
    }
}

impl Repository for GitCli {
    fn fetch_status(&self) -> Result<RepoSnapshot, GitError> {
        let out = self.output("status", &["status", "--porcelain=v1", "-z", "-b"])?;
        if !out.status.success() {
            return Err(GitError::failed("status", stderr_or_stdout(&out)));
        }
        let working = git::parse_status(&out.stdout);

        // No commits yet is not an error for the header.
        let last_commit = self
            .text("status", &["log", "-1", "--no-color", "--pretty=format:%h%x09%s"])
            .ok()
            .and_then(|t| git::parse_last_commit(&t));

        let local = self.text(
            "list branches",
            &[
                "for-each-ref",
                "--sort=-committerdate",
                "refs/heads",
                "--format",
                FOR_EACH_REF_FORMAT,
            ],
        )?;
        let remote = self.text(
            "list branches",
            &[
                "for-each-ref",
                "--sort=-committerdate",
                "refs/remotes",
                "--format",
                FOR_EACH_REF_FORMAT,
            ],
        )?;
        let mut branches = branch::parse_branches(&local, false);
        branches.extend(branch::parse_branches(&remote, true));

        let stash_text = self.text(
            "list stashes",
            &[
                "stash",
                "list",
                "--no-color",
                "--pretty=format:%gd%x09%gs%x09%cr",
            ],
        )?;

        Ok(RepoSnapshot {
            branch: working.branch,
            ahead: working.ahead,
            behind: working.behind,
            unstaged: working.unstaged,
            staged: working.staged,
            last_commit,
            branches,
            stashes: git::parse_stash_list(&stash_text),
        })
    }

    fn stage_file(&self, path: &str) -> Result<(), GitError> {
        self.run("stage", &["add", "--", path])
    }

    fn unstage_file(&self, path: &str, status: StatusCode) -> Result<(), GitError> {
        match status {
            // New files have no HEAD version to restore the index from.
            StatusCode::Added | StatusCode::Untracked => {
                self.run("unstage", &["rm", "--cached", "--quiet", "--", path])
            }
            _ => self.run("unstage", &["restore", "--staged", "--", path]),
        }
    }

    fn discard_changes(&self, path: &str, status: StatusCode) -> Result<(), GitError> {
        match status {
            StatusCode::Untracked => self.run("discard", &["clean", "-f", "-d", "--", path]),
            StatusCode::Unmerged => Err(GitError::InvalidInput(format!(
                "cannot discard {}: resolve the conflict first",
                path
            ))),
            _ => self.run("discard", &["restore", "--", path]),
        }
    }

    fn stage_all(&self) -> Result<(), GitError> {
        self.run("stage all", &["add", "-A"])
    }

    fn commit(&self, message: &str) -> Result<(), GitError> {
        let msg = message.trim();
        if msg.is_empty() {
            return Err(GitError::InvalidInput("empty commit message".to_string()));
        }

        let spawn = |source: io::Error| GitError::Spawn {
            op: "commit",
            source,
        };
        let mut child = git_command(&self.root, &["commit", "-F", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(msg.as_bytes()).map_err(spawn)?;
        }

        let out = child.wait_with_output().map_err(spawn)?;
        if out.status.success() {
            Ok(())
        } else {
            Err(GitError::failed("commit", stderr_or_stdout(&out)))
        }
    }

    fn push(&self) -> Result<(), GitError> {
        if self.has_upstream() {
            self.run("push", &["push"])
        } else {
            self.run("push", &["push", "--set-upstream", "origin", "HEAD"])
        }
    }

    fn switch_branch(&self, name: &str) -> Result<(), GitError> {
        self.run("switch branch", &["checkout", name])
    }

    fn get_diff(&self, path: &str, staged: bool) -> Result<String, GitError> {
        let mut args: Vec<&str> = vec!["diff", "--no-color"];
        if staged {
            args.push("--cached");
        }
        args.push("--");
        args.push(path);

        let text = self.text("diff", &args)?;
        if !text.trim().is_empty() {
            return Ok(text);
        }

        match self.porcelain_code(path).as_deref() {
            Some("??") => Ok(self.untracked_diff(path)),
            _ => Ok(String::new()),
        }
    }

    fn stash(&self, message: Option<&str>) -> Result<(), GitError> {
        match message.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) => self.run("stash", &["stash", "push", "-m", m]),
            None => self.run("stash", &["stash", "push"]),
        }
    }

    fn stash_pop(&self, index: usize) -> Result<(), GitError> {
        let selector = format!("stash@{{{}}}", index);
        self.run("stash pop", &["stash", "pop", selector.as_str()])
    }

    fn drop_stash(&self, index: usize) -> Result<(), GitError> {
        let selector = format!("stash@{{{}}}", index);
        self.run("drop stash", &["stash", "drop", selector.as_str()])
    }

    fn show_stash(&self, index: usize) -> Result<String, GitError> {
        let selector = format!("stash@{{{}}}", index);
        self.text(
            "show stash",
            &["stash", "show", "-p", "--no-color", selector.as_str()],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli(dir: &TempDir) -> GitCli {
        GitCli {
            root: dir.path().to_path_buf(),
        }
    }

    #[test]
    fn untracked_file_renders_as_additions() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "line 1\nline 2\n").unwrap();

        let diff = cli(&dir).untracked_diff("notes.txt");

        assert!(diff.starts_with("diff --git a/notes.txt b/notes.txt"));
        assert!(diff.contains("@@ -0,0 +1,2 @@"));
        assert!(diff.lines().any(|l| l == "+line 1"));
        assert!(diff.lines().any(|l| l == "+line 2"));
    }

    #[test]
    fn untracked_directory_lists_contents() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("assets");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("logo.svg"), "<svg/>").unwrap();

        let diff = cli(&dir).untracked_diff("assets");

        assert!(diff.starts_with("Untracked directory: assets/"));
        assert!(diff.contains("  + logo.svg"));
    }

    #[test]
    fn empty_commit_message_is_rejected_before_running_git() {
        let dir = TempDir::new().unwrap();
        let err = cli(&dir).commit("   \n").unwrap_err();
        assert!(matches!(err, GitError::InvalidInput(_)));
    }

    #[test]
    fn missing_directory_is_not_a_repository() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            GitCli::discover(&missing),
            Err(GitError::NotARepository(_))
        ));
    }

    #[test]
    fn conflicted_paths_cannot_be_discarded() {
        let dir = TempDir::new().unwrap();
        let err = cli(&dir)
            .discard_changes("clash.rs", StatusCode::Unmerged)
            .unwrap_err();
        assert!(err.to_string().contains("resolve the conflict"));
    }
}
