#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchEntry {
    pub name: String,
    pub is_current: bool,
    pub is_remote: bool,
    pub tracking: Option<String>,
}

impl BranchEntry {
    pub fn kind_char(&self) -> char {
        if self.is_current {
            '*'
        } else if self.is_remote {
            'R'
        } else {
            'L'
        }
    }
}

pub const FOR_EACH_REF_FORMAT: &str =
    "%(HEAD)\t%(refname:short)\t%(upstream:short)\t%(upstream:track)";

/// Parses `git for-each-ref --format FOR_EACH_REF_FORMAT` output.
pub fn parse_branches(text: &str, is_remote: bool) -> Vec<BranchEntry> {
    let mut branches = Vec::new();

    for line in text.lines() {
        let mut it = line.split('\t');
        let head = it.next().unwrap_or("").trim();
        let name = it.next().unwrap_or("").trim().to_string();
        if name.is_empty() {
            continue;
        }
        // `origin/HEAD` shows up as plain `origin` under refname:short.
        if is_remote && (name.ends_with("/HEAD") || !name.contains('/')) {
            continue;
        }
        let upstream = it.next().map(str::trim).filter(|s| !s.is_empty());
        let track = it.next().map(str::trim).filter(|s| !s.is_empty());

        let tracking = match (upstream, track) {
            (Some(u), Some(t)) => Some(format!("{} {}", u, t)),
            (Some(u), None) => Some(u.to_string()),
            (None, _) => None,
        };

        branches.push(BranchEntry {
            name,
            is_current: !is_remote && head == "*",
            is_remote,
            tracking,
        });
    }

    branches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_branches_mark_current_and_tracking() {
        let text = "*\tmain\torigin/main\t[ahead 1]\n \tfeature\t\t\n";
        let branches = parse_branches(text, false);
        assert_eq!(branches.len(), 2);
        assert!(branches[0].is_current);
        assert_eq!(branches[0].tracking.as_deref(), Some("origin/main [ahead 1]"));
        assert_eq!(branches[0].kind_char(), '*');
        assert!(!branches[1].is_current);
        assert_eq!(branches[1].tracking, None);
        assert_eq!(branches[1].kind_char(), 'L');
    }

    #[test]
    fn remote_head_alias_is_skipped() {
        let text = " \torigin/HEAD\t\t\n \torigin\t\t\n \torigin/main\t\t\n";
        let branches = parse_branches(text, true);
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].name, "origin/main");
        assert_eq!(branches[0].kind_char(), 'R');
    }
}
