//! Diff viewer sub-state: what is shown, whether it arrived, and where it is scrolled to.

use crate::dispatch::OpId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffSource {
    File { path: String, staged: bool },
    Stash { index: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffContent {
    Loading,
    Text(Vec<String>),
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Header,
    Hunk,
    Added,
    Removed,
    Context,
}

pub fn classify(line: &str) -> LineKind {
    if line.starts_with("@@") {
        LineKind::Hunk
    } else if line.starts_with("diff --git")
        || line.starts_with("index ")
        || line.starts_with("--- ")
        || line.starts_with("+++ ")
        || line.starts_with("new file mode")
        || line.starts_with("deleted file mode")
        || line.starts_with("rename ")
        || line.starts_with("similarity ")
    {
        LineKind::Header
    } else if line.starts_with('+') {
        LineKind::Added
    } else if line.starts_with('-') {
        LineKind::Removed
    } else {
        LineKind::Context
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffView {
    pub title: String,
    pub source: DiffSource,
    /// The fetch whose completion this view accepts.
    pub awaiting: Option<OpId>,
    pub content: DiffContent,
    pub scroll: usize,
}

impl DiffView {
    pub fn loading(source: DiffSource, id: OpId) -> Self {
        let title = match &source {
            DiffSource::File { path, staged: true } => format!("{} (staged)", path),
            DiffSource::File { path, staged: false } => path.clone(),
            DiffSource::Stash { index } => format!("stash@{{{}}}", index),
        };
        Self {
            title,
            source,
            awaiting: Some(id),
            content: DiffContent::Loading,
            scroll: 0,
        }
    }

    /// Accepts the result of fetch `id`. Returns false, leaving the view
    /// untouched, when the view is not waiting for that fetch.
    pub fn receive(&mut self, id: OpId, result: Result<String, String>) -> bool {
        if self.awaiting != Some(id) {
            return false;
        }
        self.awaiting = None;
        self.scroll = 0;
        self.content = match result {
            Ok(text) => DiffContent::Text(text.lines().map(str::to_string).collect()),
            Err(msg) => DiffContent::Error(msg),
        };
        true
    }

    pub fn line_count(&self) -> usize {
        match &self.content {
            DiffContent::Text(lines) => lines.len(),
            _ => 0,
        }
    }

    fn max_scroll(&self, page: usize) -> usize {
        self.line_count().saturating_sub(page.max(1))
    }

    pub fn scroll_by(&mut self, delta: isize, page: usize) {
        let next = if delta < 0 {
            self.scroll.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll.saturating_add(delta as usize)
        };
        self.scroll = next.min(self.max_scroll(page));
    }

    /// Pages keep `overlap` lines of the previous page on screen.
    pub fn page(&mut self, forward: bool, page: usize, overlap: usize) {
        let step = page.saturating_sub(overlap).max(1) as isize;
        self.scroll_by(if forward { step } else { -step }, page);
    }

    pub fn top(&mut self) {
        self.scroll = 0;
    }

    pub fn bottom(&mut self, page: usize) {
        self.scroll = self.max_scroll(page);
    }

    pub fn clamp(&mut self, page: usize) {
        self.scroll = self.scroll.min(self.max_scroll(page));
    }
}
