//! Terminal column arithmetic.

use unicode_width::UnicodeWidthChar;

fn char_width(ch: char) -> usize {
    if ch == '\t' {
        4
    } else {
        UnicodeWidthChar::width(ch).unwrap_or(0)
    }
}

pub fn display_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// Longest prefix of `s` that fits in `width` columns.
pub fn truncate_to_width(s: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for ch in s.chars() {
        let w = char_width(ch);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out
}

/// Like [`truncate_to_width`], but marks a cut with a trailing `…`.
pub fn ellipsize(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = truncate_to_width(s, width - 1);
    out.push('…');
    out
}
