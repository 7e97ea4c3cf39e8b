use ratatui::{
    Frame,
    layout::{Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::diff::LineKind;
use crate::text::truncate_to_width;
use crate::theme::Palette;
use crate::view::{DiffBody, DiffPane};

pub fn render_diff(f: &mut Frame, area: Rect, pane: &DiffPane, palette: &Palette) {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_set(ratatui::symbols::border::ROUNDED)
        .border_style(Style::default().fg(palette.border_inactive))
        .title(Span::styled(
            format!(" Diff: {} ", pane.title),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ));
    if let Some(pos) = &pane.position {
        block = block.title_bottom(Line::from(format!(" {} ", pos)).right_aligned());
    }
    f.render_widget(block, area);

    let inner = area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    });
    let width = inner.width as usize;

    let lines: Vec<Line> = match &pane.body {
        DiffBody::Loading => vec![Line::styled(
            "Loading diff...",
            Style::default().fg(palette.muted),
        )],
        DiffBody::Empty => vec![Line::styled(
            "No differences",
            Style::default().fg(palette.muted),
        )],
        DiffBody::Error(msg) => vec![
            Line::styled(
                "Could not load diff",
                Style::default()
                    .fg(palette.error)
                    .add_modifier(Modifier::BOLD),
            ),
            Line::styled(msg.clone(), Style::default().fg(palette.error)),
        ],
        DiffBody::Lines(lines) => lines
            .iter()
            .map(|l| {
                let style = match l.kind {
                    LineKind::Added => Style::default().fg(palette.diff_add),
                    LineKind::Removed => Style::default().fg(palette.diff_del),
                    LineKind::Hunk => Style::default().fg(palette.diff_hunk),
                    LineKind::Header => Style::default()
                        .fg(palette.diff_header)
                        .add_modifier(Modifier::BOLD),
                    LineKind::Context => Style::default().fg(palette.fg),
                };
                Line::styled(truncate_to_width(&l.text, width), style)
            })
            .collect(),
    };
    f.render_widget(Paragraph::new(lines), inner);
}
