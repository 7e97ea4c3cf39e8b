use ratatui::{
    Frame,
    layout::{Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::theme::Palette;
use crate::view::CommitPane;

pub fn render_commit(f: &mut Frame, area: Rect, pane: &CommitPane, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(ratatui::symbols::border::ROUNDED)
        .border_style(Style::default().fg(palette.border_active))
        .title(Span::styled(
            " Commit Changes ",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Line::from(format!(" {} ", pane.count)).right_aligned());
    f.render_widget(block, area);

    let inner = area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    });

    let files = if pane.staged == 1 { "file" } else { "files" };
    let mut lines = vec![
        Line::styled(
            format!("{} staged {}", pane.staged, files),
            Style::default().fg(palette.muted),
        ),
        Line::raw(""),
    ];

    let cursor_style = if pane.busy {
        Style::default().fg(palette.muted)
    } else {
        Style::default().fg(palette.accent)
    };
    let mut message = vec![Span::raw("> "), Span::raw(pane.before_cursor.clone())];
    message.push(Span::styled("█", cursor_style));
    message.push(Span::raw(pane.after_cursor.clone()));
    lines.push(Line::from(message));

    if pane.busy {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            "Committing...",
            Style::default().fg(palette.busy),
        ));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
