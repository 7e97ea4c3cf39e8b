//! Paints a projected [`Screen`] with ratatui.

mod commit;
mod diff;
mod panels;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::text::{display_width, ellipsize};
use crate::theme::Palette;
use crate::view::{Body, FOOTER_ROWS, HEADER_ROWS, Header, Screen, StatusLine};

pub fn draw(f: &mut Frame, screen: &Screen, palette: &Palette) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_ROWS),
            Constraint::Min(0),
            Constraint::Length(FOOTER_ROWS / 2),
            Constraint::Length(FOOTER_ROWS - FOOTER_ROWS / 2),
        ])
        .split(area);

    render_header(f, chunks[0], &screen.header, palette);

    match &screen.body {
        Body::Loading => {
            let p = Paragraph::new("Loading repository status... ⏳")
                .style(Style::default().fg(palette.muted));
            f.render_widget(p, chunks[1]);
        }
        Body::Grid(views) => panels::render_grid(f, chunks[1], views, palette),
        Body::Search(view) => panels::render_search(f, chunks[1], view, palette),
        Body::Diff(pane) => diff::render_diff(f, chunks[1], pane, palette),
        Body::Commit(pane) => commit::render_commit(f, chunks[1], pane, palette),
    }

    f.render_widget(
        Paragraph::new(ellipsize(screen.help, chunks[2].width as usize))
            .style(Style::default().fg(palette.muted)),
        chunks[2],
    );
    render_status(f, chunks[3], &screen.status, palette);
}

fn render_header(f: &mut Frame, area: Rect, header: &Header, palette: &Palette) {
    let bold = Style::default()
        .fg(palette.header)
        .add_modifier(Modifier::BOLD);

    let mut left = format!("Branch: {}", header.branch);
    if let Some(t) = &header.tracking {
        left.push_str(&format!(" ({})", t));
    }
    let right = header
        .last_commit
        .as_ref()
        .map(|c| format!("Last: {}", c))
        .unwrap_or_default();

    let width = area.width as usize;
    let left = ellipsize(&left, width);
    let room = width.saturating_sub(display_width(&left) + 2);
    let right = ellipsize(&right, room);
    let gap = width.saturating_sub(display_width(&left) + display_width(&right));

    let line = Line::from(vec![
        Span::styled(left, bold),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, bold),
    ]);
    f.render_widget(Paragraph::new(line), Rect { height: 1, ..area });
}

fn render_status(f: &mut Frame, area: Rect, status: &StatusLine, palette: &Palette) {
    let mut spans = Vec::new();
    if let Some(busy) = &status.busy {
        spans.push(Span::styled(busy.clone(), Style::default().fg(palette.busy)));
    }
    if let Some(msg) = &status.message {
        if !spans.is_empty() {
            spans.push(Span::raw("  "));
        }
        let color = if msg.is_error {
            palette.error
        } else {
            palette.info
        };
        spans.push(Span::styled(
            msg.text.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
