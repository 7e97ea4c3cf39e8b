//! The four-panel grid and the search results pane.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use crate::text::{display_width, ellipsize};
use crate::theme::Palette;
use crate::view::{PanelView, Row, SearchView};

pub fn render_grid(f: &mut Frame, area: Rect, views: &[PanelView], palette: &Palette) {
    let top = area.height / 2;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(top), Constraint::Min(0)])
        .split(area);

    let mut cells = Vec::with_capacity(4);
    for row in rows.iter() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(*row);
        cells.extend(cols.iter().copied());
    }

    for (view, cell) in views.iter().zip(cells) {
        render_panel(f, cell, view, palette);
    }
}

fn panel_block(title: String, active: bool, palette: &Palette) -> Block<'static> {
    let border = if active {
        palette.border_active
    } else {
        palette.border_inactive
    };
    Block::default()
        .borders(Borders::ALL)
        .border_set(ratatui::symbols::border::ROUNDED)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ))
}

fn render_panel(f: &mut Frame, area: Rect, view: &PanelView, palette: &Palette) {
    f.render_widget(panel_block(view.title.clone(), view.active, palette), area);
    let inner = area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    });

    if let Some(empty) = view.empty {
        f.render_widget(
            Paragraph::new(format!("  {}", empty)).style(Style::default().fg(palette.muted)),
            inner,
        );
        return;
    }

    let width = inner.width as usize;
    let items: Vec<ListItem> = view
        .rows
        .iter()
        .map(|r| ListItem::new(row_line(r, width, palette)))
        .collect();
    f.render_widget(List::new(items), inner);
}

/// One list row: cursor marker, selection marker, text, then the tag.
fn row_line(row: &Row, width: usize, palette: &Palette) -> Line<'static> {
    let prefix = match (row.cursor, row.selected) {
        (true, true) => ">*",
        (true, false) => "> ",
        (false, true) => " *",
        (false, false) => "  ",
    };
    let tag = row
        .tag
        .as_ref()
        .map(|t| format!(" {}", t))
        .unwrap_or_default();
    let busy = if row.busy { " …" } else { "" };
    let room = width.saturating_sub(display_width(prefix) + display_width(&tag) + busy.len());
    let text = ellipsize(&row.text, room);

    let mut style = Style::default().fg(palette.muted);
    if row.matched {
        style = style.fg(palette.matched);
    }
    if row.selected {
        style = style.fg(palette.marked);
    }
    if row.cursor {
        style = style
            .fg(palette.accent)
            .bg(palette.selection_bg)
            .add_modifier(Modifier::BOLD);
    }
    if row.busy {
        style = style.add_modifier(Modifier::DIM);
    }

    Line::from(vec![
        Span::styled(prefix, style),
        Span::styled(text, style),
        Span::styled(tag, style),
        Span::styled(busy, Style::default().fg(palette.busy)),
    ])
}

pub fn render_search(f: &mut Frame, area: Rect, view: &SearchView, palette: &Palette) {
    let title = format!("{} ({}/{})", view.title, view.matches, view.total);
    f.render_widget(panel_block(title, true, palette), area);
    let inner = area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    });
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let prompt = match view.placeholder {
        Some(p) => Line::from(vec![
            Span::styled("/ ", Style::default().fg(palette.accent)),
            Span::styled(p, Style::default().fg(palette.muted)),
        ]),
        None => Line::from(vec![
            Span::styled("/ ", Style::default().fg(palette.accent)),
            Span::styled(view.query.clone(), Style::default().fg(palette.fg)),
            Span::styled("█", Style::default().fg(palette.accent)),
        ]),
    };
    f.render_widget(Paragraph::new(prompt), chunks[0]);

    if let Some(notice) = view.notice {
        f.render_widget(
            Paragraph::new(format!("  {}", notice)).style(Style::default().fg(palette.muted)),
            chunks[1],
        );
        return;
    }

    let width = chunks[1].width as usize;
    let items: Vec<ListItem> = view
        .rows
        .iter()
        .map(|r| ListItem::new(row_line(r, width, palette)))
        .collect();
    f.render_widget(List::new(items), chunks[1]);
}
