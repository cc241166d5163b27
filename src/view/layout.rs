//! Layout rendering (top bar)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::ListingsState;

pub fn render_top_bar(frame: &mut Frame, area: Rect, listings: &ListingsState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Style filter
            Constraint::Length(22), // Last fetch time
        ])
        .split(area);

    let filter = Paragraph::new(Line::from(vec![
        Span::styled("◀ ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            listings.filter.label().to_string(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ▶", Style::default().fg(Color::DarkGray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" 🎵 Style ")
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(filter, chunks[0]);

    let updated_text = match (&listings.fetched_at, listings.is_loading) {
        (_, true) => "fetching...".to_string(),
        (Some(at), false) => at.format("%H:%M:%S").to_string(),
        (None, false) => "never".to_string(),
    };
    let updated = Paragraph::new(updated_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title(" Updated "));
    frame.render_widget(updated, chunks[1]);
}
