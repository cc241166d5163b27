//! Preview status bar rendering

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use crate::audio::PlayerState;
use crate::model::{ListingsState, PreviewStatus, PreviewStatuses};
use super::utils::format_duration;

pub fn render_preview_bar(
    frame: &mut Frame,
    area: Rect,
    listings: &ListingsState,
    previews: &PreviewStatuses,
) {
    let selected = listings.selected_listing();
    let status = selected
        .and_then(|l| previews.get(&l.id))
        .cloned()
        .unwrap_or_default();

    let status_text = match (selected, status.state) {
        (None, _) => " No beat selected".to_string(),
        (Some(listing), PlayerState::Idle) => format!(" ■ {}", listing.title),
        (Some(listing), PlayerState::Loading) => format!(" … {} (loading preview)", listing.title),
        (Some(listing), PlayerState::Playing) => format!(" ▶ {}", listing.title),
    };

    let active = previews
        .values()
        .filter(|p| p.state != PlayerState::Idle)
        .count();
    let controls_info = format!(" Playing: {} | Space play/stop | h help ", active);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} ", status_text))
                .title_bottom(Line::from(controls_info).right_aligned()),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(progress_ratio(&status))
        .label(format!(
            "{} / {}",
            format_duration(status.progress_ms()),
            format_duration(status.duration_ms())
        ));

    frame.render_widget(gauge, area);
}

fn progress_ratio(status: &PreviewStatus) -> f64 {
    let duration = status.duration_ms();
    if duration > 0 {
        (status.progress_ms() as f64 / duration as f64).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
