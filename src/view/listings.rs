//! Listing area rendering (loading, empty and populated states)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::audio::PlayerState;
use crate::model::{Listing, ListingsState, PreviewStatuses, UiState, site_link};
use super::utils::{calculate_listing_column_widths, format_price, truncate_string};

pub const LOADING_MESSAGE: &str = "Loading...";
pub const EMPTY_MESSAGE: &str = "No beats found";

pub fn render_listings(
    frame: &mut Frame,
    area: Rect,
    ui_state: &UiState,
    listings: &ListingsState,
    previews: &PreviewStatuses,
) {
    let border_style = Style::default().fg(Color::Green);

    if listings.is_loading {
        let loading = Paragraph::new(LOADING_MESSAGE)
            .style(Style::default().fg(Color::Yellow))
            .centered()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Beats ")
                    .border_style(border_style),
            );
        frame.render_widget(loading, area);
        return;
    }

    let display = listings.display_set();
    if display.is_empty() {
        let empty = Paragraph::new(EMPTY_MESSAGE)
            .style(Style::default().fg(Color::DarkGray))
            .centered()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Beats ")
                    .border_style(border_style),
            );
        frame.render_widget(empty, area);
        return;
    }

    let content_width = area.width.saturating_sub(4) as usize;
    let items = listing_items(&display, listings.selected, ui_state, previews, content_width);

    let title = format!(" Beats ({}) ", display.len());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .padding(Padding::horizontal(1))
                .border_style(border_style),
        )
        .highlight_style(Style::default()); // Highlight handled by item styles

    let mut list_state = ListState::default();
    list_state.select(Some(listings.selected + 1)); // +1 for header

    frame.render_stateful_widget(list, area, &mut list_state);
}

fn listing_items(
    display: &[&Listing],
    selected_index: usize,
    ui_state: &UiState,
    previews: &PreviewStatuses,
    content_width: usize,
) -> Vec<ListItem<'static>> {
    let (num_width, title_width, style_width, price_width) =
        calculate_listing_column_widths(content_width, display.len());

    let mut items: Vec<ListItem<'static>> = vec![
        ListItem::new(format!(
            " {:<num_width$}   {:<title_width$}   {:<style_width$}   {:>price_width$}",
            "#", "Title", "Style", "Price",
        ))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    ];

    items.extend(display.iter().enumerate().map(|(i, listing)| {
        let state = previews
            .get(&listing.id)
            .map(|p| p.state)
            .unwrap_or_default();
        let style = if i == selected_index {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else if state == PlayerState::Playing {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let indicator = match state {
            PlayerState::Playing => "▶",
            PlayerState::Loading => "…",
            PlayerState::Idle => " ",
        };
        let row = format!(
            "{}{:<num_width$}   {}   {}   {:>price_width$}",
            indicator,
            i + 1,
            truncate_string(&listing.title, title_width),
            truncate_string(listing.display_style(), style_width),
            format_price(listing.price, &ui_state.currency),
        );

        let links = Line::from(vec![
            Span::raw(" ".repeat(num_width + 4)),
            Span::styled("👤 ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                site_link(&ui_state.site_base_url, &listing.storefront_path()),
                Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            ),
            Span::raw("   "),
            Span::styled(
                site_link(&ui_state.site_base_url, &listing.detail_path()),
                Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            ),
        ]);

        ListItem::new(Text::from(vec![Line::styled(row, style), links]))
    }));

    items
}
