//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (formatting, popup placement)
//! - `layout`: Top bar (style filter, last fetch)
//! - `listings`: Listing area with loading and empty states
//! - `status`: Preview status bar
//! - `overlays`: Modal overlays (error, style picker, help)

mod utils;
mod layout;
mod listings;
mod status;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::{ListingsState, PreviewStatuses, UiState};

pub struct AppView;

impl AppView {
    pub fn render(
        frame: &mut Frame,
        ui_state: &UiState,
        listings: &ListingsState,
        previews: &PreviewStatuses,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Style filter + last fetch
                Constraint::Min(0),    // Listings
                Constraint::Length(3), // Selected preview status
            ])
            .split(frame.area());

        layout::render_top_bar(frame, chunks[0], listings);

        listings::render_listings(frame, chunks[1], ui_state, listings, previews);

        status::render_preview_bar(frame, chunks[2], listings, previews);

        // Error notification overlay (if there's an error)
        if ui_state.error_message.is_some() {
            overlays::render_error_notification(frame, ui_state);
        }

        // Style picker overlay (if open)
        if ui_state.show_style_picker {
            overlays::render_style_picker(frame, ui_state, &listings.filter);
        }

        // Help popup overlay (if open)
        if ui_state.show_help_popup {
            overlays::render_help_popup(frame);
        }
    }
}
