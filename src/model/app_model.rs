//! Main application model with state management

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::audio::PlayerEvent;
use super::listing::{Listing, StyleFilter};
use super::listings::ListingsState;
use super::playback::{PreviewStatus, PreviewStatuses};
use super::types::UiState;

/// Main application model containing all state
pub struct AppModel {
    pub ui_state: Arc<Mutex<UiState>>,
    pub listings: Arc<Mutex<ListingsState>>,
    previews: Arc<Mutex<PreviewStatuses>>,
    pub should_quit: Arc<Mutex<bool>>,
}

impl AppModel {
    pub fn new(ui_state: UiState) -> Self {
        Self {
            ui_state: Arc::new(Mutex::new(ui_state)),
            listings: Arc::new(Mutex::new(ListingsState::default())),
            previews: Arc::new(Mutex::new(PreviewStatuses::new())),
            should_quit: Arc::new(Mutex::new(false)),
        }
    }

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self, quit: bool) {
        *self.should_quit.lock().await = quit;
    }

    pub async fn get_ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    // ========================================================================
    // Listings
    // ========================================================================

    pub async fn get_listings_state(&self) -> ListingsState {
        self.listings.lock().await.clone()
    }

    pub async fn begin_listings_loading(&self) {
        self.listings.lock().await.begin_loading();
    }

    pub async fn finish_listings_loading(&self, listings: Vec<Listing>) {
        self.listings.lock().await.finish_loading(listings);
    }

    pub async fn is_loading_listings(&self) -> bool {
        self.listings.lock().await.is_loading
    }

    pub async fn listing_move_up(&self) {
        self.listings.lock().await.move_up();
    }

    pub async fn listing_move_down(&self) {
        self.listings.lock().await.move_down();
    }

    pub async fn get_selected_listing(&self) -> Option<Listing> {
        self.listings.lock().await.selected_listing().cloned()
    }

    pub async fn get_style_filter(&self) -> StyleFilter {
        self.listings.lock().await.filter.clone()
    }

    pub async fn set_style_filter(&self, filter: StyleFilter) {
        self.listings.lock().await.set_filter(filter);
    }

    /// Step through the configured styles, wrapping at both ends
    pub async fn cycle_style_filter(&self, forward: bool) {
        let options = self.ui_state.lock().await.style_options.clone();
        if options.is_empty() {
            return;
        }
        let mut listings = self.listings.lock().await;
        let current = options.iter().position(|f| *f == listings.filter).unwrap_or(0);
        let next = if forward {
            (current + 1) % options.len()
        } else {
            (current + options.len() - 1) % options.len()
        };
        listings.set_filter(options[next].clone());
    }

    // ========================================================================
    // Preview players
    // ========================================================================

    pub async fn get_preview_statuses(&self) -> PreviewStatuses {
        self.previews.lock().await.clone()
    }

    pub async fn get_preview_status(&self, listing_id: &str) -> PreviewStatus {
        self.previews
            .lock()
            .await
            .get(listing_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn apply_player_event(&self, event: &PlayerEvent) {
        let status = PreviewStatus::from_event(event);
        let mut previews = self.previews.lock().await;
        if status.state == crate::audio::PlayerState::Idle {
            previews.remove(event.listing_id());
        } else {
            previews.insert(event.listing_id().to_string(), status);
        }
    }

    pub async fn clear_preview_statuses(&self) {
        self.previews.lock().await.clear();
    }

    // ========================================================================
    // Overlays
    // ========================================================================

    pub async fn set_error(&self, message: String) {
        let mut state = self.ui_state.lock().await;
        state.error_message = Some(message);
        state.error_timestamp = Some(Instant::now());
    }

    pub async fn clear_error(&self) {
        let mut state = self.ui_state.lock().await;
        state.error_message = None;
        state.error_timestamp = None;
    }

    pub async fn has_error(&self) -> bool {
        self.ui_state.lock().await.error_message.is_some()
    }

    pub async fn auto_clear_old_errors(&self) {
        let mut state = self.ui_state.lock().await;
        if let Some(timestamp) = state.error_timestamp {
            if timestamp.elapsed().as_secs() > 5 {
                state.error_message = None;
                state.error_timestamp = None;
            }
        }
    }

    pub async fn show_style_picker(&self) {
        let filter = self.get_style_filter().await;
        let mut state = self.ui_state.lock().await;
        state.style_picker_selected = state
            .style_options
            .iter()
            .position(|f| *f == filter)
            .unwrap_or(0);
        state.show_style_picker = true;
    }

    pub async fn hide_style_picker(&self) {
        self.ui_state.lock().await.show_style_picker = false;
    }

    pub async fn is_style_picker_open(&self) -> bool {
        self.ui_state.lock().await.show_style_picker
    }

    pub async fn style_picker_move_up(&self) {
        let mut state = self.ui_state.lock().await;
        if state.style_picker_selected > 0 {
            state.style_picker_selected -= 1;
        }
    }

    pub async fn style_picker_move_down(&self) {
        let mut state = self.ui_state.lock().await;
        if state.style_picker_selected < state.style_options.len().saturating_sub(1) {
            state.style_picker_selected += 1;
        }
    }

    /// Apply the highlighted picker entry and close the picker
    pub async fn confirm_style_picker(&self) {
        let selected = {
            let mut state = self.ui_state.lock().await;
            state.show_style_picker = false;
            state.style_options.get(state.style_picker_selected).cloned()
        };
        if let Some(filter) = selected {
            self.set_style_filter(filter).await;
        }
    }

    pub async fn show_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = true;
    }

    pub async fn hide_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = false;
    }

    pub async fn is_help_popup_open(&self) -> bool {
        self.ui_state.lock().await.show_help_popup
    }
}
