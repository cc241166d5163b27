//! Fetched listings, the active style filter and the list cursor

use chrono::{DateTime, Local};

use super::listing::{Listing, StyleFilter, filter_listings};

#[derive(Clone, Debug)]
pub struct ListingsState {
    /// Full fetched set; the display set is always derived from it
    pub listings: Vec<Listing>,
    pub is_loading: bool,
    pub fetched_at: Option<DateTime<Local>>,
    pub filter: StyleFilter,
    pub selected: usize,
}

impl Default for ListingsState {
    fn default() -> Self {
        Self {
            listings: Vec::new(),
            is_loading: true,
            fetched_at: None,
            filter: StyleFilter::All,
            selected: 0,
        }
    }
}

impl ListingsState {
    pub fn display_set(&self) -> Vec<&Listing> {
        filter_listings(&self.listings, &self.filter)
    }

    pub fn selected_listing(&self) -> Option<&Listing> {
        self.display_set().get(self.selected).copied()
    }

    pub fn begin_loading(&mut self) {
        self.is_loading = true;
    }

    /// Settle a fetch. A failed fetch settles with an empty set.
    pub fn finish_loading(&mut self, listings: Vec<Listing>) {
        self.listings = listings;
        self.is_loading = false;
        self.fetched_at = Some(Local::now());
        self.clamp_selection();
    }

    pub fn set_filter(&mut self, filter: StyleFilter) {
        if self.filter != filter {
            self.filter = filter;
            self.selected = 0;
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let len = self.display_set().len();
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.display_set().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}
