//! Core type definitions for the application

use std::time::Instant;

use super::listing::StyleFilter;

/// UI state for the application
#[derive(Clone)]
pub struct UiState {
    pub style_options: Vec<StyleFilter>,
    pub currency: String,
    pub site_base_url: String,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    pub show_style_picker: bool,
    pub style_picker_selected: usize,
    pub show_help_popup: bool,
}

impl UiState {
    pub fn new(styles: &[String], currency: &str, site_base_url: &str) -> Self {
        Self {
            style_options: StyleFilter::options(styles),
            currency: currency.to_string(),
            site_base_url: site_base_url.to_string(),
            error_message: None,
            error_timestamp: None,
            show_style_picker: false,
            style_picker_selected: 0,
            show_help_popup: false,
        }
    }
}

impl Default for UiState {
    fn default() -> Self {
        let config = crate::config::AppConfig::default();
        Self::new(&config.catalog.styles, &config.catalog.currency, &config.site.base_url)
    }
}
