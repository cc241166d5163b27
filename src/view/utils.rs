//! Utility functions for rendering UI components

use ratatui::layout::Rect;

pub fn format_duration(ms: u32) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}

/// Price as stored, followed by the currency symbol ("30 €", "29.99 €")
pub fn format_price(price: f64, currency: &str) -> String {
    format!("{} {}", price, currency)
}

/// Calculate width needed for index column (log10(n) + padding)
pub fn calculate_num_width(item_count: usize) -> usize {
    if item_count == 0 {
        2
    } else {
        let digits = (item_count as f64).log10().floor() as usize + 1;
        digits + 1
    }
}

pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() > max_width {
        let truncated: String = s.chars().take(max_width.saturating_sub(3)).collect();
        format!("{:<width$}", format!("{}...", truncated), width = max_width)
    } else {
        format!("{:<width$}", s, width = max_width)
    }
}

/// Calculate column widths for listing rows
/// Returns (num_width, title_width, style_width, price_width)
pub fn calculate_listing_column_widths(content_width: usize, item_count: usize) -> (usize, usize, usize, usize) {
    // Format: "{state}{num}   {title}   {style}   {price}"
    let num_width = calculate_num_width(item_count);
    let price_width = 12;
    let fixed_width = 1 + num_width + 3 + 3 + 3 + price_width;
    let remaining_width = content_width.saturating_sub(fixed_width);
    let title_width = (remaining_width * 65) / 100;
    let style_width = remaining_width.saturating_sub(title_width);

    (num_width, title_width, style_width, price_width)
}

/// Centered popup rectangle, clamped to the frame
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}
