//! Listing records and the style filter

use crate::config::ALL_STYLES;

/// A public beat listing as displayed in the storefront
#[derive(Clone, Debug, PartialEq)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub style: Option<String>,
    pub price: f64,
    pub owner_id: String,
    pub preview_url: String,
    pub is_public: bool,
}

impl Listing {
    /// Path of the beatmaker's storefront page
    pub fn storefront_path(&self) -> String {
        format!("/beatmaker/{}", self.owner_id)
    }

    /// Path of this listing's detail page
    pub fn detail_path(&self) -> String {
        format!("/beat/{}", self.id)
    }

    pub fn display_style(&self) -> &str {
        self.style.as_deref().unwrap_or("-")
    }
}

/// Join a site-relative path onto the configured site base URL
pub fn site_link(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Currently selected style filter
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum StyleFilter {
    #[default]
    All,
    Only(String),
}

impl StyleFilter {
    pub fn matches(&self, listing: &Listing) -> bool {
        match self {
            StyleFilter::All => true,
            StyleFilter::Only(style) => listing.style.as_deref() == Some(style.as_str()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StyleFilter::All => "All styles",
            StyleFilter::Only(style) => style,
        }
    }

    /// Every selectable filter for a catalog: "all" first, then each style
    pub fn options(styles: &[String]) -> Vec<StyleFilter> {
        std::iter::once(StyleFilter::All)
            .chain(styles.iter().cloned().map(StyleFilter::Only))
            .collect()
    }

    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case(ALL_STYLES) {
            StyleFilter::All
        } else {
            StyleFilter::Only(value.to_string())
        }
    }
}

/// Derive the display set from the full fetched set.
pub fn filter_listings<'a>(listings: &'a [Listing], filter: &StyleFilter) -> Vec<&'a Listing> {
    listings.iter().filter(|l| filter.matches(l)).collect()
}
