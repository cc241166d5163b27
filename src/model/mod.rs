//! Model module - Application state and data types
//!
//! - `types`: UI state
//! - `listing`: listing records and the style filter
//! - `listings`: fetched set, active filter and list cursor
//! - `playback`: per-listing preview status
//! - `store`: remote listing store client
//! - `app_model`: main application model with state management methods

mod types;
mod listing;
mod listings;
mod playback;
mod store;
mod app_model;

pub use types::UiState;

pub use listing::{Listing, StyleFilter, site_link};

pub use listings::ListingsState;

pub use playback::{PreviewStatus, PreviewStatuses};

pub use store::{FirestoreStore, ListingStore};

pub use app_model::AppModel;

#[cfg(test)]
pub(crate) use listing::tests::listing as listing_fixture;
