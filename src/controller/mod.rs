//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that handles user input,
//! coordinates between the model and view, and drives the listing fetch and
//! the per-row preview players. It is organized into submodules by
//! responsibility:
//!
//! - `input`: Key event handling
//! - `listings`: Listing fetch and reload
//! - `playback`: Preview player control methods
//! - `player_events`: Preview player event listener

mod input;
mod listings;
mod playback;
mod player_events;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::audio::{PlayerContext, PreviewPlayer};
use crate::model::{AppModel, ListingStore};

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<Mutex<AppModel>>,
    pub(crate) store: Arc<dyn ListingStore>,
    pub(crate) player_ctx: PlayerContext,
    /// One player per listing row, created on first play
    pub(crate) players: Arc<Mutex<HashMap<String, PreviewPlayer>>>,
}

impl AppController {
    pub fn new(
        model: Arc<Mutex<AppModel>>,
        store: Arc<dyn ListingStore>,
        player_ctx: PlayerContext,
    ) -> Self {
        Self {
            model,
            store,
            player_ctx,
            players: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub(crate) fn format_preview_error(title: &str, error: &str) -> String {
        if error.contains("did not load in time") {
            format!("Preview of \"{}\" took too long to load.", title)
        } else if error.contains("no audio output device") {
            "No audio output device available.".to_string()
        } else {
            format!("Could not play \"{}\": {}", title, error)
        }
    }
}
