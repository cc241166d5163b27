//! Per-listing preview status as seen by the view

use std::collections::HashMap;
use std::sync::Arc;

use crate::audio::{PlaybackCursor, PlayerEvent, PlayerState};

#[derive(Clone, Debug, Default)]
pub struct PreviewStatus {
    pub state: PlayerState,
    pub cursor: Option<Arc<PlaybackCursor>>,
}

impl PreviewStatus {
    pub fn from_event(event: &PlayerEvent) -> Self {
        let cursor = match event {
            PlayerEvent::Playing { cursor, .. } => Some(cursor.clone()),
            _ => None,
        };
        Self {
            state: event.state(),
            cursor,
        }
    }

    pub fn progress_ms(&self) -> u32 {
        self.cursor.as_ref().map(|c| c.position_ms()).unwrap_or(0)
    }

    pub fn duration_ms(&self) -> u32 {
        self.cursor.as_ref().map(|c| c.duration_ms()).unwrap_or(0)
    }
}

/// Preview status keyed by listing id; absent means idle
pub type PreviewStatuses = HashMap<String, PreviewStatus>;
