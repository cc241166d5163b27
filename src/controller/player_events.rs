//! Preview player event listener

use tokio::sync::mpsc::UnboundedReceiver;

use crate::audio::PlayerEvent;
use super::AppController;

impl AppController {
    pub fn start_player_event_listener(&self, mut events: UnboundedReceiver<PlayerEvent>) {
        let controller = self.clone();
        tracing::info!("Starting preview player event listener");

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if controller.handle_player_event(event).await {
                    break;
                }
            }
            tracing::debug!("Player event listener stopped");
        });
    }

    /// Mirror one player event into the model. Returns true once the app is quitting.
    pub(crate) async fn handle_player_event(&self, event: PlayerEvent) -> bool {
        let model = self.model.lock().await;

        if model.should_quit().await {
            tracing::debug!("Player event listener shutting down");
            return true;
        }

        match &event {
            PlayerEvent::Loading { listing_id } => {
                tracing::debug!(listing_id = %listing_id, "PlayerEvent::Loading");
            }
            PlayerEvent::Playing { listing_id, cursor } => {
                tracing::debug!(listing_id = %listing_id, duration_ms = cursor.duration_ms(), "PlayerEvent::Playing");
            }
            PlayerEvent::Stopped { listing_id } => {
                tracing::debug!(listing_id = %listing_id, "PlayerEvent::Stopped");
            }
            PlayerEvent::EndOfPreview { listing_id } => {
                tracing::debug!(listing_id = %listing_id, "PlayerEvent::EndOfPreview");
            }
            PlayerEvent::DecodeFailed { listing_id, error } => {
                tracing::warn!(listing_id = %listing_id, error = %error, "PlayerEvent::DecodeFailed");
                let title = model
                    .get_listings_state()
                    .await
                    .listings
                    .iter()
                    .find(|l| &l.id == listing_id)
                    .map(|l| l.title.clone())
                    .unwrap_or_else(|| listing_id.clone());
                model.set_error(Self::format_preview_error(&title, error)).await;
            }
        }

        model.apply_player_event(&event).await;
        false
    }
}
