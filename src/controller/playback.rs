//! Preview player control methods

use crate::audio::{PlayerState, PreviewPlayer};
use crate::model::Listing;

use super::AppController;

impl AppController {
    /// Play the selected row's preview, or stop it if it is loading or playing
    pub async fn toggle_selected_preview(&self) {
        let selected = {
            let model = self.model.lock().await;
            model.get_selected_listing().await
        };
        let Some(listing) = selected else {
            tracing::debug!("No listing selected");
            return;
        };
        self.toggle_preview(&listing).await;
    }

    pub async fn toggle_preview(&self, listing: &Listing) {
        let mut players = self.players.lock().await;
        let player = players.entry(listing.id.clone()).or_insert_with(|| {
            PreviewPlayer::new(
                listing.id.clone(),
                listing.preview_url.clone(),
                self.player_ctx.clone(),
            )
        });

        match player.state() {
            PlayerState::Idle => {
                tracing::info!(listing_id = %listing.id, title = %listing.title, "Starting preview");
                player.play();
            }
            PlayerState::Loading | PlayerState::Playing => {
                tracing::info!(listing_id = %listing.id, "Stopping preview");
                player.stop();
            }
        }
    }

    pub async fn stop_all_previews(&self) {
        let players = self.players.lock().await;
        let active = players
            .values()
            .filter(|p| p.state() != PlayerState::Idle)
            .count();
        tracing::debug!(active, "Stopping all previews");
        for player in players.values() {
            player.stop();
        }
    }

    /// Tear down every player. Called once on exit.
    pub async fn shutdown(&self) {
        self.stop_all_previews().await;
        self.players.lock().await.clear();
        let model = self.model.lock().await;
        model.clear_preview_statuses().await;
        tracing::info!("Preview players shut down");
    }
}
