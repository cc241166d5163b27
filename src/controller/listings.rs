//! Listing fetch and reload

use super::AppController;

impl AppController {
    /// Fetch the public listings and settle the list. A failed fetch is
    /// logged and settles with an empty set; nothing is surfaced to the user.
    pub async fn load_listings(&self) {
        {
            let model = self.model.lock().await;
            model.begin_listings_loading().await;
        }

        let listings = match self.store.fetch_public().await {
            Ok(listings) => {
                tracing::info!(count = listings.len(), "Public listings fetched");
                listings
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch public listings");
                Vec::new()
            }
        };

        let model = self.model.lock().await;
        model.finish_listings_loading(listings).await;
    }

    /// Stop every preview, drop the players and fetch again
    pub async fn reload_listings(&self) {
        tracing::info!("Reloading listings");
        self.stop_all_previews().await;
        self.players.lock().await.clear();
        self.load_listings().await;
    }
}

#[cfg(test)]
mod tests {
    use crate::audio::test_support::valid_assets;
    use crate::controller::tests::{FakeStore, controller};
    use crate::error::FetchError;
    use crate::model::StyleFilter;
    use crate::model::listing_fixture as listing;

    #[tokio::test]
    async fn store_failure_settles_empty_without_error() {
        let (controller, _sink, _rx) =
            controller(FakeStore::returning(Err(FetchError::from_status(503))), valid_assets());

        controller.load_listings().await;

        let model = controller.model.lock().await;
        let state = model.get_listings_state().await;
        assert!(!state.is_loading);
        assert!(state.display_set().is_empty());
        assert!(state.fetched_at.is_some());
        assert!(!model.has_error().await);
    }

    #[tokio::test]
    async fn fetched_listings_feed_the_filtered_view() {
        let listings = vec![listing("1", Some("Trap")), listing("2", Some("Drill")), listing("3", None)];
        let (controller, _sink, _rx) = controller(FakeStore::returning(Ok(listings)), valid_assets());

        controller.load_listings().await;

        let model = controller.model.lock().await;
        assert!(!model.is_loading_listings().await);
        assert_eq!(model.get_listings_state().await.display_set().len(), 3);

        model.set_style_filter(StyleFilter::Only("Trap".into())).await;
        let state = model.get_listings_state().await;
        let ids: Vec<&str> = state.display_set().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[tokio::test]
    async fn zero_public_listings_is_an_empty_settled_state() {
        let (controller, _sink, _rx) = controller(FakeStore::returning(Ok(Vec::new())), valid_assets());

        controller.load_listings().await;

        let model = controller.model.lock().await;
        let state = model.get_listings_state().await;
        assert!(!state.is_loading);
        assert!(state.listings.is_empty());
    }
}
