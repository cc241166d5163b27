//! Audio asset download

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Url;

use crate::error::DecodeError;

/// Fetches raw audio asset bytes by URL
pub trait AssetFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, DecodeError>>;
}

pub struct HttpAssetFetcher {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl HttpAssetFetcher {
    /// `site_base_url` resolves relative asset paths such as `/watermark.mp3`.
    pub fn new(site_base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = match Url::parse(site_base_url) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(site_base_url, error = %e, "Invalid site base URL, relative assets will fail");
                None
            }
        };
        Ok(Self { client, base_url })
    }

    fn resolve(&self, url: &str) -> Result<Url, DecodeError> {
        resolve_asset_url(self.base_url.as_ref(), url)
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, DecodeError> {
        let resolved = self.resolve(url)?;
        tracing::debug!(url = %resolved, "Fetching audio asset");

        let fetch_err = |e: reqwest::Error| DecodeError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(resolved).send().await.map_err(fetch_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DecodeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(fetch_err)?;
        Ok(bytes.to_vec())
    }
}

impl AssetFetcher for HttpAssetFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, DecodeError>> {
        Box::pin(self.get(url))
    }
}

pub fn resolve_asset_url(base: Option<&Url>, url: &str) -> Result<Url, DecodeError> {
    let parsed = match base {
        Some(base) => base.join(url),
        None => Url::parse(url),
    };
    parsed.map_err(|e| DecodeError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
