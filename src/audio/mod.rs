//! Audio module - preview fetching, decoding, watermark mixing and output
//!
//! - `buffer`: planar PCM buffer
//! - `fetch`: HTTP download of audio assets
//! - `decoder`: Symphonia decoding of fetched bytes
//! - `resample`: sample rate conversion
//! - `mix`: watermark mixing
//! - `output`: cpal output and the playback cursor
//! - `player`: per-listing preview player state machine

mod buffer;
mod decoder;
mod fetch;
mod mix;
mod output;
mod player;
mod resample;

pub use fetch::HttpAssetFetcher;
pub use output::{CpalSink, PlaybackCursor};
pub use player::{PlayerContext, PlayerEvent, PlayerState, PreviewPlayer};

#[cfg(test)]
pub(crate) use player::tests as test_support;
