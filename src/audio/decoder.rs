//! In-memory audio decoding with Symphonia
//!
//! Fetched asset bytes are probed, the first audio track is decoded in full
//! and returned as planar f32.

use std::io::Cursor;

use symphonia::core::audio::{AudioBufferRef, AudioPlanes};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

use crate::error::DecodeError;
use super::buffer::PcmBuffer;

/// Decode a complete audio asset. `url` is only used for the format hint
/// and for error reporting.
pub fn decode_audio(bytes: Vec<u8>, url: &str) -> Result<PcmBuffer, DecodeError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension_of(url) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DecodeError::Unsupported {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::NoAudioTrack { url: url.to_string() })?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Unsupported {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let mut channels: Vec<Vec<f32>> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => {
                return Err(DecodeError::Codec {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if sample_rate.is_none() {
                    sample_rate = Some(decoded.spec().rate);
                }
                append_decoded(&mut channels, &decoded);
            }
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!(url, error = %e, "Skipping undecodable packet");
            }
            Err(e) => {
                return Err(DecodeError::Codec {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let buffer = PcmBuffer::new(sample_rate.unwrap_or(44_100), channels);
    if buffer.is_empty() {
        return Err(DecodeError::Empty { url: url.to_string() });
    }

    tracing::debug!(
        url,
        sample_rate = buffer.sample_rate,
        channels = buffer.channel_count(),
        frames = buffer.frames(),
        "Decoded audio asset"
    );
    Ok(buffer)
}

fn extension_of(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    let file = path.rsplit('/').next()?;
    file.rsplit_once('.').map(|(_, ext)| ext).filter(|ext| !ext.is_empty())
}

fn append_decoded(channels: &mut Vec<Vec<f32>>, buf: &AudioBufferRef) {
    match buf {
        AudioBufferRef::F32(b) => append_planes(channels, b.planes(), |s: f32| s),
        AudioBufferRef::F64(b) => append_planes(channels, b.planes(), |s: f64| s as f32),
        AudioBufferRef::S8(b) => append_planes(channels, b.planes(), |s: i8| s as f32 / 128.0),
        AudioBufferRef::S16(b) => append_planes(channels, b.planes(), |s: i16| s as f32 / 32768.0),
        AudioBufferRef::S24(b) => {
            append_planes(channels, b.planes(), |s| s.inner() as f32 / 8388608.0)
        }
        AudioBufferRef::S32(b) => {
            append_planes(channels, b.planes(), |s: i32| (s as f64 / 2147483648.0) as f32)
        }
        AudioBufferRef::U8(b) => {
            append_planes(channels, b.planes(), |s: u8| (s as f32 - 128.0) / 128.0)
        }
        AudioBufferRef::U16(b) => {
            append_planes(channels, b.planes(), |s: u16| (s as f32 - 32768.0) / 32768.0)
        }
        AudioBufferRef::U24(b) => {
            append_planes(channels, b.planes(), |s| (s.inner() as f32 - 8388608.0) / 8388608.0)
        }
        AudioBufferRef::U32(b) => {
            append_planes(channels, b.planes(), |s: u32| ((s as f64 - 2147483648.0) / 2147483648.0) as f32)
        }
    }
}

fn append_planes<T: Sample + Copy, F: Fn(T) -> f32>(
    channels: &mut Vec<Vec<f32>>,
    planes: AudioPlanes<T>,
    convert: F,
) {
    let planes = planes.planes();
    if channels.is_empty() {
        channels.resize_with(planes.len(), Vec::new);
    }
    for (out, plane) in channels.iter_mut().zip(planes.iter()) {
        out.extend(plane.iter().map(|&s| convert(s)));
    }
}
