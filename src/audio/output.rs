//! Audio output using cpal
//!
//! A finished mix is handed to the output as a whole. The device callback
//! reads it through a `PlaybackCursor`; stopping the cursor silences the
//! callback at once and lets the output thread release the device.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use tokio::sync::Notify;

use crate::error::OutputError;
use super::buffer::PcmBuffer;
use super::resample::resample;

const OUTPUT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Read position over an interleaved, immutable sample buffer
pub struct PlaybackCursor {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
    position: AtomicUsize,
    stopped: AtomicBool,
    finished: AtomicBool,
    ended: Notify,
}

impl PlaybackCursor {
    pub fn new(samples: Vec<f32>, channels: usize, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: channels.max(1),
            sample_rate,
            position: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            ended: Notify::new(),
        }
    }

    pub fn from_buffer(buffer: &PcmBuffer, channels: usize) -> Self {
        Self::new(buffer.interleave(channels), channels, buffer.sample_rate)
    }

    /// Write the next `out.len()` samples, silence once stopped or exhausted.
    pub fn fill<T: Copy>(&self, out: &mut [T], convert: impl Fn(f32) -> T) {
        let silence = convert(0.0);
        if self.stopped.load(Ordering::Acquire) {
            out.fill(silence);
            return;
        }

        let pos = self.position.load(Ordering::Acquire).min(self.samples.len());
        let n = out.len().min(self.samples.len() - pos);
        for (slot, &sample) in out[..n].iter_mut().zip(&self.samples[pos..pos + n]) {
            *slot = convert(sample);
        }
        out[n..].fill(silence);

        let new_pos = pos + n;
        self.position.store(new_pos, Ordering::Release);
        if new_pos >= self.samples.len() && !self.finished.swap(true, Ordering::AcqRel) {
            self.ended.notify_one();
        }
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub fn is_active(&self) -> bool {
        !self.is_stopped() && !self.is_finished()
    }

    pub fn position_ms(&self) -> u32 {
        let frames = self.position.load(Ordering::Acquire) / self.channels;
        self.frames_to_ms(frames)
    }

    pub fn duration_ms(&self) -> u32 {
        self.frames_to_ms(self.samples.len() / self.channels)
    }

    fn frames_to_ms(&self, frames: usize) -> u32 {
        if self.sample_rate == 0 {
            return 0;
        }
        (frames as u64 * 1000 / self.sample_rate as u64) as u32
    }

    /// Resolves once the last sample has been handed to the device.
    pub async fn ended(&self) {
        if self.is_finished() {
            return;
        }
        self.ended.notified().await;
    }
}

impl std::fmt::Debug for PlaybackCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackCursor")
            .field("position_ms", &self.position_ms())
            .field("duration_ms", &self.duration_ms())
            .field("stopped", &self.is_stopped())
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Destination for a finished mix
pub trait AudioSink: Send + Sync {
    fn start(&self, audio: PcmBuffer) -> Result<Arc<PlaybackCursor>, OutputError>;
}

/// Plays through the default cpal output device. Each `start` opens its
/// own stream on a dedicated thread, which owns the stream until the
/// cursor stops or runs out.
#[derive(Default)]
pub struct CpalSink;

impl CpalSink {
    pub fn new() -> Self {
        Self
    }

    fn open(audio: PcmBuffer) -> Result<(Stream, Arc<PlaybackCursor>), OutputError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(OutputError::NoDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| OutputError::Stream(e.to_string()))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        let audio = resample(audio, sample_rate);
        let cursor = Arc::new(PlaybackCursor::from_buffer(&audio, channels));

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(&device, &config.into(), cursor.clone())?,
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(&device, &config.into(), cursor.clone())?,
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(&device, &config.into(), cursor.clone())?,
            format => return Err(OutputError::UnsupportedFormat(format!("{:?}", format))),
        };
        stream.play().map_err(|e| OutputError::Stream(e.to_string()))?;

        tracing::debug!(sample_rate, channels, duration_ms = cursor.duration_ms(), "Output stream started");
        Ok((stream, cursor))
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &cpal::Device,
        config: &StreamConfig,
        cursor: Arc<PlaybackCursor>,
    ) -> Result<Stream, OutputError> {
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    cursor.fill(data, |s| T::from_sample(s));
                },
                move |err| {
                    tracing::error!(error = %err, "Audio output error");
                },
                None,
            )
            .map_err(|e| OutputError::Stream(e.to_string()))
    }
}

impl AudioSink for CpalSink {
    fn start(&self, audio: PcmBuffer) -> Result<Arc<PlaybackCursor>, OutputError> {
        let (ready_tx, ready_rx) = mpsc::channel();

        thread::Builder::new()
            .name("preview-output".to_string())
            .spawn(move || {
                let (stream, cursor) = match Self::open(audio) {
                    Ok(opened) => opened,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(cursor.clone()));

                while cursor.is_active() {
                    thread::sleep(OUTPUT_POLL_INTERVAL);
                }
                drop(stream);
                tracing::debug!("Output stream released");
            })
            .map_err(|e| OutputError::Stream(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|_| OutputError::Stream("output thread exited".to_string()))?
    }
}
