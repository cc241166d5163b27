//! Watermark mixing
//!
//! The watermark is added on top of the preview at a fixed attenuation and
//! the sum is clamped to [-1, 1]. Both inputs must share a sample rate.

use super::buffer::PcmBuffer;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WatermarkMix {
    pub gain: f32,
    /// Overlay the watermark again every `repeat_frames` frames of preview
    pub repeat_frames: Option<usize>,
}

impl WatermarkMix {
    pub fn new(gain: f32) -> Self {
        Self {
            gain,
            repeat_frames: None,
        }
    }

    pub fn repeating_every(mut self, seconds: Option<f32>, sample_rate: u32) -> Self {
        self.repeat_frames = seconds
            .map(|s| (s as f64 * sample_rate as f64).round() as usize)
            .filter(|frames| *frames > 0);
        self
    }

    /// Mix `watermark` into `preview`.
    ///
    /// Output length is the longer of the two inputs; output channel count
    /// is the preview's. Watermark channels wrap when it has fewer.
    pub fn apply(&self, preview: &PcmBuffer, watermark: &PcmBuffer) -> PcmBuffer {
        debug_assert_eq!(preview.sample_rate, watermark.sample_rate);

        let preview_frames = preview.frames();
        let watermark_frames = watermark.frames();
        let out_frames = preview_frames.max(watermark_frames);
        let out_channels = preview.channel_count().max(1);

        let mut channels: Vec<Vec<f32>> = (0..out_channels)
            .map(|ch| {
                let mut samples = preview.channels.get(ch).cloned().unwrap_or_default();
                samples.resize(out_frames, 0.0);
                samples
            })
            .collect();

        if watermark.channel_count() > 0 && watermark_frames > 0 {
            for offset in self.overlay_offsets(preview_frames) {
                for (ch, out) in channels.iter_mut().enumerate() {
                    let mark = &watermark.channels[ch % watermark.channel_count()];
                    for (sample, &w) in out[offset..].iter_mut().zip(mark.iter()) {
                        *sample += self.gain * w;
                    }
                }
            }
        }

        for sample in channels.iter_mut().flatten() {
            *sample = sample.clamp(-1.0, 1.0);
        }

        PcmBuffer::new(preview.sample_rate, channels)
    }

    fn overlay_offsets(&self, preview_frames: usize) -> Vec<usize> {
        match self.repeat_frames {
            None => vec![0],
            Some(step) => (0..preview_frames.max(1)).step_by(step).collect(),
        }
    }
}
