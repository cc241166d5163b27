//! Planar PCM buffer shared by decoder, mixer and output

/// Decoded audio, one `Vec<f32>` per channel, samples in [-1, 1]
#[derive(Clone, Debug, PartialEq)]
pub struct PcmBuffer {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl PcmBuffer {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        Self { sample_rate, channels }
    }

    #[cfg(test)]
    pub fn silent(sample_rate: u32, channel_count: usize, frames: usize) -> Self {
        Self {
            sample_rate,
            channels: vec![vec![0.0; frames]; channel_count],
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Length in frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.channels.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn duration_ms(&self) -> u32 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frames() as u64 * 1000 / self.sample_rate as u64) as u32
    }

    /// Interleave into `out_channels` channels. Missing source channels
    /// repeat the source channels cyclically, so mono fans out to stereo.
    pub fn interleave(&self, out_channels: usize) -> Vec<f32> {
        let frames = self.frames();
        let src_channels = self.channel_count();
        if src_channels == 0 || out_channels == 0 {
            return Vec::new();
        }

        let mut interleaved = Vec::with_capacity(frames * out_channels);
        for frame in 0..frames {
            for ch in 0..out_channels {
                let sample = self.channels[ch % src_channels].get(frame).copied().unwrap_or(0.0);
                interleaved.push(sample);
            }
        }
        interleaved
    }
}
