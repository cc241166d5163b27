//! Whole-buffer sample rate conversion with rubato

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use super::buffer::PcmBuffer;

/// Input frames handed to the resampler per call
const CHUNK_FRAMES: usize = 1024;

/// Convert `buffer` to `target_rate`.
///
/// The output holds exactly `round(frames * ratio)` frames aligned with the
/// input: the resampler's delay is skipped and its tail flushed. Buffers
/// already at the target rate, or without samples, are returned unchanged.
/// A failing resampler falls back to the original buffer.
pub fn resample(buffer: PcmBuffer, target_rate: u32) -> PcmBuffer {
    if buffer.sample_rate == target_rate || buffer.is_empty() || target_rate == 0 {
        return buffer;
    }

    let frames = buffer.frames();
    let ratio = target_rate as f64 / buffer.sample_rate as f64;

    match run_sinc(&buffer.channels, ratio) {
        Ok(channels) => {
            tracing::debug!(
                from = buffer.sample_rate,
                to = target_rate,
                frames_in = frames,
                frames_out = channels.first().map(Vec::len).unwrap_or(0),
                "Resampled buffer"
            );
            PcmBuffer::new(target_rate, channels)
        }
        Err(e) => {
            tracing::warn!(from = buffer.sample_rate, to = target_rate, error = %e, "Resampling failed, keeping source rate");
            buffer
        }
    }
}

fn run_sinc(input: &[Vec<f32>], ratio: f64) -> Result<Vec<Vec<f32>>, String> {
    let frames = input.iter().map(Vec::len).min().unwrap_or(0);
    let expected = (frames as f64 * ratio).round() as usize;
    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_FRAMES, input.len())
        .map_err(|e| e.to_string())?;
    let delay = resampler.output_delay();
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay); input.len()];

    let mut pos = 0;
    while pos + CHUNK_FRAMES <= frames {
        let chunk: Vec<&[f32]> = input.iter().map(|c| &c[pos..pos + CHUNK_FRAMES]).collect();
        let processed = resampler.process(&chunk, None).map_err(|e| e.to_string())?;
        append(&mut output, processed);
        pos += CHUNK_FRAMES;
    }
    if pos < frames {
        let rest: Vec<&[f32]> = input.iter().map(|c| &c[pos..frames]).collect();
        let processed = resampler
            .process_partial(Some(rest.as_slice()), None)
            .map_err(|e| e.to_string())?;
        append(&mut output, processed);
    }

    // Flush the delay line until the aligned output is complete
    while output.first().map(Vec::len).unwrap_or(0) < delay + expected {
        let processed = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| e.to_string())?;
        if processed.first().map(Vec::is_empty).unwrap_or(true) {
            break;
        }
        append(&mut output, processed);
    }

    for channel in &mut output {
        channel.drain(..delay.min(channel.len()));
        channel.resize(expected, 0.0);
    }
    Ok(output)
}

fn append(output: &mut [Vec<f32>], processed: Vec<Vec<f32>>) {
    for (out, chunk) in output.iter_mut().zip(processed) {
        out.extend(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_is_untouched() {
        let buffer = PcmBuffer::new(48_000, vec![vec![0.25; 64]]);
        assert_eq!(resample(buffer.clone(), 48_000), buffer);
    }

    #[test]
    fn converts_to_target_rate() {
        let buffer = PcmBuffer::new(22_050, vec![vec![0.1; 2_205], vec![-0.1; 2_205]]);
        let out = resample(buffer, 44_100);
        assert_eq!(out.sample_rate, 44_100);
        assert_eq!(out.channel_count(), 2);
        assert_eq!(out.frames(), 4_410);
    }

    #[test]
    fn downsampling_keeps_exact_length_and_level() {
        // not a multiple of the chunk size, so the partial path and the flush both run
        let buffer = PcmBuffer::new(16_000, vec![vec![0.5; 3_200], vec![0.5; 3_200]]);
        let out = resample(buffer, 8_000);
        assert_eq!(out.frames(), 1_600);
        assert_eq!(out.duration_ms(), 200);

        // a constant signal stays constant away from the edges, so nothing is shifted in
        let left = &out.channels[0];
        assert!(left[100..1_500].iter().all(|s| (s - 0.5).abs() < 0.05), "{:?}", &left[100..110]);
        assert!(left[1_590].abs() > 0.1);
    }

    #[test]
    fn odd_ratio_rounds_to_nearest_frame() {
        let buffer = PcmBuffer::new(44_100, vec![vec![0.0; 1_000]]);
        let out = resample(buffer, 48_000);
        assert_eq!(out.frames(), 1_088);
    }
}
