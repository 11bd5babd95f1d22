//! Channel mixing utilities (multi-channel to mono conversion)

/// Average interleaved multi-channel samples down to one channel
///
/// # Arguments
///
/// * `samples` - Interleaved samples (`L R L R ...` for stereo)
/// * `channels` - Number of interleaved channels
///
/// # Returns
///
/// Mono samples, one per frame. A trailing partial frame is averaged over
/// the channels it has. Mono input (or `channels == 0`) is returned as-is.
pub fn downmix_interleaved(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}
