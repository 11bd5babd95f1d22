//! Audio decoding using Symphonia
//!
//! Decodes any container/codec enabled in the symphonia build (mp3, wav,
//! flac, ogg/vorbis, ...) into a mono [`AudioBuffer`] at the source rate.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::AudioBuffer;
use crate::error::PipelineError;
use crate::preprocessing::channel_mixer::downmix_interleaved;

/// Decode an audio file to mono PCM samples
///
/// Multi-channel sources are averaged to one channel. Packets that fail to
/// decode are skipped with a warning; container-level errors abort.
///
/// # Errors
///
/// Returns `PipelineError` if the file cannot be opened or probed, holds no
/// audio track, or the decoder fails unrecoverably.
pub fn decode_audio<P: AsRef<Path>>(path: P) -> Result<AudioBuffer, PipelineError> {
    let path = path.as_ref();
    log::debug!("Decoding audio file: {}", path.display());

    let src = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PipelineError::decode(path, e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PipelineError::NoAudioTrack(path.to_path_buf()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PipelineError::decode(path, e))?;

    let mut mono: Vec<f32> = Vec::new();
    let mut interleaved: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(PipelineError::decode(path, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate.get_or_insert(spec.rate);

                let needed = decoded.capacity() * spec.channels.count();
                if interleaved.as_ref().map_or(true, |b| b.capacity() < needed) {
                    interleaved = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
                }
                if let Some(buf) = interleaved.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    mono.extend(downmix_interleaved(buf.samples(), spec.channels.count()));
                }
            }
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Decode error in {}: {}. Skipping packet.", path.display(), e);
            }
            Err(e) => return Err(PipelineError::decode(path, e)),
        }
    }

    let sample_rate = sample_rate.ok_or_else(|| {
        PipelineError::InvalidInput(format!("No sample rate reported for {}", path.display()))
    })?;

    log::debug!(
        "Decoded {}: {} samples at {} Hz",
        path.display(),
        mono.len(),
        sample_rate
    );

    Ok(AudioBuffer::new(mono, sample_rate))
}
