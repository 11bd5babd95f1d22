//! Audio I/O modules
//!
//! WAV reading/writing with hound, general decoding with Symphonia, and the
//! in-memory sample buffer passed between them.

pub mod decoder;
pub mod sample_buffer;
pub mod wav;

pub use decoder::decode_audio;
pub use sample_buffer::AudioBuffer;
pub use wav::{ensure_parent_dir, load_wav, save_wav, WavEncoding};
