//! Audio preprocessing modules
//!
//! This module contains the per-buffer transforms of the pipeline:
//! - Silence detection and trimming
//! - RMS loudness normalization
//! - Channel mixing (multi-channel to mono)
//! - Resampling (used by the in-process transcoder)

pub mod channel_mixer;
pub mod normalization;
pub mod resample;
pub mod silence;
