//! Voice module
//!
//! Speech synthesis through the external engine and on-disk caching of the
//! rendered audio.

mod cache;
mod tts;

pub use cache::{AudioCache, EvictionPolicy, URL_PREFIX, is_cache_file_name};
pub use tts::{
    ASSUMED_BYTES_PER_SAMPLE, ASSUMED_SAMPLE_RATE, QUERY_TIMEOUT, SYNTHESIS_TIMEOUT, SpeechAudio,
    SynthesisClient, estimate_duration_ms,
};
