//! Transcoder Adapter - 下载格式转码

mod wav_transcoder;

pub use wav_transcoder::{encode_pcm16_wav, WavTranscoder};
