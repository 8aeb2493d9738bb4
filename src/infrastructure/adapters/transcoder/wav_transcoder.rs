//! WAV Transcoder - 下载格式转换
//!
//! - WAV 头解析（时长、采样率）
//! - WAV 原样返回
//! - WAV → Opus (OGG 容器)
//! - WAV → MP3 (LAME)，默认的压缩下载格式

use async_trait::async_trait;
use mp3lame_encoder::{Bitrate, Builder as Mp3Builder, FlushNoGap, MonoPcm, Quality};
use ogg::writing::{PacketWriteEndInfo, PacketWriter};
use opus::{Application, Channels, Encoder};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{
    AudioFormat, AudioInfo, AudioTranscoderPort, TranscodeConfig, TranscodeError, TranscodeResult,
};

/// OGG 中 Opus 的 granule position 固定按 48kHz 计
const OPUS_GRANULE_RATE: f64 = 48000.0;
/// 每帧 20ms
const OPUS_FRAME_MS: usize = 20;
/// 单个 Opus 包的最大字节数
const OPUS_MAX_PACKET: usize = 4000;
const DEFAULT_BITRATE: u32 = 32000;

/// 把 16 位 PCM 样本封装成 WAV
pub fn encode_pcm16_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let block_align = channels * 2;
    let byte_rate = sample_rate * block_align as u32;
    let data_size = samples.len() * 2;

    let mut wav = Vec::with_capacity(44 + data_size);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&((36 + data_size) as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_size as u32).to_le_bytes());
    for sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }

    wav
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// WAV 转码器
#[derive(Debug, Clone, Default)]
pub struct WavTranscoder;

impl WavTranscoder {
    pub fn new() -> Self {
        Self
    }

    /// 用 symphonia 解码为交错 f32 样本
    fn decode(&self, data: &[u8]) -> Result<DecodedAudio, TranscodeError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(data.to_vec())), Default::default());
        let mut hint = Hint::new();
        hint.with_extension("wav");

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| TranscodeError::DecodingError(format!("Probe failed: {}", e)))?;
        let mut reader = probed.format;

        let track = reader
            .default_track()
            .ok_or_else(|| TranscodeError::DecodingError("No audio track found".to_string()))?;
        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| TranscodeError::DecodingError("Unknown sample rate".to_string()))?;
        let channels = track
            .codec_params
            .channels
            .map(|c| c.count())
            .filter(|&c| c > 0)
            .ok_or_else(|| TranscodeError::DecodingError("Unknown channel count".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| TranscodeError::DecodingError(format!("Decoder creation failed: {}", e)))?;

        let mut samples = Vec::new();
        loop {
            let packet = match reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(e) => {
                    return Err(TranscodeError::DecodingError(format!(
                        "Packet read error: {}",
                        e
                    )))
                }
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping undecodable packet");
                    continue;
                }
            };

            let spec = *decoded.spec();
            let frames = decoded.frames();
            let mut buf = SampleBuffer::<f32>::new(frames as u64, spec);
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(&buf.samples()[..frames * spec.channels.count()]);
        }

        Ok(DecodedAudio {
            samples,
            sample_rate,
            channels,
        })
    }

    /// 编码为 Opus 并写入 OGG 容器 (RFC 7845)
    fn encode_opus(&self, pcm: &DecodedAudio, bitrate: u32) -> Result<Vec<u8>, TranscodeError> {
        let encoding = |e: String| TranscodeError::EncodingError(e);

        // Opus 只接受单声道或立体声，多声道先下混成立体声
        let (channel_count, opus_channels) = if pcm.channels == 1 {
            (1usize, Channels::Mono)
        } else {
            (2usize, Channels::Stereo)
        };
        let interleaved = downmix(&pcm.samples, pcm.channels, channel_count);

        let sample_rate = opus_sample_rate(pcm.sample_rate);
        let samples = resample(&interleaved, pcm.sample_rate, sample_rate, channel_count);
        let pcm_i16: Vec<i16> = samples.iter().copied().map(to_i16).collect();

        let mut encoder = Encoder::new(sample_rate, opus_channels, Application::Voip)
            .map_err(|e| encoding(format!("Failed to create Opus encoder: {}", e)))?;
        encoder
            .set_bitrate(opus::Bitrate::Bits(bitrate as i32))
            .map_err(|e| encoding(format!("Failed to set bitrate: {}", e)))?;
        let pre_skip = encoder.get_lookahead().map(|l| l as u16).unwrap_or(312);

        let frame_size = sample_rate as usize * OPUS_FRAME_MS / 1000;
        let samples_per_frame = frame_size * channel_count;
        let granule_scale = OPUS_GRANULE_RATE / sample_rate as f64;
        let frame_granule = (frame_size as f64 * granule_scale) as u64;
        let mut granule_pos = (pre_skip as f64 * granule_scale) as u64;

        // 音频帧 + 冲刷编码器延迟的静音帧
        let mut frames: Vec<Vec<i16>> = pcm_i16
            .chunks(samples_per_frame)
            .map(|chunk| {
                let mut frame = chunk.to_vec();
                frame.resize(samples_per_frame, 0);
                frame
            })
            .collect();
        let flush_frames = (pre_skip as usize + samples_per_frame - 1) / samples_per_frame;
        frames.extend((0..flush_frames.max(1)).map(|_| vec![0i16; samples_per_frame]));

        let mut ogg_data = Vec::new();
        {
            let mut writer = PacketWriter::new(&mut ogg_data);
            writer
                .write_packet(
                    opus_head(channel_count as u8, sample_rate, pre_skip),
                    0,
                    PacketWriteEndInfo::EndPage,
                    0,
                )
                .map_err(|e| encoding(format!("Failed to write Opus head: {}", e)))?;
            writer
                .write_packet(opus_tags(), 0, PacketWriteEndInfo::EndPage, 0)
                .map_err(|e| encoding(format!("Failed to write Opus tags: {}", e)))?;

            let mut packet = vec![0u8; OPUS_MAX_PACKET];
            let last = frames.len() - 1;
            for (idx, frame) in frames.iter().enumerate() {
                let len = encoder
                    .encode(frame, &mut packet)
                    .map_err(|e| encoding(format!("Opus encode failed: {}", e)))?;
                granule_pos += frame_granule;

                let end_info = if idx == last {
                    PacketWriteEndInfo::EndStream
                } else {
                    PacketWriteEndInfo::NormalPacket
                };
                writer
                    .write_packet(packet[..len].to_vec(), 0, end_info, granule_pos)
                    .map_err(|e| encoding(format!("Failed to write Opus packet: {}", e)))?;
            }
        }

        Ok(ogg_data)
    }

    /// 编码为单声道 MP3，采样率转换交给 LAME
    fn encode_mp3(&self, pcm: &DecodedAudio, bitrate: u32) -> Result<Vec<u8>, TranscodeError> {
        let encoding = |e: String| TranscodeError::EncodingError(e);

        let mono = downmix(&pcm.samples, pcm.channels, 1);
        let pcm_i16: Vec<i16> = mono.iter().copied().map(to_i16).collect();

        let mut builder = Mp3Builder::new()
            .ok_or_else(|| encoding("Failed to create LAME encoder".to_string()))?;
        builder
            .set_num_channels(1)
            .map_err(|e| encoding(format!("Failed to set channels: {:?}", e)))?;
        builder
            .set_sample_rate(pcm.sample_rate)
            .map_err(|e| encoding(format!("Failed to set sample rate: {:?}", e)))?;
        builder
            .set_brate(mp3_bitrate(bitrate))
            .map_err(|e| encoding(format!("Failed to set bitrate: {:?}", e)))?;
        builder
            .set_quality(Quality::Good)
            .map_err(|e| encoding(format!("Failed to set quality: {:?}", e)))?;
        let mut encoder = builder
            .build()
            .map_err(|e| encoding(format!("Failed to initialize LAME: {:?}", e)))?;

        let mut mp3_data = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(
            pcm_i16.len(),
        ));
        encoder
            .encode_to_vec(MonoPcm(pcm_i16.as_slice()), &mut mp3_data)
            .map_err(|e| encoding(format!("MP3 encode failed: {:?}", e)))?;
        // LAME 冲刷最多写出 7200 字节
        mp3_data.reserve(7200);
        encoder
            .flush_to_vec::<FlushNoGap>(&mut mp3_data)
            .map_err(|e| encoding(format!("MP3 flush failed: {:?}", e)))?;

        Ok(mp3_data)
    }

    fn parse_header(&self, data: &[u8]) -> Result<WavHeader, TranscodeError> {
        let invalid = |msg: &str| TranscodeError::InvalidInput(format!("Invalid WAV: {}", msg));

        if data.len() < 44 {
            return Err(invalid("data too short"));
        }
        if &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
            return Err(invalid("missing RIFF/WAVE header"));
        }

        let read_u16 = |at: usize| u16::from_le_bytes([data[at], data[at + 1]]);
        let read_u32 =
            |at: usize| u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);

        let mut pos = 12;
        let mut fmt: Option<(u16, u32, u16)> = None;
        while pos + 8 <= data.len() {
            let chunk_id = &data[pos..pos + 4];
            let chunk_size = read_u32(pos + 4) as usize;
            let body = pos + 8;

            match chunk_id {
                b"fmt " => {
                    if chunk_size < 16 || body + 16 > data.len() {
                        return Err(invalid("bad fmt chunk"));
                    }
                    fmt = Some((read_u16(body + 2), read_u32(body + 4), read_u16(body + 14)));
                }
                b"data" => {
                    let (channels, sample_rate, bits_per_sample) =
                        fmt.ok_or_else(|| invalid("missing fmt chunk"))?;
                    // 流式写出的 WAV 可能把 data 大小写成 0 或超出实际长度
                    let available = data.len() - body;
                    let data_size = if chunk_size == 0 || chunk_size > available {
                        available
                    } else {
                        chunk_size
                    };
                    return Ok(WavHeader {
                        channels,
                        sample_rate,
                        bits_per_sample,
                        data_size,
                    });
                }
                _ => {}
            }

            pos = body + chunk_size + (chunk_size % 2);
        }

        Err(invalid("missing data chunk"))
    }
}

/// 选择不低于输入的 Opus 采样率
fn opus_sample_rate(sample_rate: u32) -> u32 {
    [8000, 12000, 16000, 24000, 48000]
        .into_iter()
        .find(|&rate| sample_rate <= rate)
        .unwrap_or(48000)
}

/// 取不低于目标的 LAME 固定比特率档位
fn mp3_bitrate(bitrate: u32) -> Bitrate {
    match bitrate.div_ceil(1000) {
        0..=8 => Bitrate::Kbps8,
        9..=16 => Bitrate::Kbps16,
        17..=24 => Bitrate::Kbps24,
        25..=32 => Bitrate::Kbps32,
        33..=40 => Bitrate::Kbps40,
        41..=48 => Bitrate::Kbps48,
        49..=64 => Bitrate::Kbps64,
        65..=80 => Bitrate::Kbps80,
        81..=96 => Bitrate::Kbps96,
        97..=112 => Bitrate::Kbps112,
        113..=128 => Bitrate::Kbps128,
        129..=160 => Bitrate::Kbps160,
        161..=192 => Bitrate::Kbps192,
        193..=224 => Bitrate::Kbps224,
        225..=256 => Bitrate::Kbps256,
        _ => Bitrate::Kbps320,
    }
}

/// 多声道取前几路
fn downmix(samples: &[f32], from_channels: usize, to_channels: usize) -> Vec<f32> {
    if from_channels == to_channels {
        return samples.to_vec();
    }
    samples
        .chunks(from_channels)
        .flat_map(|frame| frame.iter().take(to_channels).copied())
        .collect()
}

/// 线性插值重采样
fn resample(samples: &[f32], from_rate: u32, to_rate: u32, channels: usize) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let frame_count = samples.len() / channels;
    let new_frame_count = (frame_count as f64 * ratio) as usize;
    let mut out = Vec::with_capacity(new_frame_count * channels);

    for i in 0..new_frame_count {
        let src = i as f64 / ratio;
        let idx = src as usize;
        let frac = (src - idx as f64) as f32;
        let next = (idx + 1).min(frame_count.saturating_sub(1));

        for ch in 0..channels {
            let s0 = samples.get(idx * channels + ch).copied().unwrap_or(0.0);
            let s1 = samples.get(next * channels + ch).copied().unwrap_or(s0);
            out.push(s0 + (s1 - s0) * frac);
        }
    }

    out
}

fn opus_head(channels: u8, sample_rate: u32, pre_skip: u16) -> Vec<u8> {
    let mut head = Vec::with_capacity(19);
    head.extend_from_slice(b"OpusHead");
    head.push(1); // version
    head.push(channels);
    head.extend_from_slice(&pre_skip.to_le_bytes());
    head.extend_from_slice(&sample_rate.to_le_bytes());
    head.extend_from_slice(&0i16.to_le_bytes()); // output gain
    head.push(0); // mapping family
    head
}

fn opus_tags() -> Vec<u8> {
    let vendor = concat!("voxclone ", env!("CARGO_PKG_VERSION"));
    let mut tags = Vec::new();
    tags.extend_from_slice(b"OpusTags");
    tags.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    tags.extend_from_slice(vendor.as_bytes());
    tags.extend_from_slice(&0u32.to_le_bytes());
    tags
}

#[derive(Debug)]
struct WavHeader {
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    data_size: usize,
}

#[derive(Debug)]
struct DecodedAudio {
    /// 交错样本
    samples: Vec<f32>,
    sample_rate: u32,
    channels: usize,
}

#[async_trait]
impl AudioTranscoderPort for WavTranscoder {
    async fn transcode(
        &self,
        wav_data: &[u8],
        config: &TranscodeConfig,
    ) -> Result<TranscodeResult, TranscodeError> {
        let info = self.get_audio_info(wav_data)?;
        let original_size = wav_data.len();

        let audio_data = match config.format {
            AudioFormat::Wav => wav_data.to_vec(),
            AudioFormat::Opus => {
                let bitrate = config.bitrate.unwrap_or(DEFAULT_BITRATE);
                let decoded = self.decode(wav_data)?;
                let data = self.encode_opus(&decoded, bitrate)?;
                tracing::debug!(
                    original_size,
                    opus_size = data.len(),
                    bitrate,
                    "Encoded to Opus"
                );
                data
            }
            AudioFormat::Mp3 => {
                let bitrate = config.bitrate.unwrap_or(DEFAULT_BITRATE);
                let decoded = self.decode(wav_data)?;
                let data = self.encode_mp3(&decoded, bitrate)?;
                tracing::debug!(
                    original_size,
                    mp3_size = data.len(),
                    bitrate,
                    "Encoded to MP3"
                );
                data
            }
        };

        Ok(TranscodeResult {
            transcoded_size: audio_data.len(),
            audio_data,
            format: config.format,
            duration_ms: info.duration_ms,
            original_size,
        })
    }

    fn get_audio_info(&self, wav_data: &[u8]) -> Result<AudioInfo, TranscodeError> {
        let header = self.parse_header(wav_data)?;

        let bytes_per_frame = (header.bits_per_sample as usize / 8) * header.channels as usize;
        let duration_ms = if bytes_per_frame > 0 && header.sample_rate > 0 {
            (header.data_size / bytes_per_frame) as u64 * 1000 / header.sample_rate as u64
        } else {
            0
        };

        Ok(AudioInfo {
            duration_ms,
            sample_rate: header.sample_rate,
            channels: header.channels as u8,
            bits_per_sample: header.bits_per_sample,
            data_size: header.data_size,
        })
    }

    fn supports_format(&self, _format: AudioFormat) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1 秒 16kHz 单声道 440Hz 正弦
    fn tone_wav() -> Vec<u8> {
        let samples: Vec<i16> = (0..16000)
            .map(|i| {
                let t = i as f32 / 16000.0;
                ((t * 440.0 * std::f32::consts::TAU).sin() * 8000.0) as i16
            })
            .collect();
        encode_pcm16_wav(&samples, 16000, 1)
    }

    #[test]
    fn test_encode_pcm16_wav_header() {
        let wav = encode_pcm16_wav(&[1, 2, 3], 22050, 1);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + 6);
    }

    #[test]
    fn test_audio_info() {
        let info = WavTranscoder::new().get_audio_info(&tone_wav()).unwrap();
        assert_eq!(info.sample_rate, 16000);
        assert_eq!(info.channels, 1);
        assert_eq!(info.bits_per_sample, 16);
        assert_eq!(info.duration_ms, 1000);
    }

    #[test]
    fn test_audio_info_rejects_garbage() {
        let result = WavTranscoder::new().get_audio_info(&[0u8; 64]);
        assert!(matches!(result, Err(TranscodeError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_wav_passthrough() {
        let wav = tone_wav();
        let result = WavTranscoder::new()
            .transcode(&wav, &TranscodeConfig::default())
            .await
            .unwrap();
        assert_eq!(result.format, AudioFormat::Wav);
        assert_eq!(result.audio_data, wav);
    }

    #[tokio::test]
    async fn test_transcode_to_opus() {
        let config = TranscodeConfig {
            format: AudioFormat::Opus,
            bitrate: Some(24000),
        };
        let result = WavTranscoder::new()
            .transcode(&tone_wav(), &config)
            .await
            .unwrap();
        assert_eq!(result.format, AudioFormat::Opus);
        assert_eq!(&result.audio_data[0..4], b"OggS");
        assert!(result.transcoded_size < result.original_size);
    }

    #[tokio::test]
    async fn test_transcode_to_mp3() {
        let transcoder = WavTranscoder::new();
        assert!(transcoder.supports_format(AudioFormat::Mp3));

        let config = TranscodeConfig {
            format: AudioFormat::Mp3,
            bitrate: Some(32000),
        };
        let result = transcoder.transcode(&tone_wav(), &config).await.unwrap();
        assert_eq!(result.format, AudioFormat::Mp3);
        assert_eq!(result.duration_ms, 1000);
        // MPEG 帧同步字或 ID3 标签
        let data = &result.audio_data;
        assert!(data.len() > 4);
        assert!(data.starts_with(b"ID3") || (data[0] == 0xFF && data[1] & 0xE0 == 0xE0));
        assert!(result.transcoded_size < result.original_size);
    }

    #[test]
    fn test_opus_sample_rate() {
        assert_eq!(opus_sample_rate(16000), 16000);
        assert_eq!(opus_sample_rate(22050), 24000);
        assert_eq!(opus_sample_rate(44100), 48000);
        assert_eq!(opus_sample_rate(96000), 48000);
    }
}
