//! Voxclone - 多用户声音克隆服务
//!
//! 架构设计: Hexagonal Architecture + 命令/查询分离
//!
//! 领域层 (domain/):
//! - Voice: 用户名、样本格式、表现力、音色记录
//!
//! 应用层 (application/):
//! - Ports: VoiceCatalog, TtsEngine, AudioTranscoder, OutputStorage
//! - Synthesis: 串行化、带超时的合成适配器
//! - Commands: 训练 / 生成
//! - Queries: 列表、生成页视图、试听、下载
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: JSON 音色目录, HTTP / Fake TTS 客户端, WAV/Opus 转码, 输出文件存储
//! - HTTP: 内置页面 + JSON API

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
