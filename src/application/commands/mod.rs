//! 应用层 - 命令（写操作）
//!
//! 每个界面动作（train / generate）对应一个命令和一个处理器

mod voice_commands;

pub mod handlers;

pub use voice_commands::*;
