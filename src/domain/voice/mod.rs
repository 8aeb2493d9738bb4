//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 用户名与参考音频格式校验
//! - 音色记录（VoiceRecord）定义
//! - 合成参数（语言、表现力）

mod errors;
mod record;
mod value_objects;

pub use errors::VoiceError;
pub use record::VoiceRecord;
pub use value_objects::{Expressiveness, SampleFormat, SynthesisParams, Username, VoiceId};
