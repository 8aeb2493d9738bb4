//! Domain Layer - 领域层
//!
//! 只有一个限界上下文:
//! - Voice Context: 音色样本与合成参数

pub mod voice;
