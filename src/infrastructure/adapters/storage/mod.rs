//! Storage Adapter - 合成结果存储

mod file_storage;

pub use file_storage::FileOutputStorage;
