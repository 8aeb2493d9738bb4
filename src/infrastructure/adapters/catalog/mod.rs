//! Catalog Adapter - 音色目录

mod json_catalog;

pub use json_catalog::JsonVoiceCatalog;
