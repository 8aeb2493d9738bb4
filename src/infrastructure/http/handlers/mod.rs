//! HTTP Handlers

mod generate;
mod ping;
mod ui;
mod voice;

pub use generate::*;
pub use ping::*;
pub use ui::*;
pub use voice::*;
