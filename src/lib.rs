// Library interface for the Scan-Manga source
// The host application drives it through `sources::MangaSource`

pub mod config;
pub mod error;
pub mod helpers;
pub mod http_client;
pub mod models;
pub mod sources;

pub use error::{Result, SourceError};
pub use sources::scanmanga::ScanManga;
pub use sources::{ElementParser, MangaSource};
