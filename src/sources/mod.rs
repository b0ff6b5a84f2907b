use async_trait::async_trait;
use scraper::{ElementRef, Html};

use crate::error::Result;
use crate::models::{ChapterEntry, FilterList, ImageRequest, MangasPage, PageRef, TitleDetails, TitleSummary};

pub mod scanmanga;

/// Operations a host application drives a source through.
#[async_trait]
pub trait MangaSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn base_url(&self) -> &'static str;

    fn lang(&self) -> &'static str;

    fn supports_latest(&self) -> bool;

    async fn popular_manga(&self, page: u32) -> Result<MangasPage>;

    async fn latest_updates(&self, page: u32) -> Result<MangasPage>;

    async fn search_manga(&self, page: u32, query: &str, filters: &FilterList) -> Result<MangasPage>;

    /// `url` is the canonical (site-relative) path of the title.
    async fn manga_details(&self, url: &str) -> Result<TitleDetails>;

    async fn chapter_list(&self, url: &str) -> Result<Vec<ChapterEntry>>;

    async fn page_list(&self, url: &str) -> Result<Vec<PageRef>>;

    /// Resolve a page into the request that downloads its image.
    async fn image_request(&self, page: &PageRef) -> Result<ImageRequest>;
}

/// Per-element hooks for sources whose listings map one element to one record.
/// Sources that parse whole documents instead return `SourceError::Unsupported`.
pub trait ElementParser {
    fn popular_manga_from_element(&self, element: ElementRef) -> Result<TitleSummary>;

    fn latest_updates_from_element(&self, element: ElementRef) -> Result<TitleSummary>;

    fn search_manga_from_element(&self, element: ElementRef) -> Result<TitleSummary>;

    fn chapter_from_element(&self, element: ElementRef) -> Result<ChapterEntry>;

    fn image_url_parse(&self, document: &Html) -> Result<String>;
}
