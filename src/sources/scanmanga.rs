use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::{Arc, LazyLock};

use crate::error::{Result, SourceError};
use crate::helpers::{
    element_text, join_texts, non_empty, own_text, select_attr, select_text, strip_trailing_comma,
    url_without_domain,
};
use crate::http_client::{HttpExecutor, ReqwestExecutor, SourceRequest, SourceResponse};
use crate::models::{
    ChapterEntry, FilterList, ImageRequest, MangaStatus, MangasPage, PageRef, TitleDetails, TitleSummary,
};
use crate::sources::{ElementParser, MangaSource};

pub const BASE_URL: &str = "https://www.scan-manga.com";
pub const MOBILE_URL: &str = "https://m.scan-manga.com";

/// Placeholder the reader pages put where the viewer base URL belongs.
pub const IFRAME_RESIZE_SENTINEL: &str = "https://cdn.scanmanga.eu/js/iframeResize.js";

const POPULAR_PATH: &str = "/TOP-Manga-Webtoon-24.html";
const SEARCH_REFERER: &str = "https://m.scan-manga.com/?po";
const IMAGE_ACCEPT: &str = "image/avif,image/webp,*/*";
const IMAGE_ACCEPT_LANGUAGE: &str = "fr,fr-FR;q=0.8,en-US;q=0.5,en;q=0.3";

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static POPULAR_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("div.image_manga a[href]"));
static LATEST_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("#content_news .listing"));
static LATEST_NAME: LazyLock<Selector> = LazyLock::new(|| selector("a.nom_manga"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));

static DETAILS_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h2[itemprop=name]"));
static DETAILS_AUTHOR: LazyLock<Selector> = LazyLock::new(|| selector("li[itemprop=author] a"));
static DETAILS_COVER: LazyLock<Selector> =
    LazyLock::new(|| selector("div.cover_volume_manga img.lazy"));
static DETAILS_FALLBACK_COVER: LazyLock<Selector> = LazyLock::new(|| selector("div.image_manga img"));
static DETAILS_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector("p[itemprop=description]"));
static GENRE_BUBBLE: LazyLock<Selector> = LazyLock::new(|| selector("a.infoBulle"));
static GENRE_LABEL: LazyLock<Selector> = LazyLock::new(|| selector("span"));
static TECHNICAL_SHEET: LazyLock<Selector> =
    LazyLock::new(|| selector("div.contenu_texte_fiche_technique ul li"));

static CHAPTER_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector("div.texte_volume_manga ul li.chapitre div.chapitre_nom a"));
static TRANSLATOR: LazyLock<Selector> = LazyLock::new(|| selector(r#"li[itemprop="translator"] a"#));

static IMAGE_SERVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"](http.*?scanmanga.eu.*)['"]"#).unwrap());
static IMAGE_SERVER_ALT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"](http.*?.scan-manga.com.*)['"]"#).unwrap());
static PAGE_PARAMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["'](.*?zoneID.*?pageID.*?siteID.*?)["']"#).unwrap());
static VIEWER_BASE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"tlo = '(https://[^']+)").unwrap());
static VIEWER_BASE_ALT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\('src','(https://[^']+)'").unwrap());

/// Scan-Manga (scan-manga.com), French manga and webtoon catalogue.
pub struct ScanManga {
    executor: Arc<dyn HttpExecutor>,
}

impl ScanManga {
    pub fn new(executor: Arc<dyn HttpExecutor>) -> Self {
        Self { executor }
    }

    pub fn with_default_client() -> Result<Self> {
        Ok(Self::new(Arc::new(ReqwestExecutor::new()?)))
    }

    pub fn executor(&self) -> &Arc<dyn HttpExecutor> {
        &self.executor
    }

    /// Headers sent with every request this source builds.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("fr-FR,fr"));
        headers
    }

    async fn fetch(&self, request: SourceRequest) -> Result<SourceResponse> {
        self.executor.execute(request).await?.ensure_success()
    }

    // Popular

    pub fn popular_manga_request(&self, _page: u32) -> SourceRequest {
        SourceRequest::get(format!("{BASE_URL}{POPULAR_PATH}"), self.headers())
    }

    pub fn popular_manga_parse(&self, body: &str) -> Result<MangasPage> {
        let document = Html::parse_document(body);
        let mangas = document
            .select(&POPULAR_ITEM)
            .map(|element| self.popular_manga_from_element(element))
            .collect::<Result<Vec<_>>>()?;

        log::debug!("ScanManga: {} popular titles", mangas.len());
        Ok(MangasPage::last(mangas))
    }

    // Latest

    pub fn latest_updates_request(&self, _page: u32) -> SourceRequest {
        SourceRequest::get(BASE_URL, self.headers())
    }

    pub fn latest_updates_parse(&self, body: &str) -> Result<MangasPage> {
        let document = Html::parse_document(body);
        let mangas = document
            .select(&LATEST_ITEM)
            .map(|element| self.latest_updates_from_element(element))
            .collect::<Result<Vec<_>>>()?;

        log::debug!("ScanManga: {} latest titles", mangas.len());
        Ok(MangasPage::last(mangas))
    }

    // Search

    pub fn search_manga_request(&self, _page: u32, query: &str, _filters: &FilterList) -> SourceRequest {
        let mut headers = self.headers();
        headers.insert(REFERER, HeaderValue::from_static(SEARCH_REFERER));
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));

        let url = format!("{MOBILE_URL}/qsearchm.json?term={}", urlencoding::encode(query));
        SourceRequest::get(url, headers)
    }

    /// Parse the JSONP search payload, keeping only titles that contain `query`.
    pub fn search_manga_parse(&self, body: &str, query: &str) -> MangasPage {
        let needle = query.to_lowercase();
        let mangas = parse_search_payload(body)
            .into_iter()
            .filter(|manga| manga.title.to_lowercase().contains(&needle))
            .collect();

        MangasPage::last(mangas)
    }

    // Details

    pub fn manga_details_request(&self, url: &str) -> SourceRequest {
        SourceRequest::get(absolute_url(url), self.headers())
    }

    pub fn manga_details_parse(&self, body: &str) -> TitleDetails {
        let document = Html::parse_document(body);
        let root = document.root_element();

        let mut thumbnail_url = select_attr(root, &DETAILS_COVER, "data-original");
        if thumbnail_url.is_empty() {
            thumbnail_url = select_attr(root, &DETAILS_FALLBACK_COVER, "src");
        }

        let description = select_text(root, &DETAILS_DESCRIPTION);
        let description = strip_trailing_comma(&description).to_string();

        let genres = root
            .select(&GENRE_BUBBLE)
            .filter_map(genre_from_bubble)
            .collect::<Vec<_>>()
            .join(", ");

        let technical_sheet = root
            .select(&TECHNICAL_SHEET)
            .map(|li| li.html())
            .collect::<Vec<_>>()
            .join("\n");

        TitleDetails {
            title: select_text(root, &DETAILS_TITLE),
            author: join_texts(root, &DETAILS_AUTHOR),
            thumbnail_url: non_empty(thumbnail_url),
            description: non_empty(description),
            genres,
            status: MangaStatus::from_technical_sheet(&technical_sheet),
        }
    }

    // Chapters

    pub fn chapter_list_request(&self, url: &str) -> SourceRequest {
        SourceRequest::get(absolute_url(url), self.headers())
    }

    /// Chapter rows are not uniform, so the whole page is parsed at once and the
    /// translators credited on it are attached to every chapter.
    pub fn chapter_list_parse(&self, body: &str) -> Vec<ChapterEntry> {
        let document = Html::parse_document(body);
        let root = document.root_element();
        let scanlator = join_texts(root, &TRANSLATOR);

        let chapters: Vec<ChapterEntry> = root
            .select(&CHAPTER_LINK)
            .map(|link| ChapterEntry {
                name: element_text(link),
                url: url_without_domain(link.value().attr("href").unwrap_or_default()),
                scanlator: scanlator.clone(),
            })
            .collect();

        log::debug!("ScanManga: {} chapters", chapters.len());
        chapters
    }

    // Pages

    pub fn page_list_request(&self, url: &str) -> SourceRequest {
        SourceRequest::get(absolute_url(url), self.headers())
    }

    /// `location` is the final URL of the reading page.
    pub fn page_list_parse(&self, body: &str, location: &str) -> Vec<PageRef> {
        let markup = Html::parse_document(body).html();

        let image_server = first_capture(&[&*IMAGE_SERVER, &*IMAGE_SERVER_ALT], &markup)
            .unwrap_or_else(|| {
                log::warn!("ScanManga: no image server URL found on {}", location);
                String::new()
            });

        let pages: Vec<PageRef> = PAGE_PARAMS
            .captures_iter(&markup)
            .enumerate()
            .map(|(index, params)| PageRef {
                index,
                url: location.to_string(),
                image_url: format!("{}{}", image_server, &params[1]),
            })
            .collect();

        log::debug!("ScanManga: {} pages on {}", pages.len(), location);
        pages
    }

    /// Build the image request from the body of a freshly fetched reading page.
    pub fn image_request_parse(&self, page: &PageRef, viewer_body: &str) -> Result<ImageRequest> {
        let mut headers = self.headers();
        headers.insert(REFERER, HeaderValue::from_str(&page.url)?);
        headers.insert(ACCEPT, HeaderValue::from_static(IMAGE_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(IMAGE_ACCEPT_LANGUAGE));

        let url = if page.image_url.contains(IFRAME_RESIZE_SENTINEL) {
            match find_viewer_base_url(viewer_body) {
                Some(base) => page.image_url.replace(IFRAME_RESIZE_SENTINEL, &base),
                None => {
                    log::warn!("ScanManga: no viewer base URL on {}, keeping placeholder", page.url);
                    page.image_url.clone()
                }
            }
        } else {
            page.image_url.clone()
        };

        Ok(ImageRequest { url, headers })
    }
}

#[async_trait]
impl MangaSource for ScanManga {
    fn name(&self) -> &'static str {
        "Scan-Manga"
    }

    fn base_url(&self) -> &'static str {
        BASE_URL
    }

    fn lang(&self) -> &'static str {
        "fr"
    }

    fn supports_latest(&self) -> bool {
        true
    }

    async fn popular_manga(&self, page: u32) -> Result<MangasPage> {
        let response = self.fetch(self.popular_manga_request(page)).await?;
        self.popular_manga_parse(&response.body)
    }

    async fn latest_updates(&self, page: u32) -> Result<MangasPage> {
        let response = self.fetch(self.latest_updates_request(page)).await?;
        self.latest_updates_parse(&response.body)
    }

    async fn search_manga(&self, page: u32, query: &str, filters: &FilterList) -> Result<MangasPage> {
        let response = self.fetch(self.search_manga_request(page, query, filters)).await?;
        let result = self.search_manga_parse(&response.body, query);
        log::debug!("ScanManga: {} results for {:?}", result.mangas.len(), query);
        Ok(result)
    }

    async fn manga_details(&self, url: &str) -> Result<TitleDetails> {
        let response = self.fetch(self.manga_details_request(url)).await?;
        Ok(self.manga_details_parse(&response.body))
    }

    async fn chapter_list(&self, url: &str) -> Result<Vec<ChapterEntry>> {
        let response = self.fetch(self.chapter_list_request(url)).await?;
        Ok(self.chapter_list_parse(&response.body))
    }

    async fn page_list(&self, url: &str) -> Result<Vec<PageRef>> {
        let response = self.fetch(self.page_list_request(url)).await?;
        Ok(self.page_list_parse(&response.body, &response.url))
    }

    async fn image_request(&self, page: &PageRef) -> Result<ImageRequest> {
        // The reader page is fetched again as-is: status is not checked and no source headers are added.
        let response = self
            .executor
            .execute(SourceRequest::get(page.url.as_str(), HeaderMap::new()))
            .await?;
        self.image_request_parse(page, &response.body)
    }
}

impl ElementParser for ScanManga {
    fn popular_manga_from_element(&self, element: ElementRef) -> Result<TitleSummary> {
        Ok(TitleSummary {
            title: select_attr(element, &IMG, "title"),
            url: url_without_domain(element.value().attr("href").unwrap_or_default()),
            thumbnail_url: non_empty(select_attr(element, &IMG, "data-original")),
        })
    }

    /// The cover shown next to latest updates is a wide banner, so no thumbnail is taken.
    fn latest_updates_from_element(&self, element: ElementRef) -> Result<TitleSummary> {
        Ok(TitleSummary {
            title: select_text(element, &LATEST_NAME),
            url: url_without_domain(&select_attr(element, &LATEST_NAME, "href")),
            thumbnail_url: None,
        })
    }

    fn search_manga_from_element(&self, _element: ElementRef) -> Result<TitleSummary> {
        log::error!("ScanManga: search_manga_from_element called, search goes through the JSON endpoint");
        Err(SourceError::Unsupported("search_manga_from_element"))
    }

    fn chapter_from_element(&self, _element: ElementRef) -> Result<ChapterEntry> {
        log::error!("ScanManga: chapter_from_element called, chapters are parsed per page");
        Err(SourceError::Unsupported("chapter_from_element"))
    }

    fn image_url_parse(&self, _document: &Html) -> Result<String> {
        log::error!("ScanManga: image_url_parse called, images are resolved by image_request");
        Err(SourceError::Unsupported("image_url_parse"))
    }
}

fn absolute_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else if url.starts_with('/') {
        format!("{BASE_URL}{url}")
    } else {
        format!("{BASE_URL}/{url}")
    }
}

fn first_capture(patterns: &[&Regex], haystack: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(haystack))
        .map(|caps| caps[1].to_string())
}

/// Viewer base URL embedded in a reading page, if any.
pub fn find_viewer_base_url(body: &str) -> Option<String> {
    first_capture(&[&*VIEWER_BASE, &*VIEWER_BASE_ALT], body)
}

/// Genre name from an `a.infoBulle` anchor: its own text minus the nested label.
/// Anchors whose remainder is empty yield no genre rather than an empty name.
fn genre_from_bubble(anchor: ElementRef) -> Option<String> {
    let text = own_text(anchor);
    let label = anchor.select(&GENRE_LABEL).next()?;
    if text.is_empty() {
        return None;
    }

    non_empty(text.replace(&element_text(label), "").trim().to_string())
}

/// Unwrap `(...);`, drop escaping backslashes and read the rows of the search
/// endpoint. Rows with fewer than two items, or whose items are not scalars, are skipped.
pub fn parse_search_payload(body: &str) -> Vec<TitleSummary> {
    let trimmed = body.trim();
    let trimmed = trimmed.strip_prefix('(').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(");").unwrap_or(trimmed);
    let raw = trimmed.replace('\\', "");

    if raw.is_empty() {
        return Vec::new();
    }

    let rows: Vec<Value> = match serde_json::from_str(&raw) {
        Ok(rows) => rows,
        Err(e) => {
            log::warn!("ScanManga: unreadable search payload: {}", e);
            return Vec::new();
        }
    };

    rows.iter()
        .filter_map(Value::as_array)
        .filter(|row| row.len() > 1)
        .filter_map(|row| {
            let title = scalar_content(&row[0])?;
            let url = scalar_content(&row[1])?;
            let url = url.strip_prefix(MOBILE_URL).map(str::to_string).unwrap_or(url);
            Some(TitleSummary {
                title,
                url,
                thumbnail_url: None,
            })
        })
        .collect()
}

fn scalar_content(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_payload_rows() {
        let body = r#"([[\"One Piece\",\"https:\/\/m.scan-manga.com\/10\/One-Piece.html\"],[\"solo\"],[\"Two Piece\",\"\/20\/Two.html\",\"x\"]]);"#;
        let mangas = parse_search_payload(body);
        assert_eq!(mangas.len(), 2);
        assert_eq!(mangas[0].title, "One Piece");
        assert_eq!(mangas[0].url, "/10/One-Piece.html");
        assert_eq!(mangas[1].url, "/20/Two.html");
        assert!(mangas.iter().all(|m| m.thumbnail_url.is_none()));
    }

    #[test]
    fn test_search_payload_empty_or_malformed() {
        assert!(parse_search_payload("").is_empty());
        assert!(parse_search_payload("();").is_empty());
        assert!(parse_search_payload("(not json);").is_empty());
        assert!(parse_search_payload(r#"({"a":1});"#).is_empty());
    }

    #[test]
    fn test_search_payload_keeps_parentheses_in_titles() {
        let body = r#"([["Kaguya (Love is War)","/1/Kaguya.html"]]);"#;
        let mangas = parse_search_payload(body);
        assert_eq!(mangas[0].title, "Kaguya (Love is War)");
    }

    #[test]
    fn test_viewer_base_url_patterns() {
        assert_eq!(
            find_viewer_base_url("var tlo = 'https://img.example/x';").as_deref(),
            Some("https://img.example/x")
        );
        assert_eq!(
            find_viewer_base_url("el.setAttribute('src','https://alt.example/y');").as_deref(),
            Some("https://alt.example/y")
        );
        assert_eq!(
            find_viewer_base_url("tlo = 'https://first/a'; f('src','https://second/b')").as_deref(),
            Some("https://first/a")
        );
        assert!(find_viewer_base_url("nothing here").is_none());
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(absolute_url("/10/One-Piece.html"), "https://www.scan-manga.com/10/One-Piece.html");
        assert_eq!(absolute_url("10/One-Piece.html"), "https://www.scan-manga.com/10/One-Piece.html");
        assert_eq!(absolute_url("https://m.scan-manga.com/x"), "https://m.scan-manga.com/x");
    }

    #[test]
    fn test_genre_from_bubble() {
        let html = Html::parse_document(
            r#"<div>
                <a class="infoBulle">Action<span>Action</span></a>
                <a class="infoBulle"> Comédie <span>Genre :</span></a>
                <a class="infoBulle"><span>Vide</span></a>
                <a class="infoBulle">Sans label</a>
            </div>"#,
        );
        let genres: Vec<String> = html.select(&GENRE_BUBBLE).filter_map(genre_from_bubble).collect();
        assert_eq!(genres, vec!["Comédie".to_string()]);
    }
}
