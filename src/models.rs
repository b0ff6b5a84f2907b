use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

/// A title as it appears in a listing or search result.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TitleSummary {
    pub title: String,
    /// Site-relative URL, never absolute.
    pub url: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TitleDetails {
    pub title: String,
    pub author: String,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    pub genres: String,
    pub status: MangaStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MangaStatus {
    Ongoing,
    Completed,
    OnHiatus,
    Licensed,
    Cancelled,
    Unknown,
}

impl MangaStatus {
    /// Classify the serialized "fiche technique" block by the first French status label it contains.
    pub fn from_technical_sheet(text: &str) -> Self {
        const LABELS: &[(&str, MangaStatus)] = &[
            ("En cours", MangaStatus::Ongoing),
            ("Terminé", MangaStatus::Completed),
            ("En pause", MangaStatus::OnHiatus),
            ("Licencié", MangaStatus::Licensed),
            ("Désactivé du site (licenciée)", MangaStatus::Licensed),
            ("Abandonné", MangaStatus::Cancelled),
        ];

        LABELS
            .iter()
            .find(|(label, _)| text.contains(*label))
            .map(|(_, status)| *status)
            .unwrap_or(MangaStatus::Unknown)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub name: String,
    pub url: String,
    /// Translators credited on the title page, shared by every chapter.
    pub scanlator: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub index: usize,
    /// Reading page the image belongs to; also sent as `Referer`.
    pub url: String,
    /// Composed locator, only usable through `image_request`.
    pub image_url: String,
}

/// GET request the host runs to download one page image.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub url: String,
    pub headers: HeaderMap,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct MangasPage {
    pub mangas: Vec<TitleSummary>,
    pub has_next_page: bool,
}

impl MangasPage {
    pub fn last(mangas: Vec<TitleSummary>) -> Self {
        Self {
            mangas,
            has_next_page: false,
        }
    }
}

/// Host-side filter. Accepted by `search_manga` but never consulted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub value: String,
}

pub type FilterList = Vec<Filter>;
