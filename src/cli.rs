use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Query Scan-Manga from the command line and print the results as JSON
#[derive(Parser)]
#[command(name = "scanmanga")]
#[command(about = "Browse scan-manga.com through the source adapter", long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = scanmanga::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Top titles
    Popular,
    /// Titles from the home page news feed
    Latest,
    /// Search titles by name
    Search {
        query: String,
    },
    /// Title details, from a canonical path such as /10/One-Piece.html
    Details {
        path: String,
    },
    /// Chapters of a title
    Chapters {
        path: String,
    },
    /// Pages of a chapter
    Pages {
        path: String,
    },
    /// Resolve the image request of one page
    Image {
        /// Reading page URL
        page_url: String,
        /// Image locator returned by `pages`
        image_url: String,
    },
}
