mod cli;

use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use cli::{Cli, Commands};
use scanmanga::config::Config;
use scanmanga::error::{Result, SourceError};
use scanmanga::models::{FilterList, ImageRequest, PageRef};
use scanmanga::sources::scanmanga::{ScanManga, BASE_URL};
use scanmanga::sources::MangaSource;

fn init_logging(path: &Path) -> Result<()> {
    if path.exists() {
        return log4rs::init_file(path, Default::default())
            .map_err(|e| SourceError::Config(format!("{}: {}", path.display(), e)));
    }

    // stdout carries the JSON output
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}")))
        .build();
    let config = log4rs::config::Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Info))
        .map_err(|e| SourceError::Config(e.to_string()))?;
    log4rs::init_config(config).map_err(|e| SourceError::Config(e.to_string()))?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Cannot serialize output: {}", e),
    }
}

fn image_request_json(request: &ImageRequest) -> serde_json::Value {
    let headers: serde_json::Map<String, serde_json::Value> = request
        .headers
        .iter()
        .map(|(name, value)| {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            (name.to_string(), serde_json::Value::String(value))
        })
        .collect();
    serde_json::json!({ "url": request.url, "headers": headers })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // Config problems are logged once the logger is up.
    let (cfg, config_error) = match Config::read(&cli.config) {
        Ok(cfg) => (cfg, None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_logging(Path::new(&cfg.log_config))?;
    if let Some(e) = config_error {
        log::warn!("Ignoring config {}, using defaults: {}", cli.config.display(), e);
    }

    let executor = cfg.http.create_executor()?;
    let source = ScanManga::new(Arc::new(executor));
    log::info!("{} ({}) at {}", source.name(), source.lang(), source.base_url());

    match cli.command {
        Commands::Popular => print_json(&source.popular_manga(1).await?),
        Commands::Latest => print_json(&source.latest_updates(1).await?),
        Commands::Search { query } => {
            print_json(&source.search_manga(1, &query, &FilterList::new()).await?)
        }
        Commands::Details { path } => print_json(&source.manga_details(&path).await?),
        Commands::Chapters { path } => print_json(&source.chapter_list(&path).await?),
        Commands::Pages { path } => print_json(&source.page_list(&path).await?),
        Commands::Image { page_url, image_url } => {
            let page_url = if page_url.starts_with('/') {
                format!("{BASE_URL}{page_url}")
            } else {
                page_url
            };
            let page = PageRef {
                index: 0,
                url: page_url,
                image_url,
            };
            let request = source.image_request(&page).await?;
            print_json(&image_request_json(&request));
        }
    }

    Ok(())
}
