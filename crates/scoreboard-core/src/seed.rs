// Seed data: the starting roster and the game image list, read once when
// nothing has been persisted yet.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use crate::player::Player;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("seed data at {location} is not valid JSON: {source}")]
    Parse {
        location: String,
        source: serde_json::Error,
    },
}

/// Where the starting data comes from.
#[async_trait]
pub trait SeedProvider: Send + Sync {
    /// Starting roster.
    async fn players(&self) -> Result<Vec<Player>, SeedError>;

    /// File names offered in the game image picker.
    async fn images(&self) -> Result<Vec<String>, SeedError>;
}

/// A seed location: a local file or an `http(s)://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Url(String),
}

impl Location {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Location::Url(raw.to_string())
        } else {
            Location::File(PathBuf::from(raw))
        }
    }

    fn describe(&self) -> String {
        match self {
            Location::File(path) => path.display().to_string(),
            Location::Url(url) => url.clone(),
        }
    }

    async fn read_text(&self, http: &reqwest::Client) -> Result<String, SeedError> {
        match self {
            Location::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| SeedError::Io {
                        path: path.clone(),
                        source,
                    })
            }
            Location::Url(url) => {
                let http_err = |source| SeedError::Http {
                    url: url.clone(),
                    source,
                };
                http.get(url)
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(http_err)?
                    .text()
                    .await
                    .map_err(http_err)
            }
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        http: &reqwest::Client,
    ) -> Result<T, SeedError> {
        let text = self.read_text(http).await?;
        serde_json::from_str(&text).map_err(|source| SeedError::Parse {
            location: self.describe(),
            source,
        })
    }
}

/// Seed provider backed by configured file paths or URLs.
pub struct SeedSource {
    http: reqwest::Client,
    players: Location,
    images: Location,
}

impl SeedSource {
    pub fn new(players: &str, images: &str) -> Self {
        SeedSource {
            http: reqwest::Client::new(),
            players: Location::parse(players),
            images: Location::parse(images),
        }
    }
}

#[async_trait]
impl SeedProvider for SeedSource {
    async fn players(&self) -> Result<Vec<Player>, SeedError> {
        let players: Vec<Player> = self.players.read_json(&self.http).await?;
        info!(
            "Read {} seed players from {}",
            players.len(),
            self.players.describe()
        );
        Ok(players)
    }

    async fn images(&self) -> Result<Vec<String>, SeedError> {
        self.images.read_json(&self.http).await
    }
}

/// The image list, or an empty list if it cannot be read.
pub async fn load_images(provider: &dyn SeedProvider) -> Vec<String> {
    match provider.images().await {
        Ok(images) => images,
        Err(e) => {
            error!("Failed to load game images: {e}");
            Vec::new()
        }
    }
}
