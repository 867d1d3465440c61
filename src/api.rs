use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::catalog::Catalog;
use crate::error::{CromulentError, Result};
use crate::types::{Character, Episode, Location, Page, ResourceKind};

/// Width segment the CDN serves card images at.
const CDN_WIDTH: u32 = 500;

/// HTTP client for thesimpsonsapi.com and its CDN.
pub struct SimpsonsApi {
    client: reqwest::Client,
    api_base: String,
    cdn_base: String,
}

impl std::fmt::Debug for SimpsonsApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpsonsApi")
            .field("api_base", &self.api_base)
            .field("cdn_base", &self.cdn_base)
            .finish_non_exhaustive()
    }
}

impl From<reqwest::Error> for CromulentError {
    fn from(err: reqwest::Error) -> Self {
        CromulentError::Api(err.to_string())
    }
}

impl SimpsonsApi {
    pub fn new(api_base: &str, cdn_base: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cromulent/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            cdn_base: cdn_base.trim_end_matches('/').to_string(),
        })
    }

    /// `GET {api_base}/{path}?page={n}`, unwrapping the `results` envelope.
    async fn page_of<T: DeserializeOwned>(&self, path: &str, page: u32) -> Result<Vec<T>> {
        let url = format!("{}/{}?page={}", self.api_base, path, page);
        tracing::debug!(%url, "requesting page");
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(CromulentError::Api(format!(
                "{} page {} returned {}",
                path,
                page,
                response.status()
            )));
        }

        let envelope: Page<T> = response.json().await?;
        Ok(envelope.results)
    }
}

#[async_trait]
impl Catalog for SimpsonsApi {
    async fn characters(&self, page: u32) -> Result<Vec<Character>> {
        self.page_of(ResourceKind::Characters.api_path(), page).await
    }

    async fn episodes(&self, page: u32) -> Result<Vec<Episode>> {
        self.page_of(ResourceKind::Episodes.api_path(), page).await
    }

    async fn locations(&self, page: u32) -> Result<Vec<Location>> {
        self.page_of(ResourceKind::Locations.api_path(), page).await
    }

    async fn image(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.image_url(path);
        tracing::debug!(%url, "requesting image");
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(CromulentError::Api(format!(
                "image {} returned {}",
                path,
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }

    fn image_url(&self, path: &str) -> String {
        // Image paths from the API start with a slash and are appended
        // verbatim after the width segment.
        format!("{}/{}{}", self.cdn_base, CDN_WIDTH, path)
    }
}
