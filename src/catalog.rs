use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Character, Episode, Location};

/// Seam between the app and the remote API. The pagination state
/// machine and the bulk archiver both go through this trait, so they
/// can be exercised against a scripted double in tests.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// One page of characters; an empty vec means the kind is exhausted.
    async fn characters(&self, page: u32) -> Result<Vec<Character>>;

    /// One page of episodes; an empty vec means the kind is exhausted.
    async fn episodes(&self, page: u32) -> Result<Vec<Episode>>;

    /// One page of locations; an empty vec means the kind is exhausted.
    async fn locations(&self, page: u32) -> Result<Vec<Location>>;

    /// Fetch one image from the CDN as raw bytes.
    async fn image(&self, path: &str) -> Result<Vec<u8>>;

    /// Public CDN URL for an image path, at card size.
    fn image_url(&self, path: &str) -> String;
}
