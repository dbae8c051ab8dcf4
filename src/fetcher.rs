//! Concurrent retrieval of every wall post newer than a cutoff.
//!
//! Pages are requested in batches of consecutive offsets, all launched at
//! once on a bounded pool. A batch is only inspected after every page in it
//! has returned, and the sweep stops as soon as any page reports the end of
//! the wall or crosses the cutoff. Pages past the real boundary may therefore
//! be requested and discarded: the batch trades a few wasted requests for
//! throughput.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, RawPost};
use crate::config::Config;
use crate::constants::PAGE_SIZE;
use crate::models::{sort_newest_first, Post};

/// Anything that can produce the posts of a wall, newest first.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// All posts of `owner_id` published at or after `cutoff` (Unix seconds).
    async fn fetch_posts(&self, owner_id: i64, cutoff: i64) -> Vec<Post>;
}

/// Posts kept from one page and whether later offsets are worth fetching.
#[derive(Debug, Default)]
pub struct PageOutcome {
    pub posts: Vec<Post>,
    pub more: bool,
}

/// Keep the items of a date-descending page up to the first one older than
/// `cutoff`. Later offsets are only worth fetching if the page was full and
/// never crossed the cutoff.
#[must_use]
pub fn collect_page(items: Vec<RawPost>, cutoff: i64) -> PageOutcome {
    let mut more = items.len() as u64 >= PAGE_SIZE;
    let mut posts = Vec::with_capacity(items.len());
    for item in items {
        if item.date < cutoff {
            more = false;
            break;
        }
        posts.push(Post::from(item));
    }
    PageOutcome { posts, more }
}

/// Batched `wall.get` fetcher.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Arc<ApiClient>,
    concurrency: usize,
    batch_width: u64,
}

impl Fetcher {
    /// Create a fetcher from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: Arc::new(ApiClient::new(config)?),
            concurrency: config.fetch_concurrency.max(1),
            batch_width: (config.batch_width / PAGE_SIZE).max(1) * PAGE_SIZE,
        })
    }

    /// Fetch every post of `owner_id` dated at or after `cutoff`, newest first.
    ///
    /// Failed pages count as empty, which ends the sweep after the current
    /// batch. The result can then be shorter than the wall.
    pub async fn fetch_all(&self, owner_id: i64, cutoff: i64) -> Vec<Post> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut posts = Vec::new();
        let mut start = 0u64;

        loop {
            let (batch, more) = self.fetch_batch(&semaphore, owner_id, cutoff, start).await;
            posts.extend(batch);
            if !more {
                break;
            }
            start += self.batch_width;
        }

        sort_newest_first(&mut posts);
        info!(owner_id, cutoff, posts = posts.len(), "Fetched wall posts");
        posts
    }

    async fn fetch_batch(
        &self,
        semaphore: &Arc<Semaphore>,
        owner_id: i64,
        cutoff: i64,
        start: u64,
    ) -> (Vec<Post>, bool) {
        let mut handles = Vec::new();

        for offset in (start..start + self.batch_width).step_by(PAGE_SIZE as usize) {
            let client = Arc::clone(&self.client);
            let semaphore = Arc::clone(semaphore);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                fetch_page(&client, owner_id, offset, cutoff).await
            }));
        }

        let mut posts = Vec::new();
        let mut more = true;

        // Wait for all to complete
        for handle in handles {
            match handle.await {
                Ok(page) => {
                    more &= page.more;
                    posts.extend(page.posts);
                }
                Err(e) => {
                    error!(owner_id, "Page task panicked: {e}");
                    more = false;
                }
            }
        }

        debug!(owner_id, start, posts = posts.len(), more, "Batch complete");
        (posts, more)
    }
}

#[async_trait]
impl PostSource for Fetcher {
    async fn fetch_posts(&self, owner_id: i64, cutoff: i64) -> Vec<Post> {
        self.fetch_all(owner_id, cutoff).await
    }
}

async fn fetch_page(client: &ApiClient, owner_id: i64, offset: u64, cutoff: i64) -> PageOutcome {
    match client.wall_page(owner_id, offset).await {
        Ok(items) => collect_page(items, cutoff),
        Err(e) => {
            warn!(owner_id, offset, "Treating failed page as empty: {e}");
            PageOutcome::default()
        }
    }
}
