//! Catalog-wide product publish.
//!
//! Walks the product collection with an id cursor and publishes one page at a
//! time, using the version observed at query time for each product's state
//! transition.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::info;

use crate::catalog::client::{await_bounded, CatalogClient};
use crate::config::Timeouts;
use crate::error::AppError;
use crate::job::{ContextUpdate, JobContext, Step, StepCounters};

/// Publishes every product in the catalog in bounded concurrent pages.
pub struct PublishStep {
    client: Arc<dyn CatalogClient>,
    page_size: usize,
    timeouts: Timeouts,
}

impl PublishStep {
    pub fn new(client: Arc<dyn CatalogClient>, page_size: usize, timeouts: Timeouts) -> Self {
        Self {
            client,
            page_size,
            timeouts,
        }
    }
}

#[async_trait]
impl Step for PublishStep {
    fn name(&self) -> &'static str {
        "publish"
    }

    async fn run(&self, _ctx: &JobContext) -> Result<ContextUpdate, AppError> {
        let mut counters = StepCounters::default();
        let mut after_id: Option<String> = None;

        loop {
            let page = await_bounded(
                "product page query",
                self.timeouts.lookup(),
                self.client.products_page(after_id.as_deref(), self.page_size),
            )
            .await?;
            if page.is_empty() {
                break;
            }
            let page_len = page.len();
            let last_id = page
                .last()
                .map(|product| product.id.clone())
                .ok_or_else(|| AppError::Internal("Non-empty page had no last id".to_string()))?;

            let calls = page.into_iter().map(|product| {
                let client = self.client.clone();
                async move {
                    await_bounded(
                        "product publish",
                        self.timeouts.publish(),
                        client.publish_product(&product.id, product.version),
                    )
                    .await
                }
            });
            for result in join_all(calls).await {
                result?;
                counters.published += 1;
            }

            if page_len < self.page_size {
                break;
            }
            after_id = Some(last_id);
        }

        info!("[STEP] Published {} products", counters.published);

        let mut update = ContextUpdate::none();
        update.counters = counters;
        Ok(update)
    }
}
