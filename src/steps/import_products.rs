//! Chunked product import.
//!
//! Reads drafts from the CSV source one chunk at a time, drops records that
//! fail the usefulness filters, then dispatches the whole chunk concurrently
//! and blocks until every call resolves. At most one chunk is in flight at
//! any moment, so remote concurrency never exceeds the chunk size.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::info;

use crate::catalog::client::{await_bounded, CatalogClient};
use crate::catalog::entities::ProductDraft;
use crate::config::Timeouts;
use crate::error::AppError;
use crate::job::{ContextUpdate, JobContext, Step, StepCounters};
use crate::source::CsvDraftSource;

/// Secondary-locale names starting with this prefix mark records reserved for
/// manual handling.
const RESERVED_NAME_PREFIX: &str = "#max";

/// Attribute name checked by the write-stage exclusion.
const DESIGNER_ATTRIBUTE: &str = "designer";
/// Designer whose records are excluded from creation.
const EXCLUDED_DESIGNER: &str = "juliat";

/// Creates catalog products from CSV drafts in bounded concurrent chunks.
pub struct ImportProductsStep {
    client: Arc<dyn CatalogClient>,
    source: Mutex<CsvDraftSource>,
    chunk_size: usize,
    primary_locale: String,
    secondary_locale: String,
    timeouts: Timeouts,
}

impl ImportProductsStep {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        source: CsvDraftSource,
        chunk_size: usize,
        primary_locale: &str,
        secondary_locale: &str,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            client,
            source: Mutex::new(source),
            chunk_size,
            primary_locale: primary_locale.to_string(),
            secondary_locale: secondary_locale.to_string(),
            timeouts,
        }
    }

    /// Read-stage usefulness filter: a record must carry a non-empty
    /// primary-locale name and its secondary-locale name must not be reserved.
    fn is_useful(&self, draft: &ProductDraft) -> bool {
        let has_primary_name = draft
            .name
            .get(&self.primary_locale)
            .map(|name| !name.is_empty())
            .unwrap_or(false);
        if !has_primary_name {
            return false;
        }
        let reserved = draft
            .name
            .get(&self.secondary_locale)
            .map(|name| name.starts_with(RESERVED_NAME_PREFIX))
            .unwrap_or(false);
        !reserved
    }
}

/// Write-stage exclusion for records still pending their attribute cleanup.
fn is_excluded(draft: &ProductDraft) -> bool {
    draft
        .master_variant
        .has_attribute(DESIGNER_ATTRIBUTE, &serde_json::json!(EXCLUDED_DESIGNER))
}

#[async_trait]
impl Step for ImportProductsStep {
    fn name(&self) -> &'static str {
        "import-products"
    }

    async fn run(&self, ctx: &JobContext) -> Result<ContextUpdate, AppError> {
        // Upstream reference data must be in place before any record is
        // written.
        ctx.customer_group_id()?;
        ctx.tax_category()?;
        ctx.product_types()?;

        let mut counters = StepCounters::default();

        loop {
            let chunk = {
                let mut source = self
                    .source
                    .lock()
                    .map_err(|_| AppError::Internal("Draft source lock poisoned".to_string()))?;
                source.next_chunk(self.chunk_size)?
            };
            if chunk.is_empty() {
                break;
            }
            counters.read += chunk.len() as u64;

            let mut to_create = Vec::with_capacity(chunk.len());
            for draft in chunk {
                if !self.is_useful(&draft) {
                    counters.filtered += 1;
                } else if is_excluded(&draft) {
                    counters.excluded += 1;
                } else {
                    to_create.push(draft);
                }
            }

            let calls = to_create.into_iter().map(|draft| {
                await_bounded(
                    "product create",
                    self.timeouts.create(),
                    self.client.create_product(draft),
                )
            });
            for result in join_all(calls).await {
                result?;
                counters.created += 1;
            }
        }

        info!(
            "[STEP] Import complete: read={} filtered={} excluded={} created={}",
            counters.read, counters.filtered, counters.excluded, counters.created
        );

        let mut update = ContextUpdate::none();
        update.counters = counters;
        Ok(update)
    }
}
