//! Product type reference-data load.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::catalog::client::{await_bounded, query_all, CatalogClient, QUERY_ALL_PAGE_SIZE};
use crate::catalog::entities::ProductTypeSet;
use crate::config::Timeouts;
use crate::error::AppError;
use crate::job::{ContextUpdate, JobContext, Step};

/// Loads every product type from the catalog and promotes the set.
pub struct ProductTypesStep {
    client: Arc<dyn CatalogClient>,
    timeouts: Timeouts,
}

impl ProductTypesStep {
    pub fn new(client: Arc<dyn CatalogClient>, timeouts: Timeouts) -> Self {
        Self { client, timeouts }
    }
}

#[async_trait]
impl Step for ProductTypesStep {
    fn name(&self) -> &'static str {
        "product-types"
    }

    async fn run(&self, _ctx: &JobContext) -> Result<ContextUpdate, AppError> {
        let client = self.client.clone();
        let types = await_bounded(
            "product types load",
            self.timeouts.product_types(),
            query_all(
                QUERY_ALL_PAGE_SIZE,
                |after| {
                    let client = client.clone();
                    async move {
                        client
                            .product_types_page(after.as_deref(), QUERY_ALL_PAGE_SIZE)
                            .await
                    }
                },
                |product_type| product_type.id.as_str(),
            ),
        )
        .await?;

        let set = ProductTypeSet::of(types);
        info!("[STEP] Loaded {} product types", set.len());

        let mut update = ContextUpdate::none();
        update.product_types = Some(set);
        Ok(update)
    }
}
