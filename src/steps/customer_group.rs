//! Find-or-create for the wholesale customer group.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::catalog::client::{await_bounded, CatalogClient};
use crate::catalog::entities::CustomerGroupDraft;
use crate::config::Timeouts;
use crate::error::AppError;
use crate::job::{ContextUpdate, JobContext, Step};

/// Natural key of the group every imported product is scoped to.
pub const CUSTOMER_GROUP_NAME: &str = "b2b";

/// Looks up the customer group by name and creates it when absent, promoting
/// its id for later steps.
pub struct CustomerGroupStep {
    client: Arc<dyn CatalogClient>,
    timeouts: Timeouts,
}

impl CustomerGroupStep {
    pub fn new(client: Arc<dyn CatalogClient>, timeouts: Timeouts) -> Self {
        Self { client, timeouts }
    }
}

#[async_trait]
impl Step for CustomerGroupStep {
    fn name(&self) -> &'static str {
        "customer-group"
    }

    async fn run(&self, _ctx: &JobContext) -> Result<ContextUpdate, AppError> {
        let matches = await_bounded(
            "customer group lookup",
            self.timeouts.lookup(),
            self.client.customer_groups_by_name(CUSTOMER_GROUP_NAME),
        )
        .await?;

        let group = match matches.len() {
            0 => {
                let created = await_bounded(
                    "customer group create",
                    self.timeouts.create(),
                    self.client
                        .create_customer_group(CustomerGroupDraft::of(CUSTOMER_GROUP_NAME)),
                )
                .await?;
                info!("[STEP] Created customer group {}", created.id);
                created
            }
            1 => {
                let existing = matches.into_iter().next().ok_or_else(|| {
                    AppError::Internal("Customer group match vanished".to_string())
                })?;
                info!("[STEP] Reusing customer group {}", existing.id);
                existing
            }
            count => {
                return Err(AppError::AmbiguousNaturalKey {
                    entity: "customer group",
                    name: CUSTOMER_GROUP_NAME.to_string(),
                    count,
                })
            }
        };

        let mut update = ContextUpdate::none();
        update.customer_group_id = Some(group.id);
        Ok(update)
    }
}
