//! Find-or-create for the standard tax category, plus the category tree load.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::catalog::client::{await_bounded, query_all, CatalogClient, QUERY_ALL_PAGE_SIZE};
use crate::catalog::entities::{CategoryTree, TaxCategoryDraft, TaxRate};
use crate::config::Timeouts;
use crate::error::AppError;
use crate::job::{ContextUpdate, JobContext, Step};

/// Natural key of the tax category applied to every imported product.
pub const TAX_CATEGORY_NAME: &str = "standard";

/// Fixed country rates for the standard tax category. All rates are
/// tax-included.
fn standard_rates() -> Vec<TaxRate> {
    vec![
        TaxRate::of(TAX_CATEGORY_NAME, 0.19, true, "DE"),
        TaxRate::of(TAX_CATEGORY_NAME, 0.08, true, "CH"),
        TaxRate::of(TAX_CATEGORY_NAME, 0.21, true, "CZ"),
        TaxRate::of(TAX_CATEGORY_NAME, 0.22, true, "IT"),
        TaxRate::of(TAX_CATEGORY_NAME, 0.20, true, "AU"),
    ]
}

/// Resolves the standard tax category (creating it with the fixed rate table
/// when absent) and loads the full category tree, promoting both.
pub struct TaxCategoryStep {
    client: Arc<dyn CatalogClient>,
    timeouts: Timeouts,
}

impl TaxCategoryStep {
    pub fn new(client: Arc<dyn CatalogClient>, timeouts: Timeouts) -> Self {
        Self { client, timeouts }
    }
}

#[async_trait]
impl Step for TaxCategoryStep {
    fn name(&self) -> &'static str {
        "tax-category"
    }

    async fn run(&self, _ctx: &JobContext) -> Result<ContextUpdate, AppError> {
        let matches = await_bounded(
            "tax category lookup",
            self.timeouts.lookup(),
            self.client.tax_categories_by_name(TAX_CATEGORY_NAME),
        )
        .await?;

        let tax_category = match matches.len() {
            0 => {
                let draft = TaxCategoryDraft::of(TAX_CATEGORY_NAME, standard_rates());
                let created = await_bounded(
                    "tax category create",
                    self.timeouts.create(),
                    self.client.create_tax_category(draft),
                )
                .await?;
                info!("[STEP] Created tax category {}", created.id);
                created
            }
            1 => {
                let existing = matches
                    .into_iter()
                    .next()
                    .ok_or_else(|| AppError::Internal("Tax category match vanished".to_string()))?;
                info!("[STEP] Reusing tax category {}", existing.id);
                existing
            }
            count => {
                return Err(AppError::AmbiguousNaturalKey {
                    entity: "tax category",
                    name: TAX_CATEGORY_NAME.to_string(),
                    count,
                })
            }
        };

        let client = self.client.clone();
        let categories = await_bounded(
            "category tree load",
            self.timeouts.categories(),
            query_all(
                QUERY_ALL_PAGE_SIZE,
                |after| {
                    let client = client.clone();
                    async move { client.categories_page(after.as_deref(), QUERY_ALL_PAGE_SIZE).await }
                },
                |category| category.id.as_str(),
            ),
        )
        .await?;
        let tree = CategoryTree::of(categories);
        info!("[STEP] Loaded {} categories", tree.len());

        let mut update = ContextUpdate::none();
        update.tax_category = Some(tax_category);
        update.category_tree = Some(tree);
        Ok(update)
    }
}
