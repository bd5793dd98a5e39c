//! In-memory catalog client used by tests.
//!
//! Mirrors the service's observable behavior: name queries, sorted-by-id
//! pagination, version-checked publish. Tracks the high-water mark of
//! concurrently in-flight mutating calls so tests can assert dispatch bounds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::catalog::client::CatalogClient;
use crate::catalog::entities::{
    Category, CustomerGroup, CustomerGroupDraft, Product, ProductDraft, ProductType, TaxCategory,
    TaxCategoryDraft,
};
use crate::error::AppError;

#[derive(Default)]
struct CatalogState {
    groups: Vec<CustomerGroup>,
    tax_categories: Vec<TaxCategory>,
    categories: Vec<Category>,
    product_types: Vec<ProductType>,
    products: Vec<Product>,
    created_drafts: Vec<ProductDraft>,
    next_id: u64,
}

impl CatalogState {
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{:04}", prefix, self.next_id)
    }
}

/// In-memory stand-in for the catalog service.
#[derive(Default)]
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an artificial delay to mutating calls so concurrent dispatches
    /// actually overlap.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Highest number of mutating calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub async fn seed_customer_group(&self, name: &str) -> CustomerGroup {
        let mut state = self.state.lock().await;
        let group = CustomerGroup {
            id: state.fresh_id("cg"),
            name: name.to_string(),
        };
        state.groups.push(group.clone());
        group
    }

    pub async fn seed_tax_category(&self, draft: TaxCategoryDraft) -> TaxCategory {
        let mut state = self.state.lock().await;
        let category = TaxCategory {
            id: state.fresh_id("tc"),
            name: draft.name,
            rates: draft.rates,
        };
        state.tax_categories.push(category.clone());
        category
    }

    pub async fn seed_category(&self, category: Category) {
        let mut state = self.state.lock().await;
        state.categories.push(category);
    }

    pub async fn seed_product_type(&self, product_type: ProductType) {
        let mut state = self.state.lock().await;
        state.product_types.push(product_type);
    }

    pub async fn products(&self) -> Vec<Product> {
        self.state.lock().await.products.clone()
    }

    pub async fn created_drafts(&self) -> Vec<ProductDraft> {
        self.state.lock().await.created_drafts.clone()
    }

    pub async fn customer_groups(&self) -> Vec<CustomerGroup> {
        self.state.lock().await.groups.clone()
    }

    pub async fn tax_categories(&self) -> Vec<TaxCategory> {
        self.state.lock().await.tax_categories.clone()
    }

    async fn track_in_flight<T>(&self, work: impl std::future::Future<Output = T>) -> T {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let result = work.await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn page_after<T: Clone>(items: &[T], id_of: impl Fn(&T) -> &str, after_id: Option<&str>, limit: usize) -> Vec<T> {
    let mut sorted: Vec<T> = items.to_vec();
    sorted.sort_by(|a, b| id_of(a).cmp(id_of(b)));
    sorted
        .into_iter()
        .filter(|item| match after_id {
            Some(after) => id_of(item) > after,
            None => true,
        })
        .take(limit)
        .collect()
}

#[async_trait]
impl CatalogClient for InMemoryCatalog {
    async fn customer_groups_by_name(&self, name: &str) -> Result<Vec<CustomerGroup>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .groups
            .iter()
            .filter(|g| g.name == name)
            .cloned()
            .collect())
    }

    async fn create_customer_group(
        &self,
        draft: CustomerGroupDraft,
    ) -> Result<CustomerGroup, AppError> {
        self.track_in_flight(async {
            let mut state = self.state.lock().await;
            let group = CustomerGroup {
                id: state.fresh_id("cg"),
                name: draft.group_name,
            };
            state.groups.push(group.clone());
            Ok(group)
        })
        .await
    }

    async fn tax_categories_by_name(&self, name: &str) -> Result<Vec<TaxCategory>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .tax_categories
            .iter()
            .filter(|t| t.name == name)
            .cloned()
            .collect())
    }

    async fn create_tax_category(&self, draft: TaxCategoryDraft) -> Result<TaxCategory, AppError> {
        self.track_in_flight(async {
            let mut state = self.state.lock().await;
            let category = TaxCategory {
                id: state.fresh_id("tc"),
                name: draft.name,
                rates: draft.rates,
            };
            state.tax_categories.push(category.clone());
            Ok(category)
        })
        .await
    }

    async fn categories_page(
        &self,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Category>, AppError> {
        let state = self.state.lock().await;
        Ok(page_after(&state.categories, |c| &c.id, after_id, limit))
    }

    async fn product_types_page(
        &self,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ProductType>, AppError> {
        let state = self.state.lock().await;
        Ok(page_after(&state.product_types, |p| &p.id, after_id, limit))
    }

    async fn products_page(
        &self,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Product>, AppError> {
        let state = self.state.lock().await;
        Ok(page_after(&state.products, |p| &p.id, after_id, limit))
    }

    async fn create_product(&self, draft: ProductDraft) -> Result<Product, AppError> {
        self.track_in_flight(async {
            let mut state = self.state.lock().await;
            let product = Product {
                id: state.fresh_id("prod"),
                version: 1,
                published: false,
                name: draft.name.clone(),
            };
            state.created_drafts.push(draft);
            state.products.push(product.clone());
            Ok(product)
        })
        .await
    }

    async fn publish_product(&self, id: &str, version: u64) -> Result<Product, AppError> {
        self.track_in_flight(async {
            let mut state = self.state.lock().await;
            let product = state
                .products
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| AppError::Remote(format!("Product not found: {} (404)", id)))?;
            if product.version != version {
                return Err(AppError::Remote(format!(
                    "Version mismatch for product {}: expected {}, got {} (409)",
                    id, product.version, version
                )));
            }
            product.version += 1;
            product.published = true;
            Ok(product.clone())
        })
        .await
    }
}
