//! Remote catalog client abstraction.
//!
//! `CatalogClient` is the seam between the import pipeline and the remote
//! catalog service: query-by-natural-key, paginated query-all, create, and
//! update operations. Every blocking wait on a remote call goes through
//! [`await_bounded`], so exceeding a bound always surfaces as
//! `AppError::Timeout` and aborts the job.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::catalog::entities::{
    Category, CustomerGroup, CustomerGroupDraft, Product, ProductDraft, ProductType, TaxCategory,
    TaxCategoryDraft,
};
use crate::error::AppError;

/// Page size used when draining a paginated endpoint to completion.
pub const QUERY_ALL_PAGE_SIZE: usize = 500;

// ─────────────────────────────────────────────────────────────────────────────
// CatalogClient
// ─────────────────────────────────────────────────────────────────────────────

/// Operations the import pipeline needs from the remote catalog service.
///
/// Natural-key queries return zero or more matches; uniqueness is NOT assumed
/// to be enforced remotely (callers decide what more than one match means).
/// Paginated queries are sorted by id and cursor on the last id seen.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn customer_groups_by_name(&self, name: &str) -> Result<Vec<CustomerGroup>, AppError>;

    async fn create_customer_group(
        &self,
        draft: CustomerGroupDraft,
    ) -> Result<CustomerGroup, AppError>;

    async fn tax_categories_by_name(&self, name: &str) -> Result<Vec<TaxCategory>, AppError>;

    async fn create_tax_category(&self, draft: TaxCategoryDraft) -> Result<TaxCategory, AppError>;

    async fn categories_page(
        &self,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Category>, AppError>;

    async fn product_types_page(
        &self,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ProductType>, AppError>;

    async fn products_page(
        &self,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Product>, AppError>;

    async fn create_product(&self, draft: ProductDraft) -> Result<Product, AppError>;

    /// Transitions a product to published, supplying the version token read
    /// at query time. A stale version is a remote rejection.
    async fn publish_product(&self, id: &str, version: u64) -> Result<Product, AppError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Awaits a remote call with a bounded timeout.
///
/// An elapsed bound maps to `AppError::Timeout`, which is fatal to the job:
/// no retry is attempted and already-dispatched calls are not cancelled.
pub async fn await_bounded<T, F>(
    operation: &str,
    bound: Duration,
    fut: F,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(bound, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout {
            operation: operation.to_string(),
            secs: bound.as_secs(),
        }),
    }
}

/// Drains a paginated, id-sorted endpoint to completion.
///
/// `fetch_page` receives the id cursor (None for the first page) and returns
/// one page; a page shorter than `page_size` ends the drain. `id_of` extracts
/// the cursor id from an item.
pub async fn query_all<T, F, Fut, I>(
    page_size: usize,
    mut fetch_page: F,
    id_of: I,
) -> Result<Vec<T>, AppError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Vec<T>, AppError>>,
    I: Fn(&T) -> &str,
{
    let mut all = Vec::new();
    let mut after: Option<String> = None;

    loop {
        let page = fetch_page(after.take()).await?;
        let page_len = page.len();
        if page_len == 0 {
            break;
        }
        after = page.last().map(|item| id_of(item).to_string());
        all.extend(page);
        if page_len < page_size {
            break;
        }
    }

    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn await_bounded_passes_through_success() {
        let result = await_bounded("noop", Duration::from_secs(1), async { Ok::<_, AppError>(7) })
            .await;

        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn await_bounded_passes_through_remote_errors() {
        let result: Result<(), AppError> =
            await_bounded("reject", Duration::from_secs(1), async {
                Err(AppError::Remote("validation failed".into()))
            })
            .await;

        assert!(matches!(result, Err(AppError::Remote(_))));
    }

    #[tokio::test]
    async fn await_bounded_maps_elapsed_to_timeout() {
        let result: Result<(), AppError> = await_bounded(
            "slow call",
            Duration::from_millis(10),
            std::future::pending(),
        )
        .await;

        match result {
            Err(AppError::Timeout { operation, .. }) => assert_eq!(operation, "slow call"),
            other => panic!("Expected Timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn query_all_drains_multiple_pages_with_id_cursor() {
        // 5 items, pages of 2: cursors should be None, "2", "4"
        let items: Vec<String> = (1..=5).map(|n| n.to_string()).collect();
        let mut cursors_seen: Vec<Option<String>> = Vec::new();

        let all = query_all(
            2,
            |after| {
                cursors_seen.push(after.clone());
                let page: Vec<String> = items
                    .iter()
                    .filter(|id| match &after {
                        Some(cursor) => id.as_str() > cursor.as_str(),
                        None => true,
                    })
                    .take(2)
                    .cloned()
                    .collect();
                async move { Ok::<_, AppError>(page) }
            },
            |id: &String| id.as_str(),
        )
        .await
        .expect("query_all failed");

        assert_eq!(all, items);
        assert_eq!(
            cursors_seen,
            vec![None, Some("2".to_string()), Some("4".to_string())]
        );
    }

    #[tokio::test]
    async fn query_all_handles_empty_endpoint() {
        let all = query_all(
            10,
            |_after| async { Ok::<Vec<String>, AppError>(Vec::new()) },
            |id: &String| id.as_str(),
        )
        .await
        .expect("query_all failed");

        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn query_all_stops_on_short_page_without_extra_fetch() {
        let mut fetches = 0;

        let all = query_all(
            10,
            |_after| {
                fetches += 1;
                async move { Ok::<_, AppError>(vec!["a".to_string(), "b".to_string()]) }
            },
            |id: &String| id.as_str(),
        )
        .await
        .expect("query_all failed");

        assert_eq!(all.len(), 2);
        assert_eq!(fetches, 1, "short page should end the drain");
    }

    #[tokio::test]
    async fn query_all_propagates_page_errors() {
        let result = query_all(
            10,
            |_after| async { Err::<Vec<String>, _>(AppError::Remote("boom".into())) },
            |id: &String| id.as_str(),
        )
        .await;

        assert!(matches!(result, Err(AppError::Remote(_))));
    }
}
