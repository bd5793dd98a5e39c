//! Sequential job runner with a typed step context.
//!
//! Steps run strictly in registration order and the job aborts on the first
//! failure. Each step returns a `ContextUpdate`; its promotions and counters
//! are merged into the shared `JobContext` only after the step succeeds, so a
//! failed step leaves no partial state behind.

use async_trait::async_trait;
use tracing::{info, Instrument};

use crate::catalog::entities::{CategoryTree, ProductTypeSet, TaxCategory};
use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// Step contract
// ─────────────────────────────────────────────────────────────────────────────

/// A single unit of job work.
#[async_trait]
pub trait Step: Send + Sync {
    /// Stable step name used in logs and the job report.
    fn name(&self) -> &'static str;

    /// Runs the step against the current context.
    ///
    /// # Errors
    ///
    /// Any error aborts the job; later steps do not run.
    async fn run(&self, ctx: &JobContext) -> Result<ContextUpdate, AppError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// Shared state built up across steps. Every slot is write-once: a step
/// promotes a value exactly once and later steps read it by accessor.
#[derive(Default)]
pub struct JobContext {
    customer_group_id: Option<String>,
    tax_category: Option<TaxCategory>,
    category_tree: Option<CategoryTree>,
    product_types: Option<ProductTypeSet>,
}

impl JobContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns `MissingDependency` if no earlier step promoted the id.
    pub fn customer_group_id(&self) -> Result<&str, AppError> {
        self.customer_group_id
            .as_deref()
            .ok_or(AppError::MissingDependency {
                key: "customer_group_id",
            })
    }

    /// # Errors
    ///
    /// Returns `MissingDependency` if no earlier step promoted the category.
    pub fn tax_category(&self) -> Result<&TaxCategory, AppError> {
        self.tax_category
            .as_ref()
            .ok_or(AppError::MissingDependency {
                key: "tax_category",
            })
    }

    /// # Errors
    ///
    /// Returns `MissingDependency` if no earlier step promoted the tree.
    pub fn category_tree(&self) -> Result<&CategoryTree, AppError> {
        self.category_tree
            .as_ref()
            .ok_or(AppError::MissingDependency {
                key: "category_tree",
            })
    }

    /// # Errors
    ///
    /// Returns `MissingDependency` if no earlier step promoted the set.
    pub fn product_types(&self) -> Result<&ProductTypeSet, AppError> {
        self.product_types
            .as_ref()
            .ok_or(AppError::MissingDependency {
                key: "product_types",
            })
    }

    /// Merges a successful step's promotions into the context.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if a promotion targets an already
    /// populated slot.
    pub(crate) fn apply(&mut self, update: &mut ContextUpdate) -> Result<(), AppError> {
        promote(
            &mut self.customer_group_id,
            update.customer_group_id.take(),
            "customer_group_id",
        )?;
        promote(
            &mut self.tax_category,
            update.tax_category.take(),
            "tax_category",
        )?;
        promote(
            &mut self.category_tree,
            update.category_tree.take(),
            "category_tree",
        )?;
        promote(
            &mut self.product_types,
            update.product_types.take(),
            "product_types",
        )?;
        Ok(())
    }
}

fn promote<T>(slot: &mut Option<T>, value: Option<T>, key: &str) -> Result<(), AppError> {
    if let Some(value) = value {
        if slot.is_some() {
            return Err(AppError::Internal(format!(
                "Context slot promoted twice: {}",
                key
            )));
        }
        *slot = Some(value);
    }
    Ok(())
}

/// Promotions and counters produced by a single step.
#[derive(Default)]
pub struct ContextUpdate {
    pub customer_group_id: Option<String>,
    pub tax_category: Option<TaxCategory>,
    pub category_tree: Option<CategoryTree>,
    pub product_types: Option<ProductTypeSet>,
    pub counters: StepCounters,
}

impl ContextUpdate {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Per-step record throughput counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepCounters {
    /// Records read from the source.
    pub read: u64,
    /// Records dropped at the read stage by usefulness filters.
    pub filtered: u64,
    /// Records dropped at the write stage by exclusion rules.
    pub excluded: u64,
    /// Entities created in the remote catalog.
    pub created: u64,
    /// Entities transitioned to the published state.
    pub published: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Job
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of one step within a completed job.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub name: &'static str,
    pub counters: StepCounters,
}

/// Outcome of a completed job run.
#[derive(Debug, Clone, Default)]
pub struct JobReport {
    pub steps: Vec<StepReport>,
}

impl JobReport {
    /// Sums a counter across all steps.
    pub fn total(&self, pick: impl Fn(&StepCounters) -> u64) -> u64 {
        self.steps.iter().map(|s| pick(&s.counters)).sum()
    }
}

/// Ordered sequence of steps sharing one context.
#[derive(Default)]
pub struct ImportJob {
    steps: Vec<Box<dyn Step>>,
}

impl ImportJob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: Box<dyn Step>) -> Self {
        self.steps.push(step);
        self
    }

    /// Runs every step in order, aborting on the first failure.
    ///
    /// # Errors
    ///
    /// Propagates the failing step's error unchanged.
    pub async fn run(&self) -> Result<JobReport, AppError> {
        let mut ctx = JobContext::new();
        let mut report = JobReport::default();

        for (index, step) in self.steps.iter().enumerate() {
            let span = tracing::info_span!("step", name = step.name(), index);
            info!("[JOB] Step {}/{}: {}", index + 1, self.steps.len(), step.name());

            let mut update = step.run(&ctx).instrument(span).await?;
            ctx.apply(&mut update)?;

            report.steps.push(StepReport {
                name: step.name(),
                counters: update.counters,
            });
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct RecordingStep {
        name: &'static str,
        order: Arc<std::sync::Mutex<Vec<&'static str>>>,
        fail: bool,
        promote_group: bool,
    }

    #[async_trait]
    impl Step for RecordingStep {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, _ctx: &JobContext) -> Result<ContextUpdate, AppError> {
            self.order.lock().unwrap().push(self.name);
            if self.fail {
                return Err(AppError::Internal("boom".to_string()));
            }
            let mut update = ContextUpdate::none();
            if self.promote_group {
                update.customer_group_id = Some("cg-0001".to_string());
            }
            Ok(update)
        }
    }

    fn step(
        name: &'static str,
        order: &Arc<std::sync::Mutex<Vec<&'static str>>>,
        fail: bool,
        promote_group: bool,
    ) -> Box<dyn Step> {
        Box::new(RecordingStep {
            name,
            order: order.clone(),
            fail,
            promote_group,
        })
    }

    #[test]
    fn empty_context_reports_missing_dependencies() {
        let ctx = JobContext::new();

        assert!(matches!(
            ctx.customer_group_id(),
            Err(AppError::MissingDependency {
                key: "customer_group_id"
            })
        ));
        assert!(matches!(
            ctx.tax_category(),
            Err(AppError::MissingDependency { key: "tax_category" })
        ));
        assert!(matches!(
            ctx.category_tree(),
            Err(AppError::MissingDependency {
                key: "category_tree"
            })
        ));
        assert!(matches!(
            ctx.product_types(),
            Err(AppError::MissingDependency {
                key: "product_types"
            })
        ));
    }

    #[test]
    fn promoted_values_are_readable() {
        let mut ctx = JobContext::new();
        let mut update = ContextUpdate::none();
        update.customer_group_id = Some("cg-0001".to_string());

        ctx.apply(&mut update).unwrap();

        assert_eq!(ctx.customer_group_id().unwrap(), "cg-0001");
    }

    #[test]
    fn double_promotion_is_an_internal_error() {
        let mut ctx = JobContext::new();
        let mut first = ContextUpdate::none();
        first.customer_group_id = Some("cg-0001".to_string());
        ctx.apply(&mut first).unwrap();

        let mut second = ContextUpdate::none();
        second.customer_group_id = Some("cg-0002".to_string());

        assert!(matches!(
            ctx.apply(&mut second),
            Err(AppError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn steps_run_in_registration_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let job = ImportJob::new()
            .with_step(step("first", &order, false, false))
            .with_step(step("second", &order, false, false))
            .with_step(step("third", &order, false, false));

        let report = job.run().await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
        assert_eq!(report.steps.len(), 3);
        assert_eq!(report.steps[1].name, "second");
    }

    #[tokio::test]
    async fn failing_step_aborts_the_rest() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let job = ImportJob::new()
            .with_step(step("first", &order, false, false))
            .with_step(step("failing", &order, true, false))
            .with_step(step("unreached", &order, false, false));

        let result = job.run().await;

        assert!(result.is_err());
        assert_eq!(*order.lock().unwrap(), vec!["first", "failing"]);
    }

    #[tokio::test]
    async fn failed_step_promotions_are_discarded() {
        struct FailAfterPromote;

        #[async_trait]
        impl Step for FailAfterPromote {
            fn name(&self) -> &'static str {
                "fail-after-promote"
            }

            async fn run(&self, _ctx: &JobContext) -> Result<ContextUpdate, AppError> {
                Err(AppError::Internal("boom".to_string()))
            }
        }

        struct ReadsGroup {
            saw_missing: Arc<AtomicUsize>,
        }

        #[async_trait]
        impl Step for ReadsGroup {
            fn name(&self) -> &'static str {
                "reads-group"
            }

            async fn run(&self, ctx: &JobContext) -> Result<ContextUpdate, AppError> {
                if ctx.customer_group_id().is_err() {
                    self.saw_missing.fetch_add(1, Ordering::SeqCst);
                }
                Ok(ContextUpdate::none())
            }
        }

        // The failing step never gets to promote anything.
        let job = ImportJob::new().with_step(Box::new(FailAfterPromote));
        assert!(job.run().await.is_err());

        let saw_missing = Arc::new(AtomicUsize::new(0));
        let job = ImportJob::new().with_step(Box::new(ReadsGroup {
            saw_missing: saw_missing.clone(),
        }));
        job.run().await.unwrap();
        assert_eq!(saw_missing.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn report_totals_sum_across_steps() {
        let report = JobReport {
            steps: vec![
                StepReport {
                    name: "a",
                    counters: StepCounters {
                        created: 2,
                        ..StepCounters::default()
                    },
                },
                StepReport {
                    name: "b",
                    counters: StepCounters {
                        created: 3,
                        published: 5,
                        ..StepCounters::default()
                    },
                },
            ],
        };

        assert_eq!(report.total(|c| c.created), 5);
        assert_eq!(report.total(|c| c.published), 5);
    }
}
