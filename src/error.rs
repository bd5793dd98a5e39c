use thiserror::Error;

/// Application-wide error type.
///
/// Every fatal condition aborts the running import job immediately; there is
/// no retry and no rollback of already-applied remote side effects. Re-running
/// the job is the only recovery path.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Job context ───────────────────────────────────────────────────────────
    #[error("Missing job context dependency: {key}")]
    MissingDependency { key: &'static str },

    // ── Remote catalog service ────────────────────────────────────────────────
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    #[error("Catalog service error: {0}")]
    Remote(String),

    #[error("{count} {entity} entities share the natural key {name:?}")]
    AmbiguousNaturalKey {
        entity: &'static str,
        name: String,
        count: usize,
    },

    // ── Network ───────────────────────────────────────────────────────────────
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    // ── Record source ─────────────────────────────────────────────────────────
    #[error("Invalid CSV: {0}")]
    CsvInvalid(String),

    // ── Configuration ─────────────────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    // ── Generic fallback ──────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for conditions caused by the remote service or the network,
    /// as opposed to local usage or data errors.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            AppError::Timeout { .. }
                | AppError::Remote(_)
                | AppError::ConnectionFailed(_)
                | AppError::AmbiguousNaturalKey { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns all AppError variants for exhaustive testing.
    fn all_variants() -> Vec<AppError> {
        vec![
            AppError::MissingDependency { key: "tax_category" },
            AppError::Timeout {
                operation: "product create".into(),
                secs: 30,
            },
            AppError::Remote("validation failed".into()),
            AppError::AmbiguousNaturalKey {
                entity: "customer group",
                name: "b2b".into(),
                count: 2,
            },
            AppError::ConnectionFailed("refused".into()),
            AppError::CsvInvalid("missing header".into()),
            AppError::Config("chunk_size must be non-zero".into()),
            AppError::Internal("something broke".into()),
        ]
    }

    #[test]
    fn all_variants_have_nonempty_message() {
        for variant in all_variants() {
            assert!(
                !variant.to_string().trim().is_empty(),
                "Empty message for {:?}",
                variant
            );
        }
    }

    #[test]
    fn timeout_message_includes_operation_and_bound() {
        let err = AppError::Timeout {
            operation: "category query".into(),
            secs: 180,
        };
        let msg = err.to_string();
        assert!(msg.contains("category query"));
        assert!(msg.contains("180"));
    }

    #[test]
    fn ambiguous_natural_key_names_the_duplicate() {
        let err = AppError::AmbiguousNaturalKey {
            entity: "tax category",
            name: "standard".into(),
            count: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("tax category"));
        assert!(msg.contains("standard"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn remote_classification() {
        assert!(AppError::Remote("x".into()).is_remote());
        assert!(AppError::Timeout {
            operation: "x".into(),
            secs: 1
        }
        .is_remote());
        assert!(AppError::ConnectionFailed("x".into()).is_remote());
        assert!(!AppError::MissingDependency { key: "k" }.is_remote());
        assert!(!AppError::CsvInvalid("x".into()).is_remote());
        assert!(!AppError::Config("x".into()).is_remote());
    }
}
